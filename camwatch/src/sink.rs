// THEORY:
// The presentation sink decides what happens to a frame once it is ready.
// There are two mutually exclusive behaviours, picked once from the
// `DisplayMode` and fixed for the whole run:
//
// 1.  **Windowed**: the frame is drawn into a named window and the keyboard is
//     polled for 1 ms. Escape or `q` ends the run, and so does the user
//     closing the window. Some window backends cannot report visibility; a
//     failed query is read as "still open" so the loop is never stopped by a
//     missing feature.
// 2.  **Headless**: no window exists. Every `interval`-th frame is written to
//     a fixed file, overwriting the previous sample, and every iteration
//     sleeps briefly since nothing else blocks the loop.
//
// The window is owned by a guard whose `Drop` destroys all windows, so every
// exit path that drops the sink also closes the UI.

use crate::config::{ESCAPE_KEY, KEY_POLL_MS};
use crate::env_probe::DisplayMode;
use crate::error::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Window management that does not depend on the frame type.
pub trait WindowSystem {
    fn named_window(&mut self, name: &str) -> Result<()>;
    /// Waits up to `timeout_ms` for a key; returns the key code or -1.
    fn poll_key(&mut self, timeout_ms: i32) -> Result<i32>;
    fn window_visible(&mut self, name: &str) -> Result<bool>;
    fn destroy_all_windows(&mut self);
}

/// An interactive window backend able to draw `F`.
pub trait Display<F>: WindowSystem {
    fn show(&mut self, name: &str, frame: &F) -> Result<()>;
}

/// Persists a frame as an image file.
pub trait SampleWriter<F> {
    fn write_sample(&mut self, path: &Path, frame: &F) -> Result<()>;
}

/// Whether the loop should keep going after presenting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// A named window that is torn down when dropped.
pub struct Window<D: WindowSystem> {
    display: D,
    name: String,
}

impl<D: WindowSystem> Window<D> {
    pub fn open(mut display: D, name: &str) -> Result<Self> {
        display.named_window(name)?;
        Ok(Self {
            display,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn present<F>(&mut self, frame: &F) -> Result<Flow>
    where
        D: Display<F>,
    {
        self.display.show(&self.name, frame)?;
        let key = self.display.poll_key(KEY_POLL_MS)? & 0xFF;
        if key == ESCAPE_KEY || key == i32::from(b'q') {
            info!("Exit key pressed");
            return Ok(Flow::Stop);
        }
        if self.closed_by_user() {
            info!("Window '{}' was closed", self.name);
            return Ok(Flow::Stop);
        }
        Ok(Flow::Continue)
    }

    fn closed_by_user(&mut self) -> bool {
        match self.display.window_visible(&self.name) {
            Ok(visible) => !visible,
            Err(err) => {
                debug!("Window visibility query unsupported, assuming open: {}", err);
                false
            }
        }
    }
}

impl<D: WindowSystem> Drop for Window<D> {
    fn drop(&mut self) {
        self.display.destroy_all_windows();
    }
}

/// Periodic sample writer used when there is no display.
pub struct Headless<W> {
    writer: W,
    path: PathBuf,
    interval: u64,
    pause: Duration,
}

impl<W> Headless<W> {
    pub fn new(writer: W, path: impl Into<PathBuf>, interval: u64, pause: Duration) -> Self {
        Self {
            writer,
            path: path.into(),
            interval: interval.max(1),
            pause,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn present<F>(&mut self, frame: &F, frame_index: u64) -> Flow
    where
        W: SampleWriter<F>,
    {
        if frame_index.is_multiple_of(self.interval) {
            match self.writer.write_sample(&self.path, frame) {
                Ok(()) => info!(
                    "Wrote {} for inspection (every {} frames). Press Ctrl+C to stop.",
                    self.path.display(),
                    self.interval
                ),
                Err(err) => warn!("Could not write {}: {}", self.path.display(), err),
            }
        }
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
        }
        Flow::Continue
    }
}

pub enum PresentationSink<D: WindowSystem, W> {
    Windowed(Window<D>),
    Headless(Headless<W>),
}

impl<D: WindowSystem, W> PresentationSink<D, W> {
    /// Builds the sink for `mode`. If a window was wanted but cannot be
    /// created, falls back to headless output.
    pub fn select(mode: DisplayMode, display: D, window_name: &str, headless: Headless<W>) -> Self {
        if !mode.is_windowed() {
            warn!(
                "No display detected (DISPLAY/WAYLAND_DISPLAY unset); no window will be opened. \
                 Run on a machine with X or Wayland, or enable forwarding, for a live preview."
            );
            return PresentationSink::Headless(headless);
        }
        match Window::open(display, window_name) {
            Ok(window) => PresentationSink::Windowed(window),
            Err(err) => {
                warn!("Could not create window '{}', falling back to headless: {}", window_name, err);
                PresentationSink::Headless(headless)
            }
        }
    }

    pub fn is_windowed(&self) -> bool {
        matches!(self, PresentationSink::Windowed(_))
    }

    /// Shows or persists `frame`; `frame_index` counts from 0.
    pub fn present<F>(&mut self, frame: &F, frame_index: u64) -> Result<Flow>
    where
        D: Display<F>,
        W: SampleWriter<F>,
    {
        match self {
            PresentationSink::Windowed(window) => window.present(frame),
            PresentationSink::Headless(headless) => Ok(headless.present(frame, frame_index)),
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::capture::fake::FakeFrame;
    use crate::error::CamError;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    pub struct FakeDisplay {
        pub keys: Rc<RefCell<VecDeque<i32>>>,
        pub shown: Rc<Cell<u32>>,
        pub destroyed: Rc<Cell<u32>>,
        /// `None` makes the visibility query fail.
        pub visible: Option<bool>,
        pub refuse_window: bool,
    }

    impl FakeDisplay {
        pub fn visible() -> Self {
            Self {
                visible: Some(true),
                ..Self::default()
            }
        }
    }

    impl WindowSystem for FakeDisplay {
        fn named_window(&mut self, _name: &str) -> Result<()> {
            if self.refuse_window {
                return Err(CamError::backend("cannot connect to X server"));
            }
            Ok(())
        }

        fn poll_key(&mut self, _timeout_ms: i32) -> Result<i32> {
            Ok(self.keys.borrow_mut().pop_front().unwrap_or(-1))
        }

        fn window_visible(&mut self, _name: &str) -> Result<bool> {
            self.visible
                .ok_or_else(|| CamError::backend("getWindowProperty not implemented"))
        }

        fn destroy_all_windows(&mut self) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    impl Display<FakeFrame> for FakeDisplay {
        fn show(&mut self, _name: &str, _frame: &FakeFrame) -> Result<()> {
            self.shown.set(self.shown.get() + 1);
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    pub struct FakeWriter {
        pub writes: Rc<RefCell<Vec<PathBuf>>>,
        pub fail: bool,
    }

    impl SampleWriter<FakeFrame> for FakeWriter {
        fn write_sample(&mut self, path: &Path, _frame: &FakeFrame) -> Result<()> {
            if self.fail {
                return Err(CamError::backend("disk full"));
            }
            self.writes.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }
}
