// THEORY:
// The environment probe answers one question at startup: is there a display
// surface we can open a window on? On Linux that means an X11 `DISPLAY` or a
// Wayland `WAYLAND_DISPLAY`. The answer is computed once and carried through
// the run as a `DisplayMode`, so the loop never re-reads the environment.

use std::env;
use std::ffi::OsStr;

pub const DISPLAY_VAR: &str = "DISPLAY";
pub const WAYLAND_DISPLAY_VAR: &str = "WAYLAND_DISPLAY";

/// How frames are presented for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Windowed,
    Headless,
}

impl DisplayMode {
    /// Reads the process environment and picks the mode.
    pub fn detect() -> Self {
        let display = env::var_os(DISPLAY_VAR);
        let wayland = env::var_os(WAYLAND_DISPLAY_VAR);
        Self::from_flag(display_available_from(display.as_deref(), wayland.as_deref()))
    }

    pub fn from_flag(display_available: bool) -> Self {
        if display_available {
            DisplayMode::Windowed
        } else {
            DisplayMode::Headless
        }
    }

    pub fn is_windowed(self) -> bool {
        self == DisplayMode::Windowed
    }
}

/// True when either identifier is set to a non-empty value.
pub fn display_available_from(display: Option<&OsStr>, wayland: Option<&OsStr>) -> bool {
    let set = |v: Option<&OsStr>| v.is_some_and(|s| !s.is_empty());
    set(display) || set(wayland)
}
