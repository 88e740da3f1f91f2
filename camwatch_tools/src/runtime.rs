//! Process-level wiring shared by the executables.

use camwatch::ShutdownFlag;
use log::warn;

/// Logs to stderr at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Installs a Ctrl+C handler that raises the returned flag.
///
/// If the handler cannot be installed the run continues; Ctrl+C then falls
/// back to the default signal behaviour.
pub fn install_interrupt_handler() -> ShutdownFlag {
    let shutdown = ShutdownFlag::new();
    let handler_shutdown = shutdown.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_shutdown.raise()) {
        warn!("Failed to install Ctrl+C handler: {err}");
    }
    shutdown
}
