//! Ctrl+C handling for graceful cancellation.
//!
//! A single [`ShutdownHandler`] owns an `AtomicBool` that the walker, the
//! hasher pool and the action executor poll between items. Once it is set no
//! new file is opened for hashing and no further deletion starts; work
//! already in flight finishes, and the run exits with code 130.
//!
//! ```rust,no_run
//! use treedupe::signal::install_handler;
//! use treedupe::duplicates::FinderConfig;
//!
//! let handler = install_handler().unwrap();
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for the finder, walker and executor.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the handler can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// The hook can only be registered once per process. Later calls (several
/// `run_app` invocations in one test binary, for instance) get the same
/// handler back with its flag cleared.
///
/// # Errors
///
/// `InstallFailed` when ctrlc refuses the hook and no handler exists yet.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current item...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(GLOBAL_HANDLER.get().cloned().unwrap_or(handler))
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            // Another thread won the race; share whichever handler got stored
            log::debug!("Ctrl+C handler already registered, reusing it");
            let shared = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            shared.reset();
            Ok(shared.clone())
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}
