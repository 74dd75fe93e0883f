//! Scan cancellation and Ctrl+C handling.
//!
//! A [`CancelToken`] is a cloneable handle around a shared `AtomicBool`.
//! The walker, the hashing tasks and the coordinating loop all observe the
//! same token; once cancelled it stays cancelled for the rest of the scan.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupesweep::signal::install_handler;
//!
//! let token = install_handler().expect("Failed to install signal handler");
//!
//! // Pass clones of the token to the finder; Ctrl+C cancels them all.
//! if token.is_cancelled() {
//!     println!("Scan cancelled");
//! }
//! ```
//!
//! When a signal arrives the token is cancelled, a short notice is printed to
//! stderr, and the application exits with code 130 (128 + SIGINT) after the
//! finder has drained its in-flight work.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared, monotonic cancellation flag.
///
/// Clones observe the same flag. `CancelToken` is `Send` and `Sync`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the process-wide token can back another scan.
    ///
    /// Only meaningful between scans.
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

static GLOBAL_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Install a Ctrl+C handler that cancels the returned token.
///
/// The handler is registered once per process. Later calls reset and return
/// the same token, so repeated `run_app` calls in tests work. If another
/// component already owns the signal hook, an unhooked token is returned and
/// can still be cancelled manually.
///
/// # Errors
///
/// Currently always succeeds; registration conflicts fall back to an
/// unhooked token.
pub fn install_handler() -> Result<CancelToken, SignalError> {
    if let Some(token) = GLOBAL_TOKEN.get() {
        token.reset();
        return Ok(token.clone());
    }

    let token = CancelToken::new();
    let hooked = token.clone();

    match ctrlc::set_handler(move || {
        hooked.cancel();

        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing in-flight work...");
        let _ = std::io::stderr().flush();

        log::info!("Cancellation signal received");
    }) {
        Ok(()) => {
            let _ = GLOBAL_TOKEN.set(token.clone());
            Ok(token)
        }
        Err(e) => {
            if let Some(existing) = GLOBAL_TOKEN.get() {
                existing.reset();
                return Ok(existing.clone());
            }
            log::debug!("Ctrl+C handler already registered ({e}), using unhooked token");
            let fallback = CancelToken::new();
            let _ = GLOBAL_TOKEN.set(fallback.clone());
            Ok(fallback)
        }
    }
}
