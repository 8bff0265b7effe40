//! Cooperative cancellation.
//!
//! A [`CancellationToken`] wraps a shared `AtomicBool`. The scanner polls it
//! before claiming each file; a file already being processed always runs to
//! completion. The binary wires Ctrl+C to a token via
//! [`install_ctrlc_handler`].
//!
//! ```
//! use todoboard::cancel::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let worker_view = token.clone();
//! token.cancel();
//! assert!(worker_view.is_cancelled());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared "cancellation requested" flag.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing flag.
    #[must_use]
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The underlying flag.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Error installing the Ctrl+C hook.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// `ctrlc` refused the handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_TOKEN: OnceLock<CancellationToken> = OnceLock::new();

/// Install a process-wide Ctrl+C hook that cancels the returned token.
///
/// The hook can only be registered once per process. Later calls return the
/// same token, reset to "not cancelled". If another handler already owns
/// the signal, an unhooked token is returned so callers such as tests can
/// still cancel manually.
///
/// # Errors
///
/// Currently always succeeds; the `Result` leaves room for platforms where
/// a missing hook should be fatal.
pub fn install_ctrlc_handler() -> Result<CancellationToken, SignalError> {
    if let Some(token) = GLOBAL_TOKEN.get() {
        token.reset();
        return Ok(token.clone());
    }

    let token = CancellationToken::new();
    let hook = token.clone();

    let installed = ctrlc::set_handler(move || {
        hook.cancel();
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing in-flight files...");
        let _ = std::io::stderr().flush();
        log::info!("Cancellation requested by signal");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_TOKEN.set(token.clone());
            Ok(token)
        }
        Err(e) => {
            if let Some(existing) = GLOBAL_TOKEN.get() {
                existing.reset();
                return Ok(existing.clone());
            }
            log::debug!("Ctrl+C hook unavailable ({}), using unhooked token", e);
            let fallback = CancellationToken::new();
            let _ = GLOBAL_TOKEN.set(fallback.clone());
            Ok(fallback)
        }
    }
}
