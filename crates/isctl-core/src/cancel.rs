use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Cooperative cancellation for blocking waits.
///
/// Clones share one flag. [`sleep`](Self::sleep) wakes as soon as any clone
/// is cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `duration` or until cancelled. Returns true if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Cancel `token` on the first Ctrl-C; exit on the second.
pub fn install_signal_handler(token: CancelToken) {
    let _ = ctrlc::set_handler(move || {
        if token.is_cancelled() {
            std::process::exit(1);
        }
        token.cancel();
        eprintln!("\ncancel requested, stopping...");
    });
}
