use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use nix::sys::signal::{self, SigHandler, Signal};

use crate::scanner::CancelToken;

static CANCEL: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Route SIGINT and SIGTERM to `cancel`.
///
/// The first signal requests cooperative cancellation; a second one
/// restores the default disposition and re-raises, so a stuck prompt can
/// still be interrupted. Only the first call installs anything.
pub fn install_cancel_handlers(cancel: &CancelToken) -> nix::Result<()> {
    if CANCEL.set(cancel.flag()).is_err() {
        tracing::debug!("signal handlers already installed");
        return Ok(());
    }

    // SAFETY: the handler only performs atomic loads/stores and
    // async-signal-safe sigaction/raise calls.
    unsafe {
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_cancel))?;
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_cancel))?;
    }
    Ok(())
}

extern "C" fn handle_cancel(signum: i32) {
    let Some(flag) = CANCEL.get() else {
        return;
    };
    if !flag.swap(true, Ordering::SeqCst) {
        return;
    }
    if let Ok(sig) = Signal::try_from(signum) {
        // SAFETY: resetting to the default handler is async-signal-safe.
        unsafe {
            let _ = signal::signal(sig, SigHandler::SigDfl);
        }
        let _ = signal::raise(sig);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test only: the handler state is process-wide and a second
    // delivered signal would terminate the test binary.
    #[test]
    fn test_sigterm_cancels_installed_token() {
        let cancel = CancelToken::new();
        assert!(install_cancel_handlers(&cancel).is_ok());

        let other = CancelToken::new();
        assert!(install_cancel_handlers(&other).is_ok());

        signal::raise(Signal::SIGTERM).unwrap();
        assert!(cancel.is_cancelled());
        assert!(!other.is_cancelled());
    }
}
