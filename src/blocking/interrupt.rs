use crate::error::{FixtureError, Result};
use signal_hook::consts::SIGINT;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Operator interrupt flag.
///
/// Long loops call [check](Interrupt::check) at every record boundary, so an interrupt
/// stops the run cleanly instead of killing it in the middle of a write.  A second
/// interrupt while the first one is pending terminates the process.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    /// Register SIGINT handlers and return the shared flag.
    pub fn register() -> Result<Interrupt> {
        let flag = Arc::new(AtomicBool::new(false));
        // order matters: the shutdown hook must see the flag before it gets set.
        signal_hook::flag::register_conditional_shutdown(SIGINT, 1, Arc::clone(&flag))
            .map_err(FixtureError::SignalError)?;
        signal_hook::flag::register(SIGINT, Arc::clone(&flag))
            .map_err(FixtureError::SignalError)?;
        Ok(Interrupt { flag })
    }

    /// A flag no signal is attached to.
    pub fn never() -> Interrupt {
        Interrupt::default()
    }

    /// Mark as interrupted.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// is an interrupt pending?
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return [FixtureError::Interrupted] when an interrupt is pending.
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            Err(FixtureError::Interrupted)
        } else {
            Ok(())
        }
    }
}
