//! Single-fire completion signal
//!
//! One writer fires it once; any number of waiters observe the same outcome.
//! Built on `tokio::sync::watch` so late subscribers still see a fired signal.

use tokio::sync::watch;

/// Writer side, owned by the registry entry
#[derive(Debug)]
pub struct Completion {
    tx: watch::Sender<bool>,
}

/// Reader side handed to waiters
pub type CompletionReceiver = watch::Receiver<bool>;

impl Completion {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Fire the signal. Returns `false` if it had already fired.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> CompletionReceiver {
        self.tx.subscribe()
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}
