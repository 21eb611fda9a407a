//! Close-once cancellation signals.
//!
//! A done signal is a channel nobody ever sends on. Closing it (dropping the
//! only sender) wakes every receiver at once, so it doubles as a broadcast
//! that can sit in a `select!` next to a blocking send.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::Mutex;

/// Create a linked `(Canceller, DoneSignal)` pair.
pub fn done_pair() -> (Canceller, DoneSignal) {
    let (tx, rx) = bounded(0);
    (
        Canceller {
            tx: Mutex::new(Some(tx)),
        },
        DoneSignal { rx },
    )
}

/// Owning side of a done signal. Closes it at most once.
#[derive(Debug)]
pub struct Canceller {
    tx: Mutex<Option<Sender<()>>>,
}

impl Canceller {
    /// Close the signal. Returns `true` only for the call that closed it.
    pub fn cancel(&self) -> bool {
        let sender = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        sender.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        match self.tx.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

/// Read-only, clonable view of a done signal.
#[derive(Debug, Clone)]
pub struct DoneSignal {
    rx: Receiver<()>,
}

impl DoneSignal {
    /// A signal that is already closed.
    pub fn closed() -> Self {
        let (canceller, signal) = done_pair();
        canceller.cancel();
        signal
    }

    /// Non-blocking check.
    pub fn is_done(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Block until the signal is closed.
    pub fn wait(&self) {
        let _ = self.rx.recv();
    }

    /// Receiver for use in `crossbeam_channel::select!`; a receive on it
    /// completes (with an error) once the signal is closed.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
