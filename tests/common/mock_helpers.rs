//! Mock construction helpers

use channel_scaling::pipeline::{Item, Step};
use crossbeam_channel::{bounded, Receiver, Sender};
use mockall::mock;
use std::sync::{Arc, Mutex};

mock! {
    pub Worker {}

    impl Step for Worker {
        fn exec(&mut self, item: Item) -> Item;
    }
}

/// Step that blocks every execution until the test releases it
pub struct GatedStep {
    started: Sender<u64>,
    release: Receiver<()>,
}

impl Step for GatedStep {
    fn exec(&mut self, item: Item) -> Item {
        let _ = self.started.send(item.id);
        let _ = self.release.recv();
        item
    }
}

/// Factory for [`GatedStep`]s sharing one gate.
///
/// Returns the factory, a receiver of started item ids, and the release
/// sender: each `()` sent lets one execution finish; dropping it releases all.
pub fn gated_steps() -> (
    impl Fn() -> GatedStep + Send + Sync + 'static,
    Receiver<u64>,
    Sender<()>,
) {
    let (started_tx, started_rx) = bounded(64);
    let (release_tx, release_rx) = bounded(64);
    let factory = move || GatedStep {
        started: started_tx.clone(),
        release: release_rx.clone(),
    };
    (factory, started_rx, release_tx)
}

/// Step that logs the ids it sees
pub struct TaggingStep {
    seen: Arc<Mutex<Vec<u64>>>,
}

impl Step for TaggingStep {
    fn exec(&mut self, item: Item) -> Item {
        self.seen.lock().unwrap().push(item.id);
        item
    }
}

/// Factory for [`TaggingStep`]s sharing one log
pub fn tagging_steps() -> (
    impl Fn() -> TaggingStep + Send + Sync + 'static,
    Arc<Mutex<Vec<u64>>>,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let factory = move || TaggingStep {
        seen: Arc::clone(&log),
    };
    (factory, seen)
}
