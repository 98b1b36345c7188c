use crossbeam_channel::{Receiver, Sender, TryRecvError};
use sentrig_core::TriggerEvent;

/// Unbounded FIFO shared by the listener (producer) and the presentation loop
/// (consumer). Pushing never blocks; draining never waits.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: Sender<TriggerEvent>,
    rx: Receiver<TriggerEvent>,
}

/// Result of scanning the queue for a start trigger.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StartScan {
    /// Events taken off the queue before the match, in arrival order.
    pub discarded: Vec<TriggerEvent>,
    pub matched: Option<TriggerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    pub fn push(&self, event: TriggerEvent) {
        // Both ends live in `self`, so the channel cannot be disconnected here.
        let _ = self.tx.send(event);
    }

    /// Everything queued right now, oldest first. An event pushed while the
    /// drain is running is either returned here or left for the next drain.
    pub fn drain_all(&self) -> Vec<TriggerEvent> {
        self.rx.try_iter().collect()
    }

    /// Takes events one at a time until one satisfies `is_start`. Events queued
    /// behind the match are left in place.
    pub fn drain_until<F>(&self, mut is_start: F) -> StartScan
    where
        F: FnMut(&TriggerEvent) -> bool,
    {
        let mut scan = StartScan::default();
        loop {
            match self.rx.try_recv() {
                Ok(event) if is_start(&event) => {
                    scan.matched = Some(event);
                    return scan;
                }
                Ok(event) => scan.discarded.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return scan,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
