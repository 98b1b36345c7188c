use crate::{CancellationFlag, EventQueue};

/// State shared between the trigger listener and the presentation loop.
/// Cloning yields another handle onto the same queue and flag.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub queue: EventQueue,
    pub cancel: CancellationFlag,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }
}
