pub mod event;
pub mod milestone;
pub mod phase;
pub mod stimulus;

pub use event::{TimingEvent, TriggerEvent};
pub use milestone::Milestone;
pub use phase::SessionPhase;
pub use stimulus::{ReadingCondition, Screen, TextRole, TextStim};
