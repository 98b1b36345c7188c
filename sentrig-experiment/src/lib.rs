pub mod config;
pub mod controller;
pub mod csv_log;
pub mod display;
pub mod error;
pub mod stimuli;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{
    DesignConfig, DisplayConfig, DurationsConfig, SessionConfig, TextsConfig, TriggerConfig,
};
pub use controller::{SessionController, SessionOutcome, SessionStatus};
pub use csv_log::{CsvLog, LogPaths, SessionLogs, TimingLog, TriggerLog};
pub use display::Display;
pub use error::{ConfigError, LogError, SessionError};
pub use stimuli::StimulusSet;
