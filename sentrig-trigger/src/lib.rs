//! Background capture of single-byte trigger pulses from a serial line.
//!
//! A [`TriggerListener`] owns the serial connection and pushes timestamped
//! [`TriggerEvent`](sentrig_core::TriggerEvent)s onto an [`EventQueue`]; the
//! presentation loop drains that queue at its own checkpoints. Both sides hold
//! the same [`SessionContext`], whose [`CancellationFlag`] stops the listener.

pub mod cancel;
pub mod context;
pub mod error;
pub mod listener;
pub mod port;
pub mod queue;

pub use cancel::CancellationFlag;
pub use context::SessionContext;
pub use error::{Result, TriggerError};
pub use listener::{ListenerExit, TriggerListener};
pub use port::{
    SerialSettings, TriggerPort, available_port_names, ensure_port_available, open_serial,
};
pub use queue::{EventQueue, StartScan};
