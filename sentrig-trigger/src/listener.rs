use crate::CancellationFlag;
use crate::context::SessionContext;
use crate::error::Result;
use crate::port::{SerialSettings, TriggerPort, open_serial};
use sentrig_core::TriggerEvent;
use sentrig_timing::Timer;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Why the polling thread ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerExit {
    /// The cancellation flag was observed.
    Cancelled { received: u64 },
    /// The device reported an I/O error; no further triggers are captured.
    DeviceFailed { received: u64, error: String },
    /// The polling thread panicked.
    Panicked,
}

impl ListenerExit {
    pub fn received(&self) -> u64 {
        match self {
            ListenerExit::Cancelled { received } | ListenerExit::DeviceFailed { received, .. } => {
                *received
            }
            ListenerExit::Panicked => 0,
        }
    }
}

/// Handle to the background polling thread. Stopping (or dropping) the handle
/// sets the session's cancellation flag and joins the thread, which closes
/// the port on its way out.
#[derive(Debug)]
pub struct TriggerListener {
    cancel: CancellationFlag,
    handle: Option<JoinHandle<ListenerExit>>,
}

impl TriggerListener {
    /// Opens the configured serial port and starts polling it. Fails when the
    /// port is not enumerable or cannot be opened.
    pub fn start<T: Timer>(
        settings: &SerialSettings,
        context: &SessionContext,
        timer: T,
    ) -> Result<Self> {
        let port = open_serial(settings)?;
        log::info!("Serial port {} opened", settings.port);
        Self::spawn(port, settings.poll_timeout, context, timer)
    }

    /// Starts polling an already open port.
    pub fn spawn<P: TriggerPort, T: Timer>(
        port: P,
        poll_timeout: Duration,
        context: &SessionContext,
        timer: T,
    ) -> Result<Self> {
        let ctx = context.clone();
        let handle = thread::Builder::new()
            .name("trigger-listener".to_string())
            .spawn(move || poll_loop(port, poll_timeout, &ctx, &timer))?;

        Ok(Self {
            cancel: context.cancel.clone(),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancels the session and waits for the polling thread to finish.
    pub fn stop(mut self) -> ListenerExit {
        self.shutdown().unwrap_or(ListenerExit::Panicked)
    }

    fn shutdown(&mut self) -> Option<ListenerExit> {
        self.cancel.cancel();
        let handle = self.handle.take()?;
        Some(handle.join().unwrap_or(ListenerExit::Panicked))
    }
}

impl Drop for TriggerListener {
    fn drop(&mut self) {
        if let Some(exit) = self.shutdown() {
            log::debug!("Trigger listener stopped on drop: {:?}", exit);
        }
    }
}

fn poll_loop<P: TriggerPort, T: Timer>(
    mut port: P,
    poll_timeout: Duration,
    ctx: &SessionContext,
    timer: &T,
) -> ListenerExit {
    let mut received = 0u64;

    let exit = loop {
        if ctx.cancel.is_cancelled() {
            break ListenerExit::Cancelled { received };
        }

        match port.bytes_available() {
            Ok(0) => {
                ctx.cancel.wait_timeout(poll_timeout);
            }
            Ok(_) => match port.read_byte() {
                Ok(code) => {
                    let timestamp_ns = timer.now();
                    ctx.queue.push(TriggerEvent::new(code, timestamp_ns));
                    received += 1;
                    log::debug!("Trigger {} received at {}", code, timestamp_ns);
                }
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => {
                    log::error!("Serial read error: {}", e);
                    break ListenerExit::DeviceFailed {
                        received,
                        error: e.to_string(),
                    };
                }
            },
            Err(e) => {
                log::error!("Serial error: {}", e);
                break ListenerExit::DeviceFailed {
                    received,
                    error: e.to_string(),
                };
            }
        }
    };

    drop(port);
    log::info!("Serial port closed after {} trigger(s)", received);
    exit
}
