//! In-memory stand-ins for driving a session without a window.

use crate::display::Display;
use parking_lot::Mutex;
use sentrig_core::Screen;
use sentrig_timing::Timer;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Show(Screen),
    Hold(Duration),
    Close,
}

type ShowPredicate = Box<dyn Fn(&Screen) -> bool + Send>;
type HoldHook = Box<dyn FnMut(Duration) + Send>;

/// Records every call and advances a timer on `hold` instead of sleeping,
/// so a full session runs instantly under a `ManualTimer`.
pub struct ScriptedDisplay<T: Timer> {
    timer: T,
    calls: Arc<Mutex<Vec<DisplayCall>>>,
    polls: usize,
    cancel_on_poll: Option<usize>,
    cancel_when: Option<ShowPredicate>,
    on_hold: Option<HoldHook>,
    pending_cancel: bool,
}

impl<T: Timer> ScriptedDisplay<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            calls: Arc::new(Mutex::new(Vec::new())),
            polls: 0,
            cancel_on_poll: None,
            cancel_when: None,
            on_hold: None,
            pending_cancel: false,
        }
    }

    /// Reports a cancel request on the `poll`-th call to `cancel_requested`
    /// (1-based).
    pub fn cancel_on_poll(mut self, poll: usize) -> Self {
        self.cancel_on_poll = Some(poll);
        self
    }

    /// Queues a cancel request as soon as a matching screen is shown.
    pub fn cancel_when_shown<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Screen) -> bool + Send + 'static,
    {
        self.cancel_when = Some(Box::new(predicate));
        self
    }

    /// Runs `hook` at the start of every hold, before the clock moves.
    pub fn on_hold<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Duration) + Send + 'static,
    {
        self.on_hold = Some(Box::new(hook));
        self
    }

    /// Shared handle onto the call record; stays valid after the display has
    /// been moved into a controller.
    pub fn calls(&self) -> Arc<Mutex<Vec<DisplayCall>>> {
        Arc::clone(&self.calls)
    }
}

impl<T: Timer> Display for ScriptedDisplay<T> {
    fn show(&mut self, screen: &Screen) -> anyhow::Result<()> {
        self.calls.lock().push(DisplayCall::Show(screen.clone()));
        if self.cancel_when.as_ref().is_some_and(|pred| pred(screen)) {
            self.pending_cancel = true;
        }
        Ok(())
    }

    fn cancel_requested(&mut self) -> bool {
        self.polls += 1;
        if self.cancel_on_poll == Some(self.polls) {
            self.pending_cancel = true;
        }
        std::mem::take(&mut self.pending_cancel)
    }

    fn hold(&mut self, duration: Duration) {
        self.calls.lock().push(DisplayCall::Hold(duration));
        if let Some(hook) = self.on_hold.as_mut() {
            hook(duration);
        }
        self.timer.sleep(duration);
    }

    fn close(&mut self) {
        self.calls.lock().push(DisplayCall::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrig_core::TextStim;
    use sentrig_timing::ManualTimer;

    #[test]
    fn hold_advances_manual_clock() {
        let timer = ManualTimer::starting_at(1_000);
        let mut display = ScriptedDisplay::new(timer.clone());
        display.hold(Duration::from_millis(5));
        assert_eq!(timer.now(), 1_000 + 5_000_000);
        assert_eq!(
            *display.calls().lock(),
            vec![DisplayCall::Hold(Duration::from_millis(5))]
        );
    }

    #[test]
    fn cancel_is_reported_once() {
        let mut display = ScriptedDisplay::new(ManualTimer::starting_at(0))
            .cancel_when_shown(|s| s.text() == Some("Rest"));
        display.show(&Screen::Text(TextStim::body("hello"))).unwrap();
        assert!(!display.cancel_requested());
        display.show(&Screen::Text(TextStim::cue("Rest"))).unwrap();
        assert!(display.cancel_requested());
        assert!(!display.cancel_requested());
    }
}
