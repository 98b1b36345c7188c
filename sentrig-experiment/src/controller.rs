use crate::config::SessionConfig;
use crate::csv_log::SessionLogs;
use crate::display::Display;
use crate::error::{LogError, SessionError};
use crate::stimuli::StimulusSet;
use rand::Rng;
use sentrig_core::{
    Milestone, ReadingCondition, Screen, SessionPhase, TextStim, TimingEvent, TriggerEvent,
};
use sentrig_timing::Timer;
use sentrig_trigger::{ListenerExit, SessionContext, TriggerListener};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Completed,
    /// The operator cancelled while `phase` was running.
    Aborted { phase: SessionPhase },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub status: SessionStatus,
    /// Rows written to the trigger log, start trigger included.
    pub triggers_logged: u64,
    pub start_trigger_ns: Option<u64>,
    pub listener_exit: Option<ListenerExit>,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Why the timeline stopped early.
enum Interrupt {
    Cancelled,
    Failed(SessionError),
}

impl From<SessionError> for Interrupt {
    fn from(e: SessionError) -> Self {
        Interrupt::Failed(e)
    }
}

impl From<LogError> for Interrupt {
    fn from(e: LogError) -> Self {
        Interrupt::Failed(SessionError::Log(e))
    }
}

/// Runs the presentation timeline on the calling thread and owns both logs.
///
/// Every timed wait is bracketed by the same cancellation checkpoint. On any
/// exit the controller sets the session's cancellation flag, joins the trigger
/// listener, drains what is left on the queue into the trigger log and closes
/// the display.
pub struct SessionController<D, T, R>
where
    D: Display,
    T: Timer,
    R: Rng,
{
    pub config: SessionConfig,
    pub phase: SessionPhase,
    pub block: usize,
    stimuli: StimulusSet,
    display: D,
    timer: T,
    rng: R,
    context: SessionContext,
    listener: Option<TriggerListener>,
    logs: SessionLogs,
    triggers_logged: u64,
    start_trigger_ns: Option<u64>,
}

impl<D, T, R> SessionController<D, T, R>
where
    D: Display,
    T: Timer,
    R: Rng,
{
    pub fn new(
        config: SessionConfig,
        logs: SessionLogs,
        context: SessionContext,
        display: D,
        timer: T,
        rng: R,
    ) -> Self {
        let stimuli = config.stimulus_set();
        Self {
            config,
            phase: SessionPhase::default(),
            block: 0,
            stimuli,
            display,
            timer,
            rng,
            context,
            listener: None,
            logs,
            triggers_logged: 0,
            start_trigger_ns: None,
        }
    }

    /// Hands over the listener feeding this session's queue; it is stopped on
    /// every exit path.
    pub fn with_listener(mut self, listener: TriggerListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// True when triggers are captured and gate the session start.
    pub fn monitoring(&self) -> bool {
        self.logs.triggers.is_some()
    }

    pub fn run(mut self) -> Result<SessionOutcome, SessionError> {
        log::info!(
            "Session started: {} blocks x {} trials, trigger monitoring {}",
            self.config.design.n_blocks,
            self.config.design.trials_per_block,
            if self.monitoring() { "on" } else { "off" }
        );

        let status = match self.run_timeline() {
            Ok(()) => Ok(SessionStatus::Completed),
            Err(Interrupt::Cancelled) => {
                let phase = self.phase;
                log::warn!(
                    "Session aborted by operator during {:?} (block {})",
                    phase,
                    self.block
                );
                self.record(Milestone::SessionAborted)
                    .map(|_| SessionStatus::Aborted { phase })
                    .map_err(SessionError::from)
            }
            Err(Interrupt::Failed(e)) => Err(e),
        };

        let shutdown = self.shutdown();
        let status = match status {
            Ok(status) => status,
            Err(e) => {
                if let Err(late) = &shutdown {
                    log::error!("Shutdown after failure also failed: {}", late);
                }
                return Err(e);
            }
        };
        let listener_exit = shutdown?;

        let outcome = SessionOutcome {
            status,
            triggers_logged: self.triggers_logged,
            start_trigger_ns: self.start_trigger_ns,
            listener_exit,
        };
        log::info!(
            "Session finished: {:?}, {} trigger(s) logged",
            outcome.status,
            outcome.triggers_logged
        );
        Ok(outcome)
    }

    fn run_timeline(&mut self) -> Result<(), Interrupt> {
        let durations = self.config.durations.clone();
        let n_blocks = self.config.design.n_blocks;

        self.phase = SessionPhase::Instructions;
        let instructions = Screen::Text(TextStim::body(self.config.texts.instructions.clone()));
        self.present(&instructions, Milestone::InstructionScreen, durations.instruction())?;
        self.advance();

        if self.phase == SessionPhase::AwaitStartTrigger {
            self.await_start_trigger()?;
            self.advance();
        }

        let rest = Screen::Text(TextStim::cue(self.config.texts.rest.clone()));
        self.present(&rest, Milestone::InitialRest, durations.rest())?;
        self.advance();

        self.countdown(None)?;
        self.advance();

        for block in 1..=n_blocks {
            self.block = block;
            self.run_block(block)?;
            if block < n_blocks {
                self.present(&rest, Milestone::BlockRest { block }, durations.rest())?;
                self.countdown(Some(block))?;
            }
        }
        self.advance();

        let end = Screen::Text(TextStim::body(self.config.texts.end.clone()));
        self.present(&end, Milestone::EndScreen, durations.end())
    }

    fn advance(&mut self) {
        if let Some(next) = self.phase.next(self.monitoring()) {
            log::debug!("Phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }

    fn run_block(&mut self, block: usize) -> Result<(), Interrupt> {
        let durations = self.config.durations.clone();
        self.record(Milestone::BlockStart { block })?;

        let sentences =
            self.stimuli
                .shuffled_block(block, self.config.design.trials_per_block, &mut self.rng);

        let cue = match ReadingCondition::for_block(block) {
            ReadingCondition::OutLoud => &self.config.texts.cue_out_loud,
            ReadingCondition::Silently => &self.config.texts.cue_silently,
        };
        let cue = Screen::Text(TextStim::cue(cue.clone()));
        self.present(&cue, Milestone::BlockCue { block }, durations.cue())?;

        let fixation = Screen::Text(TextStim::fixation());
        for (i, sentence) in sentences.into_iter().enumerate() {
            let trial = i + 1;
            let screen = Screen::Text(TextStim::body(sentence));
            self.present(&screen, Milestone::TrialDisplay { block, trial }, durations.trial())?;
            self.drain_triggers()?;
            self.present(
                &fixation,
                Milestone::TrialFixation { block, trial },
                durations.fixation(),
            )?;
        }
        Ok(())
    }

    /// One tick per remaining count, from `countdown_ticks` down to 1.
    fn countdown(&mut self, after_block: Option<usize>) -> Result<(), Interrupt> {
        let tick = self.config.durations.countdown_tick();
        for remaining in (1..=self.config.design.countdown_ticks).rev() {
            let screen = Screen::Text(TextStim::body(self.config.texts.countdown(remaining)));
            let milestone = match after_block {
                Some(block) => Milestone::BlockCountdown { block, remaining },
                None => Milestone::InitialCountdown { remaining },
            };
            self.present(&screen, milestone, tick)?;
        }
        Ok(())
    }

    /// Keeps the instruction screen up until a start code arrives. Codes before
    /// the match and the match itself go to the trigger log; later codes stay
    /// queued for the next drain.
    fn await_start_trigger(&mut self) -> Result<(), Interrupt> {
        let start_codes = self.config.trigger.start_codes.clone();
        let poll = self.config.trigger.poll_timeout();
        log::info!("Waiting for start trigger {:?}", start_codes);

        let mut warned_dead = false;
        loop {
            self.checkpoint()?;

            let scan = self.context.queue.drain_until(|e| e.matches_any(&start_codes));
            self.log_triggers(&scan.discarded)?;
            if let Some(start) = scan.matched {
                self.log_triggers(&[start])?;
                self.start_trigger_ns = Some(start.timestamp_ns);
                self.record_at(Milestone::ScannerStart, start.timestamp_ns)?;
                log::info!(
                    "Start trigger {} received at {}",
                    start.code,
                    start.timestamp_ns
                );
                return Ok(());
            }

            if !warned_dead && self.listener.as_ref().is_some_and(|l| !l.is_running()) {
                log::warn!("Trigger listener has stopped; only escape can end this wait");
                warned_dead = true;
            }
            self.display.hold(poll);
        }
    }

    /// Shows `screen`, logs `milestone` with the post-flip time, then waits
    /// `duration` between two cancellation checks.
    fn present(
        &mut self,
        screen: &Screen,
        milestone: Milestone,
        duration: Duration,
    ) -> Result<(), Interrupt> {
        self.display
            .show(screen)
            .map_err(|e| SessionError::Display(format!("{e:#}")))?;
        self.record(milestone)?;
        self.checkpoint()?;
        self.display.hold(duration);
        self.checkpoint()
    }

    fn checkpoint(&mut self) -> Result<(), Interrupt> {
        if !self.phase.allows_cancel() {
            return Ok(());
        }
        if self.display.cancel_requested() || self.context.cancel.is_cancelled() {
            self.context.cancel.cancel();
            return Err(Interrupt::Cancelled);
        }
        Ok(())
    }

    fn record(&mut self, milestone: Milestone) -> Result<u64, LogError> {
        let now = self.timer.now();
        self.record_at(milestone, now)?;
        Ok(now)
    }

    fn record_at(&mut self, milestone: Milestone, timestamp_ns: u64) -> Result<(), LogError> {
        let event = TimingEvent::new(milestone.to_string(), timestamp_ns);
        log::debug!("{} at {}", event.label, event.timestamp_ns);
        self.logs.timing.record(&event)
    }

    fn drain_triggers(&mut self) -> Result<(), LogError> {
        let events = self.context.queue.drain_all();
        self.log_triggers(&events)
    }

    fn log_triggers(&mut self, events: &[TriggerEvent]) -> Result<(), LogError> {
        if events.is_empty() {
            return Ok(());
        }
        match self.logs.triggers.as_mut() {
            Some(log) => self.triggers_logged += log.append(events)? as u64,
            None => log::debug!("Dropping {} trigger(s), monitoring is off", events.len()),
        }
        Ok(())
    }

    /// Runs on every exit path: cancel, join the listener, final drain, close.
    fn shutdown(&mut self) -> Result<Option<ListenerExit>, LogError> {
        self.phase = SessionPhase::Shutdown;
        self.context.cancel.cancel();

        let exit = self.listener.take().map(TriggerListener::stop);
        if let Some(exit) = &exit {
            log::info!(
                "Trigger listener stopped after {} byte(s): {:?}",
                exit.received(),
                exit
            );
        }

        let drained = self.drain_triggers();
        self.display.close();
        drained.map(|_| exit)
    }
}
