/// Linear session timeline. `Block` repeats once per configured block; the
/// controller tracks the block index itself.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Instructions,
    AwaitStartTrigger,
    InitialRest,
    Countdown,
    Block,
    End,
    Shutdown,
}

impl SessionPhase {
    /// Next phase in the timeline. `AwaitStartTrigger` is skipped when trigger
    /// monitoring is off. The controller stays in `Block` for every block and
    /// advances once the last one is done.
    pub fn next(&self, monitoring: bool) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Instructions if monitoring => AwaitStartTrigger,
            Instructions => InitialRest,
            AwaitStartTrigger => InitialRest,
            InitialRest => Countdown,
            Countdown => Block,
            Block => End,
            End => Shutdown,
            Shutdown => return None,
        })
    }

    /// Phases during which the operator may abort the session.
    pub fn allows_cancel(&self) -> bool {
        !matches!(self, Self::Shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitoring_adds_start_gate() {
        assert_eq!(
            SessionPhase::Instructions.next(true),
            Some(SessionPhase::AwaitStartTrigger)
        );
        assert_eq!(
            SessionPhase::Instructions.next(false),
            Some(SessionPhase::InitialRest)
        );
    }

    #[test]
    fn timeline_ends_at_shutdown() {
        let mut phase = SessionPhase::default();
        let mut seen = vec![phase];
        while let Some(next) = phase.next(true) {
            seen.push(next);
            phase = next;
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(phase, SessionPhase::Shutdown);
        assert!(!phase.allows_cancel());
    }
}
