use std::fmt;

/// Timeline positions written to the timing log. Block, trial and countdown
/// indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Milestone {
    InstructionScreen,
    ScannerStart,
    InitialRest,
    InitialCountdown { remaining: u32 },
    BlockStart { block: usize },
    BlockCue { block: usize },
    TrialDisplay { block: usize, trial: usize },
    TrialFixation { block: usize, trial: usize },
    BlockRest { block: usize },
    BlockCountdown { block: usize, remaining: u32 },
    EndScreen,
    SessionAborted,
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Milestone::*;
        match self {
            InstructionScreen => f.write_str("instruction_screen_display"),
            ScannerStart => f.write_str("scanner_start_time"),
            InitialRest => f.write_str("initial_rest_screen_display"),
            InitialCountdown { remaining } => write!(f, "initial_countdown_{remaining}"),
            BlockStart { block } => write!(f, "block_{block}_start_time"),
            BlockCue { block } => write!(f, "block_{block}_cue_display"),
            TrialDisplay { block, trial } => write!(f, "block_{block}_trial_{trial}_display"),
            TrialFixation { block, trial } => write!(f, "block_{block}_trial_{trial}_fixation"),
            BlockRest { block } => write!(f, "block_{block}_rest_screen_display"),
            BlockCountdown { block, remaining } => {
                write!(f, "block_{block}_countdown_{remaining}")
            }
            EndScreen => f.write_str("end_screen_display"),
            SessionAborted => f.write_str("session_aborted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_log_format() {
        assert_eq!(
            Milestone::TrialDisplay { block: 3, trial: 2 }.to_string(),
            "block_3_trial_2_display"
        );
        assert_eq!(
            Milestone::TrialFixation { block: 20, trial: 4 }.to_string(),
            "block_20_trial_4_fixation"
        );
        assert_eq!(Milestone::ScannerStart.to_string(), "scanner_start_time");
        assert_eq!(
            Milestone::BlockCountdown { block: 1, remaining: 3 }.to_string(),
            "block_1_countdown_3"
        );
        assert_eq!(
            Milestone::InitialCountdown { remaining: 1 }.to_string(),
            "initial_countdown_1"
        );
    }
}
