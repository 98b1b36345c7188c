use serde::{Deserialize, Serialize};

/// One byte received on the trigger line, stamped right after the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub code: u8,
    pub timestamp_ns: u64,
}

impl TriggerEvent {
    pub fn new(code: u8, timestamp_ns: u64) -> Self {
        Self { code, timestamp_ns }
    }

    pub fn matches_any(&self, codes: &[u8]) -> bool {
        codes.contains(&self.code)
    }
}

/// A timeline milestone as written to the timing log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingEvent {
    pub label: String,
    pub timestamp_ns: u64,
}

impl TimingEvent {
    pub fn new(label: impl Into<String>, timestamp_ns: u64) -> Self {
        Self {
            label: label.into(),
            timestamp_ns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_code_membership() {
        let ev = TriggerEvent::new(73, 1_000);
        assert!(ev.matches_any(&[73, 53]));
        assert!(!TriggerEvent::new(10, 1_000).matches_any(&[73, 53]));
        assert!(!ev.matches_any(&[]));
    }
}
