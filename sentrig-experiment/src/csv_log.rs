//! Append-only CSV logs.
//!
//! Every row is flushed and synced to disk before `append` returns, so a crash
//! loses at most the row being written.

use crate::error::LogError;
use sentrig_core::{TimingEvent, TriggerEvent};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub const TIMING_HEADER: [&str; 2] = ["event", "abs_time"];
pub const TRIGGER_HEADER: [&str; 2] = ["trigger_event", "abs_time"];

/// A two-column CSV file opened for append. The header is written only when
/// the file is empty, so reopening an existing log keeps adding rows.
#[derive(Debug)]
pub struct CsvLog {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvLog {
    pub fn open(path: impl Into<PathBuf>, header: [&str; 2]) -> Result<Self, LogError> {
        let path = path.into();
        let open_err = |source| LogError::Open {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_err)?;
        let empty = file.metadata().map_err(open_err)?.len() == 0;

        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let mut log = Self { path, writer };
        if empty {
            log.write_row(header[0], header[1])?;
        }
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, key: &str, timestamp_ns: u64) -> Result<(), LogError> {
        self.write_row(key, &timestamp_ns.to_string())
    }

    fn write_row(&mut self, first: &str, second: &str) -> Result<(), LogError> {
        self.writer
            .write_record([first, second])
            .and_then(|_| self.writer.flush().map_err(csv::Error::from))
            .map_err(|source| LogError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|source| LogError::Sync {
                path: self.path.clone(),
                source,
            })
    }
}

/// Timeline milestones: `event, abs_time`.
#[derive(Debug)]
pub struct TimingLog(CsvLog);

impl TimingLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        CsvLog::open(path, TIMING_HEADER).map(Self)
    }

    pub fn record(&mut self, event: &TimingEvent) -> Result<(), LogError> {
        self.0.append(&event.label, event.timestamp_ns)
    }

    pub fn path(&self) -> &Path {
        self.0.path()
    }
}

/// Raw trigger bytes: `trigger_event, abs_time`.
#[derive(Debug)]
pub struct TriggerLog(CsvLog);

impl TriggerLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        CsvLog::open(path, TRIGGER_HEADER).map(Self)
    }

    pub fn append(&mut self, events: &[TriggerEvent]) -> Result<usize, LogError> {
        for event in events {
            self.0.append(&event.code.to_string(), event.timestamp_ns)?;
        }
        Ok(events.len())
    }

    pub fn path(&self) -> &Path {
        self.0.path()
    }
}

/// File locations for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    pub timing: PathBuf,
    pub triggers: PathBuf,
}

impl LogPaths {
    /// `session_{id}_...` names, or plain names when no session id was given.
    pub fn for_session(dir: &Path, session: Option<&str>) -> Self {
        match session.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Self {
                timing: dir.join(format!("session_{id}_sentence_reading_log.csv")),
                triggers: dir.join(format!("session_{id}_triggers.csv")),
            },
            None => Self {
                timing: dir.join("sentence_reading_log.csv"),
                triggers: dir.join("triggers.csv"),
            },
        }
    }
}

/// Both logs of a session. The trigger log only exists while monitoring.
#[derive(Debug)]
pub struct SessionLogs {
    pub timing: TimingLog,
    pub triggers: Option<TriggerLog>,
}

impl SessionLogs {
    /// Creates the output directory and opens the trigger log (when
    /// monitoring) before the timing log. Either failure is fatal to the
    /// session.
    pub fn open(paths: &LogPaths, monitoring: bool) -> Result<Self, LogError> {
        for parent in [paths.timing.parent(), paths.triggers.parent()]
            .into_iter()
            .flatten()
            .filter(|p| !p.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).map_err(|source| LogError::Open {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let triggers = if monitoring {
            Some(TriggerLog::open(&paths.triggers)?)
        } else {
            None
        };
        let timing = TimingLog::open(&paths.timing)?;
        Ok(Self { timing, triggers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn header_written_once_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut log = TimingLog::open(&path).unwrap();
        log.record(&TimingEvent::new("instruction_screen_display", 10))
            .unwrap();
        drop(log);

        let mut log = TimingLog::open(&path).unwrap();
        log.record(&TimingEvent::new("end_screen_display", 20)).unwrap();
        drop(log);

        assert_eq!(
            read(&path),
            "event,abs_time\ninstruction_screen_display,10\nend_screen_display,20\n"
        );
    }

    #[test]
    fn row_survives_without_orderly_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triggers.csv");

        let mut log = TriggerLog::open(&path).unwrap();
        log.append(&[TriggerEvent::new(73, 1_700_000_000_000_000_000)])
            .unwrap();
        // Skip destructors, as an abrupt process exit would.
        std::mem::forget(log);

        assert_eq!(
            read(&path),
            "trigger_event,abs_time\n73,1700000000000000000\n"
        );
    }

    #[test]
    fn session_names() {
        let dir = Path::new("out");
        let paths = LogPaths::for_session(dir, Some("7"));
        assert_eq!(paths.timing, dir.join("session_7_sentence_reading_log.csv"));
        assert_eq!(paths.triggers, dir.join("session_7_triggers.csv"));

        let unnamed = LogPaths::for_session(dir, Some("  "));
        assert_eq!(unnamed.timing, dir.join("sentence_reading_log.csv"));
        assert_eq!(unnamed, LogPaths::for_session(dir, None));
    }

    #[test]
    fn trigger_log_only_when_monitoring() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LogPaths::for_session(&dir.path().join("nested"), Some("3"));

        let logs = SessionLogs::open(&paths, false).unwrap();
        assert!(logs.triggers.is_none());
        assert!(paths.timing.exists());
        assert!(!paths.triggers.exists());

        let logs = SessionLogs::open(&paths, true).unwrap();
        assert!(logs.triggers.is_some());
        assert_eq!(read(&paths.triggers), "trigger_event,abs_time\n");
    }

    #[test]
    fn unopenable_trigger_log_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be opened for append.
        let paths = LogPaths::for_session(dir.path(), Some("1"));
        fs::create_dir_all(&paths.triggers).unwrap();

        let err = SessionLogs::open(&paths, true).unwrap_err();
        assert!(matches!(err, LogError::Open { .. }));
        assert!(!paths.timing.exists());
    }
}
