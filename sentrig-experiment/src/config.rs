use crate::error::ConfigError;
use crate::stimuli::StimulusSet;
use sentrig_trigger::SerialSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything fixed at session start. Missing keys in a config file fall back
/// to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub trigger: TriggerConfig,
    pub design: DesignConfig,
    pub durations: DurationsConfig,
    pub display: DisplayConfig,
    pub texts: TextsConfig,
    pub output_dir: PathBuf,
    /// Sentence lists, one per block. `None` uses the built-in set.
    pub stimuli: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// When off, no serial port is opened and the start-trigger wait is skipped.
    pub enabled: bool,
    pub port: String,
    pub baud_rate: u32,
    pub poll_timeout_ms: u64,
    pub start_codes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    pub n_blocks: usize,
    pub trials_per_block: usize,
    pub countdown_ticks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationsConfig {
    pub instruction_ms: u64,
    pub cue_ms: u64,
    pub trial_ms: u64,
    pub fixation_ms: u64,
    pub rest_ms: u64,
    pub countdown_tick_ms: u64,
    pub end_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Index into the enumerated monitors.
    pub screen: usize,
    pub font_path: Option<PathBuf>,
    /// PNG used as the window icon.
    pub icon_path: Option<PathBuf>,
    pub background: [u8; 4],
    pub text_color: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextsConfig {
    pub instructions: String,
    pub cue_out_loud: String,
    pub cue_silently: String,
    pub rest: String,
    /// `{n}` is replaced by the seconds remaining.
    pub countdown_plural: String,
    pub countdown_singular: String,
    pub end: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerConfig::default(),
            design: DesignConfig::default(),
            durations: DurationsConfig::default(),
            display: DisplayConfig::default(),
            texts: TextsConfig::default(),
            output_dir: PathBuf::from("."),
            stimuli: None,
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: "COM8".to_string(),
            baud_rate: 57600,
            poll_timeout_ms: 10,
            start_codes: vec![73, 53],
        }
    }
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            n_blocks: 20,
            trials_per_block: 4,
            countdown_ticks: 3,
        }
    }
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            instruction_ms: 5000,
            cue_ms: 1000,
            trial_ms: 4000,
            fixation_ms: 500,
            rest_ms: 17000,
            countdown_tick_ms: 1000,
            end_ms: 2000,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            screen: 0,
            font_path: None,
            icon_path: None,
            background: [128, 128, 128, 255],
            text_color: [0, 0, 0, 255],
        }
    }
}

impl Default for TextsConfig {
    fn default() -> Self {
        Self {
            instructions: "Sentence reading task\n\n\
                           Before each block, you will see a cue:\n\n\
                           If you see 'Out Loud', read the sentences out loud.\n\n\
                           If you see 'Silently', read the sentences in your head."
                .to_string(),
            cue_out_loud: "Out Loud".to_string(),
            cue_silently: "Silently".to_string(),
            rest: "Rest".to_string(),
            countdown_plural: "Next block in {n} seconds".to_string(),
            countdown_singular: "Next block in {n} second".to_string(),
            end: "End of the experiment.\n\n\
                  The experiment will close automatically in a few seconds."
                .to_string(),
        }
    }
}

impl SessionConfig {
    /// Reads a JSON config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file without validating it, for callers that
    /// apply overrides first.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn stimulus_set(&self) -> StimulusSet {
        match &self.stimuli {
            Some(lists) => StimulusSet::new(lists.clone()),
            None => StimulusSet::builtin(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let design = &self.design;
        if design.n_blocks == 0 {
            return Err(invalid("n_blocks must be at least 1"));
        }
        if design.trials_per_block == 0 {
            return Err(invalid("trials_per_block must be at least 1"));
        }

        let stimuli = self.stimulus_set();
        if stimuli.len() < design.n_blocks {
            return Err(invalid(format!(
                "{} blocks configured but only {} sentence lists available",
                design.n_blocks,
                stimuli.len()
            )));
        }
        if let Some(block) = (1..=design.n_blocks)
            .find(|&b| stimuli.block(b).len() < design.trials_per_block)
        {
            return Err(invalid(format!(
                "sentence list for block {} has {} sentences, need {}",
                block,
                stimuli.block(block).len(),
                design.trials_per_block
            )));
        }

        if self.trigger.enabled {
            if self.trigger.port.trim().is_empty() {
                return Err(invalid("trigger.port is empty"));
            }
            if self.trigger.start_codes.is_empty() {
                return Err(invalid("trigger.start_codes is empty"));
            }
            if self.trigger.poll_timeout_ms == 0 {
                return Err(invalid("trigger.poll_timeout_ms must be positive"));
            }
        }
        Ok(())
    }
}

impl TriggerConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.port.clone(),
            baud_rate: self.baud_rate,
            poll_timeout: self.poll_timeout(),
        }
    }
}

impl DurationsConfig {
    pub fn instruction(&self) -> Duration {
        Duration::from_millis(self.instruction_ms)
    }
    pub fn cue(&self) -> Duration {
        Duration::from_millis(self.cue_ms)
    }
    pub fn trial(&self) -> Duration {
        Duration::from_millis(self.trial_ms)
    }
    pub fn fixation(&self) -> Duration {
        Duration::from_millis(self.fixation_ms)
    }
    pub fn rest(&self) -> Duration {
        Duration::from_millis(self.rest_ms)
    }
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
    pub fn end(&self) -> Duration {
        Duration::from_millis(self.end_ms)
    }
}

impl TextsConfig {
    pub fn countdown(&self, remaining: u32) -> String {
        let template = if remaining == 1 {
            &self.countdown_singular
        } else {
            &self.countdown_plural
        };
        template.replace("{n}", &remaining.to_string())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}
