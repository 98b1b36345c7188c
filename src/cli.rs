use anyhow::{Context, Result};
use clap::Parser;
use sentrig_experiment::SessionConfig;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sentrig",
    version,
    about = "Sentence reading task with serial scanner-trigger logging",
    long_about = "Presents cued blocks of sentences fullscreen, waits for a scanner start \
                  trigger on a serial port and logs every trigger byte and presentation \
                  milestone to CSV. Press Escape to abort the session."
)]
pub struct Cli {
    /// JSON config file; missing keys use built-in defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Session identifier used in log file names (prompted for when omitted)
    #[arg(short, long)]
    pub session: Option<String>,

    /// Serial port carrying the triggers
    #[arg(long)]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    pub baud: Option<u32>,

    /// Run without opening a serial port or waiting for a start trigger
    #[arg(long)]
    pub no_triggers: bool,

    /// Monitor index for the fullscreen window
    #[arg(long)]
    pub screen: Option<usize>,

    /// Directory for the CSV logs
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Print the available monitors and exit
    #[arg(long)]
    pub list_monitors: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied, then
    /// validated.
    pub fn resolve_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::read(path)?,
            None => SessionConfig::default(),
        };

        if let Some(port) = &self.port {
            config.trigger.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.trigger.baud_rate = baud;
        }
        if self.no_triggers {
            config.trigger.enabled = false;
        }
        if let Some(screen) = self.screen {
            config.display.screen = screen;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }

        config.validate().context("checking configuration")?;
        Ok(config)
    }

    /// `--session`, or an answer typed on the terminal. Blank means none.
    pub fn session_id(&self) -> Result<Option<String>> {
        match &self.session {
            Some(id) => Ok(normalize(id)),
            None => prompt_session(io::stdin().lock(), io::stdout()),
        }
    }
}

fn normalize(raw: &str) -> Option<String> {
    let id = raw.trim();
    (!id.is_empty()).then(|| id.to_string())
}

fn prompt_session<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<Option<String>> {
    write!(output, "Session number: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading session number")?;
    Ok(normalize(&line))
}
