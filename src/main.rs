mod cli;
mod window;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use sentrig_experiment::{LogPaths, SessionController, SessionLogs, SessionStatus};
use sentrig_render::load_font;
use sentrig_timing::HighPrecisionTimer;
use sentrig_trigger::{SessionContext, TriggerListener, available_port_names, ensure_port_available};
use std::process::ExitCode;
use window::WindowDisplay;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.list_ports {
        let ports = available_port_names()?;
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for port in ports {
            println!("{port}");
        }
        return Ok(());
    }
    if cli.list_monitors {
        for m in window::list_monitors()? {
            println!(
                "{}: {} {}x{}{}{}",
                m.index,
                m.name,
                m.size.width,
                m.size.height,
                m.refresh_hz
                    .map(|hz| format!(" @ {hz:.1} Hz"))
                    .unwrap_or_default(),
                if m.primary { " (primary)" } else { "" }
            );
        }
        return Ok(());
    }

    let config = cli.resolve_config()?;
    let session = cli.session_id()?;
    match &session {
        Some(id) => log::info!("Session {}", id),
        None => log::warn!("No session number given, using default log names"),
    }

    let monitoring = config.trigger.enabled;
    if monitoring {
        ensure_port_available(&config.trigger.port, &available_port_names()?)?;
    }

    // Logs first: an unwritable trigger log must stop us before anything is shown.
    let paths = LogPaths::for_session(&config.output_dir, session.as_deref());
    let logs = SessionLogs::open(&paths, monitoring).context("opening session logs")?;
    log::info!("Timing log: {}", logs.timing.path().display());
    if let Some(triggers) = &logs.triggers {
        log::info!("Trigger log: {}", triggers.path().display());
    }

    let timer = HighPrecisionTimer::new();
    let context = SessionContext::new();
    let listener = if monitoring {
        Some(
            TriggerListener::start(&config.trigger.serial_settings(), &context, timer.clone())
                .context("starting trigger listener")?,
        )
    } else {
        None
    };

    let font = load_font(config.display.font_path.as_deref())?;
    let display = WindowDisplay::open(&config.display, font, timer.clone())?;

    let mut controller =
        SessionController::new(config, logs, context, display, timer, rand::rng());
    if let Some(listener) = listener {
        controller = controller.with_listener(listener);
    }
    let outcome = controller.run()?;

    match outcome.status {
        SessionStatus::Completed => println!("Experiment completed."),
        SessionStatus::Aborted { phase } => println!("Experiment terminated by user ({phase:?})."),
    }
    println!("Triggers logged: {}", outcome.triggers_logged);
    if let Some(start) = outcome.start_trigger_ns {
        println!("Scanner start: {start}");
    }
    Ok(())
}
