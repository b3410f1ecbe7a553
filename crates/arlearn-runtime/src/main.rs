//! arlearn command line driver

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::Level;

use arlearn_core::{ArError, ArResult, TargetIndex, TopicId};
use arlearn_flow::AppState;
use arlearn_progress::{FileStorage, ProgressStore};
use arlearn_runtime::{init_logging, App, AppBuilder, AppConfig, LogConfig, LogFormat};
use arlearn_scene::LoopbackBackend;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, ProgressAction, ProgressArgs, SimulateArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&log_config_from_cli(&cli)) {
        eprintln!("error: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path),
        None => Ok(AppConfig::default()),
    };
    let result = config.and_then(|config| match cli.command {
        Command::Simulate(args) => run_simulate(config, &args),
        Command::Progress(args) => run_progress(config, &args),
        Command::Topics => run_topics(),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level = match cli.log_level {
        LogLevelArg::Error => Level::ERROR,
        LogLevelArg::Warn => Level::WARN,
        LogLevelArg::Info => Level::INFO,
        LogLevelArg::Debug => Level::DEBUG,
        LogLevelArg::Trace => Level::TRACE,
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    LogConfig::default().with_level(level).with_format(format)
}

fn run_simulate(mut config: AppConfig, args: &SimulateArgs) -> ArResult<()> {
    if args.store.is_some() {
        config.store_dir = args.store.clone();
    }
    // The poster is in view as soon as the camera starts
    let mut camera = LoopbackBackend::new();
    camera.found(args.target);
    let mut app = AppBuilder::new(config).backend(camera).build()?;
    let step = Duration::from_millis(args.tick_ms.max(1));
    let limit = Duration::from_secs(args.max_seconds);

    app.initialize()?;
    app.select_campus("Simulated Campus")?;
    app.open_menu()?;
    app.start_scanning()?;

    let frame = app.tick(step);
    tracing::info!(outcomes = ?frame.dispatched, "camera started");
    if app.state() != AppState::ArReady {
        return Err(ArError::UnknownTarget(TargetIndex::new(args.target)));
    }

    app.start_experience()?;
    if args.rate != 1.0 {
        app.set_playback_rate(args.rate)?;
    }

    let auto_advance = args.auto_advance;
    let reached = drive(&mut app, limit, step, auto_advance);
    if !reached {
        println!("{}", app.status().to_json());
        return Err(ArError::InvalidState(format!(
            "timeline did not complete within {}s",
            args.max_seconds
        )));
    }

    let topic = app.active_topic().ok_or(ArError::NoActiveTopic)?;
    app.finish_video()?;
    let correct: Vec<usize> = app
        .registry()
        .answers(topic)
        .iter()
        .enumerate()
        .filter(|(_, a)| a.correct)
        .map(|(i, _)| i)
        .collect();
    app.submit_quiz(&correct)?;
    app.continue_to_summary()?;
    app.finish_summary()?;

    println!("{}", app.status().to_json());
    app.shutdown();
    Ok(())
}

/// Tick until the video shows, pressing advance on held pauses if asked
fn drive(app: &mut App, limit: Duration, step: Duration, auto_advance: bool) -> bool {
    let mut elapsed = Duration::ZERO;
    while elapsed < limit {
        if app.state() == AppState::Video {
            return true;
        }
        app.tick(step);
        elapsed += step;
        if auto_advance && app.sequencer().is_paused() {
            app.advance();
        }
    }
    app.state() == AppState::Video
}

fn run_progress(config: AppConfig, args: &ProgressArgs) -> ArResult<()> {
    let registry = arlearn_content::TopicRegistry::builtin()?;
    let total = u8::try_from(registry.len()).unwrap_or(u8::MAX);
    let mut store = ProgressStore::with_config(
        Box::new(FileStorage::new(args.store.clone())),
        config.progress_config(total),
    );

    match &args.action {
        ProgressAction::Show => {}
        ProgressAction::Clear => store.clear_all(),
        ProgressAction::Complete { topic } => {
            store.mark_topic_completed(TopicId::new(*topic))?;
        }
        ProgressAction::Set { topics } => {
            let topics: Vec<TopicId> = topics.iter().copied().map(TopicId::new).collect();
            store.set_completed(&topics);
        }
        ProgressAction::CompleteAll => store.complete_all(),
    }

    let summary = store.summary(&registry);
    let json = serde_json::to_string_pretty(&summary).map_err(|e| ArError::Storage(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn run_topics() -> ArResult<()> {
    let registry = arlearn_content::TopicRegistry::builtin()?;
    for id in registry.ids() {
        println!("{}", registry.describe(id));
    }
    Ok(())
}
