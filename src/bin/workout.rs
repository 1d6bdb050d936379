use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use physio_tracker::config::Config;
use physio_tracker::exercise::ExerciseKind;
use physio_tracker::session::SessionOptions;
use physio_tracker::sound::{Announcer, LogSink, SoundLanguage};
use physio_tracker::workout::{Workout, WorkoutStep};
use physio_tracker::{logging, recording};

/// 複数種目を順番に再生する
#[derive(Parser, Debug)]
#[command(name = "workout", version = env!("GIT_VERSION"))]
struct Args {
    /// `種目名=記録ファイル`。指定順に実行する
    #[arg(long = "exercise", value_parser = parse_step, required = true)]
    steps: Vec<(ExerciseKind, PathBuf)>,

    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[arg(long)]
    hold_secs: Option<f32>,

    /// 各種目の目標回数
    #[arg(long)]
    reps: Option<u32>,

    #[arg(long)]
    strict: bool,

    #[arg(long)]
    no_sound: bool,

    #[arg(long)]
    language: Option<SoundLanguage>,
}

fn parse_step(s: &str) -> Result<(ExerciseKind, PathBuf)> {
    let Some((name, path)) = s.split_once('=') else {
        bail!("expected <exercise>=<recording>, got {s:?}");
    };
    Ok((name.parse()?, PathBuf::from(path)))
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    tracing::info!("Physio Workout ({})", env!("GIT_VERSION"));

    let mut config = Config::load_or_default(&args.config);
    if args.strict {
        config.make_strict();
    }
    if args.no_sound {
        config.sound.enabled = false;
    }
    if let Some(language) = args.language {
        config.sound.language = language;
    }

    // 途中で失敗しないよう先に全部読む
    let mut steps = Vec::with_capacity(args.steps.len());
    for (kind, path) in &args.steps {
        let source = recording::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        steps.push(WorkoutStep::new(*kind, source));
    }

    let announcer = Arc::new(Announcer::spawn(&config.sound, Box::new(LogSink)));
    let workout = Workout::new(
        config,
        SessionOptions {
            hold_secs: args.hold_secs,
            target_reps: args.reps,
        },
        announcer,
    );
    signal_hook::flag::register(signal_hook::consts::SIGINT, workout.stop_flag())
        .context("failed to register SIGINT handler")?;

    for summary in workout.run(steps) {
        let mark = if summary.stopped { " (stopped)" } else { "" };
        println!("{}: {}{}", summary.exercise, summary.count, mark);
    }
    Ok(())
}
