use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use physio_tracker::config::Config;
use physio_tracker::exercise::ExerciseKind;
use physio_tracker::session::{Session, SessionOptions};
use physio_tracker::sound::{Announcer, LogSink, SoundCue, SoundLanguage};
use physio_tracker::{logging, recording};

/// 記録済みランドマーク列を再生して回数を数える
#[derive(Parser, Debug)]
#[command(name = "physio-tracker", version = env!("GIT_VERSION"))]
struct Args {
    /// 種目名 (bridging, cobra_stretch, any_slr, ...)
    exercise: ExerciseKind,

    /// JSON Lines 形式の記録ファイル
    #[arg(long)]
    recording: PathBuf,

    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// 必要保持時間（秒）の上書き
    #[arg(long)]
    hold_secs: Option<f32>,

    /// 目標回数
    #[arg(long)]
    reps: Option<u32>,

    /// 全種目で厳格判定を使う
    #[arg(long)]
    strict: bool,

    #[arg(long)]
    no_sound: bool,

    #[arg(long)]
    language: Option<SoundLanguage>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    tracing::info!("Physio Tracker ({})", env!("GIT_VERSION"));

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

    let mut source = recording::open(&args.recording)
        .with_context(|| format!("failed to open {}", args.recording.display()))?;

    let announcer = Arc::new(Announcer::spawn(&config.sound, Box::new(LogSink)));
    announcer.announce(SoundCue::Start(args.exercise));

    let mut session = Session::new(
        args.exercise,
        &config,
        SessionOptions {
            hold_secs: args.hold_secs,
            target_reps: args.reps,
        },
        Arc::clone(&announcer),
    );
    signal_hook::flag::register(signal_hook::consts::SIGINT, session.stop_flag())
        .context("failed to register SIGINT handler")?;

    let summary = session.run(&mut source);
    if summary.stopped {
        tracing::warn!("interrupted");
    }
    println!("{}: {}", summary.exercise, summary.count);
    Ok(())
}
