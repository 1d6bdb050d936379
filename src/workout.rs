//! 複数種目を順番に行うワークアウト

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::exercise::ExerciseKind;
use crate::session::{Session, SessionOptions, SessionSummary};
use crate::sound::{Announcer, SoundCue};
use crate::source::FrameSource;

/// ワークアウトの1項目
pub struct WorkoutStep {
    pub kind: ExerciseKind,
    pub source: Box<dyn FrameSource + Send>,
}

impl WorkoutStep {
    pub fn new(kind: ExerciseKind, source: impl FrameSource + Send + 'static) -> Self {
        Self {
            kind,
            source: Box::new(source),
        }
    }
}

/// セッションは1つずつ新しく作る。共有するのはアナウンサーだけ
pub struct Workout {
    config: Config,
    options: SessionOptions,
    announcer: Arc<Announcer>,
    stop: Arc<AtomicBool>,
}

impl Workout {
    pub fn new(config: Config, options: SessionOptions, announcer: Arc<Announcer>) -> Self {
        Self {
            config,
            options,
            announcer,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 立てると実行中のセッションを止め、以降の種目も行わない
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn run(&self, steps: Vec<WorkoutStep>) -> Vec<SessionSummary> {
        let total = steps.len();
        let mut summaries = Vec::with_capacity(total);
        self.announcer.announce(SoundCue::Welcome);

        for (i, mut step) in steps.into_iter().enumerate() {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            tracing::info!(step = i + 1, total, exercise = %step.kind, "starting exercise");
            self.announcer.announce(SoundCue::Start(step.kind));

            let mut session = Session::new(
                step.kind,
                &self.config,
                self.options.clone(),
                Arc::clone(&self.announcer),
            );
            let session_stop = session.stop_flag();
            let summary = session.run(&mut RelayStop {
                inner: step.source.as_mut(),
                from: &self.stop,
                to: &session_stop,
            });
            let stopped = summary.stopped;
            summaries.push(summary);
            if stopped {
                break;
            }
            if i + 1 < total {
                self.announcer.encourage();
            }
        }

        if summaries.len() == total && summaries.iter().all(|s| !s.stopped) {
            self.announcer.announce(SoundCue::SessionComplete);
        }
        summaries
    }
}

/// フレームを渡す前にワークアウトの停止要求をセッションへ写す
struct RelayStop<'a> {
    inner: &'a mut (dyn FrameSource + Send),
    from: &'a AtomicBool,
    to: &'a AtomicBool,
}

impl FrameSource for RelayStop<'_> {
    fn next_frame(&mut self) -> Option<crate::source::TimedFrame> {
        let frame = self.inner.next_frame();
        if self.from.load(Ordering::Relaxed) {
            self.to.store(true, Ordering::Relaxed);
        }
        frame
    }
}
