//! 1種目分のセッション
//!
//! フレームごとに 平滑化 → 種目判定 → 状態機械 → タイマー（またはサイクル）→ カウント
//! の順に処理する。カウントはセッションだけが持つ。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context};

use crate::config::Config;
use crate::exercise::{create_exercise, Completion, Exercise, ExerciseKind};
use crate::sound::Announcer;
use crate::source::{FrameSource, TimedFrame};
use crate::tracker::{CycleCounter, GatedPhase, HoldTimer, LandmarkSmoother};

/// 設定ファイルより優先する値（CLI引数など）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    /// 必要保持時間の上書き
    pub hold_secs: Option<f32>,
    /// この回数に達したら終了
    pub target_reps: Option<u32>,
}

/// 片側分の状態機械フラグ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneState {
    pub resting: bool,
    pub active: bool,
}

/// 1フレーム処理後の状態
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameReport {
    pub count: u32,
    pub lanes: Vec<LaneState>,
    pub status_text: Option<String>,
    /// このフレームで1回以上カウントされた
    pub rep_completed: bool,
    pub metrics: Vec<(&'static str, f32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub exercise: ExerciseKind,
    pub count: u32,
    pub frames: u64,
    /// 停止要求で終わった
    pub stopped: bool,
}

enum Progress {
    Hold(HoldTimer),
    Cycle(CycleCounter),
}

struct Lane {
    phase: GatedPhase,
    progress: Progress,
}

impl Lane {
    fn new(completion: Completion, config: &Config, options: &SessionOptions) -> Self {
        match completion {
            Completion::Hold { secs } => {
                let mut timer = HoldTimer::from_config(secs, &config.hold);
                if let Some(secs) = options.hold_secs {
                    timer.set_hold_secs(secs);
                }
                Self {
                    phase: GatedPhase::new(),
                    progress: Progress::Hold(timer),
                }
            }
            Completion::Cycle {
                min_cycle_secs,
                debounce_frames,
            } => Self {
                phase: GatedPhase::with_debounce(debounce_frames),
                progress: Progress::Cycle(CycleCounter::new(min_cycle_secs)),
            },
        }
    }

    fn state(&self) -> LaneState {
        LaneState {
            resting: self.phase.resting(),
            active: self.phase.active(),
        }
    }

    /// 進行中の保持・サイクルを捨てて待機状態に戻す
    fn idle(&mut self) {
        self.phase.reset();
        match &mut self.progress {
            Progress::Hold(timer) => timer.cancel(),
            Progress::Cycle(counter) => counter.reset(),
        }
    }
}

pub struct Session {
    exercise: Box<dyn Exercise>,
    smoother: LandmarkSmoother,
    lanes: Vec<Lane>,
    count: u32,
    frames: u64,
    target_reps: Option<u32>,
    announcer: Arc<Announcer>,
    stop: Arc<AtomicBool>,
}

impl Session {
    pub fn new(
        kind: ExerciseKind,
        config: &Config,
        options: SessionOptions,
        announcer: Arc<Announcer>,
    ) -> Self {
        let exercise = create_exercise(kind, config);
        let completion = exercise.completion();
        let lanes = (0..kind.laterality().lanes())
            .map(|_| Lane::new(completion, config, &options))
            .collect();

        Self {
            exercise,
            smoother: LandmarkSmoother::from_config(&config.smoothing),
            lanes,
            count: 0,
            frames: 0,
            target_reps: options.target_reps.or(config.session.reps),
            announcer,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        self.exercise.kind()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn lane_states(&self) -> Vec<LaneState> {
        self.lanes.iter().map(Lane::state).collect()
    }

    /// 外部から停止を要求するためのフラグ
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn target_reached(&self) -> bool {
        self.target_reps.is_some_and(|target| self.count >= target)
    }

    /// 人物がいないフレームは何も変えずに `None`
    pub fn process(&mut self, frame: &TimedFrame) -> Option<FrameReport> {
        let landmarks = frame.landmarks.as_ref()?;
        let smoothed = self.smoother.apply(landmarks);
        let evaluation = self.exercise.evaluate(&smoothed);

        let mut status_text = None;
        let mut held_rep: Option<usize> = None;
        let mut cycles = 0;

        for (i, (lane, verdict)) in self
            .lanes
            .iter_mut()
            .zip(evaluation.verdicts.iter())
            .enumerate()
        {
            lane.phase.update(*verdict);
            match &mut lane.progress {
                Progress::Hold(timer) => {
                    let update = timer.update(lane.phase.active(), frame.at);
                    if update.newly_counted_rep && held_rep.is_none() {
                        held_rep = Some(i);
                    }
                    if update.needs_reset {
                        lane.phase.reset();
                    }
                    if status_text.is_none() {
                        status_text = update.status_text;
                    }
                }
                Progress::Cycle(counter) => {
                    if counter.update(&lane.phase, frame.at) {
                        lane.phase.reset();
                        counter.reset();
                        cycles += 1;
                    }
                }
            }
        }

        if let Some(counted) = held_rep {
            // 他方の保持は破棄する。カウントした側は離すまで計測を続け、
            // 離した時点の needs_reset で安静からやり直す
            for (i, lane) in self.lanes.iter_mut().enumerate() {
                if i == counted {
                    continue;
                }
                lane.phase.reset();
                if let Progress::Hold(timer) = &mut lane.progress {
                    timer.cancel();
                }
            }
            self.credit();
        }
        for _ in 0..cycles {
            self.credit();
        }

        Some(FrameReport {
            count: self.count,
            lanes: self.lane_states(),
            status_text,
            rep_completed: held_rep.is_some() || cycles > 0,
            metrics: evaluation.metrics,
        })
    }

    fn credit(&mut self) {
        self.count += 1;
        tracing::info!(exercise = %self.kind(), count = self.count, "repetition counted");
        self.announcer.announce_count(self.count);
    }

    /// 停止時の後始末。保持中の分はカウントしない
    pub fn halt(&mut self) {
        for lane in &mut self.lanes {
            lane.idle();
        }
    }

    pub fn run(&mut self, source: &mut dyn FrameSource) -> SessionSummary {
        tracing::info!(exercise = %self.kind(), target = ?self.target_reps, "session started");
        let mut stopped = false;

        while let Some(frame) = source.next_frame() {
            if self.stop.load(Ordering::Relaxed) {
                stopped = true;
                break;
            }
            self.frames += 1;
            if let Some(report) = self.process(&frame) {
                if let Some(text) = &report.status_text {
                    tracing::trace!(at = ?frame.at, "{}", text);
                }
            }
            if self.target_reached() {
                tracing::info!(count = self.count, "target repetitions reached");
                break;
            }
        }
        if self.stop.load(Ordering::Relaxed) {
            stopped = true;
        }
        if stopped {
            self.halt();
            tracing::info!(count = self.count, "session stopped");
        }

        tracing::info!(exercise = %self.kind(), count = self.count, frames = self.frames, "session finished");
        SessionSummary {
            exercise: self.kind(),
            count: self.count,
            frames: self.frames,
            stopped,
        }
    }
}

/// ワーカースレッドで実行中のセッション
pub struct SessionHandle {
    stop: Arc<AtomicBool>,
    worker: thread::JoinHandle<SessionSummary>,
}

impl SessionHandle {
    pub fn spawn<S>(mut session: Session, mut source: S) -> anyhow::Result<Self>
    where
        S: FrameSource + Send + 'static,
    {
        let stop = session.stop_flag();
        let name = format!("session-{}", session.kind());
        let worker = thread::Builder::new()
            .name(name)
            .spawn(move || session.run(&mut source))
            .context("failed to spawn session thread")?;
        Ok(Self { stop, worker })
    }

    /// 次のフレームで止まる
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    pub fn join(self) -> anyhow::Result<SessionSummary> {
        self.worker
            .join()
            .map_err(|_| anyhow!("session thread panicked"))
    }
}
