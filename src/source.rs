//! フレーム供給元
//!
//! セッションはここからタイムスタンプ付きのランドマークを1フレームずつ受け取る。
//! `next_frame` が `None` を返したら入力終了。

use std::collections::VecDeque;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crate::pose::LandmarkFrame;

/// タイムスタンプ付きの1フレーム
#[derive(Debug, Clone, PartialEq)]
pub struct TimedFrame {
    /// セッション開始からの経過時間
    pub at: Duration,
    /// 人物が検出されなかったフレームは `None`
    pub landmarks: Option<LandmarkFrame>,
}

impl TimedFrame {
    pub fn new(at: Duration, landmarks: Option<LandmarkFrame>) -> Self {
        Self { at, landmarks }
    }
}

pub trait FrameSource {
    /// 次のフレームが来るまでブロックする
    fn next_frame(&mut self) -> Option<TimedFrame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Option<TimedFrame> {
        (**self).next_frame()
    }
}

/// 記録済みフレームの再生
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<TimedFrame>,
}

impl ReplaySource {
    pub fn new(frames: Vec<TimedFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// 一定間隔でタイムスタンプを振る
    pub fn from_frames(frames: Vec<Option<LandmarkFrame>>, fps: f32) -> Self {
        let step = if fps > 0.0 { 1.0 / fps } else { 0.0 };
        let frames = frames
            .into_iter()
            .enumerate()
            .map(|(i, landmarks)| TimedFrame::new(Duration::from_secs_f32(i as f32 * step), landmarks))
            .collect();
        Self { frames }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Option<TimedFrame> {
        self.frames.pop_front()
    }
}

pub trait Clock: Send {
    /// 起点からの経過時間
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// 別スレッドの推定器から送られてくるフレーム
///
/// 受信時刻を `Clock` で打刻する。送信側がすべて閉じたら終了。
pub struct ChannelSource<C: Clock = MonotonicClock> {
    rx: Receiver<Option<LandmarkFrame>>,
    clock: C,
}

impl ChannelSource<MonotonicClock> {
    pub fn new(rx: Receiver<Option<LandmarkFrame>>) -> Self {
        Self::with_clock(rx, MonotonicClock::start())
    }
}

impl<C: Clock> ChannelSource<C> {
    pub fn with_clock(rx: Receiver<Option<LandmarkFrame>>, clock: C) -> Self {
        Self { rx, clock }
    }
}

impl<C: Clock> FrameSource for ChannelSource<C> {
    fn next_frame(&mut self) -> Option<TimedFrame> {
        let landmarks = self.rx.recv().ok()?;
        Some(TimedFrame::new(self.clock.now(), landmarks))
    }
}
