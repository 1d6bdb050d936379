use std::time::Duration;

use crate::config::HoldConfig;

/// `HoldTimer::update` の結果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HoldUpdate {
    /// このフレームで1回分が成立した
    pub newly_counted_rep: bool,
    /// 保持中の残り時間表示
    pub status_text: Option<String>,
    /// 保持が終わったので状態機械をリセットすべき
    pub needs_reset: bool,
}

/// 目標姿勢の継続時間で1回をカウントするタイマー
///
/// 保持時間は実績に応じて調整される。
/// - 必要時間を超えて保持した: 超過分の半分だけ延ばす
/// - 届かなかった: 実績値まで下げる（ただし下限 `floor` 未満にはしない）
#[derive(Debug, Clone)]
pub struct HoldTimer {
    initial_secs: f32,
    floor_secs: f32,
    adaptive_secs: f32,
    adaptive: bool,
    started_at: Option<Duration>,
    counted_this_hold: bool,
}

impl HoldTimer {
    pub fn new(hold_secs: f32) -> Self {
        Self {
            initial_secs: hold_secs,
            floor_secs: hold_secs,
            adaptive_secs: hold_secs,
            adaptive: true,
            started_at: None,
            counted_this_hold: false,
        }
    }

    pub fn from_config(hold_secs: f32, config: &HoldConfig) -> Self {
        let mut timer = Self::new(hold_secs);
        timer.adaptive = config.adaptive;
        timer.floor_secs = hold_secs * config.floor_ratio;
        timer
    }

    pub fn with_floor(mut self, floor_secs: f32) -> Self {
        self.floor_secs = floor_secs.min(self.initial_secs);
        self
    }

    pub fn fixed(mut self) -> Self {
        self.adaptive = false;
        self
    }

    /// 必要保持時間を上書きする（テストや動画再生用）
    pub fn set_hold_secs(&mut self, secs: f32) {
        let ratio = if self.initial_secs > 0.0 {
            self.floor_secs / self.initial_secs
        } else {
            1.0
        };
        self.initial_secs = secs;
        self.adaptive_secs = secs;
        self.floor_secs = secs * ratio;
    }

    /// 現在の必要保持時間（秒）
    pub fn required_secs(&self) -> f32 {
        self.adaptive_secs
    }

    pub fn initial_secs(&self) -> f32 {
        self.initial_secs
    }

    pub fn in_progress(&self) -> bool {
        self.started_at.is_some()
    }

    /// `at` はセッション開始からの経過時間
    pub fn update(&mut self, in_hold_pose: bool, at: Duration) -> HoldUpdate {
        let mut result = HoldUpdate::default();

        if in_hold_pose {
            let started = match self.started_at {
                Some(started) => started,
                None => {
                    self.started_at = Some(at);
                    self.counted_this_hold = false;
                    at
                }
            };
            let held = at.saturating_sub(started).as_secs_f32();
            let remaining = self.adaptive_secs - held;
            if remaining > 0.0 {
                result.status_text = Some(format!("hold pose: {:.2}", remaining));
            }
            if held >= self.adaptive_secs && !self.counted_this_hold {
                self.counted_this_hold = true;
                result.newly_counted_rep = true;
            }
        } else if let Some(started) = self.started_at.take() {
            let held = at.saturating_sub(started).as_secs_f32();
            self.adapt(held);
            self.counted_this_hold = false;
            result.needs_reset = true;
        }

        result
    }

    fn adapt(&mut self, held: f32) {
        if !self.adaptive {
            return;
        }
        let previous = self.adaptive_secs;
        if held >= self.adaptive_secs {
            self.adaptive_secs += (held - self.adaptive_secs) * 0.5;
        } else {
            self.adaptive_secs = held.max(self.floor_secs);
        }
        if self.adaptive_secs != previous {
            tracing::debug!(
                held = held,
                from = previous,
                to = self.adaptive_secs,
                "adjusted hold time"
            );
        }
    }

    /// 保持中の計測を破棄する。調整もカウントもしない
    pub fn cancel(&mut self) {
        self.started_at = None;
        self.counted_this_hold = false;
    }
}
