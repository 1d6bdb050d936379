use std::time::Duration;

use super::gate::GatedPhase;

/// 安静 → 目標 → 安静 の往復で1回とするカウンタ（片側分）
///
/// 目標姿勢を一度でも通過した後、安静姿勢に戻った時点で完了。
/// 直前の完了から `min_cycle` 未満なら完了とみなさない。
#[derive(Debug, Clone)]
pub struct CycleCounter {
    min_cycle: Duration,
    target_seen: bool,
    last_cycle_at: Option<Duration>,
}

impl CycleCounter {
    pub fn new(min_cycle_secs: f32) -> Self {
        Self {
            min_cycle: Duration::try_from_secs_f32(min_cycle_secs.max(0.0)).unwrap_or(Duration::MAX),
            target_seen: false,
            last_cycle_at: None,
        }
    }

    pub fn target_seen(&self) -> bool {
        self.target_seen
    }

    /// 状態機械を更新した後に呼ぶ。サイクル完了なら true
    pub fn update(&mut self, phase: &GatedPhase, at: Duration) -> bool {
        if !phase.resting() {
            self.target_seen = false;
            return false;
        }
        if phase.active() {
            self.target_seen = true;
            return false;
        }
        if !(self.target_seen && phase.rest_now()) {
            return false;
        }

        let long_enough = self
            .last_cycle_at
            .map_or(true, |last| at.saturating_sub(last) >= self.min_cycle);
        if long_enough {
            self.last_cycle_at = Some(at);
            self.target_seen = false;
        }
        long_enough
    }

    /// 進行中のサイクルを捨てる。前回完了時刻は保持する
    pub fn reset(&mut self) {
        self.target_seen = false;
    }
}
