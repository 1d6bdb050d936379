/// 1フレーム・片側分の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict {
    /// 体勢（寝ている、うつ伏せ等）が種目の前提を満たすか
    pub posture: bool,
    /// 安静姿勢の条件
    pub rest: bool,
    /// 目標姿勢の条件
    pub target: bool,
}

impl Verdict {
    pub fn new(posture: bool, rest: bool, target: bool) -> Self {
        Self { posture, rest, target }
    }
}

/// 連続フレーム数で真偽を確定させる
#[derive(Debug, Clone, PartialEq, Eq)]
struct Debounce {
    required: u32,
    streak: u32,
}

impl Debounce {
    fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            streak: 0,
        }
    }

    fn feed(&mut self, raw: bool) -> bool {
        self.streak = if raw { self.streak.saturating_add(1) } else { 0 };
        self.streak >= self.required
    }

    fn reset(&mut self) {
        self.streak = 0;
    }
}

/// 安静姿勢を前提条件とする2段階の状態機械
///
/// - 体勢が崩れたら両フラグをクリア
/// - 安静でない間は安静条件で `resting` を更新し、`active` は偽
/// - 安静中は毎フレーム目標条件で `active` を更新（ラッチしない）
///
/// `active` が真なら必ず `resting` も真。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatedPhase {
    resting: bool,
    active: bool,
    rest_now: bool,
    rest_gate: Debounce,
    target_gate: Debounce,
}

impl GatedPhase {
    pub fn new() -> Self {
        Self::with_debounce(1)
    }

    /// `frames` フレーム連続で条件を満たしたときだけ真とみなす
    pub fn with_debounce(frames: u32) -> Self {
        Self {
            resting: false,
            active: false,
            rest_now: false,
            rest_gate: Debounce::new(frames),
            target_gate: Debounce::new(frames),
        }
    }

    pub fn update(&mut self, verdict: Verdict) {
        let rest = self.rest_gate.feed(verdict.posture && verdict.rest);
        let target = self.target_gate.feed(verdict.posture && verdict.target);
        self.rest_now = rest;

        if !verdict.posture {
            self.resting = false;
            self.active = false;
            return;
        }

        if !self.resting {
            self.resting = rest;
            self.active = false;
        }
        if self.resting {
            self.active = target;
        }
    }

    pub fn resting(&self) -> bool {
        self.resting
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// このフレームで安静条件が（デバウンス込みで）成立しているか
    pub fn rest_now(&self) -> bool {
        self.rest_now
    }

    pub fn reset(&mut self) {
        self.resting = false;
        self.active = false;
        self.rest_now = false;
        self.rest_gate.reset();
        self.target_gate.reset();
    }
}

impl Default for GatedPhase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REST: Verdict = Verdict { posture: true, rest: true, target: false };
    const TARGET: Verdict = Verdict { posture: true, rest: false, target: true };
    const NEITHER: Verdict = Verdict { posture: true, rest: false, target: false };
    const NO_POSTURE: Verdict = Verdict { posture: false, rest: true, target: true };

    #[test]
    fn test_target_without_baseline_is_ignored() {
        let mut g = GatedPhase::new();
        g.update(TARGET);
        assert!(!g.resting());
        assert!(!g.active());
    }

    #[test]
    fn test_rest_then_target() {
        let mut g = GatedPhase::new();
        g.update(REST);
        assert!(g.resting());
        assert!(!g.active());
        g.update(TARGET);
        assert!(g.resting());
        assert!(g.active());
    }

    #[test]
    fn test_target_is_reevaluated_each_frame() {
        let mut g = GatedPhase::new();
        g.update(REST);
        g.update(TARGET);
        g.update(NEITHER);
        assert!(g.resting());
        assert!(!g.active());
        g.update(TARGET);
        assert!(g.active());
    }

    #[test]
    fn test_rest_and_target_same_frame() {
        let mut g = GatedPhase::new();
        g.update(Verdict::new(true, true, true));
        assert!(g.resting());
        assert!(g.active());
    }

    #[test]
    fn test_posture_loss_clears_both() {
        let mut g = GatedPhase::new();
        g.update(REST);
        g.update(TARGET);
        g.update(NO_POSTURE);
        assert!(!g.resting());
        assert!(!g.active());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut g = GatedPhase::new();
        g.update(REST);
        g.update(TARGET);
        g.reset();
        let once = g.clone();
        g.reset();
        assert_eq!(g, once);
        assert_eq!(g, GatedPhase::new());
    }

    #[test]
    fn test_debounce_requires_consecutive_frames() {
        let mut g = GatedPhase::with_debounce(3);
        g.update(REST);
        g.update(REST);
        assert!(!g.resting());
        g.update(NEITHER);
        g.update(REST);
        g.update(REST);
        assert!(!g.resting());
        g.update(REST);
        assert!(g.resting());
        assert!(g.rest_now());

        g.update(TARGET);
        g.update(TARGET);
        assert!(!g.active());
        assert!(!g.rest_now());
        g.update(TARGET);
        assert!(g.active());
    }
}
