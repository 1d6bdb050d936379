use crate::config::StraightLegRaiseConfig;
use crate::pose::{signed_angle, Classifier, LandmarkFrame, Side};
use crate::tracker::Verdict;

use super::{or_nan, Completion, Evaluation, Exercise, ExerciseKind};

/// 仰向けでの下肢伸展挙上（左右どちらの脚でも可）
pub struct StraightLegRaise {
    config: StraightLegRaiseConfig,
    classifier: Classifier,
}

struct LegState {
    knee: f32,
    signed_raise: f32,
    ankle_close: bool,
    heel_high: bool,
}

impl StraightLegRaise {
    pub fn new(config: StraightLegRaiseConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    fn leg(&self, frame: &LandmarkFrame, ground: Option<f32>, side: Side) -> LegState {
        let c = &self.classifier;
        let t = c.min_visibility();
        let shoulder_mid = c.shoulder_mid(frame);
        let hip = frame.visible(side.hip(), t);
        let ankle = frame.visible(side.ankle(), t);

        let signed_raise = match (shoulder_mid, hip, ankle) {
            (Some(s), Some(h), Some(a)) => signed_angle(s, h.xy(), a.xy()),
            _ => f32::NAN,
        };
        let heel_high = match (frame.visible(side.heel(), t), frame.visible(side.shoulder(), t)) {
            (Some(heel), Some(shoulder)) => heel.y < shoulder.y,
            _ => false,
        };

        LegState {
            knee: or_nan(c.knee_angle(frame, side)),
            signed_raise,
            ankle_close: c.point_near_ground(frame, ground, side.ankle()),
            heel_high,
        }
    }

    /// 頭が画面右にあるときは挙上方向の符号が反転する
    fn head_direction(&self, frame: &LandmarkFrame) -> f32 {
        match (self.classifier.shoulder_mid(frame), self.classifier.hip_mid(frame)) {
            (Some(s), Some(h)) if s[0] > h[0] => -1.0,
            _ => 1.0,
        }
    }
}

impl Exercise for StraightLegRaise {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::StraightLegRaise
    }

    fn completion(&self) -> Completion {
        Completion::Hold {
            secs: self.config.hold_secs,
        }
    }

    fn evaluate(&self, frame: &LandmarkFrame) -> Evaluation {
        let cfg = &self.config;
        let (ground, lying_down) = self.classifier.is_lying_down(frame);
        let posture = lying_down && !self.classifier.is_side_lying(frame);
        let direction = self.head_direction(frame);
        let legs = Side::BOTH.map(|side| self.leg(frame, ground, side));

        let verdicts = (0..2)
            .map(|i| {
                let leg = &legs[i];
                let other = &legs[1 - i];
                let knee_ok = cfg.knee.contains(leg.knee);
                let other_grounded = other.ankle_close && cfg.knee.contains(other.knee);
                let stable = cfg.lenient_mode || other_grounded;

                let rest = knee_ok
                    && leg.ankle_close
                    && cfg.rest_raise.contains(leg.signed_raise.abs())
                    && stable;
                let target = leg.heel_high
                    && cfg.raise.contains(leg.signed_raise * direction)
                    && knee_ok
                    && stable;
                Verdict::new(posture, rest, target)
            })
            .collect();

        Evaluation {
            verdicts,
            metrics: vec![
                ("left_knee_angle", legs[0].knee),
                ("right_knee_angle", legs[1].knee),
                ("left_raise_angle", legs[0].signed_raise * direction),
                ("right_raise_angle", legs[1].signed_raise * direction),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use crate::exercise::testing::{put, supine};
    use crate::pose::{Landmark, LandmarkIndex};

    fn exercise(lenient_mode: bool) -> StraightLegRaise {
        StraightLegRaise::new(
            StraightLegRaiseConfig {
                lenient_mode,
                ..StraightLegRaiseConfig::default()
            },
            Classifier::new(ClassifierConfig::default()),
        )
    }

    /// 腰を中心に45°持ち上げた脚
    fn raise(frame: &mut LandmarkFrame, side: Side) {
        put(frame, side.knee(), 0.6415, 0.6185);
        put(frame, side.ankle(), 0.783, 0.477);
        put(frame, side.heel(), 0.79, 0.49);
        put(frame, side.foot_index(), 0.80, 0.45);
    }

    fn mirror(frame: &LandmarkFrame) -> LandmarkFrame {
        let mut out = frame.clone();
        for l in out.landmarks.iter_mut() {
            *l = Landmark::new(1.0 - l.x, l.y, l.z, l.visibility);
        }
        out
    }

    #[test]
    fn test_flat_legs_are_rest() {
        let eval = exercise(true).evaluate(&supine());
        assert!(eval.verdicts.iter().all(|v| v.posture && v.rest && !v.target));
    }

    #[test]
    fn test_raised_leg_is_target_for_that_side_only() {
        let mut frame = supine();
        raise(&mut frame, Side::Left);
        let eval = exercise(true).evaluate(&frame);
        assert!(eval.verdicts[0].target, "{:?}", eval.metrics);
        assert!(!eval.verdicts[0].rest);
        assert!(!eval.verdicts[1].target);
        assert!(eval.verdicts[1].rest);
    }

    #[test]
    fn test_head_on_right_is_normalized() {
        let mut frame = supine();
        raise(&mut frame, Side::Right);
        let eval = exercise(true).evaluate(&mirror(&frame));
        assert!(eval.verdicts[1].target, "{:?}", eval.metrics);
        let raise = eval.metric("right_raise_angle").unwrap();
        assert!(raise > 0.0);
    }

    #[test]
    fn test_strict_needs_other_leg_on_ground() {
        let mut frame = supine();
        raise(&mut frame, Side::Left);
        raise(&mut frame, Side::Right);
        assert!(exercise(true).evaluate(&frame).verdicts[0].target);
        assert!(!exercise(false).evaluate(&frame).verdicts[0].target);
    }

    #[test]
    fn test_side_lying_breaks_posture() {
        let mut frame = supine();
        put(&mut frame, LandmarkIndex::RightShoulder, 0.25, 0.58);
        let eval = exercise(true).evaluate(&frame);
        assert!(eval.verdicts.iter().all(|v| !v.posture));
    }
}
