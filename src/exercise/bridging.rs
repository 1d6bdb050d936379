use crate::config::BridgingConfig;
use crate::pose::{Classifier, LandmarkFrame, Side};
use crate::tracker::Verdict;

use super::{or_nan, Completion, Evaluation, Exercise, ExerciseKind};

/// ブリッジ
///
/// 仰向けで膝を立てた状態から腰を持ち上げ、肩-腰-膝が一直線になるまで上げる。
/// 左右どちらかの脚で条件を満たせばよい。strict では両脚とも必要。
pub struct Bridging {
    config: BridgingConfig,
    classifier: Classifier,
}

impl Bridging {
    pub fn new(config: BridgingConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }
}

impl Exercise for Bridging {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Bridging
    }

    fn completion(&self) -> Completion {
        Completion::Hold {
            secs: self.config.hold_secs,
        }
    }

    fn evaluate(&self, frame: &LandmarkFrame) -> Evaluation {
        let c = &self.classifier;
        let (ground, lying_down) = c.is_lying_down(frame);

        let knee = Side::BOTH.map(|side| or_nan(c.knee_angle(frame, side)));
        let raise = Side::BOTH.map(|side| {
            or_nan(c.joint_angle(frame, side.shoulder(), side.hip(), side.knee()))
        });
        let ankle_close = Side::BOTH.map(|side| c.point_near_ground(frame, ground, side.ankle()));

        let knee_ok = knee.map(|a| self.config.knee.contains(a));
        let rest_ok = raise.map(|a| self.config.rest_raise.contains(a));
        let raise_ok = raise.map(|a| self.config.raise.contains(a));

        let either = |v: [bool; 2]| v[0] || v[1];
        let both = |v: [bool; 2]| v[0] && v[1];

        let (rest, target) = if self.config.lenient_mode {
            (
                either(ankle_close) && either(knee_ok) && either(rest_ok),
                either(raise_ok) && either(knee_ok),
            )
        } else {
            (
                both(ankle_close) && both(knee_ok) && both(rest_ok),
                both(raise_ok) && both(knee_ok),
            )
        };

        Evaluation {
            verdicts: vec![Verdict::new(lying_down, rest, target)],
            metrics: vec![
                ("left_knee_angle", knee[0]),
                ("right_knee_angle", knee[1]),
                ("left_raise_angle", raise[0]),
                ("right_raise_angle", raise[1]),
            ],
        }
    }
}
