use crate::config::CobraConfig;
use crate::pose::{angle, Classifier, LandmarkFrame, LandmarkIndex, Side};
use crate::tracker::Verdict;

use super::{or_nan, Completion, Evaluation, Exercise, ExerciseKind};

/// コブラのポーズ
///
/// うつ伏せで下半身を床につけたまま、腕を伸ばして上体を反らす。
pub struct Cobra {
    config: CobraConfig,
    classifier: Classifier,
}

impl Cobra {
    pub fn new(config: CobraConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    /// 肩中点-腰中点-（より可視度の高い）膝
    fn raise_angle(&self, frame: &LandmarkFrame) -> Option<f32> {
        let c = &self.classifier;
        let shoulder = c.shoulder_mid(frame)?;
        let hip = c.hip_mid(frame)?;
        let left = frame.get(LandmarkIndex::LeftKnee);
        let right = frame.get(LandmarkIndex::RightKnee);
        let knee = if right.visibility > left.visibility { right } else { left };
        if !knee.is_visible(c.min_visibility()) {
            return None;
        }
        Some(angle(shoulder, hip, knee.xy()))
    }

    /// 鼻-肩中点-手首中点
    fn head_angle(&self, frame: &LandmarkFrame) -> Option<f32> {
        let c = &self.classifier;
        let nose = frame.visible(LandmarkIndex::Nose, c.min_visibility())?;
        let shoulder = c.shoulder_mid(frame)?;
        let wrist = c.pair_midpoint(frame, LandmarkIndex::LeftWrist, LandmarkIndex::RightWrist)?;
        Some(angle(nose.xy(), shoulder, wrist))
    }

    /// 手首のx座標が同じ側の肩と腰の間にあるか
    fn wrist_beside_torso(&self, frame: &LandmarkFrame, side: Side) -> bool {
        let t = self.classifier.min_visibility();
        let (Some(wrist), Some(shoulder), Some(hip)) = (
            frame.visible(side.wrist(), t),
            frame.visible(side.shoulder(), t),
            frame.visible(side.hip(), t),
        ) else {
            return false;
        };
        let (lo, hi) = if shoulder.x <= hip.x {
            (shoulder.x, hip.x)
        } else {
            (hip.x, shoulder.x)
        };
        lo <= wrist.x && wrist.x <= hi
    }
}

impl Exercise for Cobra {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Cobra
    }

    fn completion(&self) -> Completion {
        Completion::Hold {
            secs: self.config.hold_secs,
        }
    }

    fn evaluate(&self, frame: &LandmarkFrame) -> Evaluation {
        let c = &self.classifier;
        let cfg = &self.config;
        let (ground, on_ground) = c.is_grounded(frame, false);
        let prone = on_ground && c.feet_orientation(frame).is_prone();

        let elbow = Side::BOTH.map(|side| or_nan(c.elbow_angle(frame, side)));
        let raise = or_nan(self.raise_angle(frame));
        let head = or_nan(self.head_angle(frame));
        let wrists_close = Side::BOTH
            .iter()
            .all(|side| c.point_near_ground(frame, ground, side.wrist()));
        let beside_torso = Side::BOTH
            .iter()
            .any(|&side| self.wrist_beside_torso(frame, side));

        let elbows_bent = elbow.iter().any(|&a| a <= cfg.rest_elbow_max);
        let elbows_straight = elbow.iter().any(|&a| a >= cfg.raise_elbow_min);

        let rest_strict = wrists_close && beside_torso && head < cfg.rest_head_max;
        let target_strict = wrists_close && head > cfg.raise_head_min;

        let rest = elbows_bent
            && raise >= cfg.rest_raise_min
            && (cfg.lenient_mode || rest_strict);
        let target = elbows_straight
            && raise <= cfg.raise_max
            && (cfg.lenient_mode || target_strict);

        Evaluation {
            verdicts: vec![Verdict::new(prone, rest, target)],
            metrics: vec![
                ("left_elbow_angle", elbow[0]),
                ("right_elbow_angle", elbow[1]),
                ("raise_angle", raise),
                ("head_angle", head),
            ],
        }
    }
}
