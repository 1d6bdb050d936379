use crate::config::ProneStraightLegRaiseConfig;
use crate::pose::{angle, Classifier, LandmarkFrame, Side};
use crate::tracker::Verdict;

use super::{or_nan, Completion, Evaluation, Exercise, ExerciseKind};

/// うつ伏せでの下肢伸展挙上
pub struct ProneStraightLegRaise {
    config: ProneStraightLegRaiseConfig,
    classifier: Classifier,
}

impl ProneStraightLegRaise {
    pub fn new(config: ProneStraightLegRaiseConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    fn raise_angle(&self, frame: &LandmarkFrame, side: Side) -> Option<f32> {
        let t = self.classifier.min_visibility();
        let shoulder = self.classifier.shoulder_mid(frame)?;
        let hip = frame.visible(side.hip(), t)?;
        let ankle = frame.visible(side.ankle(), t)?;
        Some(angle(shoulder, hip.xy(), ankle.xy()))
    }

    fn heel_high(&self, frame: &LandmarkFrame, side: Side) -> bool {
        let t = self.classifier.min_visibility();
        match (frame.visible(side.heel(), t), frame.visible(side.shoulder(), t)) {
            (Some(heel), Some(shoulder)) => heel.y < shoulder.y,
            _ => false,
        }
    }
}

impl Exercise for ProneStraightLegRaise {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::ProneStraightLegRaise
    }

    fn completion(&self) -> Completion {
        Completion::Hold {
            secs: self.config.hold_secs,
        }
    }

    fn evaluate(&self, frame: &LandmarkFrame) -> Evaluation {
        let c = &self.classifier;
        let cfg = &self.config;
        let (ground, lying_down) = c.is_lying_down(frame);
        let prone = lying_down && c.feet_orientation(frame).is_prone();

        let knee = Side::BOTH.map(|side| or_nan(c.knee_angle(frame, side)));
        let raise = Side::BOTH.map(|side| or_nan(self.raise_angle(frame, side)));
        let ankle_close = Side::BOTH.map(|side| c.point_near_ground(frame, ground, side.ankle()));
        let heel_high = Side::BOTH.map(|side| self.heel_high(frame, side));

        let verdicts = (0..2)
            .map(|i| {
                let other = 1 - i;
                let knee_ok = cfg.knee.contains(knee[i]);
                let stable = cfg.lenient_mode || (ankle_close[other] && cfg.knee.contains(knee[other]));
                let rest = knee_ok && ankle_close[i] && cfg.rest_raise.contains(raise[i]) && stable;
                let target = heel_high[i] && cfg.raise.contains(raise[i]) && knee_ok && stable;
                Verdict::new(prone, rest, target)
            })
            .collect();

        Evaluation {
            verdicts,
            metrics: vec![
                ("left_knee_angle", knee[0]),
                ("right_knee_angle", knee[1]),
                ("left_raise_angle", raise[0]),
                ("right_raise_angle", raise[1]),
            ],
        }
    }
}
