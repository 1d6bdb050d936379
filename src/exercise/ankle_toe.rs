use crate::config::AnkleToeConfig;
use crate::pose::{Classifier, LandmarkFrame, Side};
use crate::tracker::Verdict;

use super::{or_nan, Completion, Evaluation, Exercise, ExerciseKind};

/// 足首の底屈・背屈
///
/// 仰向けで脚を伸ばしたまま、膝-足首-つま先の角度が
/// 約90°（安静）から伸びた状態（目標）へ変わるのを左右別に見る。
pub struct AnkleToe {
    config: AnkleToeConfig,
    classifier: Classifier,
}

impl AnkleToe {
    pub fn new(config: AnkleToeConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }
}

impl Exercise for AnkleToe {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::AnkleToe
    }

    fn completion(&self) -> Completion {
        Completion::Hold {
            secs: self.config.hold_secs,
        }
    }

    fn evaluate(&self, frame: &LandmarkFrame) -> Evaluation {
        let (_, grounded) = self.classifier.is_grounded(frame, true);
        let angles = Side::BOTH.map(|side| or_nan(self.classifier.ankle_angle(frame, side)));
        let relaxed = angles.map(|a| self.config.relax_ankle.contains(a));
        let stretched = angles.map(|a| self.config.stretch_ankle.contains(a));
        let lenient = self.config.lenient_mode;

        let verdicts = (0..2)
            .map(|i| {
                let other = 1 - i;
                Verdict::new(
                    grounded,
                    relaxed[i] && (lenient || relaxed[other]),
                    stretched[i] && (lenient || stretched[other]),
                )
            })
            .collect();

        Evaluation {
            verdicts,
            metrics: vec![("left_ankle_angle", angles[0]), ("right_ankle_angle", angles[1])],
        }
    }
}
