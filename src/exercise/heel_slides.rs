use crate::config::HeelSlidesConfig;
use crate::pose::{distance, Classifier, LandmarkFrame, Side};
use crate::tracker::Verdict;

use super::{or_nan, Completion, Evaluation, Exercise, ExerciseKind};

/// ヒールスライド
///
/// 仰向けで踵を床につけたまま膝を曲げ伸ばしする。
/// 伸展 → 屈曲 → 伸展 の1往復で1回。
pub struct HeelSlides {
    config: HeelSlidesConfig,
    classifier: Classifier,
}

impl HeelSlides {
    pub fn new(config: HeelSlidesConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    /// 腰-踵の距離を脚長（腰-膝 + 膝-足首）で割った値
    fn heel_hip_ratio(&self, frame: &LandmarkFrame, side: Side) -> Option<f32> {
        let t = self.classifier.min_visibility();
        let hip = frame.visible(side.hip(), t)?.xy();
        let knee = frame.visible(side.knee(), t)?.xy();
        let ankle = frame.visible(side.ankle(), t)?.xy();
        let heel = frame.visible(side.heel(), t)?.xy();
        let leg_length = distance(hip, knee) + distance(knee, ankle);
        if leg_length <= 0.0 {
            return None;
        }
        Some(distance(hip, heel) / leg_length)
    }
}

impl Exercise for HeelSlides {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::HeelSlides
    }

    fn completion(&self) -> Completion {
        Completion::Cycle {
            min_cycle_secs: self.config.min_cycle_secs,
            debounce_frames: self.config.consecutive_frames,
        }
    }

    fn evaluate(&self, frame: &LandmarkFrame) -> Evaluation {
        let c = &self.classifier;
        let cfg = &self.config;
        let (ground, lying_down) = c.is_lying_down(frame);

        let knee = Side::BOTH.map(|side| or_nan(c.knee_angle(frame, side)));
        let ratio = Side::BOTH.map(|side| or_nan(self.heel_hip_ratio(frame, side)));
        let heel_close = Side::BOTH.map(|side| c.point_near_ground(frame, ground, side.heel()));

        let verdicts = (0..2)
            .map(|i| {
                let extended = heel_close[i]
                    && cfg.extension_knee.contains(knee[i])
                    && ratio[i] >= cfg.extended_ratio_min;
                let flexed = heel_close[i]
                    && cfg.flexion_knee.contains(knee[i])
                    && ratio[i] <= cfg.flexed_ratio_max;
                Verdict::new(lying_down, extended, flexed)
            })
            .collect();

        Evaluation {
            verdicts,
            metrics: vec![
                ("left_knee_angle", knee[0]),
                ("right_knee_angle", knee[1]),
                ("left_heel_hip_ratio", ratio[0]),
                ("right_heel_hip_ratio", ratio[1]),
            ],
        }
    }
}
