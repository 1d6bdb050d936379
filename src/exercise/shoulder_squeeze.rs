use crate::config::ShoulderSqueezeConfig;
use crate::pose::{pixel_distance, Classifier, LandmarkFrame, LandmarkIndex};
use crate::tracker::Verdict;

use super::{Completion, Evaluation, Exercise, ExerciseKind};

/// 肩甲骨寄せ（正面から撮影、座位または立位）
///
/// 肩幅と腰幅の比（ピクセル距離）で判定する。
pub struct ShoulderSqueeze {
    config: ShoulderSqueezeConfig,
    classifier: Classifier,
}

impl ShoulderSqueeze {
    pub fn new(config: ShoulderSqueezeConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    fn width_ratio(&self, frame: &LandmarkFrame) -> Option<f32> {
        let t = self.config.min_visibility;
        let ls = frame.visible(LandmarkIndex::LeftShoulder, t)?;
        let rs = frame.visible(LandmarkIndex::RightShoulder, t)?;
        let lh = frame.visible(LandmarkIndex::LeftHip, t)?;
        let rh = frame.visible(LandmarkIndex::RightHip, t)?;
        let shoulders = pixel_distance(ls.xy(), rs.xy(), frame.width, frame.height);
        let hips = pixel_distance(lh.xy(), rh.xy(), frame.width, frame.height);
        if hips <= 0.0 {
            return None;
        }
        Some(shoulders / hips)
    }
}

impl Exercise for ShoulderSqueeze {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::ShoulderBladeSqueeze
    }

    fn completion(&self) -> Completion {
        Completion::Hold {
            secs: self.config.hold_secs,
        }
    }

    fn evaluate(&self, frame: &LandmarkFrame) -> Evaluation {
        let (_, lying_down) = self.classifier.is_lying_down(frame);
        let ratio = self.width_ratio(frame);
        let posture = !lying_down && ratio.is_some();
        let ratio = ratio.unwrap_or(f32::NAN);

        Evaluation {
            verdicts: vec![Verdict::new(
                posture,
                ratio > self.config.rest_ratio_min,
                ratio < self.config.squeeze_ratio_max,
            )],
            metrics: vec![("shoulder_hip_ratio", ratio)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use crate::exercise::testing::put;

    fn exercise() -> ShoulderSqueeze {
        ShoulderSqueeze::new(
            ShoulderSqueezeConfig::default(),
            Classifier::new(ClassifierConfig::default()),
        )
    }

    fn seated(shoulder_half_width: f32) -> LandmarkFrame {
        let mut f = LandmarkFrame::default();
        put(&mut f, LandmarkIndex::LeftShoulder, 0.5 + shoulder_half_width, 0.35);
        put(&mut f, LandmarkIndex::RightShoulder, 0.5 - shoulder_half_width, 0.35);
        put(&mut f, LandmarkIndex::LeftHip, 0.58, 0.65);
        put(&mut f, LandmarkIndex::RightHip, 0.42, 0.65);
        f
    }

    #[test]
    fn test_wide_shoulders_are_rest() {
        let eval = exercise().evaluate(&seated(0.12));
        let v = eval.verdicts[0];
        assert!(v.posture && v.rest && !v.target);
        assert!((eval.metric("shoulder_hip_ratio").unwrap() - 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_narrow_shoulders_are_target() {
        let eval = exercise().evaluate(&seated(0.06));
        let v = eval.verdicts[0];
        assert!(v.posture && v.target && !v.rest);
    }

    #[test]
    fn test_hidden_hips_break_posture() {
        let mut frame = seated(0.12);
        frame.set(LandmarkIndex::LeftHip, Default::default());
        assert!(!exercise().evaluate(&frame).verdicts[0].posture);
    }
}
