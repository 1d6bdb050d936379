use crate::config::ClassifierConfig;
use crate::pose::geometry::{angle, midpoint};
use crate::pose::landmark::{LandmarkFrame, LandmarkIndex, Side};

/// 足先の向き（うつ伏せ / 仰向けの判定用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeetOrientation {
    /// つま先が地面側（うつ伏せ）
    Downward,
    /// つま先が上向き（仰向け）
    Upward,
    /// 左右で異なる
    Mixed,
    /// 判定に必要なランドマークが見えない
    Unknown,
}

impl FeetOrientation {
    /// 少なくとも片足が下向き
    pub fn is_prone(self) -> bool {
        matches!(self, FeetOrientation::Downward | FeetOrientation::Mixed)
    }
}

const GROUND_POINTS: [LandmarkIndex; 6] = [
    LandmarkIndex::LeftAnkle,
    LandmarkIndex::RightAnkle,
    LandmarkIndex::LeftHeel,
    LandmarkIndex::RightHeel,
    LandmarkIndex::LeftFootIndex,
    LandmarkIndex::RightFootIndex,
];

/// 1フレームのランドマークから姿勢に関する事実を導く
///
/// すべて純粋関数。見えないランドマークがあれば `false` / `None` / `Unknown` を返す。
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn min_visibility(&self) -> f32 {
        self.config.min_visibility
    }

    /// 可視な足首・踵・つま先のうち画面上で最も低い点のy
    pub fn ground_level(&self, frame: &LandmarkFrame) -> Option<f32> {
        GROUND_POINTS
            .iter()
            .filter_map(|&index| frame.visible(index, self.config.min_visibility))
            .map(|l| l.y)
            .filter(|y| y.is_finite())
            .reduce(f32::max)
    }

    /// `|ground - y| < ground_epsilon`
    pub fn near_ground(&self, ground: Option<f32>, y: f32) -> bool {
        match ground {
            Some(g) => (g - y).abs() < self.config.ground_epsilon,
            None => false,
        }
    }

    /// 左右のうち見えている点の中点。片側だけならその点。
    pub fn pair_midpoint(
        &self,
        frame: &LandmarkFrame,
        left: LandmarkIndex,
        right: LandmarkIndex,
    ) -> Option<[f32; 2]> {
        let threshold = self.config.min_visibility;
        match (frame.visible(left, threshold), frame.visible(right, threshold)) {
            (Some(l), Some(r)) => Some(midpoint(l.xy(), r.xy())),
            (Some(l), None) => Some(l.xy()),
            (None, Some(r)) => Some(r.xy()),
            (None, None) => None,
        }
    }

    pub fn shoulder_mid(&self, frame: &LandmarkFrame) -> Option<[f32; 2]> {
        self.pair_midpoint(frame, LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder)
    }

    pub fn hip_mid(&self, frame: &LandmarkFrame) -> Option<[f32; 2]> {
        self.pair_midpoint(frame, LandmarkIndex::LeftHip, LandmarkIndex::RightHip)
    }

    /// 上半身が床に横たわっているか
    ///
    /// 肩の中点が地面の高さから `lying_tolerance` 以内で、
    /// 腰→肩ベクトルの水平からの傾きが `max_torso_tilt_deg` 以下。
    pub fn is_lying_down(&self, frame: &LandmarkFrame) -> (Option<f32>, bool) {
        let ground = self.ground_level(frame);
        let (Some(g), Some(shoulder), Some(hip)) =
            (ground, self.shoulder_mid(frame), self.hip_mid(frame))
        else {
            return (ground, false);
        };

        let shoulder_on_ground = (g - shoulder[1]).abs() < self.config.lying_tolerance;
        let tilt = torso_tilt_deg(shoulder, hip);
        (ground, shoulder_on_ground && tilt <= self.config.max_torso_tilt_deg)
    }

    /// 下半身（腰・膝）が床に接しているか
    pub fn is_grounded(&self, frame: &LandmarkFrame, check_knee_angles: bool) -> (Option<f32>, bool) {
        let ground = self.ground_level(frame);
        let knee_mid = self.pair_midpoint(frame, LandmarkIndex::LeftKnee, LandmarkIndex::RightKnee);
        let (Some(g), Some(hip), Some(knee)) = (ground, self.hip_mid(frame), knee_mid) else {
            return (ground, false);
        };

        let tolerance = self.config.lying_tolerance;
        let mut grounded = (g - hip[1]).abs() < tolerance && (g - knee[1]).abs() < tolerance;
        if grounded && check_knee_angles {
            grounded = Side::BOTH.iter().all(|&side| {
                self.knee_angle(frame, side)
                    .is_some_and(|a| a >= self.config.knee_straight_min)
            });
        }
        (ground, grounded)
    }

    /// つま先と踵のyを比べて足の向きを判定する
    pub fn feet_orientation(&self, frame: &LandmarkFrame) -> FeetOrientation {
        let threshold = self.config.min_visibility;
        let per_side = |side: Side| {
            let heel = frame.visible(side.heel(), threshold)?;
            let toe = frame.visible(side.foot_index(), threshold)?;
            Some(toe.y >= heel.y)
        };

        match (per_side(Side::Left), per_side(Side::Right)) {
            (Some(true), Some(true)) => FeetOrientation::Downward,
            (Some(false), Some(false)) => FeetOrientation::Upward,
            (Some(_), Some(_)) => FeetOrientation::Mixed,
            (Some(down), None) | (None, Some(down)) => {
                if down {
                    FeetOrientation::Downward
                } else {
                    FeetOrientation::Upward
                }
            }
            (None, None) => FeetOrientation::Unknown,
        }
    }

    /// 肩の高さが大きく異なれば横向きに寝ている
    pub fn is_side_lying(&self, frame: &LandmarkFrame) -> bool {
        let threshold = self.config.min_visibility;
        match (
            frame.visible(LandmarkIndex::LeftShoulder, threshold),
            frame.visible(LandmarkIndex::RightShoulder, threshold),
        ) {
            (Some(l), Some(r)) => (l.y - r.y).abs() > self.config.side_lying_threshold,
            _ => false,
        }
    }

    /// 3点が見えていればその角度、見えなければ None
    pub fn joint_angle(
        &self,
        frame: &LandmarkFrame,
        a: LandmarkIndex,
        b: LandmarkIndex,
        c: LandmarkIndex,
    ) -> Option<f32> {
        let threshold = self.config.min_visibility;
        let a = frame.visible(a, threshold)?;
        let b = frame.visible(b, threshold)?;
        let c = frame.visible(c, threshold)?;
        Some(angle(a.xy(), b.xy(), c.xy()))
    }

    /// 股関節-膝-足首
    pub fn knee_angle(&self, frame: &LandmarkFrame, side: Side) -> Option<f32> {
        self.joint_angle(frame, side.hip(), side.knee(), side.ankle())
    }

    /// 肩-肘-手首
    pub fn elbow_angle(&self, frame: &LandmarkFrame, side: Side) -> Option<f32> {
        self.joint_angle(frame, side.shoulder(), side.elbow(), side.wrist())
    }

    /// 膝-足首-つま先
    pub fn ankle_angle(&self, frame: &LandmarkFrame, side: Side) -> Option<f32> {
        self.joint_angle(frame, side.knee(), side.ankle(), side.foot_index())
    }

    /// 指定ランドマークが地面付近にあるか
    pub fn point_near_ground(&self, frame: &LandmarkFrame, ground: Option<f32>, index: LandmarkIndex) -> bool {
        frame
            .visible(index, self.config.min_visibility)
            .is_some_and(|l| self.near_ground(ground, l.y))
    }
}

/// 腰→肩ベクトルの水平からの傾き（度、0〜90）
fn torso_tilt_deg(shoulder: [f32; 2], hip: [f32; 2]) -> f32 {
    let dx = (shoulder[0] - hip[0]).abs();
    let dy = (shoulder[1] - hip[1]).abs();
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    dy.atan2(dx).to_degrees()
}
