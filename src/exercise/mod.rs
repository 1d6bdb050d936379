//! 種目ごとの判定条件
//!
//! 状態遷移はすべて [`GatedPhase`](crate::tracker::GatedPhase) が担い、
//! 各種目は1フレームごとの `Verdict` を返すだけ。

pub mod ankle_toe;
pub mod bridging;
pub mod cobra;
pub mod heel_slides;
pub mod prone_slr;
pub mod shoulder_squeeze;
pub mod slr;

use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::error::Error;
use crate::pose::{Classifier, LandmarkFrame};
use crate::tracker::Verdict;

pub use ankle_toe::AnkleToe;
pub use bridging::Bridging;
pub use cobra::Cobra;
pub use heel_slides::HeelSlides;
pub use prone_slr::ProneStraightLegRaise;
pub use shoulder_squeeze::ShoulderSqueeze;
pub use slr::StraightLegRaise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExerciseKind {
    AnkleToe,
    Bridging,
    Cobra,
    StraightLegRaise,
    ProneStraightLegRaise,
    HeelSlides,
    ShoulderBladeSqueeze,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 7] = [
        Self::AnkleToe,
        Self::Bridging,
        Self::Cobra,
        Self::StraightLegRaise,
        Self::ProneStraightLegRaise,
        Self::HeelSlides,
        Self::ShoulderBladeSqueeze,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AnkleToe => "ankle_toe_movement",
            Self::Bridging => "bridging",
            Self::Cobra => "cobra_stretch",
            Self::StraightLegRaise => "any_slr",
            Self::ProneStraightLegRaise => "any_prone_slr",
            Self::HeelSlides => "heel_slides",
            Self::ShoulderBladeSqueeze => "shoulder_blade_squeeze",
        }
    }

    /// 左右で独立に状態機械を持つか
    pub fn laterality(self) -> Laterality {
        match self {
            Self::AnkleToe
            | Self::StraightLegRaise
            | Self::ProneStraightLegRaise
            | Self::HeelSlides => Laterality::PerSide,
            Self::Bridging | Self::Cobra | Self::ShoulderBladeSqueeze => Laterality::Bilateral,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExerciseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ankle_toe_movement" | "ankle_toe" => Self::AnkleToe,
            "bridging" => Self::Bridging,
            "cobra_stretch" | "cobra" => Self::Cobra,
            "any_slr" | "slr" | "straight_leg_raise" => Self::StraightLegRaise,
            "any_prone_slr" | "prone_slr" | "prone_straight_leg_raise" => {
                Self::ProneStraightLegRaise
            }
            "heel_slides" => Self::HeelSlides,
            "shoulder_blade_squeeze" | "shoulder_squeeze" => Self::ShoulderBladeSqueeze,
            _ => return Err(Error::UnknownExercise(s.to_string())),
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Laterality {
    /// 状態機械1つ
    Bilateral,
    /// 左・右の2つ
    PerSide,
}

impl Laterality {
    pub fn lanes(self) -> usize {
        match self {
            Laterality::Bilateral => 1,
            Laterality::PerSide => 2,
        }
    }
}

/// 1回の成立条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Completion {
    /// 目標姿勢を指定秒数保持
    Hold { secs: f32 },
    /// 安静→目標→安静の往復
    Cycle { min_cycle_secs: f32, debounce_frames: u32 },
}

/// 1フレーム分の評価結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// `Laterality::lanes()` 個。PerSide なら [左, 右]
    pub verdicts: Vec<Verdict>,
    /// 表示・デバッグ用の角度や比率
    pub metrics: Vec<(&'static str, f32)>,
}

impl Evaluation {
    pub fn metric(&self, name: &str) -> Option<f32> {
        self.metrics.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

pub trait Exercise: Send {
    fn kind(&self) -> ExerciseKind;

    fn completion(&self) -> Completion;

    fn evaluate(&self, frame: &LandmarkFrame) -> Evaluation;
}

/// 角度が取れなければ NaN（範囲判定は常に偽）
pub(crate) fn or_nan(value: Option<f32>) -> f32 {
    value.unwrap_or(f32::NAN)
}

pub fn create_exercise(kind: ExerciseKind, config: &Config) -> Box<dyn Exercise> {
    let classifier = Classifier::new(config.classifier.clone());
    match kind {
        ExerciseKind::AnkleToe => Box::new(AnkleToe::new(config.ankle_toe.clone(), classifier)),
        ExerciseKind::Bridging => Box::new(Bridging::new(config.bridging.clone(), classifier)),
        ExerciseKind::Cobra => Box::new(Cobra::new(config.cobra.clone(), classifier)),
        ExerciseKind::StraightLegRaise => Box::new(StraightLegRaise::new(
            config.straight_leg_raise.clone(),
            classifier,
        )),
        ExerciseKind::ProneStraightLegRaise => Box::new(ProneStraightLegRaise::new(
            config.prone_straight_leg_raise.clone(),
            classifier,
        )),
        ExerciseKind::HeelSlides => Box::new(HeelSlides::new(config.heel_slides.clone(), classifier)),
        ExerciseKind::ShoulderBladeSqueeze => Box::new(ShoulderSqueeze::new(
            config.shoulder_squeeze.clone(),
            classifier,
        )),
    }
}
