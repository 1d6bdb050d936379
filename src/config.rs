use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pose::AngleRange;
use crate::sound::SoundLanguage;
use crate::tracker::SmoothingStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub hold: HoldConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub ankle_toe: AnkleToeConfig,
    #[serde(default)]
    pub bridging: BridgingConfig,
    #[serde(default)]
    pub cobra: CobraConfig,
    #[serde(default)]
    pub straight_leg_raise: StraightLegRaiseConfig,
    #[serde(default)]
    pub prone_straight_leg_raise: ProneStraightLegRaiseConfig,
    #[serde(default)]
    pub heel_slides: HeelSlidesConfig,
    #[serde(default)]
    pub shoulder_squeeze: ShoulderSqueezeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// これ未満の可視度のランドマークは無いものとして扱う
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f32,
    /// 「地面に接している」とみなす地面の高さとの差（正規化座標）
    #[serde(default = "default_ground_epsilon")]
    pub ground_epsilon: f32,
    /// 肩・腰・膝が寝ているとみなす地面の高さとの差
    #[serde(default = "default_lying_tolerance")]
    pub lying_tolerance: f32,
    /// 寝ているとみなす胴体の最大傾き（度）
    #[serde(default = "default_max_torso_tilt")]
    pub max_torso_tilt_deg: f32,
    /// 膝が伸びているとみなす最小角度（度）
    #[serde(default = "default_knee_straight_min")]
    pub knee_straight_min: f32,
    /// 横向き判定に使う左右の肩の高さの差
    #[serde(default = "default_side_lying_threshold")]
    pub side_lying_threshold: f32,
}

fn default_min_visibility() -> f32 { 0.3 }
fn default_ground_epsilon() -> f32 { 0.1 }
fn default_lying_tolerance() -> f32 { 0.15 }
fn default_max_torso_tilt() -> f32 { 45.0 }
fn default_knee_straight_min() -> f32 { 150.0 }
fn default_side_lying_threshold() -> f32 { 0.15 }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_visibility: default_min_visibility(),
            ground_epsilon: default_ground_epsilon(),
            lying_tolerance: default_lying_tolerance(),
            max_torso_tilt_deg: default_max_torso_tilt(),
            knee_straight_min: default_knee_straight_min(),
            side_lying_threshold: default_side_lying_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmoothingConfig {
    #[serde(default)]
    pub strategy: SmoothingStrategy,
    /// EMA係数。1.0で平滑化なし
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// 移動平均の窓幅（フレーム数）
    #[serde(default = "default_window")]
    pub window: usize,
}

fn default_alpha() -> f32 { 0.5 }
fn default_window() -> usize { 5 }

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            strategy: SmoothingStrategy::default(),
            alpha: default_alpha(),
            window: default_window(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HoldConfig {
    /// 実際の保持時間に応じて必要保持時間を調整する
    #[serde(default = "default_true")]
    pub adaptive: bool,
    /// 必要保持時間の下限（初期値に対する比率）
    #[serde(default = "default_floor_ratio")]
    pub floor_ratio: f32,
}

fn default_true() -> bool { true }
fn default_floor_ratio() -> f32 { 1.0 }

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            adaptive: true,
            floor_ratio: default_floor_ratio(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    /// 目標回数。到達したらセッションを終了する
    #[serde(default)]
    pub reps: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub language: SoundLanguage,
    /// 音声ファイルのディレクトリ
    #[serde(default = "default_sound_dir")]
    pub dir: PathBuf,
    /// 再生待ちキューの長さ。満杯なら新しい要求は捨てる
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_sound_dir() -> PathBuf { PathBuf::from("sounds") }
fn default_queue_capacity() -> usize { 4 }

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: SoundLanguage::default(),
            dir: default_sound_dir(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnkleToeConfig {
    #[serde(default = "default_ankle_relax")]
    pub relax_ankle: AngleRange,
    #[serde(default = "default_ankle_stretch")]
    pub stretch_ankle: AngleRange,
    #[serde(default = "default_ankle_toe_hold")]
    pub hold_secs: f32,
    #[serde(default = "default_true")]
    pub lenient_mode: bool,
}

fn default_ankle_relax() -> AngleRange { AngleRange::new(80.0, 110.0) }
fn default_ankle_stretch() -> AngleRange { AngleRange::new(140.0, 180.0) }
fn default_ankle_toe_hold() -> f32 { 2.0 }

impl Default for AnkleToeConfig {
    fn default() -> Self {
        Self {
            relax_ankle: default_ankle_relax(),
            stretch_ankle: default_ankle_stretch(),
            hold_secs: default_ankle_toe_hold(),
            lenient_mode: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BridgingConfig {
    #[serde(default = "default_bridging_knee")]
    pub knee: AngleRange,
    /// 肩-腰-膝の角度（安静時）
    #[serde(default = "default_bridging_rest")]
    pub rest_raise: AngleRange,
    /// 肩-腰-膝の角度（挙上時）
    #[serde(default = "default_bridging_raise")]
    pub raise: AngleRange,
    #[serde(default = "default_bridging_hold")]
    pub hold_secs: f32,
    #[serde(default = "default_true")]
    pub lenient_mode: bool,
}

fn default_bridging_knee() -> AngleRange { AngleRange::new(40.0, 90.0) }
fn default_bridging_rest() -> AngleRange { AngleRange::new(100.0, 130.0) }
fn default_bridging_raise() -> AngleRange { AngleRange::new(155.0, 180.0) }
fn default_bridging_hold() -> f32 { 5.0 }

impl Default for BridgingConfig {
    fn default() -> Self {
        Self {
            knee: default_bridging_knee(),
            rest_raise: default_bridging_rest(),
            raise: default_bridging_raise(),
            hold_secs: default_bridging_hold(),
            lenient_mode: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CobraConfig {
    /// 安静時の肘角度の上限
    #[serde(default = "default_cobra_rest_elbow_max")]
    pub rest_elbow_max: f32,
    /// 挙上時の肘角度の下限
    #[serde(default = "default_cobra_raise_elbow_min")]
    pub raise_elbow_min: f32,
    /// 安静時の肩-腰-膝角度の下限
    #[serde(default = "default_cobra_rest_raise_min")]
    pub rest_raise_min: f32,
    /// 挙上時の肩-腰-膝角度の上限
    #[serde(default = "default_cobra_raise_max")]
    pub raise_max: f32,
    /// 鼻-肩-手首角度。安静時はこれ未満
    #[serde(default = "default_cobra_rest_head_max")]
    pub rest_head_max: f32,
    /// 鼻-肩-手首角度。挙上時はこれより大きい
    #[serde(default = "default_cobra_raise_head_min")]
    pub raise_head_min: f32,
    #[serde(default = "default_cobra_hold")]
    pub hold_secs: f32,
    #[serde(default = "default_true")]
    pub lenient_mode: bool,
}

fn default_cobra_rest_elbow_max() -> f32 { 60.0 }
fn default_cobra_raise_elbow_min() -> f32 { 120.0 }
fn default_cobra_rest_raise_min() -> f32 { 165.0 }
fn default_cobra_raise_max() -> f32 { 150.0 }
fn default_cobra_rest_head_max() -> f32 { 100.0 }
fn default_cobra_raise_head_min() -> f32 { 125.0 }
fn default_cobra_hold() -> f32 { 3.0 }

impl Default for CobraConfig {
    fn default() -> Self {
        Self {
            rest_elbow_max: default_cobra_rest_elbow_max(),
            raise_elbow_min: default_cobra_raise_elbow_min(),
            rest_raise_min: default_cobra_rest_raise_min(),
            raise_max: default_cobra_raise_max(),
            rest_head_max: default_cobra_rest_head_max(),
            raise_head_min: default_cobra_raise_head_min(),
            hold_secs: default_cobra_hold(),
            lenient_mode: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StraightLegRaiseConfig {
    #[serde(default = "default_slr_knee")]
    pub knee: AngleRange,
    #[serde(default = "default_slr_rest")]
    pub rest_raise: AngleRange,
    #[serde(default = "default_slr_raise")]
    pub raise: AngleRange,
    #[serde(default = "default_slr_hold")]
    pub hold_secs: f32,
    #[serde(default = "default_true")]
    pub lenient_mode: bool,
}

fn default_slr_knee() -> AngleRange { AngleRange::new(155.0, 180.0) }
fn default_slr_rest() -> AngleRange { AngleRange::new(160.0, 180.0) }
fn default_slr_raise() -> AngleRange { AngleRange::new(100.0, 160.0) }
fn default_slr_hold() -> f32 { 3.0 }

impl Default for StraightLegRaiseConfig {
    fn default() -> Self {
        Self {
            knee: default_slr_knee(),
            rest_raise: default_slr_rest(),
            raise: default_slr_raise(),
            hold_secs: default_slr_hold(),
            lenient_mode: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProneStraightLegRaiseConfig {
    #[serde(default = "default_prone_knee")]
    pub knee: AngleRange,
    #[serde(default = "default_prone_rest")]
    pub rest_raise: AngleRange,
    #[serde(default = "default_prone_raise")]
    pub raise: AngleRange,
    #[serde(default = "default_prone_hold")]
    pub hold_secs: f32,
    #[serde(default = "default_true")]
    pub lenient_mode: bool,
}

fn default_prone_knee() -> AngleRange { AngleRange::new(150.0, 180.0) }
fn default_prone_rest() -> AngleRange { AngleRange::new(160.0, 180.0) }
fn default_prone_raise() -> AngleRange { AngleRange::new(100.0, 140.0) }
fn default_prone_hold() -> f32 { 5.0 }

impl Default for ProneStraightLegRaiseConfig {
    fn default() -> Self {
        Self {
            knee: default_prone_knee(),
            rest_raise: default_prone_rest(),
            raise: default_prone_raise(),
            hold_secs: default_prone_hold(),
            lenient_mode: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HeelSlidesConfig {
    #[serde(default = "default_heel_extension")]
    pub extension_knee: AngleRange,
    #[serde(default = "default_heel_flexion")]
    pub flexion_knee: AngleRange,
    /// 伸展時の (腰-踵距離 / 脚長) の下限
    #[serde(default = "default_extended_ratio_min")]
    pub extended_ratio_min: f32,
    /// 屈曲時の (腰-踵距離 / 脚長) の上限
    #[serde(default = "default_flexed_ratio_max")]
    pub flexed_ratio_max: f32,
    /// 姿勢が確定するまでの連続フレーム数
    #[serde(default = "default_consecutive_frames")]
    pub consecutive_frames: u32,
    /// 1サイクルの最短時間（秒）
    #[serde(default = "default_min_cycle_secs")]
    pub min_cycle_secs: f32,
}

fn default_heel_extension() -> AngleRange { AngleRange::new(160.0, 180.0) }
fn default_heel_flexion() -> AngleRange { AngleRange::new(45.0, 90.0) }
fn default_extended_ratio_min() -> f32 { 0.85 }
fn default_flexed_ratio_max() -> f32 { 0.75 }
fn default_consecutive_frames() -> u32 { 3 }
fn default_min_cycle_secs() -> f32 { 1.0 }

impl Default for HeelSlidesConfig {
    fn default() -> Self {
        Self {
            extension_knee: default_heel_extension(),
            flexion_knee: default_heel_flexion(),
            extended_ratio_min: default_extended_ratio_min(),
            flexed_ratio_max: default_flexed_ratio_max(),
            consecutive_frames: default_consecutive_frames(),
            min_cycle_secs: default_min_cycle_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShoulderSqueezeConfig {
    /// 肩幅/腰幅がこれより大きければ安静
    #[serde(default = "default_squeeze_rest_ratio")]
    pub rest_ratio_min: f32,
    /// 肩幅/腰幅がこれより小さければ寄せている
    #[serde(default = "default_squeeze_ratio")]
    pub squeeze_ratio_max: f32,
    #[serde(default = "default_squeeze_visibility")]
    pub min_visibility: f32,
    #[serde(default = "default_squeeze_hold")]
    pub hold_secs: f32,
}

fn default_squeeze_rest_ratio() -> f32 { 1.1 }
fn default_squeeze_ratio() -> f32 { 0.9 }
fn default_squeeze_visibility() -> f32 { 0.5 }
fn default_squeeze_hold() -> f32 { 3.0 }

impl Default for ShoulderSqueezeConfig {
    fn default() -> Self {
        Self {
            rest_ratio_min: default_squeeze_rest_ratio(),
            squeeze_ratio_max: default_squeeze_ratio(),
            min_visibility: default_squeeze_visibility(),
            hold_secs: default_squeeze_hold(),
        }
    }
}

fn check_range(field: &'static str, range: &AngleRange) -> Result<(), ConfigError> {
    if range.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("min {} is greater than max {}", range.min, range.max),
        })
    }
}

fn check_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} must be positive", value),
        })
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 読み込みに失敗したらデフォルト値で続行する
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config");
                config
            }
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config not found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using default config");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        if !(0.0..=1.0).contains(&c.min_visibility) {
            return Err(ConfigError::Invalid {
                field: "classifier.min_visibility",
                reason: format!("{} is outside 0..=1", c.min_visibility),
            });
        }
        check_positive("classifier.ground_epsilon", c.ground_epsilon)?;
        check_positive("classifier.lying_tolerance", c.lying_tolerance)?;
        check_positive("classifier.max_torso_tilt_deg", c.max_torso_tilt_deg)?;

        let s = &self.smoothing;
        if !(s.alpha > 0.0 && s.alpha <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "smoothing.alpha",
                reason: format!("{} is outside (0, 1]", s.alpha),
            });
        }
        if s.window == 0 {
            return Err(ConfigError::Invalid {
                field: "smoothing.window",
                reason: "window must hold at least one frame".to_string(),
            });
        }

        let h = &self.hold;
        if !(h.floor_ratio > 0.0 && h.floor_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "hold.floor_ratio",
                reason: format!("{} is outside (0, 1]", h.floor_ratio),
            });
        }

        if self.sound.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "sound.queue_capacity",
                reason: "queue must hold at least one cue".to_string(),
            });
        }

        check_range("ankle_toe.relax_ankle", &self.ankle_toe.relax_ankle)?;
        check_range("ankle_toe.stretch_ankle", &self.ankle_toe.stretch_ankle)?;
        check_positive("ankle_toe.hold_secs", self.ankle_toe.hold_secs)?;

        check_range("bridging.knee", &self.bridging.knee)?;
        check_range("bridging.rest_raise", &self.bridging.rest_raise)?;
        check_range("bridging.raise", &self.bridging.raise)?;
        check_positive("bridging.hold_secs", self.bridging.hold_secs)?;

        check_positive("cobra.hold_secs", self.cobra.hold_secs)?;

        check_range("straight_leg_raise.knee", &self.straight_leg_raise.knee)?;
        check_range("straight_leg_raise.rest_raise", &self.straight_leg_raise.rest_raise)?;
        check_range("straight_leg_raise.raise", &self.straight_leg_raise.raise)?;
        check_positive("straight_leg_raise.hold_secs", self.straight_leg_raise.hold_secs)?;

        let p = &self.prone_straight_leg_raise;
        check_range("prone_straight_leg_raise.knee", &p.knee)?;
        check_range("prone_straight_leg_raise.rest_raise", &p.rest_raise)?;
        check_range("prone_straight_leg_raise.raise", &p.raise)?;
        check_positive("prone_straight_leg_raise.hold_secs", p.hold_secs)?;

        check_range("heel_slides.extension_knee", &self.heel_slides.extension_knee)?;
        check_range("heel_slides.flexion_knee", &self.heel_slides.flexion_knee)?;
        check_positive("heel_slides.min_cycle_secs", self.heel_slides.min_cycle_secs)?;

        check_positive("shoulder_squeeze.hold_secs", self.shoulder_squeeze.hold_secs)?;
        Ok(())
    }

    /// 全種目で反対側の条件を必須にする
    pub fn make_strict(&mut self) {
        self.ankle_toe.lenient_mode = false;
        self.bridging.lenient_mode = false;
        self.cobra.lenient_mode = false;
        self.straight_leg_raise.lenient_mode = false;
        self.prone_straight_leg_raise.lenient_mode = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.smoothing.window, 5);
        assert_eq!(config.classifier.ground_epsilon, 0.1);
        assert_eq!(config.bridging.hold_secs, 5.0);
        assert_eq!(config.ankle_toe.relax_ankle, AngleRange::new(80.0, 110.0));
        assert!(config.cobra.lenient_mode);
        assert_eq!(config.session.reps, None);
    }

    #[test]
    fn test_partial_section() {
        let config = Config::parse(
            r#"
            [bridging]
            hold_secs = 2.5
            lenient_mode = false

            [bridging.raise]
            min = 150.0
            max = 175.0

            [smoothing]
            strategy = "moving_average"
            window = 7

            [sound]
            language = "indian"
            "#,
        )
        .unwrap();
        assert_eq!(config.bridging.hold_secs, 2.5);
        assert!(!config.bridging.lenient_mode);
        assert_eq!(config.bridging.raise, AngleRange::new(150.0, 175.0));
        assert_eq!(config.bridging.knee, AngleRange::new(40.0, 90.0));
        assert_eq!(config.smoothing.strategy, SmoothingStrategy::MovingAverage);
        assert_eq!(config.smoothing.window, 7);
        assert_eq!(config.sound.language, SoundLanguage::Indian);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let err = Config::parse(
            r#"
            [ankle_toe.relax_ankle]
            min = 120.0
            max = 90.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "ankle_toe.relax_ankle", .. }
        ));
    }

    #[test]
    fn test_non_positive_hold_is_rejected() {
        let err = Config::parse("[cobra]\nhold_secs = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "cobra.hold_secs", .. }));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = Config::parse("[bridging\nhold_secs = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/physio/config.toml");
        assert_eq!(config.straight_leg_raise.hold_secs, 3.0);
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = Config::parse(include_str!("../config.toml")).unwrap();
        assert_eq!(config.bridging.knee, AngleRange::new(40.0, 90.0));
        assert_eq!(config.sound.language, SoundLanguage::English);
        assert_eq!(config.heel_slides.consecutive_frames, 3);
    }

    #[test]
    fn test_make_strict() {
        let mut config = Config::default();
        config.make_strict();
        assert!(!config.ankle_toe.lenient_mode);
        assert!(!config.straight_leg_raise.lenient_mode);
    }
}
