use serde::{Deserialize, Serialize};

/// BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    pub const ALL: [LandmarkIndex; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// 左右
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    fn pick(self, left: LandmarkIndex, right: LandmarkIndex) -> LandmarkIndex {
        match self {
            Side::Left => left,
            Side::Right => right,
        }
    }

    pub fn shoulder(self) -> LandmarkIndex {
        self.pick(LandmarkIndex::LeftShoulder, LandmarkIndex::RightShoulder)
    }

    pub fn elbow(self) -> LandmarkIndex {
        self.pick(LandmarkIndex::LeftElbow, LandmarkIndex::RightElbow)
    }

    pub fn wrist(self) -> LandmarkIndex {
        self.pick(LandmarkIndex::LeftWrist, LandmarkIndex::RightWrist)
    }

    pub fn hip(self) -> LandmarkIndex {
        self.pick(LandmarkIndex::LeftHip, LandmarkIndex::RightHip)
    }

    pub fn knee(self) -> LandmarkIndex {
        self.pick(LandmarkIndex::LeftKnee, LandmarkIndex::RightKnee)
    }

    pub fn ankle(self) -> LandmarkIndex {
        self.pick(LandmarkIndex::LeftAnkle, LandmarkIndex::RightAnkle)
    }

    pub fn heel(self) -> LandmarkIndex {
        self.pick(LandmarkIndex::LeftHeel, LandmarkIndex::RightHeel)
    }

    pub fn foot_index(self) -> LandmarkIndex {
        self.pick(LandmarkIndex::LeftFootIndex, LandmarkIndex::RightFootIndex)
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0、下向きが正)
    pub y: f32,
    /// 腰を基準にした相対深度
    pub z: f32,
    /// 可視度 (0.0〜1.0)
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self { x, y, z, visibility }
    }

    /// 可視度が閾値以上か
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.visibility >= threshold
    }

    pub fn xy(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            visibility: 0.0,
        }
    }
}

pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// 1フレーム分の33ランドマークと元画像サイズ
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    pub landmarks: [Landmark; LandmarkIndex::COUNT],
    pub width: u32,
    pub height: u32,
}

impl LandmarkFrame {
    pub fn new(landmarks: [Landmark; LandmarkIndex::COUNT]) -> Self {
        Self {
            landmarks,
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// インデックスでランドマークを取得
    pub fn get(&self, index: LandmarkIndex) -> &Landmark {
        &self.landmarks[index as usize]
    }

    pub fn set(&mut self, index: LandmarkIndex, landmark: Landmark) {
        self.landmarks[index as usize] = landmark;
    }

    /// 可視度が閾値以上のときのみ返す
    pub fn visible(&self, index: LandmarkIndex, threshold: f32) -> Option<&Landmark> {
        let landmark = self.get(index);
        landmark.is_visible(threshold).then_some(landmark)
    }
}

impl Default for LandmarkFrame {
    fn default() -> Self {
        Self::new([Landmark::default(); LandmarkIndex::COUNT])
    }
}
