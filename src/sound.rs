//! 音声フィードバック
//!
//! 再生そのものは [`SoundSink`] に任せる。[`Announcer`] は再生用の
//! ワーカースレッドを1本だけ持ち、有界キューが満杯なら要求を捨てる。
//! フレーム処理側がブロックすることはない。

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread;

use crate::config::SoundConfig;
use crate::error::Error;
use crate::exercise::ExerciseKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundLanguage {
    #[default]
    English,
    Indian,
}

impl FromStr for SoundLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(Self::English),
            "indian" => Ok(Self::Indian),
            _ => Err(Error::UnknownLanguage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// 種目開始の案内
    Start(ExerciseKind),
    Count,
    FiveCompleted,
    SetComplete,
    /// 0〜2 を順番に使う
    Encouragement(u8),
    SessionComplete,
    Welcome,
}

impl SoundCue {
    /// 10回ごとにセット完了、5回ごとに5回完了、それ以外はカウント音
    pub fn for_count(count: u32) -> SoundCue {
        if count > 0 && count % 10 == 0 {
            SoundCue::SetComplete
        } else if count > 0 && count % 5 == 0 {
            SoundCue::FiveCompleted
        } else {
            SoundCue::Count
        }
    }
}

/// 音声ファイル名の対応表
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
    language: SoundLanguage,
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>, language: SoundLanguage) -> Self {
        Self {
            dir: dir.into(),
            language,
        }
    }

    pub fn file_name(&self, cue: SoundCue) -> Option<&'static str> {
        use SoundLanguage::{English, Indian};

        let name = match (cue, self.language) {
            (SoundCue::Start(kind), English) => match kind {
                ExerciseKind::AnkleToe => "DoAnkleToeNow.wav",
                ExerciseKind::Bridging => "DoBridgingPoseNow.wav",
                ExerciseKind::Cobra => "DoCobraPoseNow.wav",
                ExerciseKind::ProneStraightLegRaise => "DoProneSLRNow.wav",
                ExerciseKind::StraightLegRaise => "DoSLRNow.wav",
                ExerciseKind::HeelSlides | ExerciseKind::ShoulderBladeSqueeze => return None,
            },
            (SoundCue::Start(kind), Indian) => match kind {
                ExerciseKind::AnkleToe => "Indian-DoAnkleToeNow.wav",
                ExerciseKind::Bridging => "Indian-DoBridgingPoseNow.wav",
                ExerciseKind::Cobra => "Indian-DoCobraPoseNow.wav",
                ExerciseKind::ProneStraightLegRaise => "Indian-DoProneSLRNow.wav",
                ExerciseKind::StraightLegRaise => "Indian-DoSLRNow.wav",
                ExerciseKind::HeelSlides | ExerciseKind::ShoulderBladeSqueeze => return None,
            },
            (SoundCue::Count, _) => "short-sample.wav",
            (SoundCue::FiveCompleted, English) => "FiveRepeatsCompleted.wav",
            (SoundCue::FiveCompleted, Indian) => "Indian-FiveRepeatsCompleted.wav",
            // Indian 版は無い
            (SoundCue::SetComplete, _) => "set-complete.wav",
            (SoundCue::Encouragement(n), lang) => match (n % 3, lang) {
                (0, English) => "GreatFormKeepItUp.wav",
                (1, English) => "NiceWorkThreeMoreToGo.wav",
                (_, English) => "PerfectYouAreDoingAmazing.wav",
                (0, Indian) => "Indian-GreatFormKeepItUp.wav",
                (1, Indian) => "Indian-NiceWorkThreeMoreToGo.wav",
                (_, Indian) => "Indian-PerfectYouAreDoingAmazing.wav",
            },
            (SoundCue::SessionComplete, English) => "WellDoneTakeQuickRest.wav",
            (SoundCue::SessionComplete, Indian) => "Indian-WellDoneTakeQuickRest.wav",
            (SoundCue::Welcome, English) => "Welcome.wav",
            (SoundCue::Welcome, Indian) => "Indian-welcome.wav",
        };
        Some(name)
    }

    pub fn path_for(&self, cue: SoundCue) -> Option<PathBuf> {
        self.file_name(cue).map(|name| self.dir.join(name))
    }
}

/// 実際の再生を行う外部コンポーネント
pub trait SoundSink: Send {
    /// 再生が終わるまで戻らない
    fn play(&mut self, clip: &Path) -> anyhow::Result<()>;
}

/// 再生せずにログだけ出す
pub struct LogSink;

impl SoundSink for LogSink {
    fn play(&mut self, clip: &Path) -> anyhow::Result<()> {
        tracing::info!(clip = %clip.display(), "sound");
        Ok(())
    }
}

/// 音声再生サービス
///
/// 再生は1本のワーカースレッドで直列に行う。`announce` はブロックしない。
pub struct Announcer {
    tx: Option<SyncSender<SoundCue>>,
    worker: Option<thread::JoinHandle<()>>,
    encouragement: std::sync::atomic::AtomicU8,
}

impl Announcer {
    pub fn spawn(config: &SoundConfig, sink: Box<dyn SoundSink>) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let library = SoundLibrary::new(config.dir.clone(), config.language);
        let (tx, rx) = mpsc::sync_channel::<SoundCue>(config.queue_capacity.max(1));
        let mut sink = sink;
        let worker = thread::spawn(move || {
            for cue in rx {
                let Some(path) = library.path_for(cue) else {
                    tracing::debug!(?cue, "no clip for cue");
                    continue;
                };
                if let Err(e) = sink.play(&path) {
                    tracing::warn!(clip = %path.display(), error = %e, "sound playback failed");
                }
            }
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
            encouragement: Default::default(),
        }
    }

    /// 何も再生しない
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
            encouragement: Default::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// キューに積めたら true。満杯・無効なら捨てて false
    pub fn announce(&self, cue: SoundCue) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(cue) {
            Ok(()) => true,
            Err(TrySendError::Full(cue)) => {
                tracing::debug!(?cue, "sound queue full, dropping cue");
                false
            }
            Err(TrySendError::Disconnected(cue)) => {
                tracing::warn!(?cue, "sound worker stopped");
                false
            }
        }
    }

    pub fn announce_count(&self, count: u32) -> bool {
        self.announce(SoundCue::for_count(count))
    }

    /// 励ましの音声を順番に
    pub fn encourage(&self) -> bool {
        let n = self
            .encouragement
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.announce(SoundCue::Encouragement(n % 3))
    }

    /// キューを閉じ、積まれている分の再生が終わるまで待つ
    pub fn shutdown(&mut self) {
        self.tx = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("sound worker panicked");
            }
        }
    }
}

impl Drop for Announcer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
