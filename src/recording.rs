//! 記録済みランドマーク列（JSON Lines）
//!
//! 1行1フレーム:
//! `{"t": 秒, "width": px, "height": px, "landmarks": [[x, y, z, visibility]; 33] | null}`

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::pose::landmark::{DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH};
use crate::pose::{Landmark, LandmarkFrame, LandmarkIndex};
use crate::source::{ReplaySource, TimedFrame};

#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    #[error("failed to read recording: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: expected {expected} landmarks, found {found}", expected = LandmarkIndex::COUNT)]
    LandmarkCount { line: usize, found: usize },
    #[error("line {line}: invalid timestamp {t}")]
    Timestamp { line: usize, t: f64 },
}

fn default_width() -> u32 {
    DEFAULT_FRAME_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_FRAME_HEIGHT
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordLine {
    t: f64,
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_height")]
    height: u32,
    #[serde(default)]
    landmarks: Option<Vec<[f32; 4]>>,
}

/// 文字列から読み込む。空行は無視
pub fn parse(content: &str) -> Result<Vec<TimedFrame>, RecordingError> {
    let mut frames = Vec::new();
    for (i, text) in content.lines().enumerate() {
        let line = i + 1;
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        let record: RecordLine =
            serde_json::from_str(text).map_err(|source| RecordingError::Parse { line, source })?;
        // 負・非有限・Duration に収まらない値を弾く
        let at = Duration::try_from_secs_f64(record.t)
            .map_err(|_| RecordingError::Timestamp { line, t: record.t })?;
        let landmarks = match record.landmarks {
            None => None,
            Some(points) => Some(to_frame(&points, record.width, record.height, line)?),
        };
        frames.push(TimedFrame::new(at, landmarks));
    }
    Ok(frames)
}

fn to_frame(points: &[[f32; 4]], width: u32, height: u32, line: usize) -> Result<LandmarkFrame, RecordingError> {
    let points: [[f32; 4]; LandmarkIndex::COUNT] =
        points.try_into().map_err(|_| RecordingError::LandmarkCount {
            line,
            found: points.len(),
        })?;
    let landmarks = points.map(|[x, y, z, v]| Landmark::new(x, y, z, v));
    Ok(LandmarkFrame::new(landmarks).with_size(width, height))
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<TimedFrame>, RecordingError> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

pub fn open<P: AsRef<Path>>(path: P) -> Result<ReplaySource, RecordingError> {
    let path = path.as_ref();
    let frames = load(path)?;
    tracing::info!(path = %path.display(), frames = frames.len(), "loaded recording");
    Ok(ReplaySource::new(frames))
}

/// 1フレームを1行にする
pub fn to_line(frame: &TimedFrame) -> serde_json::Result<String> {
    let (width, height, landmarks) = match &frame.landmarks {
        Some(f) => (
            f.width,
            f.height,
            Some(
                f.landmarks
                    .iter()
                    .map(|l| [l.x, l.y, l.z, l.visibility])
                    .collect(),
            ),
        ),
        None => (DEFAULT_FRAME_WIDTH, DEFAULT_FRAME_HEIGHT, None),
    };
    serde_json::to_string(&RecordLine {
        t: frame.at.as_secs_f64(),
        width,
        height,
        landmarks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_line(t: f64) -> String {
        let points = vec![[0.5_f32, 0.5, 0.0, 0.9]; LandmarkIndex::COUNT];
        serde_json::json!({ "t": t, "width": 1280, "height": 720, "landmarks": points }).to_string()
    }

    #[test]
    fn test_parse_frames_and_gaps() {
        let content = format!("{}\n\n{{\"t\": 0.5, \"landmarks\": null}}\n", full_line(0.25));
        let frames = parse(&content).unwrap();
        assert_eq!(frames.len(), 2);

        let first = frames[0].landmarks.as_ref().unwrap();
        assert_eq!((first.width, first.height), (1280, 720));
        assert_eq!(first.get(LandmarkIndex::LeftKnee).visibility, 0.9);
        assert_eq!(frames[0].at, Duration::from_millis(250));
        assert!(frames[1].landmarks.is_none());
    }

    #[test]
    fn test_missing_size_uses_default() {
        let points = vec![[0.1_f32, 0.2, 0.0, 1.0]; LandmarkIndex::COUNT];
        let line = serde_json::json!({ "t": 0.0, "landmarks": points }).to_string();
        let frames = parse(&line).unwrap();
        let frame = frames[0].landmarks.as_ref().unwrap();
        assert_eq!((frame.width, frame.height), (DEFAULT_FRAME_WIDTH, DEFAULT_FRAME_HEIGHT));
    }

    #[test]
    fn test_wrong_landmark_count_reports_line() {
        let content = format!("{}\n{{\"t\": 1.0, \"landmarks\": [[0, 0, 0, 1]]}}", full_line(0.0));
        match parse(&content) {
            Err(RecordingError::LandmarkCount { line, found }) => {
                assert_eq!(line, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_reports_line() {
        let err = parse("{\"t\": 0.0}\n{oops").unwrap_err();
        assert!(matches!(err, RecordingError::Parse { line: 2, .. }));
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn test_negative_timestamp_rejected() {
        assert!(matches!(
            parse("{\"t\": -1.0}"),
            Err(RecordingError::Timestamp { line: 1, .. })
        ));
    }

    #[test]
    fn test_huge_timestamp_rejected() {
        let content = format!("{}\n{{\"t\": 1e300, \"landmarks\": null}}", full_line(0.0));
        assert!(matches!(
            parse(&content),
            Err(RecordingError::Timestamp { line: 2, .. })
        ));
    }

    #[test]
    fn test_written_line_reads_back() {
        let frame = TimedFrame::new(
            Duration::from_millis(1500),
            Some(LandmarkFrame::default().with_size(320, 240)),
        );
        let parsed = parse(&to_line(&frame).unwrap()).unwrap();
        assert_eq!(parsed[0].at, frame.at);
        assert_eq!(parsed[0].landmarks.as_ref().map(|f| f.width), Some(320));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load("/nonexistent/recording.jsonl"),
            Err(RecordingError::Io(_))
        ));
    }
}
