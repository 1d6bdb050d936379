#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use physio_tracker::config::Config;
use physio_tracker::exercise::ExerciseKind;
use physio_tracker::pose::{Landmark, LandmarkFrame, LandmarkIndex, Side};
use physio_tracker::session::{Session, SessionOptions, SessionSummary};
use physio_tracker::sound::Announcer;
use physio_tracker::source::{ReplaySource, TimedFrame};

pub const FPS: f32 = 30.0;
/// 姿勢を保つフレーム数
pub const PLATEAU: usize = 20;
/// キーフレーム間の補間フレーム数
pub const TRANSITION: usize = 6;

pub fn put(frame: &mut LandmarkFrame, index: LandmarkIndex, x: f32, y: f32) {
    frame.set(index, Landmark::new(x, y, 0.0, 1.0));
}

pub fn put_pair(frame: &mut LandmarkFrame, part: fn(Side) -> LandmarkIndex, x: f32, y: f32) {
    for side in Side::BOTH {
        put(frame, part(side), x, y);
    }
}

/// 頭が左の仰向け。床は y = 0.80
pub fn supine() -> LandmarkFrame {
    let mut f = LandmarkFrame::default();
    put(&mut f, LandmarkIndex::Nose, 0.15, 0.72);
    put_pair(&mut f, Side::shoulder, 0.25, 0.76);
    put_pair(&mut f, Side::elbow, 0.35, 0.77);
    put_pair(&mut f, Side::wrist, 0.45, 0.77);
    put_pair(&mut f, Side::hip, 0.50, 0.76);
    put_pair(&mut f, Side::knee, 0.70, 0.77);
    put_pair(&mut f, Side::ankle, 0.90, 0.78);
    put_pair(&mut f, Side::heel, 0.91, 0.80);
    put_pair(&mut f, Side::foot_index, 0.905, 0.70);
    f
}

pub fn knees_up() -> LandmarkFrame {
    let mut f = supine();
    put_pair(&mut f, Side::knee, 0.62, 0.60);
    put_pair(&mut f, Side::ankle, 0.70, 0.78);
    put_pair(&mut f, Side::heel, 0.69, 0.80);
    put_pair(&mut f, Side::foot_index, 0.76, 0.80);
    f
}

pub fn bridge() -> LandmarkFrame {
    let mut f = knees_up();
    put_pair(&mut f, Side::hip, 0.47, 0.66);
    put_pair(&mut f, Side::knee, 0.63, 0.58);
    f
}

pub fn prone_rest() -> LandmarkFrame {
    let mut f = LandmarkFrame::default();
    put(&mut f, LandmarkIndex::Nose, 0.16, 0.79);
    put_pair(&mut f, Side::shoulder, 0.25, 0.74);
    put_pair(&mut f, Side::elbow, 0.36, 0.78);
    put_pair(&mut f, Side::wrist, 0.28, 0.79);
    put_pair(&mut f, Side::hip, 0.50, 0.76);
    put_pair(&mut f, Side::knee, 0.70, 0.78);
    put_pair(&mut f, Side::ankle, 0.88, 0.78);
    put_pair(&mut f, Side::heel, 0.89, 0.74);
    put_pair(&mut f, Side::foot_index, 0.93, 0.80);
    f
}

pub fn prone_raised() -> LandmarkFrame {
    let mut f = prone_rest();
    put(&mut f, LandmarkIndex::Nose, 0.24, 0.45);
    put_pair(&mut f, Side::shoulder, 0.33, 0.55);
    put_pair(&mut f, Side::elbow, 0.335, 0.665);
    put_pair(&mut f, Side::wrist, 0.34, 0.78);
    f
}

/// 片脚を腰から45°持ち上げる
pub fn leg_raised(side: Side) -> LandmarkFrame {
    let mut f = supine();
    put(&mut f, side.knee(), 0.6415, 0.6185);
    put(&mut f, side.ankle(), 0.783, 0.477);
    put(&mut f, side.heel(), 0.79, 0.49);
    put(&mut f, side.foot_index(), 0.80, 0.45);
    f
}

pub fn toes_pointed() -> LandmarkFrame {
    let mut f = supine();
    for side in Side::BOTH {
        put(&mut f, side.foot_index(), 0.98, 0.76);
    }
    f
}

/// 片脚の踵を引き寄せて膝を曲げる
pub fn heel_drawn(side: Side) -> LandmarkFrame {
    let mut f = supine();
    put(&mut f, side.knee(), 0.6291, 0.6073);
    put(&mut f, side.ankle(), 0.73, 0.78);
    put(&mut f, side.heel(), 0.72, 0.80);
    put(&mut f, side.foot_index(), 0.76, 0.72);
    f
}

fn lerp(a: &LandmarkFrame, b: &LandmarkFrame, t: f32) -> LandmarkFrame {
    let mut out = a.clone();
    for (o, q) in out.landmarks.iter_mut().zip(b.landmarks.iter()) {
        o.x += (q.x - o.x) * t;
        o.y += (q.y - o.y) * t;
        o.z += (q.z - o.z) * t;
        o.visibility += (q.visibility - o.visibility) * t;
    }
    out
}

/// キーフレームを順に保持し、間を線形補間した 30fps の列
pub fn clip(keyframes: &[LandmarkFrame]) -> Vec<TimedFrame> {
    let mut frames = Vec::new();
    for (i, key) in keyframes.iter().enumerate() {
        if i > 0 {
            let prev = &keyframes[i - 1];
            for step in 1..=TRANSITION {
                frames.push(lerp(prev, key, step as f32 / (TRANSITION + 1) as f32));
            }
        }
        frames.extend(std::iter::repeat(key.clone()).take(PLATEAU));
    }
    frames
        .into_iter()
        .enumerate()
        .map(|(i, f)| TimedFrame::new(Duration::from_secs_f32(i as f32 / FPS), Some(f)))
        .collect()
}

pub fn session(kind: ExerciseKind) -> Session {
    Session::new(
        kind,
        &Config::default(),
        SessionOptions {
            hold_secs: Some(0.1),
            target_reps: None,
        },
        Arc::new(Announcer::disabled()),
    )
}

pub fn replay(kind: ExerciseKind, keyframes: &[LandmarkFrame]) -> SessionSummary {
    session(kind).run(&mut ReplaySource::new(clip(keyframes)))
}
