use serde::Deserialize;
use std::collections::VecDeque;

use crate::config::SmoothingConfig;
use crate::pose::{Landmark, LandmarkFrame, LandmarkIndex};

/// 平滑化の方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingStrategy {
    /// 成分ごとのEMA
    #[default]
    Exponential,
    /// 直近Nフレームの単純移動平均
    MovingAverage,
}

enum Filter {
    Exponential {
        alpha: f32,
        prev: Option<LandmarkFrame>,
    },
    MovingAverage {
        window: usize,
        history: Vec<VecDeque<Landmark>>,
    },
}

/// ランドマーク単位の平滑化フィルタ
///
/// x, y, z, visibility のすべてを同じ式で平滑化する。
/// 履歴が無い最初のフレームはそのまま通す。
/// 非有限の成分は履歴に混ぜず、直前の値で置き換える。
pub struct LandmarkSmoother {
    filter: Filter,
}

impl LandmarkSmoother {
    pub fn exponential(alpha: f32) -> Self {
        Self {
            filter: Filter::Exponential { alpha, prev: None },
        }
    }

    pub fn moving_average(window: usize) -> Self {
        let window = window.max(1);
        Self {
            filter: Filter::MovingAverage {
                window,
                history: (0..LandmarkIndex::COUNT)
                    .map(|_| VecDeque::with_capacity(window))
                    .collect(),
            },
        }
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        match config.strategy {
            SmoothingStrategy::Exponential => Self::exponential(config.alpha),
            SmoothingStrategy::MovingAverage => Self::moving_average(config.window),
        }
    }

    pub fn apply(&mut self, frame: &LandmarkFrame) -> LandmarkFrame {
        match &mut self.filter {
            Filter::Exponential { alpha, prev } => {
                let Some(p) = prev.as_ref() else {
                    *prev = Some(frame.clone());
                    return frame.clone();
                };

                let a = *alpha;
                let mut out = frame.clone();
                for (o, old) in out.landmarks.iter_mut().zip(p.landmarks.iter()) {
                    o.x = blend(a, o.x, old.x);
                    o.y = blend(a, o.y, old.y);
                    o.z = blend(a, o.z, old.z);
                    o.visibility = blend(a, o.visibility, old.visibility);
                }
                *prev = Some(out.clone());
                out
            }
            Filter::MovingAverage { window, history } => {
                let mut out = frame.clone();
                for (i, buf) in history.iter_mut().enumerate() {
                    let landmark = match buf.back() {
                        Some(last) => fill_non_finite(frame.landmarks[i], last),
                        None => frame.landmarks[i],
                    };
                    if !is_finite(&landmark) {
                        continue;
                    }
                    if buf.len() == *window {
                        buf.pop_front();
                    }
                    buf.push_back(landmark);
                    out.landmarks[i] = mean(buf);
                }
                out
            }
        }
    }

    /// 履歴の長さ（最初のランドマーク）。EMAでは0か1
    pub fn history_len(&self) -> usize {
        match &self.filter {
            Filter::Exponential { prev, .. } => usize::from(prev.is_some()),
            Filter::MovingAverage { history, .. } => history.first().map_or(0, |b| b.len()),
        }
    }

    pub fn reset(&mut self) {
        match &mut self.filter {
            Filter::Exponential { prev, .. } => *prev = None,
            Filter::MovingAverage { history, .. } => history.iter_mut().for_each(VecDeque::clear),
        }
    }
}

fn blend(alpha: f32, new: f32, old: f32) -> f32 {
    if !new.is_finite() {
        old
    } else if !old.is_finite() {
        new
    } else {
        alpha * new + (1.0 - alpha) * old
    }
}

fn is_finite(l: &Landmark) -> bool {
    l.x.is_finite() && l.y.is_finite() && l.z.is_finite() && l.visibility.is_finite()
}

fn fill_non_finite(l: Landmark, fallback: &Landmark) -> Landmark {
    let pick = |v: f32, f: f32| if v.is_finite() { v } else { f };
    Landmark::new(
        pick(l.x, fallback.x),
        pick(l.y, fallback.y),
        pick(l.z, fallback.z),
        pick(l.visibility, fallback.visibility),
    )
}

fn mean(buf: &VecDeque<Landmark>) -> Landmark {
    let n = buf.len() as f32;
    let mut sum = Landmark::default();
    for l in buf {
        sum.x += l.x;
        sum.y += l.y;
        sum.z += l.z;
        sum.visibility += l.visibility;
    }
    Landmark::new(sum.x / n, sum.y / n, sum.z / n, sum.visibility / n)
}
