use serde::Deserialize;

/// 頂点 `b` における `a`-`b`-`c` のなす角（度、0〜180）
///
/// atan2(|cross|, dot) で求めるので一直線付近でも NaN にならない。
/// 点が重なっている場合は 0 を返す。
pub fn angle(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    let u = [a[0] - b[0], a[1] - b[1]];
    let v = [c[0] - b[0], c[1] - b[1]];
    let cross = u[0] * v[1] - u[1] * v[0];
    let dot = u[0] * v[0] + u[1] * v[1];
    if cross == 0.0 && dot == 0.0 {
        return 0.0;
    }
    cross.abs().atan2(dot).to_degrees()
}

/// 符号付きの角度（度、-180〜180]
///
/// 画像座標（y下向き）で `b→a` から `b→c` への回転方向を符号に持つ。
pub fn signed_angle(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    let u = [a[0] - b[0], a[1] - b[1]];
    let v = [c[0] - b[0], c[1] - b[1]];
    let cross = u[0] * v[1] - u[1] * v[0];
    let dot = u[0] * v[0] + u[1] * v[1];
    if cross == 0.0 && dot == 0.0 {
        return 0.0;
    }
    let deg = cross.atan2(dot).to_degrees();
    // -0.0 の cross で -180 になるのを揃える
    if deg <= -180.0 {
        180.0
    } else {
        deg
    }
}

pub fn midpoint(p: [f32; 2], q: [f32; 2]) -> [f32; 2] {
    [(p[0] + q[0]) * 0.5, (p[1] + q[1]) * 0.5]
}

pub fn distance(p: [f32; 2], q: [f32; 2]) -> f32 {
    let dx = p[0] - q[0];
    let dy = p[1] - q[1];
    (dx * dx + dy * dy).sqrt()
}

/// 正規化座標の2点間距離をピクセル単位で求める
pub fn pixel_distance(p: [f32; 2], q: [f32; 2], width: u32, height: u32) -> f32 {
    let dx = (p[0] - q[0]) * width as f32;
    let dy = (p[1] - q[1]) * height as f32;
    (dx * dx + dy * dy).sqrt()
}

/// 両端を含む範囲。NaN はどの範囲にも含まれない。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_right_angle() {
        assert!(approx_eq(angle([1.0, 0.0], [0.0, 0.0], [0.0, 1.0]), 90.0, 1e-4));
    }

    #[test]
    fn test_collinear_is_180() {
        assert!(approx_eq(angle([0.0, 0.5], [0.5, 0.5], [1.0, 0.5]), 180.0, 1e-4));
        assert!(approx_eq(angle([0.2, 0.1], [0.3, 0.3], [0.4, 0.5]), 180.0, 1e-3));
    }

    #[test]
    fn test_same_direction_is_zero() {
        assert!(approx_eq(angle([1.0, 0.0], [0.0, 0.0], [2.0, 0.0]), 0.0, 1e-4));
    }

    #[test]
    fn test_coincident_points() {
        assert_eq!(angle([0.3, 0.3], [0.3, 0.3], [0.3, 0.3]), 0.0);
        assert_eq!(angle([0.3, 0.3], [0.3, 0.3], [0.5, 0.1]), 0.0);
        assert_eq!(signed_angle([0.3, 0.3], [0.3, 0.3], [0.3, 0.3]), 0.0);
        assert_eq!(distance([0.3, 0.3], [0.3, 0.3]), 0.0);
    }

    #[test]
    fn test_nan_propagates_to_range_test() {
        let a = angle([f32::NAN, 0.0], [0.0, 0.0], [1.0, 0.0]);
        assert!(!AngleRange::new(0.0, 180.0).contains(a));
    }

    #[test]
    fn test_signed_angle_direction() {
        // y下向き座標で x軸 → -y軸（画面上方向）
        let up = signed_angle([1.0, 0.0], [0.0, 0.0], [0.0, -1.0]);
        let down = signed_angle([1.0, 0.0], [0.0, 0.0], [0.0, 1.0]);
        assert!(approx_eq(up, -90.0, 1e-4));
        assert!(approx_eq(down, 90.0, 1e-4));
    }

    #[test]
    fn test_signed_angle_straight_is_positive_180() {
        assert!(approx_eq(signed_angle([-1.0, 0.0], [0.0, 0.0], [1.0, 0.0]), 180.0, 1e-4));
        assert!(approx_eq(signed_angle([1.0, 0.0], [0.0, 0.0], [-1.0, 0.0]), 180.0, 1e-4));
    }

    #[test]
    fn test_midpoint_and_distance() {
        assert_eq!(midpoint([0.0, 0.0], [1.0, 0.5]), [0.5, 0.25]);
        assert!(approx_eq(distance([0.0, 0.0], [0.3, 0.4]), 0.5, 1e-6));
    }

    #[test]
    fn test_pixel_distance_scales_axes() {
        let d = pixel_distance([0.0, 0.0], [0.5, 0.5], 640, 480);
        assert!(approx_eq(d, (320.0f32 * 320.0 + 240.0 * 240.0).sqrt(), 1e-3));
    }

    #[test]
    fn test_range_is_inclusive() {
        let r = AngleRange::new(80.0, 110.0);
        assert!(r.contains(80.0));
        assert!(r.contains(110.0));
        assert!(!r.contains(79.999));
        assert!(!r.contains(f32::NAN));
        assert!(r.is_valid());
        assert!(!AngleRange::new(10.0, 5.0).is_valid());
    }
}
