//! 合成测试数据.
//!
//! 所有生成器都是确定性的: 相同参数总是得到相同的体数据.

use ndarray::Array3;

use crate::consts::gray::{BACKGROUND, FOREGROUND};
use crate::{Geometry, Idx3d, Mask, Volume};

/// 以网格中心为球心, 半径为 `radius` (体素) 的实心球掩膜.
pub fn sphere(shape: Idx3d, radius: f64, geometry: Geometry) -> Mask {
    let (cz, ch, cw) = center(shape);
    let r2 = radius * radius;
    let data = Array3::from_shape_fn(shape, |(z, h, w)| {
        let (a, b, c) = (z as f64 - cz, h as f64 - ch, w as f64 - cw);
        if a * a + b * b + c * c <= r2 {
            FOREGROUND
        } else {
            BACKGROUND
        }
    });
    Mask::new(data, geometry)
}

/// 以 `corner` 为最小角, 边长为 `edge` 的实心立方体掩膜. 超出网格的部分被裁剪.
pub fn cube(shape: Idx3d, (z0, h0, w0): Idx3d, edge: usize, geometry: Geometry) -> Mask {
    let inside = |v: usize, v0: usize| v0 <= v && v < v0 + edge;
    let data = Array3::from_shape_fn(shape, |(z, h, w)| {
        if inside(z, z0) && inside(h, h0) && inside(w, w0) {
            FOREGROUND
        } else {
            BACKGROUND
        }
    });
    Mask::new(data, geometry)
}

/// 带噪声的球体强度体, 同时返回真实掩膜.
///
/// 球内强度为 `inside`, 球外为 `outside`, 每个体素叠加 `[-noise, noise]`
/// 内的确定性均匀噪声.
pub fn noisy_sphere(
    shape: Idx3d,
    radius: f64,
    inside: f32,
    outside: f32,
    noise: f32,
    geometry: Geometry,
) -> (Volume<f32>, Mask) {
    let truth = sphere(shape, radius, geometry);
    let (_, nh, nw) = shape;
    let data = Array3::from_shape_fn(shape, |pos @ (z, h, w)| {
        let base = if truth.is_foreground(pos) { inside } else { outside };
        let u = unit_noise(((z * nh + h) * nw + w) as u64);
        base + noise * (2.0 * u - 1.0)
    });
    (Volume::new(data, geometry), truth)
}

#[inline]
fn center((z, h, w): Idx3d) -> (f64, f64, f64) {
    (z as f64 / 2.0, h as f64 / 2.0, w as f64 / 2.0)
}

/// splitmix64, 映射到 \[0, 1).
#[inline]
fn unit_noise(seed: u64) -> f32 {
    let mut x = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    (x >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::{cube, noisy_sphere, sphere};
    use crate::{Geometry, GridAttr};

    #[test]
    fn test_cube() {
        let g = Geometry::default();
        assert_eq!(cube((10, 10, 10), (2, 3, 4), 3, g).count_foreground(), 27);
        // 裁剪.
        assert_eq!(cube((10, 10, 10), (8, 8, 8), 5, g).count_foreground(), 8);
    }

    #[test]
    fn test_sphere() {
        let m = sphere((21, 21, 21), 5.0, Geometry::default());
        let n = m.count_foreground() as f64;
        let expected = 4.0 / 3.0 * std::f64::consts::PI * 125.0;
        assert!((n - expected).abs() / expected < 0.1);
        assert!(m.is_foreground((10, 10, 15)));
        assert!(!m.is_foreground((10, 10, 16)));
    }

    #[test]
    fn test_noisy_sphere() {
        let g = Geometry::new([0.5, 0.5, 2.0]);
        let (v, truth) = noisy_sphere((16, 16, 16), 4.0, 100.0, 0.0, 5.0, g);
        assert_eq!(v.shape(), truth.shape());
        assert_eq!(v.geometry(), &g);
        let (lo, hi) = v.min_max().unwrap();
        assert!(lo >= -5.0 && hi <= 105.0);
        assert!(v[(8, 8, 8)] >= 95.0);
        assert!(v[(0, 0, 0)] <= 5.0);

        let (again, _) = noisy_sphere((16, 16, 16), 4.0, 100.0, 0.0, 5.0, g);
        assert_eq!(v.data(), again.data());
    }
}
