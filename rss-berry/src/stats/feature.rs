use itertools::iproduct;

use super::robust::RobustStat;
use crate::consts::NUMBER_OF_FEATURE;
use crate::{GridAttr, Idx3d, Pixel, Volume};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 单个体素的特征向量: \[中位数, 四分位距, 中位数绝对偏差\].
pub type Feature = [f64; NUMBER_OF_FEATURE];

/// 计算 `pos` 处局部窗口 (半边长 `half`, 超出网格部分被裁剪) 内强度的稳健统计特征.
///
/// `buf` 仅用作临时缓冲, 以避免重复分配. 非有限的强度值被忽略.
pub fn feature_at<T: Pixel>(
    volume: &Volume<T>,
    (z, h, w): Idx3d,
    (hz, hh, hw): Idx3d,
    buf: &mut Vec<f64>,
) -> Feature {
    let (nz, nh, nw) = volume.shape();
    buf.clear();
    buf.extend(
        iproduct!(
            z.saturating_sub(hz)..(z + hz + 1).min(nz),
            h.saturating_sub(hh)..(h + hh + 1).min(nh),
            w.saturating_sub(hw)..(w + hw + 1).min(nw)
        )
        .map(|p| volume.value(p))
        .filter(|v| v.is_finite()),
    );
    let s = RobustStat::from_samples(buf);
    [s.median, s.iqr, s.mad]
}

/// 计算 `positions` 中每个体素的特征. 顺序与 `positions` 一致.
pub fn sample_features<T: Pixel>(volume: &Volume<T>, positions: &[Idx3d], half: Idx3d) -> Vec<Feature> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let features: Vec<Feature> = positions
                .par_iter()
                .map_init(Vec::new, |buf, &p| feature_at(volume, p, half, buf))
                .collect();
        } else {
            let mut buf = Vec::new();
            let features: Vec<Feature> = positions
                .iter()
                .map(|&p| feature_at(volume, p, half, &mut buf))
                .collect();
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::{feature_at, sample_features};
    use crate::{Geometry, Volume};

    #[test]
    fn test_feature_uniform() {
        let v = Volume::from_elem((5, 5, 5), 42u8, Geometry::default());
        let mut buf = Vec::new();
        assert_eq!(feature_at(&v, (2, 2, 2), (1, 1, 1), &mut buf), [42.0, 0.0, 0.0]);
        // 角点窗口被裁剪为 2 * 2 * 2.
        assert_eq!(feature_at(&v, (0, 0, 0), (1, 1, 1), &mut buf), [42.0, 0.0, 0.0]);
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_feature_window() {
        let mut v = Volume::from_elem((1, 1, 5), 0.0f32, Geometry::default());
        for w in 0..5 {
            v[(0, 0, w)] = w as f32;
        }
        let mut buf = Vec::new();
        // 窗口 {1, 2, 3}.
        let f = feature_at(&v, (0, 0, 2), (1, 1, 1), &mut buf);
        assert_eq!(f, [2.0, 1.0, 1.0]);

        let all = sample_features(&v, &[(0, 0, 2), (0, 0, 0)], (0, 0, 2));
        assert_eq!(all[0][0], 2.0);
        assert_eq!(all[1], [1.0, 1.0, 1.0]);
    }
}
