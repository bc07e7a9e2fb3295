use ndarray::{Array3, ArrayView3, Zip};

use super::layers::{Layer, NarrowBand};
use crate::consts::gray::{BACKGROUND, FOREGROUND};
use crate::consts::LABEL_BACKGROUND;
use crate::data::diamond_neighbours;
use crate::{Geometry, Idx3d, LabelVolume, Mask};

/// 水平集函数 `phi`. 内部为负, 外部为正, 分割边界附近约为 0.
///
/// 只有窄带体素的值在演化中被更新, 其余体素饱和为 `±FAR_PHI`.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelSetField {
    phi: Array3<f64>,
}

impl LevelSetField {
    /// 以窄带标记初始化: 零层为 0, 内外各层为 ∓1, ∓2, 远端为 ∓3.
    pub fn from_band(band: &NarrowBand) -> Self {
        Self {
            phi: band.labels().mapv(f64::from),
        }
    }

    /// 直接由 `phi` 值构建.
    #[inline]
    pub fn from_array(phi: Array3<f64>) -> Self {
        Self { phi }
    }

    /// `pos` 处的值.
    #[inline]
    pub fn phi(&self, pos: Idx3d) -> f64 {
        self.phi[pos]
    }

    /// 设置 `pos` 处的值.
    #[inline]
    pub fn set(&mut self, pos: Idx3d, value: f64) {
        self.phi[pos] = value;
    }

    /// 全部数据的 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.phi.view()
    }

    /// 网格形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.phi.dim()
    }

    /// 在 `pos` 的 6-邻居中, 找出位于比 `layer` 更靠近零层一层的邻居,
    /// 返回其中最靠近 `layer` 的值 (内侧取最大值, 外侧取最小值).
    ///
    /// 没有这样的邻居 (或 `layer` 为零层) 时返回 `None`, 调用方应保持原值.
    pub fn closest_neighbour_phi(&self, band: &NarrowBand, pos: Idx3d, layer: Layer) -> Option<f64> {
        let closer = layer.closer_label()?;
        let values = diamond_neighbours(pos, self.shape())
            .filter(|&nb| band.label_at(nb) == closer)
            .map(|nb| self.phi[nb]);
        if layer.label() < 0 {
            values.reduce(f64::max)
        } else {
            values.reduce(f64::min)
        }
    }

    /// 阈值化: `phi <= threshold` 的体素标记为 `label`, 其余为背景.
    pub fn threshold(&self, threshold: f64, label: i16, geometry: Geometry) -> LabelVolume {
        LabelVolume::new(
            self.phi.mapv(|v| if v <= threshold { label } else { LABEL_BACKGROUND }),
            geometry,
        )
    }

    /// 阈值化为二值掩膜.
    pub fn threshold_mask(&self, threshold: f64, geometry: Geometry) -> Mask {
        let mut data = Array3::from_elem(self.shape(), BACKGROUND);
        Zip::from(&mut data).and(&self.phi).for_each(|m, &v| {
            if v <= threshold {
                *m = FOREGROUND;
            }
        });
        Mask::new(data, geometry)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::LevelSetField;
    use crate::phantom;
    use crate::sfls::{Layer, NarrowBand};
    use crate::Geometry;

    #[test]
    fn test_from_band() {
        let m = phantom::cube((8, 8, 8), (2, 2, 2), 4, Geometry::default());
        let band = NarrowBand::from_mask(&m);
        let f = LevelSetField::from_band(&band);
        assert_eq!(f.phi((2, 2, 2)), 0.0);
        assert_eq!(f.phi((3, 3, 3)), -1.0);
        assert_eq!(f.phi((1, 2, 2)), 1.0);
        assert_eq!(f.phi((0, 2, 2)), 2.0);
        assert_eq!(f.phi((7, 7, 7)), 3.0);
        // 阈值 0 恰好还原种子.
        assert_eq!(f.threshold_mask(0.0, Geometry::default()), m);
    }

    #[test]
    fn test_closest_neighbour_phi() {
        let m = phantom::cube((8, 8, 8), (2, 2, 2), 4, Geometry::default());
        let band = NarrowBand::from_mask(&m);
        let mut f = LevelSetField::from_band(&band);
        f.set((2, 3, 3), -0.3);
        f.set((3, 2, 3), 0.2);
        assert_eq!(f.closest_neighbour_phi(&band, (3, 3, 3), Layer::Inside1), Some(0.2));
        assert_eq!(f.closest_neighbour_phi(&band, (1, 3, 3), Layer::Outside1), Some(-0.3));
        assert_eq!(f.closest_neighbour_phi(&band, (2, 2, 2), Layer::Zero), None);
        // (0, 0, 0) 周围没有第一层外侧体素.
        assert_eq!(f.closest_neighbour_phi(&band, (0, 0, 0), Layer::Outside2), None);
    }

    #[test]
    fn test_threshold_consistency() {
        let phi = Array3::from_shape_fn((4, 5, 6), |(z, h, w)| z as f64 - h as f64 * 0.5 + w as f64 * 0.25 - 2.0);
        let f = LevelSetField::from_array(phi);
        for t in [-1.0, 0.0, 0.75, 2.0] {
            let out = f.threshold(t, 7, Geometry::default());
            for ((pos, &v), &l) in f.data().indexed_iter().zip(out.data().iter()) {
                assert_eq!(l == 7, v <= t, "{pos:?}: phi = {v}, threshold = {t}");
                assert!(l == 7 || l == 0);
            }
        }
    }
}
