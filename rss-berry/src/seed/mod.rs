//! 种子预处理.
//!
//! 将异构的种子输入 (IJK 点列表, 或可能含有多个标签的标签体)
//! 统一为一个二值种子掩膜. 演化引擎只通过 [`SeedAcquisition`] 获取种子,
//! 与种子的来源无关.

mod label_map;

pub use label_map::{inspect_label_map, preprocess_label_map, LabelMapCase};

use crate::data::in_bound;
use crate::error::{SeedError, SeedResult};
use crate::params::SegmentParams;
use crate::{Geometry, GridAttr, Idx3d, LabelVolume, Mask};

/// 种子获取能力. 根据强度体的形状和几何信息生成初始种子掩膜.
pub trait SeedAcquisition {
    /// 生成与 `shape` 同形状、几何信息为 `geometry` 的二值种子掩膜.
    fn acquire(&self, shape: Idx3d, geometry: &Geometry) -> SeedResult<Mask>;
}

/// 显式 IJK 点种子. 每个点会以立方体结构元膨胀 `radius` 个体素.
#[derive(Clone, Debug)]
pub struct PointSeeds {
    points: Vec<Idx3d>,
    radius: usize,
}

impl PointSeeds {
    /// 由 `(z, h, w)` 点列表和膨胀半径构建.
    #[inline]
    pub fn new(points: Vec<Idx3d>, radius: usize) -> Self {
        Self { points, radius }
    }

    /// 由点列表构建, 膨胀半径取自 `params`.
    #[inline]
    pub fn with_params(points: Vec<Idx3d>, params: &SegmentParams) -> Self {
        Self::new(points, params.seed_dilation_radius())
    }

    /// 种子点.
    #[inline]
    pub fn points(&self) -> &[Idx3d] {
        &self.points
    }
}

impl SeedAcquisition for PointSeeds {
    fn acquire(&self, shape: Idx3d, geometry: &Geometry) -> SeedResult<Mask> {
        if let Some(bad) = self.points.iter().find(|p| !in_bound(p, shape)) {
            return Err(SeedError::PointOutOfBound(*bad, shape));
        }
        let mask = Mask::from_positions(shape, *geometry, self.points.iter().copied());
        Ok(mask.dilate_cube(self.radius))
    }
}

/// 由标签体提供的种子. 标签体先经过 [`preprocess_label_map`] 处理,
/// 随后所有非零体素视为前景.
#[derive(Clone, Debug)]
pub struct LabelMapSeeds<'a> {
    label: &'a LabelVolume,
    desired: i16,
}

impl<'a> LabelMapSeeds<'a> {
    /// 以标签体 `label` 和期望标签 `desired` 构建.
    #[inline]
    pub fn new(label: &'a LabelVolume, desired: i16) -> Self {
        Self { label, desired }
    }
}

impl SeedAcquisition for LabelMapSeeds<'_> {
    fn acquire(&self, shape: Idx3d, _geometry: &Geometry) -> SeedResult<Mask> {
        if self.label.shape() != shape {
            return Err(SeedError::ShapeMismatch(shape, self.label.shape()));
        }
        Ok(preprocess_label_map(self.label, self.desired)?.to_mask())
    }
}

/// 直接使用现成的二值掩膜作为种子.
impl SeedAcquisition for Mask {
    fn acquire(&self, shape: Idx3d, _geometry: &Geometry) -> SeedResult<Mask> {
        if self.shape() != shape {
            return Err(SeedError::ShapeMismatch(shape, self.shape()));
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{LabelMapSeeds, PointSeeds, SeedAcquisition};
    use crate::error::SeedError;
    use crate::{Geometry, LabelVolume, Mask};

    #[test]
    fn test_point_seeds_dilated() {
        let g = Geometry::default();
        let m = PointSeeds::new(vec![(5, 5, 5)], 1)
            .acquire((10, 10, 10), &g)
            .unwrap();
        assert_eq!(m.count_foreground(), 27);

        let m = PointSeeds::new(vec![(5, 5, 5), (5, 5, 6)], 0)
            .acquire((10, 10, 10), &g)
            .unwrap();
        assert_eq!(m.count_foreground(), 2);
    }

    #[test]
    fn test_point_seeds_out_of_bound() {
        let e = PointSeeds::new(vec![(1, 1, 1), (0, 10, 0)], 1)
            .acquire((10, 10, 10), &Geometry::default())
            .unwrap_err();
        assert_eq!(e, SeedError::PointOutOfBound((0, 10, 0), (10, 10, 10)));
    }

    #[test]
    fn test_label_map_seeds() {
        let g = Geometry::default();
        let mut l = LabelVolume::zeros((4, 4, 4), g);
        l[(1, 1, 1)] = 2;
        l[(2, 2, 2)] = 3;
        l[(3, 3, 3)] = 3;

        let m = LabelMapSeeds::new(&l, 3).acquire((4, 4, 4), &g).unwrap();
        assert_eq!(m.count_foreground(), 2);
        assert!(!m.is_foreground((1, 1, 1)));

        let e = LabelMapSeeds::new(&l, 3).acquire((4, 4, 5), &g).unwrap_err();
        assert_eq!(e, SeedError::ShapeMismatch((4, 4, 5), (4, 4, 4)));
    }

    #[test]
    fn test_mask_seeds() {
        let g = Geometry::default();
        let m = Mask::from_positions((3, 3, 3), g, [(1, 1, 1)]);
        assert_eq!(m.acquire((3, 3, 3), &g).unwrap(), m);
        assert!(m.acquire((3, 3, 4), &g).is_err());
    }
}
