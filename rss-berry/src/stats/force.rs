use log::debug;

use super::feature::{feature_at, sample_features, Feature};
use super::kde::LearnedPdf;
use super::robust::std_dev;
use crate::consts::{BANDWIDTH_FLOOR, BANDWIDTH_FLOOR_RATIO, NUMBER_OF_FEATURE, STAT_SAMPLE_RADIUS};
use crate::params::SegmentParams;
use crate::sfls::SpeedFunction;
use crate::{Idx3d, Mask, Pixel, Volume};

/// 基于稳健统计特征的数据项速度.
///
/// 在膨胀后的种子区域学习每个特征的概率密度, 体素的似然为各特征密度之积,
/// 速度为 `似然 - likelihood_threshold`. 正速度使曲面向外生长.
#[derive(Clone, Debug)]
pub struct RobustStatForce {
    half: Idx3d,
    kernel_width_factor: f64,
    likelihood_threshold: f64,
    pdfs: Vec<LearnedPdf>,
}

impl RobustStatForce {
    /// 从分割参数构造, 尚未学习.
    pub fn new(params: &SegmentParams) -> Self {
        Self {
            half: params.stat_neighbour(),
            kernel_width_factor: params.kernel_width_factor(),
            likelihood_threshold: params.likelihood_threshold(),
            pdfs: Vec::new(),
        }
    }

    /// 每个特征学习得到的密度. 学习前为空.
    #[inline]
    pub fn pdfs(&self) -> &[LearnedPdf] {
        &self.pdfs
    }

    /// 特征向量的似然, 值域 \[0, 1\]. 未学习时为 0.
    pub fn likelihood(&self, feature: &Feature) -> f64 {
        if self.pdfs.is_empty() {
            return 0.0;
        }
        self.pdfs
            .iter()
            .zip(feature.iter())
            .map(|(pdf, &x)| pdf.eval(x))
            .product()
    }

    /// 从已计算好的种子特征学习. `intensity_range` 用于确定带宽下限.
    pub fn learn_features(&mut self, features: &[Feature], intensity_range: f64) {
        let floor = (intensity_range.abs() * BANDWIDTH_FLOOR_RATIO).max(BANDWIDTH_FLOOR);
        self.pdfs = (0..NUMBER_OF_FEATURE)
            .map(|i| {
                let samples: Vec<f64> = features.iter().map(|f| f[i]).collect();
                let bw = (std_dev(&samples) * self.kernel_width_factor).max(floor);
                debug!("feature {i}: {} samples, bandwidth = {bw:.6}", samples.len());
                LearnedPdf::learn(&samples, bw)
            })
            .collect();
    }
}

impl<T: Pixel> SpeedFunction<T> for RobustStatForce {
    fn learn(&mut self, volume: &Volume<T>, seeds: &Mask) {
        let positions = seeds.dilate_cube(STAT_SAMPLE_RADIUS).foreground_pos();
        let features = sample_features(volume, &positions, self.half);
        let range = volume.min_max().map_or(0.0, |(lo, hi)| hi - lo);
        self.learn_features(&features, range);
    }

    fn speed(&self, volume: &Volume<T>, pos: Idx3d) -> f64 {
        self.speed_with(volume, pos, &mut Vec::new())
    }

    fn speed_with(&self, volume: &Volume<T>, pos: Idx3d, buf: &mut Vec<f64>) -> f64 {
        let feature = feature_at(volume, pos, self.half, buf);
        self.likelihood(&feature) - self.likelihood_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::RobustStatForce;
    use crate::params::SegmentParams;
    use crate::phantom;
    use crate::sfls::SpeedFunction;
    use crate::{Geometry, Mask, Volume};

    /// 左半部分为 100, 右半部分为 0.
    fn half_volume() -> Volume<f32> {
        let mut v = Volume::from_elem((6, 6, 12), 0.0f32, Geometry::default());
        v.data_mut().slice_mut(ndarray::s![.., .., ..6]).fill(100.0);
        v
    }

    #[test]
    fn test_speed_sign() {
        let v = half_volume();
        let seeds = Mask::from_positions((6, 6, 12), Geometry::default(), [(3, 3, 2), (3, 2, 2), (2, 3, 2)]);
        let mut force = RobustStatForce::new(&SegmentParams::default());
        assert_eq!(force.speed(&v, (3, 3, 2)), -0.1);

        force.learn(&v, &seeds);
        assert_eq!(force.pdfs().len(), 3);
        assert!(force.speed(&v, (3, 3, 1)) > 0.8);
        assert!(force.speed(&v, (3, 3, 10)) < 0.0);
    }

    #[test]
    fn test_empty_seeds() {
        let v = half_volume();
        let mut force = RobustStatForce::new(&SegmentParams::default());
        force.learn(&v, &Mask::zeros((6, 6, 12), Geometry::default()));
        assert!(force.pdfs().iter().all(|p| p.is_empty()));
        assert!(force.speed(&v, (3, 3, 1)) < 0.0);
    }

    #[test]
    fn test_single_voxel_seed() {
        let (v, _) = phantom::noisy_sphere((24, 24, 24), 6.0, 100.0, 20.0, 10.0, Geometry::default());
        let seeds = Mask::from_positions((24, 24, 24), Geometry::default(), [(12, 12, 12)]);
        let mut force = RobustStatForce::new(&SegmentParams::default());
        force.learn(&v, &seeds);

        // 统计量来自种子周围的 3 * 3 * 3 区域, 带宽远高于下限.
        assert!(force.pdfs().iter().all(|p| p.bandwidth() > 1.0));
        assert!(force.speed(&v, (12, 12, 12)) > 0.5);
        assert!(force.speed(&v, (12, 12, 13)) > 0.5);
        assert!(force.speed(&v, (12, 12, 21)) < 0.0);

        let mut buf = Vec::new();
        assert_eq!(force.speed_with(&v, (12, 13, 12), &mut buf), force.speed(&v, (12, 13, 12)));
    }
}
