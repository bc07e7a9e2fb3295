//! 分割参数.

use std::time::Duration;

use crate::consts::MM3_PER_ML;
use crate::Idx3d;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 核宽度系数的下限, 对应 `intensity_homogeneity == 1`.
const KERNEL_WIDTH_FACTOR_MIN: f64 = 1.0;

/// 核宽度系数的上限, 对应 `intensity_homogeneity == 0`.
const KERNEL_WIDTH_FACTOR_MAX: f64 = 19.0;

/// 调用方的曲率权重与引擎内部权重的比例.
const CURVATURE_WEIGHT_SCALE: f64 = 1.5;

/// 分割所需的全部标量参数.
///
/// 通过 `Default` 获取默认值, 再用 `with_*` 方法逐项修改.
/// 所有 `with_*` 方法在参数非法时 panic.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentParams {
    /// 最大分割体积 (毫升).
    max_volume_ml: f64,

    /// 目标内部的强度均匀程度, 取值 \[0, 1\].
    intensity_homogeneity: f64,

    /// 曲率正则项权重, 取值 \[0, 1\]. 引擎内部使用其 `1 / 1.5` 倍.
    curvature_weight: f64,

    /// 墙钟时间预算. 序列化时以秒为单位.
    #[cfg_attr(feature = "serde", serde(with = "duration_secs"))]
    max_running_time: Duration,

    /// 迭代次数上限.
    num_iter: usize,

    /// 特征统计窗口的半边长 `(z, h, w)`.
    stat_neighbour: Idx3d,

    /// 数据项的似然门限.
    likelihood_threshold: f64,

    /// 输出门限. 水平集值不大于该值的体素为前景.
    output_threshold: f64,

    /// 输出前景的标签值.
    output_label: i16,

    /// 点种子的膨胀半径.
    seed_dilation_radius: usize,

    /// 最大速度绝对值低于该值时视为停滞.
    stall_epsilon: f64,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            max_volume_ml: 100.0,
            intensity_homogeneity: 0.5,
            curvature_weight: 0.5,
            max_running_time: Duration::from_secs(600),
            num_iter: 10_000,
            stat_neighbour: (1, 1, 1),
            likelihood_threshold: 0.1,
            output_threshold: 0.0,
            output_label: 1,
            seed_dilation_radius: 1,
            stall_epsilon: 1e-8,
        }
    }
}

impl SegmentParams {
    /// 设置最大分割体积 (毫升). 必须为非负有限值.
    pub fn with_max_volume_ml(mut self, ml: f64) -> Self {
        assert!(ml.is_finite() && ml >= 0.0);
        self.max_volume_ml = ml;
        self
    }

    /// 设置强度均匀程度. 必须在 \[0, 1\] 内.
    pub fn with_intensity_homogeneity(mut self, h: f64) -> Self {
        assert!((0.0..=1.0).contains(&h));
        self.intensity_homogeneity = h;
        self
    }

    /// 设置曲率权重. 必须在 \[0, 1\] 内.
    pub fn with_curvature_weight(mut self, w: f64) -> Self {
        assert!((0.0..=1.0).contains(&w));
        self.curvature_weight = w;
        self
    }

    /// 设置墙钟时间预算.
    #[inline]
    pub fn with_max_running_time(mut self, t: Duration) -> Self {
        self.max_running_time = t;
        self
    }

    /// 设置迭代次数上限.
    #[inline]
    pub fn with_num_iter(mut self, n: usize) -> Self {
        self.num_iter = n;
        self
    }

    /// 设置特征统计窗口的半边长.
    #[inline]
    pub fn with_stat_neighbour(mut self, half: Idx3d) -> Self {
        self.stat_neighbour = half;
        self
    }

    /// 设置似然门限. 必须在 \[0, 1\] 内.
    pub fn with_likelihood_threshold(mut self, t: f64) -> Self {
        assert!((0.0..=1.0).contains(&t));
        self.likelihood_threshold = t;
        self
    }

    /// 设置输出门限. 必须为有限值.
    pub fn with_output_threshold(mut self, t: f64) -> Self {
        assert!(t.is_finite());
        self.output_threshold = t;
        self
    }

    /// 设置输出前景标签. 不能为背景 0.
    pub fn with_output_label(mut self, label: i16) -> Self {
        assert_ne!(label, 0);
        self.output_label = label;
        self
    }

    /// 设置点种子的膨胀半径.
    #[inline]
    pub fn with_seed_dilation_radius(mut self, r: usize) -> Self {
        self.seed_dilation_radius = r;
        self
    }

    /// 设置停滞门限. 为 0 时从不判定停滞.
    pub fn with_stall_epsilon(mut self, eps: f64) -> Self {
        assert!(eps.is_finite() && eps >= 0.0);
        self.stall_epsilon = eps;
        self
    }

    /// 最大分割体积 (毫升).
    #[inline]
    pub fn max_volume_ml(&self) -> f64 {
        self.max_volume_ml
    }

    /// 强度均匀程度.
    #[inline]
    pub fn intensity_homogeneity(&self) -> f64 {
        self.intensity_homogeneity
    }

    /// 调用方给定的曲率权重.
    #[inline]
    pub fn curvature_weight(&self) -> f64 {
        self.curvature_weight
    }

    /// 墙钟时间预算.
    #[inline]
    pub fn max_running_time(&self) -> Duration {
        self.max_running_time
    }

    /// 迭代次数上限.
    #[inline]
    pub fn num_iter(&self) -> usize {
        self.num_iter
    }

    /// 特征统计窗口的半边长.
    #[inline]
    pub fn stat_neighbour(&self) -> Idx3d {
        self.stat_neighbour
    }

    /// 似然门限.
    #[inline]
    pub fn likelihood_threshold(&self) -> f64 {
        self.likelihood_threshold
    }

    /// 输出门限.
    #[inline]
    pub fn output_threshold(&self) -> f64 {
        self.output_threshold
    }

    /// 输出前景标签.
    #[inline]
    pub fn output_label(&self) -> i16 {
        self.output_label
    }

    /// 点种子膨胀半径.
    #[inline]
    pub fn seed_dilation_radius(&self) -> usize {
        self.seed_dilation_radius
    }

    /// 停滞门限.
    #[inline]
    pub fn stall_epsilon(&self) -> f64 {
        self.stall_epsilon
    }

    /// 引擎内部实际使用的曲率权重.
    #[inline]
    pub fn internal_curvature_weight(&self) -> f64 {
        self.curvature_weight / CURVATURE_WEIGHT_SCALE
    }

    /// 由强度均匀程度换算得到的核宽度系数. 均匀程度越高, 核越窄.
    ///
    /// `h = 0.5` 时为 10.
    #[inline]
    pub fn kernel_width_factor(&self) -> f64 {
        KERNEL_WIDTH_FACTOR_MIN
            + (KERNEL_WIDTH_FACTOR_MAX - KERNEL_WIDTH_FACTOR_MIN) * (1.0 - self.intensity_homogeneity)
    }

    /// 最大分割体积, 以立方毫米为单位.
    #[inline]
    pub fn max_volume_mm3(&self) -> f64 {
        self.max_volume_ml * MM3_PER_ML
    }
}

/// 以秒 (浮点数) 序列化 `Duration`.
#[cfg(feature = "serde")]
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        if secs.is_finite() && secs >= 0.0 {
            Ok(Duration::from_secs_f64(secs))
        } else {
            Err(serde::de::Error::custom("running time must be a non-negative number"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SegmentParams;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    #[test]
    fn test_derived_values() {
        let p = SegmentParams::default();
        assert!(f64_eq(p.kernel_width_factor(), 10.0));
        assert!(f64_eq(p.internal_curvature_weight(), 0.5 / 1.5));
        assert!(f64_eq(p.max_volume_mm3(), 100_000.0));

        let p = p.with_intensity_homogeneity(1.0).with_curvature_weight(1.0);
        assert!(f64_eq(p.kernel_width_factor(), 1.0));
        assert!(f64_eq(p.internal_curvature_weight(), 2.0 / 3.0));
    }

    #[test]
    #[should_panic]
    fn test_homogeneity_out_of_range() {
        let _ = SegmentParams::default().with_intensity_homogeneity(1.5);
    }

    #[test]
    #[should_panic]
    fn test_background_output_label() {
        let _ = SegmentParams::default().with_output_label(0);
    }
}
