use log::{debug, info, trace};

use super::curvature::mean_curvature;
use super::field::LevelSetField;
use super::layers::{Layer, NarrowBand};
use super::speed::SpeedFunction;
use crate::consts::{CFL, MM3_PER_ML};
use crate::error::SeedResult;
use crate::params::SegmentParams;
use crate::profile::{AccTimer, Report};
use crate::seed::SeedAcquisition;
use crate::stats::RobustStatForce;
use crate::{GridAttr, LabelVolume, Mask, Pixel, Volume};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 演化终止原因.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// 分割体积达到上限.
    MaxVolumeReached,

    /// 迭代次数达到上限.
    MaxIterationsReached,

    /// 运行时间达到上限.
    MaxRunningTimeReached,

    /// 零层为空, 或所有体素的速度都可以忽略.
    Stalled,
}

/// 分割器状态.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// 尚未获取种子.
    Uninitialized,

    /// 统计量与窄带已就绪, 尚未演化.
    Ready,

    /// 至少演化过一步.
    Evolving,

    /// 已终止.
    Done(Termination),
}

/// 稀疏场水平集分割器.
///
/// 典型用法:
///
/// ```no_run
/// use rss_berry::prelude::*;
///
/// let volume = Volume::open("volume.nii.gz").unwrap();
/// let params = SegmentParams::default().with_max_volume_ml(50.0);
/// let seeds = PointSeeds::with_params(vec![(40, 256, 256)], &params);
///
/// let mut seg = Segmentor::with_robust_stats(&volume, params);
/// seg.prepare(&seeds).unwrap();
/// let report = seg.run();
/// println!("{report}");
/// seg.label_output().save("label.nii.gz").unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Segmentor<'a, T, S> {
    volume: &'a Volume<T>,
    params: SegmentParams,
    speed: S,
    band: NarrowBand,
    field: LevelSetField,
    state: State,
    iterations: usize,
}

impl<'a, T: Pixel> Segmentor<'a, T, RobustStatForce> {
    /// 以稳健统计力模型构建分割器.
    pub fn with_robust_stats(volume: &'a Volume<T>, params: SegmentParams) -> Self {
        let speed = RobustStatForce::new(&params);
        Self::new(volume, params, speed)
    }
}

impl<'a, T: Pixel, S: SpeedFunction<T>> Segmentor<'a, T, S> {
    /// 以任意速度函数构建分割器. 构建后处于 [`State::Uninitialized`].
    pub fn new(volume: &'a Volume<T>, params: SegmentParams, speed: S) -> Self {
        let shape = volume.shape();
        Self {
            volume,
            params,
            speed,
            band: NarrowBand::empty(shape),
            field: LevelSetField::from_array(ndarray::Array3::from_elem(shape, crate::consts::FAR_PHI)),
            state: State::Uninitialized,
            iterations: 0,
        }
    }

    /// 获取种子, 学习统计量并初始化窄带与水平集. 可以重复调用以重新开始.
    ///
    /// 种子获取失败时返回错误, 分割器状态不变.
    pub fn prepare<A: SeedAcquisition + ?Sized>(&mut self, seeds: &A) -> SeedResult<()> {
        let mask = seeds.acquire(self.volume.shape(), self.volume.geometry())?;
        assert!(mask.same_shape(self.volume));
        debug!("{:?}", self.params);

        self.speed.learn(self.volume, &mask);
        self.band = NarrowBand::from_mask(&mask);
        self.field = LevelSetField::from_band(&self.band);
        self.iterations = 0;
        self.state = State::Ready;
        debug!(
            "prepared: {} seed voxels, {} band voxels",
            mask.count_foreground(),
            self.band.len()
        );
        Ok(())
    }

    /// 演化一步. 零层为空, 或数据项速度的最大绝对值 (归一化之前)
    /// 低于 `stall_epsilon` 时不做任何修改, 进入 `Done(Stalled)` 并返回 `false`.
    ///
    /// # Panics
    ///
    /// 若尚未调用 [`Segmentor::prepare`].
    pub fn step(&mut self) -> bool {
        assert_ne!(self.state, State::Uninitialized, "segmentor is not prepared");
        let data = self.zero_layer_speeds();
        let peak = max_abs(&data);
        if data.is_empty() || peak < self.params.stall_epsilon() {
            self.state = State::Done(Termination::Stalled);
            return false;
        }

        let forces = self.total_forces(data, peak);
        let max = max_abs(&forces);
        let dt = if max > 0.0 { CFL / max } else { 0.0 };
        self.band.advance(&mut self.field, &forces, dt);
        self.iterations += 1;
        self.state = State::Evolving;
        trace!(
            "iteration {}: dt = {dt:.4}, lz = {}, band = {}, inside = {}",
            self.iterations,
            self.band.layer(Layer::Zero).len(),
            self.band.len(),
            self.inside_voxel_count()
        );
        true
    }

    /// 反复演化直到体积, 时间, 迭代次数任一预算耗尽或停滞.
    ///
    /// 预算在每一步之前检查 (依次为体积, 时间, 迭代次数), 因此种子本身已经
    /// 达到体积上限时不会演化.
    ///
    /// # Panics
    ///
    /// 若尚未调用 [`Segmentor::prepare`].
    pub fn run(&mut self) -> Report {
        assert_ne!(self.state, State::Uninitialized, "segmentor is not prepared");
        let mut timer = AccTimer::new();
        let termination = loop {
            if let Some(t) = self.check_budget(&timer) {
                break t;
            }
            if !self.step() {
                break Termination::Stalled;
            }
        };
        timer.elapsed();
        self.state = State::Done(termination);

        let report = Report {
            iterations: self.iterations,
            termination,
            elapsed: timer.total(),
            inside_voxels: self.inside_voxel_count(),
            volume_ml: self.volume_ml(),
        };
        info!("{report}");
        report
    }

    fn check_budget(&self, timer: &AccTimer) -> Option<Termination> {
        if self.inside_voxel_count() as f64 * self.volume.voxel() >= self.params.max_volume_mm3() {
            Some(Termination::MaxVolumeReached)
        } else if timer.peek() >= self.params.max_running_time() {
            Some(Termination::MaxRunningTimeReached)
        } else if self.iterations >= self.params.num_iter() {
            Some(Termination::MaxIterationsReached)
        } else {
            None
        }
    }

    /// 零层每个体素的数据项速度, 顺序与零层一致. 非有限值视为 0.
    fn zero_layer_speeds(&self) -> Vec<f64> {
        let lz = self.band.layer(Layer::Zero);
        let (speed, volume) = (&self.speed, self.volume);
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                let speeds: Vec<f64> = lz
                    .par_iter()
                    .map_init(Vec::new, |buf, &p| finite(speed.speed_with(volume, p, buf)))
                    .collect();
            } else {
                let mut buf = Vec::new();
                let speeds: Vec<f64> = lz
                    .iter()
                    .map(|&p| finite(speed.speed_with(volume, p, &mut buf)))
                    .collect();
            }
        }
        speeds
    }

    /// 总力: 数据项按最大绝对值 `peak` 归一化到 \[-1, 1\], 再减去加权的平均曲率项.
    fn total_forces(&self, data: Vec<f64>, peak: f64) -> Vec<f64> {
        let w = self.params.internal_curvature_weight();
        data.into_iter()
            .zip(self.band.layer(Layer::Zero))
            .map(|(d, &p)| {
                let d = if peak > 0.0 { d / peak } else { 0.0 };
                if w > 0.0 {
                    d - w * mean_curvature(&self.field, p)
                } else {
                    d
                }
            })
            .collect()
    }

    /// 当前状态.
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// 分割参数.
    #[inline]
    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    /// 速度函数.
    #[inline]
    pub fn speed(&self) -> &S {
        &self.speed
    }

    /// 自上次准备以来的演化步数.
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// 当前内部体素个数, 即 `phi` 不超过输出门限的体素个数.
    ///
    /// 内侧各层 `phi <= -0.5`, 外侧各层 `phi >= 0.5`, 因此只需检查零层.
    /// 输出门限位于 \[-0.5, 0.5) 内 (包括默认的 0) 时, 与
    /// [`Segmentor::mask_output`] 的前景体素个数严格一致.
    pub fn inside_voxel_count(&self) -> usize {
        let t = self.params.output_threshold();
        let lz = self.band.layer(Layer::Zero);
        let outside_zero = lz.iter().filter(|&&p| self.field.phi(p) > t).count();
        self.band.inside_count() - outside_zero
    }

    /// 当前分割体积 (毫升).
    #[inline]
    pub fn volume_ml(&self) -> f64 {
        self.inside_voxel_count() as f64 * self.volume.voxel() / MM3_PER_ML
    }

    /// 窄带.
    #[inline]
    pub fn band(&self) -> &NarrowBand {
        &self.band
    }

    /// 水平集函数.
    #[inline]
    pub fn field(&self) -> &LevelSetField {
        &self.field
    }

    /// 按输出门限阈值化得到的标签体, 几何信息与强度体一致.
    pub fn label_output(&self) -> LabelVolume {
        self.field.threshold(
            self.params.output_threshold(),
            self.params.output_label(),
            *self.volume.geometry(),
        )
    }

    /// 按输出门限阈值化得到的二值掩膜.
    pub fn mask_output(&self) -> Mask {
        self.field
            .threshold_mask(self.params.output_threshold(), *self.volume.geometry())
    }
}

#[inline]
fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |m: f64, v| m.max(v.abs()))
}
