use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView3, ArrayViewMut3};
use nifti::{InMemNiftiVolume, IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use num::ToPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::VolumeIoResult;
use crate::Idx3d;

mod label;
mod mask;

pub use label::LabelVolume;
pub use mask::Mask;

/// 体素数值类型. 任何可以无歧义转换为 `f64` 的基本数值类型都满足该约束.
///
/// 算法内部统一以 `f64` 计算, 该约束只用于避免逐体素的动态分发.
pub trait Pixel: ToPrimitive + Copy + Send + Sync + 'static {}

impl<T: ToPrimitive + Copy + Send + Sync + 'static> Pixel for T {}

/// 3D 体数据的几何信息. 三个分量均按 `(z, h, w)` 排列.
///
/// 算法只使用 `spacing`; `origin` 和 `direction` 作为元信息原样传递到输出.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Geometry {
    spacing: [f64; 3],
    origin: [f64; 3],
    direction: [[f64; 3]; 3],
}

impl Default for Geometry {
    /// 各向同性, 1 毫米分辨率, 原点为零, 方向为单位阵.
    #[inline]
    fn default() -> Self {
        Self::new([1.0; 3])
    }
}

impl Geometry {
    /// 以毫米为单位的分辨率 `spacing` 构建几何信息. 分辨率必须为正, 否则程序 panic.
    pub fn new(spacing: [f64; 3]) -> Self {
        assert!(spacing.iter().all(|s| s.is_finite() && *s > 0.0));
        Self {
            spacing,
            origin: [0.0; 3],
            direction: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// 设置原点.
    #[inline]
    pub fn with_origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    /// 设置方向矩阵.
    #[inline]
    pub fn with_direction(mut self, direction: [[f64; 3]; 3]) -> Self {
        self.direction = direction;
        self
    }

    /// 从 nifti header 提取几何信息. 方向四元数不被解析, 方向矩阵保持单位阵.
    fn from_header(h: &NiftiHeader) -> Self {
        let [_, w, hh, z, ..] = h.pixdim;
        let spacing = [z, hh, w].map(|s| if s > 0.0 { s as f64 } else { 1.0 });
        Self::new(spacing).with_origin([h.quatern_z as f64, h.quatern_y as f64, h.quatern_x as f64])
    }

    /// 转换为写文件用的 nifti header. 形状和数据类型由写入器补全.
    fn to_header(self) -> NiftiHeader {
        let mut header = NiftiHeader::default();
        let [z, h, w] = self.spacing;
        header.pixdim[1..4].copy_from_slice(&[w as f32, h as f32, z as f32]);
        let [oz, oh, ow] = self.origin;
        (header.quatern_x, header.quatern_y, header.quatern_z) = (ow as f32, oh as f32, oz as f32);
        header.qform_code = 1;
        header
    }

    /// 分辨率 (毫米), 分别代表空间 (相邻切片方向), 高, 宽.
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// 原点.
    #[inline]
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// 方向矩阵.
    #[inline]
    pub fn direction(&self) -> [[f64; 3]; 3] {
        self.direction
    }

    /// 单个体素的实际体积, 以立方毫米为单位.
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.spacing.iter().product()
    }
}

/// 所有 3D 网格 (强度体, 标签体, 掩膜) 的共用属性和部分通用操作.
pub trait GridAttr {
    /// 获取几何信息.
    fn geometry(&self) -> &Geometry;

    /// 获取数据形状大小 `(z, h, w)`.
    fn shape(&self) -> Idx3d;

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, pos: &Idx3d) -> bool {
        in_bound(pos, self.shape())
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.geometry().voxel()
    }

    /// 两个网格是否形状一致.
    #[inline]
    fn same_shape<G: GridAttr>(&self, other: &G) -> bool {
        self.shape() == other.shape()
    }
}

/// `pos` 是否落在形状为 `shape` 的网格内.
#[inline]
pub(crate) fn in_bound(&(z0, h0, w0): &Idx3d, (z, h, w): Idx3d) -> bool {
    z0 < z && h0 < h && w0 < w
}

/// 获得 `(z, h, w)` 前后上下左右六个点的索引. 不检查越界.
///
/// 越界分量会回绕为 `usize::MAX` 附近的值, 因此总能被 [`in_bound`] 过滤掉.
#[inline]
pub(crate) fn neighbour6((z, h, w): Idx3d) -> [Idx3d; 6] {
    [
        (z.wrapping_sub(1), h, w),
        (z.saturating_add(1), h, w),
        (z, h.wrapping_sub(1), w),
        (z, h.saturating_add(1), w),
        (z, h, w.wrapping_sub(1)),
        (z, h, w.saturating_add(1)),
    ]
}

/// 获得 `pos` 在形状为 `shape` 的网格内的 6-邻居 (钻石型) 索引.
///
/// 在数据范围外的坐标会被过滤掉.
#[inline]
pub(crate) fn diamond_neighbours(pos: Idx3d, shape: Idx3d) -> impl Iterator<Item = Idx3d> {
    neighbour6(pos)
        .into_iter()
        .filter(move |p| in_bound(p, shape))
}

/// 保证数据为标准内存布局.
#[inline]
fn standard<T: Clone>(data: Array3<T>) -> Array3<T> {
    if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().to_owned()
    }
}

/// 读取 nifti 文件, 返回几何信息, `(z, h, w)` 形状和体数据.
fn read_nifti(path: &Path) -> nifti::Result<(Geometry, Idx3d, InMemNiftiVolume)> {
    let obj = ReaderOptions::new().read_file(path)?;
    let header = obj.header();
    let geometry = Geometry::from_header(header);
    let [_, w, h, z, ..] = header.dim;
    Ok((geometry, (z as usize, h as usize, w as usize), obj.into_volume()))
}

/// 将 nifti 的 `[W, H, z]` 数据转换为 `(z, h, w)` 排列.
fn to_zhw<T: Clone>(data: ArrayD<T>, shape: Idx3d) -> VolumeIoResult<Array3<T>> {
    // hint: 原第一维向下增长, 原第二维向右增长.
    let data = data.permuted_axes([2, 1, 0].as_slice());

    // The nature of nifti data field layout.
    debug_assert!(data.is_standard_layout());
    Ok(Array3::<T>::from_shape_vec(shape, data.into_raw_vec())?)
}

/// 3D 强度体. 体素类型 `T` 可以是任意整数或浮点类型.
#[derive(Debug, Clone)]
pub struct Volume<T> {
    geometry: Geometry,
    data: Array3<T>,
}

impl<T> GridAttr for Volume<T> {
    #[inline]
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl<T> Index<Idx3d> for Volume<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<Idx3d> for Volume<T> {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl Volume<f32> {
    /// 打开 nii 文件格式的 3D 强度体. 体素值统一转换为 `f32`.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> VolumeIoResult<Self> {
        let (geometry, shape, volume) = read_nifti(path.as_ref())?;
        let data = to_zhw(volume.into_ndarray::<f32>()?, shape)?;
        Ok(Self { geometry, data })
    }
}

impl<T: Pixel> Volume<T> {
    /// 由 `(z, h, w)` 排列的数据和几何信息直接创建强度体.
    pub fn new(data: Array3<T>, geometry: Geometry) -> Self {
        Self {
            geometry,
            data: standard(data),
        }
    }

    /// 创建所有体素值均为 `value` 的强度体.
    #[inline]
    pub fn from_elem(shape: Idx3d, value: T, geometry: Geometry) -> Self {
        Self::new(Array3::from_elem(shape, value), geometry)
    }

    /// 以 `f64` 获取 `pos` 处的强度. 越界时 panic.
    #[inline]
    pub fn value(&self, pos: Idx3d) -> f64 {
        self.data[pos].to_f64().unwrap_or(f64::NAN)
    }

    /// 获取强度最小值与最大值. 非有限值被忽略. 若不存在有限值, 则返回 `None`.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .filter_map(|p| p.to_f64())
            .filter(|p| p.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, T> {
        self.data.view_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::{diamond_neighbours, Geometry, GridAttr, Volume};
    use crate::Idx3d;

    #[test]
    fn test_diamond_neighbours_clamped() {
        let shape = (3, 3, 3);
        let corner: Vec<Idx3d> = diamond_neighbours((0, 0, 0), shape).collect();
        assert_eq!(corner, vec![(1, 0, 0), (0, 1, 0), (0, 0, 1)]);

        assert_eq!(diamond_neighbours((1, 1, 1), shape).count(), 6);
        assert_eq!(diamond_neighbours((2, 2, 2), shape).count(), 3);
    }

    #[test]
    fn test_geometry_voxel() {
        let g = Geometry::new([2.0, 0.5, 0.5]);
        assert!((g.voxel() - 0.5).abs() < 1e-12);
        assert_eq!(Geometry::default().voxel(), 1.0);
    }

    #[test]
    #[should_panic]
    fn test_geometry_rejects_zero_spacing() {
        Geometry::new([1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_volume_min_max() {
        let mut v = Volume::from_elem((2, 3, 4), 7i16, Geometry::default());
        v[(1, 2, 3)] = -5;
        v[(0, 0, 0)] = 100;
        assert_eq!(v.min_max(), Some((-5.0, 100.0)));
        assert_eq!(v.value((1, 2, 3)), -5.0);
        assert_eq!(v.size(), 24);

        let f = Volume::from_elem((1, 1, 2), f32::NAN, Geometry::default());
        assert_eq!(f.min_max(), None);
    }
}
