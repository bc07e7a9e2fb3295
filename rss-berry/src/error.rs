//! 运行时错误.

use crate::Idx3d;
use thiserror::Error;

/// 种子预处理错误.
///
/// 除此之外, 演化过程本身不存在可恢复错误: 数值退化均被就地钳制,
/// 终止原因通过 [`crate::sfls::Termination`] 表达.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    /// 标签体中的最小标签不是背景 0. 这是调用方输入错误, 无法恢复.
    #[error("background label 0 must be the minimum label, found {0}")]
    BackgroundNotMinimum(i16),

    /// 种子点越界.
    #[error("seed {0:?} is out of grid {1:?}")]
    PointOutOfBound(Idx3d, Idx3d),

    /// 标签体与强度体的形状不一致. `(期望, 实际)`
    #[error("label shape {1:?} does not match intensity shape {0:?}")]
    ShapeMismatch(Idx3d, Idx3d),
}

/// 种子预处理结果.
pub type SeedResult<T> = Result<T, SeedError>;

/// 体数据文件读写错误.
#[derive(Error, Debug)]
pub enum VolumeIoError {
    /// nifti 文件解析或写入失败.
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// 数据长度与 header 描述的形状不符.
    #[error("volume shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// 体数据文件读写结果.
pub type VolumeIoResult<T> = Result<T, VolumeIoError>;
