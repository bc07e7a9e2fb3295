#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 基于稀疏场水平集 (sparse-field level set, SFLS) 和稳健统计量
//! (robust statistics) 的 3D 医学图像种子分割引擎.
//!
//! 输入为 3D 强度体 ([`Volume`]), 种子 (IJK 点列表或标签体 [`LabelVolume`])
//! 以及一组标量参数 ([`params::SegmentParams`]), 输出为与强度体同几何的 3D 标签体.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 所有 3D 索引均按 `(z, h, w)` 组织, 即 (切片, 行, 列).
//!   从 nifti 文件读取时会自动由 `[W, H, z]` 转换.
//! 2. 调用方违反 API 约定 (如形状不一致, 参数越界) 时程序直接 panic;
//!   用户输入错误 (如标签体背景不是最小标签) 以 `Err` 返回.
//! 3. 数值退化 (带宽为零, 窄带为空, 边界体素曲率不可算) 一律就地钳制, 不会报错.
//!
//! # 模块概览
//!
//! ### 数据结构 ✅
//!
//! 强度体, 标签体, 二值掩膜及其几何信息. 实现位于 `rss-berry/src/data`.
//!
//! ### 种子预处理 ✅
//!
//! 将点种子或多标签标签体统一为二值种子掩膜. 实现位于 `rss-berry/src/seed`.
//!
//! ### 稳健统计力模型 ✅
//!
//! 种子邻域的中位数 / 四分位距 / 中位数绝对偏差特征, 及其核密度估计.
//! 实现位于 `rss-berry/src/stats`.
//!
//! ### 稀疏场水平集演化 ✅
//!
//! 五层窄带, 水平集函数, 曲率正则项和演化控制器.
//! 实现位于 `rss-berry/src/sfls`.

/// 三维索引 `(z, h, w)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D 体数据基础数据结构.
mod data;

pub use data::{Geometry, GridAttr, LabelVolume, Mask, Pixel, Volume};

pub mod consts;

pub mod error;

pub mod params;

pub mod phantom;

pub mod prelude;

pub mod profile;

pub mod seed;

pub mod sfls;

pub mod stats;
