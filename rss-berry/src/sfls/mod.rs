//! 稀疏场水平集演化.
//!
//! 水平集只在零层附近的五层窄带中更新. 每一步先并行计算零层上的速度
//! (数据项与曲率项), 按 CFL 条件归一化时间步长, 再串行地迁移各层成员.

mod curvature;
mod evolution;
mod field;
mod layers;
mod speed;

pub use curvature::mean_curvature;
pub use evolution::{Segmentor, State, Termination};
pub use field::LevelSetField;
pub use layers::{Layer, NarrowBand};
pub use speed::{FnSpeed, SpeedFunction};
