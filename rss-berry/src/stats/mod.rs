//! 稳健统计力模型.
//!
//! 在种子邻域上学习局部强度的稳健统计特征 (中位数, 四分位距, 中位数绝对偏差)
//! 的核密度估计, 并据此给出零层体素的数据项速度.

mod feature;
mod force;
mod kde;
pub mod robust;

pub use feature::{feature_at, sample_features, Feature};
pub use force::RobustStatForce;
pub use kde::LearnedPdf;
