//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;
pub use crate::{Geometry, GridAttr, LabelVolume, Mask, Pixel, Volume};

pub use crate::error::{SeedError, SeedResult, VolumeIoError, VolumeIoResult};
pub use crate::params::SegmentParams;
pub use crate::profile::Report;

pub use crate::seed::{preprocess_label_map, LabelMapSeeds, PointSeeds, SeedAcquisition};
pub use crate::sfls::{FnSpeed, Segmentor, SpeedFunction, State, Termination};
pub use crate::stats::RobustStatForce;
