//! 合成病例.

use rss_berry::phantom;
use rss_berry::{Geometry, Idx3d, Mask, Volume};

/// 一个带噪球体病例.
#[derive(Clone, Debug)]
pub struct Case {
    pub name: &'static str,
    pub shape: Idx3d,
    pub radius: f64,
    pub inside: f32,
    pub outside: f32,
    pub noise: f32,
    pub spacing: [f64; 3],
}

impl Case {
    /// 生成强度体和真实掩膜.
    pub fn build(&self) -> (Volume<f32>, Mask) {
        phantom::noisy_sphere(
            self.shape,
            self.radius,
            self.inside,
            self.outside,
            self.noise,
            Geometry::new(self.spacing),
        )
    }

    /// 球心, 即种子点.
    pub fn seed(&self) -> Idx3d {
        let (z, h, w) = self.shape;
        (z / 2, h / 2, w / 2)
    }
}

/// 全部病例.
pub const CASES: [Case; 4] = [
    Case {
        name: "clean",
        shape: (32, 32, 32),
        radius: 8.0,
        inside: 100.0,
        outside: 20.0,
        noise: 2.0,
        spacing: [1.0, 1.0, 1.0],
    },
    Case {
        name: "noisy",
        shape: (32, 32, 32),
        radius: 8.0,
        inside: 100.0,
        outside: 20.0,
        noise: 20.0,
        spacing: [1.0, 1.0, 1.0],
    },
    Case {
        name: "low-contrast",
        shape: (32, 32, 32),
        radius: 10.0,
        inside: 60.0,
        outside: 40.0,
        noise: 8.0,
        spacing: [1.0, 1.0, 1.0],
    },
    Case {
        name: "anisotropic",
        shape: (24, 40, 40),
        radius: 9.0,
        inside: 100.0,
        outside: 20.0,
        noise: 10.0,
        spacing: [2.5, 0.8, 0.8],
    },
];
