use std::ops::{Index, IndexMut};

use itertools::iproduct;
use ndarray::{Array3, ArrayView3, Zip};

use super::{diamond_neighbours, standard, Geometry, GridAttr};
use crate::consts::gray::*;
use crate::Idx3d;

/// 3D 二值掩膜. 体素值仅为 [`BACKGROUND`] 或 [`FOREGROUND`].
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    geometry: Geometry,
    data: Array3<u8>,
}

impl GridAttr for Mask {
    #[inline]
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for Mask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for Mask {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl Mask {
    /// 直接创建掩膜. 所有非零值都会被规整为 [`FOREGROUND`].
    pub fn new(mut data: Array3<u8>, geometry: Geometry) -> Self {
        data.mapv_inplace(|p| if is_background(p) { BACKGROUND } else { FOREGROUND });
        Self {
            geometry,
            data: standard(data),
        }
    }

    /// 创建全背景掩膜.
    #[inline]
    pub fn zeros(shape: Idx3d, geometry: Geometry) -> Self {
        Self {
            geometry,
            data: Array3::from_elem(shape, BACKGROUND),
        }
    }

    /// 创建只有 `it` 给出的索引为前景的掩膜. 如果存在越界索引, 则程序 panic.
    pub fn from_positions<I: IntoIterator<Item = Idx3d>>(
        shape: Idx3d,
        geometry: Geometry,
        it: I,
    ) -> Self {
        let mut m = Self::zeros(shape, geometry);
        it.into_iter().for_each(|p| m[p] = FOREGROUND);
        m
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 体素是否是前景? 越界时返回 `false`.
    #[inline]
    pub fn is_foreground(&self, pos: Idx3d) -> bool {
        self.data.get(pos).is_some_and(|&p| is_foreground(p))
    }

    /// 前景体素个数.
    #[inline]
    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 收集所有前景体素的下标. 结果按行优先存储.
    pub fn foreground_pos(&self) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, &p)| is_foreground(p).then_some(pos))
            .collect()
    }

    /// 前景体素是否位于表面, 即 6-邻域 (网格内) 存在背景体素?
    ///
    /// 背景体素总是返回 `false`. 网格外不视为背景.
    pub fn is_surface(&self, pos: Idx3d) -> bool {
        self.is_foreground(pos)
            && diamond_neighbours(pos, self.shape()).any(|q| is_background(self.data[q]))
    }

    /// 以边长 `2 * radius + 1` 的立方体结构元进行膨胀. 超出网格的部分被裁剪.
    pub fn dilate_cube(&self, radius: usize) -> Mask {
        if radius == 0 {
            return self.clone();
        }
        let (z, h, w) = self.shape();
        let mut out = self.clone();
        for (cz, ch, cw) in self.foreground_pos() {
            for pos in iproduct!(
                cz.saturating_sub(radius)..(cz + radius + 1).min(z),
                ch.saturating_sub(radius)..(ch + radius + 1).min(h),
                cw.saturating_sub(radius)..(cw + radius + 1).min(w)
            ) {
                out.data[pos] = FOREGROUND;
            }
        }
        out
    }

    /// 计算与 `other` 的 Dice 重叠系数. 两者均为空时定义为 1.
    ///
    /// 如果两者形状不同, 则程序 panic.
    pub fn dice(&self, other: &Mask) -> f64 {
        assert_eq!(self.shape(), other.shape(), "掩膜形状不一致");
        let (mut both, mut total) = (0usize, 0usize);
        Zip::from(&self.data).and(&other.data).for_each(|&a, &b| {
            let (a, b) = (is_foreground(a), is_foreground(b));
            both += (a && b) as usize;
            total += a as usize + b as usize;
        });
        if total == 0 {
            1.0
        } else {
            2.0 * both as f64 / total as f64
        }
    }
}
