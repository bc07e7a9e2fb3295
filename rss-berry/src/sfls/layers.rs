use std::collections::{HashMap, HashSet};

use ndarray::{s, Array3, ArrayView3, Zip};

use super::field::LevelSetField;
use crate::consts::layer::{self, FAR_INSIDE, FAR_OUTSIDE};
use crate::consts::gray::is_foreground;
use crate::consts::FAR_PHI;
use crate::data::diamond_neighbours;
use crate::{GridAttr, Idx3d, Mask};

/// 窄带中的五层.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    /// 零层 `lz`, 最接近分割边界.
    Zero,

    /// 内侧第一层 `ln1`.
    Inside1,

    /// 内侧第二层 `ln2`.
    Inside2,

    /// 外侧第一层 `lp1`.
    Outside1,

    /// 外侧第二层 `lp2`.
    Outside2,
}

impl Layer {
    /// 全部五层.
    pub const ALL: [Layer; 5] = [
        Layer::Zero,
        Layer::Inside1,
        Layer::Inside2,
        Layer::Outside1,
        Layer::Outside2,
    ];

    /// 层在标记体中的值.
    #[inline]
    pub const fn label(self) -> i8 {
        match self {
            Layer::Zero => layer::ZERO,
            Layer::Inside1 => layer::INSIDE_1,
            Layer::Inside2 => layer::INSIDE_2,
            Layer::Outside1 => layer::OUTSIDE_1,
            Layer::Outside2 => layer::OUTSIDE_2,
        }
    }

    /// 由标记值得到层. 远端区域返回 `None`.
    #[inline]
    pub const fn from_label(label: i8) -> Option<Self> {
        match label {
            layer::ZERO => Some(Layer::Zero),
            layer::INSIDE_1 => Some(Layer::Inside1),
            layer::INSIDE_2 => Some(Layer::Inside2),
            layer::OUTSIDE_1 => Some(Layer::Outside1),
            layer::OUTSIDE_2 => Some(Layer::Outside2),
            _ => None,
        }
    }

    /// 朝零层方向相邻的一层的标记值. 零层本身返回 `None`.
    #[inline]
    pub const fn closer_label(self) -> Option<i8> {
        match self {
            Layer::Zero => None,
            Layer::Inside1 | Layer::Outside1 => Some(layer::ZERO),
            Layer::Inside2 => Some(layer::INSIDE_1),
            Layer::Outside2 => Some(layer::OUTSIDE_1),
        }
    }

    /// 本层一侧的符号: 内侧为 -1, 外侧和零层为 1.
    #[inline]
    fn sign(self) -> f64 {
        if self.label() < 0 {
            -1.0
        } else {
            1.0
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            Layer::Zero => 0,
            Layer::Inside1 => 1,
            Layer::Inside2 => 2,
            Layer::Outside1 => 3,
            Layer::Outside2 => 4,
        }
    }
}

/// 五层窄带.
///
/// 每层是一个保持插入顺序的体素列表 (演化顺序, 不按空间排序).
/// 同时维护一个覆盖整个网格的标记体: 窄带体素标记为所在层的值,
/// 其余体素标记为 [`FAR_INSIDE`] 或 [`FAR_OUTSIDE`].
#[derive(Clone, Debug)]
pub struct NarrowBand {
    label: Array3<i8>,
    layers: [Vec<Idx3d>; 5],
    inside: usize,
}

impl NarrowBand {
    /// 形状为 `shape` 的空窄带, 全部体素位于外部远端.
    pub fn empty(shape: Idx3d) -> Self {
        Self {
            label: Array3::from_elem(shape, FAR_OUTSIDE),
            layers: Default::default(),
            inside: 0,
        }
    }

    /// 由种子掩膜构建窄带.
    ///
    /// 与背景 6-邻接的前景体素构成零层; 由零层向内 (向外) 逐层扩展得到
    /// `ln1`, `ln2` (`lp1`, `lp2`). 网格边界不视为背景.
    pub fn from_mask(mask: &Mask) -> Self {
        let shape = mask.shape();
        let mut label = Array3::from_elem(shape, FAR_OUTSIDE);
        Zip::from(&mut label).and(&mask.data()).for_each(|l, &m| {
            if is_foreground(m) {
                *l = FAR_INSIDE;
            }
        });

        let mut band = Self {
            label,
            layers: Default::default(),
            inside: mask.count_foreground(),
        };
        for pos in mask.foreground_pos() {
            if mask.is_surface(pos) {
                band.push(Layer::Zero, pos);
            }
        }
        band.grow_from(Layer::Zero, Layer::Inside1, FAR_INSIDE);
        band.grow_from(Layer::Zero, Layer::Outside1, FAR_OUTSIDE);
        band.grow_from(Layer::Inside1, Layer::Inside2, FAR_INSIDE);
        band.grow_from(Layer::Outside1, Layer::Outside2, FAR_OUTSIDE);
        band
    }

    /// 将 `from` 层中每个体素的, 标记为 `far` 的邻居加入 `to` 层.
    fn grow_from(&mut self, from: Layer, to: Layer, far: i8) {
        let shape = self.shape();
        for i in 0..self.layers[from.index()].len() {
            let pos = self.layers[from.index()][i];
            for nb in diamond_neighbours(pos, shape) {
                if self.label[nb] == far {
                    self.push(to, nb);
                }
            }
        }
    }

    /// 追加体素到 `layer` 并更新标记. 不检查重复.
    #[inline]
    fn push(&mut self, layer: Layer, pos: Idx3d) {
        self.relabel(pos, layer.label());
        self.layers[layer.index()].push(pos);
    }

    /// 修改标记, 同时维护内部体素计数.
    #[inline]
    fn relabel(&mut self, pos: Idx3d, new: i8) {
        let old = std::mem::replace(&mut self.label[pos], new);
        match (layer::is_inside(old), layer::is_inside(new)) {
            (false, true) => self.inside += 1,
            (true, false) => self.inside -= 1,
            _ => {}
        }
    }

    /// 网格形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.label.dim()
    }

    /// `layer` 层的体素, 按演化顺序排列.
    #[inline]
    pub fn layer(&self, layer: Layer) -> &[Idx3d] {
        &self.layers[layer.index()]
    }

    /// `pos` 处的标记值.
    #[inline]
    pub fn label_at(&self, pos: Idx3d) -> i8 {
        self.label[pos]
    }

    /// `pos` 所在的层. 不在窄带内时返回 `None`.
    #[inline]
    pub fn layer_of(&self, pos: Idx3d) -> Option<Layer> {
        Layer::from_label(self.label[pos])
    }

    /// 标记体的 shallow copy.
    #[inline]
    pub fn labels(&self) -> ArrayView3<'_, i8> {
        self.label.view()
    }

    /// 窄带体素总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// 窄带是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Vec::is_empty)
    }

    /// 被视为分割内部 (标记 `<= 0`) 的体素个数.
    #[inline]
    pub fn inside_count(&self) -> usize {
        self.inside
    }

    /// 检查窄带的划分性质: 每个体素至多出现在一层中一次,
    /// 且标记体与所在层一致.
    pub fn check_partition(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.len());
        Layer::ALL.iter().all(|&l| {
            self.layer(l)
                .iter()
                .all(|&p| self.label[p] == l.label() && seen.insert(p))
        })
    }

    /// 检查距离等级: 任意两个 6-相邻体素的标记至多相差 1 (远端视为 ±3).
    ///
    /// 即零层只与 ±1 层相邻, 内外两侧不会越过零层直接接触.
    pub fn check_distance_classes(&self) -> bool {
        let l = &self.label;
        let close = |a: &i8, b: &i8| (a - b).abs() <= 1;
        Zip::from(l.slice(s![1.., .., ..]))
            .and(l.slice(s![..-1, .., ..]))
            .all(close)
            && Zip::from(l.slice(s![.., 1.., ..]))
                .and(l.slice(s![.., ..-1, ..]))
                .all(close)
            && Zip::from(l.slice(s![.., .., 1..]))
                .and(l.slice(s![.., .., ..-1]))
                .all(close)
    }

    /// 按零层力 `forces` (顺序与零层一致, 正值生长) 和时间步长 `dt`
    /// 推进一步, 同时更新 `field` 和各层成员.
    ///
    /// 只有零层按 `phi` 的值迁移: 越过 ±0.5 的体素离开零层,
    /// 其内侧 (外侧) 第一层邻居随即进入零层, 并逐层向远端补齐.
    /// 其余各层的成员由与零层的距离决定, 值由更靠近零层的一层推出.
    pub(crate) fn advance(&mut self, field: &mut LevelSetField, forces: &[f64], dt: f64) {
        assert_eq!(forces.len(), self.layer(Layer::Zero).len());
        let shape = self.shape();
        let lz = std::mem::take(&mut self.layers[Layer::Zero.index()]);
        let updated: Vec<f64> = lz
            .iter()
            .zip(forces)
            .map(|(&pos, &f)| field.phi(pos) - dt * f)
            .collect();

        // 越过零层边界的体素, 值为是否向外.
        let crossing: HashMap<Idx3d, bool> = lz
            .iter()
            .zip(&updated)
            .filter_map(|(&pos, &phi)| outward(phi).map(|out| (pos, out)))
            .collect();

        let (mut up, mut down) = (Vec::new(), Vec::new());
        for (pos, phi) in lz.into_iter().zip(updated) {
            match outward(phi) {
                // 与反向穿越的零层体素相邻时保持原值, 两侧第一层不能直接接触.
                Some(out) if diamond_neighbours(pos, shape).any(|nb| crossing.get(&nb) == Some(&!out)) => {
                    self.layers[Layer::Zero.index()].push(pos);
                }
                Some(out) => {
                    field.set(pos, phi);
                    if out {
                        up.push(pos);
                    } else {
                        down.push(pos);
                    }
                }
                None => {
                    field.set(pos, phi);
                    self.layers[Layer::Zero.index()].push(pos);
                }
            }
        }
        for &pos in &up {
            self.push(Layer::Outside1, pos);
        }
        for &pos in &down {
            self.push(Layer::Inside1, pos);
        }

        self.cascade(field, &up, Layer::Inside1, Layer::Inside2, FAR_INSIDE);
        self.cascade(field, &down, Layer::Outside1, Layer::Outside2, FAR_OUTSIDE);
        self.propagate(field);
    }

    /// 零层体素 `movers` 离开零层后, 其 `first` 层邻居进入零层,
    /// 值取 `phi(mover) ∓ 1` 中最靠近零的一个. 随后 `second` 层与
    /// 远端 `far` 中相应的邻居各向零层靠近一层.
    fn cascade(&mut self, field: &mut LevelSetField, movers: &[Idx3d], first: Layer, second: Layer, far: i8) {
        let shape = self.shape();
        let sign = first.sign();
        let mut entered = Vec::new();
        let mut values: HashMap<Idx3d, f64> = HashMap::new();
        for &pos in movers {
            let value = field.phi(pos) + sign;
            for nb in diamond_neighbours(pos, shape) {
                if self.label[nb] != first.label() {
                    continue;
                }
                values
                    .entry(nb)
                    .and_modify(|v| *v = if sign < 0.0 { v.max(value) } else { v.min(value) })
                    .or_insert_with(|| {
                        entered.push(nb);
                        value
                    });
            }
        }
        for &pos in &entered {
            self.push(Layer::Zero, pos);
            field.set(pos, values[&pos]);
        }

        let mut ring = entered;
        for (from, to) in [(second.label(), first), (far, second)] {
            let mut next = Vec::new();
            for &pos in &ring {
                for nb in diamond_neighbours(pos, shape) {
                    if self.label[nb] == from {
                        self.push(to, nb);
                        next.push(nb);
                    }
                }
            }
            ring = next;
        }
    }

    /// 由零层向外逐层重算 `phi`. 失去更靠近零层的邻居的体素降入下一层,
    /// 第二层则降入远端.
    fn propagate(&mut self, field: &mut LevelSetField) {
        for (l, demoted) in [
            (Layer::Inside1, Some(Layer::Inside2)),
            (Layer::Outside1, Some(Layer::Outside2)),
            (Layer::Inside2, None),
            (Layer::Outside2, None),
        ] {
            let list = std::mem::take(&mut self.layers[l.index()]);
            for pos in list {
                // 本步中已迁出.
                if self.label[pos] != l.label() {
                    continue;
                }
                match (field.closest_neighbour_phi(self, pos, l), demoted) {
                    (Some(m), _) => {
                        field.set(pos, m + l.sign());
                        self.layers[l.index()].push(pos);
                    }
                    (None, Some(d)) => self.push(d, pos),
                    (None, None) => {
                        let far = if l.sign() < 0.0 { FAR_INSIDE } else { FAR_OUTSIDE };
                        self.relabel(pos, far);
                        field.set(pos, l.sign() * FAR_PHI);
                    }
                }
            }
        }
    }
}

/// 零层体素的新值是否越过零层边界: 向外为 `Some(true)`, 向内为 `Some(false)`.
#[inline]
fn outward(phi: f64) -> Option<bool> {
    if phi > 0.5 {
        Some(true)
    } else if phi < -0.5 {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{Layer, NarrowBand};
    use crate::phantom;
    use crate::sfls::{mean_curvature, LevelSetField};
    use crate::{Geometry, Idx3d, Mask};

    fn cube_band() -> (Mask, NarrowBand) {
        let m = phantom::cube((12, 12, 12), (4, 4, 4), 4, Geometry::default());
        let b = NarrowBand::from_mask(&m);
        (m, b)
    }

    #[test]
    fn test_from_mask_layers() {
        let (m, b) = cube_band();
        assert_eq!(m.count_foreground(), 64);
        // 4^3 - 2^3 个表面体素.
        assert_eq!(b.layer(Layer::Zero).len(), 56);
        assert_eq!(b.layer(Layer::Inside1).len(), 8);
        assert_eq!(b.layer(Layer::Inside2).len(), 0);
        // 6 * 16 个面邻居.
        assert_eq!(b.layer(Layer::Outside1).len(), 96);
        assert_eq!(b.inside_count(), 64);
        assert!(b.check_partition());
        assert!(b.check_distance_classes());
        assert_eq!(b.layer_of((0, 0, 0)), None);
        assert_eq!(b.layer_of((4, 4, 4)), Some(Layer::Zero));
        assert_eq!(b.layer_of((5, 5, 5)), Some(Layer::Inside1));
        assert_eq!(b.layer_of((3, 4, 4)), Some(Layer::Outside1));
        assert_eq!(b.layer_of((2, 4, 4)), Some(Layer::Outside2));
    }

    #[test]
    fn test_empty() {
        let b = NarrowBand::from_mask(&Mask::zeros((4, 4, 4), Geometry::default()));
        assert!(b.is_empty());
        assert_eq!(b.len(), 0);
        assert_eq!(b.inside_count(), 0);
        assert!(b.check_partition());
    }

    #[test]
    fn test_check_partition_detects_duplicate() {
        let (_, mut b) = cube_band();
        let p = b.layer(Layer::Zero)[0];
        b.layers[Layer::Inside1.index()].push(p);
        assert!(!b.check_partition());
    }

    #[test]
    fn test_check_distance_classes_detects_gap() {
        let (_, mut b) = cube_band();
        // 外侧第二层紧贴零层.
        b.label[(3, 4, 4)] = 2;
        assert!(!b.check_distance_classes());
    }

    #[test]
    fn test_advance_grow_shrink() {
        let (_, mut b) = cube_band();
        let mut f = LevelSetField::from_band(&b);

        // 最大位移 0.45 < 0.5, 零层不动, 第一层不动.
        let forces = vec![1.0; b.layer(Layer::Zero).len()];
        b.advance(&mut f, &forces, 0.45);
        assert_eq!(b.inside_count(), 64);
        assert!(b.check_partition());

        // 继续生长, 零层穿过 -0.5, 外侧第一层进入零层.
        let forces = vec![1.0; b.layer(Layer::Zero).len()];
        b.advance(&mut f, &forces, 0.45);
        assert!(b.inside_count() > 64);
        assert!(b.check_partition());
        assert!(b.check_distance_classes());
        assert_eq!(b.layer_of((3, 4, 4)), Some(Layer::Zero));
        assert_eq!(b.layer_of((4, 4, 4)), Some(Layer::Inside1));

        // 收缩.
        for _ in 0..20 {
            let forces = vec![-1.0; b.layer(Layer::Zero).len()];
            b.advance(&mut f, &forces, 0.45);
            assert!(b.check_partition());
            assert!(b.check_distance_classes());
        }
        assert_eq!(b.inside_count(), 0);
    }

    /// 由坐标散列得到的 \[-1, 1\] 内的力.
    fn hashed(&(z, h, w): &Idx3d) -> f64 {
        let x = (z.wrapping_mul(73_856_093)) ^ (h.wrapping_mul(19_349_663)) ^ (w.wrapping_mul(83_492_791));
        (x % 2001) as f64 / 1000.0 - 1.0
    }

    #[test]
    fn test_mixed_forces_keep_distance_classes() {
        let m = phantom::sphere((24, 24, 24), 6.0, Geometry::default());
        let mut b = NarrowBand::from_mask(&m);
        let mut f = LevelSetField::from_band(&b);
        assert!(b.check_distance_classes());

        for i in 0..200 {
            let forces: Vec<f64> = b
                .layer(Layer::Zero)
                .iter()
                .map(|p| hashed(p) - 0.5 / 1.5 * mean_curvature(&f, *p))
                .collect();
            let max = forces.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
            if max == 0.0 {
                break;
            }
            b.advance(&mut f, &forces, 0.45 / max);
            assert!(b.check_partition(), "iteration {i}");
            assert!(b.check_distance_classes(), "iteration {i}");
            assert!(b.layer(Layer::Zero).iter().all(|&p| f.phi(p).abs() <= 0.5));
            for l in [Layer::Inside1, Layer::Inside2] {
                assert!(b.layer(l).iter().all(|&p| f.phi(p) < 0.0));
            }
            for l in [Layer::Outside1, Layer::Outside2] {
                assert!(b.layer(l).iter().all(|&p| f.phi(p) > 0.0));
            }
        }
        assert!(!b.layer(Layer::Zero).is_empty());
    }
}
