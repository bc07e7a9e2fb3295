use super::field::LevelSetField;
use crate::Idx3d;

/// `pos` 处的平均曲率项 `κ|∇φ|`, 由中心差分计算 (体素间距视为 1).
///
/// 对内部为负的球面, 该值为正. 需要完整的 3×3×3 邻域;
/// 位于网格边界上的体素返回 0.
pub fn mean_curvature(field: &LevelSetField, (z, h, w): Idx3d) -> f64 {
    let (nz, nh, nw) = field.shape();
    if z == 0 || h == 0 || w == 0 || z + 1 >= nz || h + 1 >= nh || w + 1 >= nw {
        return 0.0;
    }
    let p = |dz: isize, dh: isize, dw: isize| {
        field.phi((
            z.wrapping_add_signed(dz),
            h.wrapping_add_signed(dh),
            w.wrapping_add_signed(dw),
        ))
    };
    let c = p(0, 0, 0);

    let dz = (p(1, 0, 0) - p(-1, 0, 0)) * 0.5;
    let dh = (p(0, 1, 0) - p(0, -1, 0)) * 0.5;
    let dw = (p(0, 0, 1) - p(0, 0, -1)) * 0.5;

    let dzz = p(1, 0, 0) - 2.0 * c + p(-1, 0, 0);
    let dhh = p(0, 1, 0) - 2.0 * c + p(0, -1, 0);
    let dww = p(0, 0, 1) - 2.0 * c + p(0, 0, -1);

    let dzh = (p(1, 1, 0) - p(1, -1, 0) - p(-1, 1, 0) + p(-1, -1, 0)) * 0.25;
    let dzw = (p(1, 0, 1) - p(1, 0, -1) - p(-1, 0, 1) + p(-1, 0, -1)) * 0.25;
    let dhw = (p(0, 1, 1) - p(0, 1, -1) - p(0, -1, 1) + p(0, -1, -1)) * 0.25;

    let (z2, h2, w2) = (dz * dz, dh * dh, dw * dw);
    let grad2 = z2 + h2 + w2;
    if grad2 <= f64::EPSILON {
        return 0.0;
    }

    let num = z2 * (dhh + dww) + h2 * (dzz + dww) + w2 * (dzz + dhh)
        - 2.0 * (dz * dh * dzh + dz * dw * dzw + dh * dw * dhw);
    num / grad2
}
