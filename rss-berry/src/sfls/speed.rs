use crate::{Idx3d, Mask, Pixel, Volume};

/// 数据项速度. 正值使曲面向外生长, 负值使其收缩.
///
/// 实现必须是纯函数: 同一体素多次查询得到相同结果, 以便并行计算.
pub trait SpeedFunction<T: Pixel>: Send + Sync {
    /// 在演化开始前从种子区域学习所需的统计量. 默认什么也不做.
    fn learn(&mut self, _volume: &Volume<T>, _seeds: &Mask) {}

    /// `pos` 处的速度.
    fn speed(&self, volume: &Volume<T>, pos: Idx3d) -> f64;

    /// 同 [`SpeedFunction::speed`], 可以复用调用方提供的临时缓冲 `buf`.
    /// 默认忽略缓冲.
    #[inline]
    fn speed_with(&self, volume: &Volume<T>, pos: Idx3d, _buf: &mut Vec<f64>) -> f64 {
        self.speed(volume, pos)
    }
}

/// 将闭包包装为 [`SpeedFunction`].
///
/// ```
/// use rss_berry::sfls::FnSpeed;
///
/// let grow_everywhere = FnSpeed(|_: &rss_berry::Volume<u8>, _: rss_berry::Idx3d| 1.0);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct FnSpeed<F>(pub F);

impl<T, F> SpeedFunction<T> for FnSpeed<F>
where
    T: Pixel,
    F: Fn(&Volume<T>, Idx3d) -> f64 + Send + Sync,
{
    #[inline]
    fn speed(&self, volume: &Volume<T>, pos: Idx3d) -> f64 {
        (self.0)(volume, pos)
    }
}
