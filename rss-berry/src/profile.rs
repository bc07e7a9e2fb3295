//! 运行统计.

use std::fmt;
use std::time::{Duration, Instant};

use crate::sfls::Termination;

/// 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
pub struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时 (`self.start()`).
    /// 如果用户不希望这种行为, 可以在真正需要时重新调用 `self.start()` 覆盖之.
    #[inline]
    pub fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时. 可以通过反复调用来重置, 或者通过之后的 `self.elapsed()`
    /// 方法来统计该部分时间.
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()` (或 `Self::new()`), 否则计算时间值无意义.
    #[inline]
    pub fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 已累计时间加上本轮尚未结束的计时, 不修改计时器.
    #[inline]
    pub fn peek(&self) -> Duration {
        self.consumed + self.since.elapsed()
    }

    /// 总共累计下来的时间.
    #[inline]
    pub fn total(&self) -> Duration {
        self.consumed
    }

    /// 获得总共累计下来的时间综合 (以微秒为单位).
    #[inline]
    pub fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

impl Default for AccTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// 一次分割运行的结果摘要.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// 自准备完成以来执行的演化步数.
    pub iterations: usize,

    /// 终止原因.
    pub termination: Termination,

    /// `run` 所花费的自然时间.
    pub elapsed: Duration,

    /// 终止时的内部体素个数.
    pub inside_voxels: usize,

    /// 终止时的分割体积 (毫升).
    pub volume_ml: f64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} after {} iterations in {:.3}s: {} voxels, {:.3} mL",
            self.termination,
            self.iterations,
            self.elapsed.as_secs_f64(),
            self.inside_voxels,
            self.volume_ml,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{AccTimer, Report};
    use crate::sfls::Termination;

    #[test]
    fn test_acc_timer() {
        let mut t = AccTimer::new();
        std::thread::sleep(Duration::from_millis(2));
        let d = t.elapsed();
        assert!(d >= Duration::from_millis(2));
        assert_eq!(t.total(), d);
        assert!(t.peek() >= d);

        t.start();
        let d2 = t.elapsed();
        assert_eq!(t.total(), d + d2);
        assert!(t.total_us() >= 2000);
    }

    #[test]
    fn test_report_display() {
        let r = Report {
            iterations: 3,
            termination: Termination::Stalled,
            elapsed: Duration::from_millis(1500),
            inside_voxels: 27,
            volume_ml: 0.027,
        };
        assert_eq!(r.to_string(), "Stalled after 3 iterations in 1.500s: 27 voxels, 0.027 mL");
    }
}
