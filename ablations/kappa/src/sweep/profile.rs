//! 算法运行统计.

use rss_berry::profile::{AccTimer, Report};
use rss_berry::sfls::Termination;
use std::time::Duration;

const TERMINATIONS: [Termination; 4] = [
    Termination::MaxVolumeReached,
    Termination::MaxIterationsReached,
    Termination::MaxRunningTimeReached,
    Termination::Stalled,
];

/// 单个曲率权重的数据统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 完成分割的病例个数.
    runs: u64,

    /// Dice 系数之和.
    dice_sum: f64,

    /// 最低的 Dice 系数.
    worst: Option<f64>,

    /// 迭代次数之和.
    iterations: u64,

    /// 处理病例花费的总时间 (包括统计量学习).
    time: AccTimer,

    /// 最耗时的一次任务所消耗的时间.
    most: Duration,

    /// 各终止原因出现的次数, 顺序同 `TERMINATIONS`.
    terminations: [u64; 4],
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            runs: 0,
            dice_sum: 0.0,
            worst: None,
            iterations: 0,
            time: AccTimer::default(),
            most: Duration::MAX,
            terminations: [0; 4],
        }
    }

    /// 开始一次新的病例计时.
    #[inline]
    pub fn start(&mut self) {
        self.time.start();
    }

    /// 结束病例计时, 并记录一次分割结果.
    pub fn record(&mut self, report: &Report, dice: f64) {
        let d = self.time.elapsed();
        self.most = match self.most {
            Duration::MAX => d,
            once_duration => std::cmp::max(d, once_duration),
        };
        self.runs += 1;
        self.dice_sum += dice;
        self.worst = Some(self.worst.map_or(dice, |w| w.min(dice)));
        self.iterations += report.iterations as u64;
        if let Some(i) = TERMINATIONS.iter().position(|&t| t == report.termination) {
            self.terminations[i] += 1;
        }
    }

    /// 获得完成分割的病例个数.
    #[inline]
    pub fn get_runs(&self) -> u64 {
        self.runs
    }

    /// 获得平均 Dice 系数.
    #[inline]
    pub fn get_avg_dice(&self) -> Option<f64> {
        match self.runs {
            0 => None,
            runs => Some(self.dice_sum / runs as f64),
        }
    }

    /// 获得最低 Dice 系数.
    #[inline]
    pub fn get_worst_dice(&self) -> Option<f64> {
        self.worst
    }

    /// 获得平均迭代次数.
    #[inline]
    pub fn get_avg_iterations(&self) -> Option<f64> {
        match self.runs {
            0 => None,
            runs => Some(self.iterations as f64 / runs as f64),
        }
    }

    /// 以微秒为单位获得处理病例的总时间.
    #[inline]
    pub fn get_total_time_us(&self) -> u64 {
        self.time.total_us()
    }

    /// 获取最耗时的一次任务所消耗的时间.
    ///
    /// 如果不存在任务, 则返回 `None`.
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        match self.most {
            Duration::MAX => None,
            d => Some(d),
        }
    }

    /// 各终止原因及其出现次数.
    pub fn terminations(&self) -> impl Iterator<Item = (Termination, u64)> + '_ {
        TERMINATIONS.into_iter().zip(self.terminations.iter().copied())
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
