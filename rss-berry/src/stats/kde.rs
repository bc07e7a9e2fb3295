use crate::consts::{PDF_MAX_BINS, PDF_MIN_BINS};

/// 核密度估计截断半径 (以带宽为单位).
const KERNEL_RADIUS: f64 = 4.0;

/// 从样本学习得到的一维概率密度 (高斯核密度估计), 以查找表形式存储.
///
/// 表覆盖 `[min - 3bw, max + 3bw]`, 归一化使峰值为 1, 因此 [`LearnedPdf::eval`]
/// 的值域是 \[0, 1\]. 范围外取 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LearnedPdf {
    lo: f64,
    step: f64,
    bandwidth: f64,
    table: Vec<f64>,
}

impl LearnedPdf {
    /// 以带宽 `bandwidth` 从 `samples` 学习. 非有限样本被忽略, 无有效样本时得到处处为 0 的密度.
    ///
    /// 样本先被分箱为直方图, 再与截断高斯核卷积.
    ///
    /// # Panics
    ///
    /// 若 `bandwidth` 不是正的有限数.
    pub fn learn(samples: &[f64], bandwidth: f64) -> Self {
        assert!(bandwidth.is_finite() && bandwidth > 0.0);
        let (min, max) = samples
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            return Self {
                bandwidth,
                ..Default::default()
            };
        }

        let lo = min - 3.0 * bandwidth;
        let hi = max + 3.0 * bandwidth;
        // 每个带宽至少 4 个采样点, 受上下限约束.
        let bins = (((hi - lo) / bandwidth * 4.0).ceil() as usize + 1).clamp(PDF_MIN_BINS, PDF_MAX_BINS);
        let step = (hi - lo) / (bins - 1) as f64;

        let mut hist = vec![0.0; bins];
        for &s in samples.iter().filter(|v| v.is_finite()) {
            let k = ((s - lo) / step).round() as usize;
            hist[k.min(bins - 1)] += 1.0;
        }

        let radius = (KERNEL_RADIUS * bandwidth / step).ceil() as usize;
        let kernel: Vec<f64> = (0..=radius)
            .map(|d| {
                let x = d as f64 * step / bandwidth;
                (-0.5 * x * x).exp()
            })
            .collect();

        let mut table: Vec<f64> = (0..bins)
            .map(|k| {
                (k.saturating_sub(radius)..(k + radius + 1).min(bins))
                    .filter(|&j| hist[j] > 0.0)
                    .map(|j| hist[j] * kernel[k.abs_diff(j)])
                    .sum()
            })
            .collect();
        let peak = table.iter().copied().fold(0.0, f64::max);
        if peak > 0.0 {
            table.iter_mut().for_each(|v| *v /= peak);
        }

        Self {
            lo,
            step,
            bandwidth,
            table,
        }
    }

    /// 在 `x` 处的密度 (线性插值).
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.table.len();
        if n < 2 || !x.is_finite() {
            return 0.0;
        }
        let r = (x - self.lo) / self.step;
        if r < 0.0 || r > (n - 1) as f64 {
            return 0.0;
        }
        let k = (r.floor() as usize).min(n - 2);
        let frac = r - k as f64;
        self.table[k] * (1.0 - frac) + self.table[k + 1] * frac
    }

    /// 学习时使用的带宽.
    #[inline]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// 是否没有从任何样本学习过.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// 密度表的支撑区间.
    pub fn support(&self) -> Option<(f64, f64)> {
        match self.table.len() {
            0 => None,
            n => Some((self.lo, self.lo + self.step * (n - 1) as f64)),
        }
    }
}
