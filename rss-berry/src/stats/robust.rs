//! 稳健统计量.
//!
//! 所有函数对空输入返回 `0.0` 而不是 NaN, 由调用方将其视为退化情形.

use ordered_float::OrderedFloat;

/// 升序排序. NaN 排在最后.
#[inline]
pub fn sort(v: &mut [f64]) {
    v.sort_unstable_by_key(|&x| OrderedFloat(x));
}

/// 已排序数组的 `p` 分位数 (线性插值). `p` 必须在 \[0, 1\] 内.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    debug_assert!((0.0..=1.0).contains(&p));
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let r = p * (n - 1) as f64;
            let (lo, frac) = (r.floor() as usize, r.fract());
            if lo + 1 >= n {
                sorted[n - 1]
            } else {
                sorted[lo] + (sorted[lo + 1] - sorted[lo]) * frac
            }
        }
    }
}

/// 中位数. 会重排 `v`.
#[inline]
pub fn median(v: &mut [f64]) -> f64 {
    sort(v);
    quantile_sorted(v, 0.5)
}

/// 四分位距 (Q3 - Q1). 会重排 `v`.
#[inline]
pub fn iqr(v: &mut [f64]) -> f64 {
    sort(v);
    quantile_sorted(v, 0.75) - quantile_sorted(v, 0.25)
}

/// 中位数绝对偏差. 会重排 `v`.
pub fn mad(v: &mut [f64]) -> f64 {
    let med = median(v);
    let mut dev: Vec<f64> = v.iter().map(|x| (x - med).abs()).collect();
    median(&mut dev)
}

/// 算术平均值.
pub fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        0.0
    } else {
        v.iter().sum::<f64>() / v.len() as f64
    }
}

/// 总体标准差.
pub fn std_dev(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let m = mean(v);
    (v.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / v.len() as f64).sqrt()
}

/// 一组样本的三个稳健统计量.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RobustStat {
    /// 中位数.
    pub median: f64,

    /// 四分位距.
    pub iqr: f64,

    /// 中位数绝对偏差.
    pub mad: f64,
}

impl RobustStat {
    /// 一次排序后同时计算三个统计量. 会重排 `v`.
    pub fn from_samples(v: &mut [f64]) -> Self {
        sort(v);
        let median = quantile_sorted(v, 0.5);
        let iqr = quantile_sorted(v, 0.75) - quantile_sorted(v, 0.25);
        let mut dev: Vec<f64> = v.iter().map(|x| (x - median).abs()).collect();
        sort(&mut dev);
        Self {
            median,
            iqr,
            mad: quantile_sorted(&dev, 0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn test_median() {
        assert!(f64_eq(median(&mut [3.0, 1.0, 2.0]), 2.0));
        assert!(f64_eq(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5));
        assert!(f64_eq(median(&mut []), 0.0));
    }

    #[test]
    fn test_iqr_mad() {
        // 1..=9: Q1 = 3, Q3 = 7.
        let mut v: Vec<f64> = (1..=9).map(f64::from).collect();
        assert!(f64_eq(iqr(&mut v), 4.0));
        // |x - 5| = 4,3,2,1,0,1,2,3,4 -> 中位数 2.
        assert!(f64_eq(mad(&mut v), 2.0));
    }

    #[test]
    fn test_outlier_resistance() {
        let mut v = vec![10.0, 10.0, 11.0, 9.0, 10.0, 1e6];
        let s = RobustStat::from_samples(&mut v);
        assert!(f64_eq(s.median, 10.0));
        assert!(s.iqr < 2.0);
        assert!(s.mad <= 1.0);
        assert!(std_dev(&v) > 1e5);
    }

    #[test]
    fn test_uniform_is_degenerate() {
        let mut v = vec![7.0; 27];
        let s = RobustStat::from_samples(&mut v);
        assert_eq!(s, RobustStat { median: 7.0, iqr: 0.0, mad: 0.0 });
        assert_eq!(std_dev(&v), 0.0);
    }
}
