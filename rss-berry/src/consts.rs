//! 通用常量.

/// 二值掩膜的体素值.
pub mod gray {
    /// 掩膜背景.
    pub const BACKGROUND: u8 = 0;

    /// 掩膜前景.
    pub const FOREGROUND: u8 = 1;

    /// 体素是否是前景?
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        p != BACKGROUND
    }

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        p == BACKGROUND
    }
}

/// 窄带层标记. 水平集内部为负, 外部为正.
pub mod layer {
    /// 零层.
    pub const ZERO: i8 = 0;

    /// 内侧第一层.
    pub const INSIDE_1: i8 = -1;

    /// 内侧第二层.
    pub const INSIDE_2: i8 = -2;

    /// 外侧第一层.
    pub const OUTSIDE_1: i8 = 1;

    /// 外侧第二层.
    pub const OUTSIDE_2: i8 = 2;

    /// 窄带以内的远端区域.
    pub const FAR_INSIDE: i8 = -3;

    /// 窄带以外的远端区域.
    pub const FAR_OUTSIDE: i8 = 3;

    /// 标记是否位于窄带 (五层之一) 内?
    #[inline]
    pub const fn is_band(l: i8) -> bool {
        INSIDE_2 <= l && l <= OUTSIDE_2
    }

    /// 标记对应的体素是否被视为分割内部 (零层计入内部)?
    #[inline]
    pub const fn is_inside(l: i8) -> bool {
        l <= ZERO
    }
}

/// 标签体的背景标签.
pub const LABEL_BACKGROUND: i16 = 0;

/// 每毫升对应的立方毫米数.
pub const MM3_PER_ML: f64 = 1000.0;

/// 窄带以外体素的水平集饱和值 (取绝对值).
pub const FAR_PHI: f64 = 3.0;

/// 单步演化中水平集的最大改变量 (CFL 条件).
pub const CFL: f64 = 0.45;

/// 学习统计量前种子掩膜的膨胀半径 (立方体).
pub const STAT_SAMPLE_RADIUS: usize = 1;

/// 稳健统计特征的个数: 中位数, 四分位距, 中位数绝对偏差.
pub const NUMBER_OF_FEATURE: usize = 3;

/// 学习得到的概率密度表的最少采样点个数.
pub const PDF_MIN_BINS: usize = 64;

/// 学习得到的概率密度表的最多采样点个数.
pub const PDF_MAX_BINS: usize = 4096;

/// 核带宽下限相对于强度动态范围的比例.
pub const BANDWIDTH_FLOOR_RATIO: f64 = 1e-3;

/// 核带宽的绝对下限.
pub const BANDWIDTH_FLOOR: f64 = 1e-6;
