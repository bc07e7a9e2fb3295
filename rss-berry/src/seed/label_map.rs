//! 多标签标签体到单标签种子的预处理.

use log::warn;

use crate::consts::LABEL_BACKGROUND;
use crate::error::{SeedError, SeedResult};
use crate::{GridAttr, LabelVolume};

/// 标签体相对于期望标签所属的情形.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LabelMapCase {
    /// 除背景外恰好只有一个标签. 标签体原样使用.
    SingleLabel,

    /// 存在多个非零标签, 但期望标签不在其中. 标签体原样使用,
    /// 即所有非零体素都被视为前景.
    DesiredAbsent,

    /// 存在多个非零标签且包含期望标签. 只保留期望标签作为前景.
    Extract,
}

/// 检查标签体 `label` 相对于期望标签 `desired` 的情形.
///
/// 如果背景 0 不是出现过的最小标签 (包括标签体中完全没有背景的情况),
/// 返回 [`SeedError::BackgroundNotMinimum`].
///
/// 全背景的标签体被视为 [`LabelMapCase::DesiredAbsent`], 得到空种子.
/// `desired` 不能是背景标签, 否则程序 panic.
pub fn inspect_label_map(label: &LabelVolume, desired: i16) -> SeedResult<LabelMapCase> {
    assert_ne!(desired, LABEL_BACKGROUND, "期望标签不能是背景");
    let labels = label.distinct_labels();
    match labels.first() {
        Some(&LABEL_BACKGROUND) => {}
        Some(&min) => return Err(SeedError::BackgroundNotMinimum(min)),
        None => return Ok(LabelMapCase::DesiredAbsent),
    }

    if labels.len() == 2 {
        return Ok(LabelMapCase::SingleLabel);
    }
    if labels.len() > 3 {
        // 三个及以上非零标签时的意图不明确, 仅按期望标签处理.
        warn!(
            "Label map carries {} distinct non-zero labels, extracting by label {desired}",
            labels.len() - 1
        );
    }
    if labels.binary_search(&desired).is_err() {
        warn!("Desired label {desired} is absent, every non-zero voxel is taken as foreground");
        return Ok(LabelMapCase::DesiredAbsent);
    }
    Ok(LabelMapCase::Extract)
}

/// 将可能含有多个标签的标签体处理为单标签种子标签体.
///
/// 1. 除背景外只有一个标签时, 原样返回;
/// 2. 期望标签 `desired` 不存在时, 原样返回 (所有非零体素都是前景);
/// 3. 否则返回新标签体, 其中值为 `desired` 的体素为 1, 其余为 0.
///
/// 输出与输入几何信息一致. 背景 0 不是最小标签时返回 `Err`.
pub fn preprocess_label_map(label: &LabelVolume, desired: i16) -> SeedResult<LabelVolume> {
    Ok(match inspect_label_map(label, desired)? {
        LabelMapCase::SingleLabel | LabelMapCase::DesiredAbsent => label.clone(),
        LabelMapCase::Extract => {
            let data = label
                .data()
                .mapv(|p| if p == desired { 1 } else { LABEL_BACKGROUND });
            LabelVolume::new(data, *label.geometry())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{inspect_label_map, preprocess_label_map, LabelMapCase};
    use crate::error::SeedError;
    use crate::{Geometry, GridAttr, LabelVolume};

    fn labels(values: &[i16]) -> LabelVolume {
        let mut l = LabelVolume::zeros((1, 4, 4), Geometry::new([3.0, 0.7, 0.7]));
        for (i, v) in values.iter().enumerate() {
            l[(0, i / 4, i % 4)] = *v;
        }
        l
    }

    #[test]
    fn test_single_label_unchanged() {
        let l = labels(&[0, 5, 5, 0]);
        assert_eq!(inspect_label_map(&l, 1), Ok(LabelMapCase::SingleLabel));
        assert_eq!(preprocess_label_map(&l, 1).unwrap(), l);
    }

    #[test]
    fn test_desired_absent_unchanged() {
        let l = labels(&[0, 5, 6, 0]);
        assert_eq!(inspect_label_map(&l, 2), Ok(LabelMapCase::DesiredAbsent));
        assert_eq!(preprocess_label_map(&l, 2).unwrap(), l);
    }

    #[test]
    fn test_extract_desired() {
        let _ = simple_logger::SimpleLogger::new().init();
        let l = labels(&[0, 5, 6, 6, 7]);
        let out = preprocess_label_map(&l, 6).unwrap();
        assert_eq!(out.distinct_labels(), vec![0, 1]);
        assert_eq!(out.count(1), 2);
        assert_eq!(out[(0, 0, 2)], 1);
        assert_eq!(out[(0, 0, 1)], 0);
        assert_eq!(out.geometry(), l.geometry());
    }

    #[test]
    fn test_background_must_be_minimum() {
        let l = labels(&[0, -1, 3]);
        assert_eq!(
            preprocess_label_map(&l, 3),
            Err(SeedError::BackgroundNotMinimum(-1))
        );

        // 没有背景体素.
        let mut full = LabelVolume::zeros((1, 1, 2), Geometry::default());
        full.replace(0, 4);
        assert_eq!(
            inspect_label_map(&full, 4),
            Err(SeedError::BackgroundNotMinimum(4))
        );
    }

    #[test]
    fn test_idempotent() {
        for (values, desired) in [
            (&[0, 5, 5][..], 5),
            (&[0, 5, 6, 6][..], 6),
            (&[0, 5, 6, 6][..], 1),
            (&[0, 2, 3, 4][..], 9),
        ] {
            let l = labels(values);
            let once = preprocess_label_map(&l, desired).unwrap();
            let twice = preprocess_label_map(&once, desired).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_all_background() {
        let l = labels(&[]);
        assert_eq!(inspect_label_map(&l, 1), Ok(LabelMapCase::DesiredAbsent));
        assert_eq!(preprocess_label_map(&l, 1).unwrap().to_mask().count_foreground(), 0);
    }
}
