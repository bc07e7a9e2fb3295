use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView3, ArrayViewMut3, Zip};
use nifti::writer::WriterOptions;
use nifti::IntoNdArray;

use super::{read_nifti, standard, to_zhw, Geometry, GridAttr, Mask};
use crate::consts::gray::{BACKGROUND, FOREGROUND};
use crate::consts::LABEL_BACKGROUND;
use crate::error::VolumeIoResult;
use crate::Idx3d;

/// 3D 标签体. 标签值以 `i16` 保存, `0` 为背景.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVolume {
    geometry: Geometry,
    data: Array3<i16>,
}

impl GridAttr for LabelVolume {
    #[inline]
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for LabelVolume {
    type Output = i16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for LabelVolume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl LabelVolume {
    /// 由 `(z, h, w)` 排列的数据和几何信息直接创建标签体.
    pub fn new(data: Array3<i16>, geometry: Geometry) -> Self {
        Self {
            geometry,
            data: standard(data),
        }
    }

    /// 创建全背景标签体.
    #[inline]
    pub fn zeros(shape: Idx3d, geometry: Geometry) -> Self {
        Self::new(Array3::from_elem(shape, LABEL_BACKGROUND), geometry)
    }

    /// 以 `mask` 的前景为 `label`, 背景为 0 创建标签体.
    pub fn from_mask(mask: &Mask, label: i16) -> Self {
        let data = mask
            .data()
            .mapv(|p| if p == BACKGROUND { LABEL_BACKGROUND } else { label });
        Self::new(data, *mask.geometry())
    }

    /// 打开 nii 文件格式的 3D 标签体. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> VolumeIoResult<Self> {
        let (geometry, shape, volume) = read_nifti(path.as_ref())?;
        let data = to_zhw(volume.into_ndarray::<i16>()?, shape)?;
        Ok(Self { geometry, data })
    }

    /// 以 nii 格式保存到 `path`. 数据按照 nifti 惯例以 \[w, h, z\] 写出.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> VolumeIoResult<()> {
        let header = self.geometry.to_header();
        let data = self.data.view().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&header)
            .write_nifti(&data)?;
        Ok(())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, i16> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, i16> {
        self.data.view_mut()
    }

    /// 获取值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: i16) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 获取标签体中出现过的所有标签值 (包括背景), 按升序排列.
    pub fn distinct_labels(&self) -> Vec<i16> {
        self.data
            .iter()
            .copied()
            .collect::<BTreeSet<i16>>()
            .into_iter()
            .collect()
    }

    /// 将值为 `old` 的体素全部替换为 `new`.
    ///
    /// 返回总共成功替换的个数.
    pub fn replace(&mut self, old: i16, new: i16) -> usize {
        let mut cnt = 0usize;
        self.data
            .iter_mut()
            .filter(|pix| **pix == old)
            .for_each(|p| {
                cnt += 1;
                *p = new;
            });
        cnt
    }

    /// 所有非零体素视为前景, 转换为二值掩膜.
    pub fn to_mask(&self) -> Mask {
        let mut data = Array3::from_elem(self.shape(), BACKGROUND);
        Zip::from(&mut data).and(&self.data).for_each(|m, &l| {
            if l != LABEL_BACKGROUND {
                *m = FOREGROUND;
            }
        });
        Mask::new(data, self.geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::LabelVolume;
    use crate::{Geometry, GridAttr};

    fn sample() -> LabelVolume {
        let mut l = LabelVolume::zeros((2, 2, 3), Geometry::new([2.0, 1.0, 1.0]));
        l[(0, 0, 0)] = 4;
        l[(1, 1, 2)] = 4;
        l[(1, 0, 1)] = 9;
        l
    }

    #[test]
    fn test_distinct_labels_sorted() {
        assert_eq!(sample().distinct_labels(), vec![0, 4, 9]);
        assert_eq!(sample().count(4), 2);
    }

    #[test]
    fn test_replace_and_mask() {
        let mut l = sample();
        assert_eq!(l.replace(4, 1), 2);
        assert_eq!(l.count(4), 0);

        let m = l.to_mask();
        assert_eq!(m.count_foreground(), 3);
        assert_eq!(m.geometry(), l.geometry());

        let back = LabelVolume::from_mask(&m, 7);
        assert_eq!(back.distinct_labels(), vec![0, 7]);
    }

    #[test]
    fn test_save_open_round_trip() {
        let g = Geometry::new([2.5, 0.75, 0.5]).with_origin([-10.0, 20.0, 30.5]);
        let mut l = LabelVolume::zeros((3, 4, 5), g);
        l[(0, 1, 4)] = 2;
        l[(2, 3, 0)] = -1;
        l[(1, 0, 0)] = 7;

        let path = std::env::temp_dir().join(format!("rss-berry-round-trip-{}.nii", std::process::id()));
        l.save(&path).unwrap();
        let back = LabelVolume::open(&path).unwrap();
        let intensity = crate::Volume::<f32>::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(back.shape(), (3, 4, 5));
        assert_eq!(back.geometry().spacing(), [2.5, 0.75, 0.5]);
        assert_eq!(back.geometry().origin(), [-10.0, 20.0, 30.5]);
        assert_eq!(back, l);

        assert_eq!(intensity.shape(), (3, 4, 5));
        assert_eq!(intensity.geometry(), &g);
        assert_eq!(intensity[(0, 1, 4)], 2.0);
        assert_eq!(intensity[(2, 3, 0)], -1.0);
        assert_eq!(intensity[(1, 0, 0)], 7.0);
        assert_eq!(intensity[(0, 0, 1)], 0.0);
    }
}
