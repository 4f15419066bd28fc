//! 体素掩膜: 从隐式曲面栅格化, 以及对切片 HU 数据的覆写.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::{Array2, ArrayView2};
use std::io::{Read, Write};
use std::ops::{Index, IndexMut, RangeInclusive};

use super::error::FitResult;
use super::FieldEvaluator;
use crate::consts::mask::{is_inside, MASK_INSIDE, MASK_OUTSIDE};
use crate::{Idx2d, Idx3d, SliceStack};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 与单张切片对应的二维包含掩膜 (0 = 外部, 1 = 内部).
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaskPlane {
    data: Array2<u8>,
}

impl MaskPlane {
    /// 创建给定形状的全外部掩膜.
    #[inline]
    pub fn zeros((h, w): Idx2d) -> Self {
        Self {
            data: Array2::from_elem((h, w), MASK_OUTSIDE),
        }
    }

    /// 掩膜的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 掩膜的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 将给定位置标记为内部.
    #[inline]
    pub fn set_inside(&mut self, pos: Idx2d) {
        self.data[pos] = MASK_INSIDE;
    }

    /// 内部像素的总数.
    #[inline]
    pub fn inside_count(&self) -> usize {
        self.data.iter().filter(|&&p| is_inside(p)).count()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<u8> {
        self.data.view()
    }

    /// 以行优先规则, 获取能迭代所有 `(索引, 掩膜值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
        self.data.indexed_iter()
    }

    /// 压缩数据.
    pub fn compress(&self) -> CompactMaskPlane {
        let buf = if self.data.is_standard_layout() {
            std::borrow::Cow::Borrowed(self.data.as_slice().unwrap())
        } else {
            std::borrow::Cow::Owned(self.data.iter().copied().collect::<Vec<u8>>())
        };
        let mut e = ZlibEncoder::new(Vec::with_capacity(8), Compression::best());
        e.write_all(buf.as_ref()).expect("Compression error");
        CompactMaskPlane {
            buf: e.finish().expect("Compression error"),
            sh: self.shape(),
        }
    }
}

impl Index<Idx2d> for MaskPlane {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for MaskPlane {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// 压缩存储的 `MaskPlane`; 不透明类型.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompactMaskPlane {
    /// 压缩的不透明字节流.
    buf: Vec<u8>,

    /// 形状.
    sh: Idx2d,
}

impl CompactMaskPlane {
    /// 解压缩数据.
    pub fn decompress(self) -> MaskPlane {
        let Self { buf, sh: (h, w) } = self;
        let mut d = ZlibDecoder::new(buf.as_slice());
        let mut buf = Vec::with_capacity(h * w);
        d.read_to_end(&mut buf).expect("Decompression error");
        debug_assert_eq!(buf.len(), h * w);
        let data = Array2::<u8>::from_shape_vec((h, w), buf).unwrap();
        MaskPlane { data }
    }
}

/// 覆盖一段连续切片序号的体素掩膜, 每张切片一个平面.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaskVolume {
    /// 第一个平面对应的切片序号.
    base_location: i32,

    planes: Vec<MaskPlane>,
}

impl MaskVolume {
    /// 在 `locations` 范围内逐体素栅格化隐式曲面.
    ///
    /// 对范围内每张切片的每个体素, 在其中心处求场值,
    /// 大于经验内部阈值的体素被标记为内部.
    ///
    /// # 注意
    ///
    /// `locations` 范围内的每个序号都必须在 `stack` 中有对应切片,
    /// 否则程序 panic. 调用者应当先用排好序的连续切片集合确定范围.
    ///
    /// # 错误
    ///
    /// 拟合失败 (约束点不足, 几何退化) 时返回 `Err`, 不产生部分掩膜.
    pub fn rasterize<E: FieldEvaluator>(
        field: &mut E,
        stack: &SliceStack,
        locations: RangeInclusive<i32>,
    ) -> FitResult<Self> {
        let base_location = *locations.start();
        let mut planes = Vec::new();

        for location in locations {
            let slice = stack
                .get_at(location)
                .unwrap_or_else(|| panic!("切片序号 {location} 不在集合内"));

            let (rows, cols) = slice.shape();
            let (sx, sy) = slice.spacing();
            let mut plane = MaskPlane::zeros((rows, cols));

            for row in 0..rows {
                for col in 0..cols {
                    // 体素中心: 角点位置加半个像素间距.
                    let mut center = slice.corner_position(row, col);
                    center.x += sx / 2.0;
                    center.y += sy / 2.0;

                    if field.is_inside(center)? {
                        plane.set_inside((row, col));
                    }
                }
            }
            planes.push(plane);
        }

        Ok(Self {
            base_location,
            planes,
        })
    }

    /// 以 `reference` 序号为中心, 在 `±half_extent` 的范围内栅格化.
    /// 范围会被裁剪到 `stack` 中实际存在的序号区间.
    ///
    /// 参考序号一般来自轮廓定义的平移向量
    /// (见 [`super::ContourFile::reference_location`]).
    pub fn rasterize_around<E: FieldEvaluator>(
        field: &mut E,
        stack: &SliceStack,
        reference: i32,
        half_extent: u32,
    ) -> FitResult<Self> {
        let lo = stack.iter().map(|s| s.location()).min().unwrap_or(reference);
        let hi = stack.iter().map(|s| s.location()).max().unwrap_or(reference);

        let start = reference.saturating_sub(half_extent as i32).max(lo);
        let end = reference.saturating_add(half_extent as i32).min(hi);
        Self::rasterize(field, stack, start..=end)
    }

    /// 从既有平面直接创建.
    ///
    /// `planes` 依次对应从 `base_location` 开始的连续序号.
    #[inline]
    pub fn from_planes(base_location: i32, planes: Vec<MaskPlane>) -> Self {
        Self {
            base_location,
            planes,
        }
    }

    /// 第一个平面对应的切片序号.
    #[inline]
    pub fn base_location(&self) -> i32 {
        self.base_location
    }

    /// 平面个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.planes.len()
    }

    /// 是否没有任何平面?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// 所有平面, 按切片序号升序.
    #[inline]
    pub fn planes(&self) -> &[MaskPlane] {
        &self.planes
    }

    /// 给定切片序号对应的平面. 序号不在掩膜范围内时返回 `None`.
    pub fn plane_at(&self, location: i32) -> Option<&MaskPlane> {
        let offset = location.checked_sub(self.base_location)?;
        if offset < 0 {
            return None;
        }
        self.planes.get(offset as usize)
    }

    /// 所有平面上内部体素的总数.
    #[inline]
    pub fn inside_count(&self) -> usize {
        self.planes.iter().map(MaskPlane::inside_count).sum()
    }

    /// 将掩膜命中的体素 HU 值覆写为 `fill_hu`.
    ///
    /// 对每个平面, 找到对应序号的切片并覆写其内部体素;
    /// 其余体素不受影响. 返回总共覆写的体素个数.
    ///
    /// # 注意
    ///
    /// 掩膜覆盖的每个序号都必须在 `stack` 中有对应切片,
    /// 且平面形状必须与切片一致, 否则程序 panic.
    pub fn apply_to_stack(&self, stack: &mut SliceStack, fill_hu: i16) -> usize {
        let mut overwritten = 0usize;
        for (k, plane) in self.planes.iter().enumerate() {
            let location = self.base_location + k as i32;
            let slice = stack
                .get_at_mut(location)
                .unwrap_or_else(|| panic!("切片序号 {location} 不在集合内"));
            overwritten += slice.fill_where_masked(plane.data(), fill_hu);
        }
        overwritten
    }
}

impl Index<Idx3d> for MaskVolume {
    type Output = u8;

    /// 以 `(平面序, 行, 列)` 索引掩膜体素.
    #[inline]
    fn index(&self, (k, h, w): Idx3d) -> &Self::Output {
        &self.planes[k][(h, w)]
    }
}
