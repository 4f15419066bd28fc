//! 单张 CT 水平切片 (HU) 及其空间放置信息.

use crate::geom::Point3;
use crate::Idx2d;
use ndarray::iter::{Iter, IterMut};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Ix2};
use std::ops::{Index, IndexMut};

use super::SliceMirror;

/// 一张已解码、已换算为 HU 的二维 CT 切片, 连同其在患者坐标系中的放置信息.
///
/// 像素网格的形状在构建后不可变, 但单个 HU 值可以被覆写 (掩膜操作).
/// 切片由 [`crate::SliceStack`](super::SliceStack) 独占持有,
/// 其它组件不得跨越一次变异操作保留别名.
#[derive(Debug, Clone)]
pub struct HuSlice {
    /// 来源的稳定标识符 (一般为源文件名).
    id: String,

    /// 切片在扫描轴上的整数序号. 用于排序和缺口检测.
    location: i32,

    /// 像素 `[0, 0]` 在患者坐标系中的物理位置.
    upper_left: Point3,

    /// 水平方向相邻像素的物理间距 (毫米).
    spacing_x: f64,

    /// 垂直方向相邻像素的物理间距 (毫米).
    spacing_y: f64,

    /// HU 数据, `(行, 列)` 索引.
    data: Array2<i16>,
}

impl HuSlice {
    /// 直接初始化.
    ///
    /// `data` 必须非空, `spacing` 的两个分量必须为正且有限,
    /// `upper_left` 必须有限, 否则程序 panic.
    pub fn new(
        id: impl Into<String>,
        location: i32,
        upper_left: Point3,
        (spacing_x, spacing_y): (f64, f64),
        data: Array2<i16>,
    ) -> Self {
        assert_ne!(data.len(), 0, "切片数据不能为空");
        assert!(spacing_x > 0.0 && spacing_x.is_finite());
        assert!(spacing_y > 0.0 && spacing_y.is_finite());
        assert!(upper_left.is_finite());

        Self {
            id: id.into(),
            location,
            upper_left,
            spacing_x,
            spacing_y,
            data,
        }
    }

    /// 来源标识符.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 扫描轴整数序号.
    #[inline]
    pub fn location(&self) -> i32 {
        self.location
    }

    /// 像素 `[0, 0]` 的物理位置.
    #[inline]
    pub fn upper_left(&self) -> Point3 {
        self.upper_left
    }

    /// 物理像素间距 `(水平, 垂直)`, 以毫米为单位.
    #[inline]
    pub fn spacing(&self) -> (f64, f64) {
        (self.spacing_x, self.spacing_y)
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 图像的行数 (高).
    #[inline]
    pub fn rows(&self) -> usize {
        self.shape().0
    }

    /// 图像的列数 (宽).
    #[inline]
    pub fn cols(&self) -> usize {
        self.shape().1
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        let (h, w) = self.shape();
        h * w
    }

    /// 判断一个索引是否合法 (未越界).
    #[inline]
    pub fn check(&self, (h, w): Idx2d) -> bool {
        let (h_len, w_len) = self.shape();
        h < h_len && w < w_len
    }

    /// 获取给定位置 (行, 列) 的 HU 值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&i16> {
        self.data.get(pos)
    }

    /// 获取给定位置 (行, 列) 的 HU 值, 并可就地修改. 越界时返回 `None`.
    #[inline]
    pub fn get_mut(&mut self, pos: Idx2d) -> Option<&mut i16> {
        self.data.get_mut(pos)
    }

    /// 获取可以迭代所有 HU 值的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, i16, Ix2> {
        self.data.iter()
    }

    /// 获取可以迭代并修改所有 HU 值的迭代器.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, i16, Ix2> {
        self.data.iter_mut()
    }

    /// 以行优先规则, 获取能迭代所有 `(索引, HU 值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &i16)> {
        self.data.indexed_iter()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<i16> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut2<i16> {
        self.data.view_mut()
    }

    /// 求像素 `(row, col)` 的物理位置.
    ///
    /// 注意 `row`/`col` 允许等于行列数 (即取到网格的远端角点),
    /// 因为体元构造需要访问 "像素之间" 的角点位置.
    #[inline]
    pub fn corner_position(&self, row: usize, col: usize) -> Point3 {
        Point3::new(
            self.upper_left.x + col as f64 * self.spacing_x,
            self.upper_left.y + row as f64 * self.spacing_y,
            self.upper_left.z,
        )
    }

    /// 将切片原点平移 `-center`, 使体数据以 `center` 为中心.
    ///
    /// 这是一个显式的变异操作. 以同一 `center` 重复施加 **不是** 幂等的:
    /// 每次调用都会再平移一次.
    #[inline]
    pub fn shift_origin(&mut self, center: &Point3) {
        self.upper_left -= *center;
    }

    /// 将 `mask` 中非零像素对应的 HU 值全部覆写为 `hu`.
    ///
    /// 返回总共成功覆写的个数. 如果 `mask` 形状与切片不符, 则程序 panic.
    pub fn fill_where_masked(&mut self, mask: ArrayView2<u8>, hu: i16) -> usize {
        assert_eq!(
            self.shape(),
            {
                let &[h, w] = mask.shape() else { unreachable!() };
                (h, w)
            },
            "掩膜形状与切片不符"
        );

        let mut cnt = 0usize;
        for (m, p) in mask.iter().zip(self.data.iter_mut()) {
            if crate::consts::mask::is_inside(*m) {
                cnt += 1;
                *p = hu;
            }
        }
        cnt
    }

    /// 获取拥有所有权的镜像, 供以后可能的恢复.
    #[inline]
    pub fn mirror(&self) -> SliceMirror {
        self.into()
    }

    /// 用 `mirror` 覆写原本 `self` 的 HU 数据. 放置信息不受影响.
    ///
    /// 如果 `mirror` 大小与 `self.size()` 不符, 则程序 panic.
    pub fn resume(&mut self, mirror: &SliceMirror) {
        assert_eq!(self.size(), mirror.0.len(), "镜像大小不符");
        for (r, w) in mirror.0.iter().zip(self.data.iter_mut()) {
            *w = *r;
        }
    }
}

impl Index<Idx2d> for HuSlice {
    type Output = i16;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for HuSlice {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::HuSlice;
    use crate::consts::mask::{MASK_INSIDE, MASK_OUTSIDE};
    use crate::geom::Point3;
    use ndarray::{arr2, Array2};

    fn plain_slice() -> HuSlice {
        HuSlice::new(
            "s0",
            0,
            Point3::new(-1.0, -2.0, 3.0),
            (0.5, 2.0),
            arr2(&[[0i16, 1, 2], [10, 11, 12]]),
        )
    }

    #[test]
    fn test_slice_shape_and_access() {
        let sli = plain_slice();
        assert_eq!(sli.shape(), (2, 3));
        assert_eq!(sli[(1, 2)], 12);
        assert_eq!(sli.get((2, 0)), None);
        assert!(sli.check((1, 2)));
        assert!(!sli.check((1, 3)));
    }

    #[test]
    fn test_corner_position() {
        let sli = plain_slice();
        assert_eq!(sli.corner_position(0, 0), Point3::new(-1.0, -2.0, 3.0));
        // 允许取到网格远端角点.
        assert_eq!(sli.corner_position(2, 3), Point3::new(0.5, 2.0, 3.0));
    }

    #[test]
    fn test_shift_origin_twice() {
        let mut sli = plain_slice();
        let center = Point3::new(1.0, 1.0, 1.0);
        sli.shift_origin(&center);
        assert_eq!(sli.upper_left(), Point3::new(-2.0, -3.0, 2.0));
        sli.shift_origin(&center);
        assert_eq!(sli.upper_left(), Point3::new(-3.0, -4.0, 1.0));
    }

    #[test]
    fn test_fill_where_masked() {
        let mut sli = plain_slice();
        let mut mask = Array2::<u8>::from_elem((2, 3), MASK_OUTSIDE);
        mask[(0, 1)] = MASK_INSIDE;
        let cnt = sli.fill_where_masked(mask.view(), 600);
        assert_eq!(cnt, 1);
        assert_eq!(sli[(0, 1)], 600);
        // 其余像素保持不变.
        assert_eq!(sli[(0, 0)], 0);
        assert_eq!(sli[(1, 1)], 11);
    }

    #[test]
    fn test_mirror_resume() {
        let mut sli = plain_slice();
        let mirror = sli.mirror();
        sli[(0, 0)] = -1024;
        sli[(1, 2)] = 600;
        sli.resume(&mirror);
        assert_eq!(sli[(0, 0)], 0);
        assert_eq!(sli[(1, 2)], 12);
    }
}
