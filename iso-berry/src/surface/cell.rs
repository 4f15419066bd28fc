//! 跨越相邻切片对的单位体元.

use crate::geom::Point3;
use crate::HuSlice;

/// 一个单位体元: 8 个角点的物理位置与对应 HU 采样值.
///
/// 角点编号遵循 Bourke 的 marching cubes 约定 (底面 0-3, 顶面 4-7,
/// 均为逆时针), 与 [`super::tables`] 中的查找表一一对应.
/// 体元是完全短暂的对象: 按 `(切片对, 行, 列)` 构造, 立即被提取器消费.
#[derive(Debug, Clone)]
pub struct GridCell {
    /// 8 个角点的物理位置.
    pub corners: [Point3; 8],

    /// 8 个角点的标量采样值.
    pub values: [f64; 8],
}

impl GridCell {
    /// 从相邻切片对构造 `(row, col)` 处的体元.
    ///
    /// `front` 为扫描轴上靠前的切片, `back` 为其后继.
    /// 体元跨越 `[row, row+1] × [col, col+1]`; 调用者必须保证
    /// `row <= rows-2`, `col <= cols-2` (以两张切片中较小者为准).
    /// 角点值按直接查表获取, 该阶段不做任何插值.
    pub fn from_slice_pair(front: &HuSlice, back: &HuSlice, row: usize, col: usize) -> Self {
        debug_assert!(row + 1 < front.rows().min(back.rows()));
        debug_assert!(col + 1 < front.cols().min(back.cols()));

        let top_front = front.corner_position(row, col);
        let bottom_front = front.corner_position(row + 1, col);
        let top_back = back.corner_position(row, col);
        let bottom_back = back.corner_position(row + 1, col);

        let (sx_front, _) = front.spacing();
        let (sx_back, _) = back.spacing();

        let corners = [
            bottom_back,
            Point3::new(bottom_back.x + sx_back, bottom_back.y, bottom_back.z),
            Point3::new(bottom_front.x + sx_front, bottom_front.y, bottom_front.z),
            bottom_front,
            top_back,
            Point3::new(top_back.x + sx_back, top_back.y, top_back.z),
            Point3::new(top_front.x + sx_front, top_front.y, top_front.z),
            top_front,
        ];

        let values = [
            back[(row + 1, col)] as f64,
            back[(row + 1, col + 1)] as f64,
            front[(row + 1, col + 1)] as f64,
            front[(row + 1, col)] as f64,
            back[(row, col)] as f64,
            back[(row, col + 1)] as f64,
            front[(row, col + 1)] as f64,
            front[(row, col)] as f64,
        ];

        Self { corners, values }
    }

    /// 角点值的最小值与最大值.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = self.values[0];
        let mut hi = self.values[0];
        for &v in &self.values[1..] {
            if v < lo {
                lo = v;
            }
            if v > hi {
                hi = v;
            }
        }
        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::GridCell;
    use crate::geom::Point3;
    use crate::HuSlice;
    use ndarray::arr2;

    fn pair() -> (HuSlice, HuSlice) {
        let front = HuSlice::new(
            "front",
            0,
            Point3::new(0.0, 0.0, 0.0),
            (1.0, 1.0),
            arr2(&[[0i16, 1], [2, 3]]),
        );
        let back = HuSlice::new(
            "back",
            1,
            Point3::new(0.0, 0.0, 2.0),
            (1.0, 1.0),
            arr2(&[[10i16, 11], [12, 13]]),
        );
        (front, back)
    }

    #[test]
    fn test_cell_corner_convention() {
        let (front, back) = pair();
        let cell = GridCell::from_slice_pair(&front, &back, 0, 0);

        // 底面 (row+1) 在后切片上的两个角.
        assert_eq!(cell.corners[0], Point3::new(0.0, 1.0, 2.0));
        assert_eq!(cell.corners[1], Point3::new(1.0, 1.0, 2.0));
        // 底面在前切片上的两个角.
        assert_eq!(cell.corners[2], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(cell.corners[3], Point3::new(0.0, 1.0, 0.0));
        // 顶面 (row) 四角.
        assert_eq!(cell.corners[4], Point3::new(0.0, 0.0, 2.0));
        assert_eq!(cell.corners[5], Point3::new(1.0, 0.0, 2.0));
        assert_eq!(cell.corners[6], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(cell.corners[7], Point3::new(0.0, 0.0, 0.0));

        assert_eq!(
            cell.values,
            [12.0, 13.0, 3.0, 2.0, 10.0, 11.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_value_range() {
        let (front, back) = pair();
        let cell = GridCell::from_slice_pair(&front, &back, 0, 0);
        assert_eq!(cell.value_range(), (0.0, 13.0));
    }
}
