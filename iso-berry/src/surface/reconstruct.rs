//! 体重建: 驱动体元遍历, 把切片集合变成三角形网格.

use itertools::Itertools;

use super::error::{BuildError, BuildResult};
use super::extract::polygonise;
use super::{GridCell, MeshStats, TriangleMesh};
use crate::geom::Point3;
use crate::SliceStack;

/// 重建所需的最少切片数.
const MIN_SLICES: usize = 3;

/// 等值面体重建器.
///
/// 给定连续的切片集合与等值面阈值, 对每对相邻切片的每个内部
/// `(行, 列)` 构造体元并做 marching cubes, 把所有三角形累积成一张网格.
#[derive(Copy, Clone, Debug)]
pub struct VolumeReconstructor {
    isolevel: f64,
}

/// 一次重建的完整输出.
#[derive(Clone, Debug)]
pub struct ReconstructedVolume {
    /// 等值面三角形网格.
    pub mesh: TriangleMesh,

    /// 汇总统计.
    pub stats: MeshStats,
}

impl VolumeReconstructor {
    /// 以等值面阈值 (HU) 初始化.
    #[inline]
    pub fn new(isolevel: f64) -> Self {
        Self { isolevel }
    }

    /// 等值面阈值.
    #[inline]
    pub fn isolevel(&self) -> f64 {
        self.isolevel
    }

    /// 对 `stack` 做完整的体重建.
    ///
    /// 流程: 排序并检查序号连续性; 以首张切片的水平范围中点和首尾切片的
    /// 纵向中点为中心, 把所有切片原点平移到以该中心为原点的坐标系;
    /// 随后对每对相邻切片逐体元提取等值面.
    ///
    /// # 注意
    ///
    /// 居中平移会 **就地修改** 切片的放置信息. 该操作对同一 `stack`
    /// 不是幂等的: 重复调用会再次平移 (但中心随之变为原点, 即再次平移
    /// 的向量为零, 网格不受影响).
    ///
    /// # 错误
    ///
    /// 切片数少于 3 时返回 [`BuildError::TooFewSlices`];
    /// 切片序号存在缺口时返回 [`BuildError::LocationGap`].
    pub fn reconstruct(&self, stack: &mut SliceStack) -> BuildResult<ReconstructedVolume> {
        if stack.len() < MIN_SLICES {
            return Err(BuildError::TooFewSlices(stack.len(), MIN_SLICES));
        }
        if !stack.build_sorted() {
            let (prev, next) = stack.gap().unwrap();
            return Err(BuildError::LocationGap(prev, next));
        }

        let order: Vec<usize> = stack.sorted_order().unwrap().to_vec();

        // 1. 居中: 所有切片平移到以体数据中心为原点的坐标系.
        let center = Self::center_point(stack, &order);
        for &idx in &order {
            stack.nth_mut(idx).shift_origin(&center);
        }

        // 2. 对每对相邻切片遍历内部体元.
        let mut mesh = TriangleMesh::new();
        let mut triangles = Vec::with_capacity(8);
        for (&front_idx, &back_idx) in order.iter().tuple_windows() {
            let front = stack.nth(front_idx);
            let back = stack.nth(back_idx);

            let rows = front.rows().min(back.rows());
            let cols = front.cols().min(back.cols());
            for row in 0..rows - 1 {
                for col in 0..cols - 1 {
                    let cell = GridCell::from_slice_pair(front, back, row, col);
                    polygonise(&cell, self.isolevel, &mut triangles);
                    for tri in triangles.drain(..) {
                        mesh.push(tri);
                    }
                }
            }
        }

        // 3. 汇总统计.
        let first = stack.nth(order[0]);
        let (rows, cols) = first.shape();
        let stats = MeshStats {
            rows,
            cols,
            slice_count: order.len(),
            voxel_count: rows * cols * order.len(),
            triangle_count: mesh.len(),
        };

        Ok(ReconstructedVolume { mesh, stats })
    }

    /// 求体数据的中心点: 首张切片水平范围的中点, 以及首尾切片 z 坐标的中点.
    fn center_point(stack: &SliceStack, order: &[usize]) -> Point3 {
        let first = stack.nth(order[0]);
        let last = stack.nth(*order.last().unwrap());

        let ul = first.upper_left();
        let (sx, sy) = first.spacing();
        let (rows, cols) = first.shape();

        Point3::new(
            ul.x + sx * cols as f64 / 2.0,
            ul.y + sy * rows as f64 / 2.0,
            ul.z + (last.upper_left().z - ul.z) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{ReconstructedVolume, VolumeReconstructor};
    use crate::geom::Point3;
    use crate::surface::BuildError;
    use crate::{HuSlice, SliceStack};
    use ndarray::Array2;

    /// `n` 张 4x4 切片, 全部低于等值面, 仅中间切片的一个角像素高于等值面.
    fn peak_stack(n: usize) -> SliceStack {
        let mut stack = SliceStack::new();
        for k in 0..n {
            let mut data = Array2::<i16>::from_elem((4, 4), -1000);
            if k == n / 2 {
                data[(0, 0)] = 1000;
            }
            stack.insert(HuSlice::new(
                format!("s{k}"),
                k as i32,
                Point3::new(0.0, 0.0, k as f64),
                (1.0, 1.0),
                data,
            ));
        }
        stack
    }

    #[test]
    fn test_reconstruct_refuses_two_slices() {
        let mut stack = peak_stack(2);
        let err = VolumeReconstructor::new(500.0)
            .reconstruct(&mut stack)
            .unwrap_err();
        assert_eq!(err, BuildError::TooFewSlices(2, 3));
    }

    #[test]
    fn test_reconstruct_refuses_gap() {
        let mut stack = peak_stack(3);
        // 人为制造缺口.
        stack.insert(HuSlice::new(
            "s9",
            9,
            Point3::new(0.0, 0.0, 9.0),
            (1.0, 1.0),
            Array2::<i16>::from_elem((4, 4), -1000),
        ));
        let err = VolumeReconstructor::new(500.0)
            .reconstruct(&mut stack)
            .unwrap_err();
        assert_eq!(err, BuildError::LocationGap(2, 9));
    }

    #[test]
    fn test_reconstruct_three_slices() {
        let mut stack = peak_stack(3);
        let ReconstructedVolume { mesh, stats } = VolumeReconstructor::new(500.0)
            .reconstruct(&mut stack)
            .unwrap();

        // 单个突出角像素: 至少 1 个三角形, 每个被穿越的体元至多 5 个.
        assert!(!mesh.is_empty());
        let traversed_cells = 2 * 3 * 3;
        assert!(mesh.len() <= traversed_cells * 5);

        assert_eq!(stats.rows, 4);
        assert_eq!(stats.cols, 4);
        assert_eq!(stats.slice_count, 3);
        assert_eq!(stats.voxel_count, 48);
        assert_eq!(stats.triangle_count, mesh.len());
        assert_eq!(stats.vertex_count(), mesh.len() * 3);
    }

    #[test]
    fn test_reconstruct_centers_slices() {
        let mut stack = peak_stack(3);
        VolumeReconstructor::new(500.0)
            .reconstruct(&mut stack)
            .unwrap();

        // 中心为 (2, 2, 1): 首张切片范围中点与首尾 z 中点.
        assert_eq!(
            stack.get_at(0).unwrap().upper_left(),
            Point3::new(-2.0, -2.0, -1.0)
        );
        assert_eq!(
            stack.get_at(2).unwrap().upper_left(),
            Point3::new(-2.0, -2.0, 1.0)
        );
    }

    #[test]
    fn test_reconstruct_deterministic() {
        let mut stack1 = peak_stack(4);
        let mut stack2 = peak_stack(4);
        let r = VolumeReconstructor::new(500.0);
        let m1 = r.reconstruct(&mut stack1).unwrap().mesh;
        let m2 = r.reconstruct(&mut stack2).unwrap().mesh;
        assert_eq!(m1.triangles(), m2.triangles());
    }
}
