//! Marching cubes 提取器: 逐体元的等值面三角化.

use super::tables::{EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use super::{GridCell, Triangle};
use crate::consts::INTERP_EPS;
use crate::geom::Point3;

/// 对单个体元做等值面三角化, 生成的 0 至 5 个三角形追加到 `triangles`.
///
/// 这是一个纯函数: 不修改输入体元, 同样的输入总是产生同样的三角形序列.
/// 当体元的 8 个角点全部位于等值面同侧时不产生任何三角形.
pub fn polygonise(cell: &GridCell, isolevel: f64, triangles: &mut Vec<Triangle>) {
    // 低于等值面的角点置位, 得到 8 位配置索引.
    let mut cube_index = 0usize;
    for (bit, &v) in cell.values.iter().enumerate() {
        if v < isolevel {
            cube_index |= 1 << bit;
        }
    }

    let edges = EDGE_TABLE[cube_index];
    if edges == 0 {
        // 体元完全在等值面内侧或外侧.
        return;
    }

    // 求等值面与各切割边的交点.
    let mut vert_list = [Point3::origin(); 12];
    for (edge, &(c1, c2)) in EDGE_CORNERS.iter().enumerate() {
        if edges & (1 << edge) != 0 {
            vert_list[edge] = vertex_interp(
                isolevel,
                cell.corners[c1],
                cell.corners[c2],
                cell.values[c1],
                cell.values[c2],
            );
        }
    }

    let row = &TRI_TABLE[cube_index];
    let mut i = 0;
    while row[i] != -1 {
        triangles.push(Triangle([
            vert_list[row[i] as usize],
            vert_list[row[i + 1] as usize],
            vert_list[row[i + 2] as usize],
        ]));
        i += 3;
    }
}

/// 在一条体元边上求等值面交点.
///
/// 当等值面几乎落在端点上, 或两端点值几乎相等时, 直接取端点,
/// 避免近退化体元上的除法放大误差.
fn vertex_interp(isolevel: f64, p1: Point3, p2: Point3, v1: f64, v2: f64) -> Point3 {
    if (isolevel - v1).abs() < INTERP_EPS {
        return p1;
    }
    if (isolevel - v2).abs() < INTERP_EPS {
        return p2;
    }
    if (v1 - v2).abs() < INTERP_EPS {
        return p1;
    }

    let mu = (isolevel - v1) / (v2 - v1);
    p1.lerp(&p2, mu)
}

#[cfg(test)]
mod tests {
    use super::{polygonise, vertex_interp};
    use crate::geom::Point3;
    use crate::surface::GridCell;
    use crate::HuSlice;
    use ndarray::arr2;

    /// 构造一个单位体元: 所有角点值为 `base`, 仅 7 号角 (前切片
    /// `(0, 0)` 像素) 为 `peak`.
    fn single_peak_cell(base: i16, peak: i16) -> GridCell {
        let front = HuSlice::new(
            "front",
            0,
            Point3::origin(),
            (1.0, 1.0),
            arr2(&[[peak, base], [base, base]]),
        );
        let back = HuSlice::new(
            "back",
            1,
            Point3::new(0.0, 0.0, 1.0),
            (1.0, 1.0),
            arr2(&[[base, base], [base, base]]),
        );
        GridCell::from_slice_pair(&front, &back, 0, 0)
    }

    #[test]
    fn test_isolevel_outside_range_no_triangles() {
        let cell = single_peak_cell(0, 100);
        let mut tris = vec![];
        polygonise(&cell, -500.0, &mut tris);
        assert!(tris.is_empty());
        polygonise(&cell, 500.0, &mut tris);
        assert!(tris.is_empty());
    }

    #[test]
    fn test_uniform_cell_at_own_value() {
        let cell = single_peak_cell(50, 50);
        let mut tris = vec![];
        // 所有角点都不低于等值面, 配置为 0, 不产生三角形.
        polygonise(&cell, 50.0, &mut tris);
        assert!(tris.is_empty());
    }

    #[test]
    fn test_single_corner_crossing() {
        let cell = single_peak_cell(0, 100);
        let mut tris = vec![];
        polygonise(&cell, 50.0, &mut tris);
        // 恰好一个角点在等值面上方: 单配置, 1 个三角形.
        assert_eq!(tris.len(), 1);
    }

    #[test]
    fn test_determinism() {
        let cell = single_peak_cell(-200, 800);
        let mut first = vec![];
        let mut second = vec![];
        polygonise(&cell, 500.0, &mut first);
        polygonise(&cell, 500.0, &mut second);
        assert_eq!(first, second);
    }

    #[test]
    fn test_vertex_interp_midpoint() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(2.0, 0.0, 0.0);
        let p = vertex_interp(50.0, p1, p2, 0.0, 100.0);
        assert_eq!(p, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_vertex_interp_degenerate_snaps() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(2.0, 0.0, 0.0);

        // 等值面几乎落在端点上.
        assert_eq!(vertex_interp(0.0, p1, p2, 0.0, 100.0), p1);
        assert_eq!(vertex_interp(100.0, p1, p2, 0.0, 100.0), p2);
        // 两端点值几乎相等.
        assert_eq!(vertex_interp(50.0, p1, p2, 42.0, 42.0), p1);
    }
}
