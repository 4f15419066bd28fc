//! 三角形网格及其统计信息.

use crate::geom::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 患者坐标系下的一个三角形面片. 不携带法线, 由消费方按需计算.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle(
    /// 三个顶点.
    pub [Point3; 3],
);

/// 等值面三角形网格. 重建期间只追加, 整体交给渲染方消费.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriangleMesh {
    triangles: Vec<Triangle>,
}

impl TriangleMesh {
    /// 创建空网格.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个三角形.
    #[inline]
    pub fn push(&mut self, tri: Triangle) {
        self.triangles.push(tri);
    }

    /// 网格内的三角形个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// 网格是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// 所有三角形.
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// 将网格展开为顶点序列, 每 3 个顶点隐式构成一个三角形.
    ///
    /// 每个三角形按 `0, 2, 1` 的顶点顺序输出. 该绕序翻转使法线朝向
    /// 表面外侧, 渲染方必须按此顺序消费, 不得自行重排.
    pub fn vertex_soup(&self) -> Vec<Point3> {
        let mut soup = Vec::with_capacity(self.triangles.len() * 3);
        for tri in &self.triangles {
            soup.push(tri.0[0]);
            soup.push(tri.0[2]);
            soup.push(tri.0[1]);
        }
        soup
    }

    /// 直接获得底层三角形数据.
    #[inline]
    pub fn into_triangles(self) -> Vec<Triangle> {
        self.triangles
    }
}

/// 一次重建的汇总统计, 供诊断与展示.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshStats {
    /// 切片行数.
    pub rows: usize,

    /// 切片列数.
    pub cols: usize,

    /// 参与重建的切片个数.
    pub slice_count: usize,

    /// 体素总数 (`rows * cols * slice_count`).
    pub voxel_count: usize,

    /// 生成的三角形个数.
    pub triangle_count: usize,
}

impl MeshStats {
    /// 顶点序列的长度 (`triangle_count * 3`).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.triangle_count * 3
    }
}

#[cfg(test)]
mod tests {
    use super::{Triangle, TriangleMesh};
    use crate::geom::Point3;

    #[test]
    fn test_vertex_soup_winding() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        let mut mesh = TriangleMesh::new();
        mesh.push(Triangle([a, b, c]));

        // 绕序翻转: 0, 2, 1.
        assert_eq!(mesh.vertex_soup(), vec![a, c, b]);
    }
}
