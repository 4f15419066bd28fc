//! 散点隐式曲面拟合: 径向基函数 (RBF) 插值.
//!
//! 给定一组带标签 (边界 / 内部) 的三维约束点, 该模块拟合一个标量场
//! `f(p) = Σ w_i * φ(|p - x_i|)`, 使场值在每个约束点上复现其标签值.
//! 核函数取 biharmonic 样条 `φ(r) = r` (thin-plate 样条在三维的对应物).
//!
//! 内部判定 "场值大于 [`INSIDE_FIELD_THRESHOLD`]" 只在约束点包围盒内
//! 有意义; 盒外的点一律视为外部.

use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayView1};
use ndarray_linalg::Solve;
use num::Float;
use ordered_float::OrderedFloat;

use super::error::{FitError, FitResult};
use super::{ContourFile, PlaneAxis};
use crate::consts::INSIDE_FIELD_THRESHOLD;
use crate::geom::{BoundingBox, Point3};

/// 拟合所需的最少约束点数. 少于该数目的系统严重欠定.
const MIN_POINTS: usize = 4;

/// 约束点的标签.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointLabel {
    /// 点位于结构边界上, 场值约束为 0.
    Boundary,

    /// 点位于结构内部, 场值约束为 +1.
    Interior,
}

impl PointLabel {
    /// 标签对应的场值约束.
    #[inline]
    pub const fn constraint(&self) -> f64 {
        match self {
            Self::Boundary => 0.0,
            Self::Interior => 1.0,
        }
    }
}

/// 一个带标签的约束点.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LabeledPoint {
    /// 患者坐标系中的位置.
    pub position: Point3,

    /// 边界 / 内部标签.
    pub label: PointLabel,
}

/// 标量场求值器的窄接口.
///
/// 目前只有 [`RbfField`] 一个具体实现; 未来的其它拟合策略
/// 通过实现该接口接入, 不引入继承层次.
pub trait FieldEvaluator {
    /// 在给定点求标量场值. 权重未就绪时先触发一次拟合.
    fn evaluate(&mut self, p: Point3) -> FitResult<f64>;

    /// 该点是否位于结构内部?
    ///
    /// 判定标准是场值 **大于** [`INSIDE_FIELD_THRESHOLD`] (而非大于 0).
    fn is_inside(&mut self, p: Point3) -> FitResult<bool> {
        Ok(self.evaluate(p)? > INSIDE_FIELD_THRESHOLD)
    }
}

/// 拟合完成后缓存的数据.
#[derive(Clone, Debug)]
struct Fitted {
    positions: Vec<[f64; 3]>,
    weights: Array1<f64>,
    bbox: BoundingBox,
}

/// RBF 标量场.
///
/// 权重在首次求值时惰性计算并缓存; 任何对约束点集的修改都会使缓存失效,
/// 下一次求值将重新拟合.
#[derive(Clone, Debug)]
pub struct RbfField {
    points: Vec<LabeledPoint>,
    fitted: Option<Fitted>,
}

impl RbfField {
    /// 从既有约束点集创建. 此时不做任何计算.
    #[inline]
    pub fn new(points: Vec<LabeledPoint>) -> Self {
        Self {
            points,
            fitted: None,
        }
    }

    /// 从轮廓定义创建: 展平, 去重, 施加平移, 并生成内部代表点.
    ///
    /// 边界点是三个方向所有轮廓点 (平移后) 的去重并集, 约束值 0;
    /// 每条轮廓额外贡献其质心 (平移后) 作为内部点, 约束值 +1.
    ///
    /// # 错误
    ///
    /// 任何一个方向上没有轮廓点时返回 [`FitError::EmptyDirection`]:
    /// 三个方向共同确立结构的边界轮廓, 缺一不可.
    pub fn from_contours(file: &ContourFile) -> FitResult<Self> {
        for axis in PlaneAxis::ALL {
            if file.contours.point_count(axis) == 0 {
                return Err(FitError::EmptyDirection(axis));
            }
        }

        let mut seen: HashSet<(OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>)> =
            HashSet::new();
        let mut points = Vec::new();

        let mut try_push = |position: Point3, label: PointLabel| {
            let key = (
                OrderedFloat(position.x),
                OrderedFloat(position.y),
                OrderedFloat(position.z),
            );
            if seen.insert(key) {
                points.push(LabeledPoint { position, label });
            }
        };

        for axis in PlaneAxis::ALL {
            for contour in file.contours.contours(axis) {
                for &p in contour.points() {
                    try_push(p + file.shift, PointLabel::Boundary);
                }
            }
        }
        for contour in file.contours.iter_all() {
            if let Some(c) = contour.centroid() {
                try_push(c + file.shift, PointLabel::Interior);
            }
        }

        Ok(Self::new(points))
    }

    /// 当前的约束点集.
    #[inline]
    pub fn points(&self) -> &[LabeledPoint] {
        &self.points
    }

    /// 替换约束点集. 使已缓存的权重失效.
    pub fn set_points(&mut self, points: Vec<LabeledPoint>) {
        self.points = points;
        self.invalidate();
    }

    /// 追加一个约束点. 使已缓存的权重失效.
    pub fn push_point(&mut self, point: LabeledPoint) {
        self.points.push(point);
        self.invalidate();
    }

    /// 已缓存的插值权重. 尚未拟合时返回 `None`.
    #[inline]
    pub fn weights(&self) -> Option<&Array1<f64>> {
        self.fitted.as_ref().map(|f| &f.weights)
    }

    /// 约束点集的包围盒. 尚未拟合时返回 `None`.
    ///
    /// 边界轮廓从三个方向包住结构, 因此结构本身必然落在该盒内;
    /// 盒外的点无须求场值即可判定为外部.
    #[inline]
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.fitted.as_ref().map(|f| &f.bbox)
    }

    /// 丢弃已缓存的权重, 下一次求值将重新拟合.
    #[inline]
    fn invalidate(&mut self) {
        self.fitted = None;
    }

    /// 求解插值权重并缓存. 已有缓存时直接返回.
    ///
    /// # 错误
    ///
    /// 约束点少于 4 个时返回 [`FitError::TooFewPoints`];
    /// 约束点几何退化 (如含重合点) 导致 Gram 矩阵奇异时返回
    /// [`FitError::Singular`]. 两类失败都是确定性的, 不做静默回退.
    pub fn fit(&mut self) -> FitResult<()> {
        if self.fitted.is_some() {
            return Ok(());
        }
        let n = self.points.len();
        if n < MIN_POINTS {
            return Err(FitError::TooFewPoints(n as u32, MIN_POINTS as u32));
        }

        let positions: Vec<[f64; 3]> = self
            .points
            .iter()
            .map(|lp| [lp.position.x, lp.position.y, lp.position.z])
            .collect();
        let constraints: Array1<f64> =
            self.points.iter().map(|lp| lp.label.constraint()).collect();

        let weights = rbf_weights_f64(&positions, constraints.view())?;
        let bbox = BoundingBox::from_points(self.points.iter().map(|lp| &lp.position));
        self.fitted = Some(Fitted {
            positions,
            weights,
            bbox,
        });
        Ok(())
    }
}

impl FieldEvaluator for RbfField {
    fn evaluate(&mut self, p: Point3) -> FitResult<f64> {
        self.fit()?;
        let Fitted {
            positions, weights, ..
        } = self.fitted.as_ref().unwrap();
        Ok(rbf_field_value_f64(
            positions,
            weights.view(),
            [p.x, p.y, p.z],
        ))
    }

    /// 先用约束点包围盒粗判: 盒外的点直接判定为外部, 不求场值.
    fn is_inside(&mut self, p: Point3) -> FitResult<bool> {
        self.fit()?;
        if !self.fitted.as_ref().unwrap().bbox.contains(&p) {
            return Ok(false);
        }
        Ok(self.evaluate(p)? > INSIDE_FIELD_THRESHOLD)
    }
}

/// RBF 插值的实际实现.
struct RbfImp<'a, T: Float> {
    positions: &'a [[T; 3]],
    constraints: ArrayView1<'a, T>,
}

macro_rules! impl_rbf {
    ($fp: ty) => {
        impl<'a> RbfImp<'a, $fp> {
            #[inline]
            fn new(positions: &'a [[$fp; 3]], constraints: ArrayView1<'a, $fp>) -> Self {
                assert_eq!(
                    positions.len(),
                    constraints.len(),
                    "约束点和约束值必须一一对应"
                );
                Self {
                    positions,
                    constraints,
                }
            }

            /// Biharmonic 样条核: `φ(r) = r`.
            #[inline]
            fn kernel(r: $fp) -> $fp {
                r
            }

            #[inline]
            fn distance(a: &[$fp; 3], b: &[$fp; 3]) -> $fp {
                let dx = a[0] - b[0];
                let dy = a[1] - b[1];
                let dz = a[2] - b[2];
                (dx * dx + dy * dy + dz * dz).sqrt()
            }

            /// 求解 Gram 线性系统, 得到插值权重.
            fn solve(&self) -> FitResult<Array1<$fp>> {
                let n = self.positions.len();
                let mut gram = Array2::<$fp>::zeros((n, n));
                for i in 0..n {
                    for j in i..n {
                        let k = Self::kernel(Self::distance(
                            &self.positions[i],
                            &self.positions[j],
                        ));
                        gram[(i, j)] = k;
                        gram[(j, i)] = k;
                    }
                }

                gram.solve(&self.constraints.to_owned())
                    .map_err(|_| FitError::Singular)
            }

            /// 在点 `p` 处求场值.
            fn field_value(
                positions: &[[$fp; 3]],
                weights: ArrayView1<$fp>,
                p: [$fp; 3],
            ) -> $fp {
                debug_assert_eq!(positions.len(), weights.len());
                positions
                    .iter()
                    .zip(weights.iter())
                    .map(|(x, &w)| w * Self::kernel(Self::distance(x, &p)))
                    .sum()
            }
        }
    };
}

impl_rbf!(f32);
impl_rbf!(f64);

/// 求解 RBF 插值权重.
///
/// `positions` 是约束点, `constraints` 是对应的场值约束.
pub fn rbf_weights_f64<'a>(
    positions: &'a [[f64; 3]],
    constraints: ArrayView1<'a, f64>,
) -> FitResult<Array1<f64>> {
    RbfImp::<f64>::new(positions, constraints).solve()
}

/// 求解 RBF 插值权重.
///
/// `positions` 是约束点, `constraints` 是对应的场值约束.
pub fn rbf_weights_f32<'a>(
    positions: &'a [[f32; 3]],
    constraints: ArrayView1<'a, f32>,
) -> FitResult<Array1<f32>> {
    RbfImp::<f32>::new(positions, constraints).solve()
}

/// 在点 `p` 处求 RBF 场值.
pub fn rbf_field_value_f64(positions: &[[f64; 3]], weights: ArrayView1<f64>, p: [f64; 3]) -> f64 {
    RbfImp::<f64>::field_value(positions, weights, p)
}

/// 在点 `p` 处求 RBF 场值.
pub fn rbf_field_value_f32(positions: &[[f32; 3]], weights: ArrayView1<f32>, p: [f32; 3]) -> f32 {
    RbfImp::<f32>::field_value(positions, weights, p)
}

#[cfg(test)]
mod tests {
    use super::{FieldEvaluator, LabeledPoint, PointLabel, RbfField};
    use crate::geom::Point3;
    use crate::roi::{Contour, ContourFile, ContourSet, FitError, PlaneAxis};

    fn labeled(x: f64, y: f64, z: f64, label: PointLabel) -> LabeledPoint {
        LabeledPoint {
            position: Point3::new(x, y, z),
            label,
        }
    }

    /// 边界方形 + 单个内部点.
    fn square_with_interior() -> Vec<LabeledPoint> {
        vec![
            labeled(1.0, 1.0, 0.0, PointLabel::Boundary),
            labeled(-1.0, 1.0, 0.0, PointLabel::Boundary),
            labeled(-1.0, -1.0, 0.0, PointLabel::Boundary),
            labeled(1.0, -1.0, 0.0, PointLabel::Boundary),
            labeled(0.0, 0.0, 1.0, PointLabel::Interior),
        ]
    }

    #[test]
    fn test_fit_reproduces_constraints() {
        let mut field = RbfField::new(square_with_interior());

        // 在内部约束点上求值, 应复现内部约束而非边界值.
        let v = field.evaluate(Point3::new(0.0, 0.0, 1.0)).unwrap();
        assert!((v - 1.0).abs() < 1e-6, "interior value was {v}");

        let b = field.evaluate(Point3::new(1.0, 1.0, 0.0)).unwrap();
        assert!(b.abs() < 1e-6, "boundary value was {b}");

        assert!(field.is_inside(Point3::new(0.0, 0.0, 1.0)).unwrap());
    }

    #[test]
    fn test_outside_bounding_box_is_outside() {
        let mut field = RbfField::new(square_with_interior());
        // 包围盒外的点不求场值, 直接判定为外部.
        assert!(!field.is_inside(Point3::new(100.0, 100.0, 100.0)).unwrap());
        assert!(!field.is_inside(Point3::new(0.0, 0.0, 1.5)).unwrap());

        field.fit().unwrap();
        let bbox = field.bounding_box().unwrap();
        assert_eq!(bbox.min(), Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(bbox.max(), Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_evaluate_triggers_lazy_fit() {
        let mut field = RbfField::new(square_with_interior());
        assert!(field.weights().is_none());
        field.evaluate(Point3::origin()).unwrap();
        assert!(field.weights().is_some());
    }

    #[test]
    fn test_mutation_invalidates_weights() {
        let mut field = RbfField::new(square_with_interior());
        field.fit().unwrap();
        assert!(field.weights().is_some());

        field.push_point(labeled(0.0, 0.0, -1.0, PointLabel::Interior));
        assert!(field.weights().is_none());
        // 下一次求值重新拟合.
        field.evaluate(Point3::origin()).unwrap();
        assert!(field.weights().is_some());
    }

    #[test]
    fn test_too_few_points() {
        let mut field = RbfField::new(vec![
            labeled(0.0, 0.0, 0.0, PointLabel::Boundary),
            labeled(0.0, 0.0, 1.0, PointLabel::Interior),
        ]);
        assert_eq!(field.fit().unwrap_err(), FitError::TooFewPoints(2, 4));
    }

    #[test]
    fn test_degenerate_cloud_is_singular() {
        // 全部重合的约束点: Gram 矩阵为零矩阵, 必然奇异.
        let pts = vec![labeled(1.0, 2.0, 3.0, PointLabel::Boundary); 5];
        let mut field = RbfField::new(pts);
        assert_eq!(field.fit().unwrap_err(), FitError::Singular);
    }

    fn three_axis_contours() -> ContourFile {
        let mut contours = ContourSet::new();
        contours.add(Contour::with_points(
            PlaneAxis::Axial,
            0.0,
            [
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(0.0, -1.0, 0.0),
            ],
        ));
        contours.add(Contour::with_points(
            PlaneAxis::Sagittal,
            0.0,
            [Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, -1.0)],
        ));
        contours.add(Contour::with_points(
            PlaneAxis::Coronal,
            0.0,
            [Point3::new(0.0, 1.0, 0.5), Point3::new(0.0, -1.0, 0.5)],
        ));
        ContourFile {
            shift: Point3::new(0.0, 0.0, 10.0),
            contours,
        }
    }

    #[test]
    fn test_from_contours_flatten() {
        let file = three_axis_contours();
        let field = RbfField::from_contours(&file).unwrap();

        let boundary = field
            .points()
            .iter()
            .filter(|lp| lp.label == PointLabel::Boundary)
            .count();
        let interior = field
            .points()
            .iter()
            .filter(|lp| lp.label == PointLabel::Interior)
            .count();
        // 8 个去重后的边界点; 轴向与矢状轮廓的质心重合, 去重后剩 2 个内部点.
        assert_eq!(boundary, 8);
        assert_eq!(interior, 2);

        // 平移被统一施加.
        assert!(field.points().iter().all(|lp| lp.position.z >= 9.0));
    }

    #[test]
    fn test_from_contours_missing_direction() {
        let mut contours = ContourSet::new();
        contours.add(Contour::with_points(
            PlaneAxis::Axial,
            0.0,
            [Point3::new(1.0, 0.0, 0.0)],
        ));
        let file = ContourFile {
            shift: Point3::origin(),
            contours,
        };
        assert_eq!(
            RbfField::from_contours(&file).unwrap_err(),
            FitError::EmptyDirection(PlaneAxis::Sagittal)
        );
    }
}
