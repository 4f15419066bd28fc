//! ROI/VOI 提取: 手绘轮廓, RBF 隐式曲面与体素掩膜.
//!
//! 典型用法: 解析轮廓定义 -> 拟合 RBF 标量场 -> 在参考切片附近栅格化
//! 包含掩膜 -> 把掩膜命中的体素覆写为等值面常量 -> 对改写后的切片
//! 再跑一遍 marching cubes, 即得到掩膜结构自身的边界网格.

mod contour;
mod error;
mod mask;
mod rbf;

pub use contour::{Contour, ContourFile, ContourSet, PlaneAxis};
pub use error::{FitError, FitResult, ParseError, ParseResult};
pub use mask::{CompactMaskPlane, MaskPlane, MaskVolume};
pub use rbf::{
    rbf_field_value_f32, rbf_field_value_f64, rbf_weights_f32, rbf_weights_f64, FieldEvaluator,
    LabeledPoint, PointLabel, RbfField,
};
