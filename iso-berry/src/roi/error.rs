//! 轮廓解析与隐式曲面拟合的运行时错误.

use std::fmt;

use super::PlaneAxis;

/// 轮廓文本的解析错误. 任何一处格式问题都会使整次加载失败,
/// 不存在部分成功的轮廓集合.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// 缺少起始的平移向量行.
    MissingShift,

    /// 某一行的字段个数不符合预期. 参数为行号 (从 1 开始).
    BadRecord(usize),

    /// 某一行含有无法解析的数值. 参数为行号 (从 1 开始).
    BadNumber(usize),

    /// 未知的平面方向码. 参数为方向码和行号.
    BadDirection(i64, usize),

    /// 轮廓块在声明的点数读完之前被截断. 参数为块的起始行号.
    TruncatedBlock(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingShift => write!(f, "contour text is missing the leading shift vector"),
            Self::BadRecord(line) => write!(f, "malformed record at line {line}"),
            Self::BadNumber(line) => write!(f, "unparsable number at line {line}"),
            Self::BadDirection(code, line) => {
                write!(f, "unknown direction code {code} at line {line}")
            }
            Self::TruncatedBlock(line) => {
                write!(f, "contour block starting at line {line} is truncated")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// 轮廓解析的运行时结果.
pub type ParseResult<T> = Result<T, ParseError>;

/// 隐式曲面拟合或求值的运行时错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// 约束点不足以做实际拟合工作.
    ///
    /// 第一个参数代表目前已有的点, 第二个参数代表实际拟合需要的最少点数.
    TooFewPoints(u32, u32),

    /// 某一平面方向上没有任何轮廓点, 无法确立边界.
    EmptyDirection(PlaneAxis),

    /// 数值求解失败 (如约束点共点/共线导致的奇异 Gram 矩阵).
    ///
    /// 该失败对相同输入是确定性的, 重试没有意义.
    Singular,
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewPoints(got, need) => {
                write!(f, "too few points for the fit: got {got}, need {need}")
            }
            Self::EmptyDirection(axis) => {
                write!(f, "no contour points in the {axis:?} direction")
            }
            Self::Singular => write!(f, "the interpolation system is singular"),
        }
    }
}

impl std::error::Error for FitError {}

/// 隐式曲面拟合的运行时结果.
pub type FitResult<T> = Result<T, FitError>;
