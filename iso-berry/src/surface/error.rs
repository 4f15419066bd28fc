//! 体重建的运行时错误.

use std::fmt;

/// 等值面重建的运行时错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// 切片个数不足以做体重建.
    ///
    /// 第一个参数代表目前已有的切片数, 第二个参数代表重建需要的最少切片数.
    TooFewSlices(usize, usize),

    /// 切片序号存在缺口. 参数为第一处缺口的 `(前, 后)` 序号.
    LocationGap(i32, i32),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewSlices(got, need) => {
                write!(f, "too few slices for reconstruction: got {got}, need {need}")
            }
            Self::LocationGap(prev, next) => {
                write!(f, "slice location gap between {prev} and {next}")
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// 体重建的运行时结果.
pub type BuildResult<T> = Result<T, BuildError>;
