#![warn(missing_docs)]

//! 核心库. 把有序的 CT 切片序列 (HU) 重建为三维等值面三角形网格,
//! 并支持从手绘轮廓拟合 RBF 隐式曲面来雕刻子体掩膜.
//!
//! 该 crate 是纯计算核心: 不解码任何文件格式, 不做渲染,
//! 也不提供用户界面. DICOM 解析方负责喂入已换算为 HU 的切片,
//! 渲染方整体消费输出的三角形网格.
//!
//! # 注意
//!
//! 1. 核心是单线程的同步批计算: 切片摄入, 排序, 网格提取与 RBF
//!   拟合都运行到完成才返回. 需要保持 UI 响应的调用方应在自己的
//!   工作线程上运行整个重建.
//! 2. 居中平移和掩膜覆写会就地修改切片状态, 因此不要对同一份切片
//!   集合并发运行两次重建. Single-writer 契约由调用方保证.
//! 3. 在非期望情况下 (调用方违反索引契约), 程序会直接 panic,
//!   而不会导致内存错误. As what Rust promises.
//!
//! # 流水线
//!
//! ### 等值面重建
//!
//! 切片经 [`SliceStack`] 摄入并按扫描轴序号排序 (缺口会被检测并报告),
//! [`VolumeReconstructor`] 先把所有切片平移到以体数据中心为原点的
//! 坐标系, 然后对每对相邻切片的每个内部 (行, 列) 构造
//! [`surface::GridCell`] 并做 marching cubes, 输出一张
//! [`TriangleMesh`] 和汇总统计.
//!
//! 实现位于 `iso-berry/src/{data, surface}`.
//!
//! ### 轮廓掩膜
//!
//! 文本格式的轮廓定义经 [`ContourFile`] 解析后, 由 [`RbfField`]
//! 展平为带标签的约束点集并拟合 Gaussian RBF 标量场;
//! [`MaskVolume`] 在参考切片附近逐体素栅格化包含掩膜,
//! 再把命中体素的 HU 覆写为 [`consts::MASK_FILL_HU`].
//! 对改写后的切片以同一常量为等值面再做一遍重建,
//! 即可提取掩膜结构自身的边界.
//!
//! 实现位于 `iso-berry/src/roi`.

/// 二维索引 (行, 列), 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 (切片/平面, 行, 列).
pub type Idx3d = (usize, usize, usize);

pub mod consts;

/// CT 切片基础数据结构.
mod data;

pub use data::{HuSlice, SliceMirror, SliceStack};

pub mod geom;

pub use geom::{BoundingBox, Point3};

pub mod surface;

pub use surface::{
    BuildError, BuildResult, MeshStats, ReconstructedVolume, Triangle, TriangleMesh,
    VolumeReconstructor,
};

pub mod roi;

pub use roi::{
    Contour, ContourFile, ContourSet, FieldEvaluator, MaskPlane, MaskVolume, PlaneAxis, RbfField,
};

pub mod prelude;
