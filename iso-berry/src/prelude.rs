//! 🫐欢迎光临🫐
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{HuSlice, SliceMirror, SliceStack};

pub use crate::geom::{BoundingBox, Point3};

pub use crate::surface::{
    polygonise, BuildError, BuildResult, GridCell, MeshStats, ReconstructedVolume, Triangle,
    TriangleMesh, VolumeReconstructor,
};

pub use crate::roi::{
    Contour, ContourFile, ContourSet, FieldEvaluator, FitError, FitResult, LabeledPoint,
    MaskPlane, MaskVolume, ParseError, ParseResult, PlaneAxis, PointLabel, RbfField,
};

pub use crate::consts::{
    HU_AIR, INSIDE_FIELD_THRESHOLD, ISO_BONE, ISO_SKIN, MASK_FILL_HU,
};
