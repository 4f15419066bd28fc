//! 通用常量.

/// 掩膜体素值.
pub mod mask {
    /// 掩膜中, 结构外部体素的值.
    pub const MASK_OUTSIDE: u8 = 0;

    /// 掩膜中, 结构内部体素的值.
    pub const MASK_INSIDE: u8 = 1;

    /// 体素是否位于结构内部?
    #[inline]
    pub const fn is_inside(p: u8) -> bool {
        matches!(p, MASK_INSIDE)
    }

    /// 体素是否位于结构外部?
    #[inline]
    pub const fn is_outside(p: u8) -> bool {
        matches!(p, MASK_OUTSIDE)
    }
}

/// CT 扫描中空气 (同时也是常见 padding 替换值) 的 HU 值.
pub const HU_AIR: i16 = -1024;

/// 提取骨骼表面的常用等值面阈值 (HU).
pub const ISO_BONE: f64 = 500.0;

/// 提取皮肤表面的常用等值面阈值 (HU).
pub const ISO_SKIN: f64 = -800.0;

/// 掩膜命中体素被覆写成的 HU 常量.
///
/// 对覆写后的切片以同值做第二遍 marching cubes,
/// 即可提取出掩膜结构自身的边界.
pub const MASK_FILL_HU: i16 = 600;

/// 边插值的退化判定阈值. 当等值面与某端点的差值
/// (或两端点之间的差值) 的绝对值小于该值时, 直接取端点而不做除法.
pub const INTERP_EPS: f64 = 1e-5;

/// RBF 标量场的 "内部" 经验阈值.
///
/// 场值 **大于** 该阈值的点被判定为结构内部. 注意该值是 `-0.01` 而非 `0.0`:
/// 轻微放宽边界可以避免掩膜在边界约束点附近出现孔洞.
pub const INSIDE_FIELD_THRESHOLD: f64 = -0.01;
