//! 患者坐标系下的基础几何对象.

use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 患者坐标系中的三维点 (单位: 毫米). 也可一定程度上用作三维向量.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    /// 水平方向分量.
    pub x: f64,

    /// 垂直方向分量.
    pub y: f64,

    /// 切片扫描轴方向分量.
    pub z: f64,
}

impl Point3 {
    /// 直接初始化.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 坐标原点.
    #[inline]
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// 到 `other` 的欧几里得距离.
    #[inline]
    pub fn distance(&self, other: &Point3) -> f64 {
        (*self - *other).norm()
    }

    /// 向量模长.
    #[inline]
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// 三个分量是否全部有限 (非 inf, 非 NaN)?
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// 求 `self + t * (other - self)`, 即两点连线上的线性插值.
    #[inline]
    pub fn lerp(&self, other: &Point3, t: f64) -> Point3 {
        *self + (*other - *self) * t
    }
}

impl Add for Point3 {
    type Output = Point3;

    #[inline]
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Point3 {
    #[inline]
    fn add_assign(&mut self, rhs: Point3) {
        *self = *self + rhs;
    }
}

impl Sub for Point3 {
    type Output = Point3;

    #[inline]
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Point3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Point3) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;

    #[inline]
    fn mul(self, rhs: f64) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// 轴对齐包围盒.
///
/// 空盒以反转的无穷界表示, `expand` 一次后即成为普通盒.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    min: Point3,
    max: Point3,
}

impl Default for BoundingBox {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// 创建空盒.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// 由点集构建包围盒.
    pub fn from_points<'a, I: IntoIterator<Item = &'a Point3>>(points: I) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand(p);
        }
        bbox
    }

    /// 盒是否为空 (尚未包含任何点)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// 扩张包围盒使其包含 `p`.
    pub fn expand(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// `p` 是否落在盒内 (边界含)?
    #[inline]
    pub fn contains(&self, p: &Point3) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    /// 最小角点.
    #[inline]
    pub fn min(&self) -> Point3 {
        self.min
    }

    /// 最大角点.
    #[inline]
    pub fn max(&self) -> Point3 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundingBox, Point3};

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_point3_arith() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 6.0, 8.0);
        assert_eq!(a + b, Point3::new(5.0, 8.0, 11.0));
        assert_eq!(b - a, Point3::new(3.0, 4.0, 5.0));
        assert!(float_eq((b - a).norm(), 50.0_f64.sqrt()));
        assert!(float_eq(a.distance(&b), 50.0_f64.sqrt()));
    }

    #[test]
    fn test_point3_lerp() {
        let a = Point3::origin();
        let b = Point3::new(2.0, 4.0, 8.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), Point3::new(1.0, 2.0, 4.0));
    }

    #[test]
    fn test_bounding_box() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());
        assert!(!bbox.contains(&Point3::origin()));

        bbox.expand(&Point3::new(-1.0, 0.0, 2.0));
        bbox.expand(&Point3::new(1.0, 3.0, -2.0));
        assert!(!bbox.is_empty());

        assert!(bbox.contains(&Point3::new(0.0, 1.0, 0.0)));
        // 边界含.
        assert!(bbox.contains(&Point3::new(1.0, 3.0, 2.0)));
        assert!(!bbox.contains(&Point3::new(1.1, 0.0, 0.0)));

        assert_eq!(bbox.min(), Point3::new(-1.0, 0.0, -2.0));
        assert_eq!(bbox.max(), Point3::new(1.0, 3.0, 2.0));
    }
}
