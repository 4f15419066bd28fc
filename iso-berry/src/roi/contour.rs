//! 手绘轮廓: 平面方向, 轮廓集合与文本格式解析.

use std::ops::Index;

use crate::geom::Point3;

use super::error::{ParseError, ParseResult};

/// 轮廓所在的解剖平面方向.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PlaneAxis {
    /// 水平面 (垂直于扫描轴). 平面位置固定 z 坐标.
    Axial,

    /// 矢状面. 平面位置固定 y 坐标.
    Sagittal,

    /// 冠状面. 平面位置固定 x 坐标.
    Coronal,
}

impl PlaneAxis {
    /// 三个方向, 按方向码顺序.
    pub const ALL: [PlaneAxis; 3] = [Self::Axial, Self::Sagittal, Self::Coronal];

    /// 从文本格式中的方向码构建. 未知方向码返回 `None`.
    #[inline]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Axial),
            1 => Some(Self::Sagittal),
            2 => Some(Self::Coronal),
            _ => None,
        }
    }
}

/// 一条位于固定平面上的闭合轮廓.
///
/// 点被假定闭合 (首尾相连), 且名义上落在轮廓平面内:
/// 加入的点会被强制对齐到平面位置上.
#[derive(Clone, Debug)]
pub struct Contour {
    axis: PlaneAxis,
    plane_pos: f64,
    points: Vec<Point3>,
}

impl Contour {
    /// 创建空轮廓.
    #[inline]
    pub fn new(axis: PlaneAxis, plane_pos: f64) -> Self {
        Self {
            axis,
            plane_pos,
            points: Vec::with_capacity(20),
        }
    }

    /// 从既有点集创建轮廓. 每个点都会被对齐到平面位置.
    pub fn with_points<I: IntoIterator<Item = Point3>>(
        axis: PlaneAxis,
        plane_pos: f64,
        points: I,
    ) -> Self {
        let mut c = Self::new(axis, plane_pos);
        for p in points {
            c.add(p);
        }
        c
    }

    /// 将一个点对齐到轮廓平面: 依方向固定 z / y / x 坐标.
    fn sync_point(&self, mut p: Point3) -> Point3 {
        match self.axis {
            PlaneAxis::Axial => p.z = self.plane_pos,
            PlaneAxis::Sagittal => p.y = self.plane_pos,
            PlaneAxis::Coronal => p.x = self.plane_pos,
        }
        p
    }

    /// 加入一个点 (先对齐到平面).
    #[inline]
    pub fn add(&mut self, p: Point3) {
        let p = self.sync_point(p);
        self.points.push(p);
    }

    /// 平面方向.
    #[inline]
    pub fn axis(&self) -> PlaneAxis {
        self.axis
    }

    /// 平面位置.
    #[inline]
    pub fn plane_pos(&self) -> f64 {
        self.plane_pos
    }

    /// 轮廓上的点.
    #[inline]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// 轮廓点的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 轮廓是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 轮廓点的质心. 空轮廓返回 `None`.
    ///
    /// 对闭合轮廓而言, 质心落在轮廓平面内, 可作为结构内部的代表点.
    pub fn centroid(&self) -> Option<Point3> {
        if self.points.is_empty() {
            return None;
        }
        let mut acc = Point3::origin();
        for p in &self.points {
            acc += *p;
        }
        Some(acc * (1.0 / self.points.len() as f64))
    }
}

/// 按平面方向分组的轮廓集合.
#[derive(Clone, Debug, Default)]
pub struct ContourSet {
    axial: Vec<Contour>,
    sagittal: Vec<Contour>,
    coronal: Vec<Contour>,
}

impl ContourSet {
    /// 创建空集合.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 按轮廓自身的方向归组加入.
    pub fn add(&mut self, contour: Contour) {
        match contour.axis() {
            PlaneAxis::Axial => self.axial.push(contour),
            PlaneAxis::Sagittal => self.sagittal.push(contour),
            PlaneAxis::Coronal => self.coronal.push(contour),
        }
    }

    /// 某一方向上的所有轮廓.
    #[inline]
    pub fn contours(&self, axis: PlaneAxis) -> &[Contour] {
        match axis {
            PlaneAxis::Axial => &self.axial,
            PlaneAxis::Sagittal => &self.sagittal,
            PlaneAxis::Coronal => &self.coronal,
        }
    }

    /// 某一方向上所有轮廓的点数总和.
    #[inline]
    pub fn point_count(&self, axis: PlaneAxis) -> usize {
        self.contours(axis).iter().map(Contour::len).sum()
    }

    /// 某一方向上是否没有任何轮廓?
    #[inline]
    pub fn is_empty(&self, axis: PlaneAxis) -> bool {
        self.contours(axis).is_empty()
    }

    /// 迭代所有方向上的所有轮廓.
    pub fn iter_all(&self) -> impl Iterator<Item = &Contour> {
        self.axial
            .iter()
            .chain(self.sagittal.iter())
            .chain(self.coronal.iter())
    }
}

impl Index<PlaneAxis> for ContourSet {
    type Output = [Contour];

    #[inline]
    fn index(&self, axis: PlaneAxis) -> &Self::Output {
        self.contours(axis)
    }
}

/// 一份完整的轮廓定义: 统一平移向量 + 轮廓集合.
///
/// 文本格式为: 起始一行 `x y z` 平移向量, 随后重复的轮廓块, 每块依次为
/// 方向码行 (0/1/2), 平面位置行, 点数行, 以及点数行数的 `x y z` 记录.
#[derive(Clone, Debug)]
pub struct ContourFile {
    /// 施加于所有轮廓点的统一平移向量.
    pub shift: Point3,

    /// 轮廓集合.
    pub contours: ContourSet,
}

impl ContourFile {
    /// 解析文本格式的轮廓定义.
    ///
    /// 空行被忽略. 任何格式问题 (字段数不符, 数值不可解析, 未知方向码,
    /// 块被截断) 都会使整次解析失败.
    pub fn parse(text: &str) -> ParseResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(no, l)| (no + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        let (no, line) = lines.next().ok_or(ParseError::MissingShift)?;
        let shift = parse_point(line, no)?;

        let mut contours = ContourSet::new();
        while let Some((block_no, line)) = lines.next() {
            let code = parse_scalar::<i64>(line, block_no)?;
            let axis =
                PlaneAxis::from_code(code).ok_or(ParseError::BadDirection(code, block_no))?;

            let (no, line) = lines.next().ok_or(ParseError::TruncatedBlock(block_no))?;
            let plane_pos = parse_scalar::<f64>(line, no)?;

            let (no, line) = lines.next().ok_or(ParseError::TruncatedBlock(block_no))?;
            let count = parse_scalar::<usize>(line, no)?;

            let mut contour = Contour::new(axis, plane_pos);
            for _ in 0..count {
                let (no, line) = lines.next().ok_or(ParseError::TruncatedBlock(block_no))?;
                contour.add(parse_point(line, no)?);
            }
            contours.add(contour);
        }

        Ok(Self { shift, contours })
    }

    /// 由平移向量推导的参考切片序号 (z 分量四舍五入).
    ///
    /// 掩膜栅格化通常在该序号附近的有界 z 区间内进行.
    #[inline]
    pub fn reference_location(&self) -> i32 {
        self.shift.z.round() as i32
    }
}

/// 解析恰好一个数值的行.
fn parse_scalar<T: std::str::FromStr>(line: &str, no: usize) -> ParseResult<T> {
    let mut tokens = line.split_whitespace();
    let tok = tokens.next().ok_or(ParseError::BadRecord(no))?;
    if tokens.next().is_some() {
        return Err(ParseError::BadRecord(no));
    }
    tok.parse().map_err(|_| ParseError::BadNumber(no))
}

/// 解析恰好三个数值 (`x y z`) 的行.
fn parse_point(line: &str, no: usize) -> ParseResult<Point3> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let &[x, y, z] = tokens.as_slice() else {
        return Err(ParseError::BadRecord(no));
    };
    let parse = |t: &str| t.parse::<f64>().map_err(|_| ParseError::BadNumber(no));
    Ok(Point3::new(parse(x)?, parse(y)?, parse(z)?))
}
