//! 切片集合: 按标识符与扫描轴序号双索引的 CT 切片容器.

use std::collections::HashMap;

use super::HuSlice;

/// 已排序切片视图. 由 [`SliceStack::build_sorted`] 构建.
#[derive(Debug, Clone)]
struct SortedView {
    /// 升序排列的 arena 索引.
    order: Vec<usize>,

    /// 第一处序号缺口 `(前, 后)`. `None` 表示序号严格连续.
    gap: Option<(i32, i32)>,
}

/// CT 切片的有序集合.
///
/// 切片以 arena 方式被独占持有, 外部通过来源标识符或扫描轴序号查询.
/// 等值面提取要求切片序号严格连续 (相邻序号恰好相差 1),
/// [`Self::build_sorted`] 负责检测缺口并将结果报告给调用者.
///
/// # 注意
///
/// 每个扫描轴序号至多对应一张切片, 因此排序不存在 "平局" 情形.
#[derive(Debug, Clone, Default)]
pub struct SliceStack {
    /// 切片本体. 其它字段仅保存进入该 `Vec` 的索引.
    slices: Vec<HuSlice>,

    by_id: HashMap<String, usize>,
    by_location: HashMap<i32, usize>,

    /// 惰性构建的排序视图. 任何插入都会使其失效.
    sorted: Option<SortedView>,
}

impl SliceStack {
    /// 创建空集合.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一张切片, 同时按标识符与序号建立索引.
    ///
    /// 如果该序号 (或标识符) 已存在, 则原切片被替换.
    /// 返回本次插入是否发生了 **序号** 碰撞 (即替换).
    ///
    /// 该操作总是使已构建的排序视图失效.
    pub fn insert(&mut self, slice: HuSlice) -> bool {
        self.sorted = None;

        let location = slice.location();
        let collided = self.by_location.contains_key(&location);

        if let Some(&idx) = self.by_location.get(&location) {
            // 序号被占用: 覆写原 arena 槽位, 并迁移标识符索引.
            let old_id = self.slices[idx].id().to_owned();
            if old_id != slice.id() {
                self.by_id.remove(&old_id);
            }
            self.by_id.insert(slice.id().to_owned(), idx);
            self.slices[idx] = slice;
        } else if let Some(&idx) = self.by_id.get(slice.id()) {
            // 同一来源换了序号: 迁移序号索引.
            let old_location = self.slices[idx].location();
            self.by_location.remove(&old_location);
            self.by_location.insert(location, idx);
            self.slices[idx] = slice;
        } else {
            let idx = self.slices.len();
            self.by_id.insert(slice.id().to_owned(), idx);
            self.by_location.insert(location, idx);
            self.slices.push(slice);
        }

        collided
    }

    /// 按来源标识符查询切片. 不存在时返回 `None`.
    #[inline]
    pub fn get(&self, id: &str) -> Option<&HuSlice> {
        self.by_id.get(id).map(|&idx| &self.slices[idx])
    }

    /// 按扫描轴序号查询切片. 不存在时返回 `None`.
    #[inline]
    pub fn get_at(&self, location: i32) -> Option<&HuSlice> {
        self.by_location.get(&location).map(|&idx| &self.slices[idx])
    }

    /// 按扫描轴序号查询切片, 并可就地修改. 不存在时返回 `None`.
    #[inline]
    pub fn get_at_mut(&mut self, location: i32) -> Option<&mut HuSlice> {
        let idx = *self.by_location.get(&location)?;
        Some(&mut self.slices[idx])
    }

    /// 集合内的切片个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// 集合是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// 以 arena 存储序迭代所有切片.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &HuSlice> {
        self.slices.iter()
    }

    /// 构建按扫描轴序号升序排列的切片视图, 并检测序号缺口.
    ///
    /// 当任何相邻两张切片的序号之差不为 1 时返回 `false`.
    /// 此时排序视图仍然被保留 (供诊断), 但被标记为不连续;
    /// 等值面重建会拒绝这样的输入.
    pub fn build_sorted(&mut self) -> bool {
        let mut order: Vec<usize> = (0..self.slices.len()).collect();
        order.sort_unstable_by_key(|&idx| self.slices[idx].location());

        let gap = order
            .windows(2)
            .map(|w| (self.slices[w[0]].location(), self.slices[w[1]].location()))
            .find(|(prev, next)| next - prev != 1);

        let contiguous = gap.is_none();
        self.sorted = Some(SortedView { order, gap });
        contiguous
    }

    /// 排序视图是否已构建?
    #[inline]
    pub fn is_built(&self) -> bool {
        self.sorted.is_some()
    }

    /// 已构建的排序视图是否连续? 未构建时返回 `None`.
    #[inline]
    pub fn is_contiguous(&self) -> Option<bool> {
        self.sorted.as_ref().map(|s| s.gap.is_none())
    }

    /// 返回第一处序号缺口 `(前, 后)`. 未构建或无缺口时返回 `None`.
    #[inline]
    pub fn gap(&self) -> Option<(i32, i32)> {
        self.sorted.as_ref().and_then(|s| s.gap)
    }

    /// 按升序迭代排序视图中的切片. 未构建时返回 `None`.
    pub fn sorted_iter(&self) -> Option<impl Iterator<Item = &HuSlice>> {
        let view = self.sorted.as_ref()?;
        Some(view.order.iter().map(|&idx| &self.slices[idx]))
    }

    /// 排序视图中的 arena 索引.
    #[inline]
    pub(crate) fn sorted_order(&self) -> Option<&[usize]> {
        self.sorted.as_ref().map(|s| s.order.as_slice())
    }

    /// 获取 arena 中第 `idx` 个切片.
    #[inline]
    pub(crate) fn nth(&self, idx: usize) -> &HuSlice {
        &self.slices[idx]
    }

    /// 获取 arena 中第 `idx` 个切片, 并可就地修改.
    ///
    /// 注意该操作 **不会** 使排序视图失效: 序号本身只能经由
    /// [`Self::insert`] 改变.
    #[inline]
    pub(crate) fn nth_mut(&mut self, idx: usize) -> &mut HuSlice {
        &mut self.slices[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::SliceStack;
    use crate::geom::Point3;
    use crate::HuSlice;
    use ndarray::Array2;

    fn tiny(id: &str, location: i32) -> HuSlice {
        HuSlice::new(
            id,
            location,
            Point3::origin(),
            (1.0, 1.0),
            Array2::<i16>::zeros((2, 2)),
        )
    }

    #[test]
    fn test_insert_and_retrieve() {
        let mut stack = SliceStack::new();
        assert!(!stack.insert(tiny("a", 0)));
        assert!(!stack.insert(tiny("b", 1)));
        assert_eq!(stack.len(), 2);

        assert_eq!(stack.get("a").unwrap().location(), 0);
        assert_eq!(stack.get_at(1).unwrap().id(), "b");
        assert!(stack.get("c").is_none());
        assert!(stack.get_at(7).is_none());
    }

    #[test]
    fn test_insert_location_collision() {
        let mut stack = SliceStack::new();
        assert!(!stack.insert(tiny("a", 0)));
        // 同一序号再次插入: 替换, 且旧标识符索引被移除.
        assert!(stack.insert(tiny("a2", 0)));
        assert_eq!(stack.len(), 1);
        assert!(stack.get("a").is_none());
        assert_eq!(stack.get_at(0).unwrap().id(), "a2");
    }

    #[test]
    fn test_insert_relocated_id() {
        let mut stack = SliceStack::new();
        stack.insert(tiny("a", 0));
        // 同一来源换序号: 不算序号碰撞.
        assert!(!stack.insert(tiny("a", 5)));
        assert_eq!(stack.len(), 1);
        assert!(stack.get_at(0).is_none());
        assert_eq!(stack.get("a").unwrap().location(), 5);
    }

    #[test]
    fn test_build_sorted_contiguous() {
        // 任意插入顺序.
        for order in [[0, 1, 2, 3], [3, 1, 0, 2], [2, 0, 3, 1]] {
            let mut stack = SliceStack::new();
            for loc in order {
                stack.insert(tiny(&format!("s{loc}"), loc));
            }
            assert!(stack.build_sorted());
            assert_eq!(stack.is_contiguous(), Some(true));
            let locs: Vec<i32> = stack
                .sorted_iter()
                .unwrap()
                .map(|s| s.location())
                .collect();
            assert_eq!(locs, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_build_sorted_gap() {
        let mut stack = SliceStack::new();
        for loc in [0, 1, 3] {
            stack.insert(tiny(&format!("s{loc}"), loc));
        }
        assert!(!stack.build_sorted());
        assert_eq!(stack.is_contiguous(), Some(false));
        assert_eq!(stack.gap(), Some((1, 3)));
        // 排序视图仍然可供诊断.
        assert_eq!(stack.sorted_iter().unwrap().count(), 3);
    }

    #[test]
    fn test_insert_invalidates_sorted() {
        let mut stack = SliceStack::new();
        stack.insert(tiny("a", 0));
        stack.insert(tiny("b", 1));
        assert!(stack.build_sorted());
        stack.insert(tiny("c", 5));
        assert!(!stack.is_built());
        assert_eq!(stack.is_contiguous(), None);
    }
}
