//! 端到端流水线测试: 球形 phantom 的等值面重建, 以及
//! 轮廓 -> RBF 场 -> 掩膜 -> 第二遍重建的完整掩膜链路.

use iso_berry::prelude::*;
use ndarray::Array2;

/// 构建 `n` 张 `side x side` 的合成切片, HU 由 `hu` 给出
/// (参数为 `(列, 行, 切片序号)`).
fn synthetic_stack(n: usize, side: usize, hu: impl Fn(usize, usize, usize) -> i16) -> SliceStack {
    let mut stack = SliceStack::new();
    for k in 0..n {
        let mut data = Array2::<i16>::zeros((side, side));
        for ((row, col), p) in data.indexed_iter_mut() {
            *p = hu(col, row, k);
        }
        stack.insert(HuSlice::new(
            format!("slice-{k:03}"),
            k as i32,
            Point3::new(0.0, 0.0, k as f64),
            (1.0, 1.0),
            data,
        ));
    }
    stack
}

/// 以 (8, 8, 4) 为球心, 半径 3 的实心球 phantom.
fn sphere_stack() -> SliceStack {
    synthetic_stack(9, 16, |x, y, z| {
        let dx = x as f64 - 8.0;
        let dy = y as f64 - 8.0;
        let dz = z as f64 - 4.0;
        if dx * dx + dy * dy + dz * dz <= 9.0 {
            1000
        } else {
            -1000
        }
    })
}

#[test]
fn test_sphere_phantom_reconstruction() {
    simple_logger::SimpleLogger::new().init().ok();

    let mut stack = sphere_stack();
    let ReconstructedVolume { mesh, stats } = VolumeReconstructor::new(0.0)
        .reconstruct(&mut stack)
        .unwrap();

    log::info!(
        "sphere phantom: {} triangles over {} voxels",
        stats.triangle_count,
        stats.voxel_count
    );

    assert!(!mesh.is_empty());
    assert_eq!(stats.slice_count, 9);
    assert_eq!(stats.voxel_count, 16 * 16 * 9);
    assert_eq!(stats.triangle_count, mesh.len());

    // 居中后, 半径 3 的球面顶点应落在原点附近.
    for v in mesh.vertex_soup() {
        assert!(v.norm() <= 4.5, "vertex too far from origin: {v:?}");
    }

    // 顶点序列按 3 个一组成三角形.
    assert_eq!(mesh.vertex_soup().len(), stats.vertex_count());
}

/// 描述以 (8, 8, 4) 为中心, 半径 2 的八面体结构的轮廓定义.
const CONTOUR_TEXT: &str = "\
0 0 4
0
0
4
10 8 0
8 10 0
6 8 0
8 6 0
1
8
4
10 8 0
6 8 0
8 8 2
8 8 -2
2
8
4
8 10 0
8 6 0
8 8 2
8 8 -2
";

#[test]
fn test_masked_volume_pipeline() {
    simple_logger::SimpleLogger::new().init().ok();

    // 均匀背景体数据.
    let mut stack = synthetic_stack(9, 16, |_, _, _| -1000);

    let file = ContourFile::parse(CONTOUR_TEXT).unwrap();
    assert_eq!(file.reference_location(), 4);

    let mut field = RbfField::from_contours(&file).unwrap();
    // 6 个去重后的八面体顶点 + 1 个去重后的质心.
    assert_eq!(field.points().len(), 7);

    let mask = MaskVolume::rasterize_around(&mut field, &stack, 4, 2).unwrap();
    assert_eq!(mask.base_location(), 2);
    assert_eq!(mask.len(), 5);

    // 结构中心附近的体素必须被标记, 但掩膜远非全满.
    let inside = mask.inside_count();
    log::info!("mask covers {inside} voxels");
    assert!(inside >= 4, "mask too small: {inside}");
    assert!(inside < 16 * 16 * 5 / 2, "mask suspiciously large: {inside}");
    let central = mask.plane_at(4).unwrap();
    assert_eq!(central[(8, 8)], 1);

    // 覆写命中体素, 其余保持背景值.
    let overwritten = mask.apply_to_stack(&mut stack, MASK_FILL_HU);
    assert_eq!(overwritten, inside);
    let untouched = stack
        .get_at(4)
        .unwrap()
        .iter()
        .filter(|&&hu| hu == -1000)
        .count();
    assert_eq!(untouched, 16 * 16 - central.inside_count());

    // 第二遍重建提取掩膜结构自身的边界.
    let ReconstructedVolume { mesh, stats } = VolumeReconstructor::new(550.0)
        .reconstruct(&mut stack)
        .unwrap();
    log::info!("masked structure: {} triangles", stats.triangle_count);
    assert!(!mesh.is_empty());
}
