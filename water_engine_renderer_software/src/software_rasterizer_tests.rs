//! Unit tests for coverage, fill rule and interpolation

use glam::{UVec2, Vec2, Vec3, Vec4};
use water_engine::water3d::device::MeshDesc;
use super::{rasterize_triangle, ClipVertex, Fragment};

fn vertex(x: f32, y: f32, z: f32, w: f32, uv: Vec2) -> ClipVertex {
    ClipVertex {
        clip: Vec4::new(x * w, y * w, z * w, w),
        world_position: Vec3::new(x, y, z),
        normal: Vec3::Z,
        uv,
    }
}

fn fullscreen_triangles() -> Vec<[ClipVertex; 3]> {
    let quad = MeshDesc::fullscreen_quad();
    let clip: Vec<ClipVertex> = quad
        .vertices
        .iter()
        .map(|v| vertex(v.position.x, v.position.y, v.position.z, 1.0, v.uv))
        .collect();
    quad.indices
        .chunks_exact(3)
        .map(|tri| [clip[tri[0] as usize], clip[tri[1] as usize], clip[tri[2] as usize]])
        .collect()
}

fn collect(triangle: &[ClipVertex; 3], width: u32, height: u32, cull_back: bool) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    rasterize_triangle(triangle, width, height, cull_back, |fragment| fragments.push(*fragment));
    fragments
}

#[test]
fn test_fullscreen_quad_covers_each_pixel_once() {
    let mut hits = vec![0u32; 5 * 3];
    for triangle in fullscreen_triangles() {
        for fragment in collect(&triangle, 5, 3, false) {
            hits[(fragment.pixel.y * 5 + fragment.pixel.x) as usize] += 1;
        }
    }
    assert!(hits.iter().all(|count| *count == 1), "hits: {:?}", hits);
}

#[test]
fn test_fullscreen_uv_and_depth() {
    let mut fragments: Vec<Fragment> = fullscreen_triangles()
        .iter()
        .flat_map(|triangle| collect(triangle, 4, 4, false))
        .collect();
    fragments.sort_by_key(|fragment| (fragment.pixel.y, fragment.pixel.x));

    let first = fragments[0];
    assert_eq!(first.pixel, UVec2::new(0, 0));
    assert!((first.uv - Vec2::new(0.125, 0.125)).abs().max_element() < 1e-5);
    assert!((first.depth - 0.5).abs() < 1e-6);
    assert!(first.front_facing);
}

#[test]
fn test_clockwise_triangle_is_back_facing() {
    let triangle = [
        vertex(-1.0, -1.0, 0.0, 1.0, Vec2::ZERO),
        vertex(-1.0, 1.0, 0.0, 1.0, Vec2::ZERO),
        vertex(1.0, -1.0, 0.0, 1.0, Vec2::ZERO),
    ];
    let fragments = collect(&triangle, 4, 4, false);
    assert!(!fragments.is_empty());
    assert!(fragments.iter().all(|fragment| !fragment.front_facing));

    assert!(collect(&triangle, 4, 4, true).is_empty());
}

#[test]
fn test_vertex_behind_eye_skips_triangle() {
    let mut triangle = fullscreen_triangles()[0];
    triangle[1].clip.w = -1.0;
    assert!(collect(&triangle, 4, 4, false).is_empty());
}

#[test]
fn test_fragments_outside_depth_range_are_clipped() {
    let triangle = [
        vertex(-1.0, -1.0, 1.5, 1.0, Vec2::ZERO),
        vertex(1.0, -1.0, 1.5, 1.0, Vec2::ZERO),
        vertex(1.0, 1.0, 1.5, 1.0, Vec2::ZERO),
    ];
    assert!(collect(&triangle, 4, 4, false).is_empty());
}

#[test]
fn test_degenerate_triangle_emits_nothing() {
    let triangle = [
        vertex(-1.0, -1.0, 0.0, 1.0, Vec2::ZERO),
        vertex(0.0, 0.0, 0.0, 1.0, Vec2::ZERO),
        vertex(1.0, 1.0, 0.0, 1.0, Vec2::ZERO),
    ];
    assert!(collect(&triangle, 4, 4, false).is_empty());
}

#[test]
fn test_uv_interpolation_is_perspective_correct() {
    // Left edge at w = 1, right edge at w = 3; NDC positions match the fullscreen quad
    let left = |y: f32, v: f32| vertex(-1.0, y, 0.0, 1.0, Vec2::new(0.0, v));
    let right = |y: f32, v: f32| vertex(1.0, y, 0.0, 3.0, Vec2::new(1.0, v));
    let triangles = [
        [left(-1.0, 0.0), right(-1.0, 0.0), right(1.0, 1.0)],
        [left(-1.0, 0.0), right(1.0, 1.0), left(1.0, 1.0)],
    ];

    let mut fragments: Vec<Fragment> = triangles
        .iter()
        .flat_map(|triangle| collect(triangle, 4, 1, false))
        .collect();
    fragments.sort_by_key(|fragment| fragment.pixel.x);
    assert_eq!(fragments.len(), 4);

    for fragment in fragments {
        let t = (fragment.pixel.x as f32 + 0.5) / 4.0;
        let expected = (t / 3.0) / ((1.0 - t) + t / 3.0);
        assert!(
            (fragment.uv.x - expected).abs() < 1e-4,
            "pixel {}: {} vs {}",
            fragment.pixel.x,
            fragment.uv.x,
            expected
        );
    }
}

#[test]
fn test_partial_triangle_respects_viewport() {
    // Extends far outside the viewport
    let triangle = [
        vertex(-3.0, -3.0, 0.0, 1.0, Vec2::ZERO),
        vertex(3.0, -3.0, 0.0, 1.0, Vec2::ZERO),
        vertex(0.0, 3.0, 0.0, 1.0, Vec2::ZERO),
    ];
    let fragments = collect(&triangle, 2, 2, false);
    assert!(fragments.iter().all(|fragment| fragment.pixel.x < 2 && fragment.pixel.y < 2));
}
