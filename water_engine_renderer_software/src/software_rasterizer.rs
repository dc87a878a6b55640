/// Triangle rasterizer
///
/// Clip space to window space with GL conventions: pixel (0, 0) is the
/// bottom-left pixel, pixel centres sit at half-integers and window depth
/// maps NDC z from [-1, 1] to [0, 1]. Coverage uses edge functions with the
/// top-left fill rule, so triangles sharing an edge never touch a pixel
/// twice. Varyings are interpolated perspective-correct; depth is linear in
/// window space.

use glam::{UVec2, Vec2, Vec3, Vec4};

/// Minimum clip w for a vertex to be rasterized
const MIN_CLIP_W: f32 = 1e-5;

/// Vertex stage output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    pub clip: Vec4,
    pub world_position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

/// One covered pixel with interpolated varyings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub pixel: UVec2,
    pub depth: f32,
    pub world_position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub front_facing: bool,
}

struct WindowVertex {
    position: Vec2,
    depth: f32,
    inv_w: f32,
}

fn to_window(vertex: &ClipVertex, size: Vec2) -> WindowVertex {
    let inv_w = 1.0 / vertex.clip.w;
    let ndc = vertex.clip.truncate() * inv_w;
    WindowVertex {
        position: (ndc.truncate() * 0.5 + Vec2::splat(0.5)) * size,
        depth: ndc.z * 0.5 + 0.5,
        inv_w,
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Top or left edge of a counter-clockwise triangle (y up)
fn is_top_left(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    (d.y == 0.0 && d.x < 0.0) || d.y < 0.0
}

/// Rasterize one triangle into a `width` x `height` viewport
///
/// Triangles with a vertex at or behind the eye (w <= 0) are skipped whole.
/// Counter-clockwise triangles in window space are front-facing; with
/// `cull_back` the others are dropped. Fragments whose depth falls outside
/// [0, 1] are clipped.
pub fn rasterize_triangle(
    vertices: &[ClipVertex; 3],
    width: u32,
    height: u32,
    cull_back: bool,
    mut emit: impl FnMut(&Fragment),
) {
    if vertices.iter().any(|vertex| vertex.clip.w <= MIN_CLIP_W) {
        return;
    }

    let size = Vec2::new(width as f32, height as f32);
    let window = [
        to_window(&vertices[0], size),
        to_window(&vertices[1], size),
        to_window(&vertices[2], size),
    ];

    let area = edge(window[0].position, window[1].position, window[2].position);
    if area == 0.0 || !area.is_finite() {
        return;
    }
    let front_facing = area > 0.0;
    if cull_back && !front_facing {
        return;
    }

    // Work on a counter-clockwise ordering so the fill rule is orientation independent
    let order: [usize; 3] = if front_facing { [0, 1, 2] } else { [0, 2, 1] };
    let p = [
        window[order[0]].position,
        window[order[1]].position,
        window[order[2]].position,
    ];
    let area = area.abs();

    let min = p[0].min(p[1]).min(p[2]).floor().max(Vec2::ZERO);
    let max = p[0].max(p[1]).max(p[2]).ceil().min(size);
    if min.x >= max.x || min.y >= max.y {
        return;
    }

    // Edge i is opposite vertex i
    let edges = [(p[1], p[2]), (p[2], p[0]), (p[0], p[1])];
    let top_left = edges.map(|(a, b)| is_top_left(a, b));

    for y in (min.y as u32)..(max.y as u32) {
        for x in (min.x as u32)..(max.x as u32) {
            let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);

            let mut weights = [0.0f32; 3];
            let mut covered = true;
            for (i, (a, b)) in edges.iter().enumerate() {
                let w = edge(*a, *b, centre);
                if w < 0.0 || (w == 0.0 && !top_left[i]) {
                    covered = false;
                    break;
                }
                weights[i] = w / area;
            }
            if !covered {
                continue;
            }

            // Weights back in the caller's vertex order
            let mut lambda = [0.0f32; 3];
            for (i, vertex_index) in order.iter().enumerate() {
                lambda[*vertex_index] = weights[i];
            }

            // Relative to vertex 0 so a constant-depth triangle stays exact
            let depth = window[0].depth
                + lambda[1] * (window[1].depth - window[0].depth)
                + lambda[2] * (window[2].depth - window[0].depth);
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }

            let perspective = [
                lambda[0] * window[0].inv_w,
                lambda[1] * window[1].inv_w,
                lambda[2] * window[2].inv_w,
            ];
            let inv_w_sum = perspective[0] + perspective[1] + perspective[2];
            let k = [
                perspective[0] / inv_w_sum,
                perspective[1] / inv_w_sum,
                perspective[2] / inv_w_sum,
            ];

            emit(&Fragment {
                pixel: UVec2::new(x, y),
                depth,
                world_position: vertices[0].world_position * k[0]
                    + vertices[1].world_position * k[1]
                    + vertices[2].world_position * k[2],
                normal: vertices[0].normal * k[0] + vertices[1].normal * k[1] + vertices[2].normal * k[2],
                uv: vertices[0].uv * k[0] + vertices[1].uv * k[1] + vertices[2].uv * k[2],
                front_facing,
            });
        }
    }
}

#[cfg(test)]
#[path = "software_rasterizer_tests.rs"]
mod tests;
