//! Procedural stand-ins for the demo's image assets

use std::f32::consts::{PI, TAU};
use glam::{Vec2, Vec3, Vec4};
use water_engine::water3d::device::{TextureDesc, TextureFormat, WrapMode};

const SKY_ZENITH: Vec3 = Vec3::new(0.18, 0.36, 0.75);
const SKY_HORIZON: Vec3 = Vec3::new(0.75, 0.85, 0.95);
const GROUND: Vec3 = Vec3::new(0.25, 0.23, 0.2);

/// Texels of a `width` x `height` image, bottom row first, from normalized coordinates
fn generate(width: u32, height: u32, texel: impl Fn(Vec2) -> Vec4) -> Vec<Vec4> {
    let size = Vec2::new(width as f32, height as f32);
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| texel((Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) / size))
        .collect()
}

/// Cheap hash noise in [0, 1)
fn hash(uv: Vec2) -> f32 {
    (uv.dot(Vec2::new(12.9898, 78.233)).sin() * 43758.547).fract().abs()
}

/// Equirectangular sky: gradient from horizon to zenith over a flat ground
pub fn sky(width: u32, height: u32) -> TextureDesc {
    let texels = generate(width, height, |uv| {
        let elevation = (uv.y - 0.5) * PI;
        let color = if elevation >= 0.0 {
            SKY_HORIZON.lerp(SKY_ZENITH, elevation.sin().sqrt())
        } else {
            SKY_HORIZON.lerp(GROUND, (-elevation.sin()).sqrt().min(1.0))
        };
        color.extend(1.0)
    });
    TextureDesc::from_texels(width, height, TextureFormat::Rgba8, texels).with_wrap(WrapMode::Repeat)
}

/// Deep blue-green with faint streaks
pub fn water_color(size: u32) -> TextureDesc {
    let texels = generate(size, size, |uv| {
        let streak = 0.5 + 0.5 * (uv.x * TAU * 3.0 + (uv.y * TAU).sin()).sin();
        (Vec3::new(0.02, 0.15, 0.22) + Vec3::new(0.02, 0.05, 0.06) * streak).extend(1.0)
    });
    TextureDesc::from_texels(size, size, TextureFormat::Rgba8, texels).with_wrap(WrapMode::Repeat)
}

/// Tangent-space normals of a sum of two ripple waves, packed to [0, 1]
pub fn water_normal(size: u32) -> TextureDesc {
    let texels = generate(size, size, |uv| {
        let (a, b) = (uv.x * TAU * 2.0, uv.y * TAU * 3.0);
        // derivatives of 0.08 sin(a) cos(b)
        let dx = 0.08 * a.cos() * b.cos() * 2.0;
        let dy = -0.08 * a.sin() * b.sin() * 3.0;
        let normal = Vec3::new(-dx, -dy, 1.0).normalize();
        (normal * 0.5 + Vec3::splat(0.5)).extend(1.0)
    });
    TextureDesc::from_texels(size, size, TextureFormat::Rgba8, texels).with_wrap(WrapMode::Repeat)
}

/// Swirling flow directions in RG around the texture centre, phase noise in A
pub fn water_flow(size: u32) -> TextureDesc {
    let texels = generate(size, size, |uv| {
        let offset = uv - Vec2::splat(0.5);
        let swirl = offset.perp().normalize_or_zero() * offset.length().min(0.5) * 2.0;
        let flow = swirl * 0.5 + Vec2::splat(0.5);
        Vec4::new(flow.x, flow.y, 0.0, hash(uv))
    });
    TextureDesc::from_texels(size, size, TextureFormat::Rgba8, texels).with_wrap(WrapMode::Repeat)
}
