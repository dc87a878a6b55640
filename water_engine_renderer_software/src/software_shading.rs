/// Shading math shared by the stock programs

use std::f32::consts::PI;
use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};
use water_engine::water3d::render::LightType;
use water_engine::water3d::uniforms;
use crate::software_program::{ShadeContext, Uniforms};

/// Indirect light used when no environment texture is bound
pub const AMBIENT: f32 = 0.1;

/// Scale of the environment lookup used as indirect light
pub const ENVIRONMENT_AMBIENT: f32 = 0.25;

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

// ============================================================================
// Lights
// ============================================================================

/// Uniform names of one light slot
#[derive(Debug, Clone)]
struct LightSlot {
    kind: String,
    color: String,
    position: String,
    direction: String,
    attenuation: String,
}

/// Light uniforms a program with `capacity` slots reads
#[derive(Debug, Clone)]
pub struct LightSlots {
    slots: Vec<LightSlot>,
}

impl LightSlots {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let slots = (0..capacity)
            .map(|index| LightSlot {
                kind: uniforms::indexed(uniforms::LIGHT_TYPE, index, capacity),
                color: uniforms::indexed(uniforms::LIGHT_COLOR, index, capacity),
                position: uniforms::indexed(uniforms::LIGHT_POSITION, index, capacity),
                direction: uniforms::indexed(uniforms::LIGHT_DIRECTION, index, capacity),
                attenuation: uniforms::indexed(uniforms::LIGHT_ATTENUATION, index, capacity),
            })
            .collect();
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Diffuse light reaching `position` summed over the active slots
    ///
    /// `LightIndirect` adds the ambient term, so it is only counted once per
    /// surface however many batches the lights are split into.
    pub fn shade(
        &self,
        ctx: &ShadeContext<'_>,
        position: Vec3,
        normal: Vec3,
        albedo: Vec3,
    ) -> Vec3 {
        let u = ctx.uniforms;
        let count = usize::try_from(u.int(uniforms::LIGHT_COUNT)).unwrap_or(0);
        let normal = normal.normalize_or_zero();

        let mut radiance = Vec3::ZERO;
        for slot in self.slots.iter().take(count) {
            radiance += slot_radiance(u, slot, position, normal);
        }

        let mut color = albedo * radiance;
        if u.int(uniforms::LIGHT_INDIRECT) != 0 {
            color += albedo * indirect_light(ctx, normal);
        }
        color
    }
}

fn slot_radiance(u: &Uniforms, slot: &LightSlot, position: Vec3, normal: Vec3) -> Vec3 {
    let color = u.vec3(&slot.color);
    let attenuation = u.vec4(&slot.attenuation);
    let kind = u.int(&slot.kind);

    let (to_light, falloff) = if kind == LightType::Directional as i32 {
        (-u.vec3(&slot.direction).normalize_or_zero(), 1.0)
    } else {
        let offset = u.vec3(&slot.position) - position;
        let distance = offset.length();
        let to_light = offset.normalize_or_zero();
        let mut falloff = 1.0 - smoothstep(attenuation.x, attenuation.y, distance);
        if kind == LightType::Spot as i32 {
            let axis = u.vec3(&slot.direction).normalize_or_zero();
            let angle = (-to_light).dot(axis).clamp(-1.0, 1.0).acos();
            falloff *= 1.0 - smoothstep(attenuation.z, attenuation.w, angle);
        }
        (to_light, falloff)
    };

    color * normal.dot(to_light).max(0.0) * falloff
}

fn indirect_light(ctx: &ShadeContext<'_>, normal: Vec3) -> Vec3 {
    if ctx.has_texture(uniforms::ENVIRONMENT_TEXTURE) {
        let sky = ctx.sample(uniforms::ENVIRONMENT_TEXTURE, equirect_uv(normal));
        sky.xyz() * ENVIRONMENT_AMBIENT
    } else {
        Vec3::splat(AMBIENT)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Equirectangular coordinates of a world direction, +Y at v = 1
pub fn equirect_uv(direction: Vec3) -> Vec2 {
    let direction = direction.normalize_or_zero();
    Vec2::new(
        direction.z.atan2(direction.x) / (2.0 * PI) + 0.5,
        direction.y.clamp(-1.0, 1.0).asin() / PI + 0.5,
    )
}

// ============================================================================
// Position reconstruction
// ============================================================================

/// View-space position of a fragment from its screen uv and window depth
pub fn view_position(inv_proj: Mat4, screen_uv: Vec2, depth: f32) -> Vec3 {
    let ndc = Vec4::new(screen_uv.x * 2.0 - 1.0, screen_uv.y * 2.0 - 1.0, depth * 2.0 - 1.0, 1.0);
    let view = inv_proj * ndc;
    if view.w.abs() <= f32::EPSILON {
        return view.xyz();
    }
    view.xyz() / view.w
}

pub fn world_position(inv_view: Mat4, inv_proj: Mat4, screen_uv: Vec2, depth: f32) -> Vec3 {
    inv_view.transform_point3(view_position(inv_proj, screen_uv, depth))
}

/// World direction through a pixel, from the camera into the scene
pub fn view_ray(inv_view: Mat4, inv_proj: Mat4, screen_uv: Vec2) -> Vec3 {
    let far = view_position(inv_proj, screen_uv, 1.0);
    inv_view.transform_vector3(far).normalize_or_zero()
}

// ============================================================================
// Flow mapping
// ============================================================================

/// Distorted uv and blend weight for one of the two flow phases
///
/// The phases are half a period apart; their weights always sum to one so the
/// reset of each phase is hidden by the other.
pub fn flow_uvw(
    uv: Vec2,
    flow: Vec2,
    jump: Vec2,
    flow_offset: f32,
    tiling: f32,
    time: f32,
    phase_b: bool,
) -> Vec3 {
    let phase = if phase_b { 0.5 } else { 0.0 };
    let progress = (time + phase).fract();
    let mut distorted = uv - flow * (progress + flow_offset);
    distorted *= tiling;
    distorted += Vec2::splat(phase);
    distorted += (time - progress) * jump;
    distorted.extend(1.0 - (1.0 - 2.0 * progress).abs())
}

/// Schlick approximation, `f0` the reflectance at normal incidence
pub fn fresnel(f0: f32, cos_theta: f32) -> f32 {
    f0 + (1.0 - f0) * (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5)
}

#[cfg(test)]
#[path = "software_shading_tests.rs"]
mod tests;
