use super::*;
use glam::{Mat4, Vec2, Vec3};
use slotmap::SlotMap;
use water_engine::water3d::device::{TextureHandle, UniformValue};
use water_engine::water3d::render::{Camera, Light, LightType};
use crate::software_program::{FragmentInput, FragmentOutput, ShadeContext, SoftwareProgram, VertexStage};
use crate::software_texture::SoftwareTexture;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn discard(_: &ShadeContext<'_>, _: &FragmentInput) -> Option<FragmentOutput> {
    None
}

/// Program declaring the uniforms of `capacity` light slots, loaded with `lights`
fn light_uniforms(capacity: usize, lights: &[Light], indirect: bool) -> Uniforms {
    let names = uniforms::light_uniform_names(capacity);
    let mut program = SoftwareProgram::new("lights", names, VertexStage::Fullscreen, discard);

    let mut set = |name: &str, value: UniformValue| {
        let location = program.location(name).unwrap();
        assert!(program.set(location, value));
    };
    set(uniforms::LIGHT_INDIRECT, UniformValue::Int(indirect as i32));
    set(uniforms::LIGHT_COUNT, UniformValue::Int(lights.len() as i32));
    for (index, light) in lights.iter().enumerate() {
        set(&uniforms::indexed(uniforms::LIGHT_TYPE, index, capacity), UniformValue::Int(light.light_type() as i32));
        set(&uniforms::indexed(uniforms::LIGHT_COLOR, index, capacity), UniformValue::Vec3(light.radiance()));
        set(&uniforms::indexed(uniforms::LIGHT_POSITION, index, capacity), UniformValue::Vec3(light.position()));
        set(&uniforms::indexed(uniforms::LIGHT_DIRECTION, index, capacity), UniformValue::Vec3(light.direction()));
        set(&uniforms::indexed(uniforms::LIGHT_ATTENUATION, index, capacity), UniformValue::Vec4(light.attenuation()));
    }
    program.uniforms()
}

// ============================================================================
// Lights
// ============================================================================

#[test]
fn test_smoothstep_edges() {
    assert_eq!(smoothstep(1.0, 2.0, 0.5), 0.0);
    assert_eq!(smoothstep(1.0, 2.0, 3.0), 1.0);
    assert!(approx(smoothstep(1.0, 2.0, 1.5), 0.5));
    assert_eq!(smoothstep(2.0, 2.0, 1.0), 0.0);
    assert_eq!(smoothstep(2.0, 2.0, 2.0), 1.0);
}

#[test]
fn test_directional_light_lambert() {
    let uniforms = light_uniforms(1, &[Light::directional(Vec3::new(0.0, -1.0, 0.0)).with_intensity(2.0)], false);
    let textures: SlotMap<TextureHandle, SoftwareTexture> = SlotMap::with_key();
    let ctx = ShadeContext::new(&uniforms, &textures);
    let slots = LightSlots::new(1);

    let up = slots.shade(&ctx, Vec3::ZERO, Vec3::Y, Vec3::ONE);
    assert!(approx(up.x, 2.0));

    let facing_away = slots.shade(&ctx, Vec3::ZERO, -Vec3::Y, Vec3::ONE);
    assert_eq!(facing_away, Vec3::ZERO);
}

#[test]
fn test_indirect_only_when_flagged() {
    let textures: SlotMap<TextureHandle, SoftwareTexture> = SlotMap::with_key();
    let slots = LightSlots::new(2);

    let lit = light_uniforms(2, &[], true);
    let ctx = ShadeContext::new(&lit, &textures);
    assert!(approx(slots.shade(&ctx, Vec3::ZERO, Vec3::Y, Vec3::ONE).y, AMBIENT));

    let unlit = light_uniforms(2, &[], false);
    let ctx = ShadeContext::new(&unlit, &textures);
    assert_eq!(slots.shade(&ctx, Vec3::ZERO, Vec3::Y, Vec3::ONE), Vec3::ZERO);
}

#[test]
fn test_point_light_distance_falloff() {
    let light = Light::point(Vec3::new(0.0, 1.0, 0.0), Vec2::new(2.0, 4.0));
    let uniforms = light_uniforms(2, &[light], false);
    let textures: SlotMap<TextureHandle, SoftwareTexture> = SlotMap::with_key();
    let ctx = ShadeContext::new(&uniforms, &textures);
    let slots = LightSlots::new(2);

    let near = slots.shade(&ctx, Vec3::ZERO, Vec3::Y, Vec3::ONE);
    assert!(approx(near.x, 1.0));

    let far = slots.shade(&ctx, Vec3::new(0.0, -4.0, 0.0), Vec3::Y, Vec3::ONE);
    assert_eq!(far, Vec3::ZERO);
}

#[test]
fn test_spot_light_cone() {
    let light = Light::spot(
        Vec3::new(0.0, 5.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec2::new(5.0, 10.0),
        Vec2::new(0.1, 0.4),
    );
    assert_eq!(light.light_type(), LightType::Spot);
    let uniforms = light_uniforms(1, &[light], false);
    let textures: SlotMap<TextureHandle, SoftwareTexture> = SlotMap::with_key();
    let ctx = ShadeContext::new(&uniforms, &textures);
    let slots = LightSlots::new(1);

    let centre = slots.shade(&ctx, Vec3::ZERO, Vec3::Y, Vec3::ONE);
    assert!(approx(centre.x, 1.0));

    // atan(4 / 5) is well outside the 0.4 rad cone
    let outside = slots.shade(&ctx, Vec3::new(4.0, 0.0, 0.0), Vec3::Y, Vec3::ONE);
    assert_eq!(outside, Vec3::ZERO);
}

#[test]
fn test_light_count_limits_slots() {
    let lights = [
        Light::directional(-Vec3::Y),
        Light::directional(-Vec3::Y),
    ];
    let mut uniforms_two = light_uniforms(2, &lights, false);
    let textures: SlotMap<TextureHandle, SoftwareTexture> = SlotMap::with_key();
    let slots = LightSlots::new(2);
    let both = slots.shade(&ShadeContext::new(&uniforms_two, &textures), Vec3::ZERO, Vec3::Y, Vec3::ONE);
    assert!(approx(both.x, 2.0));

    uniforms_two = light_uniforms(2, &lights[..1], false);
    let one = slots.shade(&ShadeContext::new(&uniforms_two, &textures), Vec3::ZERO, Vec3::Y, Vec3::ONE);
    assert!(approx(one.x, 1.0));
}

// ============================================================================
// Geometry helpers
// ============================================================================

#[test]
fn test_equirect_poles_and_horizon() {
    assert!(approx(equirect_uv(Vec3::Y).y, 1.0));
    assert!(approx(equirect_uv(-Vec3::Y).y, 0.0));
    let forward = equirect_uv(Vec3::X);
    assert!(approx(forward.x, 0.5));
    assert!(approx(forward.y, 0.5));
}

#[test]
fn test_world_position_round_trips_camera() {
    let mut camera = Camera::new(Mat4::IDENTITY, Mat4::IDENTITY);
    camera.set_view_look_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
    camera.set_perspective(1.0, 1.0, 0.1, 100.0);

    let point = Vec3::new(0.3, 0.2, -0.1);
    let clip = camera.view_projection_matrix() * point.extend(1.0);
    let ndc = clip.truncate() / clip.w;
    let screen_uv = Vec2::new(ndc.x, ndc.y) * 0.5 + Vec2::splat(0.5);
    let depth = ndc.z * 0.5 + 0.5;

    let rebuilt = world_position(
        camera.inverse_view_matrix(),
        camera.inverse_projection_matrix(),
        screen_uv,
        depth,
    );
    assert!((rebuilt - point).length() < 1e-3);
}

#[test]
fn test_view_ray_centre_looks_forward() {
    let ray = view_ray(Mat4::IDENTITY, Mat4::perspective_rh_gl(1.0, 1.0, 0.1, 100.0).inverse(), Vec2::splat(0.5));
    assert!((ray - Vec3::NEG_Z).length() < 1e-4);
}

#[test]
fn test_flow_phases_weights_sum_to_one() {
    for step in 0..10 {
        let time = step as f32 * 0.13;
        let a = flow_uvw(Vec2::ZERO, Vec2::ZERO, Vec2::ZERO, 0.0, 1.0, time, false);
        let b = flow_uvw(Vec2::ZERO, Vec2::ZERO, Vec2::ZERO, 0.0, 1.0, time, true);
        assert!(approx(a.z + b.z, 1.0));
    }
}

#[test]
fn test_flow_moves_against_flow_vector() {
    let start = flow_uvw(Vec2::splat(0.5), Vec2::new(0.2, 0.0), Vec2::ZERO, 0.0, 1.0, 0.0, false);
    let later = flow_uvw(Vec2::splat(0.5), Vec2::new(0.2, 0.0), Vec2::ZERO, 0.0, 1.0, 0.5, false);
    assert!(approx(start.x, 0.5));
    assert!(approx(later.x, 0.4));
    assert!(approx(later.z, 1.0));
}

#[test]
fn test_fresnel_range() {
    assert!(approx(fresnel(0.0, 1.0), 0.0));
    assert!(approx(fresnel(0.0, 0.0), 1.0));
    assert!(approx(fresnel(0.8, 1.0), 0.8));
}
