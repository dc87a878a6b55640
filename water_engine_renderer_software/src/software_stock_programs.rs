/// Stock CPU programs for the water pipeline and the demo scene
///
/// Every program declares the uniforms its material and updaters write, so a
/// `Material` built against it validates. Stateless programs are plain
/// functions; the lit ones carry their light slot names.

use glam::{UVec2, Vec2, Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};
use water_engine::water3d::device::ProgramHandle;
use water_engine::water3d::pipeline::{ShowType, WaterPrograms};
use water_engine::water3d::uniforms::{self, *};
use crate::software_device::SoftwareGraphicsDevice;
use crate::software_program::{
    FragmentInput, FragmentOutput, FragmentProgram, ShadeContext, SoftwareProgram, VertexStage,
};
use crate::software_shading::{
    equirect_uv, flow_uvw, fresnel, view_position, view_ray, world_position, LightSlots,
};

/// Gaussian taps, centre first
pub const BLUR_WEIGHTS: [f32; 5] = [0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216];

/// Surface parameters written to the `others` target by opaque geometry
pub const OPAQUE_SURFACE: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);

pub const WATER_REFLECTIVITY: f32 = 0.8;
pub const WATER_ROUGHNESS: f32 = 0.1;

fn declare(groups: &[&[&str]], extra: Vec<String>) -> Vec<String> {
    let mut names: Vec<String> = groups
        .iter()
        .flat_map(|group| group.iter().map(|name| name.to_string()))
        .collect();
    names.extend(extra);
    names
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * incident.dot(normal) * normal
}

// ============================================================================
// Post-processing
// ============================================================================

fn copy(ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
    Some(FragmentOutput::color(ctx.sample(SOURCE_TEXTURE, input.screen_uv)))
}

/// Sample `SourceTexture` into draw buffer 0
pub fn copy_program() -> SoftwareProgram {
    SoftwareProgram::new("copy", declare(&[&[SOURCE_TEXTURE]], vec![]), VertexStage::Fullscreen, copy)
}

fn gbuffer_copy(ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
    let pixel = input.pixel;
    let output = FragmentOutput::color(ctx.fetch(SOURCE_TEXTURE, pixel))
        .with_target(1, ctx.fetch(NORMAL_TEXTURE, pixel))
        .with_target(2, ctx.fetch(OTHER_TEXTURE, pixel))
        .with_depth(ctx.fetch(DEPTH_TEXTURE, pixel).x);
    Some(output)
}

/// Copy lit color, normal, surface parameters and depth texel for texel
pub fn gbuffer_copy_program() -> SoftwareProgram {
    SoftwareProgram::new(
        "gbuffer_copy",
        declare(&[&[SOURCE_TEXTURE, DEPTH_TEXTURE, NORMAL_TEXTURE, OTHER_TEXTURE]], vec![]),
        VertexStage::Fullscreen,
        gbuffer_copy,
    )
}

fn blur(ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
    let scale = ctx.uniforms.vec2(SCALE);
    let uv = input.screen_uv;
    let mut color = ctx.sample(SOURCE_TEXTURE, uv) * BLUR_WEIGHTS[0];
    for (tap, weight) in BLUR_WEIGHTS.iter().enumerate().skip(1) {
        let offset = scale * (tap as f32 / 4.0);
        color += ctx.sample(SOURCE_TEXTURE, uv + offset) * *weight;
        color += ctx.sample(SOURCE_TEXTURE, uv - offset) * *weight;
    }
    Some(FragmentOutput::color(color))
}

/// One direction of a separable Gaussian blur; `Scale` is the uv span of the kernel
pub fn blur_program() -> SoftwareProgram {
    SoftwareProgram::new("blur", declare(&[&[SOURCE_TEXTURE, SCALE]], vec![]), VertexStage::Fullscreen, blur)
}

// ============================================================================
// Sky and deferred lighting
// ============================================================================

fn skybox(ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
    let u = ctx.uniforms;
    let ray = view_ray(u.mat4(INV_VIEW_MATRIX), u.mat4(INV_PROJ_MATRIX), input.screen_uv);
    let sky = ctx.sample(ENVIRONMENT_TEXTURE, equirect_uv(ray));
    Some(FragmentOutput::color(sky.xyz().extend(1.0)).with_depth(1.0))
}

/// Equirectangular environment at the far plane
pub fn skybox_program() -> SoftwareProgram {
    SoftwareProgram::new(
        "skybox",
        declare(&[&FULLSCREEN_TRANSFORM_UNIFORMS, &[ENVIRONMENT_TEXTURE]], vec![]),
        VertexStage::Fullscreen,
        skybox,
    )
}

struct DeferredLighting {
    lights: LightSlots,
}

impl FragmentProgram for DeferredLighting {
    fn shade(&self, ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
        let u = ctx.uniforms;
        let pixel = input.pixel;
        let depth = ctx.fetch(DEPTH_TEXTURE, pixel).x;
        if depth >= 1.0 {
            return None;
        }

        let albedo = ctx.fetch(ALBEDO_TEXTURE, pixel).xyz();
        let normal = ctx.fetch(NORMAL_TEXTURE, pixel).xyz();
        let inv_view = u.mat4(INV_VIEW_MATRIX);
        let position = world_position(inv_view, u.mat4(INV_PROJ_MATRIX), input.screen_uv, depth);
        let first_batch = u.int(LIGHT_INDIRECT) != 0;

        let color = match ShowType::from_index(u.int(SHOW_TYPE)).unwrap_or_default() {
            ShowType::Lighting => self.lights.shade(ctx, position, normal, albedo),
            // debug views are written once, later batches add nothing
            _ if !first_batch => Vec3::ZERO,
            ShowType::Albedo => albedo,
            ShowType::Position => position,
            ShowType::Depth => Vec3::splat(depth),
            ShowType::WorldNormal => normal,
            ShowType::ViewNormal => inv_view.inverse().transform_vector3(normal),
        };

        let alpha = if first_batch { 1.0 } else { 0.0 };
        Some(FragmentOutput::color(color.extend(alpha)).with_depth(depth))
    }
}

/// Fullscreen Lambert lighting from the G-buffer, `lights_per_batch` lights per draw
pub fn deferred_program(lights_per_batch: usize) -> SoftwareProgram {
    SoftwareProgram::new(
        "deferred",
        declare(
            &[
                &FULLSCREEN_TRANSFORM_UNIFORMS,
                &[DEPTH_TEXTURE, ALBEDO_TEXTURE, NORMAL_TEXTURE, OTHERS_TEXTURE, ENVIRONMENT_TEXTURE, SHOW_TYPE],
            ],
            uniforms::light_uniform_names(lights_per_batch),
        ),
        VertexStage::Fullscreen,
        DeferredLighting {
            lights: LightSlots::new(lights_per_batch),
        },
    )
}

// ============================================================================
// Reflections
// ============================================================================

fn ssr(ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
    let miss = Some(FragmentOutput::color(Vec4::ZERO));
    let u = ctx.uniforms;
    let pixel = input.pixel;

    let depth = ctx.fetch(DEPTH_TEXTURE, pixel).x;
    let reflectivity = ctx.fetch(SPECULAR_TEXTURE, pixel).x;
    let Some(size) = ctx.texture_size(DEPTH_TEXTURE) else {
        return miss;
    };
    if depth >= 1.0 || reflectivity <= 0.0 {
        return miss;
    }

    let inv_proj = u.mat4(INV_PROJ_MATRIX);
    let projection = u.mat4(PROJECTION_MATRIX);
    let view = u.mat4(INV_VIEW_MATRIX).inverse();

    let origin = view_position(inv_proj, input.screen_uv, depth);
    let normal = view.transform_vector3(ctx.fetch(NORMAL_TEXTURE, pixel).xyz()).normalize_or_zero();
    let ray = reflect(origin.normalize_or_zero(), normal);

    let steps = u.int(STEPS).max(1) as f32;
    let marched = (steps * u.float(RESOLUTION).clamp(0.0, 1.0)).ceil().max(1.0) as u32;
    let step = u.float(MAX_DISTANCE) / marched as f32;
    let thickness = u.float(THICKNESS);

    for index in 1..=marched {
        let sample = origin + ray * (step * index as f32);
        let clip = projection * sample.extend(1.0);
        if clip.w <= 1e-5 {
            break;
        }
        let uv = clip.xy() / clip.w * 0.5 + Vec2::splat(0.5);
        if uv.cmplt(Vec2::ZERO).any() || uv.cmpge(Vec2::ONE).any() {
            break;
        }

        let hit_pixel = (uv * size.as_vec2()).as_uvec2().min(size - UVec2::ONE);
        let scene_depth = ctx.fetch(DEPTH_TEXTURE, hit_pixel).x;
        if scene_depth >= 1.0 {
            continue;
        }
        // view space looks down -Z: positive when the ray passed behind the surface
        let behind = view_position(inv_proj, uv, scene_depth).z - sample.z;
        if behind > 0.0 && behind < thickness {
            let color = ctx.sample(SOURCE_TEXTURE, uv);
            return Some(FragmentOutput::color(color.xyz().extend(1.0)));
        }
    }
    miss
}

/// View-space ray march against the full-scene depth; alpha 1 marks a hit
pub fn ssr_program() -> SoftwareProgram {
    SoftwareProgram::new(
        "ssr",
        declare(
            &[
                &SCREEN_SPACE_TRANSFORM_UNIFORMS,
                &[SOURCE_TEXTURE, DEPTH_TEXTURE, NORMAL_TEXTURE, SPECULAR_TEXTURE],
                &[MAX_DISTANCE, RESOLUTION, STEPS, THICKNESS],
            ],
            vec![],
        ),
        VertexStage::Fullscreen,
        ssr,
    )
}

fn composite(ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
    let u = ctx.uniforms;
    let pixel = input.pixel;
    let scene = ctx.fetch(SOURCE_TEXTURE, pixel).xyz();
    let depth = ctx.fetch(DEPTH_TEXTURE, pixel).x;
    let surface = ctx.fetch(SPECULAR_TEXTURE, pixel);
    let reflectivity = surface.x;
    if depth >= 1.0 || reflectivity <= 0.0 {
        return Some(FragmentOutput::color(scene.extend(1.0)));
    }

    let roughness = surface.y.clamp(0.0, 1.0);
    let traced = ctx
        .fetch(REFLECTIVE_TEXTURE, pixel)
        .lerp(ctx.sample(BLUR_REFLECTIVE_TEXTURE, input.screen_uv), roughness);

    let inv_view = u.mat4(INV_VIEW_MATRIX);
    let eye_to_surface = inv_view
        .transform_vector3(view_position(u.mat4(INV_PROJ_MATRIX), input.screen_uv, depth))
        .normalize_or_zero();
    let normal = ctx.fetch(NORMAL_TEXTURE, pixel).xyz().normalize_or_zero();
    let environment = ctx
        .sample(ENVIRONMENT_TEXTURE, equirect_uv(reflect(eye_to_surface, normal)))
        .xyz();

    let reflection = environment.lerp(traced.xyz(), traced.w.clamp(0.0, 1.0));
    let amount = fresnel(reflectivity, (-eye_to_surface).dot(normal));
    Some(FragmentOutput::color(scene.lerp(reflection, amount).extend(1.0)))
}

/// Mix traced (or environment) reflections over the scene on reflective pixels
pub fn composite_program() -> SoftwareProgram {
    SoftwareProgram::new(
        "composite",
        declare(
            &[
                &SCREEN_SPACE_TRANSFORM_UNIFORMS,
                &[SOURCE_TEXTURE, REFLECTIVE_TEXTURE, BLUR_REFLECTIVE_TEXTURE, SPECULAR_TEXTURE],
                &[ENVIRONMENT_TEXTURE, DEPTH_TEXTURE, NORMAL_TEXTURE],
            ],
            vec![],
        ),
        VertexStage::Fullscreen,
        composite,
    )
}

// ============================================================================
// Geometry
// ============================================================================

/// Uniforms every geometry program declares besides its material properties
fn geometry_uniforms(lights_per_batch: usize, material: &[&str]) -> Vec<String> {
    declare(
        &[
            &OBJECT_TRANSFORM_UNIFORMS,
            &[VIEW_MATRIX, PROJECTION_MATRIX, FORWARD_PASS],
            material,
        ],
        uniforms::light_uniform_names(lights_per_batch),
    )
}

/// G-buffer targets when `ForwardPass` is 0, lit color with `Alpha` otherwise
fn surface_output(
    ctx: &ShadeContext<'_>,
    lights: &LightSlots,
    input: &FragmentInput,
    albedo: Vec3,
    normal: Vec3,
    surface: Vec4,
) -> FragmentOutput {
    let u = ctx.uniforms;
    if u.int(FORWARD_PASS) == 0 {
        return FragmentOutput::color(albedo.extend(1.0))
            .with_target(1, normal.extend(1.0))
            .with_target(2, surface);
    }
    let lit = lights.shade(ctx, input.world_position, normal, albedo);
    FragmentOutput::color(lit.extend(u.float_or(ALPHA, 1.0)))
}

fn facing_normal(input: &FragmentInput) -> Vec3 {
    if input.front_facing {
        input.normal
    } else {
        -input.normal
    }
}

struct LitSurface {
    lights: LightSlots,
}

impl FragmentProgram for LitSurface {
    fn shade(&self, ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
        let u = ctx.uniforms;
        let mut albedo = u.get(COLOR).and_then(|value| value.as_vec3()).unwrap_or(Vec3::ONE);
        if ctx.has_texture(COLOR_TEXTURE) {
            albedo *= ctx.sample(COLOR_TEXTURE, input.uv).xyz();
        }
        Some(surface_output(ctx, &self.lights, input, albedo, facing_normal(input), OPAQUE_SURFACE))
    }
}

/// Diffuse surface tinted by `Color` and an optional `ColorTexture`
pub fn geometry_program(lights_per_batch: usize) -> SoftwareProgram {
    SoftwareProgram::new(
        "geometry",
        geometry_uniforms(lights_per_batch, &[COLOR, COLOR_TEXTURE, ALPHA]),
        VertexStage::Transform,
        LitSurface {
            lights: LightSlots::new(lights_per_batch),
        },
    )
}

struct FlowingWater {
    lights: LightSlots,
}

impl FlowingWater {
    /// Tangent-space normal onto the surface, tangent along +X
    fn perturb(normal: Vec3, tangent_space: Vec3) -> Vec3 {
        let normal = normal.normalize_or_zero();
        let mut tangent = (Vec3::X - normal * normal.x).normalize_or_zero();
        if tangent == Vec3::ZERO {
            tangent = Vec3::Z;
        }
        let bitangent = normal.cross(tangent);
        (tangent * tangent_space.x + bitangent * tangent_space.y + normal * tangent_space.z).normalize_or_zero()
    }
}

impl FragmentProgram for FlowingWater {
    fn shade(&self, ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
        let u = ctx.uniforms;
        let flow_sample = ctx.sample(FLOW_TEXTURE, input.uv);
        let flow = (flow_sample.xy() * 2.0 - Vec2::ONE) * u.float(FLOW_STRENGTH);
        // alpha carries per-texel phase noise
        let time = u.float(ELAPSED_TIME) * u.float(SPEED) + flow_sample.w;
        let jump = u.vec2(JUMP);
        let offset = u.float(FLOW_OFFSET);
        let tiling = u.int(TILING) as f32;

        let phase_a = flow_uvw(input.uv, flow, jump, offset, tiling, time, false);
        let phase_b = flow_uvw(input.uv, flow, jump, offset, tiling, time, true);
        let blend = |name: &str| {
            ctx.sample(name, phase_a.xy()) * phase_a.z + ctx.sample(name, phase_b.xy()) * phase_b.z
        };

        let albedo = blend(COLOR_TEXTURE).xyz() + u.vec3(COLOR);
        let tangent_space = blend(NORMAL_TEXTURE).xyz() * 2.0 - Vec3::ONE;
        let normal = Self::perturb(facing_normal(input), tangent_space);

        let surface = Vec4::new(WATER_REFLECTIVITY, WATER_ROUGHNESS, 0.0, 1.0);
        Some(surface_output(ctx, &self.lights, input, albedo, normal, surface))
    }
}

/// Flow-mapped water surface with two blended phases
pub fn water_program(lights_per_batch: usize) -> SoftwareProgram {
    SoftwareProgram::new(
        "water",
        geometry_uniforms(
            lights_per_batch,
            &[
                COLOR_TEXTURE, NORMAL_TEXTURE, FLOW_TEXTURE,
                COLOR, JUMP, TILING, SPEED, FLOW_STRENGTH, FLOW_OFFSET, ALPHA,
            ],
        ),
        VertexStage::Transform,
        FlowingWater {
            lights: LightSlots::new(lights_per_batch),
        },
    )
}

// ============================================================================
// Registration
// ============================================================================

/// Handles of every stock program on one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwarePrograms {
    pub pipeline: WaterPrograms,
    pub geometry: ProgramHandle,
    pub water: ProgramHandle,
}

impl SoftwarePrograms {
    /// Register the stock programs; lit ones get `lights_per_batch` light slots
    pub fn register(device: &mut SoftwareGraphicsDevice, lights_per_batch: usize) -> Self {
        let pipeline = WaterPrograms {
            deferred: device.register_program(deferred_program(lights_per_batch)),
            skybox: device.register_program(skybox_program()),
            gbuffer_copy: device.register_program(gbuffer_copy_program()),
            ssr: device.register_program(ssr_program()),
            copy: device.register_program(copy_program()),
            blur: device.register_program(blur_program()),
            composite: device.register_program(composite_program()),
        };
        Self {
            pipeline,
            geometry: device.register_program(geometry_program(lights_per_batch)),
            water: device.register_program(water_program(lights_per_batch)),
        }
    }
}
