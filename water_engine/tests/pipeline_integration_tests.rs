//! Integration tests for the complete water pipeline on the software device
//!
//! A cube standing in a flow-mapped water plane, rendered through every pass
//! of the pipeline with the stock software programs.
//! No GPU required.
//!
//! Run with: cargo test --test pipeline_integration_tests

mod software_test_utils;

use std::sync::Arc;
use glam::{Mat4, Vec2, Vec3, Vec4};
use software_test_utils::{assert_rgb_near, TestBench, SIZE};
use water_engine::water3d::device::{
    Features, GraphicsDevice, MeshDesc, TextureDesc, TextureFormat, UniformValue,
};
use water_engine::water3d::pipeline::{
    geometry_filtered_uniforms, register_geometry_program, ShowType, WaterClock, WaterPipeline,
    WaterPipelineSettings, WaterSurface, WaterSurfaceSettings, WaterTextures,
};
use water_engine::water3d::render::{Camera, DrawcallInfo, Light, Material, MaterialDesc};
use water_engine::water3d::uniforms;
use water_engine::water3d::Error;
use water_engine_renderer_software::water3d::programs::{SoftwarePrograms, WATER_REFLECTIVITY};

// ============================================================================
// HELPERS
// ============================================================================

const CUBE_ALBEDO: Vec3 = Vec3::new(0.8, 0.2, 0.2);
const ENVIRONMENT: Vec4 = Vec4::new(0.4, 0.6, 0.9, 1.0);

/// Top-left pixel, above the horizon
const SKY: (u32, u32) = (0, SIZE - 1);
/// Screen centre, on the cube's front face
const CUBE: (u32, u32) = (16, 16);
/// Bottom centre, on the water in front of the cube
const WATER: (u32, u32) = (16, 2);

struct WaterScene {
    bench: TestBench,
    pipeline: WaterPipeline,
    water: WaterSurface,
    cube: DrawcallInfo,
    water_drawcall: DrawcallInfo,
}

impl WaterScene {
    fn new(settings: WaterPipelineSettings) -> Self {
        let mut bench = TestBench::new();
        let lights_per_batch = bench.renderer.config().lights_per_batch;

        let (programs, environment, textures, cube_mesh, water_mesh) = {
            let mut device = bench.lock();
            let programs = SoftwarePrograms::register(&mut device, lights_per_batch);
            let mut solid = |color: Vec4| {
                device
                    .create_texture(TextureDesc::solid(4, 4, TextureFormat::Rgba8, color))
                    .unwrap()
            };
            let environment = solid(ENVIRONMENT);
            let textures = WaterTextures {
                color: solid(Vec4::new(0.1, 0.3, 0.5, 1.0)),
                // flat tangent-space normal
                normal: solid(Vec4::new(0.5, 0.5, 1.0, 1.0)),
                // no flow, mid phase noise
                flow: solid(Vec4::new(0.5, 0.5, 0.0, 0.5)),
            };
            let cube_mesh = device.create_mesh(MeshDesc::cube(0.5)).unwrap();
            let water_mesh = device.create_mesh(MeshDesc::plane(4.0)).unwrap();
            device.set_feature_enabled(Features::DEPTH_TEST, true);
            (programs, environment, textures, cube_mesh, water_mesh)
        };

        let pipeline = WaterPipeline::build(&mut bench.renderer, &programs.pipeline, environment, settings).unwrap();
        let water = WaterSurface::new(
            &mut bench.renderer,
            programs.water,
            textures,
            WaterSurfaceSettings::default(),
        )
        .unwrap();

        register_geometry_program(&mut bench.renderer, programs.geometry).unwrap();
        let cube_material = {
            let device = bench.lock();
            Material::new(
                &*device,
                MaterialDesc {
                    filtered_uniforms: geometry_filtered_uniforms(lights_per_batch),
                    ..MaterialDesc::new(programs.geometry)
                }
                .with_property(uniforms::COLOR, CUBE_ALBEDO),
            )
            .unwrap()
        };

        bench.renderer.set_current_camera(Camera::look_at_perspective(
            Vec3::new(0.0, 1.5, 4.0),
            Vec3::ZERO,
            Vec3::Y,
            1.0,
            1.0,
            0.1,
            100.0,
        ));

        let water_drawcall = water.drawcall(water_mesh, Mat4::IDENTITY);
        Self {
            bench,
            pipeline,
            water,
            cube: DrawcallInfo::new(
                cube_mesh,
                0,
                Arc::new(cube_material),
                Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)),
            ),
            water_drawcall,
        }
    }

    /// Queue the scene, re-add the lights and render one frame
    fn render(&mut self) {
        let renderer = &mut self.bench.renderer;
        renderer.add_drawcall(self.cube.clone());
        renderer.add_drawcall(self.water_drawcall.clone());
        renderer.add_light(Light::directional(Vec3::new(0.0, -1.0, -0.3)).with_intensity(1.0));
        renderer.render().unwrap();
    }

    fn pixel(&self, (x, y): (u32, u32)) -> Vec4 {
        self.bench.pixel(x, y)
    }
}

fn in_unit_range(color: Vec4) -> bool {
    color.is_finite() && color.cmpge(Vec4::ZERO).all() && color.cmple(Vec4::ONE).all()
}

// ============================================================================
// BUILD TESTS
// ============================================================================

#[test]
fn test_integration_pipeline_pass_count() {
    let scene = WaterScene::new(WaterPipelineSettings::default());
    let renderer = &scene.bench.renderer;

    let max = scene.pipeline.settings().max_blur_iterations;
    assert_eq!(renderer.render_pass_count(), 8 + 2 * max + 1);
    assert_eq!(renderer.render_pass_names().first(), Some(&"GBuffer"));
    assert_eq!(renderer.render_pass_names().last(), Some(&"Composite"));

    let enabled = scene
        .pipeline
        .blur_passes()
        .iter()
        .filter(|(horizontal, vertical)| {
            renderer.is_render_pass_enabled(*horizontal) && renderer.is_render_pass_enabled(*vertical)
        })
        .count();
    assert_eq!(enabled, scene.pipeline.settings().blur_iterations);
}

#[test]
fn test_integration_pipeline_targets_match_back_buffer() {
    let scene = WaterScene::new(WaterPipelineSettings::default());
    let device = scene.bench.lock();
    let targets = scene.pipeline.targets();

    for framebuffer in [
        targets.main_scene_framebuffer,
        targets.full_scene_framebuffer,
        targets.reflection_framebuffer,
        targets.temp_framebuffers[0],
        targets.temp_framebuffers[1],
    ] {
        assert_eq!(device.framebuffer_size(Some(framebuffer)), Some((SIZE, SIZE)));
    }
}

#[test]
fn test_integration_pipeline_rejects_zero_blur_capacity() {
    let mut bench = TestBench::new();
    let (programs, environment) = {
        let mut device = bench.lock();
        let programs = SoftwarePrograms::register(&mut device, 1);
        let environment = device
            .create_texture(TextureDesc::solid(4, 4, TextureFormat::Rgba8, ENVIRONMENT))
            .unwrap();
        (programs, environment)
    };

    let result = WaterPipeline::build(
        &mut bench.renderer,
        &programs.pipeline,
        environment,
        WaterPipelineSettings {
            max_blur_iterations: 0,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert_eq!(bench.renderer.render_pass_count(), 0);
}

// ============================================================================
// FRAME TESTS
// ============================================================================

#[test]
fn test_integration_pipeline_renders_frames() {
    let mut scene = WaterScene::new(WaterPipelineSettings::default());
    let mut clock = WaterClock::default();

    for _ in 0..3 {
        let time = clock.advance(1.0 / 30.0);
        scene.bench.renderer.set_elapsed_time(time);
        scene.render();
    }

    let stats = scene.bench.lock().stats();
    assert_eq!(stats.frames, 3);
    assert!(stats.draw_calls > 0);

    let frame = scene.bench.lock().read_back_buffer();
    assert_eq!(frame.len(), (SIZE * SIZE) as usize);
    assert!(frame.iter().all(|pixel| in_unit_range(*pixel)));
}

#[test]
fn test_integration_sky_passes_through_composite() {
    let mut scene = WaterScene::new(WaterPipelineSettings::default());
    scene.render();

    assert_rgb_near(scene.pixel(SKY), ENVIRONMENT.truncate(), "sky");
}

#[test]
fn test_integration_water_is_reflective() {
    let mut scene = WaterScene::new(WaterPipelineSettings::default());
    scene.render();

    // The water entry of the full-scene G-buffer carries its reflectivity
    let (x, y) = WATER;
    let others = {
        let device = scene.bench.lock();
        device.read_texture(scene.pipeline.targets().full_scene.others).unwrap()
    };
    assert_eq!(others[(x + y * SIZE) as usize].x, WATER_REFLECTIVITY);

    let water = scene.pixel(WATER);
    assert!(in_unit_range(water));
    assert!((water.truncate() - ENVIRONMENT.truncate()).abs().max_element() > 1e-3);
    assert_ne!(water, Vec4::new(0.0, 0.0, 0.0, 1.0));
}

#[test]
fn test_integration_albedo_view_shows_cube_color() {
    let mut scene = WaterScene::new(WaterPipelineSettings::default());
    scene.pipeline.set_show_type(ShowType::Albedo).unwrap();
    assert_eq!(
        scene.pipeline.deferred_material().uniform(uniforms::SHOW_TYPE),
        Some(UniformValue::Int(ShowType::Albedo as i32))
    );

    scene.render();

    // Opaque surfaces are not reflective: composite passes the scene through
    assert_rgb_near(scene.pixel(CUBE), CUBE_ALBEDO, "cube albedo");
}

#[test]
fn test_integration_settings_changes_between_frames() {
    let mut scene = WaterScene::new(WaterPipelineSettings::default());
    scene.render();

    scene.pipeline.set_ssr_steps(4).unwrap();
    scene.pipeline.set_ssr_resolution(0.5).unwrap();
    scene.pipeline.set_blur_iterations(&mut scene.bench.renderer, 1).unwrap();
    scene.water.set_color(Vec3::new(0.0, 0.1, 0.2)).unwrap();
    scene.water.set_jump(Vec2::new(0.24, 0.2)).unwrap();
    scene.water.set_alpha(0.9).unwrap();
    scene.render();

    assert_eq!(
        scene.pipeline.ssr_material().uniform(uniforms::STEPS),
        Some(UniformValue::Int(4))
    );
    assert_eq!(
        scene.water.material().uniform(uniforms::ALPHA),
        Some(UniformValue::Float(0.9))
    );
    assert_eq!(scene.water.settings().jump, Vec2::new(0.24, 0.2));
    assert_eq!(scene.bench.lock().stats().frames, 2);
    assert!(in_unit_range(scene.pixel(WATER)));
}

#[test]
fn test_integration_ssr_alpha_marks_hits() {
    let mut scene = WaterScene::new(WaterPipelineSettings::default());
    scene.render();

    let reflection = {
        let device = scene.bench.lock();
        device.read_texture(scene.pipeline.targets().reflection).unwrap()
    };
    assert!(reflection.iter().all(|texel| texel.w == 0.0 || texel.w == 1.0));

    // Sky and opaque pixels are never traced
    for (x, y) in [SKY, CUBE] {
        assert_eq!(reflection[(x + y * SIZE) as usize], Vec4::ZERO);
    }
}
