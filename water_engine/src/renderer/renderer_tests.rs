//! Unit tests for the renderer, its program registry and transform callbacks

use std::sync::{Arc, Mutex};
use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::camera::Camera;
use crate::device::mock_graphics_device::MockGraphicsDevice;
use crate::device::{
    BlendFunc, DepthFunc, Features, GraphicsDevice, MeshDesc, ProgramHandle, UniformValue,
};
use crate::error::{Error, Result};
use crate::lighting::Light;
use crate::material::{Material, MaterialDesc};
use crate::render_pass::RenderPass;
use crate::renderer::{
    DrawcallFilter, DrawcallInfo, FrameContext, Renderer, RendererConfig, TransformArgs,
    TransformLocations, TransformUpdater,
};
use crate::uniforms;

// ============================================================================
// HELPERS
// ============================================================================

fn mock_renderer(config: RendererConfig) -> (Renderer, Arc<Mutex<MockGraphicsDevice>>) {
    let mock = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let device: Arc<Mutex<dyn GraphicsDevice>> = mock.clone();
    (Renderer::new(device, config).unwrap(), mock)
}

fn demo_camera() -> Camera {
    Camera::look_at_perspective(
        Vec3::new(-2.0, 1.0, -2.0),
        Vec3::new(0.0, 0.5, 0.0),
        Vec3::Y,
        1.0,
        1.0,
        0.1,
        100.0,
    )
}

/// Writes `CameraChanged` so tests can observe the flag the callback received
fn record_camera_changed(
    device: &mut dyn GraphicsDevice,
    _locations: &TransformLocations,
    args: &TransformArgs<'_>,
) -> Result<()> {
    match device.uniform_location(args.program, "CameraChanged") {
        Some(location) => device.set_uniform(
            args.program,
            location,
            UniformValue::Int(args.camera_changed as i32),
        ),
        None => Ok(()),
    }
}

fn opaque_drawcall(mock: &Arc<Mutex<MockGraphicsDevice>>, program: ProgramHandle) -> DrawcallInfo {
    let mut device = mock.lock().unwrap();
    let mesh = device.create_mesh(MeshDesc::cube(0.5)).unwrap();
    let material = Material::new(&*device, MaterialDesc::new(program)).unwrap();
    DrawcallInfo::new(mesh, 0, Arc::new(material), Mat4::IDENTITY)
}

fn changed_flags(mock: &Arc<Mutex<MockGraphicsDevice>>) -> Vec<UniformValue> {
    mock.lock()
        .unwrap()
        .uniform_log
        .iter()
        .filter(|(_, name, _)| name == "CameraChanged")
        .map(|(_, _, value)| *value)
        .collect()
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_zero_lights_per_batch_is_rejected() {
    let mock = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let device: Arc<Mutex<dyn GraphicsDevice>> = mock;
    let config = RendererConfig {
        lights_per_batch: 0,
        ..RendererConfig::default()
    };
    assert!(matches!(Renderer::new(device, config), Err(Error::InitializationFailed(_))));
}

#[test]
fn test_new_renderer_uploads_fullscreen_quad() {
    let (renderer, mock) = mock_renderer(RendererConfig::default());
    let device = mock.lock().unwrap();
    assert_eq!(device.submesh_count(renderer.fullscreen_mesh()), 1);
    assert_eq!(renderer.render_pass_count(), 0);
}

// ============================================================================
// CAMERA CHANGE DETECTION
// ============================================================================

#[test]
fn test_camera_changed_true_then_false_for_same_camera() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program("object", &["CameraChanged"]);
    renderer.register_shader_program(
        program,
        Some(TransformUpdater::new(TransformLocations::default(), record_camera_changed)),
        None,
    );
    renderer.set_current_camera(demo_camera());
    let drawcall = opaque_drawcall(&mock, program);

    renderer.prepare_drawcall(&drawcall).unwrap();
    renderer.prepare_drawcall(&drawcall).unwrap();

    assert_eq!(changed_flags(&mock), vec![UniformValue::Int(1), UniformValue::Int(0)]);
}

#[test]
fn test_camera_changed_after_camera_moves() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program("object", &["CameraChanged"]);
    renderer.register_shader_program(
        program,
        Some(TransformUpdater::new(TransformLocations::default(), record_camera_changed)),
        None,
    );
    renderer.set_current_camera(demo_camera());
    renderer.update_transforms(program, Mat4::IDENTITY, false).unwrap();

    let mut moved = demo_camera();
    moved.set_view_look_at(Vec3::new(3.0, 2.0, 0.0), Vec3::ZERO, Vec3::Y);
    renderer.set_current_camera(moved);
    renderer.update_transforms(program, Mat4::IDENTITY, false).unwrap();
    renderer.update_transforms(program, Mat4::IDENTITY, true).unwrap();

    assert_eq!(
        changed_flags(&mock),
        vec![UniformValue::Int(1), UniformValue::Int(1), UniformValue::Int(1)]
    );
}

#[test]
fn test_camera_cache_is_per_program() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let (a, b) = {
        let mut device = mock.lock().unwrap();
        (
            device.create_program("a", &["CameraChanged"]),
            device.create_program("b", &["CameraChanged"]),
        )
    };
    for program in [a, b] {
        renderer.register_shader_program(
            program,
            Some(TransformUpdater::new(TransformLocations::default(), record_camera_changed)),
            None,
        );
    }
    renderer.set_current_camera(demo_camera());

    renderer.update_transforms(a, Mat4::IDENTITY, false).unwrap();
    renderer.update_transforms(b, Mat4::IDENTITY, false).unwrap();

    assert_eq!(changed_flags(&mock), vec![UniformValue::Int(1), UniformValue::Int(1)]);
}

#[test]
fn test_fullscreen_updater_uploads_inverses_only_on_change() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program(
        "deferred",
        &[uniforms::INV_VIEW_MATRIX, uniforms::INV_PROJ_MATRIX, uniforms::WORLD_VIEW_PROJ_MATRIX],
    );
    let updater = TransformUpdater::fullscreen(&*mock.lock().unwrap(), program);
    renderer.register_shader_program(program, Some(updater), None);
    renderer.set_current_camera(demo_camera());

    for _ in 0..3 {
        renderer.update_transforms(program, Mat4::IDENTITY, false).unwrap();
    }

    let device = mock.lock().unwrap();
    assert_eq!(device.uniform_set_count(uniforms::INV_VIEW_MATRIX), 1);
    assert_eq!(device.uniform_set_count(uniforms::WORLD_VIEW_PROJ_MATRIX), 3);
    assert_eq!(
        device.uniform_value(program, uniforms::INV_PROJ_MATRIX),
        Some(UniformValue::Mat4(demo_camera().inverse_projection_matrix()))
    );
}

#[test]
fn test_object_updater_writes_matrices_and_time() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program("water", &uniforms::OBJECT_TRANSFORM_UNIFORMS);
    let updater = TransformUpdater::object(&*mock.lock().unwrap(), program);
    renderer.register_shader_program(program, Some(updater), None);
    renderer.set_current_camera(demo_camera());
    renderer.set_elapsed_time(12.5);

    let world = Mat4::from_translation(Vec3::new(0.0, 0.25, 0.0));
    renderer.update_transforms(program, world, false).unwrap();

    let device = mock.lock().unwrap();
    let camera = demo_camera();
    // Same association as the updater: projection * (view * world)
    let world_view_proj = *camera.projection_matrix() * (*camera.view_matrix() * world);
    assert!(world_view_proj.abs_diff_eq(camera.view_projection_matrix() * world, 1e-5));
    assert_eq!(device.uniform_value(program, uniforms::WORLD_MATRIX), Some(UniformValue::Mat4(world)));
    assert_eq!(
        device.uniform_value(program, uniforms::WORLD_VIEW_PROJ_MATRIX),
        Some(UniformValue::Mat4(world_view_proj))
    );
    assert_eq!(device.uniform_value(program, uniforms::ELAPSED_TIME), Some(UniformValue::Float(12.5)));
}

#[test]
fn test_unregistered_program_transforms_are_noop() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program("plain", &[uniforms::WORLD_MATRIX]);
    renderer.update_transforms(program, Mat4::IDENTITY, true).unwrap();
    assert!(mock.lock().unwrap().uniform_log.is_empty());
}

// ============================================================================
// LIGHT LOOP
// ============================================================================

#[test]
fn test_update_lights_without_updater_runs_once() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program("unlit", &[]);
    let lights = [Light::directional(Vec3::NEG_Y), Light::directional(Vec3::X)];

    let mut index = 0;
    let mut iterations = 0;
    while renderer.update_lights(program, &lights, &mut index).unwrap() {
        iterations += 1;
    }
    assert_eq!(iterations, 1);
}

#[test]
fn test_lighting_render_states_first_and_later_batches() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());

    renderer.set_lighting_render_states(true).unwrap();
    {
        let device = mock.lock().unwrap();
        assert!(!device.is_feature_enabled(Features::BLEND));
        assert_eq!(device.depth_func(), DepthFunc::LessEqual);
    }

    renderer.set_lighting_render_states(false).unwrap();
    let device = mock.lock().unwrap();
    assert!(device.is_feature_enabled(Features::BLEND));
    assert_eq!(device.blend_func(), BlendFunc::ADDITIVE);
    assert_eq!(device.depth_func(), DepthFunc::Equal);
}

#[test]
fn test_default_light_updater_uses_config_capacity() {
    let config = RendererConfig {
        lights_per_batch: 4,
        ..RendererConfig::default()
    };
    let (mut renderer, mock) = mock_renderer(config);
    let names = uniforms::light_uniform_names(4);
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let program = mock.lock().unwrap().create_program("lit", &names);

    let updater = renderer.default_light_updater(program).unwrap();
    assert_eq!(updater.capacity(), 4);
    renderer.register_shader_program(program, None, Some(updater));

    let lights: Vec<Light> = (0..9)
        .map(|i| Light::point(Vec3::splat(i as f32), Vec2::new(1.0, 2.0)))
        .collect();
    let mut index = 0;
    let mut batches = 0;
    while renderer.update_lights(program, &lights, &mut index).unwrap() {
        batches += 1;
    }
    assert_eq!(batches, 3);
}

// ============================================================================
// DRAW CALL COLLECTIONS
// ============================================================================

#[test]
fn test_collections_apply_filters() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program("surface", &[]);
    let transparent_index = renderer.add_drawcall_collection(DrawcallFilter::Transparent);

    let opaque = opaque_drawcall(&mock, program);
    let transparent = {
        let device = mock.lock().unwrap();
        let material = Material::new(&*device, MaterialDesc::new(program).transparent(true)).unwrap();
        DrawcallInfo::new(opaque.mesh, 0, Arc::new(material), Mat4::IDENTITY)
    };

    renderer.add_drawcall(opaque);
    renderer.add_drawcall(transparent);

    assert_eq!(renderer.drawcalls(0).len(), 2);
    assert_eq!(renderer.drawcalls(transparent_index).len(), 1);
    assert!(renderer.drawcalls(transparent_index)[0].material.is_transparent());
    assert!(renderer.drawcalls(42).is_empty());
}

// ============================================================================
// FRAME
// ============================================================================

struct FailingPass;

impl RenderPass for FailingPass {
    fn name(&self) -> &str {
        "Failing"
    }

    fn target(&self) -> Option<crate::device::FramebufferHandle> {
        None
    }

    fn render(&mut self, _ctx: &mut FrameContext<'_>) -> Result<()> {
        Err(Error::BackendError("pass failed".to_string()))
    }
}

#[test]
fn test_render_clears_frame_data_and_presents() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program("surface", &[]);
    renderer.add_drawcall(opaque_drawcall(&mock, program));
    renderer.add_light(Light::directional(Vec3::NEG_Y));

    renderer.render().unwrap();

    assert!(renderer.drawcalls(0).is_empty());
    assert!(renderer.lights().is_empty());
    let device = mock.lock().unwrap();
    assert_eq!(device.stats().frames, 1);
    assert_eq!(device.commands.last().map(String::as_str), Some("present"));
}

#[test]
fn test_render_error_aborts_frame() {
    let (mut renderer, mock) = mock_renderer(RendererConfig::default());
    let program = mock.lock().unwrap().create_program("surface", &[]);
    renderer.add_render_pass(FailingPass);
    renderer.add_drawcall(opaque_drawcall(&mock, program));

    assert!(matches!(renderer.render(), Err(Error::BackendError(_))));
    assert_eq!(mock.lock().unwrap().stats().frames, 0);
    assert_eq!(renderer.drawcalls(0).len(), 1);
}

#[test]
fn test_disabled_pass_is_skipped() {
    let (mut renderer, _mock) = mock_renderer(RendererConfig::default());
    let id = renderer.add_render_pass(FailingPass);
    renderer.set_render_pass_enabled(id, false).unwrap();

    assert!(!renderer.is_render_pass_enabled(id));
    assert!(renderer.render().is_ok());
}

#[test]
fn test_poisoned_device_lock_is_backend_error() {
    let (mut renderer, _mock) = mock_renderer(RendererConfig::default());
    let device = renderer.device().clone();
    let _ = std::thread::spawn(move || {
        let _guard = device.lock().unwrap();
        panic!("poison the device lock");
    })
    .join();

    assert!(matches!(renderer.render(), Err(Error::BackendError(_))));
}

#[test]
fn test_clear_color_comes_from_config() {
    let config = RendererConfig {
        clear_color: Vec4::new(0.1, 0.2, 0.3, 1.0),
        ..RendererConfig::default()
    };
    let (mut renderer, mock) = mock_renderer(config);
    renderer.render().unwrap();
    assert!(mock.lock().unwrap().commands.iter().any(|c| c == "clear true true"));
}
