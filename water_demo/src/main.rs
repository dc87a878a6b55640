//! Water demo - headless rendering of the water scene on the software backend
//!
//! Builds a small scene (a crate standing in flow-mapped water, lit by a
//! directional and a spot light), assembles the complete water pipeline and
//! renders a few animated frames. Each deferred debug view gets one extra
//! frame at the end.
//!
//! Usage: `water_demo [output.png]` writes the last lit frame when a path is given.
//! Set `RUST_LOG=debug` (or `trace`) for per-pass engine output.

mod log_bridge;
mod textures;

use std::sync::{Arc, Mutex, MutexGuard};
use glam::{Mat4, Vec2, Vec3, Vec4};
use image::{ImageBuffer, RgbaImage};
use water_engine::water3d::device::{Features, GraphicsDevice, MeshDesc, MeshHandle, ProgramHandle};
use water_engine::water3d::pipeline::{
    geometry_filtered_uniforms, register_geometry_program, ShowType, WaterClock, WaterPipeline,
    WaterPipelineSettings, WaterSurface, WaterSurfaceSettings, WaterTextures,
};
use water_engine::water3d::render::{Camera, DrawcallInfo, Light, Material, MaterialDesc};
use water_engine::water3d::uniforms;
use water_engine::water3d::{Engine, Error, Renderer, RendererConfig};
use water_engine_renderer_software::water3d::programs::SoftwarePrograms;
use water_engine_renderer_software::water3d::SoftwareGraphicsDevice;

use crate::log_bridge::LogBridge;

const WIDTH: u32 = 160;
const HEIGHT: u32 = 160;
const FRAMES: usize = 4;
const FRAME_TIME: f32 = 1.0 / 30.0;
const CRATE_COLOR: Vec3 = Vec3::new(0.55, 0.4, 0.25);

type DemoResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

struct Scene {
    lights: Vec<Light>,
    drawcalls: Vec<DrawcallInfo>,
}

impl Scene {
    /// Queue this frame's draw calls and lights; the renderer drops both after `render`
    fn submit(&self, renderer: &mut Renderer) {
        for drawcall in &self.drawcalls {
            renderer.add_drawcall(drawcall.clone());
        }
        for light in &self.lights {
            renderer.add_light(*light);
        }
    }
}

fn lock(device: &Mutex<SoftwareGraphicsDevice>) -> Result<MutexGuard<'_, SoftwareGraphicsDevice>, Error> {
    device
        .lock()
        .map_err(|_| Error::BackendError("Software device lock poisoned".to_string()))
}

fn crate_drawcall(renderer: &Renderer, program: ProgramHandle, mesh: MeshHandle) -> Result<DrawcallInfo, Error> {
    let material = {
        let device = renderer.lock_device()?;
        Material::new(
            &*device,
            MaterialDesc {
                filtered_uniforms: geometry_filtered_uniforms(renderer.config().lights_per_batch),
                ..MaterialDesc::new(program)
            }
            .with_property(uniforms::COLOR, CRATE_COLOR),
        )?
    };
    Ok(DrawcallInfo::new(
        mesh,
        0,
        Arc::new(material),
        Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)),
    ))
}

fn save_frame(device: &SoftwareGraphicsDevice, path: &str) -> DemoResult<()> {
    let (width, height) = device.size();
    let texels = device.read_back_buffer();

    // Back buffer rows start at the bottom, images at the top
    let mut bytes = Vec::with_capacity(texels.len() * 4);
    for row in texels.chunks_exact(width as usize).rev() {
        for texel in row {
            let rgba = texel.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
            bytes.extend(rgba.round().to_array().map(|channel| channel as u8));
        }
    }

    let image: RgbaImage = ImageBuffer::from_raw(width, height, bytes)
        .ok_or_else(|| Error::BackendError("Back buffer size mismatch".to_string()))?;
    image.save(path)?;
    log::info!("Saved {}x{} frame to {}", width, height, path);
    Ok(())
}

fn main() -> DemoResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    Engine::set_logger(LogBridge);

    let output = std::env::args().nth(1);
    let config = RendererConfig {
        lights_per_batch: 2,
        ..RendererConfig::default()
    };

    // ========== DEVICE & ASSETS ==========
    let mut device = SoftwareGraphicsDevice::new(WIDTH, HEIGHT)?;
    let programs = SoftwarePrograms::register(&mut device, config.lights_per_batch);
    let environment = device.create_texture(textures::sky(128, 64))?;
    let water_textures = WaterTextures {
        color: device.create_texture(textures::water_color(64))?,
        normal: device.create_texture(textures::water_normal(64))?,
        flow: device.create_texture(textures::water_flow(32))?,
    };
    let crate_mesh = device.create_mesh(MeshDesc::cube(0.5))?;
    let water_mesh = device.create_mesh(MeshDesc::plane(6.0))?;
    device.set_feature_enabled(Features::DEPTH_TEST, true);

    let device = Arc::new(Mutex::new(device));
    let shared: Arc<Mutex<dyn GraphicsDevice>> = device.clone();
    let mut renderer = Renderer::new(shared, config)?;

    // ========== PIPELINE & SCENE ==========
    let mut pipeline = WaterPipeline::build(
        &mut renderer,
        &programs.pipeline,
        environment,
        WaterPipelineSettings::default(),
    )?;
    let water = WaterSurface::new(
        &mut renderer,
        programs.water,
        water_textures,
        WaterSurfaceSettings {
            jump: Vec2::new(0.24, 0.2),
            ..WaterSurfaceSettings::default()
        },
    )?;
    register_geometry_program(&mut renderer, programs.geometry)?;

    let scene = Scene {
        lights: vec![
            Light::directional(Vec3::new(0.0, -1.0, -0.3)).with_intensity(3.0),
            Light::spot(
                Vec3::new(0.0, 5.0, 0.0),
                Vec3::NEG_Y,
                Vec2::new(5.0, 10.0),
                Vec2::new(0.1, 0.4),
            )
            .with_intensity(5.0),
        ],
        drawcalls: vec![
            crate_drawcall(&renderer, programs.geometry, crate_mesh)?,
            water.drawcall(water_mesh, Mat4::IDENTITY),
        ],
    };

    renderer.set_current_camera(Camera::look_at_perspective(
        Vec3::new(-3.0, 1.5, -3.0),
        Vec3::new(0.0, 0.5, 0.0),
        Vec3::Y,
        1.0,
        WIDTH as f32 / HEIGHT as f32,
        0.1,
        100.0,
    ));

    // ========== FRAMES ==========
    let mut clock = WaterClock::default();
    for frame in 0..FRAMES {
        renderer.set_elapsed_time(clock.advance(FRAME_TIME));
        scene.submit(&mut renderer);
        renderer.render()?;
        log::debug!("Frame {} rendered at t = {:.3}s", frame, clock.elapsed());
    }
    if let Some(path) = &output {
        save_frame(&*lock(&device)?, path)?;
    }

    for show_type in ShowType::ALL.into_iter().skip(1) {
        pipeline.set_show_type(show_type)?;
        scene.submit(&mut renderer);
        renderer.render()?;

        let frame = lock(&device)?.read_back_buffer();
        let average = frame.iter().fold(Vec4::ZERO, |sum, texel| sum + *texel) / frame.len() as f32;
        log::info!("{:<12} average color {:.3?}", show_type.label(), average.truncate());
    }
    pipeline.set_show_type(ShowType::Lighting)?;

    let stats = lock(&device)?.stats();
    log::info!(
        "Rendered {} frame(s), {} draw call(s), {} pass(es) per frame",
        stats.frames,
        stats.draw_calls,
        renderer.render_pass_count()
    );
    Ok(())
}
