#![allow(dead_code)]
//! Software test utilities - CPU device and renderer fixtures for integration tests
//!
//! Every test builds its own small `SoftwareGraphicsDevice`, so tests never
//! share framebuffer contents. The typed handle is kept next to the renderer
//! so tests can read the back buffer and register programs after the
//! renderer took its `dyn GraphicsDevice` clone.

use std::sync::{Arc, Mutex, MutexGuard};
use glam::{Vec3, Vec4};
use water_engine::water3d::device::{GraphicsDevice, TextureDesc, TextureFormat, TextureHandle};
use water_engine::water3d::render::Camera;
use water_engine::water3d::{Renderer, RendererConfig};
use water_engine_renderer_software::water3d::SoftwareGraphicsDevice;

/// Back buffer size used by the scene tests
pub const SIZE: u32 = 32;

/// Tolerance for colors computed through the rasterizer
pub const EPSILON: f32 = 1e-4;

pub struct TestBench {
    pub device: Arc<Mutex<SoftwareGraphicsDevice>>,
    pub renderer: Renderer,
}

impl TestBench {
    /// `SIZE` x `SIZE` device and a renderer with the default config
    pub fn new() -> Self {
        Self::with_config(RendererConfig::default())
    }

    pub fn with_config(config: RendererConfig) -> Self {
        let device = Arc::new(Mutex::new(
            SoftwareGraphicsDevice::new(SIZE, SIZE).expect("Failed to create software device"),
        ));
        let shared: Arc<Mutex<dyn GraphicsDevice>> = device.clone();
        let renderer = Renderer::new(shared, config).expect("Failed to create renderer");
        Self { device, renderer }
    }

    pub fn lock(&self) -> MutexGuard<'_, SoftwareGraphicsDevice> {
        self.device.lock().unwrap()
    }

    /// 4x4 texture filled with `color`
    pub fn solid(&self, format: TextureFormat, color: Vec4) -> TextureHandle {
        self.lock()
            .create_texture(TextureDesc::solid(4, 4, format, color))
            .unwrap()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.lock().back_buffer_pixel(x, y)
    }
}

/// Camera at +Z looking at the origin, square aspect
pub fn front_camera() -> Camera {
    Camera::look_at_perspective(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        Vec3::Y,
        0.8,
        1.0,
        0.1,
        100.0,
    )
}

pub fn assert_rgb_near(actual: Vec4, expected: Vec3, what: &str) {
    assert!(
        (actual.truncate() - expected).abs().max_element() < EPSILON,
        "{}: expected {:?}, got {:?}",
        what,
        expected,
        actual
    );
}
