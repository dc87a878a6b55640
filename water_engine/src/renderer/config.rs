/// Renderer configuration

use glam::Vec4;

#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Light slots used by `Renderer::default_light_updater`
    pub lights_per_batch: usize,
    /// Color the default framebuffer is cleared to at the start of a frame
    pub clear_color: Vec4,
    /// Depth the default framebuffer is cleared to at the start of a frame
    pub clear_depth: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            lights_per_batch: 1,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_depth: 1.0,
        }
    }
}
