/// GraphicsDevice trait - the seam between the renderer and a backend

use glam::Vec4;
use crate::error::Result;
use crate::device::{
    Features, BlendFunc, DepthFunc,
    TextureHandle, TextureDesc, TextureInfo,
    FramebufferHandle, FramebufferDesc,
    ProgramHandle, UniformLocation, UniformValue,
    MeshHandle, MeshDesc,
};

/// Device statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Draw calls issued since the device was created
    pub draw_calls: u64,
    /// Frames presented since the device was created
    pub frames: u64,
}

/// Graphics device trait
///
/// Owns every GPU-side resource (textures, framebuffers, linked programs,
/// meshes) and the fixed-function state. Implemented by backends such as the
/// software rasterizer. The renderer shares one device as
/// `Arc<Mutex<dyn GraphicsDevice>>`.
///
/// Binding `None` as the framebuffer targets the device's default (presented)
/// framebuffer. Fragment output `i` is routed to the bound framebuffer's
/// `draw_buffers[i]`. The depth test only runs when the target has a depth
/// attachment and `Features::DEPTH_TEST` is enabled.
pub trait GraphicsDevice: Send + Sync {
    // ===== TEXTURES =====

    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle>;

    fn texture_info(&self, texture: TextureHandle) -> Option<TextureInfo>;

    /// Read every texel back, row-major from the bottom row
    fn read_texture(&self, texture: TextureHandle) -> Result<Vec<Vec4>>;

    fn destroy_texture(&mut self, texture: TextureHandle) -> Result<()>;

    // ===== FRAMEBUFFERS =====

    /// Create a framebuffer
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the layout fails `FramebufferDesc::validate`.
    fn create_framebuffer(&mut self, desc: FramebufferDesc) -> Result<FramebufferHandle>;

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> Result<()>;

    fn bound_framebuffer(&self) -> Option<FramebufferHandle>;

    /// Dimensions of a framebuffer, `None` meaning the default framebuffer
    fn framebuffer_size(&self, framebuffer: Option<FramebufferHandle>) -> Option<(u32, u32)>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) -> Result<()>;

    /// Clear every draw buffer of the bound framebuffer and/or its depth attachment
    fn clear(&mut self, color: Option<Vec4>, depth: Option<f32>) -> Result<()>;

    // ===== RASTER STATE =====

    fn is_feature_enabled(&self, feature: Features) -> bool;

    fn set_feature_enabled(&mut self, feature: Features, enabled: bool);

    fn blend_func(&self) -> BlendFunc;

    fn set_blend_func(&mut self, func: BlendFunc);

    fn depth_func(&self) -> DepthFunc;

    fn set_depth_func(&mut self, func: DepthFunc);

    // ===== PROGRAMS =====

    /// Location of a named uniform, `None` if the program does not declare it
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Every uniform the program declares
    fn uniform_names(&self, program: ProgramHandle) -> Vec<String>;

    fn use_program(&mut self, program: ProgramHandle) -> Result<()>;

    fn current_program(&self) -> Option<ProgramHandle>;

    /// Store a uniform value in `program`; values persist across `use_program` calls
    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<()>;

    // ===== GEOMETRY =====

    fn create_mesh(&mut self, desc: MeshDesc) -> Result<MeshHandle>;

    fn submesh_count(&self, mesh: MeshHandle) -> usize;

    /// Draw one submesh with the current program into the bound framebuffer
    fn draw_submesh(&mut self, mesh: MeshHandle, submesh: usize) -> Result<()>;

    // ===== FRAME =====

    /// Finish the frame on the default framebuffer
    fn present(&mut self) -> Result<()>;

    fn stats(&self) -> DeviceStats;
}
