/// Graphics device module - resources, raster state and the backend trait

pub mod texture;
pub mod framebuffer;
pub mod program;
pub mod mesh;
pub mod render_state;
pub mod graphics_device;

pub use texture::{TextureHandle, TextureDesc, TextureInfo, TextureFormat, FilterMode, WrapMode};
pub use framebuffer::{FramebufferHandle, FramebufferDesc, Attachment, MAX_COLOR_ATTACHMENTS};
pub use program::{ProgramHandle, UniformLocation, UniformValue};
pub use mesh::{MeshHandle, MeshDesc, SubMeshDesc, Vertex};
pub use render_state::{
    Features, BlendFactor, BlendFunc, DepthFunc, RenderState, RenderStateGuard, DeviceAccess,
};
pub use graphics_device::{GraphicsDevice, DeviceStats};

#[cfg(test)]
pub mod mock_graphics_device;
