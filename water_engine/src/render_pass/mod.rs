/// Render passes - one step of the frame each, run in insertion order
///
/// The renderer binds `target()` before calling `render()`, so a pass only
/// issues its own state changes and draws. Passes that change blend or depth
/// state scope the change with `RenderStateGuard` and leave the device as
/// they found it.

pub mod copy;
pub mod gbuffer_copy;
pub mod transparency;
pub mod postfx;
pub mod gbuffer;
pub mod deferred;
pub mod skybox;

pub use copy::CopyRenderPass;
pub use gbuffer_copy::GBufferCopyPass;
pub use transparency::TransparencyPass;
pub use postfx::PostFxRenderPass;
pub use gbuffer::{GBufferRenderPass, GBufferTextures};
pub use deferred::DeferredRenderPass;
pub use skybox::SkyboxRenderPass;

use crate::device::FramebufferHandle;
use crate::error::Result;
use crate::renderer::FrameContext;

pub trait RenderPass: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Framebuffer bound before `render`, `None` for the default framebuffer
    fn target(&self) -> Option<FramebufferHandle>;

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<()>;
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
