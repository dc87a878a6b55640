/// Copy pass: fullscreen copy of one texture into another

use std::sync::Arc;
use crate::device::{
    Attachment, FramebufferDesc, FramebufferHandle, GraphicsDevice, ProgramHandle, TextureHandle,
};
use crate::error::Result;
use crate::material::{Material, MaterialDesc};
use crate::render_pass::RenderPass;
use crate::renderer::FrameContext;
use crate::uniforms;

pub struct CopyRenderPass {
    material: Arc<Material>,
    framebuffer: FramebufferHandle,
}

impl CopyRenderPass {
    /// Build the target framebuffer (color 0 = `target`) and a copy material
    /// sampling `source` through `copy_program`'s `SourceTexture`
    pub fn new(
        device: &mut dyn GraphicsDevice,
        copy_program: ProgramHandle,
        source: TextureHandle,
        target: TextureHandle,
    ) -> Result<Self> {
        let framebuffer = device.create_framebuffer(
            FramebufferDesc::new()
                .with_attachment(Attachment::Color(0), target)
                .with_draw_buffers(&[Attachment::Color(0)]),
        )?;
        let material = Material::new(
            device,
            MaterialDesc::new(copy_program).with_property(uniforms::SOURCE_TEXTURE, source),
        )?;

        Ok(Self {
            material: Arc::new(material),
            framebuffer,
        })
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }
}

impl RenderPass for CopyRenderPass {
    fn name(&self) -> &str {
        "Copy"
    }

    fn target(&self) -> Option<FramebufferHandle> {
        Some(self.framebuffer)
    }

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.material.apply(ctx.device())?;
        ctx.draw_fullscreen()
    }
}
