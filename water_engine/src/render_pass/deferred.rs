/// Deferred lighting pass: fullscreen shading from the G-buffer, one draw per light batch

use std::sync::Arc;
use glam::Mat4;
use crate::device::{Features, FramebufferHandle, RenderStateGuard};
use crate::error::Result;
use crate::material::Material;
use crate::render_pass::RenderPass;
use crate::renderer::FrameContext;

pub struct DeferredRenderPass {
    material: Arc<Material>,
    target: Option<FramebufferHandle>,
}

impl DeferredRenderPass {
    pub fn new(material: Arc<Material>, target: Option<FramebufferHandle>) -> Self {
        Self { material, target }
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

impl RenderPass for DeferredRenderPass {
    fn name(&self) -> &str {
        "Deferred"
    }

    fn target(&self) -> Option<FramebufferHandle> {
        self.target
    }

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let program = self.material.program();
        self.material.apply(ctx.device())?;
        ctx.update_transforms(program, Mat4::IDENTITY, false)?;

        let mut ctx = RenderStateGuard::new(ctx);
        ctx.device().set_feature_enabled(Features::DEPTH_TEST, true);

        let mut light_index = 0;
        let mut first = true;
        while ctx.update_lights(program, &mut light_index)? {
            ctx.set_lighting_render_states(first);
            ctx.draw_fullscreen()?;
            first = false;
        }
        Ok(())
    }
}
