/// Skybox pass: environment drawn at the far plane behind everything already in the target

use std::sync::Arc;
use crate::device::{DepthFunc, Features, FramebufferHandle, RenderStateGuard};
use crate::error::Result;
use crate::material::Material;
use crate::render_pass::RenderPass;
use crate::renderer::FrameContext;

pub struct SkyboxRenderPass {
    material: Arc<Material>,
    target: Option<FramebufferHandle>,
}

impl SkyboxRenderPass {
    pub fn new(material: Arc<Material>, target: Option<FramebufferHandle>) -> Self {
        Self { material, target }
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

impl RenderPass for SkyboxRenderPass {
    fn name(&self) -> &str {
        "Skybox"
    }

    fn target(&self) -> Option<FramebufferHandle> {
        self.target
    }

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.material.apply(ctx.device())?;
        let inverse_view_projection = ctx.camera().inverse_view_projection_matrix();
        ctx.update_transforms(self.material.program(), inverse_view_projection, true)?;

        let mut ctx = RenderStateGuard::new(ctx);
        ctx.device().set_feature_enabled(Features::DEPTH_TEST, true);
        ctx.device().set_feature_enabled(Features::BLEND, false);
        ctx.device().set_depth_func(DepthFunc::LessEqual);
        ctx.draw_fullscreen()
    }
}
