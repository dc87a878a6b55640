/// G-buffer copy pass
///
/// Fullscreen copy whose program also writes depth. Depth writes only land
/// when the test passes, so the depth function is forced to Always for the
/// draw and restored afterwards.

use std::sync::Arc;
use crate::device::{DepthFunc, Features, FramebufferHandle, RenderStateGuard};
use crate::error::Result;
use crate::material::Material;
use crate::render_pass::RenderPass;
use crate::renderer::FrameContext;

pub struct GBufferCopyPass {
    material: Arc<Material>,
    target: Option<FramebufferHandle>,
}

impl GBufferCopyPass {
    pub fn new(material: Arc<Material>, target: Option<FramebufferHandle>) -> Self {
        Self { material, target }
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

impl RenderPass for GBufferCopyPass {
    fn name(&self) -> &str {
        "GBufferCopy"
    }

    fn target(&self) -> Option<FramebufferHandle> {
        self.target
    }

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.material.apply(ctx.device())?;

        let mut ctx = RenderStateGuard::new(ctx);
        ctx.device().set_feature_enabled(Features::DEPTH_TEST, true);
        ctx.device().set_depth_func(DepthFunc::Always);
        ctx.draw_fullscreen()
    }
}
