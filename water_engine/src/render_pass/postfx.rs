/// Post-processing pass: one fullscreen draw with a screen-space material
///
/// The transform callback receives the inverse view-projection as world
/// matrix and always sees the camera as changed, so screen-space programs
/// get fresh projection data every frame. Also used for the final composite
/// into the default framebuffer.

use std::sync::Arc;
use crate::device::FramebufferHandle;
use crate::error::Result;
use crate::material::Material;
use crate::render_pass::RenderPass;
use crate::renderer::FrameContext;

pub struct PostFxRenderPass {
    name: String,
    material: Arc<Material>,
    target: Option<FramebufferHandle>,
}

impl PostFxRenderPass {
    pub fn new(name: &str, material: Arc<Material>, target: Option<FramebufferHandle>) -> Self {
        Self {
            name: name.to_string(),
            material,
            target,
        }
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }
}

impl RenderPass for PostFxRenderPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<FramebufferHandle> {
        self.target
    }

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        self.material.apply(ctx.device())?;

        let inverse_view_projection = ctx.camera().inverse_view_projection_matrix();
        ctx.update_transforms(self.material.program(), inverse_view_projection, true)?;

        ctx.draw_fullscreen()
    }
}
