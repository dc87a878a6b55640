/// Transparency pass: forward-lit transparent surfaces blended over the scene
///
/// For every transparent draw call in the collection:
/// - prepare the draw call (material + transforms)
/// - raise the program's `ForwardPass` flag
/// - draw once per light batch: the first batch alpha-blends over the scene
///   (SRC_ALPHA, ONE_MINUS_SRC_ALPHA), later batches add their alpha-weighted
///   light (SRC_ALPHA, ONE), so the result is `a * sum(light) + (1 - a) * dst`
/// - lower the flag
///
/// With one light batch this is the plain (SRC_ALPHA, ONE_MINUS_SRC_ALPHA)
/// pair for the whole pass. Only extra batches switch to (SRC_ALPHA, ONE), so
/// each surface composites over the scene exactly once.
///
/// Depth compares with LessEqual so every batch of a surface passes where the
/// first one did.
///
/// Blend and depth state are restored when the pass ends, whatever the
/// collection held.

use crate::device::{BlendFunc, DepthFunc, Features, FramebufferHandle, ProgramHandle, RenderStateGuard};
use crate::error::Result;
use crate::render_pass::RenderPass;
use crate::renderer::{set_optional, DrawcallInfo, FrameContext};
use crate::uniforms;
use crate::engine_trace;

pub struct TransparencyPass {
    target: Option<FramebufferHandle>,
    collection_index: usize,
}

impl TransparencyPass {
    /// Draw the transparent subset of collection 0 into `target`
    pub fn new(target: Option<FramebufferHandle>) -> Self {
        Self::with_collection(target, 0)
    }

    pub fn with_collection(target: Option<FramebufferHandle>, collection_index: usize) -> Self {
        Self {
            target,
            collection_index,
        }
    }

    pub fn collection_index(&self) -> usize {
        self.collection_index
    }

    fn draw_lit(ctx: &mut FrameContext<'_>, drawcall: &DrawcallInfo, program: ProgramHandle) -> Result<()> {
        ctx.device().set_feature_enabled(Features::BLEND, true);
        ctx.device().set_depth_func(DepthFunc::LessEqual);

        let mut light_index = 0;
        let mut batches = 0;
        while ctx.update_lights(program, &mut light_index)? {
            let blend = if batches == 0 { BlendFunc::ALPHA } else { BlendFunc::ALPHA_ADDITIVE };
            ctx.device().set_blend_func(blend);
            ctx.draw(drawcall)?;
            batches += 1;
        }
        engine_trace!("water3d::TransparencyPass", "Drew {:?} in {} batch(es)", drawcall, batches);
        Ok(())
    }

    fn set_forward_flag(ctx: &mut FrameContext<'_>, program: ProgramHandle, value: i32) -> Result<()> {
        let device = ctx.device();
        let location = device.uniform_location(program, uniforms::FORWARD_PASS);
        set_optional(device, program, location, value)
    }
}

impl RenderPass for TransparencyPass {
    fn name(&self) -> &str {
        "Transparency"
    }

    fn target(&self) -> Option<FramebufferHandle> {
        self.target
    }

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let mut ctx = RenderStateGuard::new(ctx);

        let drawcalls = ctx.drawcalls(self.collection_index);
        for drawcall in drawcalls.iter().filter(|d| d.material.is_transparent()) {
            let program = drawcall.material.program();
            ctx.prepare_drawcall(drawcall)?;

            Self::set_forward_flag(&mut ctx, program, 1)?;
            let drawn = Self::draw_lit(&mut ctx, drawcall, program);
            Self::set_forward_flag(&mut ctx, program, 0)?;
            drawn?;
        }

        Ok(())
    }
}
