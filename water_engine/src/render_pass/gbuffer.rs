/// G-buffer pass: geometry into depth + albedo + normal + surface-parameter targets
///
/// Two uses:
/// - owned targets (`new`): clears and fills a fresh G-buffer with the opaque draw calls
/// - external target (`with_target`): draws a filtered subset on top of an
///   existing buffer without clearing, e.g. transparent surfaces into the
///   full-scene buffer

use glam::Vec4;
use crate::device::{
    Attachment, DepthFunc, Features, FramebufferDesc, FramebufferHandle, GraphicsDevice,
    RenderStateGuard, TextureDesc, TextureFormat, TextureHandle, FilterMode, UniformValue,
};
use crate::error::Result;
use crate::render_pass::RenderPass;
use crate::renderer::{DrawcallFilter, FrameContext};
use crate::uniforms;

/// Textures behind a G-buffer framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GBufferTextures {
    pub depth: TextureHandle,
    pub albedo: TextureHandle,
    pub normal: TextureHandle,
    pub others: TextureHandle,
}

impl GBufferTextures {
    /// Allocate depth (Depth32F), albedo (RGBA8), normal (`normal_format`) and others (RGBA8)
    pub fn create(
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
        normal_format: TextureFormat,
    ) -> Result<Self> {
        let nearest = |format| TextureDesc::render_target(width, height, format).with_filter(FilterMode::Nearest);
        Ok(Self {
            depth: device.create_texture(nearest(TextureFormat::Depth32F))?,
            albedo: device.create_texture(TextureDesc::render_target(width, height, TextureFormat::Rgba8))?,
            normal: device.create_texture(nearest(normal_format))?,
            others: device.create_texture(nearest(TextureFormat::Rgba8))?,
        })
    }

    /// Framebuffer with depth and three color targets in draw order
    pub fn framebuffer_desc(&self) -> FramebufferDesc {
        FramebufferDesc::new()
            .with_attachment(Attachment::Depth, self.depth)
            .with_attachment(Attachment::Color(0), self.albedo)
            .with_attachment(Attachment::Color(1), self.normal)
            .with_attachment(Attachment::Color(2), self.others)
            .with_draw_buffers(&[Attachment::Color(0), Attachment::Color(1), Attachment::Color(2)])
    }
}

pub struct GBufferRenderPass {
    framebuffer: FramebufferHandle,
    textures: Option<GBufferTextures>,
    filter: DrawcallFilter,
    collection_index: usize,
    clear: bool,
}

impl GBufferRenderPass {
    /// Own a `width` x `height` G-buffer and fill it with opaque draw calls
    pub fn new(device: &mut dyn GraphicsDevice, width: u32, height: u32) -> Result<Self> {
        let textures = GBufferTextures::create(device, width, height, TextureFormat::Rgba16F)?;
        let framebuffer = device.create_framebuffer(textures.framebuffer_desc())?;
        Ok(Self {
            framebuffer,
            textures: Some(textures),
            filter: DrawcallFilter::Opaque,
            collection_index: 0,
            clear: true,
        })
    }

    /// Draw the draw calls `filter` accepts into an existing framebuffer, keeping its contents
    pub fn with_target(framebuffer: FramebufferHandle, filter: DrawcallFilter) -> Self {
        Self {
            framebuffer,
            textures: None,
            filter,
            collection_index: 0,
            clear: false,
        }
    }

    pub fn textures(&self) -> Option<&GBufferTextures> {
        self.textures.as_ref()
    }

    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    pub fn filter(&self) -> DrawcallFilter {
        self.filter
    }
}

impl RenderPass for GBufferRenderPass {
    fn name(&self) -> &str {
        match self.filter {
            DrawcallFilter::Transparent => "GBufferTransparent",
            _ => "GBuffer",
        }
    }

    fn target(&self) -> Option<FramebufferHandle> {
        Some(self.framebuffer)
    }

    fn render(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        if self.clear {
            ctx.device().clear(Some(Vec4::ZERO), Some(1.0))?;
        }

        let mut ctx = RenderStateGuard::new(ctx);
        ctx.device().set_feature_enabled(Features::DEPTH_TEST, true);
        ctx.device().set_feature_enabled(Features::BLEND, false);
        ctx.device().set_depth_func(DepthFunc::Less);

        let drawcalls = ctx.drawcalls(self.collection_index);
        for drawcall in drawcalls.iter().filter(|d| self.filter.accepts(&d.material)) {
            ctx.prepare_drawcall(drawcall)?;

            let program = drawcall.material.program();
            let device = ctx.device();
            if let Some(location) = device.uniform_location(program, uniforms::FORWARD_PASS) {
                device.set_uniform(program, location, UniformValue::Int(0))?;
            }

            ctx.draw(drawcall)?;
        }
        Ok(())
    }
}
