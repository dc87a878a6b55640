/// Water pipeline: the full pass chain of the water demo
///
/// Pass order:
/// 1. GBuffer (opaque geometry)
/// 2. Deferred lighting into the main scene buffer (shares the G-buffer depth)
/// 3. Skybox into the main scene buffer
/// 4. GBufferCopy: lit scene + opaque G-buffer into the full-scene G-buffer
/// 5. GBuffer (transparent only) on top of the full-scene G-buffer
/// 6. Transparency (forward lit) into the main scene buffer
/// 7. SSR into the reflection buffer
/// 8. Copy reflection into temp 0
/// 9. `max_blur_iterations` blur pairs (horizontal temp 0 -> 1, vertical 1 -> 0),
///    only `blur_iterations` of them enabled
/// 10. Composite into the default framebuffer

use std::sync::Arc;
use glam::Vec2;
use crate::device::{
    Attachment, FramebufferDesc, FramebufferHandle, GraphicsDevice, ProgramHandle, TextureDesc,
    TextureFormat, TextureHandle, WrapMode,
};
use crate::error::{Error, Result};
use crate::lighting::LightUpdater;
use crate::material::{Material, MaterialDesc};
use crate::pipeline::settings::{ShowType, SsrSettings, WaterPipelineSettings};
use crate::render_pass::{
    DeferredRenderPass, GBufferCopyPass, GBufferRenderPass, GBufferTextures, PostFxRenderPass,
    SkyboxRenderPass, TransparencyPass,
};
use crate::renderer::{DrawcallFilter, RenderPassId, Renderer, TransformUpdater};
use crate::uniforms;
use crate::{engine_err, engine_info};

/// Programs the pipeline draws with, created by the backend from external assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterPrograms {
    pub deferred: ProgramHandle,
    pub skybox: ProgramHandle,
    pub gbuffer_copy: ProgramHandle,
    pub ssr: ProgramHandle,
    pub copy: ProgramHandle,
    pub blur: ProgramHandle,
    pub composite: ProgramHandle,
}

/// Intermediate targets owned by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterTargets {
    pub gbuffer: GBufferTextures,
    pub full_scene: GBufferTextures,
    pub scene: TextureHandle,
    pub reflection: TextureHandle,
    pub temp: [TextureHandle; 2],
    pub main_scene_framebuffer: FramebufferHandle,
    pub full_scene_framebuffer: FramebufferHandle,
    pub reflection_framebuffer: FramebufferHandle,
    pub temp_framebuffers: [FramebufferHandle; 2],
}

pub struct WaterPipeline {
    settings: WaterPipelineSettings,
    targets: WaterTargets,
    deferred_material: Arc<Material>,
    ssr_material: Arc<Material>,
    composite_material: Arc<Material>,
    blur_passes: Vec<(RenderPassId, RenderPassId)>,
    first_pass: RenderPassId,
}

impl WaterPipeline {
    /// Create every target, material and pass and append the passes to `renderer`
    ///
    /// Targets match the size of the default framebuffer. `environment` is the
    /// equirectangular sky texture shared by the deferred, skybox and composite
    /// programs.
    pub fn build(
        renderer: &mut Renderer,
        programs: &WaterPrograms,
        environment: TextureHandle,
        mut settings: WaterPipelineSettings,
    ) -> Result<Self> {
        if settings.max_blur_iterations == 0 {
            return Err(Error::InitializationFailed(
                "max_blur_iterations must be at least 1".to_string(),
            ));
        }
        settings.blur_iterations = settings.blur_iterations.min(settings.max_blur_iterations);

        let device_handle = Arc::clone(renderer.device());
        let mut device = device_handle
            .lock()
            .map_err(|_| engine_err!("water3d::WaterPipeline", "Graphics device lock poisoned"))?;
        let device: &mut dyn GraphicsDevice = &mut *device;
        let lights_per_batch = renderer.config().lights_per_batch;

        let (width, height) = device.framebuffer_size(None).ok_or_else(|| {
            Error::InitializationFailed("Default framebuffer has no size".to_string())
        })?;
        engine_info!("water3d::WaterPipeline", "Building water pipeline {}x{}", width, height);

        // ========== TARGETS ==========
        let gbuffer_pass = GBufferRenderPass::new(device, width, height)?;
        let gbuffer = *gbuffer_pass
            .textures()
            .ok_or_else(|| engine_err!("water3d::WaterPipeline", "G-buffer pass has no textures"))?;

        let scene = device.create_texture(TextureDesc::render_target(width, height, TextureFormat::Rgba16F))?;
        let main_scene_framebuffer = device.create_framebuffer(
            FramebufferDesc::new()
                .with_attachment(Attachment::Depth, gbuffer.depth)
                .with_attachment(Attachment::Color(0), scene)
                .with_draw_buffers(&[Attachment::Color(0)]),
        )?;

        let full_scene = GBufferTextures::create(device, width, height, TextureFormat::Rgba16F)?;
        let full_scene_framebuffer = device.create_framebuffer(full_scene.framebuffer_desc())?;

        let reflection = device.create_texture(TextureDesc::render_target(width, height, TextureFormat::Rgba8))?;
        let reflection_framebuffer = device.create_framebuffer(color_target(reflection))?;

        let temp_desc = TextureDesc::render_target(width, height, TextureFormat::Rgba8).with_wrap(WrapMode::ClampToEdge);
        let temp = [
            device.create_texture(temp_desc.clone())?,
            device.create_texture(temp_desc)?,
        ];
        let temp_framebuffers = [
            device.create_framebuffer(color_target(temp[0]))?,
            device.create_framebuffer(color_target(temp[1]))?,
        ];

        let targets = WaterTargets {
            gbuffer,
            full_scene,
            scene,
            reflection,
            temp,
            main_scene_framebuffer,
            full_scene_framebuffer,
            reflection_framebuffer,
            temp_framebuffers,
        };

        // ========== PROGRAM CALLBACKS ==========
        renderer.register_shader_program(
            programs.deferred,
            Some(TransformUpdater::fullscreen(device, programs.deferred)),
            Some(LightUpdater::new(device, programs.deferred, lights_per_batch)),
        );
        renderer.register_shader_program(
            programs.skybox,
            Some(TransformUpdater::fullscreen(device, programs.skybox)),
            None,
        );
        renderer.register_shader_program(
            programs.ssr,
            Some(TransformUpdater::screen_space(device, programs.ssr)),
            None,
        );
        renderer.register_shader_program(
            programs.composite,
            Some(TransformUpdater::screen_space(device, programs.composite)),
            None,
        );

        // ========== MATERIALS ==========
        let mut deferred_filtered: Vec<String> = uniforms::light_uniform_names(lights_per_batch);
        deferred_filtered.extend(uniforms::FULLSCREEN_TRANSFORM_UNIFORMS.iter().map(|name| name.to_string()));
        let deferred_material = Arc::new(Material::new(
            device,
            MaterialDesc {
                filtered_uniforms: deferred_filtered,
                ..MaterialDesc::new(programs.deferred)
            }
            .with_property(uniforms::DEPTH_TEXTURE, gbuffer.depth)
            .with_property(uniforms::ALBEDO_TEXTURE, gbuffer.albedo)
            .with_property(uniforms::NORMAL_TEXTURE, gbuffer.normal)
            .with_property(uniforms::OTHERS_TEXTURE, gbuffer.others)
            .with_property(uniforms::ENVIRONMENT_TEXTURE, environment)
            .with_property(uniforms::SHOW_TYPE, settings.show_type as i32),
        )?);

        let skybox_material = Arc::new(Material::new(
            device,
            MaterialDesc::new(programs.skybox)
                .with_filtered(&uniforms::FULLSCREEN_TRANSFORM_UNIFORMS)
                .with_property(uniforms::ENVIRONMENT_TEXTURE, environment),
        )?);

        let gbuffer_copy_material = Arc::new(Material::new(
            device,
            MaterialDesc::new(programs.gbuffer_copy)
                .with_property(uniforms::SOURCE_TEXTURE, scene)
                .with_property(uniforms::DEPTH_TEXTURE, gbuffer.depth)
                .with_property(uniforms::NORMAL_TEXTURE, gbuffer.normal)
                .with_property(uniforms::OTHER_TEXTURE, gbuffer.others),
        )?);

        let ssr = settings.ssr;
        let ssr_material = Arc::new(Material::new(
            device,
            MaterialDesc::new(programs.ssr)
                .with_filtered(&uniforms::SCREEN_SPACE_TRANSFORM_UNIFORMS)
                .with_property(uniforms::SOURCE_TEXTURE, scene)
                .with_property(uniforms::DEPTH_TEXTURE, full_scene.depth)
                .with_property(uniforms::NORMAL_TEXTURE, full_scene.normal)
                .with_property(uniforms::SPECULAR_TEXTURE, full_scene.others)
                .with_property(uniforms::MAX_DISTANCE, ssr.max_distance)
                .with_property(uniforms::RESOLUTION, ssr.resolution)
                .with_property(uniforms::STEPS, ssr.steps)
                .with_property(uniforms::THICKNESS, ssr.thickness),
        )?);

        let copy_material = Arc::new(Material::new(
            device,
            MaterialDesc::new(programs.copy).with_property(uniforms::SOURCE_TEXTURE, reflection),
        )?);

        let blur_horizontal = Arc::new(Material::new(
            device,
            MaterialDesc::new(programs.blur)
                .with_property(uniforms::SOURCE_TEXTURE, temp[0])
                .with_property(uniforms::SCALE, Vec2::new(settings.blur_scale / width as f32, 0.0)),
        )?);
        let blur_vertical = Arc::new(Material::new(
            device,
            MaterialDesc::new(programs.blur)
                .with_property(uniforms::SOURCE_TEXTURE, temp[1])
                .with_property(uniforms::SCALE, Vec2::new(0.0, settings.blur_scale / height as f32)),
        )?);

        let composite_material = Arc::new(Material::new(
            device,
            MaterialDesc::new(programs.composite)
                .with_filtered(&uniforms::SCREEN_SPACE_TRANSFORM_UNIFORMS)
                .with_property(uniforms::SOURCE_TEXTURE, scene)
                .with_property(uniforms::REFLECTIVE_TEXTURE, reflection)
                .with_property(uniforms::BLUR_REFLECTIVE_TEXTURE, temp[0])
                .with_property(uniforms::SPECULAR_TEXTURE, full_scene.others)
                .with_property(uniforms::ENVIRONMENT_TEXTURE, environment)
                .with_property(uniforms::DEPTH_TEXTURE, full_scene.depth)
                .with_property(uniforms::NORMAL_TEXTURE, full_scene.normal),
        )?);

        // ========== PASSES ==========
        let first_pass = renderer.add_render_pass(gbuffer_pass);
        renderer.add_render_pass(DeferredRenderPass::new(
            Arc::clone(&deferred_material),
            Some(main_scene_framebuffer),
        ));
        renderer.add_render_pass(SkyboxRenderPass::new(skybox_material, Some(main_scene_framebuffer)));
        renderer.add_render_pass(GBufferCopyPass::new(gbuffer_copy_material, Some(full_scene_framebuffer)));
        renderer.add_render_pass(GBufferRenderPass::with_target(
            full_scene_framebuffer,
            DrawcallFilter::Transparent,
        ));
        renderer.add_render_pass(TransparencyPass::new(Some(main_scene_framebuffer)));
        renderer.add_render_pass(PostFxRenderPass::new(
            "SSR",
            Arc::clone(&ssr_material),
            Some(reflection_framebuffer),
        ));
        renderer.add_render_pass(PostFxRenderPass::new(
            "CopyReflection",
            copy_material,
            Some(temp_framebuffers[0]),
        ));

        let mut blur_passes = Vec::with_capacity(settings.max_blur_iterations);
        for _ in 0..settings.max_blur_iterations {
            let horizontal = renderer.add_render_pass(PostFxRenderPass::new(
                "BlurHorizontal",
                Arc::clone(&blur_horizontal),
                Some(temp_framebuffers[1]),
            ));
            let vertical = renderer.add_render_pass(PostFxRenderPass::new(
                "BlurVertical",
                Arc::clone(&blur_vertical),
                Some(temp_framebuffers[0]),
            ));
            blur_passes.push((horizontal, vertical));
        }

        renderer.add_render_pass(PostFxRenderPass::new(
            "Composite",
            Arc::clone(&composite_material),
            None,
        ));

        let mut pipeline = Self {
            settings,
            targets,
            deferred_material,
            ssr_material,
            composite_material,
            blur_passes,
            first_pass,
        };
        let blur_iterations = pipeline.settings.blur_iterations;
        pipeline.set_blur_iterations(renderer, blur_iterations)?;

        engine_info!(
            "water3d::WaterPipeline",
            "Water pipeline ready: {} passes, {} of {} blur iteration(s)",
            renderer.render_pass_count() - first_pass.index(),
            pipeline.settings.blur_iterations,
            pipeline.settings.max_blur_iterations
        );
        Ok(pipeline)
    }

    pub fn settings(&self) -> &WaterPipelineSettings {
        &self.settings
    }

    pub fn targets(&self) -> &WaterTargets {
        &self.targets
    }

    /// Id of the first pass added by `build`
    pub fn first_pass(&self) -> RenderPassId {
        self.first_pass
    }

    /// (horizontal, vertical) pass ids of every allocated blur pair
    pub fn blur_passes(&self) -> &[(RenderPassId, RenderPassId)] {
        &self.blur_passes
    }

    pub fn deferred_material(&self) -> &Arc<Material> {
        &self.deferred_material
    }

    pub fn ssr_material(&self) -> &Arc<Material> {
        &self.ssr_material
    }

    pub fn composite_material(&self) -> &Arc<Material> {
        &self.composite_material
    }

    // ===== UI SETTERS =====

    pub fn set_ssr_max_distance(&mut self, max_distance: f32) -> Result<()> {
        self.ssr_material.set_uniform(uniforms::MAX_DISTANCE, max_distance)?;
        self.settings.ssr.max_distance = max_distance;
        Ok(())
    }

    pub fn set_ssr_resolution(&mut self, resolution: f32) -> Result<()> {
        self.ssr_material.set_uniform(uniforms::RESOLUTION, resolution)?;
        self.settings.ssr.resolution = resolution;
        Ok(())
    }

    pub fn set_ssr_steps(&mut self, steps: i32) -> Result<()> {
        self.ssr_material.set_uniform(uniforms::STEPS, steps)?;
        self.settings.ssr.steps = steps;
        Ok(())
    }

    pub fn set_ssr_thickness(&mut self, thickness: f32) -> Result<()> {
        self.ssr_material.set_uniform(uniforms::THICKNESS, thickness)?;
        self.settings.ssr.thickness = thickness;
        Ok(())
    }

    /// Push all four SSR parameters at once
    pub fn set_ssr(&mut self, ssr: SsrSettings) -> Result<()> {
        self.set_ssr_max_distance(ssr.max_distance)?;
        self.set_ssr_resolution(ssr.resolution)?;
        self.set_ssr_steps(ssr.steps)?;
        self.set_ssr_thickness(ssr.thickness)
    }

    pub fn set_show_type(&mut self, show_type: ShowType) -> Result<()> {
        self.deferred_material
            .set_uniform(uniforms::SHOW_TYPE, show_type as i32)?;
        self.settings.show_type = show_type;
        Ok(())
    }

    /// Enable the first `iterations` blur pairs, clamped to `max_blur_iterations`
    pub fn set_blur_iterations(&mut self, renderer: &mut Renderer, iterations: usize) -> Result<()> {
        let iterations = iterations.min(self.blur_passes.len());
        for (index, (horizontal, vertical)) in self.blur_passes.iter().enumerate() {
            let enabled = index < iterations;
            renderer.set_render_pass_enabled(*horizontal, enabled)?;
            renderer.set_render_pass_enabled(*vertical, enabled)?;
        }
        self.settings.blur_iterations = iterations;
        Ok(())
    }
}

fn color_target(texture: TextureHandle) -> FramebufferDesc {
    FramebufferDesc::new()
        .with_attachment(Attachment::Color(0), texture)
        .with_draw_buffers(&[Attachment::Color(0)])
}
