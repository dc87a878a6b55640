/// Renderer - owns the pass list and the per-frame scene data
///
/// A frame is:
/// 1. the application queues draw calls and lights and sets the camera
/// 2. `render()` clears the default framebuffer, then for every enabled pass
///    in insertion order binds the pass target and runs the pass
/// 3. the device presents, draw calls and lights are cleared
///
/// Passes see the renderer through a [`FrameContext`] built from disjoint
/// borrows, so they can call `prepare_drawcall`, `update_transforms` and
/// `update_lights` while the renderer owns them.

use std::sync::{Arc, Mutex, MutexGuard};
use glam::Mat4;
use crate::camera::Camera;
use crate::device::{GraphicsDevice, MeshDesc, MeshHandle, ProgramHandle};
use crate::error::{Error, Result};
use crate::lighting::{Light, LightUpdater};
use crate::render_pass::RenderPass;
use crate::renderer::config::RendererConfig;
use crate::renderer::drawcall::{DrawcallCollection, DrawcallFilter, DrawcallInfo};
use crate::renderer::frame_context::FrameContext;
use crate::renderer::program_registry::ProgramRegistry;
use crate::renderer::transform_updater::TransformUpdater;
use crate::{engine_bail, engine_debug, engine_err, engine_info, engine_trace};

/// Identifies a pass added to a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderPassId(usize);

impl RenderPassId {
    pub fn index(&self) -> usize {
        self.0
    }
}

struct PassSlot {
    pass: Box<dyn RenderPass>,
    enabled: bool,
}

pub struct Renderer {
    device: Arc<Mutex<dyn GraphicsDevice>>,
    config: RendererConfig,
    passes: Vec<PassSlot>,
    collections: Vec<DrawcallCollection>,
    camera: Camera,
    lights: Vec<Light>,
    programs: ProgramRegistry,
    fullscreen_mesh: MeshHandle,
    elapsed_time: f32,
}

impl Renderer {
    /// Create a renderer drawing through `device`
    ///
    /// Uploads the fullscreen quad and creates draw-call collection 0, which
    /// accepts every draw call.
    pub fn new(device: Arc<Mutex<dyn GraphicsDevice>>, config: RendererConfig) -> Result<Self> {
        if config.lights_per_batch == 0 {
            return Err(Error::InitializationFailed(
                "lights_per_batch must be at least 1".to_string(),
            ));
        }

        let fullscreen_mesh = {
            let mut device = lock(&device)?;
            device.create_mesh(MeshDesc::fullscreen_quad())?
        };

        engine_info!(
            "water3d::Renderer",
            "Renderer created ({} light(s) per batch)",
            config.lights_per_batch
        );

        Ok(Self {
            device,
            config,
            passes: Vec::new(),
            collections: vec![DrawcallCollection::new(DrawcallFilter::All)],
            camera: Camera::default(),
            lights: Vec::new(),
            programs: ProgramRegistry::new(),
            fullscreen_mesh,
            elapsed_time: 0.0,
        })
    }

    pub fn device(&self) -> &Arc<Mutex<dyn GraphicsDevice>> {
        &self.device
    }

    /// Lock the shared device, mapping a poisoned lock to `Error::BackendError`
    pub fn lock_device(&self) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
        lock(&self.device)
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn fullscreen_mesh(&self) -> MeshHandle {
        self.fullscreen_mesh
    }

    // ===== RENDER PASSES =====

    /// Append a pass; passes run in insertion order
    pub fn add_render_pass<P: RenderPass + 'static>(&mut self, pass: P) -> RenderPassId {
        let id = RenderPassId(self.passes.len());
        engine_debug!("water3d::Renderer", "Added render pass #{} '{}'", id.0, pass.name());
        self.passes.push(PassSlot {
            pass: Box::new(pass),
            enabled: true,
        });
        id
    }

    pub fn set_render_pass_enabled(&mut self, id: RenderPassId, enabled: bool) -> Result<()> {
        match self.passes.get_mut(id.0) {
            Some(slot) => {
                slot.enabled = enabled;
                Ok(())
            }
            None => engine_bail!("water3d::Renderer", "Unknown render pass #{}", id.0),
        }
    }

    pub fn is_render_pass_enabled(&self, id: RenderPassId) -> bool {
        self.passes.get(id.0).is_some_and(|slot| slot.enabled)
    }

    pub fn render_pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Pass names in execution order
    pub fn render_pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|slot| slot.pass.name()).collect()
    }

    // ===== PROGRAMS =====

    /// Register the callbacks run for `program` before its draws
    pub fn register_shader_program(
        &mut self,
        program: ProgramHandle,
        transform: Option<TransformUpdater>,
        lights: Option<LightUpdater>,
    ) {
        engine_debug!(
            "water3d::Renderer",
            "Registered program (transform: {}, lights: {})",
            transform.is_some(),
            lights.is_some()
        );
        self.programs.register(program, transform, lights);
    }

    pub fn is_program_registered(&self, program: ProgramHandle) -> bool {
        self.programs.is_registered(program)
    }

    /// Light callback for `program` with `config.lights_per_batch` slots
    pub fn default_light_updater(&self, program: ProgramHandle) -> Result<LightUpdater> {
        let device = self.lock_device()?;
        Ok(LightUpdater::new(&*device, program, self.config.lights_per_batch))
    }

    // ===== SCENE DATA =====

    /// Add a collection receiving the draw calls `filter` accepts; returns its index
    pub fn add_drawcall_collection(&mut self, filter: DrawcallFilter) -> usize {
        self.collections.push(DrawcallCollection::new(filter));
        self.collections.len() - 1
    }

    /// Queue a draw call for the current frame in every accepting collection
    pub fn add_drawcall(&mut self, drawcall: DrawcallInfo) {
        for collection in &mut self.collections {
            collection.offer(&drawcall);
        }
    }

    pub fn drawcalls(&self, collection: usize) -> &[DrawcallInfo] {
        self.collections
            .get(collection)
            .map(DrawcallCollection::drawcalls)
            .unwrap_or(&[])
    }

    pub fn set_current_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn current_camera(&self) -> &Camera {
        &self.camera
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn set_elapsed_time(&mut self, elapsed_time: f32) {
        self.elapsed_time = elapsed_time;
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    // ===== DRAW HELPERS (outside a frame) =====

    pub fn prepare_drawcall(&mut self, drawcall: &DrawcallInfo) -> Result<()> {
        self.with_frame_context(|ctx| ctx.prepare_drawcall(drawcall))
    }

    pub fn update_transforms(
        &mut self,
        program: ProgramHandle,
        world_matrix: Mat4,
        force_camera_changed: bool,
    ) -> Result<()> {
        self.with_frame_context(|ctx| ctx.update_transforms(program, world_matrix, force_camera_changed))
    }

    /// Advance the light loop of `program` over `lights`
    pub fn update_lights(
        &mut self,
        program: ProgramHandle,
        lights: &[Light],
        index: &mut usize,
    ) -> Result<bool> {
        let mut device = lock(&self.device)?;
        self.programs.update_lights(&mut *device, program, lights, index)
    }

    pub fn set_lighting_render_states(&mut self, first: bool) -> Result<()> {
        self.with_frame_context(|ctx| {
            ctx.set_lighting_render_states(first);
            Ok(())
        })
    }

    fn with_frame_context<R>(&mut self, f: impl FnOnce(&mut FrameContext<'_>) -> Result<R>) -> Result<R> {
        let Renderer {
            device,
            collections,
            camera,
            lights,
            programs,
            fullscreen_mesh,
            elapsed_time,
            ..
        } = self;
        let mut device = lock(device)?;
        let mut ctx = FrameContext::new(
            &mut *device,
            &*camera,
            &lights[..],
            &collections[..],
            &mut *programs,
            *fullscreen_mesh,
            *elapsed_time,
        );
        f(&mut ctx)
    }

    // ===== FRAME =====

    /// Run every enabled pass, present, then clear this frame's draw calls and lights
    ///
    /// The first failing pass aborts the frame and its error is returned; the
    /// queued draw calls and lights are kept in that case.
    pub fn render(&mut self) -> Result<()> {
        let Renderer {
            device,
            config,
            passes,
            collections,
            camera,
            lights,
            programs,
            fullscreen_mesh,
            elapsed_time,
        } = self;

        let mut device = lock(device)?;
        device.bind_framebuffer(None)?;
        device.clear(Some(config.clear_color), Some(config.clear_depth))?;

        {
            let mut ctx = FrameContext::new(
                &mut *device,
                &*camera,
                &lights[..],
                &collections[..],
                &mut *programs,
                *fullscreen_mesh,
                *elapsed_time,
            );

            for (index, slot) in passes.iter_mut().enumerate() {
                if !slot.enabled {
                    continue;
                }
                engine_trace!("water3d::Renderer", "Pass #{} '{}'", index, slot.pass.name());
                ctx.device().bind_framebuffer(slot.pass.target())?;
                slot.pass.render(&mut ctx)?;
            }
        }

        device.bind_framebuffer(None)?;
        device.present()?;
        drop(device);

        for collection in collections.iter_mut() {
            collection.clear();
        }
        lights.clear();
        Ok(())
    }
}

fn lock(device: &Arc<Mutex<dyn GraphicsDevice>>) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(|_| engine_err!("water3d::Renderer", "Graphics device lock poisoned"))
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
