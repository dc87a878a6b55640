/// Per-frame view of the renderer handed to render passes
///
/// Built by `Renderer::render` from disjoint borrows of the renderer's
/// fields plus the locked device, so a pass can draw, query draw calls and
/// run program callbacks without holding the renderer itself.

use glam::Mat4;
use crate::camera::Camera;
use crate::device::{
    BlendFunc, DepthFunc, DeviceAccess, Features, GraphicsDevice, MeshHandle, ProgramHandle,
};
use crate::error::Result;
use crate::lighting::Light;
use crate::renderer::drawcall::{DrawcallCollection, DrawcallInfo};
use crate::renderer::program_registry::ProgramRegistry;
use crate::engine_warn;

pub struct FrameContext<'a> {
    device: &'a mut dyn GraphicsDevice,
    camera: &'a Camera,
    lights: &'a [Light],
    collections: &'a [DrawcallCollection],
    programs: &'a mut ProgramRegistry,
    fullscreen_mesh: MeshHandle,
    elapsed_time: f32,
}

impl<'a> FrameContext<'a> {
    pub(crate) fn new(
        device: &'a mut dyn GraphicsDevice,
        camera: &'a Camera,
        lights: &'a [Light],
        collections: &'a [DrawcallCollection],
        programs: &'a mut ProgramRegistry,
        fullscreen_mesh: MeshHandle,
        elapsed_time: f32,
    ) -> Self {
        Self {
            device,
            camera,
            lights,
            collections,
            programs,
            fullscreen_mesh,
            elapsed_time,
        }
    }

    // ===== ACCESSORS =====

    pub fn device(&mut self) -> &mut (dyn GraphicsDevice + 'a) {
        &mut *self.device
    }

    pub fn camera(&self) -> &'a Camera {
        self.camera
    }

    pub fn lights(&self) -> &'a [Light] {
        self.lights
    }

    /// Draw calls of collection `index`, empty if the collection does not exist
    pub fn drawcalls(&self, index: usize) -> &'a [DrawcallInfo] {
        match self.collections.get(index) {
            Some(collection) => collection.drawcalls(),
            None => {
                engine_warn!("water3d::FrameContext", "Unknown drawcall collection {}", index);
                &[]
            }
        }
    }

    pub fn fullscreen_mesh(&self) -> MeshHandle {
        self.fullscreen_mesh
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    // ===== DRAW HELPERS =====

    /// Apply the draw call's material then run its program's transform callback
    pub fn prepare_drawcall(&mut self, drawcall: &DrawcallInfo) -> Result<()> {
        drawcall.material.apply(&mut *self.device)?;
        self.update_transforms(drawcall.material.program(), drawcall.world_matrix, false)
    }

    pub fn update_transforms(
        &mut self,
        program: ProgramHandle,
        world_matrix: Mat4,
        force_camera_changed: bool,
    ) -> Result<()> {
        self.programs.update_transforms(
            &mut *self.device,
            program,
            world_matrix,
            self.camera,
            self.elapsed_time,
            force_camera_changed,
        )
    }

    /// Upload the next light batch for `program`; false once all lights are consumed
    pub fn update_lights(&mut self, program: ProgramHandle, index: &mut usize) -> Result<bool> {
        self.programs
            .update_lights(&mut *self.device, program, self.lights, index)
    }

    /// Raster state for a light batch
    ///
    /// The first batch writes over the target with blending off and depth
    /// LessEqual. Later batches add on top (ONE, ONE) and only touch pixels
    /// whose depth equals the stored one.
    pub fn set_lighting_render_states(&mut self, first: bool) {
        let device = &mut *self.device;
        device.set_feature_enabled(Features::BLEND, !first);
        device.set_blend_func(BlendFunc::ADDITIVE);
        device.set_depth_func(if first { DepthFunc::LessEqual } else { DepthFunc::Equal });
    }

    pub fn draw(&mut self, drawcall: &DrawcallInfo) -> Result<()> {
        self.device.draw_submesh(drawcall.mesh, drawcall.submesh)
    }

    pub fn draw_fullscreen(&mut self) -> Result<()> {
        self.device.draw_submesh(self.fullscreen_mesh, 0)
    }
}

impl DeviceAccess for FrameContext<'_> {
    fn device_ref(&self) -> &dyn GraphicsDevice {
        &*self.device
    }

    fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        &mut *self.device
    }
}
