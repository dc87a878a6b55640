/// Per-program callbacks and camera-change tracking

use glam::Mat4;
use rustc_hash::FxHashMap;
use crate::camera::Camera;
use crate::device::{GraphicsDevice, ProgramHandle};
use crate::error::Result;
use crate::lighting::{Light, LightUpdater};
use crate::renderer::transform_updater::{TransformArgs, TransformUpdater};

#[derive(Debug, Default)]
struct ProgramEntry {
    transform: Option<TransformUpdater>,
    lights: Option<LightUpdater>,
    /// (view, projection) of the camera seen by the last transform update
    last_camera: Option<(Mat4, Mat4)>,
}

/// Registered shader programs
///
/// Programs without an entry have no callbacks: transform updates do
/// nothing and the light loop runs exactly once with no light uniforms.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    entries: FxHashMap<ProgramHandle, ProgramEntry>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the callbacks of `program`; replacing resets its camera cache
    pub fn register(
        &mut self,
        program: ProgramHandle,
        transform: Option<TransformUpdater>,
        lights: Option<LightUpdater>,
    ) {
        self.entries.insert(
            program,
            ProgramEntry {
                transform,
                lights,
                last_camera: None,
            },
        );
    }

    pub fn is_registered(&self, program: ProgramHandle) -> bool {
        self.entries.contains_key(&program)
    }

    pub fn light_updater(&self, program: ProgramHandle) -> Option<&LightUpdater> {
        self.entries.get(&program)?.lights.as_ref()
    }

    /// Run the transform callback of `program`
    ///
    /// `camera_changed` is true when `camera` differs from the camera this
    /// program saw on its previous update (or on the first update), or when
    /// `force_camera_changed` is set.
    pub fn update_transforms(
        &mut self,
        device: &mut dyn GraphicsDevice,
        program: ProgramHandle,
        world_matrix: Mat4,
        camera: &Camera,
        elapsed_time: f32,
        force_camera_changed: bool,
    ) -> Result<()> {
        let Some(entry) = self.entries.get_mut(&program) else {
            return Ok(());
        };

        let seen = (*camera.view_matrix(), *camera.projection_matrix());
        let camera_changed = force_camera_changed || entry.last_camera != Some(seen);
        entry.last_camera = Some(seen);

        match &entry.transform {
            Some(transform) => transform.apply(
                device,
                &TransformArgs {
                    program,
                    world_matrix,
                    camera,
                    camera_changed,
                    elapsed_time,
                },
            ),
            None => Ok(()),
        }
    }

    /// Advance the light loop of `program` by one batch
    ///
    /// Without a light callback the loop yields a single iteration.
    pub fn update_lights(
        &self,
        device: &mut dyn GraphicsDevice,
        program: ProgramHandle,
        lights: &[Light],
        index: &mut usize,
    ) -> Result<bool> {
        match self.light_updater(program) {
            Some(updater) => updater.update(device, program, lights, index),
            None if *index == 0 => {
                *index = 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
