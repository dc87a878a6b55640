/// Transform update callbacks
///
/// Each registered program may carry a callback that writes its
/// camera/object uniforms before a draw. Locations are resolved once at
/// registration so the per-draw work is only matrix math and uploads.

use glam::Mat4;
use crate::camera::Camera;
use crate::device::{GraphicsDevice, ProgramHandle, UniformLocation, UniformValue};
use crate::error::Result;
use crate::uniforms;

/// Inputs of one transform update
pub struct TransformArgs<'c> {
    pub program: ProgramHandle,
    pub world_matrix: Mat4,
    pub camera: &'c Camera,
    /// True when the camera differs from the one this program last saw (or the caller forced it)
    pub camera_changed: bool,
    /// Seconds of animation time, wrapped by the application
    pub elapsed_time: f32,
}

/// Resolved locations of every uniform a transform callback may write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformLocations {
    pub world: Option<UniformLocation>,
    pub world_view: Option<UniformLocation>,
    pub world_view_proj: Option<UniformLocation>,
    pub view: Option<UniformLocation>,
    pub projection: Option<UniformLocation>,
    pub inv_view: Option<UniformLocation>,
    pub inv_proj: Option<UniformLocation>,
    pub elapsed_time: Option<UniformLocation>,
}

impl TransformLocations {
    pub fn resolve(device: &dyn GraphicsDevice, program: ProgramHandle) -> Self {
        let locate = |name: &str| device.uniform_location(program, name);
        Self {
            world: locate(uniforms::WORLD_MATRIX),
            world_view: locate(uniforms::WORLD_VIEW_MATRIX),
            world_view_proj: locate(uniforms::WORLD_VIEW_PROJ_MATRIX),
            view: locate(uniforms::VIEW_MATRIX),
            projection: locate(uniforms::PROJECTION_MATRIX),
            inv_view: locate(uniforms::INV_VIEW_MATRIX),
            inv_proj: locate(uniforms::INV_PROJ_MATRIX),
            elapsed_time: locate(uniforms::ELAPSED_TIME),
        }
    }
}

pub type TransformUpdateFn =
    fn(&mut dyn GraphicsDevice, &TransformLocations, &TransformArgs<'_>) -> Result<()>;

#[derive(Clone)]
pub struct TransformUpdater {
    locations: TransformLocations,
    update: TransformUpdateFn,
}

impl TransformUpdater {
    pub fn new(locations: TransformLocations, update: TransformUpdateFn) -> Self {
        Self { locations, update }
    }

    /// Geometry programs: world, world-view, world-view-projection and elapsed time
    pub fn object(device: &dyn GraphicsDevice, program: ProgramHandle) -> Self {
        Self::new(TransformLocations::resolve(device, program), update_object)
    }

    /// Fullscreen lighting programs: inverse view/projection refreshed only when
    /// the camera changed, world-view-projection every draw
    pub fn fullscreen(device: &dyn GraphicsDevice, program: ProgramHandle) -> Self {
        Self::new(TransformLocations::resolve(device, program), update_fullscreen)
    }

    /// Screen-space effects: projection, inverse projection and inverse view every draw
    pub fn screen_space(device: &dyn GraphicsDevice, program: ProgramHandle) -> Self {
        Self::new(TransformLocations::resolve(device, program), update_screen_space)
    }

    pub fn locations(&self) -> &TransformLocations {
        &self.locations
    }

    pub fn apply(&self, device: &mut dyn GraphicsDevice, args: &TransformArgs<'_>) -> Result<()> {
        (self.update)(device, &self.locations, args)
    }
}

impl std::fmt::Debug for TransformUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformUpdater")
            .field("locations", &self.locations)
            .finish_non_exhaustive()
    }
}

/// Upload `value` if the program declares the uniform
pub fn set_optional(
    device: &mut dyn GraphicsDevice,
    program: ProgramHandle,
    location: Option<UniformLocation>,
    value: impl Into<UniformValue>,
) -> Result<()> {
    match location {
        Some(location) => device.set_uniform(program, location, value.into()),
        None => Ok(()),
    }
}

// ===== STOCK CALLBACKS =====

pub fn update_object(
    device: &mut dyn GraphicsDevice,
    locations: &TransformLocations,
    args: &TransformArgs<'_>,
) -> Result<()> {
    let view = *args.camera.view_matrix();
    let world_view = view * args.world_matrix;
    let world_view_proj = *args.camera.projection_matrix() * world_view;

    set_optional(device, args.program, locations.world, args.world_matrix)?;
    set_optional(device, args.program, locations.world_view, world_view)?;
    set_optional(device, args.program, locations.world_view_proj, world_view_proj)?;
    set_optional(device, args.program, locations.elapsed_time, args.elapsed_time)?;
    if args.camera_changed {
        set_optional(device, args.program, locations.view, view)?;
        set_optional(device, args.program, locations.projection, *args.camera.projection_matrix())?;
    }
    Ok(())
}

pub fn update_fullscreen(
    device: &mut dyn GraphicsDevice,
    locations: &TransformLocations,
    args: &TransformArgs<'_>,
) -> Result<()> {
    if args.camera_changed {
        set_optional(device, args.program, locations.inv_view, args.camera.inverse_view_matrix())?;
        set_optional(device, args.program, locations.inv_proj, args.camera.inverse_projection_matrix())?;
    }
    let world_view_proj = args.camera.view_projection_matrix() * args.world_matrix;
    set_optional(device, args.program, locations.world_view_proj, world_view_proj)
}

pub fn update_screen_space(
    device: &mut dyn GraphicsDevice,
    locations: &TransformLocations,
    args: &TransformArgs<'_>,
) -> Result<()> {
    set_optional(device, args.program, locations.projection, *args.camera.projection_matrix())?;
    set_optional(device, args.program, locations.inv_proj, args.camera.inverse_projection_matrix())?;
    set_optional(device, args.program, locations.inv_view, args.camera.inverse_view_matrix())?;
    set_optional(device, args.program, locations.elapsed_time, args.elapsed_time)
}
