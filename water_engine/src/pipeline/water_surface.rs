/// Water surface material and the scene-side program registration helpers
///
/// The water program is drawn twice per frame: into the full-scene G-buffer
/// (`ForwardPass = 0`) so the reflection pass sees its normal and
/// reflectivity, and forward lit by the transparency pass (`ForwardPass = 1`).

use std::sync::Arc;
use glam::{Mat4, Vec2, Vec3};
use crate::device::{MeshHandle, ProgramHandle, TextureHandle};
use crate::error::Result;
use crate::lighting::LightUpdater;
use crate::material::{Material, MaterialDesc};
use crate::pipeline::settings::WaterSurfaceSettings;
use crate::renderer::{DrawcallInfo, Renderer, TransformUpdater};
use crate::uniforms;
use crate::engine_debug;

/// Textures sampled by the water program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterTextures {
    pub color: TextureHandle,
    pub normal: TextureHandle,
    /// Flow directions in RG, noise in A
    pub flow: TextureHandle,
}

/// Register `program` as a lit geometry program
///
/// Object transforms every draw and the renderer's default light updater.
pub fn register_geometry_program(renderer: &mut Renderer, program: ProgramHandle) -> Result<()> {
    let (transform, lights) = {
        let device = renderer.lock_device()?;
        (
            TransformUpdater::object(&*device, program),
            LightUpdater::new(&*device, program, renderer.config().lights_per_batch),
        )
    };
    renderer.register_shader_program(program, Some(transform), Some(lights));
    Ok(())
}

/// Uniform names a lit geometry program receives from the renderer
pub fn geometry_filtered_uniforms(lights_per_batch: usize) -> Vec<String> {
    let mut names: Vec<String> = uniforms::OBJECT_TRANSFORM_UNIFORMS
        .iter()
        .chain([uniforms::VIEW_MATRIX, uniforms::PROJECTION_MATRIX, uniforms::FORWARD_PASS].iter())
        .map(|name| name.to_string())
        .collect();
    names.extend(uniforms::light_uniform_names(lights_per_batch));
    names
}

pub struct WaterSurface {
    material: Arc<Material>,
    settings: WaterSurfaceSettings,
}

impl WaterSurface {
    /// Register the water program and create its transparent material
    pub fn new(
        renderer: &mut Renderer,
        program: ProgramHandle,
        textures: WaterTextures,
        settings: WaterSurfaceSettings,
    ) -> Result<Self> {
        register_geometry_program(renderer, program)?;

        let material = {
            let device = renderer.lock_device()?;
            let mut desc = MaterialDesc {
                filtered_uniforms: geometry_filtered_uniforms(renderer.config().lights_per_batch),
                ..MaterialDesc::new(program)
            }
            .transparent(true)
            .with_property(uniforms::COLOR_TEXTURE, textures.color)
            .with_property(uniforms::NORMAL_TEXTURE, textures.normal)
            .with_property(uniforms::FLOW_TEXTURE, textures.flow)
            .with_property(uniforms::COLOR, settings.color)
            .with_property(uniforms::JUMP, settings.jump)
            .with_property(uniforms::TILING, settings.tiling)
            .with_property(uniforms::SPEED, settings.speed)
            .with_property(uniforms::FLOW_STRENGTH, settings.flow_strength)
            .with_property(uniforms::FLOW_OFFSET, settings.flow_offset);
            // Opacity is optional: only forward programs that blend declare it
            if device.uniform_location(program, uniforms::ALPHA).is_some() {
                desc = desc.with_property(uniforms::ALPHA, settings.alpha);
            }
            Material::new(&*device, desc)?
        };

        engine_debug!("water3d::WaterSurface", "Water material created");
        Ok(Self {
            material: Arc::new(material),
            settings,
        })
    }

    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    pub fn settings(&self) -> &WaterSurfaceSettings {
        &self.settings
    }

    /// Draw call of `mesh` (submesh 0) with the water material
    pub fn drawcall(&self, mesh: MeshHandle, world_matrix: Mat4) -> DrawcallInfo {
        DrawcallInfo::new(mesh, 0, Arc::clone(&self.material), world_matrix)
    }

    pub fn set_color(&mut self, color: Vec3) -> Result<()> {
        self.material.set_uniform(uniforms::COLOR, color)?;
        self.settings.color = color;
        Ok(())
    }

    pub fn set_jump(&mut self, jump: Vec2) -> Result<()> {
        self.material.set_uniform(uniforms::JUMP, jump)?;
        self.settings.jump = jump;
        Ok(())
    }

    pub fn set_tiling(&mut self, tiling: i32) -> Result<()> {
        self.material.set_uniform(uniforms::TILING, tiling)?;
        self.settings.tiling = tiling;
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.material.set_uniform(uniforms::SPEED, speed)?;
        self.settings.speed = speed;
        Ok(())
    }

    pub fn set_flow_strength(&mut self, flow_strength: f32) -> Result<()> {
        self.material.set_uniform(uniforms::FLOW_STRENGTH, flow_strength)?;
        self.settings.flow_strength = flow_strength;
        Ok(())
    }

    pub fn set_flow_offset(&mut self, flow_offset: f32) -> Result<()> {
        self.material.set_uniform(uniforms::FLOW_OFFSET, flow_offset)?;
        self.settings.flow_offset = flow_offset;
        Ok(())
    }

    /// Fails with `InvalidResource` if the program has no `Alpha` uniform
    pub fn set_alpha(&mut self, alpha: f32) -> Result<()> {
        self.material.set_uniform(uniforms::ALPHA, alpha)?;
        self.settings.alpha = alpha;
        Ok(())
    }
}
