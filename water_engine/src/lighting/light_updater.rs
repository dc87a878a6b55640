/// Light update callback
///
/// A program declares a fixed number of light slots. Drawing a surface lit
/// by more lights than that repeats the draw once per batch, advancing a
/// cursor through the light list:
///
/// ```ignore
/// let mut light_index = 0;
/// while updater.update(device, program, lights, &mut light_index)? {
///     device.draw_submesh(mesh, 0)?;
/// }
/// ```
///
/// Batch count is `ceil(n / capacity)` for `n >= 1` lights. An empty light
/// list still yields one batch so ambient (indirect) lighting is drawn.
/// `LightIndirect` is 1 on the first batch only, so additive batches do not
/// add the ambient term twice.

use crate::device::{GraphicsDevice, ProgramHandle, UniformLocation};
use crate::error::Result;
use crate::renderer::set_optional;
use crate::lighting::Light;
use crate::uniforms;
use glam::{Vec3, Vec4};

#[derive(Debug, Clone, Copy, Default)]
struct LightSlotLocations {
    kind: Option<UniformLocation>,
    color: Option<UniformLocation>,
    position: Option<UniformLocation>,
    direction: Option<UniformLocation>,
    attenuation: Option<UniformLocation>,
}

#[derive(Debug, Clone)]
pub struct LightUpdater {
    capacity: usize,
    indirect: Option<UniformLocation>,
    count: Option<UniformLocation>,
    slots: Vec<LightSlotLocations>,
}

impl LightUpdater {
    /// Resolve the light uniforms of `program` for `capacity` slots (minimum 1)
    pub fn new(device: &dyn GraphicsDevice, program: ProgramHandle, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let locate = |base: &str, index: usize| {
            device
                .uniform_location(program, &uniforms::indexed(base, index, capacity))
                .or_else(|| device.uniform_location(program, &format!("{}[{}]", base, index)))
        };

        let slots = (0..capacity)
            .map(|index| LightSlotLocations {
                kind: locate(uniforms::LIGHT_TYPE, index),
                color: locate(uniforms::LIGHT_COLOR, index),
                position: locate(uniforms::LIGHT_POSITION, index),
                direction: locate(uniforms::LIGHT_DIRECTION, index),
                attenuation: locate(uniforms::LIGHT_ATTENUATION, index),
            })
            .collect();

        Self {
            capacity,
            indirect: device.uniform_location(program, uniforms::LIGHT_INDIRECT),
            count: device.uniform_location(program, uniforms::LIGHT_COUNT),
            slots,
        }
    }

    /// Lights uploaded per batch
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of batches needed to cover `light_count` lights
    pub fn batch_count(&self, light_count: usize) -> usize {
        light_count.div_ceil(self.capacity).max(1)
    }

    /// Upload the next batch starting at `*index`
    ///
    /// Returns `Ok(false)` once every light has been consumed, `Ok(true)`
    /// after uploading a batch. `*index` is advanced past the uploaded lights.
    pub fn update(
        &self,
        device: &mut dyn GraphicsDevice,
        program: ProgramHandle,
        lights: &[Light],
        index: &mut usize,
    ) -> Result<bool> {
        let start = *index;
        if start > 0 && start >= lights.len() {
            return Ok(false);
        }

        let end = (start + self.capacity).min(lights.len());

        set_optional(device, program, self.indirect, (start == 0) as i32)?;
        set_optional(device, program, self.count, (end - start) as i32)?;

        for (slot_index, slot) in self.slots.iter().enumerate() {
            match lights.get(start + slot_index).filter(|_| start + slot_index < end) {
                Some(light) => {
                    set_optional(device, program, slot.kind, light.light_type() as i32)?;
                    set_optional(device, program, slot.color, light.radiance())?;
                    set_optional(device, program, slot.position, light.position())?;
                    set_optional(device, program, slot.direction, light.direction())?;
                    set_optional(device, program, slot.attenuation, light.attenuation())?;
                }
                None => {
                    // Unused slots contribute nothing
                    set_optional(device, program, slot.color, Vec3::ZERO)?;
                    set_optional(device, program, slot.attenuation, Vec4::ZERO)?;
                }
            }
        }

        // An empty list still produced one batch; park the cursor past it
        *index = end.max(1);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "light_updater_tests.rs"]
mod tests;
