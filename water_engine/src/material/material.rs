/// Material: a shader program plus the uniform values applied before drawing.
///
/// Uniforms fall in two groups:
/// - filtered uniforms are driven by the renderer every draw (transforms,
///   lights, pass flags) and can never be stored on the material
/// - properties are every other uniform the program declares
///
/// Property values sit behind a `RwLock` so a material shared through `Arc`
/// between several passes and draw calls can still be edited by UI code.

use std::sync::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::device::{GraphicsDevice, ProgramHandle, UniformLocation, UniformValue};
use crate::error::{Error, Result};
use crate::{engine_bail, engine_err, engine_error};

// ===== DESCRIPTOR =====

/// Material creation descriptor
#[derive(Debug, Clone)]
pub struct MaterialDesc {
    pub program: ProgramHandle,
    /// Uniform names owned by the renderer's callbacks
    pub filtered_uniforms: Vec<String>,
    /// Initial property values
    pub properties: Vec<(String, UniformValue)>,
    /// Transparent materials are skipped by opaque passes and drawn by the transparency pass
    pub transparent: bool,
}

impl MaterialDesc {
    pub fn new(program: ProgramHandle) -> Self {
        Self {
            program,
            filtered_uniforms: Vec::new(),
            properties: Vec::new(),
            transparent: false,
        }
    }

    pub fn with_filtered(mut self, names: &[&str]) -> Self {
        self.filtered_uniforms.extend(names.iter().map(|name| name.to_string()));
        self
    }

    pub fn with_property(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.properties.push((name.to_string(), value.into()));
        self
    }

    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }
}

// ===== MATERIAL =====

pub struct Material {
    program: ProgramHandle,
    transparent: bool,
    properties: FxHashMap<String, UniformLocation>,
    filtered: FxHashSet<String>,
    values: RwLock<FxHashMap<String, UniformValue>>,
}

impl Material {
    /// Create a material, resolving its property allow-list from the program
    pub fn new(device: &dyn GraphicsDevice, desc: MaterialDesc) -> Result<Self> {
        let filtered: FxHashSet<String> = desc.filtered_uniforms.into_iter().collect();

        let properties: FxHashMap<String, UniformLocation> = device
            .uniform_names(desc.program)
            .into_iter()
            .filter(|name| !filtered.contains(name))
            .filter_map(|name| {
                device
                    .uniform_location(desc.program, &name)
                    .map(|location| (name, location))
            })
            .collect();

        let mut values = FxHashMap::default();
        for (name, value) in desc.properties {
            if !properties.contains_key(&name) {
                return Err(Self::rejected(&name, filtered.contains(&name)));
            }
            if values.insert(name.clone(), value).is_some() {
                engine_bail!("water3d::Material", "Duplicate property '{}'", name);
            }
        }

        Ok(Self {
            program: desc.program,
            transparent: desc.transparent,
            properties,
            filtered,
            values: RwLock::new(values),
        })
    }

    fn rejected(name: &str, filtered: bool) -> Error {
        let reason = if filtered {
            "is driven by the renderer"
        } else {
            "is not declared by the program"
        };
        engine_error!("water3d::Material", "Uniform '{}' {}", name, reason);
        Error::InvalidResource(format!("Uniform '{}' {}", name, reason))
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// True if `name` may be stored on this material
    pub fn is_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn is_filtered(&self, name: &str) -> bool {
        self.filtered.contains(name)
    }

    /// Sorted property names
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Store a property value, applied on the next `apply`
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if `name` is filtered or not declared by the program.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        if !self.is_property(name) {
            return Err(Self::rejected(name, self.is_filtered(name)));
        }
        let mut values = self
            .values
            .write()
            .map_err(|_| engine_err!("water3d::Material", "Material lock poisoned"))?;
        values.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Current value of a property, if one was set
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.values.read().ok()?.get(name).copied()
    }

    /// Bind the program and push every stored property
    pub fn apply(&self, device: &mut dyn GraphicsDevice) -> Result<()> {
        device.use_program(self.program)?;

        let values = self
            .values
            .read()
            .map_err(|_| engine_err!("water3d::Material", "Material lock poisoned"))?;
        for (name, value) in values.iter() {
            if let Some(location) = self.properties.get(name) {
                device.set_uniform(self.program, *location, *value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
