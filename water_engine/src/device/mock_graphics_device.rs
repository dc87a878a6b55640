/// Mock graphics device for unit tests (no rasterization)
///
/// Keeps resources in slot maps like a real backend, records every command
/// as a string and snapshots the raster state plus the current program's
/// uniforms at each draw.

use glam::Vec4;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::device::{
    GraphicsDevice, DeviceStats, Features, BlendFunc, DepthFunc, RenderState,
    TextureHandle, TextureDesc, TextureInfo,
    FramebufferHandle, FramebufferDesc,
    ProgramHandle, UniformLocation, UniformValue,
    MeshHandle, MeshDesc,
};
use crate::error::{Error, Result};
use crate::engine_bail;

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub info: TextureInfo,
    pub texels: Vec<Vec4>,
}

#[derive(Debug)]
pub struct MockProgram {
    pub name: String,
    pub uniforms: Vec<String>,
    pub values: FxHashMap<UniformLocation, UniformValue>,
}

impl MockProgram {
    fn value(&self, name: &str) -> Option<UniformValue> {
        let index = self.uniforms.iter().position(|uniform| uniform == name)?;
        self.values.get(&UniformLocation(index as u32)).copied()
    }
}

/// Everything observable about one draw call
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub program: Option<ProgramHandle>,
    pub mesh: MeshHandle,
    pub submesh: usize,
    pub framebuffer: Option<FramebufferHandle>,
    pub state: RenderState,
    pub uniforms: FxHashMap<String, UniformValue>,
}

impl DrawRecord {
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }
}

// ============================================================================
// Mock device
// ============================================================================

pub struct MockGraphicsDevice {
    pub textures: SlotMap<TextureHandle, MockTexture>,
    pub framebuffers: SlotMap<FramebufferHandle, FramebufferDesc>,
    pub programs: SlotMap<ProgramHandle, MockProgram>,
    pub meshes: SlotMap<MeshHandle, usize>,
    pub commands: Vec<String>,
    pub draws: Vec<DrawRecord>,
    /// (program, uniform name, value) for every `set_uniform` call
    pub uniform_log: Vec<(ProgramHandle, String, UniformValue)>,
    /// Fail the next draw call with a backend error
    pub fail_next_draw: bool,
    bound_framebuffer: Option<FramebufferHandle>,
    current_program: Option<ProgramHandle>,
    features: Features,
    blend_func: BlendFunc,
    depth_func: DepthFunc,
    stats: DeviceStats,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            textures: SlotMap::with_key(),
            framebuffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            commands: Vec::new(),
            draws: Vec::new(),
            uniform_log: Vec::new(),
            fail_next_draw: false,
            bound_framebuffer: None,
            current_program: None,
            features: Features::DEPTH_TEST,
            blend_func: BlendFunc::REPLACE,
            depth_func: DepthFunc::Less,
            stats: DeviceStats::default(),
        }
    }

    /// Register a program declaring `uniforms`; locations follow declaration order
    pub fn create_program(&mut self, name: &str, uniforms: &[&str]) -> ProgramHandle {
        self.programs.insert(MockProgram {
            name: name.to_string(),
            uniforms: uniforms.iter().map(|uniform| uniform.to_string()).collect(),
            values: FxHashMap::default(),
        })
    }

    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        self.programs.get(program)?.value(name)
    }

    /// Number of `set_uniform` calls on `name` across all programs
    pub fn uniform_set_count(&self, name: &str) -> usize {
        self.uniform_log.iter().filter(|(_, uniform, _)| uniform == name).count()
    }

    pub fn clear_records(&mut self) {
        self.commands.clear();
        self.draws.clear();
        self.uniform_log.clear();
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle> {
        let info = TextureInfo::from(&desc);
        let texels = desc
            .data
            .unwrap_or_else(|| vec![Vec4::ZERO; (info.width * info.height) as usize]);
        self.commands.push("create_texture".to_string());
        Ok(self.textures.insert(MockTexture { info, texels }))
    }

    fn texture_info(&self, texture: TextureHandle) -> Option<TextureInfo> {
        self.textures.get(texture).map(|texture| texture.info)
    }

    fn read_texture(&self, texture: TextureHandle) -> Result<Vec<Vec4>> {
        match self.textures.get(texture) {
            Some(texture) => Ok(texture.texels.clone()),
            None => Err(Error::InvalidResource("Unknown texture".to_string())),
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) -> Result<()> {
        self.textures.remove(texture);
        Ok(())
    }

    fn create_framebuffer(&mut self, desc: FramebufferDesc) -> Result<FramebufferHandle> {
        desc.validate(|texture| self.texture_info(texture))?;
        self.commands.push("create_framebuffer".to_string());
        Ok(self.framebuffers.insert(desc))
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> Result<()> {
        if let Some(handle) = framebuffer {
            if !self.framebuffers.contains_key(handle) {
                engine_bail!("water3d::MockGraphicsDevice", "Unknown framebuffer");
            }
        }
        self.bound_framebuffer = framebuffer;
        self.commands.push(format!("bind_framebuffer {}", framebuffer.is_some()));
        Ok(())
    }

    fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.bound_framebuffer
    }

    fn framebuffer_size(&self, framebuffer: Option<FramebufferHandle>) -> Option<(u32, u32)> {
        match framebuffer {
            None => Some((64, 64)),
            Some(handle) => {
                let desc = self.framebuffers.get(handle)?;
                desc.validate(|texture| self.texture_info(texture)).ok()
            }
        }
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) -> Result<()> {
        self.framebuffers.remove(framebuffer);
        Ok(())
    }

    fn clear(&mut self, color: Option<Vec4>, depth: Option<f32>) -> Result<()> {
        self.commands.push(format!("clear {} {}", color.is_some(), depth.is_some()));
        Ok(())
    }

    fn is_feature_enabled(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }

    fn set_feature_enabled(&mut self, feature: Features, enabled: bool) {
        self.features.set(feature, enabled);
    }

    fn blend_func(&self) -> BlendFunc {
        self.blend_func
    }

    fn set_blend_func(&mut self, func: BlendFunc) {
        self.blend_func = func;
    }

    fn depth_func(&self) -> DepthFunc {
        self.depth_func
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.depth_func = func;
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let program = self.programs.get(program)?;
        program
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| UniformLocation(index as u32))
    }

    fn uniform_names(&self, program: ProgramHandle) -> Vec<String> {
        self.programs
            .get(program)
            .map(|program| program.uniforms.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<()> {
        let Some(entry) = self.programs.get(program) else {
            engine_bail!("water3d::MockGraphicsDevice", "Unknown program");
        };
        self.commands.push(format!("use_program {}", entry.name));
        self.current_program = Some(program);
        Ok(())
    }

    fn current_program(&self) -> Option<ProgramHandle> {
        self.current_program
    }

    fn set_uniform(
        &mut self,
        program: ProgramHandle,
        location: UniformLocation,
        value: UniformValue,
    ) -> Result<()> {
        let Some(entry) = self.programs.get_mut(program) else {
            engine_bail!("water3d::MockGraphicsDevice", "Unknown program");
        };
        let Some(name) = entry.uniforms.get(location.0 as usize).cloned() else {
            engine_bail!("water3d::MockGraphicsDevice", "Invalid uniform location {}", location.0);
        };
        entry.values.insert(location, value);
        self.uniform_log.push((program, name, value));
        Ok(())
    }

    fn create_mesh(&mut self, desc: MeshDesc) -> Result<MeshHandle> {
        desc.validate()?;
        Ok(self.meshes.insert(desc.submeshes.len()))
    }

    fn submesh_count(&self, mesh: MeshHandle) -> usize {
        self.meshes.get(mesh).copied().unwrap_or(0)
    }

    fn draw_submesh(&mut self, mesh: MeshHandle, submesh: usize) -> Result<()> {
        if self.fail_next_draw {
            self.fail_next_draw = false;
            engine_bail!("water3d::MockGraphicsDevice", "Injected draw failure");
        }
        if submesh >= self.submesh_count(mesh) {
            engine_bail!("water3d::MockGraphicsDevice", "Invalid submesh {}", submesh);
        }

        let uniforms = self
            .current_program
            .and_then(|program| self.programs.get(program))
            .map(|program| {
                program
                    .values
                    .iter()
                    .filter_map(|(location, value)| {
                        program
                            .uniforms
                            .get(location.0 as usize)
                            .map(|name| (name.clone(), *value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        self.draws.push(DrawRecord {
            program: self.current_program,
            mesh,
            submesh,
            framebuffer: self.bound_framebuffer,
            state: RenderState::capture(&*self),
            uniforms,
        });
        self.commands.push("draw".to_string());
        self.stats.draw_calls += 1;
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.commands.push("present".to_string());
        self.stats.frames += 1;
        Ok(())
    }

    fn stats(&self) -> DeviceStats {
        self.stats
    }
}
