/// SoftwareGraphicsDevice - CPU implementation of the graphics device
///
/// Single-threaded and synchronous: every call completes before it returns.
/// The default framebuffer is an RGBA8 color buffer plus a Depth32F buffer of
/// the size given at creation.

use glam::{UVec2, Vec2, Vec4};
use slotmap::SlotMap;
use water_engine::water3d::device::{
    BlendFunc, DepthFunc, DeviceStats, Features, FramebufferDesc, FramebufferHandle,
    GraphicsDevice, MeshDesc, MeshHandle, ProgramHandle, TextureDesc, TextureFormat,
    TextureHandle, TextureInfo, UniformLocation, UniformValue,
};
use water_engine::water3d::{Error, Result};
use water_engine::{engine_bail, engine_debug, engine_trace};
use crate::software_program::{FragmentInput, ShadeContext, SoftwareProgram, FRAGMENT_TARGETS};
use crate::software_rasterizer::{rasterize_triangle, ClipVertex};
use crate::software_texture::SoftwareTexture;

// ============================================================================
// Render surfaces
// ============================================================================

/// A texel store a draw can write to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Texture(TextureHandle),
    BackColor,
    BackDepth,
}

struct Surfaces {
    textures: SlotMap<TextureHandle, SoftwareTexture>,
    back_color: SoftwareTexture,
    back_depth: SoftwareTexture,
}

impl Surfaces {
    fn get(&self, surface: Surface) -> Option<&SoftwareTexture> {
        match surface {
            Surface::Texture(handle) => self.textures.get(handle),
            Surface::BackColor => Some(&self.back_color),
            Surface::BackDepth => Some(&self.back_depth),
        }
    }

    fn get_mut(&mut self, surface: Surface) -> Option<&mut SoftwareTexture> {
        match surface {
            Surface::Texture(handle) => self.textures.get_mut(handle),
            Surface::BackColor => Some(&mut self.back_color),
            Surface::BackDepth => Some(&mut self.back_depth),
        }
    }

    fn info(&self, texture: TextureHandle) -> Option<TextureInfo> {
        self.textures.get(texture).map(SoftwareTexture::info)
    }
}

/// Surfaces of the bound framebuffer, color slots in draw-buffer order
struct DrawTargets {
    colors: [Option<Surface>; FRAGMENT_TARGETS],
    depth: Option<Surface>,
    width: u32,
    height: u32,
}

// ============================================================================
// Device
// ============================================================================

pub struct SoftwareGraphicsDevice {
    surfaces: Surfaces,
    framebuffers: SlotMap<FramebufferHandle, FramebufferDesc>,
    programs: SlotMap<ProgramHandle, SoftwareProgram>,
    meshes: SlotMap<MeshHandle, MeshDesc>,
    bound_framebuffer: Option<FramebufferHandle>,
    current_program: Option<ProgramHandle>,
    features: Features,
    blend_func: BlendFunc,
    depth_func: DepthFunc,
    stats: DeviceStats,
}

impl SoftwareGraphicsDevice {
    /// Create a device whose default framebuffer is `width` x `height`
    ///
    /// Initial state matches a fresh GL context: depth test, blending and
    /// culling off, blend function ONE/ZERO, depth function Less.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let back_color = SoftwareTexture::new(TextureDesc::render_target(width, height, TextureFormat::Rgba8))
            .map_err(|_| Error::InitializationFailed(format!("Invalid back buffer size {}x{}", width, height)))?;
        let mut back_depth = SoftwareTexture::new(TextureDesc::render_target(width, height, TextureFormat::Depth32F))
            .map_err(|_| Error::InitializationFailed(format!("Invalid back buffer size {}x{}", width, height)))?;
        back_depth.fill(Vec4::ONE);

        engine_debug!("water3d::SoftwareGraphicsDevice", "Created {}x{} software device", width, height);

        Ok(Self {
            surfaces: Surfaces {
                textures: SlotMap::with_key(),
                back_color,
                back_depth,
            },
            framebuffers: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            bound_framebuffer: None,
            current_program: None,
            features: Features::empty(),
            blend_func: BlendFunc::REPLACE,
            depth_func: DepthFunc::Less,
            stats: DeviceStats::default(),
        })
    }

    /// Hand a program to the device; locations follow its uniform declaration order
    pub fn register_program(&mut self, program: SoftwareProgram) -> ProgramHandle {
        engine_debug!(
            "water3d::SoftwareGraphicsDevice",
            "Registered program '{}' ({} uniforms)",
            program.name(),
            program.uniform_names().len()
        );
        self.programs.insert(program)
    }

    pub fn program(&self, program: ProgramHandle) -> Option<&SoftwareProgram> {
        self.programs.get(program)
    }

    /// Default framebuffer size
    pub fn size(&self) -> (u32, u32) {
        (self.surfaces.back_color.width(), self.surfaces.back_color.height())
    }

    /// Default framebuffer colors, row-major from the bottom row
    pub fn read_back_buffer(&self) -> Vec<Vec4> {
        self.surfaces.back_color.texels().to_vec()
    }

    /// Default framebuffer color at (x, y), (0, 0) being the bottom-left pixel
    pub fn back_buffer_pixel(&self, x: u32, y: u32) -> Vec4 {
        self.surfaces.back_color.fetch(x as i32, y as i32)
    }

    /// Default framebuffer depth at (x, y)
    pub fn back_buffer_depth(&self, x: u32, y: u32) -> f32 {
        self.surfaces.back_depth.fetch(x as i32, y as i32).x
    }

    fn draw_targets(&self) -> Result<DrawTargets> {
        let Some(handle) = self.bound_framebuffer else {
            let mut colors = [None; FRAGMENT_TARGETS];
            colors[0] = Some(Surface::BackColor);
            let (width, height) = self.size();
            return Ok(DrawTargets {
                colors,
                depth: Some(Surface::BackDepth),
                width,
                height,
            });
        };

        let Some(desc) = self.framebuffers.get(handle) else {
            engine_bail!("water3d::SoftwareGraphicsDevice", "Bound framebuffer was destroyed");
        };
        let (width, height) = desc.validate(|texture| self.surfaces.info(texture))?;

        let mut colors = [None; FRAGMENT_TARGETS];
        for (slot, draw_buffer) in colors.iter_mut().zip(&desc.draw_buffers) {
            *slot = desc.attachment(*draw_buffer).map(Surface::Texture);
        }
        Ok(DrawTargets {
            colors,
            depth: desc.depth_attachment().map(Surface::Texture),
            width,
            height,
        })
    }
}

impl GraphicsDevice for SoftwareGraphicsDevice {
    // ===== TEXTURES =====

    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureHandle> {
        let texture = SoftwareTexture::new(desc)?;
        Ok(self.surfaces.textures.insert(texture))
    }

    fn texture_info(&self, texture: TextureHandle) -> Option<TextureInfo> {
        self.surfaces.info(texture)
    }

    fn read_texture(&self, texture: TextureHandle) -> Result<Vec<Vec4>> {
        match self.surfaces.textures.get(texture) {
            Some(texture) => Ok(texture.texels().to_vec()),
            None => Err(Error::InvalidResource("Unknown texture".to_string())),
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) -> Result<()> {
        match self.surfaces.textures.remove(texture) {
            Some(_) => Ok(()),
            None => Err(Error::InvalidResource("Unknown texture".to_string())),
        }
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self, desc: FramebufferDesc) -> Result<FramebufferHandle> {
        let (width, height) = desc.validate(|texture| self.surfaces.info(texture))?;
        engine_trace!(
            "water3d::SoftwareGraphicsDevice",
            "Created {}x{} framebuffer with {} attachment(s)",
            width,
            height,
            desc.attachments.len()
        );
        Ok(self.framebuffers.insert(desc))
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) -> Result<()> {
        if let Some(handle) = framebuffer {
            if !self.framebuffers.contains_key(handle) {
                engine_bail!("water3d::SoftwareGraphicsDevice", "Unknown framebuffer");
            }
        }
        self.bound_framebuffer = framebuffer;
        Ok(())
    }

    fn bound_framebuffer(&self) -> Option<FramebufferHandle> {
        self.bound_framebuffer
    }

    fn framebuffer_size(&self, framebuffer: Option<FramebufferHandle>) -> Option<(u32, u32)> {
        match framebuffer {
            None => Some(self.size()),
            Some(handle) => self
                .framebuffers
                .get(handle)?
                .validate(|texture| self.surfaces.info(texture))
                .ok(),
        }
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) -> Result<()> {
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
        match self.framebuffers.remove(framebuffer) {
            Some(_) => Ok(()),
            None => Err(Error::InvalidResource("Unknown framebuffer".to_string())),
        }
    }

    /// Clear every draw buffer to `color` and the depth attachment to `depth`
    fn clear(&mut self, color: Option<Vec4>, depth: Option<f32>) -> Result<()> {
        let targets = self.draw_targets()?;
        if let Some(color) = color {
            for surface in targets.colors.iter().flatten() {
                if let Some(texture) = self.surfaces.get_mut(*surface) {
                    texture.fill(color);
                }
            }
        }
        if let (Some(depth), Some(surface)) = (depth, targets.depth) {
            if let Some(texture) = self.surfaces.get_mut(surface) {
                texture.fill(Vec4::new(depth, 0.0, 0.0, 1.0));
            }
        }
        Ok(())
    }

    // ===== RASTER STATE =====

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

    // ===== PROGRAMS =====

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.programs.get(program)?.location(name)
    }

    fn uniform_names(&self, program: ProgramHandle) -> Vec<String> {
        self.programs
            .get(program)
            .map(|program| program.uniform_names().to_vec())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: ProgramHandle) -> Result<()> {
        if !self.programs.contains_key(program) {
            engine_bail!("water3d::SoftwareGraphicsDevice", "Unknown program");
        }
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
            engine_bail!("water3d::SoftwareGraphicsDevice", "Unknown program");
        };
        if !entry.set(location, value) {
            engine_bail!(
                "water3d::SoftwareGraphicsDevice",
                "Invalid uniform location {} for program '{}'",
                location.0,
                entry.name()
            );
        }
        Ok(())
    }

    // ===== GEOMETRY =====

    fn create_mesh(&mut self, desc: MeshDesc) -> Result<MeshHandle> {
        desc.validate()?;
        Ok(self.meshes.insert(desc))
    }

    fn submesh_count(&self, mesh: MeshHandle) -> usize {
        self.meshes.get(mesh).map_or(0, |mesh| mesh.submeshes.len())
    }

    fn draw_submesh(&mut self, mesh: MeshHandle, submesh: usize) -> Result<()> {
        let Some(program_handle) = self.current_program else {
            engine_bail!("water3d::SoftwareGraphicsDevice", "Draw without a program");
        };
        let targets = self.draw_targets()?;

        let Self {
            surfaces,
            programs,
            meshes,
            features,
            blend_func,
            depth_func,
            stats,
            ..
        } = self;

        let Some(program) = programs.get(program_handle) else {
            engine_bail!("water3d::SoftwareGraphicsDevice", "Current program was destroyed");
        };
        let Some(mesh) = meshes.get(mesh) else {
            engine_bail!("water3d::SoftwareGraphicsDevice", "Unknown mesh");
        };
        let Some(range) = mesh.submeshes.get(submesh) else {
            engine_bail!("water3d::SoftwareGraphicsDevice", "Invalid submesh {}", submesh);
        };

        let uniforms = program.uniforms();
        let fragment_program = program.fragment();
        let vertex_stage = program.vertex_stage();
        let clip: Vec<ClipVertex> = mesh
            .vertices
            .iter()
            .map(|vertex| vertex_stage.run(&uniforms, vertex))
            .collect();

        let depth_test = features.contains(Features::DEPTH_TEST) && targets.depth.is_some();
        let blend = features.contains(Features::BLEND);
        let cull_back = features.contains(Features::CULL_FACE);
        let blend_func = *blend_func;
        let depth_func = *depth_func;
        let screen = Vec2::new(targets.width as f32, targets.height as f32);

        let first = range.first_index as usize;
        let indices = &mesh.indices[first..first + range.index_count as usize];
        for triangle in indices.chunks_exact(3) {
            let vertices = [
                clip[triangle[0] as usize],
                clip[triangle[1] as usize],
                clip[triangle[2] as usize],
            ];

            rasterize_triangle(&vertices, targets.width, targets.height, cull_back, |fragment| {
                let input = FragmentInput {
                    pixel: fragment.pixel,
                    screen_uv: (fragment.pixel.as_vec2() + Vec2::splat(0.5)) / screen,
                    depth: fragment.depth,
                    uv: fragment.uv,
                    world_position: fragment.world_position,
                    normal: fragment.normal,
                    front_facing: fragment.front_facing,
                };

                let output = {
                    let ctx = ShadeContext::new(&uniforms, &surfaces.textures);
                    fragment_program.shade(&ctx, &input)
                };
                let Some(output) = output else {
                    return;
                };

                let UVec2 { x, y } = fragment.pixel;
                if depth_test {
                    let depth = output.depth.unwrap_or(fragment.depth).clamp(0.0, 1.0);
                    if let Some(texture) = targets.depth.and_then(|surface| surfaces.get_mut(surface)) {
                        if !depth_func.test(depth, texture.fetch(x as i32, y as i32).x) {
                            return;
                        }
                        texture.write(x, y, Vec4::new(depth, 0.0, 0.0, 1.0));
                    }
                }

                for (color, surface) in output.colors.iter().zip(&targets.colors) {
                    let Some(texture) = surface.and_then(|surface| surfaces.get_mut(surface)) else {
                        continue;
                    };
                    let value = if blend {
                        blend_func.blend(*color, texture.fetch(x as i32, y as i32))
                    } else {
                        *color
                    };
                    texture.write(x, y, value);
                }
            });
        }

        stats.draw_calls += 1;
        engine_trace!(
            "water3d::SoftwareGraphicsDevice",
            "Draw '{}' submesh {} ({} triangles)",
            program.name(),
            submesh,
            indices.len() / 3
        );
        Ok(())
    }

    // ===== FRAME =====

    fn present(&mut self) -> Result<()> {
        self.stats.frames += 1;
        engine_trace!("water3d::SoftwareGraphicsDevice", "Present frame {}", self.stats.frames);
        Ok(())
    }

    fn stats(&self) -> DeviceStats {
        self.stats
    }
}
