/// CPU shader programs
///
/// A program pairs a fixed vertex stage with a fragment callback. Uniform
/// declarations are plain names; their order gives the uniform locations.
/// Fragment callbacks read uniforms and textures by name through a
/// [`ShadeContext`].

use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use water_engine::water3d::device::{
    TextureHandle, UniformLocation, UniformValue, Vertex, MAX_COLOR_ATTACHMENTS,
};
use water_engine::water3d::uniforms;
use crate::software_rasterizer::ClipVertex;
use crate::software_texture::SoftwareTexture;

// ===== VERTEX STAGE =====

/// Fixed vertex transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexStage {
    /// Positions are already in clip space (fullscreen quad)
    Fullscreen,
    /// `WorldViewProjMatrix * position`, world data through `WorldMatrix`
    Transform,
}

impl VertexStage {
    pub fn run(self, uniforms: &Uniforms, vertex: &Vertex) -> ClipVertex {
        match self {
            VertexStage::Fullscreen => ClipVertex {
                clip: vertex.position.extend(1.0),
                world_position: vertex.position,
                normal: vertex.normal,
                uv: vertex.uv,
            },
            VertexStage::Transform => {
                let world = uniforms.mat4(uniforms::WORLD_MATRIX);
                let world_view_proj = uniforms.mat4(uniforms::WORLD_VIEW_PROJ_MATRIX);
                ClipVertex {
                    clip: world_view_proj * vertex.position.extend(1.0),
                    world_position: world.transform_point3(vertex.position),
                    normal: world.transform_vector3(vertex.normal).normalize_or_zero(),
                    uv: vertex.uv,
                }
            }
        }
    }
}

// ===== FRAGMENT STAGE =====

/// Draw buffers a fragment can write
pub const FRAGMENT_TARGETS: usize = MAX_COLOR_ATTACHMENTS as usize;

/// Interpolated inputs of one fragment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentInput {
    /// Pixel coordinates, (0, 0) at the bottom-left
    pub pixel: UVec2,
    /// Pixel coordinates normalized to [0, 1] at the pixel centre
    pub screen_uv: Vec2,
    /// Window-space depth in [0, 1]
    pub depth: f32,
    pub uv: Vec2,
    pub world_position: Vec3,
    pub normal: Vec3,
    pub front_facing: bool,
}

/// Colors for every draw buffer plus an optional depth override
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentOutput {
    pub colors: [Vec4; FRAGMENT_TARGETS],
    pub depth: Option<f32>,
}

impl FragmentOutput {
    /// `color` in draw buffer 0, zero elsewhere
    pub fn color(color: Vec4) -> Self {
        let mut colors = [Vec4::ZERO; FRAGMENT_TARGETS];
        colors[0] = color;
        Self { colors, depth: None }
    }

    pub fn with_target(mut self, index: usize, color: Vec4) -> Self {
        if let Some(slot) = self.colors.get_mut(index) {
            *slot = color;
        }
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = Some(depth);
        self
    }
}

pub trait FragmentProgram: Send + Sync {
    /// Shade one fragment; `None` discards it
    fn shade(&self, ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput>;
}

impl<F> FragmentProgram for F
where
    F: Fn(&ShadeContext<'_>, &FragmentInput) -> Option<FragmentOutput> + Send + Sync,
{
    fn shade(&self, ctx: &ShadeContext<'_>, input: &FragmentInput) -> Option<FragmentOutput> {
        self(ctx, input)
    }
}

// ===== PROGRAM =====

pub struct SoftwareProgram {
    name: String,
    uniforms: Vec<String>,
    vertex: VertexStage,
    fragment: Box<dyn FragmentProgram>,
    values: Vec<Option<UniformValue>>,
}

impl SoftwareProgram {
    pub fn new<F: FragmentProgram + 'static>(
        name: &str,
        uniforms: Vec<String>,
        vertex: VertexStage,
        fragment: F,
    ) -> Self {
        let values = vec![None; uniforms.len()];
        Self {
            name: name.to_string(),
            uniforms,
            vertex,
            fragment: Box::new(fragment),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniform_names(&self) -> &[String] {
        &self.uniforms
    }

    pub fn vertex_stage(&self) -> VertexStage {
        self.vertex
    }

    pub fn fragment(&self) -> &dyn FragmentProgram {
        self.fragment.as_ref()
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|index| UniformLocation(index as u32))
    }

    /// Store a value; false if the location is out of range
    pub fn set(&mut self, location: UniformLocation, value: UniformValue) -> bool {
        match self.values.get_mut(location.0 as usize) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Snapshot of every uniform that has a value
    pub fn uniforms(&self) -> Uniforms {
        let values = self
            .uniforms
            .iter()
            .zip(&self.values)
            .filter_map(|(name, value)| value.map(|value| (name.clone(), value)))
            .collect();
        Uniforms { values }
    }
}

// ===== UNIFORM ACCESS =====

/// Uniform values of a program for the duration of one draw
///
/// Missing or mistyped uniforms read as zero (matrices as identity), the
/// value an unset GLSL uniform has.
#[derive(Debug, Clone, Default)]
pub struct Uniforms {
    values: FxHashMap<String, UniformValue>,
}

impl Uniforms {
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn int(&self, name: &str) -> i32 {
        self.get(name).and_then(|value| value.as_int()).unwrap_or(0)
    }

    pub fn float(&self, name: &str) -> f32 {
        self.get(name).and_then(|value| value.as_float()).unwrap_or(0.0)
    }

    /// Float with a fallback for programs whose material never set it
    pub fn float_or(&self, name: &str, default: f32) -> f32 {
        self.get(name).and_then(|value| value.as_float()).unwrap_or(default)
    }

    pub fn vec2(&self, name: &str) -> Vec2 {
        self.get(name).and_then(|value| value.as_vec2()).unwrap_or(Vec2::ZERO)
    }

    pub fn vec3(&self, name: &str) -> Vec3 {
        self.get(name).and_then(|value| value.as_vec3()).unwrap_or(Vec3::ZERO)
    }

    pub fn vec4(&self, name: &str) -> Vec4 {
        self.get(name).and_then(|value| value.as_vec4()).unwrap_or(Vec4::ZERO)
    }

    pub fn mat4(&self, name: &str) -> Mat4 {
        self.get(name).and_then(|value| value.as_mat4()).unwrap_or(Mat4::IDENTITY)
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.get(name).and_then(|value| value.as_texture())
    }
}

/// What a fragment callback can read
pub struct ShadeContext<'a> {
    pub uniforms: &'a Uniforms,
    textures: &'a SlotMap<TextureHandle, SoftwareTexture>,
}

impl<'a> ShadeContext<'a> {
    pub fn new(uniforms: &'a Uniforms, textures: &'a SlotMap<TextureHandle, SoftwareTexture>) -> Self {
        Self { uniforms, textures }
    }

    fn bound(&self, name: &str) -> Option<&'a SoftwareTexture> {
        self.textures.get(self.uniforms.texture(name)?)
    }

    /// True if `name` holds a live texture
    pub fn has_texture(&self, name: &str) -> bool {
        self.bound(name).is_some()
    }

    /// Filtered lookup; unbound samplers read as zero
    pub fn sample(&self, name: &str, uv: Vec2) -> Vec4 {
        self.bound(name).map_or(Vec4::ZERO, |texture| texture.sample(uv))
    }

    /// Unfiltered texel at integer coordinates
    pub fn fetch(&self, name: &str, pixel: UVec2) -> Vec4 {
        self.bound(name)
            .map_or(Vec4::ZERO, |texture| texture.fetch(pixel.x as i32, pixel.y as i32))
    }

    pub fn texture_size(&self, name: &str) -> Option<UVec2> {
        self.bound(name)
            .map(|texture| UVec2::new(texture.width(), texture.height()))
    }
}
