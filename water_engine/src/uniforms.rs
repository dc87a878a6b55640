//! Uniform names shared between the renderer, its passes and shader programs

// ===== TRANSFORMS =====

pub const WORLD_MATRIX: &str = "WorldMatrix";
pub const WORLD_VIEW_MATRIX: &str = "WorldViewMatrix";
pub const WORLD_VIEW_PROJ_MATRIX: &str = "WorldViewProjMatrix";
pub const VIEW_MATRIX: &str = "ViewMatrix";
pub const PROJECTION_MATRIX: &str = "ProjectionMatrix";
pub const INV_VIEW_MATRIX: &str = "InvViewMatrix";
pub const INV_PROJ_MATRIX: &str = "InvProjMatrix";
pub const ELAPSED_TIME: &str = "ElapsedTime";

// ===== LIGHTS =====

pub const LIGHT_INDIRECT: &str = "LightIndirect";
pub const LIGHT_COUNT: &str = "LightCount";
pub const LIGHT_TYPE: &str = "LightType";
pub const LIGHT_COLOR: &str = "LightColor";
pub const LIGHT_POSITION: &str = "LightPosition";
pub const LIGHT_DIRECTION: &str = "LightDirection";
pub const LIGHT_ATTENUATION: &str = "LightAttenuation";

// ===== PASS FLAGS =====

/// 1 while the transparency pass draws forward-lit, 0 when writing the G-buffer
pub const FORWARD_PASS: &str = "ForwardPass";

// ===== TEXTURES =====

pub const SOURCE_TEXTURE: &str = "SourceTexture";
pub const DEPTH_TEXTURE: &str = "DepthTexture";
pub const ALBEDO_TEXTURE: &str = "AlbedoTexture";
pub const NORMAL_TEXTURE: &str = "NormalTexture";
pub const OTHERS_TEXTURE: &str = "OthersTexture";
/// Third G-buffer target as named by the G-buffer copy program
pub const OTHER_TEXTURE: &str = "OtherTexture";
pub const SPECULAR_TEXTURE: &str = "SpecularTexture";
pub const ENVIRONMENT_TEXTURE: &str = "EnvironmentTexture";
pub const REFLECTIVE_TEXTURE: &str = "ReflectiveTexture";
pub const BLUR_REFLECTIVE_TEXTURE: &str = "BlurReflectiveTexture";
pub const COLOR_TEXTURE: &str = "ColorTexture";
pub const FLOW_TEXTURE: &str = "FlowTexture";

// ===== MATERIAL PROPERTIES =====

pub const COLOR: &str = "Color";
pub const SHOW_TYPE: &str = "ShowType";
pub const MAX_DISTANCE: &str = "MaxDistance";
pub const RESOLUTION: &str = "Resolution";
pub const STEPS: &str = "Steps";
pub const THICKNESS: &str = "Thickness";
pub const SCALE: &str = "Scale";
pub const JUMP: &str = "Jump";
pub const TILING: &str = "Tiling";
pub const SPEED: &str = "Speed";
pub const FLOW_STRENGTH: &str = "FlowStrength";
pub const FLOW_OFFSET: &str = "FlowOffset";
pub const ALPHA: &str = "Alpha";

/// Uniforms written by the object transform callback
pub const OBJECT_TRANSFORM_UNIFORMS: [&str; 4] =
    [WORLD_MATRIX, WORLD_VIEW_MATRIX, WORLD_VIEW_PROJ_MATRIX, ELAPSED_TIME];

/// Uniforms written by the fullscreen (deferred) transform callback
pub const FULLSCREEN_TRANSFORM_UNIFORMS: [&str; 3] =
    [INV_VIEW_MATRIX, INV_PROJ_MATRIX, WORLD_VIEW_PROJ_MATRIX];

/// Uniforms written by the screen-space transform callback
pub const SCREEN_SPACE_TRANSFORM_UNIFORMS: [&str; 3] =
    [PROJECTION_MATRIX, INV_PROJ_MATRIX, INV_VIEW_MATRIX];

/// Uniforms written by the light update callback (base names)
pub const LIGHT_UNIFORMS: [&str; 7] = [
    LIGHT_INDIRECT,
    LIGHT_COUNT,
    LIGHT_TYPE,
    LIGHT_COLOR,
    LIGHT_POSITION,
    LIGHT_DIRECTION,
    LIGHT_ATTENUATION,
];

/// Name of slot `index` for an array uniform of `capacity` entries
///
/// Single-light programs use the bare name (`LightColor`), batched programs
/// use indexed names (`LightColor[2]`).
pub fn indexed(base: &str, index: usize, capacity: usize) -> String {
    if capacity <= 1 {
        base.to_string()
    } else {
        format!("{}[{}]", base, index)
    }
}

/// Every light uniform name a program with `capacity` light slots may declare
pub fn light_uniform_names(capacity: usize) -> Vec<String> {
    let mut names = vec![LIGHT_INDIRECT.to_string(), LIGHT_COUNT.to_string()];
    for base in &LIGHT_UNIFORMS[2..] {
        for index in 0..capacity.max(1) {
            names.push(indexed(base, index, capacity));
        }
    }
    names
}
