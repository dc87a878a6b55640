/// Texture types shared by every graphics device backend

use glam::Vec4;
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a texture owned by a graphics device
    pub struct TextureHandle;
}

/// Texel storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit normalized RGBA (values clamped to [0, 1])
    Rgba8,
    /// Two-channel float (normals in the full-scene buffer)
    Rg16F,
    /// Three-channel float
    Rgb16F,
    /// Four-channel float
    Rgba16F,
    /// Single-channel float depth
    Depth32F,
}

impl TextureFormat {
    /// Returns true if the format can only be bound as a depth attachment
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth32F)
    }

    /// Number of meaningful channels
    pub fn channel_count(self) -> u32 {
        match self {
            TextureFormat::Depth32F => 1,
            TextureFormat::Rg16F => 2,
            TextureFormat::Rgb16F => 3,
            TextureFormat::Rgba8 | TextureFormat::Rgba16F => 4,
        }
    }

    /// Normalize a value to what the format can store
    ///
    /// Missing color channels read back as 0 (alpha as 1), normalized formats
    /// clamp to [0, 1], depth keeps only the red channel.
    pub fn store(self, value: Vec4) -> Vec4 {
        match self {
            TextureFormat::Rgba8 => value.clamp(Vec4::ZERO, Vec4::ONE),
            TextureFormat::Rg16F => Vec4::new(value.x, value.y, 0.0, 1.0),
            TextureFormat::Rgb16F => value.truncate().extend(1.0),
            TextureFormat::Rgba16F => value,
            TextureFormat::Depth32F => Vec4::new(value.x, 0.0, 0.0, 1.0),
        }
    }
}

/// Sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Coordinate wrapping outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

/// Texture creation parameters
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub filter: FilterMode,
    pub wrap: WrapMode,
    /// Initial texels, row-major from the bottom row. `None` means zero-filled.
    pub data: Option<Vec<Vec4>>,
}

impl TextureDesc {
    /// Zero-filled texture meant to be used as a render target
    pub fn render_target(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            filter: if format.is_depth() { FilterMode::Nearest } else { FilterMode::Linear },
            wrap: WrapMode::ClampToEdge,
            data: None,
        }
    }

    /// Texture initialized from texels (row-major, bottom row first)
    pub fn from_texels(width: u32, height: u32, format: TextureFormat, texels: Vec<Vec4>) -> Self {
        Self {
            data: Some(texels),
            ..Self::render_target(width, height, format)
        }
    }

    /// Texture filled with a single color
    pub fn solid(width: u32, height: u32, format: TextureFormat, color: Vec4) -> Self {
        Self::from_texels(width, height, format, vec![color; (width * height) as usize])
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_wrap(mut self, wrap: WrapMode) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn texel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Immutable description of an existing texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub filter: FilterMode,
    pub wrap: WrapMode,
}

impl From<&TextureDesc> for TextureInfo {
    fn from(desc: &TextureDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            filter: desc.filter,
            wrap: desc.wrap,
        }
    }
}
