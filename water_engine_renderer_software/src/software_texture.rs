/// CPU texture storage and sampling
///
/// Texels are `Vec4`, row-major from the bottom row, already normalized to
/// the texture's format. Texture coordinates put (0, 0) at the bottom-left
/// corner and texel centres at half-integers.

use glam::{Vec2, Vec4};
use water_engine::water3d::device::{FilterMode, TextureDesc, TextureInfo, WrapMode};
use water_engine::water3d::{Error, Result};

/// Largest texture the device stores, in texels (1 GiB of `Vec4`)
pub const MAX_TEXELS: usize = 1 << 26;

#[derive(Debug, Clone)]
pub struct SoftwareTexture {
    info: TextureInfo,
    texels: Vec<Vec4>,
}

impl SoftwareTexture {
    pub fn new(desc: TextureDesc) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "Texture size {}x{} is empty",
                desc.width, desc.height
            )));
        }

        let info = TextureInfo::from(&desc);
        let texel_count = desc.texel_count();
        if texel_count > MAX_TEXELS {
            return Err(Error::OutOfMemory);
        }
        let texels = match desc.data {
            Some(data) if data.len() != texel_count => {
                return Err(Error::InvalidResource(format!(
                    "Texture data has {} texels, expected {}",
                    data.len(),
                    texel_count
                )));
            }
            Some(data) => data.into_iter().map(|texel| info.format.store(texel)).collect(),
            None => {
                let mut texels = Vec::new();
                texels.try_reserve_exact(texel_count).map_err(|_| Error::OutOfMemory)?;
                texels.resize(texel_count, info.format.store(Vec4::ZERO));
                texels
            }
        };

        Ok(Self { info, texels })
    }

    pub fn info(&self) -> TextureInfo {
        self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.info.width as usize) + x as usize
    }

    /// Texel at integer coordinates, clamped to the edge
    pub fn fetch(&self, x: i32, y: i32) -> Vec4 {
        let x = x.clamp(0, self.info.width as i32 - 1) as u32;
        let y = y.clamp(0, self.info.height as i32 - 1) as u32;
        self.texels[self.index(x, y)]
    }

    /// Store `value` at (x, y), normalized to the format; out of range writes are dropped
    pub fn write(&mut self, x: u32, y: u32, value: Vec4) {
        if x < self.info.width && y < self.info.height {
            let index = self.index(x, y);
            self.texels[index] = self.info.format.store(value);
        }
    }

    pub fn fill(&mut self, value: Vec4) {
        let value = self.info.format.store(value);
        self.texels.fill(value);
    }

    /// Filtered lookup at normalized coordinates
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let size = Vec2::new(self.info.width as f32, self.info.height as f32);
        match self.info.filter {
            FilterMode::Nearest => {
                let texel = (uv * size).floor();
                self.wrapped(texel.x as i32, texel.y as i32)
            }
            FilterMode::Linear => {
                let position = uv * size - Vec2::splat(0.5);
                let base = position.floor();
                let t = position - base;
                let (x, y) = (base.x as i32, base.y as i32);

                let bottom = self.wrapped(x, y).lerp(self.wrapped(x + 1, y), t.x);
                let top = self.wrapped(x, y + 1).lerp(self.wrapped(x + 1, y + 1), t.x);
                bottom.lerp(top, t.y)
            }
        }
    }

    fn wrapped(&self, x: i32, y: i32) -> Vec4 {
        match self.info.wrap {
            WrapMode::ClampToEdge => self.fetch(x, y),
            WrapMode::Repeat => {
                let x = x.rem_euclid(self.info.width as i32) as u32;
                let y = y.rem_euclid(self.info.height as i32) as u32;
                self.texels[self.index(x, y)]
            }
        }
    }
}

#[cfg(test)]
#[path = "software_texture_tests.rs"]
mod tests;
