/// Framebuffer layout description and validation
///
/// A framebuffer groups textures under attachment slots (one depth slot,
/// several color slots) plus the ordered list of color slots fragment
/// outputs are routed to. Validation lives here so every backend rejects the
/// same layouts at creation time.

use rustc_hash::FxHashSet;
use slotmap::new_key_type;
use crate::error::{Error, Result};
use crate::device::texture::{TextureHandle, TextureInfo};

new_key_type! {
    /// Handle to a framebuffer owned by a graphics device
    pub struct FramebufferHandle;
}

/// Maximum number of color attachments per framebuffer
pub const MAX_COLOR_ATTACHMENTS: u32 = 4;

/// Attachment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Depth,
    Color(u32),
}

/// Framebuffer creation parameters
#[derive(Debug, Clone, Default)]
pub struct FramebufferDesc {
    pub attachments: Vec<(Attachment, TextureHandle)>,
    /// Fragment output `i` is written to `draw_buffers[i]`
    pub draw_buffers: Vec<Attachment>,
}

impl FramebufferDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attachment(mut self, attachment: Attachment, texture: TextureHandle) -> Self {
        self.attachments.push((attachment, texture));
        self
    }

    pub fn with_draw_buffers(mut self, draw_buffers: &[Attachment]) -> Self {
        self.draw_buffers = draw_buffers.to_vec();
        self
    }

    pub fn attachment(&self, attachment: Attachment) -> Option<TextureHandle> {
        self.attachments
            .iter()
            .find(|(slot, _)| *slot == attachment)
            .map(|(_, texture)| *texture)
    }

    pub fn depth_attachment(&self) -> Option<TextureHandle> {
        self.attachment(Attachment::Depth)
    }

    /// Check the layout and return the shared (width, height)
    ///
    /// `texture_info` resolves a handle to its description, `None` meaning the
    /// handle is stale.
    pub fn validate<F>(&self, texture_info: F) -> Result<(u32, u32)>
    where
        F: Fn(TextureHandle) -> Option<TextureInfo>,
    {
        if self.attachments.is_empty() {
            return Err(Error::InvalidResource("Framebuffer has no attachments".to_string()));
        }

        let mut slots = FxHashSet::default();
        let mut size: Option<(u32, u32)> = None;

        for (attachment, texture) in &self.attachments {
            if !slots.insert(*attachment) {
                return Err(Error::InvalidResource(format!(
                    "Framebuffer attachment {:?} is bound twice",
                    attachment
                )));
            }

            let info = texture_info(*texture).ok_or_else(|| {
                Error::InvalidResource(format!(
                    "Framebuffer attachment {:?} references a destroyed texture",
                    attachment
                ))
            })?;

            match attachment {
                Attachment::Depth if !info.format.is_depth() => {
                    return Err(Error::InvalidResource(format!(
                        "Depth attachment has color format {:?}",
                        info.format
                    )));
                }
                Attachment::Color(index) if *index >= MAX_COLOR_ATTACHMENTS => {
                    return Err(Error::InvalidResource(format!(
                        "Color attachment {} exceeds the limit of {}",
                        index, MAX_COLOR_ATTACHMENTS
                    )));
                }
                Attachment::Color(index) if info.format.is_depth() => {
                    return Err(Error::InvalidResource(format!(
                        "Color attachment {} has depth format",
                        index
                    )));
                }
                _ => {}
            }

            match size {
                None => size = Some((info.width, info.height)),
                Some((width, height)) if (width, height) != (info.width, info.height) => {
                    return Err(Error::InvalidResource(format!(
                        "Framebuffer attachments differ in size ({}x{} vs {}x{})",
                        width, height, info.width, info.height
                    )));
                }
                Some(_) => {}
            }
        }

        for draw_buffer in &self.draw_buffers {
            match draw_buffer {
                Attachment::Depth => {
                    return Err(Error::InvalidResource(
                        "Depth cannot be used as a draw buffer".to_string(),
                    ));
                }
                Attachment::Color(_) if !slots.contains(draw_buffer) => {
                    return Err(Error::InvalidResource(format!(
                        "Draw buffer {:?} has no attached texture",
                        draw_buffer
                    )));
                }
                Attachment::Color(_) => {}
            }
        }

        size.ok_or_else(|| Error::InvalidResource("Framebuffer has no attachments".to_string()))
    }
}
