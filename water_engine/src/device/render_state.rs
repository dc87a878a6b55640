/// Fixed-function raster state and the scoped guard that restores it

use std::ops::{Deref, DerefMut};
use bitflags::bitflags;
use glam::Vec4;
use crate::device::GraphicsDevice;

bitflags! {
    /// Toggleable pipeline features
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        const DEPTH_TEST = 1 << 0;
        const BLEND = 1 << 1;
        const CULL_FACE = 1 << 2;
    }
}

/// Blend factor applied to source or destination color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

impl BlendFactor {
    /// Per-channel weight for this factor given the incoming and stored colors
    pub fn weight(self, src: Vec4, dst: Vec4) -> Vec4 {
        match self {
            BlendFactor::Zero => Vec4::ZERO,
            BlendFactor::One => Vec4::ONE,
            BlendFactor::SrcColor => src,
            BlendFactor::OneMinusSrcColor => Vec4::ONE - src,
            BlendFactor::SrcAlpha => Vec4::splat(src.w),
            BlendFactor::OneMinusSrcAlpha => Vec4::splat(1.0 - src.w),
            BlendFactor::DstAlpha => Vec4::splat(dst.w),
            BlendFactor::OneMinusDstAlpha => Vec4::splat(1.0 - dst.w),
        }
    }
}

/// Source and destination blend factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFunc {
    pub const REPLACE: BlendFunc = BlendFunc { src: BlendFactor::One, dst: BlendFactor::Zero };
    pub const ADDITIVE: BlendFunc = BlendFunc { src: BlendFactor::One, dst: BlendFactor::One };
    pub const ALPHA: BlendFunc = BlendFunc {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };
    /// Alpha-weighted source added on top of the destination
    pub const ALPHA_ADDITIVE: BlendFunc = BlendFunc {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::One,
    };

    pub fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self { src, dst }
    }

    /// `src * f_src + dst * f_dst`
    pub fn blend(&self, src: Vec4, dst: Vec4) -> Vec4 {
        src * self.src.weight(src, dst) + dst * self.dst.weight(src, dst)
    }
}

impl Default for BlendFunc {
    fn default() -> Self {
        Self::REPLACE
    }
}

/// Depth comparison, `incoming <op> stored`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFunc {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl DepthFunc {
    pub fn test(self, incoming: f32, stored: f32) -> bool {
        match self {
            DepthFunc::Never => false,
            DepthFunc::Less => incoming < stored,
            DepthFunc::Equal => incoming == stored,
            DepthFunc::LessEqual => incoming <= stored,
            DepthFunc::Greater => incoming > stored,
            DepthFunc::NotEqual => incoming != stored,
            DepthFunc::GreaterEqual => incoming >= stored,
            DepthFunc::Always => true,
        }
    }
}

/// Snapshot of the state render passes are allowed to touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub blend_enabled: bool,
    pub blend_func: BlendFunc,
    pub depth_test_enabled: bool,
    pub depth_func: DepthFunc,
}

impl RenderState {
    pub fn capture(device: &dyn GraphicsDevice) -> Self {
        Self {
            blend_enabled: device.is_feature_enabled(Features::BLEND),
            blend_func: device.blend_func(),
            depth_test_enabled: device.is_feature_enabled(Features::DEPTH_TEST),
            depth_func: device.depth_func(),
        }
    }

    pub fn apply(&self, device: &mut dyn GraphicsDevice) {
        device.set_feature_enabled(Features::BLEND, self.blend_enabled);
        device.set_blend_func(self.blend_func);
        device.set_feature_enabled(Features::DEPTH_TEST, self.depth_test_enabled);
        device.set_depth_func(self.depth_func);
    }
}

/// Anything that exposes the graphics device a guard should restore
pub trait DeviceAccess {
    fn device_ref(&self) -> &dyn GraphicsDevice;
    fn device_mut(&mut self) -> &mut dyn GraphicsDevice;
}

impl<'d> DeviceAccess for dyn GraphicsDevice + 'd {
    fn device_ref(&self) -> &dyn GraphicsDevice {
        self
    }

    fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self
    }
}

/// Scoped state change
///
/// Captures the blend and depth state on creation and writes it back on drop,
/// including on early return through `?`. Derefs to the wrapped target so the
/// caller keeps using it while the guard is alive.
///
/// ```ignore
/// let mut ctx = RenderStateGuard::new(ctx);
/// ctx.device().set_depth_func(DepthFunc::Always);
/// ctx.draw_fullscreen()?;
/// // depth function restored here
/// ```
pub struct RenderStateGuard<'g, T: DeviceAccess + ?Sized> {
    target: &'g mut T,
    saved: RenderState,
}

impl<'g, T: DeviceAccess + ?Sized> RenderStateGuard<'g, T> {
    pub fn new(target: &'g mut T) -> Self {
        let saved = RenderState::capture(target.device_ref());
        Self { target, saved }
    }

    /// State that will be restored on drop
    pub fn saved(&self) -> &RenderState {
        &self.saved
    }
}

impl<T: DeviceAccess + ?Sized> Deref for RenderStateGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.target
    }
}

impl<T: DeviceAccess + ?Sized> DerefMut for RenderStateGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.target
    }
}

impl<T: DeviceAccess + ?Sized> Drop for RenderStateGuard<'_, T> {
    fn drop(&mut self) {
        self.saved.apply(self.target.device_mut());
    }
}

#[cfg(test)]
#[path = "render_state_tests.rs"]
mod tests;
