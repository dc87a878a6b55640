/// Lighting module - scene lights and the callback that uploads them in batches

pub mod light;
pub mod light_updater;

pub use light::{Light, LightKind, LightType};
pub use light_updater::LightUpdater;
