/// Renderer module - frame orchestration and per-program callbacks

pub mod config;
pub mod drawcall;
pub mod transform_updater;
pub mod program_registry;
pub mod frame_context;
pub mod renderer;

pub use config::RendererConfig;
pub use drawcall::{DrawcallInfo, DrawcallFilter, DrawcallCollection};
pub use transform_updater::{
    TransformUpdater, TransformArgs, TransformLocations, TransformUpdateFn, set_optional,
};
pub use program_registry::ProgramRegistry;
pub use frame_context::FrameContext;
pub use renderer::{Renderer, RenderPassId};
