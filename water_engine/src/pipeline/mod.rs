/// Water pipeline module - assembly of the water demo's pass chain

pub mod settings;
pub mod water_surface;
pub mod water_pipeline;

pub use settings::{ShowType, SsrSettings, WaterPipelineSettings, WaterSurfaceSettings, WaterClock};
pub use water_surface::{WaterSurface, WaterTextures, register_geometry_program, geometry_filtered_uniforms};
pub use water_pipeline::{WaterPipeline, WaterPrograms, WaterTargets};

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
