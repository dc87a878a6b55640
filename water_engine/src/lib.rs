/*!
# Water3D Engine

Render-pass based deferred renderer for a stylized water scene.

The renderer drives an abstract graphics device through a fixed, ordered list
of render passes. Backends implement [`GraphicsDevice`](crate::device::GraphicsDevice);
the `water_engine_renderer_software` crate provides a CPU rasterizer.

## Architecture

- **GraphicsDevice**: textures, framebuffers, raster state, programs, meshes
- **Material**: program + property values, with renderer-driven uniforms filtered out
- **Renderer**: draw-call collections, camera, lights, program callbacks and the pass list
- **RenderPass**: one step of the frame (G-buffer, deferred lighting, skybox,
  G-buffer copy, transparency, post effects)
- **WaterPipeline**: the complete water pass chain with SSR and reflection blur

Passes that change blend or depth state scope the change with
[`RenderStateGuard`](crate::device::RenderStateGuard), which restores the
saved state when dropped.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod uniforms;
pub mod device;
pub mod material;
pub mod camera;
pub mod lighting;
pub mod renderer;
pub mod render_pass;
pub mod pipeline;

// Main water3d namespace module
pub mod water3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging host
    pub use crate::engine::Engine;

    // Renderer
    pub use crate::renderer::{Renderer, RendererConfig};

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod device {
        pub use crate::device::*;
    }

    pub mod render {
        pub use crate::camera::Camera;
        pub use crate::lighting::*;
        pub use crate::material::*;
        pub use crate::renderer::*;
        pub use crate::render_pass::*;
    }

    pub mod pipeline {
        pub use crate::pipeline::*;
    }

    pub mod uniforms {
        pub use crate::uniforms::*;
    }
}

// Re-export math library at crate root
pub use glam;
