/*!
# Water3D - Software Renderer Backend

CPU implementation of the water_engine `GraphicsDevice` trait.

Triangles are rasterized with OpenGL conventions (bottom-left origin,
counter-clockwise front faces, window depth in [0, 1]). Shader programs are
Rust callbacks that read uniforms and textures by name, so the renderer,
materials and passes run unchanged and every frame can be read back for
inspection.

The stock programs cover the water pipeline and a diffuse geometry shader.
*/

mod software_texture;
mod software_rasterizer;
mod software_program;
mod software_shading;
mod software_device;
mod software_stock_programs;

pub mod water3d {
    pub use crate::software_device::SoftwareGraphicsDevice;
    pub use crate::software_texture::SoftwareTexture;
    pub use crate::software_rasterizer::{rasterize_triangle, ClipVertex, Fragment};
    pub use crate::software_program::{
        FragmentInput, FragmentOutput, FragmentProgram, ShadeContext, SoftwareProgram, Uniforms,
        VertexStage, FRAGMENT_TARGETS,
    };

    pub mod shading {
        pub use crate::software_shading::*;
    }

    pub mod programs {
        pub use crate::software_stock_programs::*;
    }
}
