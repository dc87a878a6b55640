/// Draw calls queued for the current frame

use std::sync::Arc;
use glam::Mat4;
use crate::device::MeshHandle;
use crate::material::Material;

/// One submesh drawn with one material at one world transform
#[derive(Clone)]
pub struct DrawcallInfo {
    pub mesh: MeshHandle,
    pub submesh: usize,
    pub material: Arc<Material>,
    pub world_matrix: Mat4,
}

impl DrawcallInfo {
    pub fn new(mesh: MeshHandle, submesh: usize, material: Arc<Material>, world_matrix: Mat4) -> Self {
        Self {
            mesh,
            submesh,
            material,
            world_matrix,
        }
    }
}

impl std::fmt::Debug for DrawcallInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawcallInfo")
            .field("mesh", &self.mesh)
            .field("submesh", &self.submesh)
            .field("program", &self.material.program())
            .field("transparent", &self.material.is_transparent())
            .finish()
    }
}

/// Which draw calls a collection (or a pass) accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawcallFilter {
    #[default]
    All,
    Opaque,
    Transparent,
}

impl DrawcallFilter {
    pub fn accepts(self, material: &Material) -> bool {
        match self {
            DrawcallFilter::All => true,
            DrawcallFilter::Opaque => !material.is_transparent(),
            DrawcallFilter::Transparent => material.is_transparent(),
        }
    }
}

/// Ordered list of draw calls matching a filter
#[derive(Debug, Default)]
pub struct DrawcallCollection {
    filter: DrawcallFilter,
    drawcalls: Vec<DrawcallInfo>,
}

impl DrawcallCollection {
    pub fn new(filter: DrawcallFilter) -> Self {
        Self {
            filter,
            drawcalls: Vec::new(),
        }
    }

    pub fn filter(&self) -> DrawcallFilter {
        self.filter
    }

    /// Append if the filter accepts the draw call's material
    pub fn offer(&mut self, drawcall: &DrawcallInfo) -> bool {
        if self.filter.accepts(&drawcall.material) {
            self.drawcalls.push(drawcall.clone());
            true
        } else {
            false
        }
    }

    pub fn drawcalls(&self) -> &[DrawcallInfo] {
        &self.drawcalls
    }

    pub fn clear(&mut self) {
        self.drawcalls.clear();
    }
}
