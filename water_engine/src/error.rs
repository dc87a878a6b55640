//! Error types for the Water3D engine
//!
//! Setup-time failures (device resources, materials, framebuffer layouts)
//! and backend failures during a frame are all reported through [`Error`].
//! A frame has no recovery path: the first error aborts it.

use std::fmt;

/// Result type for Water3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Water3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (software rasterizer, GPU driver, poisoned device lock)
    BackendError(String),

    /// Out of device memory
    OutOfMemory,

    /// Invalid resource (texture, framebuffer layout, program, uniform name)
    InvalidResource(String),

    /// Initialization failed (renderer, pipeline assembly)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of device memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
