/// Material module - program + per-surface uniform values

pub mod material;

pub use material::{Material, MaterialDesc};
