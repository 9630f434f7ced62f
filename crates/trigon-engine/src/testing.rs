//! Shaders and vertex data shared by unit tests, taken from the demo crate.

// The demo binaries ship these shaders; tests compile the same files.
pub(crate) const TRIANGLE_VS: &str = include_str!("../../trigon-demos/shaders/basic.vert.wgsl");
pub(crate) const TRIANGLE_FS: &str = include_str!("../../trigon-demos/shaders/basic.frag.wgsl");
pub(crate) const CUBE_VS: &str = include_str!("../../trigon-demos/shaders/cube.vert.wgsl");
pub(crate) const CUBE_FS: &str = include_str!("../../trigon-demos/shaders/cube.frag.wgsl");

#[path = "../../trigon-demos/src/mesh.rs"]
mod mesh;

pub(crate) use mesh::{CUBE as CUBE_VERTICES, TRIANGLE as TRIANGLE_VERTICES};
