//! Trigon engine crate.
//!
//! A minimal forward renderer: compile and link a WGSL program, upload one
//! vertex buffer, and draw it every frame under an optional time-varying
//! transform. The window runtime and the wgpu backend are thin layers over
//! the headless pieces (`shader`, `geometry`, `transform`, `render`), which
//! run against any [`backend::GraphicsBackend`].

pub mod backend;
pub mod coords;
pub mod device;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod paint;
pub mod render;
pub mod shader;
pub mod time;
pub mod transform;
pub mod window;

#[cfg(test)]
mod testing;
