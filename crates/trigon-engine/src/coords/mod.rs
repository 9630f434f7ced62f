//! Framebuffer coordinates.

mod viewport;

pub use viewport::Viewport;
