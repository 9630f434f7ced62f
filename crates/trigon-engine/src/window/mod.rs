//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the window, and drives a `RenderLoop` over
//! a `WgpuBackend` from window events.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
