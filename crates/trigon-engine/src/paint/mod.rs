//! Color representation shared by the clear step and the backend.

mod color;

pub use color::Color;
