//! Input subsystem.
//!
//! Public API does not expose winit types. The runtime translates platform
//! events into `InputEvent`s (see `platform`).

pub(crate) mod platform;
mod state;
mod types;

pub use state::InputState;
pub use types::{InputEvent, Key, KeyState};
