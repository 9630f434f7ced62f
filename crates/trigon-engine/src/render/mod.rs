//! Per-frame rendering.
//!
//! [`RenderLoop`] owns the backend, the linked program and the geometry, and
//! runs one clear / activate / upload / bind / draw / present sequence per
//! frame. The ordering preconditions of that sequence are carried by the
//! [`ActiveProgram`] and [`BoundGeometry`] tokens.

mod error;
mod frame;
mod render_loop;
mod state;

pub use error::{ExitStatus, InitError};
pub use frame::{FrameConfig, FrameState, SceneDesc, DEFAULT_CLEAR_COLOR, DEFAULT_MVP_UNIFORM};
pub use render_loop::{LoopState, RenderLoop};
pub use state::{ActiveProgram, BoundGeometry};
