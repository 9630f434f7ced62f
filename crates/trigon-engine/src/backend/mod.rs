//! Graphics capability interface.
//!
//! Everything the pipeline asks of the GPU goes through [`GraphicsBackend`].
//! The trait models an immediate-mode API: one current program, one bound
//! vertex buffer, fire-and-forget draws. State that the underlying API keeps
//! implicitly is explicit here, so the call sequence can be checked.
//!
//! Implementations:
//! - [`WgpuBackend`]: renders to a window surface through wgpu
//! - [`RecordingBackend`]: headless; records every call and can inject
//!   presentation failures

mod handles;
mod recording;
mod stage_table;
mod wgpu_backend;

pub use handles::{BufferId, ProgramId, StageId};
pub use recording::{Call, RecordingBackend};
pub use stage_table::StageTable;
pub use wgpu_backend::WgpuBackend;

use glam::Mat4;

use crate::device::SurfaceErrorAction;
use crate::geometry::{Topology, VertexLayout};
use crate::paint::Color;
use crate::shader::{StageInterface, StageKind, UniformBinding, UniformLocation};

/// Failure reported by a backend while creating a resource.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("{0} handle is unknown or already released")]
    StaleHandle(&'static str),

    #[error("{0}")]
    Rejected(String),
}

/// GPU operations used by the render pipeline.
///
/// Draw-level calls report nothing. Misuse (drawing with no program, no bound
/// buffer or no layout) yields an empty frame, never an error.
pub trait GraphicsBackend {
    /// Creates one shader object from validated WGSL.
    fn create_shader(&mut self, kind: StageKind, source: &str, interface: &StageInterface)
    -> StageId;

    /// Requests release of a stage. Reclaim waits until no program uses it.
    fn release_shader(&mut self, stage: StageId);

    /// Creates a program from two stages. The program keeps both stages alive.
    fn link_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        uniforms: &[UniformBinding],
    ) -> Result<ProgramId, BackendError>;

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn use_program(&mut self, program: ProgramId);

    /// Writes a 4x4 matrix uniform of the current program.
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    fn release_program(&mut self, program: ProgramId);

    /// Uploads static vertex data.
    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId;

    fn bind_vertex_buffer(&mut self, buffer: BufferId);

    /// Declares how the currently bound vertex buffer is read.
    fn declare_vertex_layout(&mut self, layout: &VertexLayout);

    fn release_vertex_buffer(&mut self, buffer: BufferId);

    fn enable_depth_test(&mut self);

    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clears the color target, and the depth target when `depth` is set.
    fn clear(&mut self, color: Color, depth: bool);

    /// Draws `count` vertices of the bound buffer with the current program.
    fn draw(&mut self, topology: Topology, first: u32, count: u32);

    /// Presents the frame built since the previous present.
    fn present(&mut self) -> Result<(), SurfaceErrorAction>;
}
