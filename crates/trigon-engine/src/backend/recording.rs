use std::collections::VecDeque;

use glam::Mat4;
use slotmap::SlotMap;

use crate::device::SurfaceErrorAction;
use crate::geometry::{Topology, VertexLayout};
use crate::paint::Color;
use crate::shader::{StageInterface, StageKind, UniformBinding, UniformLocation};

use super::{BackendError, BufferId, GraphicsBackend, ProgramId, StageId, StageTable};

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader { kind: StageKind },
    ReleaseShader(StageId),
    LinkProgram,
    UniformLocation { name: String },
    UseProgram(ProgramId),
    SetUniformMat4 { location: UniformLocation, value: Mat4 },
    ReleaseProgram(ProgramId),
    CreateVertexBuffer { floats: usize },
    BindVertexBuffer(BufferId),
    DeclareVertexLayout(VertexLayout),
    ReleaseVertexBuffer(BufferId),
    EnableDepthTest,
    SetViewport { width: u32, height: u32 },
    Clear { color: Color, depth: bool },
    Draw { topology: Topology, first: u32, count: u32 },
    Present,
}

#[derive(Debug)]
struct RecordedProgram {
    vertex: StageId,
    fragment: StageId,
    uniforms: Vec<UniformBinding>,
}

/// Headless backend that records calls instead of rendering.
///
/// It tracks the same implicit state a GPU API would (current program, bound
/// buffer, declared layouts, stage lifetimes) so that tests can check both
/// the call sequence and whether a draw would have produced anything.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<Call>,

    stages: StageTable<StageKind>,
    programs: SlotMap<ProgramId, RecordedProgram>,
    buffers: SlotMap<BufferId, Option<VertexLayout>>,

    current_program: Option<ProgramId>,
    bound_buffer: Option<BufferId>,
    depth_test: bool,

    frames_presented: u64,
    effective_draws: u64,
    skipped_draws: u64,

    present_failures: VecDeque<SurfaceErrorAction>,
    link_rejection: Option<String>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Returns and forgets the calls received so far.
    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    /// Makes the next `present` fail with `action`.
    pub fn fail_next_present(&mut self, action: SurfaceErrorAction) {
        self.present_failures.push_back(action);
    }

    /// Makes the next `link_program` fail with `message`.
    pub fn reject_next_link(&mut self, message: impl Into<String>) {
        self.link_rejection = Some(message.into());
    }

    pub fn live_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn bound_buffer(&self) -> Option<BufferId> {
        self.bound_buffer
    }

    pub fn depth_test_enabled(&self) -> bool {
        self.depth_test
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Draws that had a program, a bound buffer and a declared layout.
    pub fn effective_draws(&self) -> u64 {
        self.effective_draws
    }

    /// Draws that would have rendered nothing.
    pub fn skipped_draws(&self) -> u64 {
        self.skipped_draws
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_shader(
        &mut self,
        kind: StageKind,
        _source: &str,
        _interface: &StageInterface,
    ) -> StageId {
        self.calls.push(Call::CreateShader { kind });
        self.stages.insert(kind)
    }

    fn release_shader(&mut self, stage: StageId) {
        self.calls.push(Call::ReleaseShader(stage));
        self.stages.request_release(stage);
    }

    fn link_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        uniforms: &[UniformBinding],
    ) -> Result<ProgramId, BackendError> {
        self.calls.push(Call::LinkProgram);

        if let Some(message) = self.link_rejection.take() {
            return Err(BackendError::Rejected(message));
        }
        if !self.stages.contains(vertex) || !self.stages.contains(fragment) {
            return Err(BackendError::StaleHandle("stage"));
        }

        self.stages.retain(vertex);
        self.stages.retain(fragment);

        Ok(self.programs.insert(RecordedProgram {
            vertex,
            fragment,
            uniforms: uniforms.to_vec(),
        }))
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.calls.push(Call::UniformLocation {
            name: name.to_owned(),
        });
        self.programs
            .get(program)?
            .uniforms
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.location)
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(Call::UseProgram(program));
        self.current_program = self.programs.contains_key(program).then_some(program);
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        self.calls.push(Call::SetUniformMat4 {
            location,
            value: *value,
        });
    }

    fn release_program(&mut self, program: ProgramId) {
        self.calls.push(Call::ReleaseProgram(program));
        if let Some(p) = self.programs.remove(program) {
            self.stages.unretain(p.vertex);
            self.stages.unretain(p.fragment);
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId {
        self.calls.push(Call::CreateVertexBuffer { floats: data.len() });
        self.buffers.insert(None)
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferId) {
        self.calls.push(Call::BindVertexBuffer(buffer));
        self.bound_buffer = self.buffers.contains_key(buffer).then_some(buffer);
    }

    fn declare_vertex_layout(&mut self, layout: &VertexLayout) {
        self.calls.push(Call::DeclareVertexLayout(layout.clone()));
        if let Some(slot) = self.bound_buffer.and_then(|id| self.buffers.get_mut(id)) {
            *slot = Some(layout.clone());
        }
    }

    fn release_vertex_buffer(&mut self, buffer: BufferId) {
        self.calls.push(Call::ReleaseVertexBuffer(buffer));
        self.buffers.remove(buffer);
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
        }
    }

    fn enable_depth_test(&mut self) {
        self.calls.push(Call::EnableDepthTest);
        self.depth_test = true;
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(Call::SetViewport { width, height });
    }

    fn clear(&mut self, color: Color, depth: bool) {
        self.calls.push(Call::Clear { color, depth });
    }

    fn draw(&mut self, topology: Topology, first: u32, count: u32) {
        self.calls.push(Call::Draw {
            topology,
            first,
            count,
        });

        let has_layout = self
            .bound_buffer
            .and_then(|id| self.buffers.get(id))
            .is_some_and(|layout| layout.is_some());

        if self.current_program.is_some() && has_layout {
            self.effective_draws += 1;
        } else {
            self.skipped_draws += 1;
        }
    }

    fn present(&mut self) -> Result<(), SurfaceErrorAction> {
        self.calls.push(Call::Present);
        if let Some(action) = self.present_failures.pop_front() {
            return Err(action);
        }
        self.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_without_program_is_skipped() {
        let mut backend = RecordingBackend::new();
        let buffer = backend.create_vertex_buffer(&[0.0; 9]);
        backend.bind_vertex_buffer(buffer);
        backend.declare_vertex_layout(&VertexLayout::positions3());

        backend.draw(Topology::Triangles, 0, 3);
        assert_eq!(backend.skipped_draws(), 1);
        assert_eq!(backend.effective_draws(), 0);
    }

    #[test]
    fn layout_declared_with_nothing_bound_is_lost() {
        let mut backend = RecordingBackend::new();
        let buffer = backend.create_vertex_buffer(&[0.0; 9]);
        backend.declare_vertex_layout(&VertexLayout::positions3());
        backend.bind_vertex_buffer(buffer);

        backend.draw(Topology::Triangles, 0, 3);
        assert_eq!(backend.skipped_draws(), 1);
    }

    #[test]
    fn released_buffer_cannot_be_bound() {
        let mut backend = RecordingBackend::new();
        let buffer = backend.create_vertex_buffer(&[0.0; 9]);
        backend.release_vertex_buffer(buffer);
        backend.bind_vertex_buffer(buffer);

        assert_eq!(backend.bound_buffer(), None);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn injected_present_failures_are_consumed_in_order() {
        let mut backend = RecordingBackend::new();
        backend.fail_next_present(SurfaceErrorAction::SkipFrame);
        backend.fail_next_present(SurfaceErrorAction::Fatal);

        assert_eq!(backend.present(), Err(SurfaceErrorAction::SkipFrame));
        assert_eq!(backend.present(), Err(SurfaceErrorAction::Fatal));
        assert_eq!(backend.present(), Ok(()));
        assert_eq!(backend.frames_presented(), 1);
    }
}
