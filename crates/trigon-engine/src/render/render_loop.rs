use crate::backend::GraphicsBackend;
use crate::coords::Viewport;
use crate::geometry::GeometryBuffer;
use crate::input::InputState;
use crate::shader::{ShaderCompiler, ShaderProgram, UniformLocation};
use crate::time::FrameTime;
use crate::transform::TransformComposer;

use super::{ExitStatus, FrameConfig, FrameState, InitError, SceneDesc};

/// Lifecycle of a [`RenderLoop`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Initializing,
    Running,
    Closing,
    Terminated,
}

/// GPU resources of the drawn object.
struct LoadedScene {
    program: ShaderProgram,
    geometry: GeometryBuffer,
    transform: Option<Box<dyn TransformComposer>>,
    /// Resolved once at initialization.
    mvp: Option<UniformLocation>,
    depth_test: bool,
}

impl LoadedScene {
    fn load<B: GraphicsBackend>(backend: &mut B, desc: SceneDesc) -> Result<Self, InitError> {
        let SceneDesc {
            vertex_shader,
            fragment_shader,
            vertices,
            layout,
            topology,
            depth_test,
            transform,
            mvp_uniform,
        } = desc;

        if depth_test {
            backend.enable_depth_test();
        }

        let mut compiler = ShaderCompiler::new();
        let vertex = compiler.compile(backend, &vertex_shader)?;
        let fragment = match compiler.compile(backend, &fragment_shader) {
            Ok(fragment) => fragment,
            Err(err) => {
                vertex.release(backend);
                return Err(err.into());
            }
        };

        let mut program = ShaderProgram::link(backend, vertex, fragment)?;

        let geometry = match GeometryBuffer::create(backend, &vertices, layout, topology) {
            Ok(geometry) => geometry,
            Err(err) => {
                program.release(backend);
                return Err(err.into());
            }
        };

        let mvp = match transform {
            Some(_) => {
                let location = program.uniform_location(backend, &mvp_uniform);
                if location.is_none() {
                    log::warn!("transform set but program has no `{mvp_uniform}` uniform");
                }
                location
            }
            None => None,
        };

        Ok(Self {
            program,
            geometry,
            transform,
            mvp,
            depth_test,
        })
    }

    fn draw<B: GraphicsBackend>(&self, backend: &mut B, elapsed: f32, aspect_ratio: f32) {
        let mut active = self.program.activate(backend);

        if let (Some(transform), Some(location)) = (&self.transform, self.mvp) {
            let mvp = transform.compose(elapsed, aspect_ratio);
            active.set_matrix4(location, &mvp);
        }

        active.bind(&self.geometry).draw();
    }

    fn release<B: GraphicsBackend>(self, backend: &mut B) {
        self.program.release(backend);
        self.geometry.release(backend);
    }
}

/// Per-frame state machine driving one backend.
///
/// `Initializing -> Running -> Closing -> Terminated`. An initialization
/// failure goes straight to `Terminated`.
pub struct RenderLoop<B: GraphicsBackend> {
    backend: B,
    config: FrameConfig,
    state: LoopState,
    status: ExitStatus,
    scene: Option<LoadedScene>,
    frame: FrameState,
}

impl<B: GraphicsBackend> RenderLoop<B> {
    pub fn new(backend: B, config: FrameConfig) -> Self {
        let frame = FrameState {
            elapsed_seconds: 0.0,
            viewport: config.viewport,
        };
        Self {
            backend,
            config,
            state: LoopState::Initializing,
            status: ExitStatus::Success,
            scene: None,
            frame,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Time and viewport of the last frame.
    pub fn frame_state(&self) -> FrameState {
        self.frame
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Builds the scene's GPU resources. `None` runs a clear-only loop.
    ///
    /// On failure everything created so far is released and the loop ends in
    /// `Terminated` with a failure status.
    pub fn initialize(&mut self, scene: Option<SceneDesc>) -> Result<(), InitError> {
        if self.state != LoopState::Initializing {
            return Err(InitError::InvalidState(self.state));
        }

        let Some(desc) = scene else {
            log::info!("no scene; clearing only");
            self.state = LoopState::Running;
            return Ok(());
        };

        match LoadedScene::load(&mut self.backend, desc) {
            Ok(scene) => {
                let geometry = &scene.geometry;
                log::info!(
                    "scene ready: {} vertices, {} {:?} primitives, depth test {}",
                    geometry.vertex_count(),
                    geometry.topology().primitive_count(geometry.vertex_count()),
                    geometry.topology(),
                    if scene.depth_test { "on" } else { "off" },
                );
                self.scene = Some(scene);
                self.state = LoopState::Running;
                Ok(())
            }
            Err(err) => {
                log::error!("initialization failed: {err}");
                self.fail();
                Err(err)
            }
        }
    }

    fn fail(&mut self) {
        self.status = ExitStatus::Failure;
        self.state = LoopState::Terminated;
    }

    /// Runs one iteration. Does nothing outside `Running`.
    pub fn frame(&mut self, input: &InputState, time: FrameTime) -> LoopState {
        if self.state != LoopState::Running {
            return self.state;
        }

        if input.key_down(self.config.exit_key) {
            log::info!("{} pressed; closing", self.config.exit_key);
            self.state = LoopState::Closing;
            return self.state;
        }

        self.frame.elapsed_seconds = time.elapsed;

        let depth = self.scene.as_ref().is_some_and(|s| s.depth_test);
        self.backend.clear(self.config.clear_color, depth);

        if let Some(scene) = &self.scene {
            scene.draw(&mut self.backend, time.elapsed, self.config.aspect_ratio);
        }

        match self.backend.present() {
            Ok(()) => {}
            Err(action) if action.is_fatal() => {
                log::error!("frame {} could not be presented; closing", time.frame_index);
                self.state = LoopState::Closing;
            }
            Err(action) => {
                log::debug!("frame {} not presented ({action:?})", time.frame_index);
            }
        }

        self.state
    }

    /// External close request (window manager). Only leaves `Running`.
    pub fn request_close(&mut self) {
        if self.state == LoopState::Running {
            log::info!("close requested");
            self.state = LoopState::Closing;
        }
    }

    /// Updates the viewport to the new framebuffer size. The projection's
    /// aspect ratio is left alone. Zero sizes (minimized) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        if !viewport.is_valid() {
            log::debug!("ignoring resize to {width}x{height}");
            return;
        }
        if self.state == LoopState::Terminated {
            return;
        }

        self.frame.viewport = viewport;
        self.backend.set_viewport(width, height);
    }

    /// Releases the program and geometry. Safe to call more than once.
    pub fn shutdown(&mut self) -> ExitStatus {
        if let Some(scene) = self.scene.take() {
            scene.release(&mut self.backend);
            log::debug!("scene resources released");
        }
        self.state = LoopState::Terminated;
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Call, RecordingBackend};
    use crate::device::SurfaceErrorAction;
    use crate::geometry::{GeometryError, Topology};
    use crate::input::Key;
    use crate::shader::{ShaderSource, StageKind};
    use crate::testing::{
        CUBE_FS, CUBE_VERTICES, CUBE_VS, TRIANGLE_FS, TRIANGLE_VERTICES, TRIANGLE_VS,
    };
    use crate::transform::SpinningCamera;
    use glam::Mat4;

    fn triangle() -> SceneDesc {
        SceneDesc::new(
            ShaderSource::new(StageKind::Vertex, TRIANGLE_VS),
            ShaderSource::new(StageKind::Fragment, TRIANGLE_FS),
            TRIANGLE_VERTICES,
        )
    }

    fn cube() -> SceneDesc {
        SceneDesc::new(
            ShaderSource::new(StageKind::Vertex, CUBE_VS),
            ShaderSource::new(StageKind::Fragment, CUBE_FS),
            CUBE_VERTICES,
        )
        .with_depth_test()
        .with_transform(SpinningCamera::default())
    }

    fn running(scene: Option<SceneDesc>) -> RenderLoop<RecordingBackend> {
        let mut render_loop = RenderLoop::new(RecordingBackend::new(), FrameConfig::default());
        render_loop.initialize(scene).unwrap();
        assert_eq!(render_loop.state(), LoopState::Running);
        render_loop.backend_mut().take_calls();
        render_loop
    }

    fn idle() -> InputState {
        InputState::default()
    }

    #[test]
    fn triangle_draws_three_vertices_without_transform() {
        let mut render_loop = running(Some(triangle()));

        render_loop.frame(&idle(), FrameTime::at(0.5, 0));
        let calls = render_loop.backend_mut().take_calls();

        let draws: Vec<&Call> = calls.iter().filter(|c| matches!(c, Call::Draw { .. })).collect();
        assert_eq!(
            draws,
            [&Call::Draw {
                topology: Topology::Triangles,
                first: 0,
                count: 3
            }]
        );
        assert!(!calls.iter().any(|c| matches!(c, Call::SetUniformMat4 { .. })));
        assert!(!calls.iter().any(|c| matches!(c, Call::UniformLocation { .. })));
        assert_eq!(
            calls.first(),
            Some(&Call::Clear {
                color: FrameConfig::default().clear_color,
                depth: false
            })
        );
        assert_eq!(calls.last(), Some(&Call::Present));
        assert_eq!(render_loop.backend().effective_draws(), 1);
    }

    #[test]
    fn cube_draws_36_vertices_with_depth_cleared_every_frame() {
        let mut render_loop = RenderLoop::new(RecordingBackend::new(), FrameConfig::default());
        render_loop.initialize(Some(cube())).unwrap();

        let calls = render_loop.backend_mut().take_calls();
        assert_eq!(calls.first(), Some(&Call::EnableDepthTest));
        assert!(render_loop.backend().depth_test_enabled());

        for i in 0..3 {
            render_loop.frame(&idle(), FrameTime::at(i as f32, i));
            let calls = render_loop.backend_mut().take_calls();

            assert!(matches!(calls[0], Call::Clear { depth: true, .. }));
            assert!(calls.contains(&Call::Draw {
                topology: Topology::Triangles,
                first: 0,
                count: 36
            }));
        }
        assert_eq!(render_loop.backend().frames_presented(), 3);
    }

    #[test]
    fn cube_uploads_the_composed_transform() {
        let mut render_loop = running(Some(cube()));
        let aspect = render_loop.config().aspect_ratio;

        render_loop.frame(&idle(), FrameTime::at(1.25, 0));
        let calls = render_loop.backend_mut().take_calls();

        let expected = SpinningCamera::default().compose(1.25, aspect);
        let uploaded: Vec<Mat4> = calls
            .iter()
            .filter_map(|c| match c {
                Call::SetUniformMat4 { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(uploaded, [expected]);

        let use_at = calls.iter().position(|c| matches!(c, Call::UseProgram(_)));
        let set_at = calls.iter().position(|c| matches!(c, Call::SetUniformMat4 { .. }));
        let draw_at = calls.iter().position(|c| matches!(c, Call::Draw { .. }));
        assert!(use_at < set_at && set_at < draw_at);
    }

    #[test]
    fn exit_key_closes_before_drawing() {
        let mut render_loop = running(Some(triangle()));
        for i in 0..5 {
            assert_eq!(render_loop.frame(&idle(), FrameTime::at(i as f32, i)), LoopState::Running);
        }
        render_loop.backend_mut().take_calls();

        let escape = InputState::with_keys_down([Key::Escape]);
        assert_eq!(render_loop.frame(&escape, FrameTime::at(6.0, 6)), LoopState::Closing);
        assert!(render_loop.backend().calls().is_empty());

        // No further frames once closing.
        assert_eq!(render_loop.frame(&idle(), FrameTime::at(7.0, 7)), LoopState::Closing);
        assert!(render_loop.backend().calls().is_empty());
    }

    #[test]
    fn exit_key_on_first_frame_closes() {
        let mut render_loop = running(Some(triangle()));
        let escape = InputState::with_keys_down([Key::Escape]);
        assert_eq!(render_loop.frame(&escape, FrameTime::at(0.0, 0)), LoopState::Closing);
    }

    #[test]
    fn missing_shader_file_fails_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let scene = SceneDesc::new(
            ShaderSource::load(StageKind::Vertex, dir.path().join("missing.vert.wgsl")),
            ShaderSource::new(StageKind::Fragment, TRIANGLE_FS),
            TRIANGLE_VERTICES,
        );

        let mut render_loop = RenderLoop::new(RecordingBackend::new(), FrameConfig::default());
        let err = render_loop.initialize(Some(scene)).unwrap_err();

        assert!(matches!(err, InitError::Compile(_)));
        assert_eq!(render_loop.state(), LoopState::Terminated);
        assert_eq!(render_loop.shutdown(), ExitStatus::Failure);
        assert_eq!(ExitStatus::Failure.code(), 255);
        assert!(render_loop.backend().calls().is_empty());
    }

    #[test]
    fn fragment_failure_releases_vertex_stage() {
        let scene = SceneDesc::new(
            ShaderSource::new(StageKind::Vertex, TRIANGLE_VS),
            ShaderSource::new(StageKind::Fragment, "fn broken( {"),
            TRIANGLE_VERTICES,
        );

        let mut render_loop = RenderLoop::new(RecordingBackend::new(), FrameConfig::default());
        assert!(render_loop.initialize(Some(scene)).is_err());
        assert_eq!(render_loop.backend().live_stages(), 0);
    }

    #[test]
    fn link_failure_leaves_nothing_allocated() {
        let scene = SceneDesc::new(
            ShaderSource::new(StageKind::Vertex, TRIANGLE_VS),
            ShaderSource::new(StageKind::Fragment, CUBE_FS),
            TRIANGLE_VERTICES,
        );

        let mut render_loop = RenderLoop::new(RecordingBackend::new(), FrameConfig::default());
        let err = render_loop.initialize(Some(scene)).unwrap_err();

        assert!(matches!(err, InitError::Link(_)));
        let backend = render_loop.backend();
        assert_eq!(
            (backend.live_stages(), backend.live_programs(), backend.live_buffers()),
            (0, 0, 0)
        );
    }

    #[test]
    fn geometry_failure_releases_program() {
        let scene = SceneDesc::new(
            ShaderSource::new(StageKind::Vertex, TRIANGLE_VS),
            ShaderSource::new(StageKind::Fragment, TRIANGLE_FS),
            vec![0.0_f32; 8],
        );

        let mut render_loop = RenderLoop::new(RecordingBackend::new(), FrameConfig::default());
        let err = render_loop.initialize(Some(scene)).unwrap_err();

        assert!(matches!(
            err,
            InitError::Geometry(GeometryError::PartialVertex { .. })
        ));
        let backend = render_loop.backend();
        assert_eq!((backend.live_stages(), backend.live_programs()), (0, 0));
        assert_eq!(render_loop.shutdown(), ExitStatus::Failure);
    }

    #[test]
    fn shutdown_releases_everything() {
        let mut render_loop = running(Some(cube()));
        render_loop.frame(&idle(), FrameTime::at(0.0, 0));
        render_loop.request_close();
        assert_eq!(render_loop.state(), LoopState::Closing);

        assert_eq!(render_loop.shutdown(), ExitStatus::Success);
        assert_eq!(render_loop.state(), LoopState::Terminated);

        let backend = render_loop.backend();
        assert_eq!(
            (backend.live_stages(), backend.live_programs(), backend.live_buffers()),
            (0, 0, 0)
        );

        // Second shutdown is a no-op.
        render_loop.backend_mut().take_calls();
        assert_eq!(render_loop.shutdown(), ExitStatus::Success);
        assert!(render_loop.backend().calls().is_empty());
    }

    #[test]
    fn clear_only_loop_presents_without_drawing() {
        let mut render_loop = running(None);
        render_loop.frame(&idle(), FrameTime::at(0.0, 0));

        assert_eq!(
            render_loop.backend().calls(),
            &[
                Call::Clear {
                    color: FrameConfig::default().clear_color,
                    depth: false
                },
                Call::Present,
            ]
        );
        assert_eq!(render_loop.shutdown(), ExitStatus::Success);
    }

    #[test]
    fn fatal_present_closes_the_loop() {
        let mut render_loop = running(Some(triangle()));
        render_loop.backend_mut().fail_next_present(SurfaceErrorAction::Fatal);

        assert_eq!(render_loop.frame(&idle(), FrameTime::at(0.0, 0)), LoopState::Closing);
        assert_eq!(render_loop.shutdown(), ExitStatus::Success);
    }

    #[test]
    fn transient_present_failure_keeps_running() {
        let mut render_loop = running(Some(triangle()));
        let backend = render_loop.backend_mut();
        backend.fail_next_present(SurfaceErrorAction::SkipFrame);
        backend.fail_next_present(SurfaceErrorAction::Reconfigured);

        for i in 0..3 {
            assert_eq!(render_loop.frame(&idle(), FrameTime::at(0.0, i)), LoopState::Running);
        }
        assert_eq!(render_loop.backend().frames_presented(), 1);
    }

    #[test]
    fn resize_updates_viewport_but_not_projection() {
        let mut render_loop = running(Some(cube()));
        let aspect = render_loop.config().aspect_ratio;

        render_loop.resize(1920, 1080);
        render_loop.resize(0, 0);
        assert_eq!(
            render_loop.backend_mut().take_calls(),
            vec![Call::SetViewport {
                width: 1920,
                height: 1080
            }]
        );
        assert_eq!(render_loop.frame_state().viewport, Viewport::new(1920, 1080));

        render_loop.frame(&idle(), FrameTime::at(2.0, 0));
        let expected = SpinningCamera::default().compose(2.0, aspect);
        assert!(render_loop.backend().calls().iter().any(
            |c| matches!(c, Call::SetUniformMat4 { value, .. } if *value == expected)
        ));
    }

    #[test]
    fn viewport_is_valid_from_the_first_frame() {
        let mut render_loop = running(None);
        assert_eq!(render_loop.frame_state().viewport, Viewport::new(800, 600));

        render_loop.frame(&idle(), FrameTime::at(0.5, 0));
        let state = render_loop.frame_state();
        assert!(state.viewport.is_valid());
        assert_eq!(state.elapsed_seconds, 0.5);
    }

    #[test]
    fn default_aspect_ratio_matches_default_viewport() {
        let config = FrameConfig::default();
        assert_eq!(config.viewport.aspect_ratio(), Some(config.aspect_ratio));
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let mut render_loop = running(None);
        assert!(matches!(
            render_loop.initialize(None),
            Err(InitError::InvalidState(LoopState::Running))
        ));
    }

    #[test]
    fn nothing_happens_before_initialization() {
        let mut render_loop = RenderLoop::new(RecordingBackend::new(), FrameConfig::default());
        assert_eq!(
            render_loop.frame(&idle(), FrameTime::at(0.0, 0)),
            LoopState::Initializing
        );
        render_loop.request_close();
        assert_eq!(render_loop.state(), LoopState::Initializing);
        assert!(render_loop.backend().calls().is_empty());
    }
}
