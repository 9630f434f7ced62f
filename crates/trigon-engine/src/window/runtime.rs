use std::sync::Arc;

use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::backend::WgpuBackend;
use crate::device::GpuInit;
use crate::input::platform::translate_window_event;
use crate::input::InputState;
use crate::render::{ExitStatus, FrameConfig, InitError, LoopState, RenderLoop, SceneDesc};
use crate::time::FrameClock;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "trigon".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and renders `scene` into it until the window is
    /// closed or the exit key is held.
    ///
    /// Initialization failures are logged and reported as
    /// [`ExitStatus::Failure`]; only event loop failures are errors.
    pub fn run(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        frame_config: FrameConfig,
        scene: Option<SceneDesc>,
    ) -> Result<ExitStatus> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, frame_config, scene);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(state.finish())
    }
}

/// Window plus everything rendered into it.
struct ActiveWindow {
    window: Arc<Window>,
    render_loop: RenderLoop<WgpuBackend>,

    input_state: InputState,
    clock: FrameClock,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    frame_config: FrameConfig,
    /// Taken on first `resumed`.
    scene: Option<SceneDesc>,

    active: Option<ActiveWindow>,
    /// Set once the run is over.
    status: Option<ExitStatus>,
}

impl AppState {
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        frame_config: FrameConfig,
        scene: Option<SceneDesc>,
    ) -> Self {
        Self {
            config,
            gpu_init,
            frame_config,
            scene,
            active: None,
            status: None,
        }
    }

    fn create_active_window(&mut self, event_loop: &ActiveEventLoop) -> Result<ActiveWindow, InitError> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .map(Arc::new)
            .map_err(|e| InitError::Window(e.to_string()))?;

        let backend = pollster::block_on(WgpuBackend::new(window.clone(), self.gpu_init.clone()))
            .map_err(|e| InitError::Gpu(format!("{e:#}")))?;

        let mut render_loop = RenderLoop::new(backend, self.frame_config.clone());
        render_loop.initialize(self.scene.take())?;

        // Physical size may differ from the logical one on scaled displays.
        let size = window.inner_size();
        render_loop.resize(size.width, size.height);

        Ok(ActiveWindow {
            window,
            render_loop,
            input_state: InputState::default(),
            clock: FrameClock::default(),
        })
    }

    /// Shuts the render loop down (if any) and stops the event loop.
    fn end(&mut self, event_loop: &ActiveEventLoop, status: Option<ExitStatus>) {
        let status = match self.active.take() {
            Some(mut active) => active.render_loop.shutdown(),
            None => status.unwrap_or(ExitStatus::Failure),
        };
        log::info!("exiting with status {}", status.code());

        self.status = Some(status);
        event_loop.exit();
    }

    fn finish(mut self) -> ExitStatus {
        if let Some(mut active) = self.active.take() {
            return active.render_loop.shutdown();
        }
        self.status.unwrap_or_default()
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.active.is_some() || self.status.is_some() {
            return;
        }

        match self.create_active_window(event_loop) {
            Ok(active) => {
                active.window.request_redraw();
                self.active = Some(active);
            }
            Err(err) => {
                // Render loop errors are logged where they happen.
                if matches!(err, InitError::Window(_) | InitError::Gpu(_)) {
                    log::error!("{err}");
                }
                self.end(event_loop, Some(ExitStatus::Failure));
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the transform changes every frame.
        if let Some(active) = &self.active {
            active.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.window.id() != window_id {
            return;
        }

        if let Some(ev) = translate_window_event(&event) {
            if active.input_state.apply_event(ev) {
                log::trace!("keys held: {:?}", active.input_state.keys_down);
            }
        }

        match &event {
            WindowEvent::CloseRequested => active.render_loop.request_close(),

            WindowEvent::Resized(size) => {
                active.render_loop.resize(size.width, size.height);
                active.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = active.window.inner_size();
                active.render_loop.resize(size.width, size.height);
                active.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let ft = active.clock.tick();
                active.render_loop.frame(&active.input_state, ft);
            }

            _ => {}
        }

        if active.render_loop.state() == LoopState::Closing {
            self.end(event_loop, None);
        }
    }
}
