use std::fmt;

use crate::coords::Viewport;
use crate::geometry::{Topology, VertexLayout};
use crate::input::Key;
use crate::paint::Color;
use crate::shader::ShaderSource;
use crate::transform::TransformComposer;

pub const DEFAULT_CLEAR_COLOR: Color = Color::rgba(0.2, 0.3, 0.3, 1.0);

/// Uniform the transform is written to unless the scene names another.
pub const DEFAULT_MVP_UNIFORM: &str = "uMVP";

/// Per-frame constants of the render loop.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    pub clear_color: Color,
    /// Holding this key closes the loop.
    pub exit_key: Key,
    /// Viewport reported before the first resize.
    pub viewport: Viewport,
    /// Aspect ratio handed to the transform. Fixed for the run; resizing does
    /// not change the projection.
    pub aspect_ratio: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        let viewport = Viewport::new(800, 600);
        Self {
            clear_color: DEFAULT_CLEAR_COLOR,
            exit_key: Key::Escape,
            viewport,
            aspect_ratio: viewport.aspect_ratio().unwrap_or(1.0),
        }
    }
}

/// Time and viewport of the frame being built.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameState {
    pub elapsed_seconds: f32,
    pub viewport: Viewport,
}

/// Everything needed to draw one object: two stages, its vertices and an
/// optional transform.
pub struct SceneDesc {
    pub vertex_shader: ShaderSource,
    pub fragment_shader: ShaderSource,
    pub vertices: Vec<f32>,
    pub layout: VertexLayout,
    pub topology: Topology,
    pub depth_test: bool,
    /// `None` draws untransformed and writes no uniform.
    pub transform: Option<Box<dyn TransformComposer>>,
    pub mvp_uniform: String,
}

impl SceneDesc {
    /// Triangles of packed `vec3<f32>` positions, no depth test, no transform.
    pub fn new(
        vertex_shader: ShaderSource,
        fragment_shader: ShaderSource,
        vertices: impl Into<Vec<f32>>,
    ) -> Self {
        Self {
            vertex_shader,
            fragment_shader,
            vertices: vertices.into(),
            layout: VertexLayout::positions3(),
            topology: Topology::Triangles,
            depth_test: false,
            transform: None,
            mvp_uniform: DEFAULT_MVP_UNIFORM.to_owned(),
        }
    }

    pub fn with_layout(mut self, layout: VertexLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_depth_test(mut self) -> Self {
        self.depth_test = true;
        self
    }

    pub fn with_transform(mut self, transform: impl TransformComposer + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn with_mvp_uniform(mut self, name: impl Into<String>) -> Self {
        self.mvp_uniform = name.into();
        self
    }
}

impl fmt::Debug for SceneDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneDesc")
            .field("vertex_shader", &self.vertex_shader.origin())
            .field("fragment_shader", &self.fragment_shader.origin())
            .field("vertices", &self.vertices.len())
            .field("layout", &self.layout)
            .field("topology", &self.topology)
            .field("depth_test", &self.depth_test)
            .field("transform", &self.transform.is_some())
            .field("mvp_uniform", &self.mvp_uniform)
            .finish()
    }
}
