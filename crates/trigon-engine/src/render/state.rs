use glam::Mat4;

use crate::backend::{GraphicsBackend, ProgramId};
use crate::geometry::GeometryBuffer;
use crate::shader::UniformLocation;

/// A program made current on the backend.
///
/// Obtained from [`ShaderProgram::activate`](crate::shader::ShaderProgram::activate).
/// Holding it means uniform writes and draws target this program.
pub struct ActiveProgram<'a, B: GraphicsBackend + ?Sized> {
    backend: &'a mut B,
    program: ProgramId,
}

impl<'a, B: GraphicsBackend + ?Sized> ActiveProgram<'a, B> {
    pub(crate) fn new(backend: &'a mut B, program: ProgramId) -> Self {
        backend.use_program(program);
        Self { backend, program }
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Writes a 4x4 matrix uniform. Column-major, no transpose.
    pub fn set_matrix4(&mut self, location: UniformLocation, value: &Mat4) {
        self.backend.set_uniform_mat4(location, value);
    }

    /// Binds `geometry` for drawing with this program.
    pub fn bind<'b>(&'b mut self, geometry: &'b GeometryBuffer) -> BoundGeometry<'b, B> {
        self.backend.bind_vertex_buffer(geometry.id());
        BoundGeometry {
            backend: &mut *self.backend,
            geometry,
        }
    }
}

/// Geometry bound under an active program; ready to draw.
pub struct BoundGeometry<'b, B: GraphicsBackend + ?Sized> {
    backend: &'b mut B,
    geometry: &'b GeometryBuffer,
}

impl<B: GraphicsBackend + ?Sized> BoundGeometry<'_, B> {
    /// Issues one draw over every vertex of the geometry.
    pub fn draw(&mut self) {
        self.backend
            .draw(self.geometry.topology(), 0, self.geometry.vertex_count());
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::{Call, RecordingBackend};
    use crate::geometry::{GeometryBuffer, Topology, VertexLayout};
    use crate::shader::{ShaderCompiler, ShaderProgram, ShaderSource, StageKind};
    use crate::testing::{CUBE_FS, CUBE_VS, TRIANGLE_VERTICES};
    use glam::Mat4;

    #[test]
    fn activate_set_bind_draw_in_order() {
        let mut backend = RecordingBackend::new();
        let mut compiler = ShaderCompiler::new();
        let vs = compiler
            .compile(&mut backend, &ShaderSource::new(StageKind::Vertex, CUBE_VS))
            .unwrap();
        let fs = compiler
            .compile(&mut backend, &ShaderSource::new(StageKind::Fragment, CUBE_FS))
            .unwrap();
        let mut program = ShaderProgram::link(&mut backend, vs, fs).unwrap();
        let location = program.uniform_location(&mut backend, "uMVP").unwrap();
        let geometry = GeometryBuffer::create(
            &mut backend,
            &TRIANGLE_VERTICES,
            VertexLayout::positions3(),
            Topology::Triangles,
        )
        .unwrap();
        backend.take_calls();

        {
            let mut active = program.activate(&mut backend);
            active.set_matrix4(location, &Mat4::IDENTITY);
            active.bind(&geometry).draw();
        }

        assert_eq!(
            backend.take_calls(),
            vec![
                Call::UseProgram(program.id()),
                Call::SetUniformMat4 {
                    location,
                    value: Mat4::IDENTITY
                },
                Call::BindVertexBuffer(geometry.id()),
                Call::Draw {
                    topology: Topology::Triangles,
                    first: 0,
                    count: 3
                },
            ]
        );
        assert_eq!(backend.effective_draws(), 1);
    }
}
