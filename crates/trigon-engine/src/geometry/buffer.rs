use crate::backend::{BufferId, GraphicsBackend};

use super::{GeometryError, Topology, VertexLayout};

/// Static vertex data on the GPU plus the layout used to read it.
#[derive(Debug)]
pub struct GeometryBuffer {
    id: BufferId,
    layout: VertexLayout,
    vertex_count: u32,
    topology: Topology,
}

impl GeometryBuffer {
    /// Uploads `vertices` and declares `layout` for them.
    ///
    /// The data is immutable after upload. The buffer is bound before the
    /// layout is declared: the declaration applies to whatever is bound.
    pub fn create<B>(
        backend: &mut B,
        vertices: &[f32],
        layout: VertexLayout,
        topology: Topology,
    ) -> Result<Self, GeometryError>
    where
        B: GraphicsBackend + ?Sized,
    {
        layout.validate()?;
        let vertex_count = layout.vertex_count(std::mem::size_of_val(vertices))?;

        let id = backend.create_vertex_buffer(vertices);
        backend.bind_vertex_buffer(id);
        backend.declare_vertex_layout(&layout);

        log::debug!(
            "uploaded {vertex_count} vertices ({} bytes, {topology:?}) as {id:?}",
            std::mem::size_of_val(vertices)
        );

        Ok(Self {
            id,
            layout,
            vertex_count,
            topology,
        })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn release<B>(self, backend: &mut B)
    where
        B: GraphicsBackend + ?Sized,
    {
        backend.release_vertex_buffer(self.id);
    }
}
