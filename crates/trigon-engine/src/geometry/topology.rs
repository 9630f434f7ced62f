/// How a draw groups vertices into primitives.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Topology {
    /// Every three vertices form an independent triangle.
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
    Points,
}

impl Topology {
    pub(crate) fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Topology::Points => wgpu::PrimitiveTopology::PointList,
        }
    }

    /// Number of complete primitives assembled from `vertex_count` vertices.
    pub fn primitive_count(self, vertex_count: u32) -> u32 {
        match self {
            Topology::Triangles => vertex_count / 3,
            Topology::TriangleStrip => vertex_count.saturating_sub(2),
            Topology::Lines => vertex_count / 2,
            Topology::LineStrip => vertex_count.saturating_sub(1),
            Topology::Points => vertex_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_counts() {
        assert_eq!(Topology::Triangles.primitive_count(3), 1);
        assert_eq!(Topology::Triangles.primitive_count(36), 12);
        assert_eq!(Topology::TriangleStrip.primitive_count(4), 2);
        assert_eq!(Topology::TriangleStrip.primitive_count(1), 0);
        assert_eq!(Topology::LineStrip.primitive_count(0), 0);
        assert_eq!(Topology::Points.primitive_count(5), 5);
    }
}
