//! Vertex data on the GPU.

mod buffer;
mod error;
mod layout;
mod topology;

pub use buffer::GeometryBuffer;
pub use error::GeometryError;
pub use layout::{AttributeDescriptor, ComponentType, VertexLayout};
pub use topology::Topology;
