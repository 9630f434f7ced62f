use super::ComponentType;

/// Vertex data or layout that cannot be uploaded.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("vertex stride must be non-zero")]
    ZeroStride,

    #[error("vertex stride {0} is not a multiple of 4 bytes")]
    MisalignedStride(u32),

    #[error("vertex layout declares no attributes")]
    NoAttributes,

    #[error(
        "attribute @location({location}) has no vertex format: {components} x {component_type:?} (normalized: {normalized})"
    )]
    UnsupportedFormat {
        location: u32,
        components: u8,
        component_type: ComponentType,
        normalized: bool,
    },

    #[error("attribute @location({location}) ends at byte {end}, past the {stride}-byte stride")]
    AttributeOutOfBounds { location: u32, end: u32, stride: u32 },

    #[error("attribute @location({location}) at offset {offset} is not {align}-byte aligned")]
    MisalignedAttribute { location: u32, offset: u32, align: u32 },

    #[error("attribute @location({0}) is declared more than once")]
    DuplicateLocation(u32),

    #[error("no vertex data")]
    Empty,

    #[error("{len} bytes of vertex data is not a whole number of {stride}-byte vertices")]
    PartialVertex { len: usize, stride: u32 },

    #[error("vertex count does not fit in 32 bits")]
    TooManyVertices,
}
