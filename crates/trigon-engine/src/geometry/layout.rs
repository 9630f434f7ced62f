use super::GeometryError;

/// Scalar type of one attribute component.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ComponentType {
    F32,
    U32,
    I32,
    U16,
    I16,
    U8,
    I8,
}

impl ComponentType {
    #[inline]
    pub const fn size(self) -> u32 {
        match self {
            ComponentType::F32 | ComponentType::U32 | ComponentType::I32 => 4,
            ComponentType::U16 | ComponentType::I16 => 2,
            ComponentType::U8 | ComponentType::I8 => 1,
        }
    }
}

/// How one shader input is read out of a vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeDescriptor {
    /// Shader `@location` this attribute feeds.
    pub location: u32,
    /// Components per vertex (1..=4).
    pub components: u8,
    pub component_type: ComponentType,
    /// Map integer components to `[0, 1]` / `[-1, 1]` floats.
    pub normalized: bool,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
}

impl AttributeDescriptor {
    #[inline]
    pub const fn new(location: u32, components: u8, component_type: ComponentType) -> Self {
        Self {
            location,
            components,
            component_type,
            normalized: false,
            offset: 0,
        }
    }

    #[inline]
    pub const fn at_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    #[inline]
    pub const fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    #[inline]
    pub const fn byte_size(&self) -> u32 {
        self.components as u32 * self.component_type.size()
    }

    /// Matching wgpu vertex format, or `None` for combinations wgpu cannot read.
    pub fn vertex_format(&self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;

        let format = match (self.component_type, self.components, self.normalized) {
            (ComponentType::F32, 1, false) => F::Float32,
            (ComponentType::F32, 2, false) => F::Float32x2,
            (ComponentType::F32, 3, false) => F::Float32x3,
            (ComponentType::F32, 4, false) => F::Float32x4,

            (ComponentType::U32, 1, false) => F::Uint32,
            (ComponentType::U32, 2, false) => F::Uint32x2,
            (ComponentType::U32, 3, false) => F::Uint32x3,
            (ComponentType::U32, 4, false) => F::Uint32x4,

            (ComponentType::I32, 1, false) => F::Sint32,
            (ComponentType::I32, 2, false) => F::Sint32x2,
            (ComponentType::I32, 3, false) => F::Sint32x3,
            (ComponentType::I32, 4, false) => F::Sint32x4,

            (ComponentType::U16, 2, false) => F::Uint16x2,
            (ComponentType::U16, 4, false) => F::Uint16x4,
            (ComponentType::U16, 2, true) => F::Unorm16x2,
            (ComponentType::U16, 4, true) => F::Unorm16x4,
            (ComponentType::I16, 2, false) => F::Sint16x2,
            (ComponentType::I16, 4, false) => F::Sint16x4,
            (ComponentType::I16, 2, true) => F::Snorm16x2,
            (ComponentType::I16, 4, true) => F::Snorm16x4,

            (ComponentType::U8, 2, false) => F::Uint8x2,
            (ComponentType::U8, 4, false) => F::Uint8x4,
            (ComponentType::U8, 2, true) => F::Unorm8x2,
            (ComponentType::U8, 4, true) => F::Unorm8x4,
            (ComponentType::I8, 2, false) => F::Sint8x2,
            (ComponentType::I8, 4, false) => F::Sint8x4,
            (ComponentType::I8, 2, true) => F::Snorm8x2,
            (ComponentType::I8, 4, true) => F::Snorm8x4,

            _ => return None,
        };
        Some(format)
    }
}

/// Byte layout of one interleaved vertex.
///
/// Attribute locations must match the vertex shader's `@location` inputs.
/// A mismatch is not detected here; the draw renders nothing.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    /// Bytes between the starts of consecutive vertices.
    pub stride: u32,
    pub attributes: Vec<AttributeDescriptor>,
}

impl VertexLayout {
    pub fn new(stride: u32) -> Self {
        Self {
            stride,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Tightly packed `vec3<f32>` positions at location 0.
    pub fn positions3() -> Self {
        Self::new(3 * std::mem::size_of::<f32>() as u32)
            .with_attribute(AttributeDescriptor::new(0, 3, ComponentType::F32))
    }

    /// Checks the layout is internally consistent.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.stride == 0 {
            return Err(GeometryError::ZeroStride);
        }
        if self.stride % 4 != 0 {
            return Err(GeometryError::MisalignedStride(self.stride));
        }
        if self.attributes.is_empty() {
            return Err(GeometryError::NoAttributes);
        }

        for (i, attr) in self.attributes.iter().enumerate() {
            if attr.vertex_format().is_none() {
                return Err(GeometryError::UnsupportedFormat {
                    location: attr.location,
                    components: attr.components,
                    component_type: attr.component_type,
                    normalized: attr.normalized,
                });
            }

            let size = attr.byte_size();
            let align = size.min(4);
            if attr.offset % align != 0 {
                return Err(GeometryError::MisalignedAttribute {
                    location: attr.location,
                    offset: attr.offset,
                    align,
                });
            }

            let out_of_bounds = |end| GeometryError::AttributeOutOfBounds {
                location: attr.location,
                end,
                stride: self.stride,
            };
            match attr.offset.checked_add(size) {
                Some(end) if end <= self.stride => {}
                Some(end) => return Err(out_of_bounds(end)),
                None => return Err(out_of_bounds(u32::MAX)),
            }

            if self.attributes[..i].iter().any(|a| a.location == attr.location) {
                return Err(GeometryError::DuplicateLocation(attr.location));
            }
        }

        Ok(())
    }

    /// Number of whole vertices in `byte_len` bytes of data.
    pub fn vertex_count(&self, byte_len: usize) -> Result<u32, GeometryError> {
        if self.stride == 0 {
            return Err(GeometryError::ZeroStride);
        }
        if byte_len == 0 {
            return Err(GeometryError::Empty);
        }

        let stride = self.stride as usize;
        if byte_len % stride != 0 {
            return Err(GeometryError::PartialVertex {
                len: byte_len,
                stride: self.stride,
            });
        }

        u32::try_from(byte_len / stride).map_err(|_| GeometryError::TooManyVertices)
    }
}
