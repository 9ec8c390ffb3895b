/// Component type of a vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl AttributeType {
    pub const fn size_bytes(self) -> usize {
        match self {
            AttributeType::Byte | AttributeType::UnsignedByte => 1,
            AttributeType::Short | AttributeType::UnsignedShort => 2,
            AttributeType::Int | AttributeType::UnsignedInt | AttributeType::Float => 4,
        }
    }
}

/// How an attribute's values are laid out in the caller's buffer.
///
/// A zero `stride_bytes` means tightly packed. With `is_per_sprite`, one
/// value covers the four vertices of a sprite.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeFormat {
    pub num_elems: u32,
    pub ty: AttributeType,
    pub normalize: bool,
    pub stride_bytes: usize,
    pub offset_bytes: usize,
    pub is_per_sprite: bool,
}

impl AttributeFormat {
    pub const fn new(num_elems: u32, ty: AttributeType, normalize: bool) -> Self {
        Self {
            num_elems,
            ty,
            normalize,
            stride_bytes: 0,
            offset_bytes: 0,
            is_per_sprite: false,
        }
    }

    /// Size of one value (all of its elements).
    #[inline]
    pub const fn value_bytes(&self) -> usize {
        self.num_elems as usize * self.ty.size_bytes()
    }

    #[inline]
    pub const fn effective_stride(&self) -> usize {
        if self.stride_bytes == 0 {
            self.value_bytes()
        } else {
            self.stride_bytes
        }
    }
}

/// A caller-provided attribute stream bound to a shader location.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub location: u32,
    pub format: AttributeFormat,
    pub values: Vec<u8>,
}

impl Attribute {
    /// Tightly packed floats, `num_elems` per value.
    pub fn floats(location: u32, num_elems: u32, values: &[f32]) -> Self {
        Self {
            location,
            format: AttributeFormat::new(num_elems, AttributeType::Float, false),
            values: bytemuck::cast_slice(values).to_vec(),
        }
    }

    pub fn per_sprite(mut self) -> Self {
        self.format.is_per_sprite = true;
        self
    }
}

/// An attribute source registered on a context, consumed by the next flush.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSource {
    pub num_values: usize,
    pub attribute: Attribute,
}

/// Per-vertex, tightly packed attribute data handed to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAttribute {
    pub location: u32,
    pub ty: AttributeType,
    pub num_elems: u32,
    pub normalize: bool,
    pub data: Vec<u8>,
}

impl PreparedAttribute {
    #[inline]
    pub fn stride(&self) -> usize {
        self.num_elems as usize * self.ty.size_bytes()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        let stride = self.stride();
        if stride == 0 { 0 } else { self.data.len() / stride }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    #[error("attribute buffer holds {available} bytes, {needed} needed")]
    TooShort { needed: usize, available: usize },
    #[error("attribute has no elements")]
    Empty,
    #[error("attribute covers {covered} of {needed} vertices")]
    TooFewVertices { covered: usize, needed: usize },
}

/// Gathers `source` into per-vertex packed data.
///
/// Strided values are compacted; per-sprite values are repeated for each
/// of the sprite's four vertices.
pub fn expand_per_sprite(source: &AttributeSource) -> Result<PreparedAttribute, AttributeError> {
    let format = source.attribute.format;
    let value_bytes = format.value_bytes();
    if value_bytes == 0 {
        return Err(AttributeError::Empty);
    }
    let stride = format.effective_stride();
    let values = &source.attribute.values;
    let needed = if source.num_values == 0 {
        0
    } else {
        format.offset_bytes + (source.num_values - 1) * stride + value_bytes
    };
    if values.len() < needed {
        return Err(AttributeError::TooShort {
            needed,
            available: values.len(),
        });
    }

    let repeat = if format.is_per_sprite { 4 } else { 1 };
    let mut data = Vec::with_capacity(source.num_values * value_bytes * repeat);
    for i in 0..source.num_values {
        let start = format.offset_bytes + i * stride;
        let value = &values[start..start + value_bytes];
        for _ in 0..repeat {
            data.extend_from_slice(value);
        }
    }

    Ok(PreparedAttribute {
        location: source.attribute.location,
        ty: format.ty,
        num_elems: format.num_elems,
        normalize: format.normalize,
        data,
    })
}

/// [`expand_per_sprite`] cut to exactly `vertex_count` vertices.
pub fn prepare_for_draw(source: &AttributeSource, vertex_count: usize) -> Result<PreparedAttribute, AttributeError> {
    let mut prepared = expand_per_sprite(source)?;
    let covered = prepared.vertex_count();
    if covered < vertex_count {
        return Err(AttributeError::TooFewVertices {
            covered,
            needed: vertex_count,
        });
    }
    let len = vertex_count * prepared.stride();
    prepared.data.truncate(len);
    Ok(prepared)
}

/// A constant float attribute expanded to `vertex_count` vertices.
pub fn constant_attribute(location: u32, value: &[f32], vertex_count: usize) -> PreparedAttribute {
    let mut data = Vec::with_capacity(value.len() * 4 * vertex_count);
    for _ in 0..vertex_count {
        data.extend_from_slice(bytemuck::cast_slice(value));
    }
    PreparedAttribute {
        location,
        ty: AttributeType::Float,
        num_elems: value.len() as u32,
        normalize: false,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(data: &[u8]) -> Vec<f32> {
        data.chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn per_vertex_packed_passes_through() {
        let src = AttributeSource {
            num_values: 3,
            attribute: Attribute::floats(4, 1, &[1.0, 2.0, 3.0]),
        };
        let p = expand_per_sprite(&src).unwrap();
        assert_eq!(floats(&p.data), vec![1.0, 2.0, 3.0]);
        assert_eq!(p.vertex_count(), 3);
        assert_eq!(p.location, 4);
    }

    #[test]
    fn per_sprite_repeats_four_times() {
        let src = AttributeSource {
            num_values: 2,
            attribute: Attribute::floats(3, 2, &[1.0, 2.0, 5.0, 6.0]).per_sprite(),
        };
        let p = expand_per_sprite(&src).unwrap();
        assert_eq!(p.vertex_count(), 8);
        let f = floats(&p.data);
        assert_eq!(&f[..8], &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        assert_eq!(&f[8..10], &[5.0, 6.0]);
    }

    #[test]
    fn strided_values_are_compacted() {
        let mut attr = Attribute::floats(1, 1, &[9.0, 1.0, 9.0, 2.0]);
        attr.format.stride_bytes = 8;
        attr.format.offset_bytes = 4;
        let p = expand_per_sprite(&AttributeSource { num_values: 2, attribute: attr }).unwrap();
        assert_eq!(floats(&p.data), vec![1.0, 2.0]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let src = AttributeSource {
            num_values: 4,
            attribute: Attribute::floats(0, 1, &[1.0, 2.0]),
        };
        assert_eq!(
            expand_per_sprite(&src),
            Err(AttributeError::TooShort { needed: 16, available: 8 })
        );
    }

    #[test]
    fn draws_take_only_the_vertices_they_need() {
        let src = AttributeSource {
            num_values: 3,
            attribute: Attribute::floats(0, 1, &[1.0, 2.0, 3.0]),
        };
        let p = prepare_for_draw(&src, 2).unwrap();
        assert_eq!(floats(&p.data), vec![1.0, 2.0]);
        assert_eq!(
            prepare_for_draw(&src, 8),
            Err(AttributeError::TooFewVertices { covered: 3, needed: 8 })
        );
    }

    #[test]
    fn constant_attribute_repeats_value() {
        let p = constant_attribute(2, &[0.5, 0.25], 3);
        assert_eq!(p.vertex_count(), 3);
        assert_eq!(floats(&p.data)[4..], [0.5, 0.25]);
    }
}
