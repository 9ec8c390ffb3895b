use std::collections::HashMap;

use crate::batch::Vertex;
use crate::image::{FilterMode, Sampling, WrapMode};
use crate::paint::{BlendEq, BlendFunc, BlendMode};
use crate::renderer::ProgramHandle;
use crate::shader::{AttributeType, ShaderBlock};

/// Conversion from core types to their wgpu counterparts.
pub(crate) trait IntoWgpu<T> {
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::BlendFactor> for BlendFunc {
    fn into_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFunc::Zero => wgpu::BlendFactor::Zero,
            BlendFunc::One => wgpu::BlendFactor::One,
            BlendFunc::SrcColor => wgpu::BlendFactor::Src,
            BlendFunc::DstColor => wgpu::BlendFactor::Dst,
            BlendFunc::OneMinusSrc => wgpu::BlendFactor::OneMinusSrc,
            BlendFunc::OneMinusDst => wgpu::BlendFactor::OneMinusDst,
            BlendFunc::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFunc::DstAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFunc::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFunc::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        }
    }
}

impl IntoWgpu<wgpu::BlendOperation> for BlendEq {
    fn into_wgpu(self) -> wgpu::BlendOperation {
        match self {
            BlendEq::Add => wgpu::BlendOperation::Add,
            BlendEq::Subtract => wgpu::BlendOperation::Subtract,
            BlendEq::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
        }
    }
}

impl IntoWgpu<wgpu::BlendState> for BlendMode {
    fn into_wgpu(self) -> wgpu::BlendState {
        wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: self.source_color.into_wgpu(),
                dst_factor: self.dest_color.into_wgpu(),
                operation: self.color_equation.into_wgpu(),
            },
            alpha: wgpu::BlendComponent {
                src_factor: self.source_alpha.into_wgpu(),
                dst_factor: self.dest_alpha.into_wgpu(),
                operation: self.alpha_equation.into_wgpu(),
            },
        }
    }
}

impl IntoWgpu<wgpu::AddressMode> for WrapMode {
    fn into_wgpu(self) -> wgpu::AddressMode {
        match self {
            WrapMode::None => wgpu::AddressMode::ClampToEdge,
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
            WrapMode::Mirrored => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

pub(crate) fn sampler_descriptor(sampling: Sampling) -> wgpu::SamplerDescriptor<'static> {
    let (filter, mipmap_filter) = match sampling.filter {
        FilterMode::Nearest => (wgpu::FilterMode::Nearest, wgpu::MipmapFilterMode::Nearest),
        FilterMode::Linear => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Nearest),
        FilterMode::LinearMipmap => (wgpu::FilterMode::Linear, wgpu::MipmapFilterMode::Linear),
    };
    wgpu::SamplerDescriptor {
        label: Some("glint sampler"),
        address_mode_u: sampling.wrap_x.into_wgpu(),
        address_mode_v: sampling.wrap_y.into_wgpu(),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter,
        // Non-mipmapped filters sample the base level only.
        lod_max_clamp: if sampling.filter == FilterMode::LinearMipmap { 32.0 } else { 0.0 },
        ..Default::default()
    }
}

/// Vertex format for a generic attribute, if wgpu has one.
pub(crate) fn attribute_format(ty: AttributeType, elems: u32, normalize: bool) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    let f = match (ty, elems, normalize) {
        (AttributeType::Float, 1, _) => F::Float32,
        (AttributeType::Float, 2, _) => F::Float32x2,
        (AttributeType::Float, 3, _) => F::Float32x3,
        (AttributeType::Float, 4, _) => F::Float32x4,
        (AttributeType::Int, 1, _) => F::Sint32,
        (AttributeType::Int, 2, _) => F::Sint32x2,
        (AttributeType::Int, 3, _) => F::Sint32x3,
        (AttributeType::Int, 4, _) => F::Sint32x4,
        (AttributeType::UnsignedInt, 1, _) => F::Uint32,
        (AttributeType::UnsignedInt, 2, _) => F::Uint32x2,
        (AttributeType::UnsignedInt, 3, _) => F::Uint32x3,
        (AttributeType::UnsignedInt, 4, _) => F::Uint32x4,
        (AttributeType::UnsignedByte, 1, true) => F::Unorm8,
        (AttributeType::UnsignedByte, 2, true) => F::Unorm8x2,
        (AttributeType::UnsignedByte, 4, true) => F::Unorm8x4,
        (AttributeType::UnsignedByte, 1, false) => F::Uint8,
        (AttributeType::UnsignedByte, 2, false) => F::Uint8x2,
        (AttributeType::UnsignedByte, 4, false) => F::Uint8x4,
        (AttributeType::Byte, 1, true) => F::Snorm8,
        (AttributeType::Byte, 2, true) => F::Snorm8x2,
        (AttributeType::Byte, 4, true) => F::Snorm8x4,
        (AttributeType::Byte, 1, false) => F::Sint8,
        (AttributeType::Byte, 2, false) => F::Sint8x2,
        (AttributeType::Byte, 4, false) => F::Sint8x4,
        (AttributeType::UnsignedShort, 1, true) => F::Unorm16,
        (AttributeType::UnsignedShort, 2, true) => F::Unorm16x2,
        (AttributeType::UnsignedShort, 4, true) => F::Unorm16x4,
        (AttributeType::UnsignedShort, 1, false) => F::Uint16,
        (AttributeType::UnsignedShort, 2, false) => F::Uint16x2,
        (AttributeType::UnsignedShort, 4, false) => F::Uint16x4,
        (AttributeType::Short, 1, true) => F::Snorm16,
        (AttributeType::Short, 2, true) => F::Snorm16x2,
        (AttributeType::Short, 4, true) => F::Snorm16x4,
        (AttributeType::Short, 1, false) => F::Sint16,
        (AttributeType::Short, 2, false) => F::Sint16x2,
        (AttributeType::Short, 4, false) => F::Sint16x4,
        _ => return None,
    };
    Some(f)
}

/// Vertex buffers need 4-byte strides; pads each element out to one.
pub(crate) fn padded_stream(data: &[u8], stride: usize) -> (Vec<u8>, u64) {
    let padded = stride.next_multiple_of(wgpu::VERTEX_ALIGNMENT as usize);
    if padded == stride {
        return (data.to_vec(), stride as u64);
    }
    let mut out = Vec::with_capacity(data.len() / stride.max(1) * padded);
    for elem in data.chunks_exact(stride) {
        out.extend_from_slice(elem);
        out.resize(out.len() + padded - stride, 0);
    }
    (out, padded as u64)
}

fn vertex_attributes(block: &ShaderBlock) -> Vec<wgpu::VertexAttribute> {
    let mut attrs = Vec::with_capacity(3);
    if let Some(loc) = block.position_loc {
        attrs.push(wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: Vertex::POSITION_OFFSET,
            shader_location: loc,
        });
    }
    if let Some(loc) = block.texcoord_loc {
        attrs.push(wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: Vertex::TEXCOORD_OFFSET,
            shader_location: loc,
        });
    }
    if let Some(loc) = block.color_loc {
        attrs.push(wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: Vertex::COLOR_OFFSET,
            shader_location: loc,
        });
    }
    attrs
}

/// One extra vertex stream: location, format and padded stride.
pub(crate) type ExtraStream = (u32, wgpu::VertexFormat, u64);

/// Everything a render pipeline depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub program: Option<ProgramHandle>,
    pub format: wgpu::TextureFormat,
    pub blend: Option<BlendMode>,
    pub block: ShaderBlock,
    pub extra: Vec<ExtraStream>,
}

/// Shader stages a pipeline is built from.
pub(crate) struct Stages<'a> {
    pub vertex: (&'a wgpu::ShaderModule, &'a str),
    pub fragment: (&'a wgpu::ShaderModule, &'a str),
    pub user_uniforms: bool,
}

/// Bind group layouts shared by every pipeline.
pub(crate) struct Layouts {
    pub frame: wgpu::BindGroupLayout,
    pub user: wgpu::BindGroupLayout,
    with_user: wgpu::PipelineLayout,
    without_user: wgpu::PipelineLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glint frame bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(64),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let user = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glint user uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let with_user = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glint pipeline layout (user uniforms)"),
            bind_group_layouts: &[&frame, &user],
            immediate_size: 0,
        });
        let without_user = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glint pipeline layout"),
            bind_group_layouts: &[&frame],
            immediate_size: 0,
        });
        Self {
            frame,
            user,
            with_user,
            without_user,
        }
    }
}

/// Render pipelines keyed by everything they depend on.
#[derive(Default)]
pub(crate) struct PipelineCache {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub fn insert(&mut self, key: PipelineKey, pipeline: wgpu::RenderPipeline) {
        self.pipelines.insert(key, pipeline);
    }

    /// Drops pipelines built from `program`.
    pub fn evict_program(&mut self, program: ProgramHandle) {
        self.pipelines.retain(|k, _| k.program != Some(program));
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }
}

pub(crate) fn build_pipeline(
    device: &wgpu::Device,
    layouts: &Layouts,
    stages: &Stages<'_>,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    let base_attrs = vertex_attributes(&key.block);
    let extra_attrs: Vec<[wgpu::VertexAttribute; 1]> = key
        .extra
        .iter()
        .map(|&(location, format, _)| {
            [wgpu::VertexAttribute {
                format,
                offset: 0,
                shader_location: location,
            }]
        })
        .collect();

    let mut buffers = Vec::with_capacity(1 + key.extra.len());
    buffers.push(wgpu::VertexBufferLayout {
        array_stride: Vertex::STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &base_attrs,
    });
    for (attrs, &(_, _, stride)) in extra_attrs.iter().zip(&key.extra) {
        buffers.push(wgpu::VertexBufferLayout {
            array_stride: stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: attrs,
        });
    }

    let layout = if stages.user_uniforms {
        &layouts.with_user
    } else {
        &layouts.without_user
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("glint pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: stages.vertex.0,
            entry_point: Some(stages.vertex.1),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: stages.fragment.0,
            entry_point: Some(stages.fragment.1),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.format,
                blend: key.blend.map(IntoWgpu::into_wgpu),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::BlendPreset;

    #[test]
    fn normal_blend_maps_to_alpha_blending() {
        let state: wgpu::BlendState = BlendMode::from_preset(BlendPreset::Normal).into_wgpu();
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(state.color.operation, wgpu::BlendOperation::Add);
    }

    #[test]
    fn three_byte_attributes_have_no_format() {
        assert_eq!(attribute_format(AttributeType::UnsignedByte, 3, true), None);
        assert_eq!(
            attribute_format(AttributeType::Float, 2, false),
            Some(wgpu::VertexFormat::Float32x2)
        );
    }

    #[test]
    fn short_strides_are_padded() {
        let (data, stride) = padded_stream(&[1, 2, 3, 4], 2);
        assert_eq!(stride, 4);
        assert_eq!(data, vec![1, 2, 0, 0, 3, 4, 0, 0]);
        let (same, stride) = padded_stream(&[0; 8], 8);
        assert_eq!((same.len(), stride), (8, 8));
    }

    #[test]
    fn block_locations_drive_vertex_attributes() {
        let mut block = ShaderBlock::builtin();
        block.texcoord_loc = None;
        let attrs = vertex_attributes(&block);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].shader_location, 2);
        assert_eq!(attrs[1].offset, Vertex::COLOR_OFFSET);
    }

    #[test]
    fn mipmap_sampling_unlocks_lower_levels() {
        let mut s = Sampling::default();
        s.filter = FilterMode::Nearest;
        assert_eq!(sampler_descriptor(s).lod_max_clamp, 0.0);
        s.filter = FilterMode::LinearMipmap;
        assert_eq!(sampler_descriptor(s).mipmap_filter, wgpu::MipmapFilterMode::Linear);
    }
}
