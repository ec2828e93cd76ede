//! GPU side of a linked [`ShaderProgram`]: shader modules, uniform buffers
//! and the render pipeline.
//!
//! Uniforms live in bind group [`UNIFORM_GROUP`], one buffer per uniform.
//! The heightmap texture is bound at [`TEXTURE_GROUP`].

use std::num::NonZeroU64;

use glam::Mat4;

use crate::depth::DepthBuffer;
use crate::shader::{ShaderError, ShaderProgram, UniformLocation};

/// Bind group index of the program's uniforms.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group index of the heightmap texture and sampler.
pub const TEXTURE_GROUP: u32 = 1;

struct UniformSlot {
    binding: u32,
    size: u64,
    buffer: wgpu::Buffer,
}

/// A linked program resident on the GPU.
pub struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_bind_group: wgpu::BindGroup,
    /// Indexed by [`UniformLocation::index`].
    slots: Vec<UniformSlot>,
}

impl GpuProgram {
    /// Build the pipeline for `program`.
    ///
    /// Every uniform must sit in [`UNIFORM_GROUP`]; the texture layout is
    /// bound at [`TEXTURE_GROUP`].
    pub fn new(
        device: &wgpu::Device,
        program: &ShaderProgram,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
        texture_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, ShaderError> {
        if let Some(stray) = program.uniforms().iter().find(|u| u.group != UNIFORM_GROUP) {
            return Err(ShaderError::LinkFailed {
                reason: format!(
                    "uniform '{}' is in @group({}), expected @group({UNIFORM_GROUP})",
                    stray.name, stray.group
                ),
            });
        }

        let vertex_module = create_module(device, "heightfield-vertex", program.vertex().source());
        let fragment_module =
            create_module(device, "heightfield-fragment", program.fragment().source());

        let slots: Vec<UniformSlot> = program
            .uniforms()
            .iter()
            .map(|uniform| {
                let size = u64::from(uniform.size.max(16));
                UniformSlot {
                    binding: uniform.binding,
                    size,
                    buffer: device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(&format!("uniform-{}", uniform.name)),
                        size,
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }),
                }
            })
            .collect();

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = slots
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(slot.size),
                },
                count: None,
            })
            .collect();
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform-bind-group-layout"),
            entries: &layout_entries,
        });

        let group_entries: Vec<wgpu::BindGroupEntry> = slots
            .iter()
            .map(|slot| wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: slot.buffer.as_entire_binding(),
            })
            .collect();
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform-bind-group"),
            layout: &uniform_layout,
            entries: &group_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("heightfield-pipeline-layout"),
            bind_group_layouts: &[&uniform_layout, texture_layout],
            immediate_size: 0,
        });

        let depth_stencil = depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: DepthBuffer::COMPARE_FUNCTION,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("heightfield-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(program.vertex().entry_point()),
                // Positions come from the vertex index.
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(program.fragment().entry_point()),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("Created heightfield pipeline with {} uniform buffer(s)", slots.len());
        Ok(Self {
            pipeline,
            uniform_bind_group,
            slots,
        })
    }

    /// Upload a column-major 4x4 matrix to `location`.
    ///
    /// The invalid sentinel is skipped.
    pub fn set_uniform_mat4(&self, queue: &wgpu::Queue, location: UniformLocation, matrix: &Mat4) {
        let Some(slot) = location.index().and_then(|i| self.slots.get(i)) else {
            log::trace!("Skipping upload to uniform location {}", location.raw());
            return;
        };
        let columns = matrix.to_cols_array();
        queue.write_buffer(&slot.buffer, 0, bytemuck::cast_slice(&columns));
    }

    /// Set the pipeline and the uniform bind group on `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(UNIFORM_GROUP, &self.uniform_bind_group, &[]);
    }

    pub fn uniform_count(&self) -> usize {
        self.slots.len()
    }
}

fn create_module(device: &wgpu::Device, label: &str, source: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    })
}
