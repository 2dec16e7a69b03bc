use wgpu::{BindGroupLayout, Buffer, Device, RenderPipeline, Sampler, Texture, TextureView};

use super::buffers::{uniform_buffer, write_uniform};
use super::cube_target::{CubeTarget, CUBE_COLOR_FORMAT};
use super::render::{create_pipeline, PipelineDesc};
use crate::cubemap::CubeFace;

/// Face shown in each column of the strip, left to right
pub const STRIP_ORDER: [CubeFace; 6] = [
    CubeFace::PositiveX,
    CubeFace::NegativeX,
    CubeFace::PositiveY,
    CubeFace::NegativeY,
    CubeFace::PositiveZ,
    CubeFace::NegativeZ,
];

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CompositeParams {
    alpha: f32,
    _padding: [f32; 3],
}

/// Flattens any scene's cube map into one `6·side x side` frame
pub struct Compositor {
    strip: Texture,
    strip_view: TextureView,
    pipeline: RenderPipeline,
    layout: BindGroupLayout,
    sampler: Sampler,
    params: Buffer,
}

impl Compositor {
    pub fn new(device: &Device, side: u32) -> Self {
        log::info!(
            "Compositor: {}x{} strip, columns {:?}",
            side * 6,
            side,
            STRIP_ORDER
        );

        let strip = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("composited-strip"),
            size: wgpu::Extent3d {
                width: side * 6,
                height: side,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CUBE_COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let strip_view = strip.create_view(&wgpu::TextureViewDescriptor::default());

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("compositor-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "compositor",
                source: concat!(
                    include_str!("../shaders/cubemap.wgsl"),
                    include_str!("../shaders/compositor.wgsl")
                ),
                bind_group_layouts: &[&layout],
                vertex_buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                format: CUBE_COLOR_FORMAT,
                depth: false,
            },
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("compositor-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params = uniform_buffer(
            device,
            "compositor-params",
            &CompositeParams {
                alpha: 1.0,
                _padding: [0.0; 3],
            },
        );

        Self {
            strip,
            strip_view,
            pipeline,
            layout,
            sampler,
            params,
        }
    }

    /// The composited frame, handed to the publisher
    pub fn strip(&self) -> &Texture {
        &self.strip
    }

    pub fn strip_view(&self) -> &TextureView {
        &self.strip_view
    }

    /// Flatten `source` into the strip, scaled by `alpha`
    pub fn composite(
        &self,
        device: &Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        source: &CubeTarget,
        alpha: f32,
    ) {
        write_uniform(
            queue,
            &self.params,
            &CompositeParams {
                alpha: alpha.clamp(0.0, 1.0),
                _padding: [0.0; 3],
            },
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("compositor-bind-group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source.cube_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.params.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("compositor-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.strip_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cubemap::{face_uv, ALL_FACES};
    use glam::Vec2;

    #[test]
    fn test_strip_order_matches_layers() {
        for (column, face) in STRIP_ORDER.iter().enumerate() {
            assert_eq!(face.layer() as usize, column);
        }
        assert_eq!(STRIP_ORDER, ALL_FACES);
    }

    #[test]
    fn test_column_samples_its_own_face() {
        // Any point inside column c looks along a direction that lands back on face c
        for face in STRIP_ORDER {
            for uv in [Vec2::new(0.1, 0.2), Vec2::splat(0.5), Vec2::new(0.9, 0.7)] {
                let (sampled, back) = face_uv(face.direction(uv));
                assert_eq!(sampled, face);
                assert!((back - uv).length() < 1e-5);
            }
        }
    }

    #[test]
    fn test_composite_params_size() {
        assert_eq!(std::mem::size_of::<CompositeParams>(), 16);
    }
}
