use glam::Mat4;
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, Texture, TextureView};

use crate::cubemap::{CubeFace, ALL_FACES};

/// Colour format of every cube-map camera
pub const CUBE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const CUBE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A 360 degree camera: six colour layers rendered one face per pass and
/// sampled through a `Cube` view.
pub struct CubeTarget {
    _texture: Texture,
    face_views: Vec<TextureView>,
    cube_view: TextureView,
    depth_view: Option<TextureView>,
}

impl CubeTarget {
    pub fn new(device: &Device, label: &str, side: u32, with_depth: bool) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: side,
                height: side,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CUBE_COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let face_views = ALL_FACES
            .iter()
            .map(|face| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("{}-face-{}", label, face.layer())),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: face.layer(),
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();

        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{}-cube", label)),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });

        // One depth surface, cleared at the start of every face pass
        let depth_view = with_depth.then(|| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(&format!("{}-depth", label)),
                    size: wgpu::Extent3d {
                        width: side,
                        height: side,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: CUBE_DEPTH_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        Self {
            _texture: texture,
            face_views,
            cube_view,
            depth_view,
        }
    }

    pub fn cube_view(&self) -> &TextureView {
        &self.cube_view
    }

    /// Begin a render pass into one face, cleared to black
    pub fn face_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        face: CubeFace,
        label: &str,
    ) -> wgpu::RenderPass<'e> {
        let depth_stencil_attachment =
            self.depth_view
                .as_ref()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                });

        encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.face_views[face.layer() as usize],
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            })
    }
}

/// Per-face camera data, one 256-byte slot per face
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FaceCamera {
    pub view_proj: [[f32; 4]; 4],
    /// x = face index, yzw unused
    pub face: [u32; 4],
    pub _padding: [[f32; 4]; 11],
}

/// Offset between consecutive [`FaceCamera`] slots
pub const FACE_CAMERA_STRIDE: u64 = 256;

impl FaceCamera {
    pub fn new(face: CubeFace, view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            face: [face.layer(), 0, 0, 0],
            _padding: [[0.0; 4]; 11],
        }
    }
}

/// Camera matrices for the six faces, shared by every pipeline that renders
/// geometry into a [`CubeTarget`]. Bound as group 0, binding 0.
pub struct FaceCameras {
    pub layout: BindGroupLayout,
    _buffer: Buffer,
    bind_groups: Vec<BindGroup>,
}

impl FaceCameras {
    pub fn new(device: &Device, near: f32, far: f32) -> Self {
        use wgpu::util::DeviceExt;

        let cameras: Vec<FaceCamera> = ALL_FACES
            .iter()
            .map(|&face| FaceCamera::new(face, face.view_projection(near, far)))
            .collect();

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("face-cameras"),
            contents: bytemuck::cast_slice(&cameras),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("face-camera-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(FACE_CAMERA_STRIDE),
                },
                count: None,
            }],
        });

        let bind_groups = ALL_FACES
            .iter()
            .map(|face| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("face-camera-{}", face.layer())),
                    layout: &layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &buffer,
                            offset: face.layer() as u64 * FACE_CAMERA_STRIDE,
                            size: wgpu::BufferSize::new(FACE_CAMERA_STRIDE),
                        }),
                    }],
                })
            })
            .collect();

        Self {
            layout,
            _buffer: buffer,
            bind_groups,
        }
    }

    pub fn bind_group(&self, face: CubeFace) -> &BindGroup {
        &self.bind_groups[face.layer() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_camera_fills_one_slot() {
        assert_eq!(std::mem::size_of::<FaceCamera>() as u64, FACE_CAMERA_STRIDE);
    }

    #[test]
    fn test_face_camera_records_layer() {
        let camera = FaceCamera::new(CubeFace::NegativeY, Mat4::IDENTITY);
        assert_eq!(camera.face[0], 3);
        assert_eq!(camera.view_proj[3][3], 1.0);
    }
}
