use wgpu::{BindGroup, BindGroupLayout, Buffer, ComputePipeline, Device};
use crate::config::WORKGROUP_SIZE;

/// How a step shader sees one of its buffers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    ReadOnly,
    ReadWrite,
    Uniform,
}

impl Binding {
    fn buffer_type(self) -> wgpu::BufferBindingType {
        match self {
            Binding::ReadOnly => wgpu::BufferBindingType::Storage { read_only: true },
            Binding::ReadWrite => wgpu::BufferBindingType::Storage { read_only: false },
            Binding::Uniform => wgpu::BufferBindingType::Uniform,
        }
    }
}

/// Compute pipeline for one full-grid simulation pass.
///
/// Bindings are numbered in the order given to [`StepPipeline::new`], and the
/// shader entry point is `main` with a 16x16x1 workgroup.
pub struct StepPipeline {
    label: String,
    pipeline: ComputePipeline,
    bind_group_layout: BindGroupLayout,
    bindings: Vec<Binding>,
}

impl StepPipeline {
    /// Create a new compute pipeline
    pub fn new(device: &Device, label: &str, source: &str, bindings: &[Binding]) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let entries: Vec<wgpu::BindGroupLayoutEntry> = bindings
            .iter()
            .enumerate()
            .map(|(i, binding)| wgpu::BindGroupLayoutEntry {
                binding: i as u32,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: binding.buffer_type(),
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{}-bind-group-layout", label)),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{}-pipeline-layout", label)),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            label: label.to_string(),
            pipeline,
            bind_group_layout,
            bindings: bindings.to_vec(),
        }
    }

    /// Create a bind group for the given buffers, in binding order
    pub fn bind(&self, device: &Device, buffers: &[&Buffer]) -> BindGroup {
        debug_assert_eq!(buffers.len(), self.bindings.len(), "{}: binding count", self.label);

        let entries: Vec<wgpu::BindGroupEntry> = buffers
            .iter()
            .enumerate()
            .map(|(i, buffer)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}-bind-group", self.label)),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }

    /// Dispatch one invocation per grid cell over `layers` stacked grids
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        bind_group: &BindGroup,
        width: u32,
        height: u32,
        layers: u32,
    ) {
        let (workgroups_x, workgroups_y) = workgroup_count(width, height);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(&self.label),
            timestamp_writes: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroups_x, workgroups_y, layers);
    }
}

fn workgroup_count(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroups_cover_grid() {
        assert_eq!(workgroup_count(512, 512), (32, 32));
        assert_eq!(workgroup_count(64, 1), (4, 1));
        assert_eq!(workgroup_count(17, 33), (2, 3));
    }
}
