mod buffers;
mod compositor;
mod compute;
mod context;
mod cube_target;
mod render;

pub use buffers::{storage_buffer, uniform_buffer, write_uniform, BufferPair};
pub use compositor::Compositor;
pub use compute::{Binding, StepPipeline};
pub use context::GpuContext;
pub use cube_target::{CubeTarget, FaceCameras, CUBE_COLOR_FORMAT};
pub use render::{
    bind_buffers, create_pipeline, storage_entry, uniform_entry, PipelineDesc, PresentPipeline,
};
