use glam::{Vec2, Vec3};
use wgpu::{Buffer, CommandEncoder, RenderPipeline};

use super::Scene;
use crate::config::{
    CUBE_CAMERA_FAR, CUBE_CAMERA_NEAR, OUTPUT_CUBE_MAP_SIDE, RD_DIFFUSION_A, RD_DIFFUSION_B,
    RD_DISRUPT_RADIUS, RD_FEED_RATE, RD_GRID_SIDE, RD_KILL_RATE, RD_SEED_RING_RADIUS,
    RD_SEED_RING_STROKE, RD_STEPS_PER_FRAME,
};
use crate::cubemap::{face_uv, CubeFace, ALL_FACES};
use crate::gpu::{
    bind_buffers, create_pipeline, storage_entry, uniform_buffer, uniform_entry,
    Binding, BufferPair, CubeTarget, FaceCameras, GpuContext, PipelineDesc, StepPipeline,
    CUBE_COLOR_FORMAT,
};

/// Concentrations of one texel: `a` is the autocatalytic activator, `b` the
/// fed substrate. Stored layer-major: `(face * side + y) * side + x`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RdCell {
    pub a: f32,
    pub b: f32,
}

impl RdCell {
    /// Uniform background: no activator, full substrate
    pub const BACKGROUND: RdCell = RdCell { a: 0.0, b: 1.0 };
    /// Seed value for rings and disruptions
    pub const SEED: RdCell = RdCell { a: 1.0, b: 0.0 };
}

/// Gray-Scott parameters (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RdParams {
    pub side: u32,
    pub _padding: [u32; 3],
    pub feed: f32,
    pub kill: f32,
    pub diffusion_a: f32,
    pub diffusion_b: f32,
}

/// Circle painted by a disruption (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RdDisruption {
    pub center: [f32; 2],
    pub radius: f32,
    pub face: u32,
    pub side: u32,
    pub _padding: [u32; 3],
}

/// Side length uniform for the visualisation pass (16 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GridInfo {
    side: u32,
    _padding: [u32; 3],
}

/// Initial state: uniform background plus a stroked ring on the +Z face
pub fn seed_cells(side: u32, ring_radius: f32, stroke: f32) -> Vec<RdCell> {
    let mut cells = vec![RdCell::BACKGROUND; (6 * side * side) as usize];
    let centre = Vec2::splat(side as f32 / 2.0);
    let face = CubeFace::PositiveZ.layer();

    for y in 0..side {
        for x in 0..side {
            let texel = Vec2::new(x as f32, y as f32) + Vec2::splat(0.5);
            if (texel.distance(centre) - ring_radius).abs() <= stroke / 2.0 {
                cells[((face * side + y) * side + x) as usize] = RdCell::SEED;
            }
        }
    }
    cells
}

/// Face and circle centre a disruption from `direction` paints into
pub fn disruption_target(direction: Vec3, side: u32) -> RdDisruption {
    let (face, uv) = face_uv(direction.normalize());
    RdDisruption {
        center: uv.to_array(),
        radius: RD_DISRUPT_RADIUS,
        face: face.layer(),
        side,
        _padding: [0; 3],
    }
}

/// Gray-Scott reaction-diffusion over the six faces of a cube map
pub struct ReactionDiffusionScene {
    cells: BufferPair,
    params_buffer: Buffer,
    grid_buffer: Buffer,
    step: StepPipeline,
    disrupt: StepPipeline,
    render_pipeline: RenderPipeline,
    render_layout: wgpu::BindGroupLayout,
    cameras: FaceCameras,
    target: CubeTarget,
    side: u32,
}

impl ReactionDiffusionScene {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;
        let side = RD_GRID_SIDE;

        log::info!("Reaction-diffusion: {}x{}x6 grid", side, side);
        let seed = seed_cells(side, RD_SEED_RING_RADIUS, RD_SEED_RING_STROKE);
        let cells = BufferPair::with_contents(device, "rd-cells", &seed);

        let params_buffer = uniform_buffer(
            device,
            "rd-params",
            &RdParams {
                side,
                _padding: [0; 3],
                feed: RD_FEED_RATE,
                kill: RD_KILL_RATE,
                diffusion_a: RD_DIFFUSION_A,
                diffusion_b: RD_DIFFUSION_B,
            },
        );
        let grid_buffer = uniform_buffer(
            device,
            "rd-grid",
            &GridInfo {
                side,
                _padding: [0; 3],
            },
        );

        let step = StepPipeline::new(
            device,
            "rd-step",
            concat!(
                include_str!("../shaders/cubemap.wgsl"),
                include_str!("../shaders/rd_step.wgsl")
            ),
            &[Binding::ReadOnly, Binding::ReadWrite, Binding::Uniform],
        );
        let disrupt = StepPipeline::new(
            device,
            "rd-disrupt",
            include_str!("../shaders/rd_disrupt.wgsl"),
            &[Binding::ReadWrite, Binding::Uniform],
        );

        let cameras = FaceCameras::new(device, CUBE_CAMERA_NEAR, CUBE_CAMERA_FAR);
        let render_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("rd-render-layout"),
            entries: &[storage_entry(0), uniform_entry(1)],
        });
        let render_pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "rd-render",
                source: include_str!("../shaders/rd_render.wgsl"),
                bind_group_layouts: &[&cameras.layout, &render_layout],
                vertex_buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                format: CUBE_COLOR_FORMAT,
                depth: false,
            },
        );

        let target = CubeTarget::new(device, "rd-cube-camera", OUTPUT_CUBE_MAP_SIDE, false);

        Self {
            cells,
            params_buffer,
            grid_buffer,
            step,
            disrupt,
            render_pipeline,
            render_layout,
            cameras,
            target,
            side,
        }
    }
}

impl Scene for ReactionDiffusionScene {
    fn name(&self) -> &'static str {
        "reaction-diffusion"
    }

    fn update(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder) {
        let side = self.side;
        for _ in 0..RD_STEPS_PER_FRAME {
            let step = &self.step;
            let params = &self.params_buffer;
            self.cells.advance(|input, output| {
                let bind_group = step.bind(&gpu.device, &[input, output, params]);
                step.dispatch(encoder, &bind_group, side, side, 6);
            });
        }
        if self.cells.generation() % 10_000 == 0 {
            log::debug!("Reaction-diffusion: {} steps", self.cells.generation());
        }
    }

    fn draw(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder) -> &CubeTarget {
        let bind_group = bind_buffers(
            &gpu.device,
            "rd-render-bind-group",
            &self.render_layout,
            &[self.cells.current(), &self.grid_buffer],
        );

        for face in ALL_FACES {
            let mut pass = self.target.face_pass(encoder, face, "rd-render-pass");
            pass.set_pipeline(&self.render_pipeline);
            pass.set_bind_group(0, self.cameras.bind_group(face), &[]);
            pass.set_bind_group(1, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        &self.target
    }

    fn disrupt(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder, direction: Vec3) {
        let target = disruption_target(direction, self.side);
        log::debug!(
            "Reaction-diffusion disruption on face {} at ({:.3}, {:.3})",
            target.face,
            target.center[0],
            target.center[1]
        );
        // Fresh buffer per disruption so several in one frame don't overwrite each other
        let disruption = uniform_buffer(&gpu.device, "rd-disruption", &target);

        // Painted into the current buffer, outside the ping-pong step
        let bind_group = self
            .disrupt
            .bind(&gpu.device, &[self.cells.current(), &disruption]);
        self.disrupt.dispatch(encoder, &bind_group, self.side, self.side, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(face: CubeFace, x: u32, y: u32, side: u32) -> usize {
        ((face.layer() * side + y) * side + x) as usize
    }

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<RdCell>(), 8);
        assert_eq!(std::mem::size_of::<RdParams>(), 32);
        assert_eq!(std::mem::size_of::<RdDisruption>(), 32);
        assert_eq!(std::mem::size_of::<GridInfo>(), 16);
    }

    #[test]
    fn test_seed_has_nonzero_substrate_baseline() {
        let side = 64;
        let cells = seed_cells(side, 10.0, 4.0);
        assert_eq!(cells.len(), (6 * side * side) as usize);
        assert_eq!(cells[index(CubeFace::NegativeX, 3, 3, side)], RdCell::BACKGROUND);
        assert!(cells.iter().all(|c| *c == RdCell::BACKGROUND || *c == RdCell::SEED));
    }

    #[test]
    fn test_seed_ring_only_on_positive_z() {
        let side = 64;
        let cells = seed_cells(side, 10.0, 4.0);
        for face in ALL_FACES {
            let start = index(face, 0, 0, side);
            let seeded = cells[start..start + (side * side) as usize]
                .iter()
                .filter(|c| **c == RdCell::SEED)
                .count();
            if face == CubeFace::PositiveZ {
                assert!(seeded > 0);
            } else {
                assert_eq!(seeded, 0, "{:?}", face);
            }
        }
        // Ring, not disc: the centre stays background
        assert_eq!(cells[index(CubeFace::PositiveZ, 32, 32, side)], RdCell::BACKGROUND);
        assert_eq!(cells[index(CubeFace::PositiveZ, 42, 32, side)], RdCell::SEED);
    }

    #[test]
    fn test_disruption_straight_up_hits_face_centre() {
        let target = disruption_target(Vec3::new(0.0, 1.0, 0.0), 512);
        assert_eq!(target.face, CubeFace::PositiveY.layer());
        assert!((target.center[0] - 0.5).abs() < 1e-5);
        assert!((target.center[1] - 0.5).abs() < 1e-5);
        assert_eq!(target.radius, RD_DISRUPT_RADIUS);
    }

    #[test]
    fn test_disruption_direction_is_normalised() {
        let a = disruption_target(Vec3::new(0.0, 0.0, -3.0), 512);
        let b = disruption_target(Vec3::new(0.0, 0.0, -1.0), 512);
        assert_eq!(a.face, CubeFace::NegativeZ.layer());
        assert_eq!(a.center, b.center);
    }
}
