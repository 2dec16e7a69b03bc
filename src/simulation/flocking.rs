use glam::{Vec3, Vec4};
use rand::Rng;
use wgpu::{BindGroupLayout, Buffer, CommandEncoder, RenderPipeline};

use super::{random_unit_vector, Scene};
use crate::config::{
    CUBE_CAMERA_FAR, CUBE_CAMERA_NEAR, FLOCK_ALIGN_DIST, FLOCK_ALIGN_MOD, FLOCK_BIRD_SIZE,
    FLOCK_COHESION_DIST, FLOCK_COHESION_MOD, FLOCK_DISRUPT_FRAMES, FLOCK_DISRUPT_RADIUS,
    FLOCK_INITIAL_SPEED, FLOCK_MAX_FORCE, FLOCK_MAX_SPEED, FLOCK_MIN_FORCE, FLOCK_MIN_SPEED,
    FLOCK_NUM_BIRDS, FLOCK_SEPARATION_DIST, FLOCK_SEPARATION_MOD, OUTPUT_CUBE_MAP_SIDE,
};
use crate::cubemap::ALL_FACES;
use crate::gpu::{
    bind_buffers, create_pipeline, storage_entry, uniform_buffer, uniform_entry, write_uniform,
    Binding, BufferPair, CubeTarget, FaceCameras, GpuContext, PipelineDesc, StepPipeline,
    CUBE_COLOR_FORMAT,
};

/// Side of the square agent grid for a requested bird count, rounded down
pub fn grid_side(requested: u32) -> u32 {
    let requested = u64::from(requested);
    let mut side = (requested as f64).sqrt() as u64;
    while side * side > requested {
        side -= 1;
    }
    while (side + 1) * (side + 1) <= requested {
        side += 1;
    }
    side as u32
}

/// Initial positions `(x, y, z, wing_phase)` and velocities `(x, y, z, 0)`
pub fn seed_birds<R: Rng>(side: u32, rng: &mut R) -> (Vec<Vec4>, Vec<Vec4>) {
    let count = (side * side) as usize;
    let mut positions = Vec::with_capacity(count);
    let mut velocities = Vec::with_capacity(count);

    for _ in 0..count {
        let position = random_unit_vector(rng);
        let heading = random_unit_vector(rng);
        let tangent = heading - heading.dot(position) * position;
        let velocity = tangent.normalize_or_zero() * FLOCK_INITIAL_SPEED;

        positions.push(position.extend(rng.gen_range(0.0..std::f32::consts::TAU)));
        velocities.push(velocity.extend(0.0));
    }

    (positions, velocities)
}

/// A push away from a point that fades out over [`FLOCK_DISRUPT_FRAMES`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlockDisruption {
    point: Vec3,
    frames_left: u32,
}

impl FlockDisruption {
    pub fn new(direction: Vec3) -> Self {
        Self {
            point: direction.normalize_or_zero(),
            frames_left: FLOCK_DISRUPT_FRAMES,
        }
    }

    /// 1.0 when fresh, falling linearly to 0.0
    pub fn strength(&self) -> f32 {
        self.frames_left as f32 / FLOCK_DISRUPT_FRAMES as f32
    }

    /// Consume one frame; false once the push has run out
    pub fn tick(&mut self) -> bool {
        self.frames_left = self.frames_left.saturating_sub(1);
        self.frames_left > 0
    }
}

/// Uniform shared by the velocity and position passes (80 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FlockParams {
    pub side: u32,
    pub count: u32,
    pub _padding: [u32; 2],
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_force: f32,
    pub max_force: f32,
    pub separation_dist: f32,
    pub separation_mod: f32,
    pub align_dist: f32,
    pub align_mod: f32,
    pub cohesion_dist: f32,
    pub cohesion_mod: f32,
    pub disrupt_radius: f32,
    pub disrupt_strength: f32,
    pub disrupt_point: [f32; 4],
}

impl FlockParams {
    pub fn new(side: u32, disruption: Option<&FlockDisruption>) -> Self {
        let (point, strength) = disruption
            .map(|d| (d.point, d.strength()))
            .unwrap_or((Vec3::ZERO, 0.0));

        Self {
            side,
            count: side * side,
            _padding: [0; 2],
            min_speed: FLOCK_MIN_SPEED,
            max_speed: FLOCK_MAX_SPEED,
            min_force: FLOCK_MIN_FORCE,
            max_force: FLOCK_MAX_FORCE,
            separation_dist: FLOCK_SEPARATION_DIST,
            separation_mod: FLOCK_SEPARATION_MOD,
            align_dist: FLOCK_ALIGN_DIST,
            align_mod: FLOCK_ALIGN_MOD,
            cohesion_dist: FLOCK_COHESION_DIST,
            cohesion_mod: FLOCK_COHESION_MOD,
            disrupt_radius: FLOCK_DISRUPT_RADIUS,
            disrupt_strength: strength,
            disrupt_point: point.extend(0.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct BirdStyle {
    size: f32,
    _padding: [f32; 3],
}

/// Boids on the unit sphere, one agent per texel of a square grid
pub struct FlockingScene {
    positions: BufferPair,
    velocities: BufferPair,
    params_buffer: Buffer,
    style_buffer: Buffer,
    velocity_step: StepPipeline,
    position_step: StepPipeline,
    render_pipeline: RenderPipeline,
    render_layout: BindGroupLayout,
    cameras: FaceCameras,
    target: CubeTarget,
    disruption: Option<FlockDisruption>,
    side: u32,
}

impl FlockingScene {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;
        let side = grid_side(FLOCK_NUM_BIRDS);
        if side * side != FLOCK_NUM_BIRDS {
            log::warn!(
                "Flocking: {} birds requested, using {} ({}x{})",
                FLOCK_NUM_BIRDS,
                side * side,
                side,
                side
            );
        }
        log::info!("Flocking: {} birds", side * side);

        let (positions, velocities) = seed_birds(side, &mut rand::thread_rng());
        let positions = BufferPair::with_contents(device, "flock-positions", &positions);
        let velocities = BufferPair::with_contents(device, "flock-velocities", &velocities);

        let params_buffer = uniform_buffer(device, "flock-params", &FlockParams::new(side, None));
        let style_buffer = uniform_buffer(
            device,
            "flock-style",
            &BirdStyle {
                size: FLOCK_BIRD_SIZE,
                _padding: [0.0; 3],
            },
        );

        let bindings = [
            Binding::ReadOnly,
            Binding::ReadOnly,
            Binding::ReadWrite,
            Binding::Uniform,
        ];
        let velocity_step = StepPipeline::new(
            device,
            "flock-velocity",
            include_str!("../shaders/flock_velocity.wgsl"),
            &bindings,
        );
        let position_step = StepPipeline::new(
            device,
            "flock-position",
            include_str!("../shaders/flock_position.wgsl"),
            &bindings,
        );

        let cameras = FaceCameras::new(device, CUBE_CAMERA_NEAR, CUBE_CAMERA_FAR);
        let render_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flock-render-layout"),
            entries: &[storage_entry(0), storage_entry(1), uniform_entry(2)],
        });
        let render_pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "flock-render",
                source: include_str!("../shaders/flock_render.wgsl"),
                bind_group_layouts: &[&cameras.layout, &render_layout],
                vertex_buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                format: CUBE_COLOR_FORMAT,
                depth: false,
            },
        );

        let target = CubeTarget::new(device, "flock-cube-camera", OUTPUT_CUBE_MAP_SIDE, false);

        Self {
            positions,
            velocities,
            params_buffer,
            style_buffer,
            velocity_step,
            position_step,
            render_pipeline,
            render_layout,
            cameras,
            target,
            disruption: None,
            side,
        }
    }
}

impl Scene for FlockingScene {
    fn name(&self) -> &'static str {
        "flocking"
    }

    fn update(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder) {
        let params = FlockParams::new(self.side, self.disruption.as_ref());
        write_uniform(&gpu.queue, &self.params_buffer, &params);
        if let Some(disruption) = self.disruption.as_mut() {
            if !disruption.tick() {
                self.disruption = None;
            }
        }

        let side = self.side;
        let params = &self.params_buffer;
        let velocity_step = &self.velocity_step;
        let position_step = &self.position_step;
        let (positions_in, positions_out) = self.positions.io();

        // Both passes read the velocities of the previous frame
        self.velocities.advance(|velocities_in, velocities_out| {
            let bind_group = velocity_step.bind(
                &gpu.device,
                &[positions_in, velocities_in, velocities_out, params],
            );
            velocity_step.dispatch(encoder, &bind_group, side, side, 1);

            let bind_group = position_step.bind(
                &gpu.device,
                &[positions_in, velocities_in, positions_out, params],
            );
            position_step.dispatch(encoder, &bind_group, side, side, 1);
        });
        self.positions.swap();
    }

    fn draw(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder) -> &CubeTarget {
        let bind_group = bind_buffers(
            &gpu.device,
            "flock-render-bind-group",
            &self.render_layout,
            &[
                self.positions.current(),
                self.velocities.current(),
                &self.style_buffer,
            ],
        );
        let count = self.side * self.side;

        for face in ALL_FACES {
            let mut pass = self.target.face_pass(encoder, face, "flock-render-pass");
            pass.set_pipeline(&self.render_pipeline);
            pass.set_bind_group(0, self.cameras.bind_group(face), &[]);
            pass.set_bind_group(1, &bind_group, &[]);
            pass.draw(0..3, 0..count);
        }

        &self.target
    }

    fn disrupt(&mut self, _gpu: &GpuContext, _encoder: &mut CommandEncoder, direction: Vec3) {
        log::debug!("Flocking disruption towards {:?}", direction);
        self.disruption = Some(FlockDisruption::new(direction));
    }
}
