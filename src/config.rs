/// Side length of each face of the cube-map cameras the scenes render into
pub const OUTPUT_CUBE_MAP_SIDE: u32 = 1024;

/// Compute shader workgroup size
pub const WORKGROUP_SIZE: u32 = 16;

// ============================================
// Reaction-Diffusion
// ============================================

/// Side length of each face of the reaction-diffusion grid
pub const RD_GRID_SIDE: u32 = 512;

/// Simulation steps per rendered frame (speeds up pattern growth)
pub const RD_STEPS_PER_FRAME: u32 = 10;

/// Pearson type alpha ("waves"): feed rate of the substrate
pub const RD_FEED_RATE: f32 = 0.010;

/// Pearson type alpha ("waves"): kill rate of the activator
pub const RD_KILL_RATE: f32 = 0.047;

/// Diffusion rate of the activator (channel a)
pub const RD_DIFFUSION_A: f32 = 0.5;

/// Diffusion rate of the substrate (channel b)
pub const RD_DIFFUSION_B: f32 = 1.0;

/// Radius in texels of the ring seeded on the +Z face
pub const RD_SEED_RING_RADIUS: f32 = 20.0;

/// Stroke width in texels of the seed ring
pub const RD_SEED_RING_STROKE: f32 = 8.0;

/// Radius of a disruption circle, in face UV units
pub const RD_DISRUPT_RADIUS: f32 = 0.05;

// ============================================
// Flocking
// ============================================

/// Requested number of birds (rounded down to a perfect square)
pub const FLOCK_NUM_BIRDS: u32 = 64 * 64;

/// Initial speed of each bird, tangent to the sphere
pub const FLOCK_INITIAL_SPEED: f32 = 0.001;

pub const FLOCK_MIN_SPEED: f32 = 0.0005;
pub const FLOCK_MAX_SPEED: f32 = 0.004;
pub const FLOCK_MIN_FORCE: f32 = 0.0;
pub const FLOCK_MAX_FORCE: f32 = 0.0002;

pub const FLOCK_SEPARATION_DIST: f32 = 0.02;
pub const FLOCK_SEPARATION_MOD: f32 = 1.5;
pub const FLOCK_ALIGN_DIST: f32 = 0.06;
pub const FLOCK_ALIGN_MOD: f32 = 1.0;
pub const FLOCK_COHESION_DIST: f32 = 0.08;
pub const FLOCK_COHESION_MOD: f32 = 0.8;

/// Birds within this distance of a disruption point are pushed away
pub const FLOCK_DISRUPT_RADIUS: f32 = 0.4;

/// Number of frames a disruption keeps pushing (strength decays linearly)
pub const FLOCK_DISRUPT_FRAMES: u32 = 90;

/// Half length of a rendered bird, in unit-sphere distance
pub const FLOCK_BIRD_SIZE: f32 = 0.012;

// ============================================
// Network epidemic
// ============================================

pub const NETWORK_NUM_NODES: usize = 2000;
pub const NETWORK_LINKS_PER_NODE: usize = 8;
pub const NETWORK_DISINFECT_CHANCE: f32 = 0.04;
pub const NETWORK_SPREAD_CHANCE: f32 = 0.007;
pub const NETWORK_MIN_INFECTED: usize = 20;
pub const NETWORK_INITIAL_INFECTION_CHANCE: f32 = 0.1;

/// Euclidean distance on the unit sphere within which a disruption infects
pub const NETWORK_DISRUPT_RADIUS: f32 = 0.45;

/// Half width of a rendered node quad, in unit-sphere distance
pub const NETWORK_NODE_SIZE: f32 = 0.008;

/// Cube camera clip planes for geometry-based scenes
pub const CUBE_CAMERA_NEAR: f32 = 0.5;
pub const CUBE_CAMERA_FAR: f32 = 5.0;

/// Cube camera for the network scene is supersampled
pub const NETWORK_CUBE_MAP_SIDE: u32 = OUTPUT_CUBE_MAP_SIDE * 2;

// ============================================
// Timeline
// ============================================

/// Narration length used when no audio collaborator reports one, in seconds
pub const DEFAULT_NARRATION_SECS: f32 = 180.0;

/// Duration of each crossfade ramp, in seconds
pub const FADE_SECS: f32 = 4.0;

// ============================================
// Sensor input
// ============================================

/// Number of angular slices around the vertical axis a sensor byte can select
pub const SENSOR_SLICES: u8 = 6;

/// Polar angle band (degrees from +Y) for sensor disruptions
pub const SENSOR_POLAR_MIN_DEG: f32 = 60.0;
pub const SENSOR_POLAR_MAX_DEG: f32 = 120.0;
