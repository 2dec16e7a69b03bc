pub mod flocking;
pub mod network;
pub mod reaction_diffusion;

use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;
use wgpu::CommandEncoder;

use crate::gpu::{CubeTarget, GpuContext};

pub use flocking::FlockingScene;
pub use network::NetworkScene;
pub use reaction_diffusion::ReactionDiffusionScene;

/// A simulation that renders into its own cube-map camera
pub trait Scene {
    fn name(&self) -> &'static str;

    /// Advance the simulation by one frame
    fn update(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder);

    /// Render the current state into all six faces of the scene's cube map
    fn draw(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder) -> &CubeTarget;

    /// Perturb the simulation around a point on the unit sphere
    fn disrupt(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder, direction: Vec3);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneKind {
    ReactionDiffusion,
    Flocking,
    Network,
}

impl SceneKind {
    pub const ALL: [SceneKind; 3] = [
        SceneKind::ReactionDiffusion,
        SceneKind::Flocking,
        SceneKind::Network,
    ];

    /// Scene bound to a number key, `1` to `3`
    pub fn from_digit(digit: u32) -> Option<SceneKind> {
        match digit {
            1..=3 => Some(Self::ALL[digit as usize - 1]),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SceneKind::ReactionDiffusion => "Reaction-Diffusion",
            SceneKind::Flocking => "Flocking",
            SceneKind::Network => "Network",
        }
    }
}

/// Every scene, built once at startup. Inactive scenes keep their state.
pub struct SceneSet {
    reaction_diffusion: ReactionDiffusionScene,
    flocking: FlockingScene,
    network: NetworkScene,
}

impl SceneSet {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            reaction_diffusion: ReactionDiffusionScene::new(gpu),
            flocking: FlockingScene::new(gpu),
            network: NetworkScene::new(gpu),
        }
    }

    pub fn get_mut(&mut self, kind: SceneKind) -> &mut dyn Scene {
        match kind {
            SceneKind::ReactionDiffusion => &mut self.reaction_diffusion,
            SceneKind::Flocking => &mut self.flocking,
            SceneKind::Network => &mut self.network,
        }
    }
}

/// Uniformly distributed point on the unit sphere
pub fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let phi: f32 = rng.gen_range(0.0..TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_digit_keys_map_in_order() {
        assert_eq!(SceneKind::from_digit(1), Some(SceneKind::ReactionDiffusion));
        assert_eq!(SceneKind::from_digit(2), Some(SceneKind::Flocking));
        assert_eq!(SceneKind::from_digit(3), Some(SceneKind::Network));
        assert_eq!(SceneKind::from_digit(0), None);
        assert_eq!(SceneKind::from_digit(4), None);
    }

    #[test]
    fn test_random_unit_vectors_are_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
    }
}
