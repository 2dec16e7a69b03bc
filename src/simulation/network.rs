use std::collections::BTreeSet;

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wgpu::{BindGroupLayout, Buffer, CommandEncoder, RenderPipeline};

use super::{random_unit_vector, Scene};
use crate::config::{
    CUBE_CAMERA_FAR, CUBE_CAMERA_NEAR, NETWORK_CUBE_MAP_SIDE, NETWORK_DISINFECT_CHANCE,
    NETWORK_DISRUPT_RADIUS, NETWORK_INITIAL_INFECTION_CHANCE, NETWORK_LINKS_PER_NODE,
    NETWORK_MIN_INFECTED, NETWORK_NODE_SIZE, NETWORK_NUM_NODES, NETWORK_SPREAD_CHANCE,
};
use crate::cubemap::ALL_FACES;
use crate::gpu::{
    bind_buffers, create_pipeline, storage_entry, storage_buffer, uniform_buffer, uniform_entry,
    CubeTarget, FaceCameras, GpuContext, PipelineDesc, CUBE_COLOR_FORMAT,
};

pub const INFECTED_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
pub const HEALTHY_COLOR: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

/// Tunables of the epidemic
#[derive(Clone, Copy, Debug)]
pub struct NetworkParams {
    pub num_nodes: usize,
    pub links_per_node: usize,
    pub disinfect_chance: f32,
    pub spread_chance: f32,
    pub min_infected: usize,
    pub initial_infection_chance: f32,
    pub disrupt_radius: f32,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            num_nodes: NETWORK_NUM_NODES,
            links_per_node: NETWORK_LINKS_PER_NODE,
            disinfect_chance: NETWORK_DISINFECT_CHANCE,
            spread_chance: NETWORK_SPREAD_CHANCE,
            min_infected: NETWORK_MIN_INFECTED,
            initial_infection_chance: NETWORK_INITIAL_INFECTION_CHANCE,
            disrupt_radius: NETWORK_DISRUPT_RADIUS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub position: Vec3,
    pub infected: bool,
    pub links: BTreeSet<u32>,
}

/// What one update did to the infected count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkStep {
    pub infected_before: usize,
    /// Count after spread and recovery, before the corrective pass
    pub infected_spread: usize,
    pub infected_after: usize,
    /// Whether the count fell below the minimum and random nodes were infected
    pub corrected: bool,
}

/// SIR-like epidemic on a fixed nearest-neighbour graph over the unit sphere
pub struct Network {
    params: NetworkParams,
    nodes: Vec<Node>,
    /// Each link once, as `(lo, hi)` with `lo < hi`
    links: Vec<(u32, u32)>,
}

impl Network {
    pub fn new<R: Rng>(params: NetworkParams, rng: &mut R) -> Self {
        let mut nodes: Vec<Node> = (0..params.num_nodes)
            .map(|_| Node {
                position: random_unit_vector(rng),
                infected: rng.gen::<f32>() < params.initial_infection_chance,
                links: BTreeSet::new(),
            })
            .collect();

        let mut links = Vec::new();
        let mut candidates: Vec<u32> = (0..params.num_nodes as u32).collect();

        for id in 0..params.num_nodes {
            if nodes[id].links.len() >= params.links_per_node {
                continue;
            }
            let here = nodes[id].position;
            candidates.sort_by(|&a, &b| {
                let da = here.distance_squared(nodes[a as usize].position);
                let db = here.distance_squared(nodes[b as usize].position);
                da.total_cmp(&db)
            });

            for &other in &candidates {
                if nodes[id].links.len() >= params.links_per_node {
                    break;
                }
                let other_idx = other as usize;
                if other_idx == id
                    || nodes[id].links.contains(&other)
                    || nodes[other_idx].links.len() >= params.links_per_node
                {
                    continue;
                }
                nodes[id].links.insert(other);
                nodes[other_idx].links.insert(id as u32);
                links.push((other.min(id as u32), other.max(id as u32)));
            }
        }

        log::info!(
            "Network: {} nodes, {} links, {} initially infected",
            nodes.len(),
            links.len(),
            nodes.iter().filter(|n| n.infected).count()
        );

        Self {
            params,
            nodes,
            links,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[(u32, u32)] {
        &self.links
    }

    pub fn infected_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.infected).count()
    }

    /// One generation of recovery and spread, followed by the corrective pass
    /// if the epidemic is close to dying out.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> NetworkStep {
        let infected_before = self.infected_count();
        let mut will_be_infected = vec![false; self.nodes.len()];

        // Flags only ever go true, so recovery never cancels spread onto a node
        for (id, node) in self.nodes.iter().enumerate() {
            if !node.infected {
                continue;
            }
            if rng.gen::<f32>() >= self.params.disinfect_chance {
                will_be_infected[id] = true;
            }
            for &other in &node.links {
                if rng.gen::<f32>() < self.params.spread_chance {
                    will_be_infected[other as usize] = true;
                }
            }
        }

        let infected_spread = will_be_infected.iter().filter(|&&i| i).count();
        let corrected = infected_spread < self.params.min_infected;
        if corrected {
            let chance = self.params.min_infected as f32 / self.params.num_nodes as f32;
            for infected in will_be_infected.iter_mut() {
                if rng.gen::<f32>() < chance {
                    *infected = true;
                }
            }
        }

        for (node, infected) in self.nodes.iter_mut().zip(will_be_infected) {
            node.infected = infected;
        }

        NetworkStep {
            infected_before,
            infected_spread,
            infected_after: self.infected_count(),
            corrected,
        }
    }

    /// Infect every node within the disrupt radius of `direction`.
    /// Returns how many nodes were newly infected.
    pub fn disrupt(&mut self, direction: Vec3) -> usize {
        let centre = direction.normalize_or_zero();
        let mut newly = 0;
        for node in &mut self.nodes {
            if !node.infected && node.position.distance(centre) < self.params.disrupt_radius {
                node.infected = true;
                newly += 1;
            }
        }
        newly
    }

    /// Node colours, infected red and healthy blue
    pub fn colors(&self) -> Vec<Vec4> {
        self.nodes
            .iter()
            .map(|n| if n.infected { INFECTED_COLOR } else { HEALTHY_COLOR })
            .collect()
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct NodeStyle {
    size: f32,
    _padding: [f32; 3],
}

/// Network epidemic, simulated on the CPU and drawn as links plus node quads
pub struct NetworkScene {
    network: Network,
    rng: StdRng,
    positions: Buffer,
    colors: Buffer,
    endpoints: Buffer,
    style_buffer: Buffer,
    links_pipeline: RenderPipeline,
    nodes_pipeline: RenderPipeline,
    links_layout: BindGroupLayout,
    nodes_layout: BindGroupLayout,
    cameras: FaceCameras,
    target: CubeTarget,
}

impl NetworkScene {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;
        let mut rng = StdRng::from_entropy();
        let network = Network::new(NetworkParams::default(), &mut rng);

        let positions: Vec<Vec4> = network
            .nodes()
            .iter()
            .map(|n| n.position.extend(1.0))
            .collect();
        let endpoints: Vec<u32> = network
            .links()
            .iter()
            .flat_map(|&(lo, hi)| [lo, hi])
            .collect();

        let positions = storage_buffer(device, "network-positions", &positions);
        let colors = storage_buffer(device, "network-colors", &network.colors());
        let endpoints = storage_buffer(device, "network-endpoints", &endpoints);
        let style_buffer = uniform_buffer(
            device,
            "network-style",
            &NodeStyle {
                size: NETWORK_NODE_SIZE,
                _padding: [0.0; 3],
            },
        );

        let cameras = FaceCameras::new(device, CUBE_CAMERA_NEAR, CUBE_CAMERA_FAR);
        let links_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("network-links-layout"),
            entries: &[storage_entry(0), storage_entry(1), storage_entry(2)],
        });
        let nodes_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("network-nodes-layout"),
            entries: &[storage_entry(0), storage_entry(1), uniform_entry(2)],
        });

        let links_pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "network-links",
                source: include_str!("../shaders/network_links.wgsl"),
                bind_group_layouts: &[&cameras.layout, &links_layout],
                vertex_buffers: &[],
                topology: wgpu::PrimitiveTopology::LineList,
                format: CUBE_COLOR_FORMAT,
                depth: true,
            },
        );
        let nodes_pipeline = create_pipeline(
            device,
            &PipelineDesc {
                label: "network-nodes",
                source: include_str!("../shaders/network_nodes.wgsl"),
                bind_group_layouts: &[&cameras.layout, &nodes_layout],
                vertex_buffers: &[],
                topology: wgpu::PrimitiveTopology::TriangleList,
                format: CUBE_COLOR_FORMAT,
                depth: true,
            },
        );

        let target = CubeTarget::new(device, "network-cube-camera", NETWORK_CUBE_MAP_SIDE, true);

        Self {
            network,
            rng,
            positions,
            colors,
            endpoints,
            style_buffer,
            links_pipeline,
            nodes_pipeline,
            links_layout,
            nodes_layout,
            cameras,
            target,
        }
    }
}

impl Scene for NetworkScene {
    fn name(&self) -> &'static str {
        "network"
    }

    fn update(&mut self, _gpu: &GpuContext, _encoder: &mut CommandEncoder) {
        let report = self.network.step(&mut self.rng);
        if report.corrected {
            log::debug!(
                "Network: {} -> {} infected after spread, reseeded to {}",
                report.infected_before,
                report.infected_spread,
                report.infected_after
            );
        }
    }

    fn draw(&mut self, gpu: &GpuContext, encoder: &mut CommandEncoder) -> &CubeTarget {
        gpu.queue.write_buffer(
            &self.colors,
            0,
            bytemuck::cast_slice(&self.network.colors()),
        );

        let links_bind_group = bind_buffers(
            &gpu.device,
            "network-links-bind-group",
            &self.links_layout,
            &[&self.positions, &self.colors, &self.endpoints],
        );
        let nodes_bind_group = bind_buffers(
            &gpu.device,
            "network-nodes-bind-group",
            &self.nodes_layout,
            &[&self.positions, &self.colors, &self.style_buffer],
        );
        let endpoint_count = (self.network.links().len() * 2) as u32;
        let node_count = self.network.nodes().len() as u32;

        for face in ALL_FACES {
            let mut pass = self.target.face_pass(encoder, face, "network-render-pass");
            pass.set_bind_group(0, self.cameras.bind_group(face), &[]);

            pass.set_pipeline(&self.links_pipeline);
            pass.set_bind_group(1, &links_bind_group, &[]);
            pass.draw(0..endpoint_count, 0..1);

            pass.set_pipeline(&self.nodes_pipeline);
            pass.set_bind_group(1, &nodes_bind_group, &[]);
            pass.draw(0..6, 0..node_count);
        }

        &self.target
    }

    fn disrupt(&mut self, _gpu: &GpuContext, _encoder: &mut CommandEncoder, direction: Vec3) {
        let infected = self.network.disrupt(direction);
        log::debug!("Network disruption infected {} nodes", infected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> NetworkParams {
        NetworkParams {
            num_nodes: 300,
            ..NetworkParams::default()
        }
    }

    fn network(seed: u64, params: NetworkParams) -> (Network, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let network = Network::new(params, &mut rng);
        (network, rng)
    }

    #[test]
    fn test_links_respect_cap() {
        let (net, _) = network(1, small_params());
        for node in net.nodes() {
            assert!(node.links.len() <= NETWORK_LINKS_PER_NODE);
        }
        // Skipping saturated candidates leaves almost every node fully linked
        let full = net
            .nodes()
            .iter()
            .filter(|n| n.links.len() == NETWORK_LINKS_PER_NODE)
            .count();
        assert!(full > net.nodes().len() * 9 / 10);
    }

    #[test]
    fn test_links_symmetric_and_unique() {
        let (net, _) = network(2, small_params());
        let mut seen = BTreeSet::new();
        for &(lo, hi) in net.links() {
            assert!(lo < hi);
            assert!(seen.insert((lo, hi)), "duplicate link {:?}", (lo, hi));
            assert!(net.nodes()[lo as usize].links.contains(&hi));
            assert!(net.nodes()[hi as usize].links.contains(&lo));
        }
        let degree_sum: usize = net.nodes().iter().map(|n| n.links.len()).sum();
        assert_eq!(degree_sum, net.links().len() * 2);
    }

    #[test]
    fn test_nodes_on_unit_sphere() {
        let (net, _) = network(3, small_params());
        assert_eq!(net.nodes().len(), 300);
        for node in net.nodes() {
            assert!((node.position.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_corrective_pass_runs_when_epidemic_dies() {
        let params = NetworkParams {
            initial_infection_chance: 0.0,
            disinfect_chance: 1.0,
            spread_chance: 0.0,
            min_infected: 50,
            ..small_params()
        };
        let (mut net, mut rng) = network(4, params);
        assert_eq!(net.infected_count(), 0);

        let mut ran = false;
        for _ in 0..20 {
            let report = net.step(&mut rng);
            assert!(report.corrected);
            assert!(report.infected_after >= report.infected_spread);
            ran |= report.infected_after > 0;
        }
        assert!(ran);
    }

    #[test]
    fn test_no_correction_above_minimum() {
        let params = NetworkParams {
            initial_infection_chance: 1.0,
            disinfect_chance: 0.0,
            ..small_params()
        };
        let (mut net, mut rng) = network(5, params);
        let report = net.step(&mut rng);
        assert!(!report.corrected);
        assert_eq!(report.infected_before, 300);
        assert_eq!(report.infected_after, 300);
    }

    #[test]
    fn test_certain_recovery_without_spread_clears_infection() {
        let params = NetworkParams {
            initial_infection_chance: 1.0,
            disinfect_chance: 1.0,
            spread_chance: 0.0,
            min_infected: 0,
            ..small_params()
        };
        let (mut net, mut rng) = network(6, params);
        let report = net.step(&mut rng);
        assert_eq!(report.infected_after, 0);
        assert!(net.colors().iter().all(|&c| c == HEALTHY_COLOR));
    }

    #[test]
    fn test_recovery_does_not_cancel_spread() {
        let params = NetworkParams {
            num_nodes: 2,
            initial_infection_chance: 1.0,
            disinfect_chance: 1.0,
            spread_chance: 1.0,
            min_infected: 0,
            ..NetworkParams::default()
        };
        let (mut net, mut rng) = network(9, params);
        assert_eq!(net.links(), &[(0, 1)]);

        let report = net.step(&mut rng);
        assert!(!report.corrected);
        let infected: Vec<bool> = net.nodes().iter().map(|n| n.infected).collect();
        assert_eq!(infected, vec![true, true]);
    }

    #[test]
    fn test_disrupt_infects_within_radius() {
        let params = NetworkParams {
            initial_infection_chance: 0.0,
            ..small_params()
        };
        let (mut net, _) = network(7, params);
        let direction = Vec3::new(0.0, 0.0, 5.0);
        let newly = net.disrupt(direction);

        assert_eq!(newly, net.infected_count());
        for node in net.nodes() {
            let inside = node.position.distance(Vec3::Z) < NETWORK_DISRUPT_RADIUS;
            assert_eq!(node.infected, inside);
        }
    }

    #[test]
    fn test_colors_follow_infection() {
        let params = NetworkParams {
            num_nodes: 20,
            initial_infection_chance: 0.5,
            ..NetworkParams::default()
        };
        let (net, _) = network(8, params);
        for (node, color) in net.nodes().iter().zip(net.colors()) {
            let expected = if node.infected { INFECTED_COLOR } else { HEALTHY_COLOR };
            assert_eq!(color, expected);
        }
    }
}
