use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::config::{SENSOR_POLAR_MAX_DEG, SENSOR_POLAR_MIN_DEG, SENSOR_SLICES};

/// Byte-oriented device that reports where a visitor interacted
pub trait SensorPort {
    fn is_present(&mut self) -> bool;
    fn bytes_available(&mut self) -> usize;
    fn read(&mut self, n: usize) -> Vec<u8>;
}

/// Port that is never connected
pub struct NoSensor;

impl SensorPort for NoSensor {
    fn is_present(&mut self) -> bool {
        false
    }

    fn bytes_available(&mut self) -> usize {
        0
    }

    fn read(&mut self, _n: usize) -> Vec<u8> {
        Vec::new()
    }
}

/// Direction for a sensor slice byte: random azimuth inside the slice's
/// 60 degree sector around +Y, random polar angle inside the band.
/// `None` for bytes outside `0..SENSOR_SLICES`.
pub fn direction_for_slice<R: Rng>(slice: u8, rng: &mut R) -> Option<Vec3> {
    if slice >= SENSOR_SLICES {
        return None;
    }
    let sector = TAU / SENSOR_SLICES as f32;
    let azimuth = (slice as f32 + rng.gen::<f32>()) * sector;
    let polar = rng
        .gen_range(SENSOR_POLAR_MIN_DEG..=SENSOR_POLAR_MAX_DEG)
        .to_radians();

    Some(Vec3::new(
        polar.sin() * azimuth.cos(),
        polar.cos(),
        polar.sin() * azimuth.sin(),
    ))
}

/// Non-blocking sensor polling with connect/disconnect logged once per change
pub struct SensorInput {
    port: Box<dyn SensorPort>,
    connected: bool,
}

impl SensorInput {
    pub fn new(port: Box<dyn SensorPort>) -> Self {
        Self {
            port,
            connected: false,
        }
    }

    /// Drain pending bytes into disruption directions
    pub fn poll<R: Rng>(&mut self, rng: &mut R) -> Vec<Vec3> {
        let present = self.port.is_present();
        if present != self.connected {
            if present {
                log::info!("Sensor connected");
            } else {
                log::warn!("Sensor disconnected");
            }
            self.connected = present;
        }
        if !present {
            return Vec::new();
        }

        let available = self.port.bytes_available();
        if available == 0 {
            return Vec::new();
        }

        self.port
            .read(available)
            .into_iter()
            .filter_map(|byte| {
                let direction = direction_for_slice(byte, rng);
                if direction.is_none() {
                    log::warn!("Ignoring sensor byte {}", byte);
                }
                direction
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    /// Port that replays a fixed script of (present, bytes) per poll
    struct ScriptedPort {
        frames: VecDeque<(bool, Vec<u8>)>,
        pending: Vec<u8>,
    }

    impl ScriptedPort {
        fn new(frames: Vec<(bool, Vec<u8>)>) -> Self {
            Self {
                frames: frames.into(),
                pending: Vec::new(),
            }
        }
    }

    impl SensorPort for ScriptedPort {
        fn is_present(&mut self) -> bool {
            let (present, bytes) = self.frames.pop_front().unwrap_or((false, Vec::new()));
            self.pending = bytes;
            present
        }

        fn bytes_available(&mut self) -> usize {
            self.pending.len()
        }

        fn read(&mut self, n: usize) -> Vec<u8> {
            let n = n.min(self.pending.len());
            self.pending.drain(..n).collect()
        }
    }

    fn azimuth_deg(dir: Vec3) -> f32 {
        let deg = dir.z.atan2(dir.x).to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }

    #[test]
    fn test_slice_directions_stay_in_sector_and_band() {
        let mut rng = StdRng::seed_from_u64(3);
        for slice in 0..SENSOR_SLICES {
            for _ in 0..200 {
                let dir = direction_for_slice(slice, &mut rng).unwrap();
                assert!((dir.length() - 1.0).abs() < 1e-5);

                let polar = dir.y.clamp(-1.0, 1.0).acos().to_degrees();
                assert!(polar >= SENSOR_POLAR_MIN_DEG - 1e-3);
                assert!(polar <= SENSOR_POLAR_MAX_DEG + 1e-3);

                let azimuth = azimuth_deg(dir);
                let lo = slice as f32 * 60.0;
                assert!(
                    azimuth >= lo - 1e-2 && azimuth <= lo + 60.0 + 1e-2,
                    "slice {} azimuth {}",
                    slice,
                    azimuth
                );
            }
        }
    }

    #[test]
    fn test_out_of_range_bytes_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        assert!(direction_for_slice(6, &mut rng).is_none());
        assert!(direction_for_slice(255, &mut rng).is_none());
    }

    #[test]
    fn test_poll_drops_bad_bytes_and_tracks_connection() {
        let mut rng = StdRng::seed_from_u64(5);
        let port = ScriptedPort::new(vec![
            (false, vec![]),
            (true, vec![0, 9, 5]),
            (true, vec![]),
            (false, vec![1]),
        ]);
        let mut input = SensorInput::new(Box::new(port));

        assert!(input.poll(&mut rng).is_empty());
        assert!(!input.connected);

        assert_eq!(input.poll(&mut rng).len(), 2);
        assert!(input.connected);

        assert!(input.poll(&mut rng).is_empty());

        // Bytes from a vanished device are never read
        assert!(input.poll(&mut rng).is_empty());
        assert!(!input.connected);
    }

    #[test]
    fn test_no_sensor_is_quiet() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut input = SensorInput::new(Box::new(NoSensor));
        for _ in 0..10 {
            assert!(input.poll(&mut rng).is_empty());
        }
    }
}
