use wgpu::util::DeviceExt;
use wgpu::{Buffer, BufferUsages, Device, Queue};

/// Two equivalently formatted surfaces, one readable ("current") and one
/// writable ("next"). A step reads current, writes next, then the roles swap.
pub struct PingPong<T> {
    slots: [T; 2],
    /// Index of the current (readable) slot
    current: usize,
    /// Completed swaps since creation
    generation: u64,
}

impl<T> PingPong<T> {
    pub fn new(current: T, next: T) -> Self {
        Self {
            slots: [current, next],
            current: 0,
            generation: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    pub fn next(&self) -> &T {
        &self.slots[1 - self.current]
    }

    /// Get (input, output) for the next step
    pub fn io(&self) -> (&T, &T) {
        (self.current(), self.next())
    }

    /// Swap roles after a step
    pub fn swap(&mut self) {
        self.current = 1 - self.current;
        self.generation += 1;
    }

    /// Run one full step from current into next, then swap
    pub fn advance<F: FnOnce(&T, &T)>(&mut self, step: F) {
        let (input, output) = self.io();
        step(input, output);
        self.swap();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Ping-pong pair of storage buffers
pub type BufferPair = PingPong<Buffer>;

impl BufferPair {
    /// Create both storage buffers seeded with `initial`
    pub fn with_contents<P: bytemuck::Pod>(device: &Device, label: &str, initial: &[P]) -> Self {
        let make = |suffix: &str| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}-{}", label, suffix)),
                contents: bytemuck::cast_slice(initial),
                usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            })
        };
        Self::new(make("a"), make("b"))
    }
}

/// Single storage buffer, rewritable with `queue.write_buffer`
pub fn storage_buffer<P: bytemuck::Pod>(device: &Device, label: &str, contents: &[P]) -> Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(contents),
        usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
    })
}

/// Uniform buffer sized for `P`, written with [`write_uniform`]
pub fn uniform_buffer<P: bytemuck::Pod>(device: &Device, label: &str, initial: &P) -> Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(initial),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    })
}

pub fn write_uniform<P: bytemuck::Pod>(queue: &Queue, buffer: &Buffer, value: &P) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_parity() {
        for steps in 0..7u64 {
            let mut pair = PingPong::new("a", "b");
            for _ in 0..steps {
                pair.advance(|_, _| {});
            }
            let expected = if steps % 2 == 1 { "b" } else { "a" };
            assert_eq!(*pair.current(), expected, "after {} steps", steps);
            assert_ne!(pair.current(), pair.next());
            assert_eq!(pair.generation(), steps);
        }
    }

    #[test]
    fn test_advance_reads_current_writes_next() {
        let mut pair = PingPong::new(1, 2);
        let mut seen = None;
        pair.advance(|input, output| seen = Some((*input, *output)));
        assert_eq!(seen, Some((1, 2)));
        assert_eq!(*pair.current(), 2);
    }

    #[test]
    fn test_swap_is_not_a_copy() {
        let mut pair = PingPong::new(vec![0u8; 4], vec![1u8; 4]);
        let before = pair.next().as_ptr();
        pair.swap();
        assert_eq!(pair.current().as_ptr(), before);
    }
}
