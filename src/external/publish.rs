/// Downstream consumer of the composited frame
pub trait FramePublisher {
    fn publish(&mut self, frame: &wgpu::Texture);

    /// Called once when the app shuts down
    fn finish(&mut self) {}
}

/// Counts frames and reports the output format once
#[derive(Default)]
pub struct LoggingPublisher {
    frames: u64,
}

impl LoggingPublisher {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FramePublisher for LoggingPublisher {
    fn publish(&mut self, frame: &wgpu::Texture) {
        if self.frames == 0 {
            log::info!(
                "Publishing {}x{} {:?} frames",
                frame.width(),
                frame.height(),
                frame.format()
            );
        }
        self.frames += 1;
        if self.frames % 3600 == 0 {
            log::debug!("Published {} frames", self.frames);
        }
    }

    fn finish(&mut self) {
        log::info!("Published {} frames", self.frames());
    }
}
