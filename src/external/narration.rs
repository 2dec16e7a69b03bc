/// Narration audio the timeline is synchronised to
pub trait Narration {
    fn start(&mut self);
    fn stop(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
    /// Total length in seconds
    fn duration(&self) -> f32;
}

/// Stand-in used when no audio backend is attached: keeps the play state and
/// reports a fixed duration.
pub struct SilentNarration {
    duration: f32,
    playing: bool,
}

impl SilentNarration {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            playing: false,
        }
    }
}

impl Narration for SilentNarration {
    fn start(&mut self) {
        log::info!("Narration started ({:.0}s, silent)", self.duration);
        self.playing = true;
    }

    fn stop(&mut self) {
        log::info!("Narration stopped");
        self.playing = false;
    }

    fn pause(&mut self) {
        log::info!("Narration paused");
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn duration(&self) -> f32 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_narration_tracks_play_state() {
        let mut narration = SilentNarration::new(12.0);
        assert!(!narration.is_playing());
        narration.start();
        assert!(narration.is_playing());
        narration.pause();
        assert!(!narration.is_playing());
        narration.start();
        narration.stop();
        assert!(!narration.is_playing());
        assert_eq!(narration.duration(), 12.0);
    }
}
