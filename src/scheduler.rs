use crate::config::{DEFAULT_NARRATION_SECS, FADE_SECS};
use crate::external::Narration;
use crate::simulation::SceneKind;
use crate::timeline::{Timeline, TimelineEvent};

/// Decides which scene is visible and how opaque it is.
///
/// In installation mode the timeline drives everything; in development mode
/// the timeline is bypassed, alpha stays at 1 and scenes are switched by hand.
pub struct Scheduler {
    timeline: Timeline,
    active: SceneKind,
    dev_mode: bool,
    paused: bool,
}

impl Scheduler {
    pub fn new(dev_mode: bool, narration: &dyn Narration) -> Self {
        let mut duration = narration.duration();
        if !(duration > FADE_SECS * 2.0) {
            log::warn!(
                "Narration duration {:.1}s too short, using {:.0}s",
                duration,
                DEFAULT_NARRATION_SECS
            );
            duration = DEFAULT_NARRATION_SECS;
        }

        let timeline = Timeline::evenly_spaced(duration, FADE_SECS);
        log::info!(
            "Scheduler: {} mode, {:.0}s timeline",
            if dev_mode { "development" } else { "installation" },
            timeline.duration()
        );

        Self {
            timeline,
            active: SceneKind::ReactionDiffusion,
            dev_mode,
            paused: false,
        }
    }

    pub fn active(&self) -> SceneKind {
        self.active
    }

    pub fn is_dev_mode(&self) -> bool {
        self.dev_mode
    }

    /// Step the clock by `dt` seconds, apply what it crossed, return the crossfade alpha
    pub fn advance(&mut self, dt: f32, narration: &mut dyn Narration) -> f32 {
        if self.dev_mode {
            return 1.0;
        }
        if self.paused {
            return self.timeline.alpha();
        }

        for event in self.timeline.advance(dt) {
            match event {
                TimelineEvent::NarrationStart => narration.start(),
                TimelineEvent::NarrationStop => narration.stop(),
                TimelineEvent::SwitchScene(kind) => self.switch_to(kind),
            }
        }
        self.timeline.alpha()
    }

    /// Manual scene selection, honoured only in development mode
    pub fn select(&mut self, kind: SceneKind) -> bool {
        if !self.dev_mode {
            log::info!("Scene selection is only available in development mode");
            return false;
        }
        self.switch_to(kind);
        true
    }

    /// Pause or resume narration and the timeline together.
    /// Development mode has neither running, so there is nothing to pause.
    pub fn toggle_pause(&mut self, narration: &mut dyn Narration) {
        if self.dev_mode {
            log::info!("Pause is unavailable in development mode");
            return;
        }
        self.paused = !self.paused;
        if self.paused {
            narration.pause();
        } else {
            narration.start();
        }
        log::info!(
            "Timeline {} at {:.1}s",
            if self.paused { "paused" } else { "resumed" },
            self.timeline.progress()
        );
    }

    fn switch_to(&mut self, kind: SceneKind) {
        if kind != self.active {
            log::info!("Switching to {}", kind.label());
        }
        self.active = kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Narration that records every call
    #[derive(Default)]
    struct RecordingNarration {
        calls: Vec<&'static str>,
        playing: bool,
    }

    impl Narration for RecordingNarration {
        fn start(&mut self) {
            self.calls.push("start");
            self.playing = true;
        }
        fn stop(&mut self) {
            self.calls.push("stop");
            self.playing = false;
        }
        fn pause(&mut self) {
            self.calls.push("pause");
            self.playing = false;
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn duration(&self) -> f32 {
            30.0
        }
    }

    #[test]
    fn test_installation_mode_follows_cues() {
        let mut narration = RecordingNarration::default();
        let mut scheduler = Scheduler::new(false, &narration);

        let alpha = scheduler.advance(0.1, &mut narration);
        assert_eq!(narration.calls, vec!["start"]);
        assert!(narration.is_playing());
        assert_eq!(scheduler.active(), SceneKind::ReactionDiffusion);
        assert!(alpha > 0.0 && alpha < 0.1);

        scheduler.advance(10.0, &mut narration);
        assert_eq!(scheduler.active(), SceneKind::Flocking);
        scheduler.advance(10.0, &mut narration);
        assert_eq!(scheduler.active(), SceneKind::Network);

        scheduler.advance(10.0, &mut narration);
        assert_eq!(narration.calls, vec!["start", "stop"]);

        scheduler.advance(0.1, &mut narration);
        assert_eq!(scheduler.active(), SceneKind::ReactionDiffusion);
        assert_eq!(narration.calls, vec!["start", "stop", "start"]);
    }

    #[test]
    fn test_manual_selection_rejected_outside_dev_mode() {
        let narration = RecordingNarration::default();
        let mut scheduler = Scheduler::new(false, &narration);
        assert!(!scheduler.select(SceneKind::Network));
        assert_eq!(scheduler.active(), SceneKind::ReactionDiffusion);
    }

    #[test]
    fn test_dev_mode_holds_alpha_and_allows_switching() {
        let mut narration = RecordingNarration::default();
        let mut scheduler = Scheduler::new(true, &narration);
        assert!(scheduler.is_dev_mode());

        for _ in 0..100 {
            assert_eq!(scheduler.advance(1.0, &mut narration), 1.0);
        }
        assert!(narration.calls.is_empty());
        assert_eq!(scheduler.active(), SceneKind::ReactionDiffusion);

        assert!(scheduler.select(SceneKind::Flocking));
        assert_eq!(scheduler.active(), SceneKind::Flocking);
    }

    #[test]
    fn test_pause_ignored_in_dev_mode() {
        let mut narration = RecordingNarration::default();
        let mut scheduler = Scheduler::new(true, &narration);

        scheduler.toggle_pause(&mut narration);
        scheduler.toggle_pause(&mut narration);
        scheduler.toggle_pause(&mut narration);
        assert!(narration.calls.is_empty());
        assert_eq!(scheduler.advance(1.0, &mut narration), 1.0);
    }

    #[test]
    fn test_pause_freezes_progress() {
        let mut narration = RecordingNarration::default();
        let mut scheduler = Scheduler::new(false, &narration);
        let before = scheduler.advance(2.0, &mut narration);

        scheduler.toggle_pause(&mut narration);
        assert!(!narration.is_playing());
        for _ in 0..50 {
            assert_eq!(scheduler.advance(1.0, &mut narration), before);
        }
        assert_eq!(scheduler.active(), SceneKind::ReactionDiffusion);

        scheduler.toggle_pause(&mut narration);
        assert!(narration.is_playing());
        assert!(scheduler.advance(1.0, &mut narration) > before);
        assert_eq!(narration.calls, vec!["start", "pause", "start"]);
    }

    #[test]
    fn test_short_narration_falls_back_to_default() {
        struct Blip;
        impl Narration for Blip {
            fn start(&mut self) {}
            fn stop(&mut self) {}
            fn pause(&mut self) {}
            fn is_playing(&self) -> bool {
                false
            }
            fn duration(&self) -> f32 {
                0.0
            }
        }

        let scheduler = Scheduler::new(false, &Blip);
        assert_eq!(scheduler.timeline.duration(), DEFAULT_NARRATION_SECS);
    }
}
