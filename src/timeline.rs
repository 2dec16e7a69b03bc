//! Playback clock, scene cues and the crossfade curve.
//!
//! The timeline only reports what happened as [`TimelineEvent`]s; acting on
//! them (switching scenes, driving narration) is left to the scheduler.

use crate::simulation::SceneKind;

/// Switch to `scene` once playback reaches `time` seconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cue {
    pub time: f32,
    pub scene: SceneKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineEvent {
    NarrationStart,
    NarrationStop,
    SwitchScene(SceneKind),
}

/// Ramp-hold-ramp opacity, one segment per cue interval
#[derive(Clone, Debug)]
pub struct AlphaCurve {
    /// `(start, end)` of each visible interval, ascending
    segments: Vec<(f32, f32)>,
    fade: f32,
}

impl AlphaCurve {
    /// Each cue is visible until the next cue, the last one until `duration`
    pub fn from_cues(cues: &[Cue], duration: f32, fade: f32) -> Self {
        let segments = cues
            .iter()
            .enumerate()
            .map(|(i, cue)| {
                let end = cues.get(i + 1).map_or(duration, |next| next.time);
                (cue.time, end)
            })
            .filter(|(start, end)| end > start)
            .collect();
        Self { segments, fade }
    }

    pub fn sample(&self, t: f32) -> f32 {
        let Some(&(start, end)) = self.segments.iter().find(|(s, e)| t >= *s && t < *e) else {
            return 0.0;
        };
        // Short intervals never reach full opacity twice over
        let fade = self.fade.min((end - start) / 2.0);
        if fade <= 0.0 {
            return 1.0;
        }

        let alpha = if t < start + fade {
            (t - start) / fade
        } else if t > end - fade {
            (end - t) / fade
        } else {
            1.0
        };
        alpha.clamp(0.0, 1.0)
    }
}

/// Playback progress from 0 to the narration duration, looping
#[derive(Clone, Debug)]
pub struct Timeline {
    cues: Vec<Cue>,
    curve: AlphaCurve,
    duration: f32,
    progress: f32,
    next_cue: usize,
    running: bool,
}

impl Timeline {
    pub fn new(mut cues: Vec<Cue>, duration: f32, fade: f32) -> Self {
        cues.sort_by(|a, b| a.time.total_cmp(&b.time));
        let curve = AlphaCurve::from_cues(&cues, duration, fade);
        Self {
            cues,
            curve,
            duration,
            progress: 0.0,
            next_cue: 0,
            running: false,
        }
    }

    /// One cue per scene at equal thirds of the narration
    pub fn evenly_spaced(duration: f32, fade: f32) -> Self {
        let scenes = SceneKind::ALL;
        let cues = scenes
            .iter()
            .enumerate()
            .map(|(i, &scene)| Cue {
                time: duration * i as f32 / scenes.len() as f32,
                scene,
            })
            .collect();
        Self::new(cues, duration, fade)
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn alpha(&self) -> f32 {
        self.curve.sample(self.progress)
    }

    /// Move the clock forward by `dt` seconds and report what it crossed, in order
    pub fn advance(&mut self, dt: f32) -> Vec<TimelineEvent> {
        let mut events = Vec::new();

        if !self.running {
            self.running = true;
            events.push(TimelineEvent::NarrationStart);
        }

        let target = self.progress + dt.max(0.0);
        self.progress = target.min(self.duration);

        while let Some(cue) = self.cues.get(self.next_cue) {
            if cue.time > self.progress {
                break;
            }
            events.push(TimelineEvent::SwitchScene(cue.scene));
            self.next_cue += 1;
        }

        if self.progress >= self.duration {
            events.push(TimelineEvent::NarrationStop);
            // Time past the end carries into the next loop
            self.progress = if self.duration > 0.0 {
                (target - self.duration) % self.duration
            } else {
                0.0
            };
            self.next_cue = 0;
            self.running = false;
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> AlphaCurve {
        let cues = [
            Cue {
                time: 0.0,
                scene: SceneKind::ReactionDiffusion,
            },
            Cue {
                time: 60.0,
                scene: SceneKind::Flocking,
            },
        ];
        AlphaCurve::from_cues(&cues, 120.0, 4.0)
    }

    #[test]
    fn test_alpha_starts_dark() {
        assert_eq!(curve().sample(0.0), 0.0);
    }

    #[test]
    fn test_alpha_full_after_first_ramp() {
        let curve = curve();
        assert!((curve.sample(4.0) - 1.0).abs() < 1e-5);
        assert!((curve.sample(4.01) - 1.0).abs() < 1e-5);
        assert!((curve.sample(2.0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_alpha_constant_during_hold() {
        let curve = curve();
        let held = curve.sample(10.0);
        for t in [15.0, 30.0, 45.0, 55.9] {
            assert_eq!(curve.sample(t), held);
        }
    }

    #[test]
    fn test_alpha_fades_out_before_next_cue() {
        let curve = curve();
        assert!((curve.sample(58.0) - 0.5).abs() < 1e-5);
        assert!(curve.sample(59.99) < 0.01);
        assert!(curve.sample(60.0) < 1e-5);
        assert_eq!(curve.sample(120.0), 0.0);
    }

    #[test]
    fn test_short_interval_peaks_in_middle() {
        let cues = [
            Cue {
                time: 0.0,
                scene: SceneKind::Network,
            },
        ];
        let curve = AlphaCurve::from_cues(&cues, 4.0, 4.0);
        assert!((curve.sample(2.0) - 1.0).abs() < 1e-5);
        assert!((curve.sample(1.0) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_events_in_order() {
        let mut timeline = Timeline::evenly_spaced(90.0, 4.0);

        assert_eq!(
            timeline.advance(0.5),
            vec![
                TimelineEvent::NarrationStart,
                TimelineEvent::SwitchScene(SceneKind::ReactionDiffusion),
            ]
        );
        assert!(timeline.advance(20.0).is_empty());
        assert_eq!(
            timeline.advance(10.0),
            vec![TimelineEvent::SwitchScene(SceneKind::Flocking)]
        );
        assert_eq!(
            timeline.advance(30.0),
            vec![TimelineEvent::SwitchScene(SceneKind::Network)]
        );
        assert_eq!(timeline.advance(40.0), vec![TimelineEvent::NarrationStop]);
        assert_eq!(timeline.progress(), 0.0);
    }

    #[test]
    fn test_timeline_loops() {
        let mut timeline = Timeline::evenly_spaced(30.0, 1.0);
        let first: Vec<_> = (0..40).flat_map(|_| timeline.advance(1.0)).collect();
        let switches = first
            .iter()
            .filter(|e| matches!(e, TimelineEvent::SwitchScene(_)))
            .count();
        let starts = first
            .iter()
            .filter(|e| **e == TimelineEvent::NarrationStart)
            .count();
        assert_eq!(starts, 2);
        assert_eq!(switches, 5);
        assert_eq!(timeline.progress(), 10.0);
    }

    #[test]
    fn test_overshoot_carries_into_next_loop() {
        let mut timeline = Timeline::evenly_spaced(30.0, 1.0);
        timeline.advance(29.5);
        let events = timeline.advance(1.0);
        assert_eq!(events.last(), Some(&TimelineEvent::NarrationStop));
        assert!((timeline.progress() - 0.5).abs() < 1e-5);

        let events = timeline.advance(0.25);
        assert_eq!(
            events,
            vec![
                TimelineEvent::NarrationStart,
                TimelineEvent::SwitchScene(SceneKind::ReactionDiffusion),
            ]
        );
        assert!((timeline.progress() - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_one_big_step_fires_every_cue() {
        let mut timeline = Timeline::evenly_spaced(30.0, 1.0);
        let events = timeline.advance(100.0);
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], TimelineEvent::NarrationStart);
        assert_eq!(events[4], TimelineEvent::NarrationStop);
    }
}
