//! Scrubbing over the last operation's timeline.

use std::collections::HashMap;
use std::time::Duration;

use dsviz_engine::{tones_after, ElementId, StepEvent, StepTimeline, Tone};
use serde::{Deserialize, Serialize};

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    /// Pause playback
    Paused,
    /// 0.25x speed
    QuarterSpeed,
    /// 0.5x speed
    HalfSpeed,
    /// Normal speed (1x)
    Normal,
    /// 2x speed
    Double,
    /// 4x speed
    Quadruple,
    /// 10x speed
    TenX,
    /// No delay between events
    Maximum,
}

impl PlaybackSpeed {
    pub const PRESETS: [PlaybackSpeed; 8] = [
        PlaybackSpeed::Paused,
        PlaybackSpeed::QuarterSpeed,
        PlaybackSpeed::HalfSpeed,
        PlaybackSpeed::Normal,
        PlaybackSpeed::Double,
        PlaybackSpeed::Quadruple,
        PlaybackSpeed::TenX,
        PlaybackSpeed::Maximum,
    ];

    /// Get the speed multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::Paused => 0.0,
            PlaybackSpeed::QuarterSpeed => 0.25,
            PlaybackSpeed::HalfSpeed => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
            PlaybackSpeed::TenX => 10.0,
            PlaybackSpeed::Maximum => f64::INFINITY,
        }
    }

    /// The preset with exactly this multiplier (`"inf"` parses to Maximum).
    pub fn from_multiplier(multiplier: f64) -> Option<Self> {
        Self::PRESETS
            .into_iter()
            .find(|s| s.multiplier() == multiplier)
    }

    /// Wall-clock delay for an event's duration hint. `None` while paused.
    pub fn delay(&self, hint_ms: u64) -> Option<Duration> {
        match self {
            PlaybackSpeed::Paused => None,
            PlaybackSpeed::Maximum => Some(Duration::ZERO),
            speed => Some(Duration::from_millis(
                (hint_ms as f64 / speed.multiplier()) as u64,
            )),
        }
    }
}

/// Where the cursor sits within the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Before the first event
    Stopped,
    /// Somewhere between the first and last event
    Paused,
    /// After the last event
    Finished,
}

/// Frame cursor over a recorded timeline.
///
/// The frame counts how many events have been applied, so frame 0 shows the
/// state before the operation's first event and `total_frames()` the state
/// after its last. Live pacing belongs to the animator; this only scrubs.
#[derive(Debug, Clone)]
pub struct Playback {
    events: Vec<StepEvent>,
    current_frame: usize,
    speed: PlaybackSpeed,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(StepTimeline::new())
    }
}

impl Playback {
    pub fn new(timeline: StepTimeline) -> Self {
        let (events, _) = timeline.into_parts();
        Self {
            events,
            current_frame: 0,
            speed: PlaybackSpeed::Normal,
        }
    }

    /// Swap in a new timeline, keeping the speed.
    pub fn load(&mut self, timeline: StepTimeline) {
        let (events, _) = timeline.into_parts();
        self.events = events;
        self.current_frame = 0;
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn total_frames(&self) -> usize {
        self.events.len()
    }

    pub fn state(&self) -> PlaybackState {
        if self.current_frame == 0 {
            PlaybackState::Stopped
        } else if self.current_frame >= self.events.len() {
            PlaybackState::Finished
        } else {
            PlaybackState::Paused
        }
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Seek to a specific frame.
    pub fn seek(&mut self, frame: usize) {
        self.current_frame = frame.min(self.events.len());
    }

    /// Return to the beginning.
    pub fn stop(&mut self) {
        self.current_frame = 0;
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    /// Apply the next event.
    pub fn step_forward(&mut self) -> Option<&StepEvent> {
        let event = self.events.get(self.current_frame)?;
        self.current_frame += 1;
        Some(event)
    }

    /// Un-apply the last event.
    pub fn step_backward(&mut self) {
        self.current_frame = self.current_frame.saturating_sub(1);
    }

    /// Events applied so far.
    pub fn events_to_current(&self) -> &[StepEvent] {
        &self.events[..self.current_frame]
    }

    /// The event the next step would apply.
    pub fn current_event(&self) -> Option<&StepEvent> {
        self.events.get(self.current_frame)
    }

    /// Tones showing at the current frame.
    pub fn tones(&self) -> HashMap<ElementId, Tone> {
        tones_after(self.events_to_current())
    }

    /// Progress from 0.0 to 1.0.
    pub fn progress(&self) -> f64 {
        if self.events.is_empty() {
            0.0
        } else {
            self.current_frame as f64 / self.events.len() as f64
        }
    }
}

/// Playback status for sending to frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub current_frame: usize,
    pub total_frames: usize,
    pub state: PlaybackState,
    pub speed: PlaybackSpeed,
    pub progress: f64,
    pub current_event: Option<StepEvent>,
}

impl From<&Playback> for PlaybackStatus {
    fn from(playback: &Playback) -> Self {
        Self {
            current_frame: playback.current_frame,
            total_frames: playback.total_frames(),
            state: playback.state(),
            speed: playback.speed,
            progress: playback.progress(),
            current_event: playback.current_event().cloned(),
        }
    }
}
