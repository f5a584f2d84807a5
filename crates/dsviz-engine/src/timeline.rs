//! Step timelines: the ordered visual events one operation produces.
//!
//! Events reference elements by [`ElementId`], never by structure index, so
//! a renderer can locate an element no matter how the structure has moved
//! it since. Durations are hints; wall-clock pacing belongs to the player.

use std::collections::HashMap;

use crate::layout::PositionHint;
use crate::value::{ElementId, ScalarValue};

/// Semantic colour of an element. The renderer owns the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Tone {
    #[default]
    Default,
    /// Candidate currently being examined
    Visiting,
    /// Search hit
    Found,
    /// Stack top or queue front
    Top,
    /// Pair under comparison
    Compared,
    /// Element that was just exchanged
    Swapped,
    /// Settled in final sorted position
    Sorted,
}

/// What happens to the target element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum StepKind {
    /// Draw attention to an element under examination
    Highlight { tone: Tone },
    /// Slide the element to a new layout position.
    ///
    /// The first event of a newly created element is a move to its initial
    /// position.
    Move { to: PositionHint },
    /// Change the element's colour, optionally rewriting its display value
    Recolor {
        tone: Tone,
        label: Option<ScalarValue>,
    },
    /// Element leaves the structure
    Remove,
    /// Element exchanges layout positions with `with`
    Swap { with: ElementId },
}

/// One visual event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepEvent {
    pub target: ElementId,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: StepKind,
    pub duration_hint_ms: u64,
}

impl StepEvent {
    /// Name of the event kind, as the renderer protocol spells it.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            StepKind::Highlight { .. } => "Highlight",
            StepKind::Move { .. } => "Move",
            StepKind::Recolor { .. } => "Recolor",
            StepKind::Remove => "Remove",
            StepKind::Swap { .. } => "Swap",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NoticeKind {
    Found,
    NotFound,
}

/// Transient user-visible message, cleared after `display_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub display_ms: u64,
}

impl Notice {
    /// `Found value "v" at <place> N`, with N 1-based.
    pub fn found_at(
        value: &dyn std::fmt::Display,
        place: &str,
        position: usize,
        display_ms: u64,
    ) -> Self {
        Self {
            kind: NoticeKind::Found,
            text: format!("Found value \"{value}\" at {place} {}", position + 1),
            display_ms,
        }
    }

    pub fn found(value: &dyn std::fmt::Display, display_ms: u64) -> Self {
        Self {
            kind: NoticeKind::Found,
            text: format!("Found value \"{value}\""),
            display_ms,
        }
    }

    /// `Value "v" not found in <noun>.`
    pub fn not_found(value: &dyn std::fmt::Display, noun: &str, display_ms: u64) -> Self {
        Self {
            kind: NoticeKind::NotFound,
            text: format!("Value \"{value}\" not found in {noun}."),
            display_ms,
        }
    }
}

/// Ordered visual events for one operation, plus an optional notice.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepTimeline {
    events: Vec<StepEvent>,
    notice: Option<Notice>,
}

impl StepTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: ElementId, kind: StepKind, duration_hint_ms: u64) {
        self.events.push(StepEvent {
            target,
            kind,
            duration_hint_ms,
        });
    }

    pub fn highlight(&mut self, target: ElementId, tone: Tone, ms: u64) {
        self.push(target, StepKind::Highlight { tone }, ms);
    }

    pub fn move_to(&mut self, target: ElementId, to: PositionHint, ms: u64) {
        self.push(target, StepKind::Move { to }, ms);
    }

    pub fn recolor(&mut self, target: ElementId, tone: Tone, ms: u64) {
        self.push(target, StepKind::Recolor { tone, label: None }, ms);
    }

    /// Recolor and overwrite the element's display value.
    pub fn relabel(&mut self, target: ElementId, tone: Tone, label: ScalarValue, ms: u64) {
        self.push(
            target,
            StepKind::Recolor {
                tone,
                label: Some(label),
            },
            ms,
        );
    }

    pub fn remove(&mut self, target: ElementId, ms: u64) {
        self.push(target, StepKind::Remove, ms);
    }

    pub fn swap(&mut self, a: ElementId, b: ElementId, ms: u64) {
        self.push(a, StepKind::Swap { with: b }, ms);
    }

    /// Moves meant to play together: only the last one carries the duration.
    pub fn move_together(&mut self, moves: &[(ElementId, PositionHint)], ms: u64) {
        let last = moves.len().saturating_sub(1);
        for (i, (id, to)) in moves.iter().enumerate() {
            self.move_to(*id, *to, if i == last { ms } else { 0 });
        }
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    pub fn events(&self) -> &[StepEvent] {
        &self.events
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.events.iter().map(|e| e.duration_hint_ms).sum()
    }

    pub fn into_parts(self) -> (Vec<StepEvent>, Option<Notice>) {
        (self.events, self.notice)
    }

    /// Tone every element shows after the first `frame` events.
    ///
    /// Elements at [`Tone::Default`] and removed elements are omitted.
    pub fn tones_at(&self, frame: usize) -> HashMap<ElementId, Tone> {
        tones_after(&self.events[..frame.min(self.events.len())])
    }
}

/// Fold highlight/recolor/remove events into the resulting tone map.
pub fn tones_after(events: &[StepEvent]) -> HashMap<ElementId, Tone> {
    let mut tones = HashMap::new();
    for event in events {
        match &event.kind {
            StepKind::Highlight { tone } | StepKind::Recolor { tone, .. } => {
                if *tone == Tone::Default {
                    tones.remove(&event.target);
                } else {
                    tones.insert(event.target, *tone);
                }
            }
            StepKind::Remove => {
                tones.remove(&event.target);
            }
            StepKind::Move { .. } | StepKind::Swap { .. } => {}
        }
    }
    tones
}

impl IntoIterator for StepTimeline {
    type Item = StepEvent;
    type IntoIter = std::vec::IntoIter<StepEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
