//! LIFO stack.

use crate::config::StepDurations;
use crate::engine::{Animated, Engine, Outcome, StructureKind};
use crate::error::{EngineError, Result};
use crate::layout::PositionHint;
use crate::snapshot::{or_null, NodeView, Snapshot};
use crate::timeline::{Notice, StepTimeline, Tone};
use crate::value::{parse_label, Element, ElementId, IdAllocator, ScalarValue};

/// Stack of labels. Index 0 is the bottom; the top is the last element.
#[derive(Debug, Clone, Default)]
pub struct StackEngine {
    items: Vec<Element<String>>,
    ids: IdAllocator,
    durations: StepDurations,
}

impl StackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(durations: StepDurations) -> Self {
        Self {
            durations,
            ..Self::default()
        }
    }

    /// Push a label. Duplicates are fine; blank input is rejected.
    pub fn push(&mut self, input: &str) -> Result<Animated<ElementId>> {
        let label = parse_label(input)?;
        let id = self.ids.allocate();
        let mut timeline = StepTimeline::new();

        if let Some(old_top) = self.items.last() {
            timeline.recolor(old_top.id, Tone::Default, 0);
        }
        timeline.move_to(id, PositionHint::linear(self.items.len()), self.durations.slide);
        timeline.recolor(id, Tone::Top, 0);

        tracing::debug!(%id, %label, depth = self.items.len(), "push");
        self.items.push(Element { id, value: label });
        Ok(Animated::new(id, timeline))
    }

    /// Pop the top label.
    pub fn pop(&mut self) -> Result<Animated<String>> {
        let top = self.items.pop().ok_or(EngineError::Empty)?;
        let mut timeline = StepTimeline::new();

        // lift off the top, then drop it
        timeline.move_to(
            top.id,
            PositionHint::linear(self.items.len() + 1),
            self.durations.slide,
        );
        timeline.remove(top.id, 0);
        if let Some(new_top) = self.items.last() {
            timeline.recolor(new_top.id, Tone::Top, 0);
        }

        tracing::debug!(id = %top.id, label = %top.value, "pop");
        Ok(Animated::new(top.value, timeline))
    }

    pub fn peek(&self) -> Option<&str> {
        self.items.last().map(|e| e.value.as_str())
    }

    /// Scan top to bottom; the first match wins.
    ///
    /// Returns the match's distance from the top (0 = top).
    pub fn search(&self, input: &str) -> Result<Animated<Option<usize>>> {
        let needle = parse_label(input)?;
        let mut timeline = StepTimeline::new();
        for (depth, element) in self.items.iter().rev().enumerate() {
            timeline.highlight(element.id, Tone::Visiting, self.durations.visit);
            if element.value == needle {
                timeline.recolor(element.id, Tone::Found, 0);
                timeline.set_notice(Notice::found_at(
                    &needle,
                    "position",
                    depth,
                    self.durations.notice,
                ));
                return Ok(Animated::new(Some(depth), timeline));
            }
            let resting = if depth == 0 { Tone::Top } else { Tone::Default };
            timeline.recolor(element.id, resting, 0);
        }

        timeline.set_notice(Notice::not_found(
            &needle,
            StructureKind::Stack.noun(),
            self.durations.notice,
        ));
        Ok(Animated::new(None, timeline))
    }

    /// Remove everything, top first. Returns how many elements went.
    pub fn clear(&mut self) -> Animated<usize> {
        let mut timeline = StepTimeline::new();
        for element in self.items.iter().rev() {
            timeline.remove(element.id, 0);
        }
        let count = self.items.len();
        self.items.clear();
        Animated::new(count, timeline)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Labels bottom to top.
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|e| e.value.as_str()).collect()
    }
}

impl Engine for StackEngine {
    fn kind(&self) -> StructureKind {
        StructureKind::Stack
    }

    fn insert(&mut self, input: &str) -> Outcome {
        self.push(input).into()
    }

    /// Pops; the input is not consulted.
    fn delete(&mut self, _input: &str) -> Outcome {
        self.pop().into()
    }

    fn search(&self, input: &str) -> Outcome {
        StackEngine::search(self, input).into()
    }

    fn clear(&mut self) -> Outcome {
        Outcome::Animated(StackEngine::clear(self).timeline)
    }

    fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new(StructureKind::Stack);
        snap.nodes = self
            .items
            .iter()
            .enumerate()
            .map(|(i, e)| {
                NodeView::new(
                    e.id,
                    ScalarValue::Label(e.value.clone()),
                    PositionHint::linear(i),
                )
            })
            .collect();
        snap.push_readout("top", or_null(self.peek()));
        snap.push_readout("size", self.len().to_string());
        snap
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::StepKind;

    fn stack_of(labels: &[&str]) -> StackEngine {
        let mut stack = StackEngine::new();
        for l in labels {
            stack.push(l).unwrap();
        }
        stack
    }

    #[test]
    fn lifo_order() {
        let mut stack = stack_of(&["a", "b", "c"]);
        assert_eq!(stack.peek(), Some("c"));
        assert_eq!(stack.pop().unwrap().value, "c");
        assert_eq!(stack.pop().unwrap().value, "b");
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.peek(), Some("a"));
    }

    #[test]
    fn pop_empty_is_error() {
        let mut stack = StackEngine::new();
        assert_eq!(stack.pop(), Err(EngineError::Empty));
        assert_eq!(stack.peek(), None);
    }

    #[test]
    fn duplicates_allowed_with_distinct_ids() {
        let mut stack = StackEngine::new();
        let a = stack.push("x").unwrap().value;
        let b = stack.push("x").unwrap().value;
        assert_ne!(a, b);
        assert_eq!(stack.labels(), vec!["x", "x"]);
    }

    #[test]
    fn push_retones_top() {
        let mut stack = stack_of(&["a"]);
        let old_top = stack.items[0].id;
        let pushed = stack.push("b").unwrap();
        let t = &pushed.timeline;
        assert_eq!(t.tones_at(t.len()).get(&pushed.value), Some(&Tone::Top));
        assert_eq!(t.tones_at(t.len()).get(&old_top), None);
    }

    #[test]
    fn search_scans_top_down() {
        let stack = stack_of(&["a", "b", "a", "c"]);
        let found = stack.search("a").unwrap();
        // visits c then the upper a
        assert_eq!(found.value, Some(1));
        let visited: Vec<_> = found
            .timeline
            .events()
            .iter()
            .filter(|e| matches!(e.kind, StepKind::Highlight { .. }))
            .map(|e| e.target)
            .collect();
        assert_eq!(visited, vec![stack.items[3].id, stack.items[2].id]);
        assert_eq!(
            found.timeline.notice().unwrap().text,
            "Found value \"a\" at position 2"
        );
    }

    #[test]
    fn search_miss_keeps_state() {
        let stack = stack_of(&["a", "b"]);
        let before = stack.snapshot();
        let miss = stack.search("z").unwrap();
        assert_eq!(miss.value, None);
        assert_eq!(miss.timeline.notice().unwrap().text, "Value \"z\" not found in stack.");
        assert_eq!(stack.snapshot(), before);
        // top ends in its resting tone
        let tones = miss.timeline.tones_at(miss.timeline.len());
        assert_eq!(tones.get(&stack.items[1].id), Some(&Tone::Top));
    }

    #[test]
    fn readouts() {
        let mut stack = StackEngine::new();
        assert_eq!(stack.snapshot().readout("top"), Some("null"));
        stack.push("q").unwrap();
        let snap = stack.snapshot();
        assert_eq!(snap.readout("top"), Some("q"));
        assert_eq!(snap.readout("size"), Some("1"));
    }

    #[test]
    fn clear_removes_all() {
        let mut stack = stack_of(&["a", "b"]);
        let cleared = StackEngine::clear(&mut stack);
        assert_eq!(cleared.value, 2);
        assert_eq!(cleared.timeline.len(), 2);
        assert!(stack.is_empty());
    }

    #[test]
    fn ids_survive_clear() {
        let mut stack = StackEngine::new();
        let first = stack.push("a").unwrap().value;
        StackEngine::clear(&mut stack);
        let second = stack.push("a").unwrap().value;
        assert_ne!(first, second);
        assert!(stack.snapshot().node(first).is_none());
        assert!(stack.snapshot().node(second).is_some());
    }
}
