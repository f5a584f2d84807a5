//! Bubble sort, either replayed step by step or run continuously.
//!
//! Step mode precomputes every comparison once and moves a cursor over the
//! resulting snapshots. Run mode sorts the canonical bars up front and hands
//! back a lazy [`BubbleRun`] that yields the comparison events for the
//! player to pace.

use std::collections::{HashMap, VecDeque};

use rand::Rng;

use crate::config::{RandomArray, StepDurations};
use crate::engine::{Animated, Engine, Outcome, StructureKind};
use crate::error::Result;
use crate::invariant;
use crate::layout::{self, PositionHint};
use crate::snapshot::{NodeView, Snapshot};
use crate::timeline::{Notice, StepEvent, StepKind, StepTimeline, Tone};
use crate::value::{parse_number, Element, ElementId, IdAllocator, ScalarValue};

/// One recorded comparison of adjacent bars `a` and `b = a + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortStep {
    pub a: usize,
    pub b: usize,
    pub swapped: bool,
    /// Values after this step
    pub snapshot: Vec<i64>,
    /// Bar identities after this step, aligned with `snapshot`
    pub order: Vec<ElementId>,
}

#[derive(Debug, Clone, Default)]
pub struct BubbleSortEngine {
    bars: Vec<Element<i64>>,
    /// Bars as they were when the steps were prepared
    origin: Vec<Element<i64>>,
    steps: Vec<SortStep>,
    cursor: usize,
    ids: IdAllocator,
    durations: StepDurations,
}

impl BubbleSortEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(durations: StepDurations) -> Self {
        Self {
            durations,
            ..Self::default()
        }
    }

    fn layout(&self) -> Vec<(ElementId, PositionHint)> {
        self.bars
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, PositionHint::linear(i)))
            .collect()
    }

    fn layout_map(&self) -> HashMap<ElementId, PositionHint> {
        self.layout().into_iter().collect()
    }

    fn invalidate_steps(&mut self) {
        self.steps.clear();
        self.origin.clear();
        self.cursor = 0;
    }

    /// Replace every bar with fresh ones holding `values`.
    pub fn load(&mut self, values: impl IntoIterator<Item = i64>) -> Animated<usize> {
        let mut timeline = StepTimeline::new();
        for bar in &self.bars {
            timeline.remove(bar.id, 0);
        }
        self.bars = values
            .into_iter()
            .map(|value| Element {
                id: self.ids.allocate(),
                value,
            })
            .collect();
        self.invalidate_steps();
        timeline.move_together(&self.layout(), self.durations.slide);
        Animated::new(self.bars.len(), timeline)
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, shape: &RandomArray, rng: &mut R) -> Animated<usize> {
        let values = shape.generate(rng);
        tracing::debug!(len = values.len(), "randomize sort input");
        self.load(values)
    }

    /// Append one bar.
    pub fn insert(&mut self, input: &str) -> Result<Animated<ElementId>> {
        let value = parse_number(input)?;
        let id = self.ids.allocate();
        let mut timeline = StepTimeline::new();
        timeline.move_to(id, PositionHint::linear(self.bars.len()), self.durations.slide);
        self.bars.push(Element { id, value });
        self.invalidate_steps();
        Ok(Animated::new(id, timeline))
    }

    /// Remove the first bar holding the value and close the gap.
    pub fn delete(&mut self, input: &str) -> Result<Animated<Option<i64>>> {
        let value = parse_number(input)?;
        let Some(index) = self.bars.iter().position(|e| e.value == value) else {
            let timeline = StepTimeline::new().with_notice(Notice::not_found(
                &value,
                StructureKind::BubbleSort.noun(),
                self.durations.notice,
            ));
            return Ok(Animated::new(None, timeline));
        };

        let before = self.layout_map();
        let removed = self.bars.remove(index);
        self.invalidate_steps();
        let mut timeline = StepTimeline::new();
        timeline.remove(removed.id, self.durations.slide);
        timeline.move_together(&layout::moved(&before, &self.layout()), self.durations.slide);
        Ok(Animated::new(Some(removed.value), timeline))
    }

    pub fn search(&self, input: &str) -> Result<Animated<Option<usize>>> {
        let value = parse_number(input)?;
        let mut timeline = StepTimeline::new();
        for (position, bar) in self.bars.iter().enumerate() {
            timeline.highlight(bar.id, Tone::Visiting, self.durations.visit);
            if bar.value == value {
                timeline.recolor(bar.id, Tone::Found, 0);
                timeline.set_notice(Notice::found_at(
                    &value,
                    "position",
                    position,
                    self.durations.notice,
                ));
                return Ok(Animated::new(Some(position), timeline));
            }
            timeline.recolor(bar.id, Tone::Default, 0);
        }
        timeline.set_notice(Notice::not_found(
            &value,
            StructureKind::BubbleSort.noun(),
            self.durations.notice,
        ));
        Ok(Animated::new(None, timeline))
    }

    pub fn clear(&mut self) -> Animated<usize> {
        let mut timeline = StepTimeline::new();
        for bar in &self.bars {
            timeline.remove(bar.id, 0);
        }
        let count = self.bars.len();
        self.bars.clear();
        self.invalidate_steps();
        Animated::new(count, timeline)
    }

    /// Record the full comparison schedule from the current bars and rewind
    /// the cursor. Returns the number of steps.
    pub fn prepare_steps(&mut self) -> usize {
        let mut values: Vec<i64> = self.bars.iter().map(|e| e.value).collect();
        let mut order: Vec<ElementId> = self.bars.iter().map(|e| e.id).collect();
        let n = values.len();
        let mut steps = Vec::with_capacity(n * n.saturating_sub(1) / 2);

        for pass in 0..n.saturating_sub(1) {
            for a in 0..n - 1 - pass {
                let b = a + 1;
                let swapped = values[a] > values[b];
                if swapped {
                    values.swap(a, b);
                    order.swap(a, b);
                }
                steps.push(SortStep {
                    a,
                    b,
                    swapped,
                    snapshot: values.clone(),
                    order: order.clone(),
                });
            }
        }
        invariant::enforce(invariant::ascending(&values));

        tracing::debug!(bars = n, steps = steps.len(), "prepared bubble sort steps");
        self.origin = self.bars.clone();
        self.steps = steps;
        self.cursor = 0;
        self.steps.len()
    }

    fn restore(&mut self, applied: usize) {
        self.bars = match applied.checked_sub(1).and_then(|k| self.steps.get(k)) {
            Some(step) => step
                .order
                .iter()
                .zip(&step.snapshot)
                .map(|(&id, &value)| Element { id, value })
                .collect(),
            None => self.origin.clone(),
        };
        self.cursor = applied;
    }

    /// Apply the step under the cursor. `None` once every step is applied.
    pub fn step_forward(&mut self) -> Option<Animated<SortStep>> {
        let step = self.steps.get(self.cursor)?.clone();
        let (id_a, id_b) = (self.bars[step.a].id, self.bars[step.b].id);
        let mut timeline = StepTimeline::new();
        timeline.highlight(id_a, Tone::Compared, 0);
        timeline.highlight(id_b, Tone::Compared, self.durations.compare);
        if step.swapped {
            timeline.swap(id_a, id_b, self.durations.compare);
            timeline.recolor(id_a, Tone::Swapped, 0);
        }

        self.restore(self.cursor + 1);
        if self.cursor == self.steps.len() {
            for bar in &self.bars {
                timeline.recolor(bar.id, Tone::Sorted, 0);
            }
        }
        Some(Animated::new(step, timeline))
    }

    /// Rewind two cached snapshots and replay one step forward, landing one
    /// step back. A no-op with fewer than two steps applied.
    pub fn step_backward(&mut self) -> Option<Animated<SortStep>> {
        if self.cursor <= 1 {
            return None;
        }
        self.restore(self.cursor - 2);
        self.step_forward()
    }

    /// Sort the bars now and return the lazy event stream that animates it.
    ///
    /// Nothing is precomputed; step-back is unavailable for a run.
    pub fn run_animated(&mut self, speed: f64) -> BubbleRun {
        let run = BubbleRun::new(&self.bars, self.durations.compare_at(speed));
        // bubble sort is stable, so a stable sort settles ids identically
        self.bars.sort_by_key(|e| e.value);
        self.invalidate_steps();
        tracing::debug!(bars = self.bars.len(), delay_ms = run.delay, "bubble sort run");
        run
    }

    pub fn steps(&self) -> &[SortStep] {
        &self.steps
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn values(&self) -> Vec<i64> {
        self.bars.iter().map(|e| e.value).collect()
    }

    pub fn is_sorted(&self) -> bool {
        invariant::ascending(&self.values()).is_ok()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl Engine for BubbleSortEngine {
    fn kind(&self) -> StructureKind {
        StructureKind::BubbleSort
    }

    fn insert(&mut self, input: &str) -> Outcome {
        BubbleSortEngine::insert(self, input).into()
    }

    fn delete(&mut self, input: &str) -> Outcome {
        BubbleSortEngine::delete(self, input).into()
    }

    fn search(&self, input: &str) -> Outcome {
        BubbleSortEngine::search(self, input).into()
    }

    fn clear(&mut self) -> Outcome {
        Outcome::Animated(BubbleSortEngine::clear(self).timeline)
    }

    fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new(StructureKind::BubbleSort);
        snap.nodes = self
            .bars
            .iter()
            .enumerate()
            .map(|(i, e)| {
                NodeView::new(e.id, ScalarValue::Int(e.value), PositionHint::linear(i)).with_slot(i)
            })
            .collect();
        snap.push_readout("size", self.len().to_string());
        snap.push_readout("step", format!("{}/{}", self.cursor, self.steps.len()));
        snap.push_readout("sorted", self.is_sorted().to_string());
        snap
    }

    fn len(&self) -> usize {
        self.bars.len()
    }
}

/// Live bubble sort over a private copy of the bars.
///
/// Each comparison lights the pair, swaps if needed, then settles both; the
/// last bar of every pass turns [`Tone::Sorted`], and bar 0 at the very end.
#[derive(Debug, Clone)]
pub struct BubbleRun {
    values: Vec<i64>,
    ids: Vec<ElementId>,
    pass: usize,
    next: usize,
    delay: u64,
    pending: VecDeque<StepEvent>,
    done: bool,
}

impl BubbleRun {
    fn new(bars: &[Element<i64>], delay: u64) -> Self {
        Self {
            values: bars.iter().map(|e| e.value).collect(),
            ids: bars.iter().map(|e| e.id).collect(),
            pass: 0,
            next: 0,
            delay,
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Per-comparison delay in milliseconds.
    pub fn delay_ms(&self) -> u64 {
        self.delay
    }

    /// Values as far as the run has progressed.
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    fn emit(&mut self, target: ElementId, kind: StepKind, duration_hint_ms: u64) {
        self.pending.push_back(StepEvent {
            target,
            kind,
            duration_hint_ms,
        });
    }

    fn settle(&mut self, target: ElementId) {
        self.emit(target, StepKind::Recolor { tone: Tone::Sorted, label: None }, 0);
    }

    /// Queue the events of the next comparison or pass boundary.
    fn advance(&mut self) -> bool {
        let n = self.values.len();
        if self.done || n == 0 {
            self.done = true;
            return false;
        }
        if self.pass + 1 >= n {
            self.settle(self.ids[0]);
            self.done = true;
            return true;
        }

        let end = n - 1 - self.pass;
        if self.next < end {
            let (a, b) = (self.next, self.next + 1);
            let (id_a, id_b) = (self.ids[a], self.ids[b]);
            self.emit(id_a, StepKind::Highlight { tone: Tone::Compared }, 0);
            self.emit(id_b, StepKind::Highlight { tone: Tone::Compared }, self.delay);
            if self.values[a] > self.values[b] {
                self.emit(id_a, StepKind::Swap { with: id_b }, self.delay);
                self.values.swap(a, b);
                self.ids.swap(a, b);
            }
            for id in [id_a, id_b] {
                self.emit(id, StepKind::Recolor { tone: Tone::Default, label: None }, 0);
            }
            self.next += 1;
        } else {
            self.settle(self.ids[end]);
            self.pass += 1;
            self.next = 0;
        }
        true
    }
}

impl Iterator for BubbleRun {
    type Item = StepEvent;

    fn next(&mut self) -> Option<StepEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if !self.advance() {
                return None;
            }
        }
    }
}
