//! The single engine capability and the closed set of structure kinds.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::array_tree::ArrayTreeEngine;
use crate::bst::BstEngine;
use crate::bubble_sort::BubbleSortEngine;
use crate::config::StepDurations;
use crate::error::{EngineError, Result};
use crate::heap::MaxHeapEngine;
use crate::list::ListEngine;
use crate::queue::QueueEngine;
use crate::snapshot::Snapshot;
use crate::stack::StackEngine;
use crate::timeline::StepTimeline;

/// Every visualizable structure and algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StructureKind {
    Stack,
    Queue,
    LinkedList,
    BinaryTree,
    BinarySearchTree,
    MaxHeap,
    BubbleSort,
}

impl StructureKind {
    pub const ALL: [StructureKind; 7] = [
        StructureKind::Stack,
        StructureKind::Queue,
        StructureKind::LinkedList,
        StructureKind::BinaryTree,
        StructureKind::BinarySearchTree,
        StructureKind::MaxHeap,
        StructureKind::BubbleSort,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StructureKind::Stack => "stack",
            StructureKind::Queue => "queue",
            StructureKind::LinkedList => "linked_list",
            StructureKind::BinaryTree => "binary_tree",
            StructureKind::BinarySearchTree => "binary_search_tree",
            StructureKind::MaxHeap => "max_heap",
            StructureKind::BubbleSort => "bubble_sort",
        }
    }

    /// Noun used in not-found notices.
    pub fn noun(&self) -> &'static str {
        match self {
            StructureKind::Stack => "stack",
            StructureKind::Queue => "queue",
            StructureKind::LinkedList => "list",
            StructureKind::BinaryTree | StructureKind::BinarySearchTree => "tree",
            StructureKind::MaxHeap => "heap",
            StructureKind::BubbleSort => "array",
        }
    }

    /// Whether values must parse as integers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            StructureKind::BinarySearchTree | StructureKind::MaxHeap | StructureKind::BubbleSort
        )
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown structure kind: {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for StructureKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        StructureKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| UnknownKind(s.to_owned()))
    }
}

/// An operation's result together with the steps that animate it.
#[derive(Debug, Clone, PartialEq)]
pub struct Animated<T> {
    pub value: T,
    pub timeline: StepTimeline,
}

impl<T> Animated<T> {
    pub fn new(value: T, timeline: StepTimeline) -> Self {
        Self { value, timeline }
    }
}

/// What the command layer hands back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State may have changed; play the timeline then render the snapshot.
    /// Misses land here too, carrying a not-found notice.
    Animated(StepTimeline),
    /// Silent no-op: nothing changed and nothing should be drawn
    Ignored(EngineError),
}

impl Outcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Outcome::Ignored(_))
    }

    pub fn timeline(&self) -> Option<&StepTimeline> {
        match self {
            Outcome::Animated(t) => Some(t),
            Outcome::Ignored(_) => None,
        }
    }

    pub fn into_timeline(self) -> Option<StepTimeline> {
        match self {
            Outcome::Animated(t) => Some(t),
            Outcome::Ignored(_) => None,
        }
    }
}

impl<T> From<Result<Animated<T>>> for Outcome {
    fn from(result: Result<Animated<T>>) -> Self {
        match result {
            Ok(animated) => Outcome::Animated(animated.timeline),
            Err(err) => {
                tracing::trace!(error = %err, "command ignored");
                Outcome::Ignored(err)
            }
        }
    }
}

/// Common command surface over every structure.
///
/// Input is the raw text the user typed; each engine validates it.
/// `search` borrows immutably, so a search can never change canonical state.
pub trait Engine {
    fn kind(&self) -> StructureKind;
    fn insert(&mut self, input: &str) -> Outcome;
    fn delete(&mut self, input: &str) -> Outcome;
    fn search(&self, input: &str) -> Outcome;
    fn clear(&mut self) -> Outcome;
    fn snapshot(&self) -> Snapshot;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One engine of any kind. A session owns exactly one.
#[derive(Debug, Clone)]
pub enum AnyEngine {
    Stack(StackEngine),
    Queue(QueueEngine),
    LinkedList(ListEngine),
    BinaryTree(ArrayTreeEngine),
    BinarySearchTree(BstEngine),
    MaxHeap(MaxHeapEngine),
    BubbleSort(BubbleSortEngine),
}

macro_rules! dispatch {
    ($self:expr, $e:ident => $body:expr) => {
        match $self {
            AnyEngine::Stack($e) => $body,
            AnyEngine::Queue($e) => $body,
            AnyEngine::LinkedList($e) => $body,
            AnyEngine::BinaryTree($e) => $body,
            AnyEngine::BinarySearchTree($e) => $body,
            AnyEngine::MaxHeap($e) => $body,
            AnyEngine::BubbleSort($e) => $body,
        }
    };
}

impl AnyEngine {
    pub fn new(kind: StructureKind, durations: StepDurations) -> Self {
        match kind {
            StructureKind::Stack => AnyEngine::Stack(StackEngine::with_durations(durations)),
            StructureKind::Queue => AnyEngine::Queue(QueueEngine::with_durations(durations)),
            StructureKind::LinkedList => {
                AnyEngine::LinkedList(ListEngine::with_durations(durations))
            }
            StructureKind::BinaryTree => {
                AnyEngine::BinaryTree(ArrayTreeEngine::with_durations(durations))
            }
            StructureKind::BinarySearchTree => {
                AnyEngine::BinarySearchTree(BstEngine::with_durations(durations))
            }
            StructureKind::MaxHeap => AnyEngine::MaxHeap(MaxHeapEngine::with_durations(durations)),
            StructureKind::BubbleSort => {
                AnyEngine::BubbleSort(BubbleSortEngine::with_durations(durations))
            }
        }
    }

    /// Insert at the head of a linked list; other kinds don't support it.
    pub fn insert_front(&mut self, input: &str) -> Outcome {
        match self {
            AnyEngine::LinkedList(list) => list.insert_front(input).into(),
            other => Outcome::Ignored(EngineError::Unsupported {
                kind: other.kind(),
                op: "insert_front",
            }),
        }
    }

    pub fn as_sort(&self) -> Option<&BubbleSortEngine> {
        match self {
            AnyEngine::BubbleSort(sort) => Some(sort),
            _ => None,
        }
    }

    pub fn as_sort_mut(&mut self) -> Option<&mut BubbleSortEngine> {
        match self {
            AnyEngine::BubbleSort(sort) => Some(sort),
            _ => None,
        }
    }
}

impl Engine for AnyEngine {
    fn kind(&self) -> StructureKind {
        dispatch!(self, e => e.kind())
    }

    fn insert(&mut self, input: &str) -> Outcome {
        dispatch!(self, e => Engine::insert(e, input))
    }

    fn delete(&mut self, input: &str) -> Outcome {
        dispatch!(self, e => Engine::delete(e, input))
    }

    fn search(&self, input: &str) -> Outcome {
        dispatch!(self, e => Engine::search(e, input))
    }

    fn clear(&mut self) -> Outcome {
        dispatch!(self, e => Engine::clear(e))
    }

    fn snapshot(&self) -> Snapshot {
        dispatch!(self, e => e.snapshot())
    }

    fn len(&self) -> usize {
        dispatch!(self, e => Engine::len(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn kind_parses_from_route_keys() {
        assert_eq!("stack".parse(), Ok(StructureKind::Stack));
        assert_eq!("Max-Heap".parse(), Ok(StructureKind::MaxHeap));
        assert_eq!(" linked_list ".parse(), Ok(StructureKind::LinkedList));
        assert!("graph".parse::<StructureKind>().is_err());
        for kind in StructureKind::ALL {
            assert_eq!(kind.as_str().parse(), Ok(kind));
        }
    }

    #[test]
    fn every_kind_builds_an_empty_engine() {
        for kind in StructureKind::ALL {
            let engine = AnyEngine::new(kind, StepDurations::default());
            assert_eq!(engine.kind(), kind);
            if kind != StructureKind::BubbleSort {
                assert!(engine.is_empty(), "{kind} should start empty");
            }
        }
    }

    #[test]
    fn blank_input_is_ignored_everywhere() {
        for kind in StructureKind::ALL {
            let mut engine = AnyEngine::new(kind, StepDurations::default());
            let before = engine.snapshot();
            let outcome = engine.insert("   ");
            assert_eq!(
                outcome,
                Outcome::Ignored(EngineError::Validation(ValidationError::Blank)),
                "{kind}"
            );
            assert_eq!(engine.snapshot(), before);
        }
    }

    #[test]
    fn numeric_kinds_ignore_words() {
        for kind in StructureKind::ALL.into_iter().filter(|k| k.is_numeric()) {
            let mut engine = AnyEngine::new(kind, StepDurations::default());
            let before = engine.snapshot();
            assert!(engine.insert("abc").is_ignored(), "{kind}");
            assert_eq!(engine.snapshot(), before);
        }
    }

    #[test]
    fn insert_front_only_on_lists() {
        let mut list = AnyEngine::new(StructureKind::LinkedList, StepDurations::default());
        assert!(!list.insert_front("a").is_ignored());

        let mut stack = AnyEngine::new(StructureKind::Stack, StepDurations::default());
        assert_eq!(
            stack.insert_front("a"),
            Outcome::Ignored(EngineError::Unsupported {
                kind: StructureKind::Stack,
                op: "insert_front",
            })
        );
    }

    #[test]
    fn missed_search_still_animates() {
        let mut engine = AnyEngine::new(StructureKind::Queue, StepDurations::default());
        engine.insert("a");
        let outcome = engine.search("z");
        let timeline = outcome.timeline().expect("miss should animate");
        assert_eq!(timeline.len(), 2);
        assert!(timeline.notice().is_some());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn kind() -> impl Strategy<Value = StructureKind> {
            prop::sample::select(StructureKind::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn missed_search_leaves_state_alone(
                kind in kind(),
                values in prop::collection::vec(0i64..30, 0..20),
            ) {
                let mut engine = AnyEngine::new(kind, StepDurations::default());
                for v in &values {
                    engine.insert(&v.to_string());
                }
                let before = engine.snapshot();
                let outcome = engine.search("999");
                prop_assert!(!outcome.is_ignored());
                prop_assert!(outcome.timeline().and_then(|t| t.notice()).is_some());
                prop_assert_eq!(engine.snapshot(), before);
            }
        }
    }
}
