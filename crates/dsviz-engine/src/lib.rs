//! dsviz engine
//!
//! Canonical state for the classic teaching structures, and the step
//! timelines that animate every operation on them.
//!
//! # Structures
//!
//! - stack, queue and singly linked list over text labels
//! - index-addressed binary tree with gap reuse
//! - binary search tree and max-heap over unique integers
//! - bubble sort with precomputed step replay or a lazy live run
//!
//! # Contract
//!
//! Engines are synchronous. An operation mutates canonical state completely,
//! verifies the structure's invariants, then returns the ordered
//! [`StepEvent`]s describing what happened. Pacing and cancellation belong
//! to whoever plays the timeline, so truncating playback never leaves a
//! structure half-updated.
//!
//! Bad input (blank text, non-numbers for numeric structures, duplicates
//! for ordered ones) is an [`Outcome::Ignored`] no-op. A search or delete
//! miss still animates and carries a [`Notice`].

mod array_tree;
mod bst;
mod bubble_sort;
mod config;
mod engine;
mod error;
mod heap;
pub mod invariant;
pub mod layout;
mod list;
mod queue;
mod snapshot;
mod stack;
mod timeline;
pub mod traversal;
mod value;

pub use array_tree::ArrayTreeEngine;
pub use bst::BstEngine;
pub use bubble_sort::{BubbleRun, BubbleSortEngine, SortStep};
pub use config::{RandomArray, StepDurations};
pub use engine::{Animated, AnyEngine, Engine, Outcome, StructureKind, UnknownKind};
pub use error::{EngineError, Result, ValidationError};
pub use heap::MaxHeapEngine;
pub use invariant::InvariantViolation;
pub use layout::PositionHint;
pub use list::ListEngine;
pub use queue::QueueEngine;
pub use snapshot::{NodeView, Readout, Snapshot};
pub use stack::StackEngine;
pub use timeline::{tones_after, Notice, NoticeKind, StepEvent, StepKind, StepTimeline, Tone};
pub use traversal::{Order, TreeShape};
pub use value::{parse_label, parse_number, ElementId, ScalarValue};
