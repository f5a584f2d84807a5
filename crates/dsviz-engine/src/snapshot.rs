//! Immutable read model the renderer maps to screen space.

use crate::engine::StructureKind;
use crate::layout::PositionHint;
use crate::value::{ElementId, ScalarValue};

/// The literal empty reads render as.
pub const NULL: &str = "null";

/// Render an optional read, `"null"` when absent.
pub fn or_null<D: std::fmt::Display>(value: Option<D>) -> String {
    value.map_or_else(|| NULL.to_owned(), |v| v.to_string())
}

/// One element as the renderer sees it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeView {
    pub id: ElementId,
    pub value: ScalarValue,
    pub position: PositionHint,
    /// Backing array index, for index-addressed structures
    pub slot: Option<usize>,
    pub parent: Option<ElementId>,
    pub left: Option<ElementId>,
    pub right: Option<ElementId>,
    /// Successor in a linear structure
    pub next: Option<ElementId>,
}

impl NodeView {
    pub fn new(id: ElementId, value: ScalarValue, position: PositionHint) -> Self {
        Self {
            id,
            value,
            position,
            slot: None,
            parent: None,
            left: None,
            right: None,
            next: None,
        }
    }

    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn with_links(
        mut self,
        parent: Option<ElementId>,
        left: Option<ElementId>,
        right: Option<ElementId>,
    ) -> Self {
        self.parent = parent;
        self.left = left;
        self.right = right;
        self
    }
}

/// A labelled scalar read (`top`, `size`, `inorder`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Readout {
    pub label: String,
    pub value: String,
}

impl Readout {
    pub fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_owned(),
            value: value.into(),
        }
    }
}

/// Structural state at one instant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub kind: StructureKind,
    /// Elements in the structure's natural order (discipline, index, or
    /// level order for the search tree)
    pub nodes: Vec<NodeView>,
    pub readouts: Vec<Readout>,
}

impl Snapshot {
    pub fn new(kind: StructureKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            readouts: Vec::new(),
        }
    }

    pub fn readout(&self, label: &str) -> Option<&str> {
        self.readouts
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }

    pub fn push_readout(&mut self, label: &str, value: impl Into<String>) {
        self.readouts.push(Readout::new(label, value));
    }

    pub fn node(&self, id: ElementId) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
