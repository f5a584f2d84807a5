//! Element identity and the scalar values structures carry.

use std::fmt;

use crate::error::ValidationError;

/// Stable identity of a structure element.
///
/// Assigned when the element is created and never handed out again by the
/// same engine, so two elements holding equal values stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source, one per engine instance.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id. Clearing a structure does not rewind this.
    pub fn allocate(&mut self) -> ElementId {
        let id = ElementId(self.next);
        self.next += 1;
        id
    }
}

/// An identified element of a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<V> {
    pub id: ElementId,
    pub value: V,
}

/// Display value of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ScalarValue {
    /// Ordered structures (BST, max-heap, bubble sort)
    Int(i64),
    /// Label structures (stack, queue, list, array tree)
    Label(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{v}"),
            ScalarValue::Label(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Label(value.to_owned())
    }
}

/// Trim free-form input into a label, rejecting blank input.
pub fn parse_label(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank);
    }
    Ok(trimmed.to_owned())
}

/// Parse free-form input into a signed integer.
///
/// Blank input is `Blank`; anything else that isn't a base-10 `i64` is
/// `NotANumber`.
pub fn parse_number(input: &str) -> Result<i64, ValidationError> {
    let trimmed = parse_label(input)?;
    trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber(trimmed))
}
