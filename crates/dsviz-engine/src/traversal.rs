//! Read-only traversals shared by the tree-shaped engines.
//!
//! Each engine exposes its shape through [`TreeShape`]; the orders are
//! computed from the current root on every call and never cached.

use std::collections::VecDeque;

/// A binary tree addressed by some node handle.
pub trait TreeShape {
    /// Handle to a live node (array index, arena slot, ...).
    type Node: Copy;

    fn root(&self) -> Option<Self::Node>;
    fn left(&self, node: Self::Node) -> Option<Self::Node>;
    fn right(&self, node: Self::Node) -> Option<Self::Node>;
}

/// Depth-first visiting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Order {
    Pre,
    In,
    Post,
    Level,
}

impl Order {
    pub const ALL: [Order; 4] = [Order::Pre, Order::In, Order::Post, Order::Level];

    /// Readout label (`preorder`, `inorder`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            Order::Pre => "preorder",
            Order::In => "inorder",
            Order::Post => "postorder",
            Order::Level => "levelorder",
        }
    }
}

pub fn traverse<T: TreeShape>(tree: &T, order: Order) -> Vec<T::Node> {
    match order {
        Order::Pre => preorder(tree),
        Order::In => inorder(tree),
        Order::Post => postorder(tree),
        Order::Level => levelorder(tree),
    }
}

pub fn preorder<T: TreeShape>(tree: &T) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut stack: Vec<T::Node> = tree.root().into_iter().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        // right first so left is visited first
        if let Some(r) = tree.right(node) {
            stack.push(r);
        }
        if let Some(l) = tree.left(node) {
            stack.push(l);
        }
    }
    out
}

pub fn inorder<T: TreeShape>(tree: &T) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut stack = Vec::new();
    let mut cursor = tree.root();
    loop {
        while let Some(node) = cursor {
            stack.push(node);
            cursor = tree.left(node);
        }
        match stack.pop() {
            Some(node) => {
                out.push(node);
                cursor = tree.right(node);
            }
            None => break,
        }
    }
    out
}

pub fn postorder<T: TreeShape>(tree: &T) -> Vec<T::Node> {
    // Reverse of a root-right-left preorder.
    let mut out = Vec::new();
    let mut stack: Vec<T::Node> = tree.root().into_iter().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        if let Some(l) = tree.left(node) {
            stack.push(l);
        }
        if let Some(r) = tree.right(node) {
            stack.push(r);
        }
    }
    out.reverse();
    out
}

pub fn levelorder<T: TreeShape>(tree: &T) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut queue: VecDeque<T::Node> = tree.root().into_iter().collect();
    while let Some(node) = queue.pop_front() {
        out.push(node);
        if let Some(l) = tree.left(node) {
            queue.push_back(l);
        }
        if let Some(r) = tree.right(node) {
            queue.push_back(r);
        }
    }
    out
}

/// Number of levels; 0 for an empty tree.
pub fn height<T: TreeShape>(tree: &T) -> usize {
    let mut levels = 0;
    let mut frontier: Vec<T::Node> = tree.root().into_iter().collect();
    while !frontier.is_empty() {
        levels += 1;
        frontier = frontier
            .into_iter()
            .flat_map(|n| [tree.left(n), tree.right(n)])
            .flatten()
            .collect();
    }
    levels
}

/// Join display values the way the readouts show them: `"a, b, c"`.
pub fn join<I, D>(values: I) -> String
where
    I: IntoIterator<Item = D>,
    D: std::fmt::Display,
{
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
