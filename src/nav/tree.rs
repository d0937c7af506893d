//! The normalized navigation tree.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One node of a table of contents.
///
/// The root of a tree carries the navigation title and no href; its
/// children are the top-level entries. A node with an empty href is a
/// grouping node. Child order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub href: String,
    #[serde(default, rename = "items", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocNode>,
}

impl TocNode {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    /// A node without a link target.
    pub fn group(title: impl Into<String>) -> Self {
        Self::new(title, "")
    }

    pub fn with_child(mut self, child: TocNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: TocNode) {
        self.children.push(child);
    }

    pub fn is_group(&self) -> bool {
        self.href.is_empty()
    }

    /// True for a tree with no title and no entries.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.href.is_empty() && self.children.is_empty()
    }

    /// Visit every node below this one in pre-order.
    ///
    /// Direct children are reported at depth 0.
    pub fn walk<F: FnMut(&TocNode, usize)>(&self, mut visit: F) {
        fn go<F: FnMut(&TocNode, usize)>(nodes: &[TocNode], depth: usize, visit: &mut F) {
            for node in nodes {
                visit(node, depth);
                go(&node.children, depth + 1, visit);
            }
        }
        go(&self.children, 0, &mut visit);
    }

    /// All descendants in pre-order, without their children.
    pub fn flatten(&self) -> Vec<TocNode> {
        let mut flat = Vec::new();
        self.walk(|node, _| flat.push(TocNode::new(&node.title, &node.href)));
        flat
    }

    /// Descendants at one nesting depth, without their children.
    pub fn at_depth(&self, level: usize) -> Vec<TocNode> {
        let mut nodes = Vec::new();
        self.walk(|node, depth| {
            if depth == level {
                nodes.push(TocNode::new(&node.title, &node.href));
            }
        });
        nodes
    }

    /// Number of nesting levels below this node.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of descendants.
    pub fn len(&self) -> usize {
        self.children.iter().map(|child| child.len() + 1).sum()
    }

    /// Target for the generated `bodymatter` landmark.
    ///
    /// The first child of the first entry (pre-order) that has children;
    /// for a flat tree, the first entry. Any nested parent has a parent
    /// among the top-level entries, so only those need scanning.
    pub fn landmark(&self) -> Option<&TocNode> {
        self.children
            .iter()
            .find(|node| !node.children.is_empty())
            .and_then(|parent| parent.children.first())
            .or_else(|| self.children.first())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
