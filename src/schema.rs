//! List model types: hierarchy levels, category nodes and content leaves.

use serde::Serialize;

/// One hierarchy level column, in header order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyLevel {
    /// 1-indexed level number (level 1 is the topmost column).
    pub number: usize,
    pub column: String,
    /// Position of the column in the dataset header.
    #[serde(skip)]
    pub index: usize,
}

/// A distinct category observed at one level of the hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub level: usize,
    pub name: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    /// Identifier of the row that first produced this node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

// `source_id` is trace metadata and never part of node identity.
impl PartialEq for CategoryNode {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level
            && self.name == other.name
            && self.parent == other.parent
            && self.children == other.children
    }
}

impl Eq for CategoryNode {}

/// All nodes recorded for one level, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLevel {
    pub level: usize,
    pub column: String,
    pub nodes: Vec<CategoryNode>,
}

impl CategoryLevel {
    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<&CategoryNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// The content fact carried by one row, anchored to its deepest filled level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentLeaf {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: Option<String>,
    pub control: Option<String>,
    pub values: Option<String>,
    pub parent_label: Option<String>,
    pub parent_level: Option<usize>,
}

/// Output of the tree builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListModel {
    pub categories: Vec<CategoryLevel>,
    pub content: Vec<ContentLeaf>,
}

/// Rendered text: one entry per hierarchy level and one per content leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedListModel {
    pub path: Vec<String>,
    pub content: Vec<String>,
}
