//! Work-item tree: the ownership tree of task nodes a workflow operates on.
//!
//! The root node is the problem being worked, depth-1 nodes are subtasks and
//! depth-2 nodes are review findings. All parent/sibling/path queries are
//! computed on demand by walking from the root, so nodes never hold
//! back-references.

use serde::{Deserialize, Serialize};

/// Maximum node depth: root = 0, subtask = 1, finding = 2.
pub const MAX_DEPTH: usize = 2;

/// A unit of work tracked in the external issue tracker.
///
/// Children preserve creation order; "next sibling" semantics depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            children: Vec::new(),
        }
    }

    /// Find a node anywhere in this subtree by id.
    pub fn find(&self, id: &str) -> Option<&TaskNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Find a node mutably anywhere in this subtree by id.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut TaskNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// The parent of the node with the given id, if it exists below this node.
    pub fn parent_of(&self, id: &str) -> Option<&TaskNode> {
        if self.children.iter().any(|c| c.id == id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.parent_of(id))
    }

    /// Ordered id sequence from this node down to the node with the given id.
    pub fn path_to(&self, id: &str) -> Option<Vec<String>> {
        if self.id == id {
            return Some(vec![self.id.clone()]);
        }
        for child in &self.children {
            if let Some(mut path) = child.path_to(id) {
                path.insert(0, self.id.clone());
                return Some(path);
            }
        }
        None
    }

    /// The sibling created immediately after the node with the given id.
    pub fn next_sibling_of(&self, id: &str) -> Option<&TaskNode> {
        let parent = self.parent_of(id)?;
        let pos = parent.children.iter().position(|c| c.id == id)?;
        parent.children.get(pos + 1)
    }

    /// Every id in this subtree, preorder.
    pub fn collect_ids(&self) -> Vec<String> {
        let mut ids = vec![self.id.clone()];
        for child in &self.children {
            ids.extend(child.collect_ids());
        }
        ids
    }

    /// Depth of the deepest node in this subtree (self = 0).
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.max_depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Append a child under the node with the given parent id.
    ///
    /// Returns false if the parent does not exist in this subtree.
    pub fn insert_child(&mut self, parent_id: &str, child: TaskNode) -> bool {
        match self.find_mut(parent_id) {
            Some(parent) => {
                parent.children.push(child);
                true
            }
            None => false,
        }
    }
}
