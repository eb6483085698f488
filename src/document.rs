//! The persisted workflow document and its invariants.
//!
//! One document per workflow. It is created when a root work item is selected
//! for work, mutated only by accepted transitions, and validated in full on
//! every load and before every save; a violation is a hard stop, never
//! silently repaired.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineFault;
use crate::state_machine::{PointerMove, Snapshot, WorkflowState};
use crate::tree::{MAX_DEPTH, TaskNode};

/// Expected document schema version. A mismatch on load is a hard error;
/// there is no migration logic.
pub const SCHEMA_VERSION: u32 = 1;

/// Sentinel for `session_binding` meaning "not yet bound to a conversation
/// thread; bind on next resume".
pub const UNBOUND_SESSION: &str = "unbound";

/// Audit record of the most recent accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub event: String,
    pub from_state: WorkflowState,
    pub to_state: WorkflowState,
    pub from_active_id: String,
    pub to_active_id: String,
    pub timestamp: DateTime<Utc>,
}

/// The workflow document persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    pub schema_version: u32,
    pub root: TaskNode,
    pub state: WorkflowState,
    pub active_task_id: String,
    /// Redundant with the tree, deliberately: catches tree/pointer
    /// desynchronization at validation time.
    pub active_path_ids: Vec<String>,
    pub session_binding: String,
    /// Replay dedup cursor: the last assistant turn whose transition effects
    /// were applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_consumed_message_id: Option<String>,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition: Option<TransitionRecord>,
}

/// A ticket created by the effect interpreter, reported back so the tree can
/// be extended to match the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTicket {
    pub parent_id: String,
    pub id: String,
    pub title: String,
}

impl WorkflowDocument {
    /// Fresh document for a newly selected root work item: depth 0, state
    /// `refine`, version 1, unbound session.
    pub fn bootstrap(root_id: impl Into<String>, title: impl Into<String>) -> Self {
        let root = TaskNode::new(root_id, title);
        let active = root.id.clone();
        Self {
            schema_version: SCHEMA_VERSION,
            active_path_ids: vec![active.clone()],
            active_task_id: active,
            root,
            state: WorkflowState::Refine,
            session_binding: UNBOUND_SESSION.to_string(),
            last_consumed_message_id: None,
            version: 1,
            last_transition: None,
        }
    }

    /// Every invariant violation in this document, empty when valid.
    pub fn invariant_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.schema_version != SCHEMA_VERSION {
            errors.push(format!(
                "schema version {} does not match expected {}",
                self.schema_version, SCHEMA_VERSION
            ));
        }

        if self.version == 0 {
            errors.push("version must be a positive integer".into());
        }

        let ids = self.root.collect_ids();
        let mut seen = std::collections::HashSet::new();
        for id in &ids {
            if !seen.insert(id.as_str()) {
                errors.push(format!("duplicate node id '{id}'"));
            }
        }

        if self.root.max_depth() > MAX_DEPTH {
            errors.push(format!(
                "tree depth {} exceeds maximum {}",
                self.root.max_depth(),
                MAX_DEPTH
            ));
        }

        match self.root.path_to(&self.active_task_id) {
            None => errors.push(format!(
                "active task '{}' does not exist in the tree",
                self.active_task_id
            )),
            Some(path) => {
                if path != self.active_path_ids {
                    errors.push(format!(
                        "active path {:?} does not match tree-derived path {:?}",
                        self.active_path_ids, path
                    ));
                }
                let depth = path.len() - 1;
                if depth != self.state.expected_depth() {
                    errors.push(format!(
                        "active node depth {} is inconsistent with state {} (expects depth {})",
                        depth,
                        self.state,
                        self.state.expected_depth()
                    ));
                }
            }
        }

        errors
    }

    /// Hard-fail validation used by every load and save.
    pub fn validate(&self) -> Result<(), EngineFault> {
        let errors = self.invariant_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineFault::Invariants(errors.join("; ")))
        }
    }

    /// Read-only projection consumed by the transition engine.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            active_id: self.active_task_id.clone(),
            parent_id: self.root.parent_of(&self.active_task_id).map(|p| p.id.clone()),
            next_sibling_id: self
                .root
                .next_sibling_of(&self.active_task_id)
                .map(|s| s.id.clone()),
        }
    }

    /// Assemble the successor document for an accepted transition.
    ///
    /// Appends the tickets the interpreter created, resolves the symbolic
    /// pointer move, recomputes the active path, bumps `version` by exactly
    /// one and records the audit trail. The input document is untouched; a
    /// pointer that resolves to a nonexistent node is an engine fault.
    pub fn apply(
        &self,
        event_label: &str,
        next_state: WorkflowState,
        pointer: &PointerMove,
        created: &[CreatedTicket],
        consumed_message_id: Option<String>,
    ) -> Result<WorkflowDocument, EngineFault> {
        let mut root = self.root.clone();
        for ticket in created {
            // Replayed creations may already exist in the tree.
            if root.find(&ticket.id).is_some() {
                continue;
            }
            if !root.insert_child(&ticket.parent_id, TaskNode::new(&ticket.id, &ticket.title)) {
                return Err(EngineFault::PointerResolution(format!(
                    "created ticket '{}' references unknown parent '{}'",
                    ticket.id, ticket.parent_id
                )));
            }
        }

        let next_active = self.resolve_pointer(&root, pointer, created)?;
        let active_path_ids = root.path_to(&next_active).ok_or_else(|| {
            EngineFault::PointerResolution(format!("active target '{next_active}' not in tree"))
        })?;

        let record = TransitionRecord {
            event: event_label.to_string(),
            from_state: self.state,
            to_state: next_state,
            from_active_id: self.active_task_id.clone(),
            to_active_id: next_active.clone(),
            timestamp: Utc::now(),
        };

        Ok(WorkflowDocument {
            schema_version: self.schema_version,
            root,
            state: next_state,
            active_task_id: next_active,
            active_path_ids,
            session_binding: self.session_binding.clone(),
            last_consumed_message_id: consumed_message_id.or_else(|| {
                self.last_consumed_message_id.clone()
            }),
            version: self.version + 1,
            last_transition: Some(record),
        })
    }

    fn resolve_pointer(
        &self,
        tree: &TaskNode,
        pointer: &PointerMove,
        created: &[CreatedTicket],
    ) -> Result<String, EngineFault> {
        let missing = |what: &str| EngineFault::PointerResolution(format!(
            "{what} of active node '{}' does not exist",
            self.active_task_id
        ));
        match pointer {
            PointerMove::Stay => Ok(self.active_task_id.clone()),
            PointerMove::ToRoot => Ok(tree.id.clone()),
            PointerMove::ToParent => tree
                .parent_of(&self.active_task_id)
                .map(|p| p.id.clone())
                .ok_or_else(|| missing("parent")),
            PointerMove::ToNextSibling => tree
                .next_sibling_of(&self.active_task_id)
                .map(|s| s.id.clone())
                .ok_or_else(|| missing("next sibling")),
            PointerMove::ToFirstChildOf { parent_id } => created
                .iter()
                .find(|t| t.parent_id == *parent_id)
                .map(|t| t.id.clone())
                .ok_or_else(|| {
                    EngineFault::PointerResolution(format!(
                        "no ticket was created under '{parent_id}' to move to"
                    ))
                }),
        }
    }
}
