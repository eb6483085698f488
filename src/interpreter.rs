//! Effect interpreter: executes the decisions of the pure engine against the
//! issue tracker and the version-control working copy.
//!
//! Effects run in order; the first failure aborts the whole transition and
//! nothing already executed is rolled back — idempotent creation is what
//! makes retrying the same transition safe, not compensation.

use crate::document::CreatedTicket;
use crate::error::EngineFault;
use crate::git::{VcsError, WorkingCopy};
use crate::state_machine::Effect;
use crate::tracker::{Ticket, Tracker};

/// Execute an ordered effect list, reporting the tickets that now exist for
/// each `CreateTicket` effect (freshly created or reused).
pub async fn run_effects<T: Tracker, W: WorkingCopy>(
    tracker: &T,
    working_copy: &W,
    effects: &[Effect],
) -> Result<Vec<CreatedTicket>, EngineFault> {
    let mut created = Vec::new();

    for effect in effects {
        match effect {
            Effect::CreateTicket {
                parent_id,
                title,
                description,
            } => {
                let id = lookup_or_create(tracker, parent_id, title, description).await?;
                created.push(CreatedTicket {
                    parent_id: parent_id.clone(),
                    id,
                    title: title.clone(),
                });
            }
            Effect::CloseTicket { id } => {
                tracker.close(id).await.map_err(EngineFault::Tracker)?;
            }
            Effect::AddNote { id, text } => {
                // Best-effort: an audit note must never block a transition.
                let _ = tracker.add_note(id, text).await;
            }
            Effect::RunCommit { message } => {
                working_copy.commit_all(message).map_err(EngineFault::Vcs)?;
                let diff = working_copy.diff_text().map_err(EngineFault::Vcs)?;
                if !diff.is_empty() {
                    return Err(EngineFault::Vcs(VcsError::DirtyAfterCommit(diff)));
                }
            }
        }
    }

    Ok(created)
}

/// Reuse an existing child of `parent_id` with exactly this title before
/// creating one. The `(parent, title)` pair is the idempotency key; replays
/// of a partially-completed creation step find the first run's ticket.
async fn lookup_or_create<T: Tracker>(
    tracker: &T,
    parent_id: &str,
    title: &str,
    description: &str,
) -> Result<String, EngineFault> {
    let children = tracker
        .children_of(parent_id)
        .await
        .map_err(EngineFault::Tracker)?;

    let mut candidates: Vec<&Ticket> = children.iter().filter(|t| t.title == title).collect();
    // Ambiguity is resolved deterministically: status rank, then earliest
    // creation, then id.
    candidates.sort_by(|a, b| {
        a.status
            .rank()
            .cmp(&b.status.rank())
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });

    if let Some(existing) = candidates.first() {
        return Ok(existing.id.clone());
    }

    tracker
        .create(parent_id, title, description)
        .await
        .map_err(EngineFault::Tracker)
}
