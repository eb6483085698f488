//! The driver loop: feeds assistant turns into the pure engine, interprets
//! the decided effects and persists the successor document.
//!
//! One driver per workflow document. The loop is strictly sequential: replay
//! any unconsumed turn, then prompt, wait for the next turn, transition,
//! apply, save. It suspends at the manual-test gate and stops on a rejected
//! turn so a human can correct course.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::assistant::{AssistantSession, TurnStatus};
use crate::document::{CreatedTicket, UNBOUND_SESSION, WorkflowDocument};
use crate::error::HelmsmanError;
use crate::git::WorkingCopy;
use crate::interpreter::run_effects;
use crate::replay::find_replayable;
use crate::state_machine::{Decision, Effect, Event, PointerMove, WorkflowState, transition};
use crate::store::DocumentStore;
use crate::tracker::Tracker;

/// How a driver run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The workflow reached `complete`.
    Completed,
    /// Suspended at the manual-test gate; resume with `helmsman verified`.
    AwaitingManualTests,
    /// A turn was rejected; the loop stopped for a corrective turn.
    Rejected { reason: String },
    /// The assistant turn errored or was aborted; never treated as input.
    TurnFailed { status: TurnStatus },
}

/// Drives one workflow document against the external collaborators.
pub struct WorkflowDriver<A, T, W> {
    assistant: A,
    tracker: T,
    working_copy: W,
    store: DocumentStore,
    // Reentrancy guard: a driver loop must never be entered while running.
    in_flight: AtomicBool,
}

struct ReentryGuard<'a>(&'a AtomicBool);

impl Drop for ReentryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A, T, W> WorkflowDriver<A, T, W>
where
    A: AssistantSession,
    T: Tracker,
    W: WorkingCopy,
{
    pub fn new(assistant: A, tracker: T, working_copy: W, store: DocumentStore) -> Self {
        Self {
            assistant,
            tracker,
            working_copy,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    fn enter(&self) -> Result<ReentryGuard<'_>, HelmsmanError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(HelmsmanError::AlreadyRunning);
        }
        Ok(ReentryGuard(&self.in_flight))
    }

    /// Create the workflow document for a root work item and persist it.
    pub async fn start(&self, root_ticket_id: &str) -> Result<WorkflowDocument, HelmsmanError> {
        if self.store.exists() {
            return Err(HelmsmanError::WorkflowExists(
                self.store.path().display().to_string(),
            ));
        }
        let ticket = self.tracker.get(root_ticket_id).await?;
        let doc = WorkflowDocument::bootstrap(ticket.id, ticket.title);
        self.store.save(&doc)?;
        Ok(doc)
    }

    /// Run the workflow loop until it completes, suspends or stops.
    pub async fn run(&self) -> Result<RunOutcome, HelmsmanError> {
        let _guard = self.enter()?;

        let mut doc = self.load()?;
        let session = self.ensure_session(&mut doc).await?;

        // Recover a turn that was produced but never consumed before
        // prompting for anything new.
        let history = self.assistant.history(&session).await?;
        let root_text = self.root_text(&doc).await?;
        if let Some((turn_id, event)) = find_replayable(&doc, &history, &root_text) {
            match transition(&doc.snapshot(), &event) {
                Decision::Applied {
                    next_state,
                    pointer,
                    effects,
                } => {
                    doc = self
                        .apply(&doc, event.label(), next_state, &pointer, &effects, Some(turn_id))
                        .await?;
                }
                // find_replayable only returns applied events.
                _ => unreachable!("replayable event no longer applies"),
            }
        }

        loop {
            match doc.state {
                WorkflowState::Complete => return Ok(RunOutcome::Completed),
                WorkflowState::ManualTest => return Ok(RunOutcome::AwaitingManualTests),
                _ => {}
            }

            let prompt = prompt_for_state(&doc);
            self.assistant.send_prompt(&session, &prompt).await?;

            // One prompt per state entry; keep consuming turns while the
            // engine ignores them (conversational back-and-forth).
            loop {
                let turn = self.assistant.next_turn(&session).await?;
                if !turn.is_completed() {
                    return Ok(RunOutcome::TurnFailed {
                        status: turn.status,
                    });
                }

                let root_text = self.root_text(&doc).await?;
                let event = Event::Complete {
                    completed_state: doc.state,
                    assistant_text: turn.text.clone(),
                    root_item_text: root_text,
                };
                match transition(&doc.snapshot(), &event) {
                    Decision::Ignored => continue,
                    Decision::Rejected { reason } => {
                        return Ok(RunOutcome::Rejected { reason });
                    }
                    Decision::Applied {
                        next_state,
                        pointer,
                        effects,
                    } => {
                        doc = self
                            .apply(
                                &doc,
                                event.label(),
                                next_state,
                                &pointer,
                                &effects,
                                Some(turn.id),
                            )
                            .await?;
                        break;
                    }
                }
            }
        }
    }

    /// Apply the out-of-band manual-test confirmation gate.
    pub async fn confirm_manual_tests(&self) -> Result<WorkflowDocument, HelmsmanError> {
        let _guard = self.enter()?;
        let doc = self.load()?;
        self.apply_decided(&doc, &Event::ManualTestsPassed).await
    }

    /// Apply a FORCE_LGTM override for the current review stage.
    pub async fn force_approve(&self) -> Result<WorkflowDocument, HelmsmanError> {
        let _guard = self.enter()?;
        let doc = self.load()?;
        let root_text = self.root_text(&doc).await?;
        let event = Event::ForceLgtm {
            completed_state: doc.state,
            root_item_text: Some(root_text),
        };
        self.apply_decided(&doc, &event).await
    }

    /// Load the persisted document without driving the loop.
    pub fn load_document(&self) -> Result<WorkflowDocument, HelmsmanError> {
        self.load()
    }

    fn load(&self) -> Result<WorkflowDocument, HelmsmanError> {
        if !self.store.exists() {
            return Err(HelmsmanError::NoWorkflow);
        }
        Ok(self.store.load()?)
    }

    /// Bind the document to a conversation thread if it is still unbound.
    async fn ensure_session(&self, doc: &mut WorkflowDocument) -> Result<String, HelmsmanError> {
        if doc.session_binding == UNBOUND_SESSION {
            doc.session_binding = self.assistant.bind().await?;
            self.store.save(doc)?;
        }
        Ok(doc.session_binding.clone())
    }

    async fn root_text(&self, doc: &WorkflowDocument) -> Result<String, HelmsmanError> {
        Ok(self.tracker.get(&doc.root.id).await?.body)
    }

    /// Run an event through the engine and apply it; rejections surface as
    /// errors since these events come from direct human commands.
    async fn apply_decided(
        &self,
        doc: &WorkflowDocument,
        event: &Event,
    ) -> Result<WorkflowDocument, HelmsmanError> {
        match transition(&doc.snapshot(), event) {
            Decision::Applied {
                next_state,
                pointer,
                effects,
            } => {
                self.apply(doc, event.label(), next_state, &pointer, &effects, None)
                    .await
            }
            Decision::Rejected { reason } => Err(HelmsmanError::Rejected(reason)),
            Decision::Ignored => Err(HelmsmanError::Rejected(
                "the event does not advance the workflow".into(),
            )),
        }
    }

    /// Execute effects, assemble the successor document, validate and persist.
    async fn apply(
        &self,
        doc: &WorkflowDocument,
        event_label: &str,
        next_state: WorkflowState,
        pointer: &PointerMove,
        effects: &[Effect],
        consumed_message_id: Option<String>,
    ) -> Result<WorkflowDocument, HelmsmanError> {
        let created: Vec<CreatedTicket> =
            run_effects(&self.tracker, &self.working_copy, effects).await?;
        let next = doc.apply(event_label, next_state, pointer, &created, consumed_message_id)?;
        self.store.save(&next)?;
        Ok(next)
    }
}

/// Instruction sent to the assistant on entering a state. The full prompt
/// catalog lives with the assistant runtime; this is only the state cue.
fn prompt_for_state(doc: &WorkflowDocument) -> String {
    let active_title = doc
        .root
        .find(&doc.active_task_id)
        .map(|n| n.title.as_str())
        .unwrap_or_default();
    match doc.state {
        WorkflowState::Refine => format!(
            "Refine the problem statement of '{active_title}'. Emit <transition>plan</transition> when it is ready to plan."
        ),
        WorkflowState::Plan => format!(
            "Write the implementation plan for '{active_title}' into the root item's ## Plan section, then emit <transition>review-plan</transition>."
        ),
        WorkflowState::ReviewPlan => format!(
            "Review the plan of '{active_title}'. Emit <transition>implement</transition> to approve or revise it and emit <transition>review-plan</transition>."
        ),
        WorkflowState::Implement => format!("Implement the subtask '{active_title}'."),
        WorkflowState::Review => format!(
            "Review the changes for '{active_title}'. Approve with <transition>subtask-commit</transition> or list findings in a <review-findings> block and emit <transition>implement-review</transition>."
        ),
        WorkflowState::ImplementReview => {
            format!("Address the review finding '{active_title}'.")
        }
        WorkflowState::SubtaskCommit => format!(
            "Provide the commit message for '{active_title}' in a <commit-message> block."
        ),
        WorkflowState::ManualTest => String::new(),
        WorkflowState::Commit => format!(
            "Provide the final commit message for '{active_title}' in a <commit-message> block."
        ),
        WorkflowState::Complete => String::new(),
    }
}
