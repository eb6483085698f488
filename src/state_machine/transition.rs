//! The pure transition function.
//!
//! Maps a `(snapshot, event)` pair to a [`Decision`] with no I/O. Everything
//! the per-state contracts need — directive tags, work-item lists, commit
//! messages — is parsed out of the text carried by the event.

use crate::directive::{self, WorkItemSpec};

use super::effect::{Decision, Effect, PointerMove};
use super::event::{Event, Snapshot};
use super::state::WorkflowState;

/// Evaluate one event against the current workflow snapshot.
pub fn transition(snapshot: &Snapshot, event: &Event) -> Decision {
    match event {
        Event::Complete {
            completed_state,
            assistant_text,
            root_item_text,
        } => {
            if *completed_state != snapshot.state {
                return stale(*completed_state, snapshot.state);
            }
            handle_complete(snapshot, assistant_text, root_item_text)
        }
        Event::ForceLgtm {
            completed_state,
            root_item_text,
        } => {
            if *completed_state != snapshot.state {
                return stale(*completed_state, snapshot.state);
            }
            handle_force_lgtm(snapshot, root_item_text.as_deref())
        }
        Event::ManualTestsPassed => handle_manual_confirmation(snapshot),
    }
}

fn handle_complete(snapshot: &Snapshot, assistant_text: &str, root_item_text: &str) -> Decision {
    match snapshot.state {
        WorkflowState::Refine => match directive::last_directive(assistant_text) {
            None => Decision::Ignored,
            Some(d) if d == "plan" => applied(WorkflowState::Plan, PointerMove::ToRoot, vec![]),
            Some(other) => unexpected_directive(snapshot.state, &other),
        },

        WorkflowState::Plan => match directive::last_directive(assistant_text) {
            None => Decision::Ignored,
            Some(d) if d == "review-plan" => match required_plan(root_item_text) {
                Ok(_) => applied(WorkflowState::ReviewPlan, PointerMove::ToRoot, vec![]),
                Err(reason) => Decision::Rejected { reason },
            },
            Some(other) => unexpected_directive(snapshot.state, &other),
        },

        WorkflowState::ReviewPlan => match directive::last_directive(assistant_text) {
            None => Decision::Ignored,
            // Re-review: the plan was revised and goes around again.
            Some(d) if d == "review-plan" => match required_plan(root_item_text) {
                Ok(_) => applied(WorkflowState::ReviewPlan, PointerMove::Stay, vec![]),
                Err(reason) => Decision::Rejected { reason },
            },
            Some(d) if d == "implement" => match required_plan(root_item_text) {
                Ok(subtasks) => applied(
                    WorkflowState::Implement,
                    PointerMove::ToFirstChildOf {
                        parent_id: snapshot.active_id.clone(),
                    },
                    create_effects(&snapshot.active_id, &subtasks),
                ),
                Err(reason) => Decision::Rejected { reason },
            },
            Some(other) => unexpected_directive(snapshot.state, &other),
        },

        // Finishing an implementation turn always moves on to review.
        WorkflowState::Implement => applied(WorkflowState::Review, PointerMove::Stay, vec![]),

        WorkflowState::Review => match directive::last_directive(assistant_text) {
            None => Decision::Ignored,
            Some(d) if d == "subtask-commit" => {
                applied(WorkflowState::SubtaskCommit, PointerMove::Stay, vec![])
            }
            Some(d) if d == "implement-review" => {
                match required_findings(assistant_text) {
                    Ok(findings) => applied(
                        WorkflowState::ImplementReview,
                        PointerMove::ToFirstChildOf {
                            parent_id: snapshot.active_id.clone(),
                        },
                        create_effects(&snapshot.active_id, &findings),
                    ),
                    Err(reason) => Decision::Rejected { reason },
                }
            }
            Some(other) => unexpected_directive(snapshot.state, &other),
        },

        // Close the finding just worked; continue with the next one or hand
        // the subtask back to review.
        WorkflowState::ImplementReview => {
            let effects = vec![Effect::CloseTicket {
                id: snapshot.active_id.clone(),
            }];
            if snapshot.next_sibling_id.is_some() {
                applied(
                    WorkflowState::ImplementReview,
                    PointerMove::ToNextSibling,
                    effects,
                )
            } else {
                applied(WorkflowState::Review, PointerMove::ToParent, effects)
            }
        }

        WorkflowState::SubtaskCommit => match directive::commit_message(assistant_text) {
            None => Decision::Rejected {
                reason: "subtask-commit requires a non-empty <commit-message> block".into(),
            },
            Some(message) => {
                let effects = vec![
                    Effect::CloseTicket {
                        id: snapshot.active_id.clone(),
                    },
                    Effect::RunCommit { message },
                ];
                if snapshot.next_sibling_id.is_some() {
                    applied(WorkflowState::Implement, PointerMove::ToNextSibling, effects)
                } else {
                    applied(WorkflowState::ManualTest, PointerMove::ToRoot, effects)
                }
            }
        },

        WorkflowState::ManualTest => Decision::Rejected {
            reason: "the manual-test gate is advanced only by the manual confirmation event"
                .into(),
        },

        WorkflowState::Commit => match directive::commit_message(assistant_text) {
            None => Decision::Rejected {
                reason: "commit requires a non-empty <commit-message> block".into(),
            },
            Some(message) => {
                let message = with_fixes_trailer(&message, root_item_text);
                applied(
                    WorkflowState::Complete,
                    PointerMove::ToRoot,
                    vec![
                        Effect::CloseTicket {
                            id: snapshot.active_id.clone(),
                        },
                        Effect::RunCommit { message },
                    ],
                )
            }
        },

        WorkflowState::Complete => Decision::Ignored,
    }
}

fn handle_force_lgtm(snapshot: &Snapshot, root_item_text: Option<&str>) -> Decision {
    match snapshot.state {
        WorkflowState::ReviewPlan => {
            let Some(root_text) = root_item_text else {
                return Decision::Rejected {
                    reason: "force approval in review-plan requires the root item text".into(),
                };
            };
            match required_plan(root_text) {
                Ok(subtasks) => {
                    let mut effects = create_effects(&snapshot.active_id, &subtasks);
                    effects.push(audit_note(&snapshot.active_id, "plan"));
                    applied(
                        WorkflowState::Implement,
                        PointerMove::ToFirstChildOf {
                            parent_id: snapshot.active_id.clone(),
                        },
                        effects,
                    )
                }
                Err(reason) => Decision::Rejected { reason },
            }
        }
        WorkflowState::Review => applied(
            WorkflowState::SubtaskCommit,
            PointerMove::Stay,
            vec![audit_note(&snapshot.active_id, "review")],
        ),
        other => Decision::Rejected {
            reason: format!(
                "FORCE_LGTM is only valid during review-plan or review (workflow is at {other})"
            ),
        },
    }
}

fn handle_manual_confirmation(snapshot: &Snapshot) -> Decision {
    match snapshot.state {
        WorkflowState::ManualTest => applied(WorkflowState::Commit, PointerMove::ToRoot, vec![]),
        other => Decision::Rejected {
            reason: format!(
                "manual-test confirmation is only valid at the manual-test gate (workflow is at {other})"
            ),
        },
    }
}

fn applied(next_state: WorkflowState, pointer: PointerMove, effects: Vec<Effect>) -> Decision {
    Decision::Applied {
        next_state,
        pointer,
        effects,
    }
}

fn stale(completed: WorkflowState, current: WorkflowState) -> Decision {
    Decision::Rejected {
        reason: format!(
            "stale event: produced against state {completed} but the workflow is at {current}"
        ),
    }
}

fn unexpected_directive(state: WorkflowState, found: &str) -> Decision {
    Decision::Rejected {
        reason: format!(
            "unexpected directive '{found}' in state {state}: expected {}",
            state.expected_directives()
        ),
    }
}

/// The plan list from the root item body; rejection reason on error or empty.
fn required_plan(root_item_text: &str) -> Result<Vec<WorkItemSpec>, String> {
    let subtasks = directive::parse_plan_section(root_item_text)?;
    if subtasks.is_empty() {
        return Err("the root item's ## Plan section must list at least one subtask".into());
    }
    Ok(subtasks)
}

/// The findings list from the assistant turn; rejection reason on error,
/// absence, or empty list.
fn required_findings(assistant_text: &str) -> Result<Vec<WorkItemSpec>, String> {
    match directive::parse_item_block(assistant_text, "review-findings")? {
        Some(findings) if !findings.is_empty() => Ok(findings),
        _ => Err("implement-review requires a non-empty <review-findings> block".into()),
    }
}

fn create_effects(parent_id: &str, items: &[WorkItemSpec]) -> Vec<Effect> {
    items
        .iter()
        .map(|item| Effect::CreateTicket {
            parent_id: parent_id.to_string(),
            title: item.title.clone(),
            description: ticket_description(item),
        })
        .collect()
}

/// Ticket body for a created work item. The tdd flag is only surfaced when it
/// deviates from the default so the implementing turn sees it.
fn ticket_description(item: &WorkItemSpec) -> String {
    if item.tdd {
        item.description.clone()
    } else if item.description.is_empty() {
        "tdd: false".to_string()
    } else {
        format!("{}\n\ntdd: false", item.description)
    }
}

fn audit_note(id: &str, stage: &str) -> Effect {
    Effect::AddNote {
        id: id.to_string(),
        text: format!("{stage} approved by manual override (FORCE_LGTM)"),
    }
}

/// Append the root item's `Fixes:` trailer to a multi-line commit message
/// that does not already carry it.
fn with_fixes_trailer(message: &str, root_item_text: &str) -> String {
    let Some(trailer) = directive::fixes_trailer(root_item_text) else {
        return message.to_string();
    };
    if message.lines().count() <= 1 || message.contains(&trailer) {
        return message.to_string();
    }
    format!("{}\n\n{trailer}", message.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(state: WorkflowState) -> Snapshot {
        Snapshot {
            state,
            active_id: "root".into(),
            parent_id: None,
            next_sibling_id: None,
        }
    }

    fn snap_at(
        state: WorkflowState,
        active: &str,
        parent: Option<&str>,
        next_sibling: Option<&str>,
    ) -> Snapshot {
        Snapshot {
            state,
            active_id: active.into(),
            parent_id: parent.map(Into::into),
            next_sibling_id: next_sibling.map(Into::into),
        }
    }

    fn complete(state: WorkflowState, text: &str) -> Event {
        Event::Complete {
            completed_state: state,
            assistant_text: text.into(),
            root_item_text: String::new(),
        }
    }

    fn complete_with_root(state: WorkflowState, text: &str, root_text: &str) -> Event {
        Event::Complete {
            completed_state: state,
            assistant_text: text.into(),
            root_item_text: root_text.into(),
        }
    }

    const PLAN_ROOT: &str = "# Problem\nDetails.\n\n## Plan\n\
        - title: Extract the parser\n\
        \x20 description: Pull parsing out of main\n\
        - title: Wire up the CLI\n";

    // --- staleness ---

    #[test]
    fn stale_complete_rejected_in_every_state() {
        let all = [
            WorkflowState::Refine,
            WorkflowState::Plan,
            WorkflowState::ReviewPlan,
            WorkflowState::Implement,
            WorkflowState::Review,
            WorkflowState::ImplementReview,
            WorkflowState::SubtaskCommit,
            WorkflowState::ManualTest,
            WorkflowState::Commit,
            WorkflowState::Complete,
        ];
        for state in all {
            let other = if state == WorkflowState::Refine {
                WorkflowState::Plan
            } else {
                WorkflowState::Refine
            };
            let decision = transition(&snap(state), &complete(other, "<transition>plan</transition>"));
            match decision {
                Decision::Rejected { reason } => assert!(reason.contains("stale"), "{reason}"),
                other => panic!("expected stale rejection in {state}, got {other:?}"),
            }
        }
    }

    #[test]
    fn stale_force_lgtm_rejected() {
        let event = Event::ForceLgtm {
            completed_state: WorkflowState::Review,
            root_item_text: None,
        };
        let decision = transition(&snap(WorkflowState::ReviewPlan), &event);
        assert!(matches!(decision, Decision::Rejected { reason } if reason.contains("stale")));
    }

    // --- refine (scenario A) ---

    #[test]
    fn refine_plan_directive_applies() {
        let decision = transition(
            &snap(WorkflowState::Refine),
            &complete(WorkflowState::Refine, "Ready.\n<transition>plan</transition>"),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::Plan,
                pointer: PointerMove::ToRoot,
                effects: vec![],
            }
        );
    }

    #[test]
    fn refine_without_directive_is_ignored() {
        let decision = transition(
            &snap(WorkflowState::Refine),
            &complete(WorkflowState::Refine, "Could you clarify the scope?"),
        );
        assert_eq!(decision, Decision::Ignored);
    }

    #[test]
    fn refine_last_directive_wins_and_invalid_rejects() {
        // Earlier 'plan' tag is quoted; the last tag is what counts, and it is
        // invalid for refine.
        let text = "Example: <transition>plan</transition>\n\
                    <transition>review-plan</transition>";
        let decision = transition(&snap(WorkflowState::Refine), &complete(WorkflowState::Refine, text));
        match decision {
            Decision::Rejected { reason } => {
                assert!(reason.contains("'review-plan'"), "{reason}");
                assert!(reason.contains("expected plan"), "{reason}");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn refine_last_directive_wins_when_valid() {
        let text = "I considered <transition>review-plan</transition> earlier.\n\
                    <transition>plan</transition>";
        let decision = transition(&snap(WorkflowState::Refine), &complete(WorkflowState::Refine, text));
        assert!(decision.is_applied());
    }

    // --- plan ---

    #[test]
    fn plan_requires_non_empty_subtask_list() {
        let event = complete_with_root(
            WorkflowState::Plan,
            "<transition>review-plan</transition>",
            "# Problem\nno plan yet",
        );
        let decision = transition(&snap(WorkflowState::Plan), &event);
        assert!(matches!(decision, Decision::Rejected { reason } if reason.contains("at least one subtask")));
    }

    #[test]
    fn plan_with_subtasks_advances_to_review_plan() {
        let event = complete_with_root(
            WorkflowState::Plan,
            "<transition>review-plan</transition>",
            PLAN_ROOT,
        );
        let decision = transition(&snap(WorkflowState::Plan), &event);
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::ReviewPlan,
                pointer: PointerMove::ToRoot,
                effects: vec![],
            }
        );
    }

    // --- review-plan (scenario B) ---

    #[test]
    fn review_plan_implement_creates_one_ticket_per_subtask() {
        let event = complete_with_root(
            WorkflowState::ReviewPlan,
            "<transition>implement</transition>",
            PLAN_ROOT,
        );
        let decision = transition(&snap(WorkflowState::ReviewPlan), &event);
        match decision {
            Decision::Applied {
                next_state,
                pointer,
                effects,
            } => {
                assert_eq!(next_state, WorkflowState::Implement);
                assert_eq!(
                    pointer,
                    PointerMove::ToFirstChildOf {
                        parent_id: "root".into()
                    }
                );
                assert_eq!(effects.len(), 2);
                assert_eq!(
                    effects[0],
                    Effect::CreateTicket {
                        parent_id: "root".into(),
                        title: "Extract the parser".into(),
                        description: "Pull parsing out of main".into(),
                    }
                );
                assert_eq!(
                    effects[1],
                    Effect::CreateTicket {
                        parent_id: "root".into(),
                        title: "Wire up the CLI".into(),
                        description: String::new(),
                    }
                );
            }
            other => panic!("expected applied, got {other:?}"),
        }
    }

    #[test]
    fn review_plan_re_review_stays() {
        let event = complete_with_root(
            WorkflowState::ReviewPlan,
            "<transition>review-plan</transition>",
            PLAN_ROOT,
        );
        let decision = transition(&snap(WorkflowState::ReviewPlan), &event);
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::ReviewPlan,
                pointer: PointerMove::Stay,
                effects: vec![],
            }
        );
    }

    #[test]
    fn review_plan_malformed_plan_rejects_with_parser_message() {
        let root = "## Plan\n- title: ok\n  deadline: tomorrow\n";
        let event = complete_with_root(
            WorkflowState::ReviewPlan,
            "<transition>implement</transition>",
            root,
        );
        let decision = transition(&snap(WorkflowState::ReviewPlan), &event);
        assert!(matches!(decision, Decision::Rejected { reason } if reason.contains("unknown work item key")));
    }

    // --- implement ---

    #[test]
    fn implement_turn_advances_to_review_automatically() {
        let snapshot = snap_at(WorkflowState::Implement, "s1", Some("root"), Some("s2"));
        let decision = transition(
            &snapshot,
            &complete(WorkflowState::Implement, "implemented, no tags"),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::Review,
                pointer: PointerMove::Stay,
                effects: vec![],
            }
        );
    }

    // --- review (scenario C) ---

    #[test]
    fn review_approval_moves_to_subtask_commit() {
        let snapshot = snap_at(WorkflowState::Review, "s1", Some("root"), None);
        let decision = transition(
            &snapshot,
            &complete(WorkflowState::Review, "<transition>subtask-commit</transition>"),
        );
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::SubtaskCommit,
                pointer: PointerMove::Stay,
                effects: vec![],
            }
        );
    }

    #[test]
    fn review_findings_create_tickets_under_active_subtask() {
        let text = "<review-findings>\n\
                    - title: Handle empty input\n\
                    \x20 description: Parser panics on empty strings\n\
                    </review-findings>\n\
                    <transition>implement-review</transition>";
        let snapshot = snap_at(WorkflowState::Review, "s1", Some("root"), None);
        let decision = transition(&snapshot, &complete(WorkflowState::Review, text));
        match decision {
            Decision::Applied {
                next_state,
                pointer,
                effects,
            } => {
                assert_eq!(next_state, WorkflowState::ImplementReview);
                assert_eq!(
                    pointer,
                    PointerMove::ToFirstChildOf {
                        parent_id: "s1".into()
                    }
                );
                assert_eq!(effects.len(), 1);
                assert!(matches!(
                    &effects[0],
                    Effect::CreateTicket { parent_id, title, .. }
                        if parent_id == "s1" && title == "Handle empty input"
                ));
            }
            other => panic!("expected applied, got {other:?}"),
        }
    }

    #[test]
    fn review_findings_directive_without_block_rejects() {
        let snapshot = snap_at(WorkflowState::Review, "s1", Some("root"), None);
        let decision = transition(
            &snapshot,
            &complete(WorkflowState::Review, "<transition>implement-review</transition>"),
        );
        assert!(matches!(decision, Decision::Rejected { reason } if reason.contains("review-findings")));
    }

    #[test]
    fn review_empty_findings_block_rejects() {
        let text = "<review-findings>\n</review-findings>\n\
                    <transition>implement-review</transition>";
        let snapshot = snap_at(WorkflowState::Review, "s1", Some("root"), None);
        let decision = transition(&snapshot, &complete(WorkflowState::Review, text));
        assert!(matches!(decision, Decision::Rejected { .. }));
    }

    // --- implement-review loop ---

    #[test]
    fn implement_review_with_next_sibling_closes_and_moves_on() {
        let snapshot = snap_at(WorkflowState::ImplementReview, "f1", Some("s1"), Some("f2"));
        let decision = transition(&snapshot, &complete(WorkflowState::ImplementReview, "done"));
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::ImplementReview,
                pointer: PointerMove::ToNextSibling,
                effects: vec![Effect::CloseTicket { id: "f1".into() }],
            }
        );
    }

    #[test]
    fn implement_review_last_finding_returns_to_review() {
        let snapshot = snap_at(WorkflowState::ImplementReview, "f2", Some("s1"), None);
        let decision = transition(&snapshot, &complete(WorkflowState::ImplementReview, "done"));
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::Review,
                pointer: PointerMove::ToParent,
                effects: vec![Effect::CloseTicket { id: "f2".into() }],
            }
        );
    }

    // --- subtask-commit (scenario D) ---

    #[test]
    fn subtask_commit_last_subtask_moves_to_manual_test() {
        let snapshot = snap_at(WorkflowState::SubtaskCommit, "s2", Some("root"), None);
        let text = "<commit-message>feat: wire up the CLI</commit-message>";
        let decision = transition(&snapshot, &complete(WorkflowState::SubtaskCommit, text));
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::ManualTest,
                pointer: PointerMove::ToRoot,
                effects: vec![
                    Effect::CloseTicket { id: "s2".into() },
                    Effect::RunCommit {
                        message: "feat: wire up the CLI".into()
                    },
                ],
            }
        );
    }

    #[test]
    fn subtask_commit_with_next_sibling_loops_to_implement() {
        let snapshot = snap_at(WorkflowState::SubtaskCommit, "s1", Some("root"), Some("s2"));
        let text = "<commit-message>feat: extract the parser</commit-message>";
        let decision = transition(&snapshot, &complete(WorkflowState::SubtaskCommit, text));
        match decision {
            Decision::Applied {
                next_state,
                pointer,
                ..
            } => {
                assert_eq!(next_state, WorkflowState::Implement);
                assert_eq!(pointer, PointerMove::ToNextSibling);
            }
            other => panic!("expected applied, got {other:?}"),
        }
    }

    #[test]
    fn subtask_commit_without_message_rejects() {
        let snapshot = snap_at(WorkflowState::SubtaskCommit, "s1", Some("root"), None);
        let decision = transition(
            &snapshot,
            &complete(WorkflowState::SubtaskCommit, "all done"),
        );
        assert!(matches!(decision, Decision::Rejected { reason } if reason.contains("commit-message")));
    }

    // --- manual-test gate (scenario E) ---

    #[test]
    fn manual_test_rejects_complete_events() {
        let decision = transition(
            &snap(WorkflowState::ManualTest),
            &complete(WorkflowState::ManualTest, "<transition>commit</transition>"),
        );
        match decision {
            Decision::Rejected { reason } => {
                assert!(reason.contains("manual confirmation"), "{reason}");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn manual_confirmation_advances_to_commit() {
        let decision = transition(&snap(WorkflowState::ManualTest), &Event::ManualTestsPassed);
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::Commit,
                pointer: PointerMove::ToRoot,
                effects: vec![],
            }
        );
    }

    #[test]
    fn manual_confirmation_rejected_elsewhere() {
        for state in [WorkflowState::Refine, WorkflowState::Review, WorkflowState::Complete] {
            let decision = transition(&snap(state), &Event::ManualTestsPassed);
            assert!(matches!(decision, Decision::Rejected { .. }), "state {state}");
        }
    }

    // --- commit ---

    #[test]
    fn commit_closes_root_and_commits() {
        let text = "<commit-message>fix: repair the frobnicator</commit-message>";
        let decision = transition(&snap(WorkflowState::Commit), &complete(WorkflowState::Commit, text));
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::Complete,
                pointer: PointerMove::ToRoot,
                effects: vec![
                    Effect::CloseTicket { id: "root".into() },
                    Effect::RunCommit {
                        message: "fix: repair the frobnicator".into()
                    },
                ],
            }
        );
    }

    #[test]
    fn commit_appends_fixes_trailer_to_multiline_message() {
        let root = "# Problem\nDetails.\n\nFixes: #42\n";
        let text = "<commit-message>fix: repair the frobnicator\n\nLonger body.</commit-message>";
        let decision = transition(
            &snap(WorkflowState::Commit),
            &complete_with_root(WorkflowState::Commit, text, root),
        );
        match decision {
            Decision::Applied { effects, .. } => match &effects[1] {
                Effect::RunCommit { message } => {
                    assert!(message.ends_with("Fixes: #42"), "{message}");
                }
                other => panic!("expected RunCommit, got {other:?}"),
            },
            other => panic!("expected applied, got {other:?}"),
        }
    }

    #[test]
    fn commit_trailer_skipped_for_single_line_or_present() {
        let root = "Fixes: #42";
        // Single-line message: no trailer.
        assert_eq!(with_fixes_trailer("fix: x", root), "fix: x");
        // Already present: appended only once.
        let msg = "fix: x\n\nFixes: #42";
        assert_eq!(with_fixes_trailer(msg, root), msg);
        // No trailer in root text: unchanged.
        assert_eq!(with_fixes_trailer("fix: x\n\nbody", "nothing"), "fix: x\n\nbody");
    }

    // --- complete ---

    #[test]
    fn complete_state_ignores_turns() {
        let decision = transition(
            &snap(WorkflowState::Complete),
            &complete(WorkflowState::Complete, "<transition>plan</transition>"),
        );
        assert_eq!(decision, Decision::Ignored);
    }

    // --- FORCE_LGTM ---

    #[test]
    fn force_lgtm_in_review_plan_creates_tickets_and_note() {
        let event = Event::ForceLgtm {
            completed_state: WorkflowState::ReviewPlan,
            root_item_text: Some(PLAN_ROOT.into()),
        };
        let decision = transition(&snap(WorkflowState::ReviewPlan), &event);
        match decision {
            Decision::Applied {
                next_state,
                effects,
                ..
            } => {
                assert_eq!(next_state, WorkflowState::Implement);
                assert_eq!(effects.len(), 3);
                assert!(matches!(&effects[2], Effect::AddNote { id, text }
                    if id == "root" && text.contains("FORCE_LGTM")));
            }
            other => panic!("expected applied, got {other:?}"),
        }
    }

    #[test]
    fn force_lgtm_in_review_plan_without_root_text_rejects() {
        let event = Event::ForceLgtm {
            completed_state: WorkflowState::ReviewPlan,
            root_item_text: None,
        };
        let decision = transition(&snap(WorkflowState::ReviewPlan), &event);
        assert!(matches!(decision, Decision::Rejected { .. }));
    }

    #[test]
    fn force_lgtm_in_review_approves_with_note() {
        let snapshot = snap_at(WorkflowState::Review, "s1", Some("root"), None);
        let event = Event::ForceLgtm {
            completed_state: WorkflowState::Review,
            root_item_text: None,
        };
        let decision = transition(&snapshot, &event);
        assert_eq!(
            decision,
            Decision::Applied {
                next_state: WorkflowState::SubtaskCommit,
                pointer: PointerMove::Stay,
                effects: vec![Effect::AddNote {
                    id: "s1".into(),
                    text: "review approved by manual override (FORCE_LGTM)".into()
                }],
            }
        );
    }

    #[test]
    fn force_lgtm_rejected_outside_review_stages() {
        for state in [
            WorkflowState::Refine,
            WorkflowState::Implement,
            WorkflowState::ManualTest,
            WorkflowState::Complete,
        ] {
            let event = Event::ForceLgtm {
                completed_state: state,
                root_item_text: None,
            };
            let decision = transition(&snap(state), &event);
            assert!(
                matches!(decision, Decision::Rejected { ref reason } if reason.contains("FORCE_LGTM")),
                "state {state}: {decision:?}"
            );
        }
    }

    // --- tdd flag surfaced in ticket description ---

    #[test]
    fn non_tdd_item_marks_ticket_description() {
        let root = "## Plan\n- title: Quick rename\n  tdd: false\n";
        let event = complete_with_root(
            WorkflowState::ReviewPlan,
            "<transition>implement</transition>",
            root,
        );
        let decision = transition(&snap(WorkflowState::ReviewPlan), &event);
        match decision {
            Decision::Applied { effects, .. } => {
                assert!(matches!(&effects[0], Effect::CreateTicket { description, .. }
                    if description.contains("tdd: false")));
            }
            other => panic!("expected applied, got {other:?}"),
        }
    }
}
