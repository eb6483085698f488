//! Crash recovery: re-drive the engine from an assistant turn that was
//! produced but never consumed.
//!
//! The window this covers is a crash between "assistant produced valid
//! output" and "engine consumed it". The consumed-message cursor prevents
//! double application; idempotent ticket creation and the clean-working-copy
//! commit check make re-running the decided effects safe.

use crate::assistant::AssistantTurn;
use crate::document::WorkflowDocument;
use crate::state_machine::{Event, transition};

/// If the most recent completed assistant turn is newer than the document's
/// consumed-message cursor and its text alone yields an applied decision for
/// the current state, return it as a synthetic `Complete` event.
///
/// Errored and aborted turns never qualify; neither do turns the engine
/// would ignore or reject — those wait for a human.
pub fn find_replayable(
    doc: &WorkflowDocument,
    turns: &[AssistantTurn],
    root_item_text: &str,
) -> Option<(String, Event)> {
    let turn = turns.last()?;
    if !turn.is_completed() {
        return None;
    }
    if doc.last_consumed_message_id.as_deref() == Some(turn.id.as_str()) {
        return None;
    }

    let event = Event::Complete {
        completed_state: doc.state,
        assistant_text: turn.text.clone(),
        root_item_text: root_item_text.to_string(),
    };
    if transition(&doc.snapshot(), &event).is_applied() {
        Some((turn.id.clone(), event))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::TurnStatus;
    use crate::state_machine::{Decision, WorkflowState};

    fn turn(id: &str, text: &str, status: TurnStatus) -> AssistantTurn {
        AssistantTurn {
            id: id.into(),
            text: text.into(),
            status,
        }
    }

    fn refine_doc() -> WorkflowDocument {
        WorkflowDocument::bootstrap("root", "Fix the frobnicator")
    }

    #[test]
    fn unconsumed_valid_turn_is_replayed() {
        let doc = refine_doc();
        let turns = vec![turn(
            "turn-1",
            "Refined.\n<transition>plan</transition>",
            TurnStatus::Completed,
        )];

        let (id, event) = find_replayable(&doc, &turns, "").unwrap();
        assert_eq!(id, "turn-1");
        match transition(&doc.snapshot(), &event) {
            Decision::Applied { next_state, .. } => assert_eq!(next_state, WorkflowState::Plan),
            other => panic!("expected applied, got {other:?}"),
        }
    }

    #[test]
    fn consumed_turn_is_not_replayed() {
        let mut doc = refine_doc();
        doc.last_consumed_message_id = Some("turn-1".into());
        let turns = vec![turn(
            "turn-1",
            "<transition>plan</transition>",
            TurnStatus::Completed,
        )];

        assert!(find_replayable(&doc, &turns, "").is_none());
    }

    #[test]
    fn newer_turn_after_consumed_one_is_replayed() {
        let mut doc = refine_doc();
        doc.last_consumed_message_id = Some("turn-1".into());
        let turns = vec![
            turn("turn-1", "old", TurnStatus::Completed),
            turn("turn-2", "<transition>plan</transition>", TurnStatus::Completed),
        ];

        let (id, _) = find_replayable(&doc, &turns, "").unwrap();
        assert_eq!(id, "turn-2");
    }

    #[test]
    fn errored_and_aborted_turns_never_replay() {
        let doc = refine_doc();
        for status in [TurnStatus::Errored, TurnStatus::Aborted] {
            let turns = vec![turn("turn-1", "<transition>plan</transition>", status)];
            assert!(find_replayable(&doc, &turns, "").is_none());
        }
    }

    #[test]
    fn conversational_turn_is_not_replayed() {
        let doc = refine_doc();
        let turns = vec![turn("turn-1", "what scope exactly?", TurnStatus::Completed)];
        assert!(find_replayable(&doc, &turns, "").is_none());
    }

    #[test]
    fn invalid_for_state_turn_is_not_replayed() {
        // A directive the current state rejects must wait for a human.
        let doc = refine_doc();
        let turns = vec![turn(
            "turn-1",
            "<transition>implement</transition>",
            TurnStatus::Completed,
        )];
        assert!(find_replayable(&doc, &turns, "").is_none());
    }

    #[test]
    fn empty_history_is_fine() {
        assert!(find_replayable(&refine_doc(), &[], "").is_none());
    }
}
