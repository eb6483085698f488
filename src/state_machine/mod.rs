//! Workflow state machine: a pure transition function over an explicit state
//! graph, with side effects returned as data.
//!
//! - **Snapshot**: what the engine knows (`event::Snapshot`)
//! - **Events**: what happened (`event::Event`)
//! - **Effects**: what to do about it (`effect::Effect`)
//! - **Transition**: pure `(snapshot, event) -> Decision`
//!
//! The interpreter in `crate::interpreter` executes effects against the real
//! tracker and working copy.

mod effect;
mod event;
mod state;
mod transition;

pub use effect::{Decision, Effect, PointerMove};
pub use event::{Event, Snapshot};
pub use state::WorkflowState;
pub use transition::transition;
