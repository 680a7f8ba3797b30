//! Operation lifecycle, cancellation, and event orchestration. Sequences
//! the other engine crates behind five operations — `ingest`, `generate`,
//! `attest`, `verify`, `diff` — while owning the engine's lifecycle state
//! machine, in-flight operation registry, and event bus.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod descriptor;
mod error;
mod event;
mod orchestrator;
mod state;

pub use cancel::CancellationToken;
pub use descriptor::{OperationDescriptor, OperationKind, OperationRegistry};
pub use error::OrchestratorError;
pub use event::{Event, EventBus, EventSubscription};
pub use orchestrator::Orchestrator;
pub use state::{OrchestratorState, StateMachine};
