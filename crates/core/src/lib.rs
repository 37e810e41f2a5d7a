pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::*;
pub use errors::*;
pub use models::{AbandonReason, Agent, AssignmentRequest, CapacityCeiling, DispatchOutcome};
pub use traits::{AgentDirectory, AssignCommand, DedupIndex, Dequeued, WorkQueue};
