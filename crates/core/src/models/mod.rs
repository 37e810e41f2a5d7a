pub mod agent;
pub mod outcome;
pub mod request;

pub use agent::{Agent, CapacityCeiling};
pub use outcome::{AbandonReason, DispatchOutcome};
pub use request::AssignmentRequest;
