//! # Allocator Testing Utils
//!
//! Shared testing utilities for the room allocator workspace.
//! This crate provides mock implementations of the capability traits and
//! testing helpers that can be used across all other crates in the workspace.
//!
//! ## Features
//!
//! - **Mock Capabilities**: In-memory `WorkQueue`, `DedupIndex` and `AgentDirectory`
//!   doubles that record every call
//! - **Test Data Builders**: Utilities for creating requests, agents and configs
//! - **Helpers**: Polling helpers for asynchronous assertions
//!
//! ## Usage
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! allocator-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! Then use the mocks in your tests:
//!
//! ```rust
//! use allocator_testing_utils::mocks::*;
//! use allocator_testing_utils::builders::AssignmentRequestBuilder;
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

// Re-export commonly used items
pub use builders::*;
pub use helpers::*;
pub use mocks::*;
