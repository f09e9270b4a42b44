//! Testing infrastructure for Todos Core
//!
//! Centralized helpers so unit and integration tests across the workspace
//! build stores and gateway doubles the same way:
//!
//! - **TestContext**: owns a temporary store directory with automatic cleanup
//! - **RecordingGateway**: scriptable [`TodoGateway`] double that records
//!   every call, for exercising handler behavior without a real store
//!
//! [`TodoGateway`]: crate::store::TodoGateway

mod context;
mod gateway;

pub use context::TestContext;
pub use gateway::RecordingGateway;
