//! HTTP API for referral triage.
//!
//! `triage_router()` returns a composable `Router`; `start_server()` binds it
//! and runs it in a background task.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::triage_router;
pub use server::{start_server, ServerSession, TriageServer};
pub use types::ApiContext;
