//! HTTP API for the workbench.
//!
//! `api_router()` returns a composable `Router`; `start_server()` binds it
//! and serves until shut down.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod multipart;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ServerError, WorkbenchServer};
pub use types::ApiContext;
