//! Budget Lens API server module
//!
//! HTTP JSON API for dashboard renderers.
//! Run with `budget-lens-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server, ApiConfig, AppState};
