//! HTTP API layer for Brototype Connect.
//!
//! - **Endpoints**: JSON routes for complaints, threads, feedback and admin tools
//! - **Auth**: bearer token verification into an explicit [`connect_core::Viewer`]
//! - **Live delivery**: Server-Sent Events built on the change bus
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod auth;
pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod sse;

pub use auth::TokenVerifier;
pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
