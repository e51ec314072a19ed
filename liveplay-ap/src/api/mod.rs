//! HTTP control surface
//!
//! REST-style trigger/stop/panic endpoints, project info, the published
//! engine state and an SSE event stream.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
