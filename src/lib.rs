//! Host integration for next-word prediction.
//!
//! Re-exports the storage engine (`predict_core`) and the orchestration
//! layer (`predict_session`), and adds what a host needs to wire them per
//! schema: resource path resolution and a pool that shares databases and
//! engines between sessions.

pub mod api;
mod trace_init;

pub use predict_core;
pub use predict_session;
pub use trace_init::{init_tracing, trace_file, TRACE_FILE_NAME};
