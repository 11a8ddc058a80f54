//! HTTP API module.
//!
//! The server, its JSON types and the log stream shared with the pipeline.

pub mod logs;
pub mod server;
pub mod types;

pub use server::start_server;
pub use types::*;
