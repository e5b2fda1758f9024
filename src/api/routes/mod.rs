//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] — Task listing, submission and purge operations
//! - [`system`] — Health, events, OpenAPI, fallbacks

mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` continues to work
pub use system::*;
pub use tasks::*;
