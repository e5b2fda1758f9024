//! Handler state for the API router

use crate::{Config, DownloadManager};
use std::sync::Arc;

/// State handed to every route handler
///
/// Cloning is two Arc bumps, so axum's per-request clone stays cheap. The
/// config is carried separately from the manager so handlers that only need
/// settings never touch manager internals.
#[derive(Clone)]
pub struct AppState {
    /// Manager backing all task operations
    pub manager: Arc<DownloadManager>,

    /// Settings the server was started with
    pub config: Arc<Config>,
}
