//! DownloadManager behavior tests, grouped by domain.

mod webhooks;
