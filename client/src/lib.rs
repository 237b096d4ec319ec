//! ScriptBoost client: resilient calls to the generation API, per-surface
//! pacing and a local script library.

pub mod api;
pub mod cache;
pub mod dedup;
pub mod error;
pub mod library;
pub mod logging;
pub mod retry;
pub mod store;
pub mod transport;
pub mod usage;

pub use api::{ApiClient, CancelHandle, ExportFile, cancellable};
pub use error::ClientError;
