//! Nurture client: HTTP access to the analysis API, status polling and store reconciliation.
mod api;
mod config;
mod error;
mod http;
mod persist;
mod poll;
mod service;

pub use api::{AnalysisApi, HttpAnalysisApi};
pub use config::{ClientSettings, RequestOptions};
pub use error::{ApiError, ApiErrorKind, PollError};
pub use http::{ApiClient, SessionListener, TokenStore};
pub use persist::{ensure_dir, read_optional, write_atomic, PersistError};
pub use poll::{
    poll_analysis, ChannelStatusObserver, PollSettings, StatusObserver, DEFAULT_FAILURE_MESSAGE,
};
pub use service::{AnalysisService, Clock, SharedStore};
