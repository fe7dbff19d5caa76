use console_core::{DocumentEntry, LoadTicket, StageActionRequest, StageActionResponse};
use thiserror::Error;

use crate::persist::PersistError;

/// Failure of a console API call. `Display` is the text shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Non-2xx answer; `message` is the response body, or the status text when
    /// the body is empty.
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Engine runtime could not start: {0}")]
    Runtime(String),
}

#[derive(Debug, Error)]
pub enum OfflineError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status {status} for {path}")]
    Status { path: String, status: u16 },
    #[error("cache storage error: {0}")]
    Storage(String),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("lifecycle error: {0}")]
    Lifecycle(String),
    #[error("offline and no cached shell available for {path}")]
    NoFallback { path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ProgressLoaded {
        ticket: LoadTicket,
        result: Result<Vec<DocumentEntry>, GatewayError>,
    },
    StageActionFinished {
        request: StageActionRequest,
        result: Result<StageActionResponse, GatewayError>,
    },
}
