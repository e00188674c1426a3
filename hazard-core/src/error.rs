use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {0} from {1}")]
    Status(reqwest::StatusCode, String),
    #[error("payload decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("payload shape mismatch: {0}")]
    Shape(&'static str),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("channel {channel} rejected message with status {status}")]
    Rejected {
        channel: &'static str,
        status: reqwest::StatusCode,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
