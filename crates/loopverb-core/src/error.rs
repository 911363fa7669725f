use thiserror::Error;

#[derive(Debug, Error)]
pub enum LooperError {
    #[error("failed to decode audio: {0}")]
    Decode(String),
    #[error("audio backend error: {0}")]
    Backend(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("no audio loaded")]
    NotLoaded,
}

pub type Result<T> = std::result::Result<T, LooperError>;
