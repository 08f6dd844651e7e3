use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("config error: {0}")]
    Config(String),
    #[error("auth error: provider returned status {status}: {body}")]
    Auth { status: u16, body: String },
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("output field not found: {0}")]
    SinkNotFound(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub type EmbedResult<T> = Result<T, EmbedError>;
