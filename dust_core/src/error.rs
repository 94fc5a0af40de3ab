use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DustError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("sample store error: {0}")]
    Store(String),
    #[error("sampler error: {0}")]
    Sampler(String),
    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = eyre::Result<T>;
