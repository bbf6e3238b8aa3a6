use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid gate id: {0} (gates are numbered from 1)")]
    InvalidGate(usize),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
