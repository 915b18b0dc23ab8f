use thiserror::Error;

pub type DacResult<T> = Result<T, DacError>;

#[derive(Debug, Error)]
pub enum DacError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Synchronization error: {0}")]
    Sync(String),

    #[error("Thread error: {0}")]
    Thread(String),

    #[error("Input backend error: {0}")]
    Backend(String),

    #[error("Input device error: {0}")]
    Device(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User requested exit")]
    UserExit,
}

impl<T> From<std::sync::PoisonError<T>> for DacError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Sync(format!("Mutex poisoned: {}", err))
    }
}
