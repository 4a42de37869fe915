use thiserror::Error;

/// Configuration and allocation failures. All of them are raised before
/// any batch is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("tolerance for '{category}' is 0; a zero cap can never drain its items")]
    ZeroTolerance { category: String },
    #[error("tolerance table has no 'default' entry")]
    MissingDefaultTolerance,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
