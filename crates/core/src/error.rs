use thiserror::Error;

/// Failure talking to the points-of-interest source.
///
/// Cloneable so it can be forwarded to listeners as an event.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DataSourceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("source responded with status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for DataSourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataSourceError::Timeout
        } else if let Some(status) = err.status() {
            DataSourceError::Status(status.as_u16())
        } else if err.is_decode() {
            DataSourceError::Malformed(err.to_string())
        } else {
            DataSourceError::Request(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error("session driver has stopped")]
    DriverStopped,
}

pub type Result<T> = std::result::Result<T, GameError>;
