use thiserror::Error;

/// Error type for athenars operations.
///
/// The first six variants follow the DB-API exception taxonomy. The
/// remaining variants are raised locally while formatting a query, before
/// anything reaches the driver.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Interface error: {0}")]
    Interface(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operational error: {0}")]
    Operational(String),

    #[error("Programming error: {0}")]
    Programming(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Positional parameter {index} out of range ({supplied} supplied)")]
    MissingPositional { index: usize, supplied: usize },

    #[error("Named parameter not supplied: {0}")]
    MissingNamed(String),

    #[error("Invalid parameter for placeholder {placeholder}: {reason}")]
    ParameterType { placeholder: String, reason: String },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Interface,
    Connection,
    Operational,
    Programming,
    NotSupported,
    Database,
    Index,
    Key,
    Type,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Interface(_) => ErrorKind::Interface,
            Error::Connection(_) => ErrorKind::Connection,
            Error::Operational(_) => ErrorKind::Operational,
            Error::Programming(_) => ErrorKind::Programming,
            Error::NotSupported(_) => ErrorKind::NotSupported,
            Error::Database(_) => ErrorKind::Database,
            Error::MissingPositional { .. } => ErrorKind::Index,
            Error::MissingNamed(_) => ErrorKind::Key,
            Error::ParameterType { .. } => ErrorKind::Type,
        }
    }

    /// True for every error that falls under the `DatabaseError` umbrella.
    pub fn is_database_error(&self) -> bool {
        matches!(
            self,
            Error::Connection(_)
                | Error::Operational(_)
                | Error::Programming(_)
                | Error::NotSupported(_)
                | Error::Database(_)
        )
    }

    pub(crate) fn closed(what: &str) -> Self {
        Error::Programming(format!("{} is already closed", what))
    }
}

/// Result type alias for athenars operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a driver implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    /// The session could not be opened or was lost.
    #[error("{0}")]
    Session(String),

    /// The remote engine rejected or failed the statement.
    #[error("{message}")]
    Execution {
        message: String,
        sql_state: Option<String>,
    },

    /// The driver and the client disagree on the shape of the data.
    #[error("{0}")]
    Protocol(String),

    /// The driver cannot perform the requested operation.
    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

impl DriverError {
    pub fn execution(message: impl Into<String>) -> Self {
        DriverError::Execution {
            message: message.into(),
            sql_state: None,
        }
    }
}

/// Result type alias for driver implementations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

impl From<DriverError> for Error {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Session(msg) => Error::Connection(msg),
            DriverError::Execution {
                message,
                sql_state: Some(state),
            } => Error::Operational(format!("{} (SQLState {})", message, state)),
            DriverError::Execution {
                message,
                sql_state: None,
            } => Error::Operational(message),
            DriverError::Protocol(msg) => Error::Interface(msg),
            DriverError::Unsupported(msg) => Error::NotSupported(msg),
            DriverError::Other(msg) => Error::Database(msg),
        }
    }
}
