use crate::config::ConfigError;
use derive_more::Display;
use dynfilter_core::{
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
    filter::FilterSpecError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match err.class {
            ErrorClass::Callback => ErrorKind::Callback,
            ErrorClass::Unsupported => ErrorKind::Unsupported,
            ErrorClass::Internal | ErrorClass::InvariantViolation => ErrorKind::Internal,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<FilterSpecError> for Error {
    fn from(err: FilterSpecError) -> Self {
        Self::new(ErrorKind::Declaration, ErrorOrigin::Filter, err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Settings could not be read or are invalid.
    Config,

    /// A filter declaration is invalid.
    Declaration,

    /// A caller-supplied formatter or source callback failed.
    Callback,

    /// The host store rejected the query shape.
    Unsupported,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Cache,
    Config,
    Extract,
    Filter,
    Format,
    Query,
    Resolve,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Cache => Self::Cache,
            CoreErrorOrigin::Extract => Self::Extract,
            CoreErrorOrigin::Format => Self::Format,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Resolve => Self::Resolve,
        }
    }
}

///
/// TESTS
///
