use crate::query::{QueryError, QueryErrorKind};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured engine error with a stable internal classification.
/// Not a stable API; the facade crate maps it into its public error type.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct an error raised by a caller-supplied callback.
    ///
    /// Formatters and option-source overrides use this to report failures
    /// that should degrade the option set rather than abort the request.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Callback, ErrorOrigin::Format, message.into())
    }

    /// Construct a format-origin internal error.
    pub(crate) fn format_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Format, message.into())
    }

    /// Construct a format-origin invariant violation.
    pub(crate) fn format_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Format,
            message.into(),
        )
    }

    /// Construct an extract-origin internal error.
    pub(crate) fn extract_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Extract, message.into())
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<QueryError> for InternalError {
    fn from(err: QueryError) -> Self {
        let class = match err.kind {
            QueryErrorKind::Unsupported => ErrorClass::Unsupported,
            QueryErrorKind::Execution => ErrorClass::Internal,
        };

        Self::new(class, ErrorOrigin::Query, err.to_string())
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorClass {
    #[display("callback")]
    Callback,

    #[display("internal")]
    Internal,

    #[display("invariant_violation")]
    InvariantViolation,

    #[display("unsupported")]
    Unsupported,
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorOrigin {
    #[display("cache")]
    Cache,

    #[display("extract")]
    Extract,

    #[display("format")]
    Format,

    #[display("query")]
    Query,

    #[display("resolve")]
    Resolve,
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_errors_keep_unsupported_class() {
        let err = InternalError::from(QueryError::unsupported("column 'total' is not selectable"));

        assert_eq!(err.class, ErrorClass::Unsupported);
        assert_eq!(err.origin, ErrorOrigin::Query);
        assert_eq!(
            err.display_with_class(),
            "query:unsupported: unsupported query: column 'total' is not selectable"
        );
    }

    #[test]
    fn callback_errors_are_format_origin() {
        let err = InternalError::callback("formatter rejected value");

        assert_eq!(err.class, ErrorClass::Callback);
        assert_eq!(err.origin, ErrorOrigin::Format);
    }

    #[test]
    fn class_and_origin_render_snake_case_labels() {
        let err = InternalError::format_invariant("duplicate rule");

        assert_eq!(err.class.to_string(), "invariant_violation");
        assert_eq!(err.origin.to_string(), "format");
        assert_eq!(
            err.display_with_class(),
            "format:invariant_violation: duplicate rule"
        );
    }
}
