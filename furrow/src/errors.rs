use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for furrow operations
///
/// The first five kinds classify every failure an orchestration walk can
/// surface. The remaining kinds are used by version store backends to
/// describe their own failures, which the orchestrator then wraps.
///
/// # Examples
///
/// ```rust
/// use furrow::errors::{ErrorKind, FurrowError, FurrowResult};
///
/// fn example() -> FurrowResult<()> {
///     Err(FurrowError::new("connection refused", ErrorKind::BackendError))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::BackendError);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Orchestration Errors - one per phase of a walk
    /// The version store could not be initialized; no step has run
    SetupError,
    /// The version store could not say whether a version is recorded
    PendingCheckError,
    /// A user supplied apply or revert action failed
    StepActionError,
    /// An action succeeded but its applied/reverted state was not persisted
    RecordError,
    /// The version store failed to release its resources after the walk
    TeardownError,

    // Store Errors - used by version store backends
    /// The store was used before `setup` or after `teardown`
    StoreNotInitialized,
    /// The store's underlying resource has already been released
    StoreAlreadyClosed,
    /// Error from a storage backend
    BackendError,
    /// Generic IO error
    IOError,
    /// Error encoding or decoding a persisted version
    EncodingError,

    // Validation Errors
    /// Generic validation error
    ValidationError,
    /// The operation is not valid in the current context
    InvalidOperation,

    // Extension Errors - the String names the backend (e.g. "fjall")
    /// Error from an extension crate
    Extension(String),

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::SetupError => write!(f, "Setup error"),
            ErrorKind::PendingCheckError => write!(f, "Pending check error"),
            ErrorKind::StepActionError => write!(f, "Step action error"),
            ErrorKind::RecordError => write!(f, "Record error"),
            ErrorKind::TeardownError => write!(f, "Teardown error"),
            ErrorKind::StoreNotInitialized => write!(f, "Store not initialized"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::Extension(name) => write!(f, "{} error", name),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom furrow error type.
///
/// `FurrowError` carries a message, a kind, an optional cause and the
/// backtrace captured where it was created. Errors raised by user actions or
/// store backends reach the caller as the `cause` of an orchestration error,
/// so the original error is never lost.
///
/// # Examples
///
/// ```rust
/// use furrow::errors::{ErrorKind, FurrowError};
///
/// let cause = FurrowError::new("disk full", ErrorKind::IOError);
/// let err = FurrowError::new_with_cause("failed to record version 3", ErrorKind::RecordError, cause);
///
/// assert_eq!(err.kind(), &ErrorKind::RecordError);
/// assert_eq!(err.cause().map(|c| c.message()), Some("disk full"));
/// ```
#[derive(Clone)]
pub struct FurrowError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<FurrowError>>,
    backtrace: Atomic<Backtrace>,
}

impl FurrowError {
    /// Creates a new `FurrowError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        FurrowError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `FurrowError` that wraps the error that caused it.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: FurrowError) -> Self {
        FurrowError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&FurrowError> {
        self.cause.as_deref()
    }

    /// Returns the innermost error of the cause chain, or `self` when there is no cause.
    pub fn root_cause(&self) -> &FurrowError {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }
}

impl Display for FurrowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for FurrowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // message with stack trace, or followed by the cause chain
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for FurrowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for furrow operations.
pub type FurrowResult<T> = Result<T, FurrowError>;

impl From<std::io::Error> for FurrowError {
    fn from(err: std::io::Error) -> Self {
        FurrowError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<String> for FurrowError {
    fn from(msg: String) -> Self {
        FurrowError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for FurrowError {
    fn from(msg: &str) -> Self {
        FurrowError::new(msg, ErrorKind::InternalError)
    }
}
