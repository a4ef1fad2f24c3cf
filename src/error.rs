//! Error types for remote lookups and existence verification.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::key::KeyShape;

/// A structured error returned by the remote client collaborator.
///
/// `code` is the machine-readable error code the control plane attached to the
/// failure (for example `SubnetGroupNotFoundFault`). Transport-level failures
/// that never reached the service usually carry no code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// The machine-readable error code, if the remote API supplied one.
    pub code: Option<String>,
    /// The human-readable error message.
    pub message: String,
}

impl RemoteError {
    /// Create a remote error carrying an error code.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Create a remote error without an error code.
    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// The error code, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Whether this error carries exactly the given code.
    pub fn has_code(&self, code: &str) -> bool {
        self.code() == Some(code)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<tonic::Status> for RemoteError {
    fn from(status: tonic::Status) -> Self {
        Self::new(format!("{:?}", status.code()), status.message())
    }
}

/// Why a lookup could not produce a definitive answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientCause {
    /// The remote call failed for a reason other than absence.
    #[error("{0}")]
    Remote(#[from] RemoteError),

    /// The caller cancelled the lookup before it completed.
    #[error("lookup cancelled")]
    Cancelled,

    /// The lookup did not complete within its deadline.
    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),
}

/// A locally tracked identity could not be turned into a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The identity or a key component was empty.
    #[error("empty {0} in lookup key")]
    Empty(&'static str),

    /// A composite identity did not contain the delimiter.
    #[error("unexpected format of identity ({identity}), expected <container-id>{delimiter}<name>")]
    MissingDelimiter {
        /// The identity as found in state.
        identity: String,
        /// The delimiter that was expected.
        delimiter: char,
    },

    /// A composite identity split into the wrong number of parts.
    #[error("unexpected format of identity ({identity}), expected {expected} parts but found {found}")]
    WrongArity {
        /// The identity as found in state.
        identity: String,
        /// Number of parts required.
        expected: usize,
        /// Number of parts present.
        found: usize,
    },

    /// A key component contains the delimiter and could not be decoded again.
    #[error("key component {0:?} must not contain the identity delimiter")]
    DelimiterInComponent(String),

    /// A resource kind was handed a key of the wrong shape.
    #[error("expected a {expected:?} key, got a {found:?} key")]
    ShapeMismatch {
        /// Shape the resource kind requires.
        expected: KeyShape,
        /// Shape of the key that was supplied.
        found: KeyShape,
    },
}

/// A lookup that did not yield exactly one remote object.
///
/// `request` is the debug rendering of the request payload that produced
/// the outcome, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The remote API reported that the object does not exist.
    #[error("{kind} {key} not found: {cause}")]
    NotFound {
        /// Resource kind name.
        kind: String,
        /// Encoded lookup key.
        key: String,
        /// Request that produced the outcome.
        request: String,
        /// The not-found error returned by the remote API.
        cause: RemoteError,
    },

    /// The call succeeded but returned nothing.
    #[error("empty result for {kind} {key} (request: {request})")]
    EmptyResult {
        /// Resource kind name.
        kind: String,
        /// Encoded lookup key.
        key: String,
        /// Request that produced the outcome.
        request: String,
    },

    /// The call returned more than one object for a unique key.
    #[error("too many results for {kind} {key}: wanted 1, got {count} (request: {request})")]
    TooManyResults {
        /// Resource kind name.
        kind: String,
        /// Encoded lookup key.
        key: String,
        /// Number of objects returned.
        count: usize,
        /// Request that produced the outcome.
        request: String,
    },

    /// The call failed without a definitive answer about existence.
    #[error("lookup of {kind} {key} failed: {cause}")]
    Transient {
        /// Resource kind name.
        kind: String,
        /// Encoded lookup key.
        key: String,
        /// The underlying failure.
        #[source]
        cause: TransientCause,
    },

    /// The lookup key could not be built.
    #[error(transparent)]
    MalformedKey(#[from] KeyError),
}

impl LookupError {
    /// Whether the remote API definitively reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the caller may retry the lookup.
    ///
    /// The core never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

impl From<LookupError> for tonic::Status {
    fn from(err: LookupError) -> Self {
        let msg = err.to_string();
        match err {
            LookupError::NotFound { .. } => tonic::Status::not_found(msg),
            LookupError::EmptyResult { .. } | LookupError::TooManyResults { .. } => {
                tonic::Status::failed_precondition(msg)
            },
            LookupError::MalformedKey(_) => tonic::Status::invalid_argument(msg),
            LookupError::Transient { cause, .. } => match cause {
                TransientCause::Cancelled => tonic::Status::cancelled(msg),
                TransientCause::TimedOut(_) => tonic::Status::deadline_exceeded(msg),
                TransientCause::Remote(_) => tonic::Status::unavailable(msg),
            },
        }
    }
}

/// A failed existence, destroy, or lifecycle check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The address is not present in the state snapshot.
    #[error("Not found: {address} ({kind})")]
    MissingResource {
        /// Resource kind name.
        kind: String,
        /// State address that was looked up.
        address: String,
    },

    /// The resource is tracked but has no identity.
    #[error("Resource has no ID: {address} ({kind})")]
    MissingId {
        /// Resource kind name.
        kind: String,
        /// State address of the resource.
        address: String,
    },

    /// The tracked identity cannot be decoded into a lookup key.
    #[error("malformed identity for {kind}: {source}")]
    MalformedIdentity {
        /// Resource kind name.
        kind: String,
        /// The decode failure.
        #[source]
        source: KeyError,
    },

    /// The lookup produced an outcome the check did not accept.
    #[error("{kind} {key}: expected {expected}, observed {observed}")]
    UnexpectedOutcome {
        /// Resource kind name.
        kind: String,
        /// Encoded lookup key.
        key: String,
        /// The outcome the check required.
        expected: &'static str,
        /// The outcome the finder returned.
        observed: String,
    },

    /// A destroyed object can still be retrieved.
    #[error("{kind} {key} still exists after destroy")]
    StillExists {
        /// Resource kind name.
        kind: String,
        /// Encoded lookup key.
        key: String,
    },

    /// Remote existence could not be established.
    #[error("{kind} {key}: existence unknown: {cause}")]
    Transient {
        /// Resource kind name.
        kind: String,
        /// Encoded lookup key.
        key: String,
        /// The underlying failure.
        #[source]
        cause: TransientCause,
    },

    /// A lifecycle step landed on an outcome that is not allowed at that point.
    #[error("{kind} {key}: cannot {step} from {from} after observing {observed}")]
    InvalidTransition {
        /// Resource kind name.
        kind: String,
        /// Encoded lookup key.
        key: String,
        /// The step being verified.
        step: &'static str,
        /// State before the step.
        from: &'static str,
        /// The outcome the finder returned.
        observed: String,
    },
}

impl VerifyError {
    /// Whether this failure stems from a transient remote error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
