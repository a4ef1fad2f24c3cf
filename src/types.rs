//! Outcome and lifecycle types shared by the finder and the verifier.

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, RemoteError, TransientCause, VerifyError};
use crate::key::LookupKey;

/// The classified result of one remote lookup.
///
/// Exactly one variant is produced per lookup. None of them outlives the
/// caller's handling of it: there is no cache of remote state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome<T> {
    /// Exactly one matching object was retrieved.
    Found(T),
    /// The remote API answered with the kind's not-found error code.
    NotFound(RemoteError),
    /// The call succeeded but returned no object.
    EmptyResult,
    /// The call returned more than one object for a unique key.
    TooManyResults(usize),
    /// Any other failure, including cancellation and timeouts.
    TransientFailure(TransientCause),
}

impl<T> LookupOutcome<T> {
    /// Whether an object was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Whether the remote API explicitly reported the object as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the outcome counts as "does not exist" under the given policy.
    pub fn is_absent(&self, policy: AbsencePolicy) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::EmptyResult => policy == AbsencePolicy::EmptyMeansAbsent,
            _ => false,
        }
    }

    /// Borrow the found object, if any.
    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(item) => Some(item),
            _ => None,
        }
    }

    /// Take the found object, if any.
    pub fn into_found(self) -> Option<T> {
        match self {
            Self::Found(item) => Some(item),
            _ => None,
        }
    }

    /// Map the found object.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LookupOutcome<U> {
        match self {
            Self::Found(item) => LookupOutcome::Found(f(item)),
            Self::NotFound(cause) => LookupOutcome::NotFound(cause),
            Self::EmptyResult => LookupOutcome::EmptyResult,
            Self::TooManyResults(count) => LookupOutcome::TooManyResults(count),
            Self::TransientFailure(cause) => LookupOutcome::TransientFailure(cause),
        }
    }

    /// Short human-readable name of the outcome, used in failure messages.
    pub fn label(&self) -> String {
        match self {
            Self::Found(_) => "found".to_string(),
            Self::NotFound(_) => "not found".to_string(),
            Self::EmptyResult => "empty result".to_string(),
            Self::TooManyResults(count) => format!("too many results ({})", count),
            Self::TransientFailure(cause) => format!("transient failure ({})", cause),
        }
    }

    /// Convert into a `Result`, treating everything but `Found` as an error.
    ///
    /// `kind` and `request` end up in the error for diagnostics.
    pub fn into_result(
        self,
        kind: &str,
        key: &LookupKey,
        request: &str,
    ) -> Result<T, LookupError> {
        let kind = kind.to_string();
        let key = key.encode();
        match self {
            Self::Found(item) => Ok(item),
            Self::NotFound(cause) => Err(LookupError::NotFound {
                kind,
                key,
                request: request.to_string(),
                cause,
            }),
            Self::EmptyResult => Err(LookupError::EmptyResult {
                kind,
                key,
                request: request.to_string(),
            }),
            Self::TooManyResults(count) => Err(LookupError::TooManyResults {
                kind,
                key,
                count,
                request: request.to_string(),
            }),
            Self::TransientFailure(cause) => Err(LookupError::Transient { kind, key, cause }),
        }
    }
}

/// How an `EmptyResult` is interpreted when deciding absence.
///
/// `NotFound` always means absent. `TooManyResults` and transient failures
/// never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AbsencePolicy {
    /// Only an explicit not-found error means absent.
    #[default]
    Strict,
    /// An empty result also means absent.
    EmptyMeansAbsent,
}

/// A step of a conformance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    /// Create or update the resource.
    Apply,
    /// Destroy the resource.
    Destroy,
}

impl LifecycleStep {
    fn as_str(self) -> &'static str {
        match self {
            Self::Apply => "apply",
            Self::Destroy => "destroy",
        }
    }
}

/// What a conformance run knows about one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// Nothing has been applied yet.
    #[default]
    Unknown,
    /// The remote object was retrieved after an apply.
    Present,
    /// The remote object was confirmed gone after a destroy.
    Absent,
}

impl IdentityState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }

    /// Advance the state machine with the outcome observed after `step`.
    ///
    /// Valid paths are `Unknown -> Present` and `Present -> Present` on apply,
    /// and `Present -> Absent` on destroy. Anything else is a failure.
    pub fn advance<T>(
        self,
        step: LifecycleStep,
        kind: &str,
        key: &LookupKey,
        outcome: &LookupOutcome<T>,
        absence: AbsencePolicy,
    ) -> Result<IdentityState, VerifyError> {
        match (self, step) {
            (Self::Unknown | Self::Present, LifecycleStep::Apply) if outcome.is_found() => {
                Ok(Self::Present)
            },
            (Self::Present, LifecycleStep::Destroy) if outcome.is_absent(absence) => {
                Ok(Self::Absent)
            },
            _ => Err(VerifyError::InvalidTransition {
                kind: kind.to_string(),
                key: key.encode(),
                step: step.as_str(),
                from: self.as_str(),
                observed: outcome.label(),
            }),
        }
    }
}
