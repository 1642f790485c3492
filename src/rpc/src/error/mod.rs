// Copyright 2025 Stratus Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod classify;
mod status;
pub use classify::*;
pub use status::*;

use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The core error returned by all Stratus operations.
///
/// Errors come from multiple sources: the vendor service may reject a call,
/// the transport may fail before a response is received, the retry budget may
/// be exhausted, or a convergence wait may observe a failure state. Most
/// callers just propagate the error. Callers that need to react to a specific
/// condition use the predicates (`is_not_found()`, `is_exhausted()`, ...) or
/// the [classify][Error::classify] method.
///
/// # Example
/// ```
/// use stratus_rpc::error::Error;
/// fn on_delete_error(e: Error) -> Result<(), Error> {
///     if e.is_not_found() {
///         // Already gone, nothing to do.
///         return Ok(());
///     }
///     Err(e)
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl Error {
    /// Creates an error with the information returned by the vendor service.
    ///
    /// # Example
    /// ```
    /// use stratus_rpc::error::{Error, Status};
    /// let status = Status::default()
    ///     .set_code("Throttling.User")
    ///     .set_message("Request was denied due to user flow control");
    /// let error = Error::service(status.clone());
    /// assert_eq!(error.status(), Some(&status));
    /// ```
    pub fn service(status: Status) -> Self {
        Self {
            kind: ErrorKind::Service(Box::new(status)),
            source: None,
        }
    }

    /// Creates an error representing a transport fault.
    ///
    /// The request may or may not have reached the service. These errors are
    /// always classified as retryable; whether a retry is safe is decided by
    /// the retry policy based on idempotency.
    pub fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Transport,
            source: Some(source.into()),
        }
    }

    /// The request could not be sent or the response was lost in transit.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport)
    }

    /// Creates an error representing a client-side timeout.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use stratus_rpc::error::Error;
    /// let error = Error::timeout("simulated timeout");
    /// assert!(error.is_timeout());
    /// assert!(error.source().is_some());
    /// ```
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            source: Some(source.into()),
        }
    }

    /// The request could not be completed before its deadline.
    ///
    /// This is always a client-side generated error. The request may or may
    /// not have started, and it may or may not complete in the service.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Creates an error representing an exhausted retry or polling budget.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use stratus_rpc::error::Error;
    /// let error = Error::exhausted("too many retry attempts");
    /// assert!(error.is_exhausted());
    /// assert!(error.source().is_some());
    /// ```
    pub fn exhausted<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Exhausted,
            source: Some(source.into()),
        }
    }

    /// The operation did not complete before the retry or polling budget
    /// expired.
    ///
    /// This is always a client-side generated error, though it is usually the
    /// result of one or more errors received from the service. The source
    /// chain carries the last error or the last observed state.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::Exhausted)
    }

    /// Creates an error representing a convergence wait that observed a
    /// recognized failure state.
    pub fn target_state<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::TargetState,
            source: Some(source.into()),
        }
    }

    /// A convergence wait observed one of the caller's failure states.
    ///
    /// The remote object reached a terminal state that is not the requested
    /// one, for example `"Failed"` while waiting for `"Available"`. Polling
    /// stopped as soon as the state was observed.
    pub fn is_target_state_failed(&self) -> bool {
        matches!(self.kind, ErrorKind::TargetState)
    }

    /// Creates an error representing a request serialization problem.
    pub fn ser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Serialization,
            source: Some(source.into()),
        }
    }

    /// The request could not be serialized.
    ///
    /// This error is never transient: serialization is deterministic and will
    /// fail again with the same input.
    pub fn is_serialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Serialization)
    }

    /// Creates an error representing a response deserialization problem.
    pub fn deser<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Deserialization,
            source: Some(source.into()),
        }
    }

    /// The response could not be deserialized.
    pub fn is_deserialization(&self) -> bool {
        matches!(self.kind, ErrorKind::Deserialization)
    }

    /// Creates an error not covered by the other categories.
    pub fn other<T: Into<BoxError>>(source: T) -> Self {
        Self {
            kind: ErrorKind::Other,
            source: Some(source.into()),
        }
    }

    /// The detailed status returned by the vendor service, if any.
    ///
    /// Transport faults, timeouts, and other client-side errors return
    /// `None`.
    pub fn status(&self) -> Option<&Status> {
        match &self.kind {
            ErrorKind::Service(status) => Some(status),
            _ => None,
        }
    }

    /// The HTTP status code associated with the error, if any.
    pub fn http_status_code(&self) -> Option<u16> {
        self.status().and_then(|s| s.http_status_code)
    }

    /// Classify this error as retryable, not-found, or fatal.
    ///
    /// Pure over the error value. See [classify] for the rules.
    pub fn classify(&self) -> ErrorClass {
        classify(self)
    }

    /// The object named by the request does not exist.
    ///
    /// Surfaced distinctly so callers can treat "already gone" as non-fatal
    /// on delete and read paths, and "not yet visible" as worth another poll
    /// during convergence waits.
    pub fn is_not_found(&self) -> bool {
        matches!(self.classify(), ErrorClass::NotFound)
    }

    /// The error is a transient service fault and the call may succeed if
    /// attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(self.classify(), ErrorClass::Retryable)
    }
}

#[derive(Debug)]
enum ErrorKind {
    /// The vendor service returned an error status.
    Service(Box<Status>),
    /// The request never completed at the transport level.
    Transport,
    /// A client-side timeout.
    Timeout,
    /// A retry or polling budget was exhausted.
    Exhausted,
    /// A convergence wait observed a failure state.
    TargetState,
    /// The request could not be serialized.
    Serialization,
    /// The response could not be deserialized.
    Deserialization,
    /// Everything else.
    Other,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::Service(status) => write!(f, "the service reported an error: {status}"),
            ErrorKind::Transport => write!(f, "the request failed in transit"),
            ErrorKind::Timeout => write!(f, "the request exceeded its deadline"),
            ErrorKind::Exhausted => write!(f, "the retry or polling budget was exhausted"),
            ErrorKind::TargetState => write!(f, "the object reached a failure state"),
            ErrorKind::Serialization => write!(f, "cannot serialize the request"),
            ErrorKind::Deserialization => write!(f, "cannot deserialize the response"),
            ErrorKind::Other => write!(f, "an error in the client library"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}
