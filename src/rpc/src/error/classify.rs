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

//! Classifies remote call errors.
//!
//! The retry loop and the convergence waiter only care about three things:
//! is the error a transient fault worth retrying, is the object simply
//! missing, or is the error permanent. Everything else about the error is
//! opaque at this layer.

use super::Error;

/// The classification of a remote call error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// A transient fault: throttling, service busy, a temporary network
    /// problem. Retrying may succeed.
    Retryable,
    /// The object named by the request does not exist. This covers both
    /// already-deleted and not-yet-visible objects.
    NotFound,
    /// Anything else. Retrying will not help.
    Fatal,
}

/// Vendor error codes reported for transient faults.
///
/// The list mirrors the codes the vendor documents as safe to retry. Codes
/// with a `.` suffix family (`Throttling.User`, `Throttling.Api`) are matched
/// by prefix.
const RETRYABLE_CODES: &[&str] = &[
    "Throttling",
    "ServiceUnavailable",
    "ServiceBusy",
    "SystemBusy",
    "InternalError",
    "OperationConflict",
    "LastTokenProcessing",
    "OperationDenied.ConcurrentOperation",
];

/// Vendor error codes reported when the named object does not exist.
const NOT_FOUND_CODES: &[&str] = &[
    "EntityNotExist",
    "ResourceNotFound",
    "ResourceNotfound",
    "Forbidden.ResourceNotFound",
    "InvalidParameter.DomainNotExist",
];

const RETRYABLE_HTTP: &[http::StatusCode] = &[
    http::StatusCode::TOO_MANY_REQUESTS,
    http::StatusCode::INTERNAL_SERVER_ERROR,
    http::StatusCode::BAD_GATEWAY,
    http::StatusCode::SERVICE_UNAVAILABLE,
];

/// Classify an error into exactly one of [ErrorClass]'s variants.
///
/// Transport faults and client-side timeouts are retryable: the request may
/// not have reached the service, and even when it did, mutating calls carry
/// client tokens so the service can deduplicate. Service errors are matched
/// against the known retryable and not-found code sets, falling back to the
/// HTTP status code. Unmatched errors are fatal.
///
/// # Example
/// ```
/// use stratus_rpc::error::{classify, Error, ErrorClass, Status};
/// let error = Error::service(Status::default().set_code("Throttling.User"));
/// assert_eq!(classify(&error), ErrorClass::Retryable);
/// ```
pub fn classify(error: &Error) -> ErrorClass {
    classify_with(error, &[])
}

/// Classify an error, treating `extra_retryable` codes as retryable too.
///
/// Some operations transiently fail with codes that are permanent elsewhere.
/// A describe call during a state transition may report `IncorrectStatus`,
/// for example. Callers list those codes per operation.
pub fn classify_with(error: &Error, extra_retryable: &[&str]) -> ErrorClass {
    if error.is_transport() || error.is_timeout() {
        return ErrorClass::Retryable;
    }
    let Some(status) = error.status() else {
        return ErrorClass::Fatal;
    };
    if matches_code(&status.code, NOT_FOUND_CODES) || status.code.ends_with(".NotFound") {
        return ErrorClass::NotFound;
    }
    if matches_code(&status.code, RETRYABLE_CODES)
        || extra_retryable.iter().any(|c| *c == status.code)
    {
        return ErrorClass::Retryable;
    }
    match status.http_status_code {
        Some(code) if code == http::StatusCode::NOT_FOUND.as_u16() => ErrorClass::NotFound,
        Some(code) if RETRYABLE_HTTP.iter().any(|s| s.as_u16() == code) => ErrorClass::Retryable,
        _ => ErrorClass::Fatal,
    }
}

fn matches_code(code: &str, set: &[&str]) -> bool {
    set.iter().any(|known| {
        code == *known || (code.starts_with(known) && code.as_bytes().get(known.len()) == Some(&b'.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    fn service(code: &str) -> Error {
        Error::service(Status::default().set_code(code).set_message("test only"))
    }

    #[test_case::test_case("Throttling")]
    #[test_case::test_case("Throttling.User")]
    #[test_case::test_case("Throttling.Api")]
    #[test_case::test_case("ServiceUnavailable")]
    #[test_case::test_case("SystemBusy")]
    #[test_case::test_case("ServiceBusy")]
    #[test_case::test_case("InternalError")]
    #[test_case::test_case("OperationConflict")]
    #[test_case::test_case("LastTokenProcessing")]
    #[test_case::test_case("OperationDenied.ConcurrentOperation")]
    fn retryable_codes(code: &str) {
        assert_eq!(classify(&service(code)), ErrorClass::Retryable, "{code}");
    }

    #[test_case::test_case("EntityNotExist")]
    #[test_case::test_case("EntityNotExist.Role")]
    #[test_case::test_case("ResourceNotFound")]
    #[test_case::test_case("Forbidden.ResourceNotFound")]
    #[test_case::test_case("InvalidRestoreId.NotFound")]
    #[test_case::test_case("Domain.NotFound")]
    fn not_found_codes(code: &str) {
        assert_eq!(classify(&service(code)), ErrorClass::NotFound, "{code}");
    }

    #[test_case::test_case("PermissionDenied")]
    #[test_case::test_case("InvalidParameter")]
    #[test_case::test_case("ThrottlingAbsolutelyNot"; "prefix requires a dot boundary")]
    #[test_case::test_case("EntityNotExistential"; "not-found prefix needs a boundary too")]
    fn fatal_codes(code: &str) {
        assert_eq!(classify(&service(code)), ErrorClass::Fatal, "{code}");
    }

    #[test]
    fn transport_and_timeout_are_retryable() {
        let error = Error::transport(std::io::Error::other("reset"));
        assert_eq!(classify(&error), ErrorClass::Retryable);
        let error = Error::timeout("deadline");
        assert_eq!(classify(&error), ErrorClass::Retryable);
    }

    #[test]
    fn client_side_errors_are_fatal() {
        assert_eq!(classify(&Error::ser("x")), ErrorClass::Fatal);
        assert_eq!(classify(&Error::deser("x")), ErrorClass::Fatal);
        assert_eq!(classify(&Error::other("x")), ErrorClass::Fatal);
        assert_eq!(classify(&Error::exhausted("x")), ErrorClass::Fatal);
    }

    #[test]
    fn http_status_fallback() {
        let error = Error::service(
            Status::default()
                .set_code("Unknown")
                .set_http_status_code(503_u16),
        );
        assert_eq!(classify(&error), ErrorClass::Retryable);

        let error = Error::service(
            Status::default()
                .set_code("Unknown")
                .set_http_status_code(404_u16),
        );
        assert_eq!(classify(&error), ErrorClass::NotFound);

        let error = Error::service(
            Status::default()
                .set_code("Unknown")
                .set_http_status_code(400_u16),
        );
        assert_eq!(classify(&error), ErrorClass::Fatal);
    }

    #[test]
    fn extra_retryable_codes() {
        let error = service("IncorrectStatus");
        assert_eq!(classify(&error), ErrorClass::Fatal);
        assert_eq!(
            classify_with(&error, &["IncorrectStatus"]),
            ErrorClass::Retryable
        );
        // Extras never shadow the not-found classification.
        let error = service("ResourceNotFound");
        assert_eq!(
            classify_with(&error, &["ResourceNotFound"]),
            ErrorClass::NotFound
        );
    }
}
