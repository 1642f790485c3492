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

//! Remote call helpers for the Stratus provider core.
//!
//! Every operation against the vendor API goes through the same motions:
//! build a request, send it, and decide on failure whether the error is a
//! transient fault worth retrying, a missing object, or a permanent problem.
//! This crate contains the pieces shared by all of them: the error type and
//! its classifier, the retry and backoff policies, and the retry loop that
//! drives a single remote call to completion.

/// An alias of [std::result::Result] where the error is always [crate::error::Error].
///
/// This is the result type used by all functions wrapping remote calls.
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// The error type shared by all Stratus crates, and its classifier.
pub mod error;

/// Loop control decisions shared by retry and polling loops.
pub mod loop_state;

/// Traits and implementations for retry policies.
pub mod retry_policy;

/// The trait implemented by all backoff strategies.
pub mod backoff_policy;

/// Linear backoff with a fixed increment and a cap.
pub mod incremental_backoff;

/// Truncated exponential backoff with full jitter.
pub mod exponential_backoff;

/// The retry loop used by all remote calls.
pub mod retry_loop;

#[cfg(test)]
pub(crate) mod mock_rng;
