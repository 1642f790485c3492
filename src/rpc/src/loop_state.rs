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

//! Loop control decisions.
//!
//! Retry policies return one of these values after each failed attempt. Only
//! callers implementing their own policies need this type.

use crate::error::Error;

/// The result of a loop control decision.
#[derive(Debug)]
pub enum LoopState {
    /// The error is not retryable, stop the loop.
    Permanent(Error),

    /// The error is retryable, but the policy is stopping the loop.
    ///
    /// Policies stop the loop on retryable errors when a budget runs out,
    /// for example the overall deadline or a maximum attempt count.
    Exhausted(Error),

    /// The error is retryable, continue the loop.
    Continue(Error),
}

impl LoopState {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Consumes the decision and returns the error it carries.
    pub fn into_error(self) -> Error {
        match self {
            Self::Permanent(e) | Self::Exhausted(e) | Self::Continue(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Status;

    #[test]
    fn predicates() {
        let state = LoopState::Permanent(permanent());
        assert!(state.is_permanent(), "{state:?}");
        assert!(!state.is_exhausted(), "{state:?}");
        assert!(!state.is_continue(), "{state:?}");

        let state = LoopState::Exhausted(transient());
        assert!(!state.is_permanent(), "{state:?}");
        assert!(state.is_exhausted(), "{state:?}");
        assert!(!state.is_continue(), "{state:?}");

        let state = LoopState::Continue(transient());
        assert!(!state.is_permanent(), "{state:?}");
        assert!(!state.is_exhausted(), "{state:?}");
        assert!(state.is_continue(), "{state:?}");
    }

    #[test]
    fn into_error() {
        let error = LoopState::Continue(transient()).into_error();
        assert!(error.is_transient(), "{error:?}");
    }

    fn permanent() -> Error {
        Error::service(Status::default().set_code("PermissionDenied"))
    }

    fn transient() -> Error {
        Error::service(Status::default().set_code("ServiceUnavailable"))
    }
}
