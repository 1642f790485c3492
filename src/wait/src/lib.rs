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

//! Waits for a remote object to reach a target state.
//!
//! Mutating calls against the vendor API return before the object finishes
//! its transition. A created restore job starts out `CREATED`, moves through
//! `RUNNING`, and ends in `COMPLETE` or `FAILED`; the operation is only done
//! when a terminal state is observed. This crate polls a caller-supplied
//! describe function until the object's status lands in the success set,
//! fails fast when it lands in the failure set, and gives up when the
//! deadline passes.
//!
//! # Example
//! ```no_run
//! # use stratus_wait::{wait_for, ConvergenceTarget, FinalState, ObservedState};
//! # use stratus_rpc::Result;
//! use std::time::Duration;
//!
//! async fn wait_until_available(
//!     describe: impl AsyncFn() -> Result<ObservedState>,
//! ) -> Result<FinalState> {
//!     let target = ConvergenceTarget::new(["Available"])
//!         .set_failure_states(["Failed"])
//!         .set_poll_interval(Duration::from_secs(5))
//!         .set_deadline(Duration::from_secs(10 * 60));
//!     wait_for(describe, &target).await
//! }
//! ```

mod target;
mod waiter;
pub use target::*;
pub use waiter::*;
