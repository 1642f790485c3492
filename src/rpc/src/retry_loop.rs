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

use crate::Result;
use crate::backoff_policy::BackoffPolicy;
use crate::error::Error;
use crate::loop_state::LoopState;
use crate::retry_policy::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Runs the retry loop for a given remote call.
///
/// This function calls `inner` as long as (1) the retry policy has not
/// expired, and (2) the last attempt did not succeed. There is at most one
/// call in flight at any time, and the loop sleeps between attempts for the
/// duration prescribed by the backoff policy.
///
/// A backoff sleep is never started if it could not complete before the
/// policy deadline; the loop returns the last error wrapped as an exhausted
/// budget instead. Together with the deadline check inside the retry policy
/// this guarantees that no attempt starts after the deadline.
///
/// # Parameters
/// * `inner` - the remote call. Receives the remaining time in the retry
///   policy, if known, so the transport can bound the attempt timeout.
/// * `sleep` - implements the delay between attempts. Production code passes
///   `tokio::time::sleep`; tests observe the requested delays.
/// * `idempotent` - if `true`, the call is safe to repeat. Mutating calls
///   that carry a client token qualify.
pub async fn retry_loop<F, B, Response>(
    inner: F,
    sleep: B,
    idempotent: bool,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
) -> Result<Response>
where
    F: AsyncFn(Option<Duration>) -> Result<Response> + Send,
    B: AsyncFn(Duration) -> () + Send,
{
    let loop_start = std::time::Instant::now();
    let mut attempt_count = 0;
    loop {
        let remaining_time = retry_policy.remaining_time(loop_start, attempt_count);
        attempt_count += 1;
        match inner(remaining_time).await {
            Ok(response) => return Ok(response),
            Err(error) => {
                tracing::debug!(attempt_count, %error, "remote call attempt failed");
                let delay = backoff_policy.on_failure(loop_start, attempt_count);
                match retry_policy.on_error(loop_start, attempt_count, idempotent, error) {
                    LoopState::Permanent(e) => return Err(e),
                    LoopState::Exhausted(e) => return Err(Error::exhausted(e)),
                    LoopState::Continue(e) => {
                        let expired = retry_policy
                            .remaining_time(loop_start, attempt_count)
                            .is_some_and(|remaining| delay >= remaining);
                        if expired {
                            return Err(Error::exhausted(e));
                        }
                        sleep(delay).await;
                    }
                }
            }
        }
    }
}
