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

use crate::request::{FieldMap, OperationRequest};
use std::sync::Arc;
use std::time::Duration;
use stratus_rpc::Result;
use stratus_rpc::backoff_policy::BackoffPolicy;
use stratus_rpc::incremental_backoff::IncrementalBackoff;
use stratus_rpc::retry_loop::retry_loop;
use stratus_rpc::retry_policy::{LimitedElapsedTime, RetryPolicy};

/// The default time limit for one resource operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// The remote call boundary.
///
/// One implementation per transport. The production implementation signs
/// and POSTs the request to the vendor endpoint; tests substitute scripted
/// responses. Implementations return the decoded response mapping on
/// success and a [stratus_rpc::error::Error] otherwise, with service
/// rejections expressed as [Error::service][stratus_rpc::error::Error::service]
/// so the classifier can read the vendor code.
#[async_trait::async_trait]
pub trait RpcClient: Send + Sync + std::fmt::Debug {
    /// Issues a single attempt of the given request.
    ///
    /// `timeout` is the remaining time in the enclosing retry policy, if
    /// known. Implementations should bound the attempt by it.
    async fn call(&self, request: &OperationRequest, timeout: Option<Duration>)
    -> Result<FieldMap>;
}

/// The operation context threaded through every resource handler call.
///
/// Holds the [RpcClient] and the default retry configuration. Contexts are
/// values: they are built where the provider is configured and passed
/// explicitly into each operation. Cloning is cheap.
///
/// # Example
/// ```no_run
/// # use stratus_provider::context::Context;
/// # use stratus_provider::request::OperationRequest;
/// # async fn sample(ctx: &Context) -> stratus_provider::Result<()> {
/// let request = OperationRequest::new("Hbr", "2017-09-08", "DescribeRestoreJobs")
///     .set_field("RestoreId", "r-0001");
/// let response = ctx.execute(&request, true).await?;
/// println!("status = {:?}", response.get("Status"));
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct Context {
    client: Arc<dyn RpcClient>,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
}

impl Context {
    /// Creates a context with the default retry configuration: transient
    /// errors retried with incremental backoff for up to
    /// [DEFAULT_OPERATION_TIMEOUT].
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self {
            client,
            retry_policy: Arc::new(LimitedElapsedTime::new(DEFAULT_OPERATION_TIMEOUT)),
            backoff_policy: Arc::new(IncrementalBackoff::default()),
        }
    }

    /// Replaces the retry policy.
    pub fn set_retry_policy<P: RetryPolicy + 'static>(mut self, v: P) -> Self {
        self.retry_policy = Arc::new(v);
        self
    }

    /// Replaces the backoff policy.
    pub fn set_backoff_policy<B: BackoffPolicy + 'static>(mut self, v: B) -> Self {
        self.backoff_policy = Arc::new(v);
        self
    }

    /// Returns a context retrying for at most `timeout`, for operations
    /// whose time budget differs from the default.
    pub fn with_operation_timeout(&self, timeout: Duration) -> Self {
        self.clone()
            .set_retry_policy(LimitedElapsedTime::new(timeout))
    }

    pub fn client(&self) -> &Arc<dyn RpcClient> {
        &self.client
    }

    /// Executes the request with retries.
    ///
    /// Set `idempotent` for reads and for mutations carrying a client
    /// token; only idempotent calls are retried on transient errors.
    pub async fn execute(&self, request: &OperationRequest, idempotent: bool) -> Result<FieldMap> {
        let client = self.client.clone();
        let request = request.clone();
        let inner = async move |timeout| {
            tracing::debug!(
                action = request.action(),
                request = ?request.fields(),
                "issuing rpc call"
            );
            let response = client.call(&request, timeout).await?;
            tracing::debug!(action = request.action(), ?response, "rpc call completed");
            Ok(response)
        };
        // Boxing erases the retry-loop future type: rustc cannot prove the
        // `AsyncFn` opaque `Send` under the higher-ranked lifetimes that
        // `#[async_trait]` callers introduce.
        let fut: std::pin::Pin<Box<dyn Future<Output = Result<FieldMap>> + Send>> =
            Box::pin(retry_loop(
                inner,
                async |d| tokio::time::sleep(d).await,
                idempotent,
                self.retry_policy.clone(),
                self.backoff_policy.clone(),
            ));
        fut.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClient, object, service_error};
    use stratus_rpc::error::Error;
    use stratus_rpc::retry_policy::{RetryPolicyExt, TransientErrors};

    fn throttled() -> Error {
        service_error("Throttling")
    }

    #[tokio::test(start_paused = true)]
    async fn execute_returns_the_response() -> anyhow::Result<()> {
        let client = FakeClient::scripted([Ok(object(serde_json::json!({"RestoreId": "r-1"})))]);
        let ctx = Context::new(client.clone());
        let request = OperationRequest::new("Hbr", "2017-09-08", "CreateRestoreJob");
        let response = ctx.execute(&request, true).await?;
        assert_eq!(response.get("RestoreId"), Some(&serde_json::json!("r-1")));
        assert_eq!(client.actions(), vec!["CreateRestoreJob"]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn execute_retries_throttled_idempotent_calls() -> anyhow::Result<()> {
        let client = FakeClient::scripted([
            Err(throttled()),
            Err(throttled()),
            Ok(object(serde_json::json!({"RestoreId": "r-1"}))),
        ]);
        let ctx = Context::new(client.clone());
        let request = OperationRequest::new("Hbr", "2017-09-08", "DescribeRestoreJobs");
        let response = ctx.execute(&request, true).await?;
        assert_eq!(response.get("RestoreId"), Some(&serde_json::json!("r-1")));
        assert_eq!(client.actions().len(), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn execute_does_not_retry_non_idempotent_calls() {
        let client = FakeClient::scripted([
            Err(throttled()),
            Ok(object(serde_json::json!({"RestoreId": "r-1"}))),
        ]);
        let ctx = Context::new(client.clone());
        let request = OperationRequest::new("Hbr", "2017-09-08", "CreateRestoreJob");
        let error = ctx.execute(&request, false).await.unwrap_err();
        assert!(!error.is_exhausted(), "{error:?}");
        assert_eq!(client.actions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_attempt_limit_is_honored() {
        let client = FakeClient::scripted([
            Err(throttled()),
            Err(throttled()),
            Ok(object(serde_json::json!({}))),
        ]);
        let ctx = Context::new(client.clone())
            .set_retry_policy(TransientErrors.with_attempt_limit(2));
        let request = OperationRequest::new("Hbr", "2017-09-08", "DescribeRestoreJobs");
        let error = ctx.execute(&request, true).await.unwrap_err();
        assert!(error.is_exhausted(), "{error:?}");
        assert_eq!(client.actions().len(), 2);
    }

    #[derive(Clone, Debug, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn execute_logs_the_request_on_every_attempt() -> anyhow::Result<()> {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer({
                let buffer = buffer.clone();
                move || buffer.clone()
            })
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let client = FakeClient::scripted([
            Err(throttled()),
            Ok(object(serde_json::json!({"RestoreId": "r-1"}))),
        ]);
        let ctx = Context::new(client.clone());
        let request = OperationRequest::new("Hbr", "2017-09-08", "DescribeRestoreJobs")
            .set_field("VaultId", "v-0001");
        ctx.execute(&request, true).await?;

        let logs = buffer.contents();
        assert_eq!(logs.matches("issuing rpc call").count(), 2, "{logs}");
        // The failed first attempt still carries the request fields.
        assert!(logs.matches("VaultId").count() >= 2, "{logs}");
        assert_eq!(logs.matches("rpc call completed").count(), 1, "{logs}");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn operation_timeout_bounds_the_retry_loop() {
        let client = FakeClient::scripted([Err(throttled()), Err(throttled()), Err(throttled())]);
        let ctx = Context::new(client.clone());
        let bounded = ctx.with_operation_timeout(Duration::from_secs(4));
        let request = OperationRequest::new("Hbr", "2017-09-08", "DescribeRestoreJobs");
        let error = bounded.execute(&request, true).await.unwrap_err();
        assert!(error.is_exhausted(), "{error:?}");
        // The first backoff is 3s, the second 6s. The 6s sleep would end
        // past the 4s budget, so only two attempts run.
        assert_eq!(client.actions().len(), 2);
    }
}
