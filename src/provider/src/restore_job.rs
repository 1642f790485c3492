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

//! The backup restore-job resource.
//!
//! Restore jobs are asynchronous: the create call only enqueues the job,
//! so the handler polls the job status until it reaches `RUNNING` or
//! `COMPLETE` before returning. A job that reports `FAILED` during that
//! wait fails the create. Jobs cannot be destroyed; they expire on the
//! service side, so `delete` only drops the caller's record.

use crate::context::Context;
use crate::handler::ResourceHandler;
use crate::request::{FieldMap, OperationRequest, required_str};
use std::time::Duration;
use stratus_rpc::Result;
use stratus_rpc::error::{Error, Status};
use stratus_rpc::retry_policy::{RetryPolicyExt, TransientErrorsWithCodes};
use stratus_wait::{ConvergenceTarget, ObservedState, wait_for};

pub const RESOURCE_TYPE: &str = "stratus_restore_job";

const SERVICE: &str = "hbr";
const API_VERSION: &str = "2017-09-08";
const STATUS_FIELD: &str = "Status";

const CREATE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// The create request body. Field names follow the remote API.
///
/// `restore_type` and `source_type` are required; everything else is sent
/// only when present. Which of the optional fields apply depends on the
/// source type, the service validates the combination.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestoreJobPayload {
    pub restore_type: String,
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_file_system_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

/// Handles the `stratus_restore_job` resource type.
#[derive(Clone, Debug, Default)]
pub struct RestoreJobHandler;

#[async_trait::async_trait]
impl ResourceHandler for RestoreJobHandler {
    async fn create(&self, ctx: &Context, spec: &FieldMap) -> Result<String> {
        let payload: RestoreJobPayload =
            serde_json::from_value(serde_json::Value::Object(spec.clone())).map_err(Error::ser)?;
        let request =
            OperationRequest::from_payload(SERVICE, API_VERSION, "CreateRestoreJob", &payload)?
                .set_client_token();
        let ctx = ctx.with_operation_timeout(CREATE_TIMEOUT);
        let response = ctx.execute(&request, true).await?;
        let restore_id = required_str(&response, "RestoreId")?;
        // Identifiers are composite: the describe call filters by restore
        // type as well as by id.
        let id = format!("{restore_id}:{}", payload.restore_type);

        let target = ConvergenceTarget::new(["RUNNING", "COMPLETE"])
            .set_failure_states(["FAILED"])
            .set_poll_interval(POLL_INTERVAL)
            .set_deadline(CREATE_TIMEOUT);
        // A non-lending closure with per-call clones: rustc cannot prove a
        // borrowing closure's future `Send` under the higher-ranked
        // lifetimes that `#[async_trait]` introduces.
        let describe_id = id.clone();
        let describe_job = move || {
            let ctx = ctx.clone();
            let id = describe_id.clone();
            async move { describe(&ctx, &id).await }
        };
        wait_for(describe_job, &target).await?;
        Ok(id)
    }

    async fn read(&self, ctx: &Context, id: &str) -> Result<Option<FieldMap>> {
        match describe(ctx, id).await {
            Ok(state) => Ok(Some(state.attributes)),
            Err(e) if e.is_not_found() => {
                tracing::debug!(id, "restore job is gone, dropping the record");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn update(&self, _ctx: &Context, _id: &str, _changes: &FieldMap) -> Result<()> {
        // Every field of a restore job is fixed at creation.
        Err(Error::other(ImmutableResource))
    }

    async fn delete(&self, _ctx: &Context, id: &str) -> Result<()> {
        tracing::warn!(id, "restore jobs cannot be deleted; dropping the record only");
        Ok(())
    }
}

/// Fetches the current job state. An empty result set is not-found.
async fn describe(ctx: &Context, id: &str) -> Result<ObservedState> {
    let (restore_id, restore_type) = parse_id(id)?;
    let request = OperationRequest::new(SERVICE, API_VERSION, "DescribeRestoreJobs2")
        .set_field("RestoreType", restore_type)
        .set_field(
            "Filters",
            serde_json::json!([{"Key": "RestoreId", "Values": [restore_id]}]),
        );
    // A describe issued mid-transition can report IncorrectStatus until the
    // job settles. Describe calls carry their own retry budget.
    let ctx = ctx.clone().set_retry_policy(
        TransientErrorsWithCodes::new(["IncorrectStatus"]).with_time_limit(DESCRIBE_TIMEOUT),
    );
    let response = ctx.execute(&request, true).await?;
    let job = response
        .get("RestoreJobs")
        .and_then(|v| v.get("RestoreJob"))
        .and_then(|v| v.as_array())
        .and_then(|jobs| jobs.first())
        .and_then(|v| v.as_object());
    match job {
        Some(job) => Ok(ObservedState::from_response(job.clone(), STATUS_FIELD)),
        None => Err(Error::service(
            Status::default()
                .set_code("EntityNotExist.RestoreJob")
                .set_message(format!("restore job {id} does not exist")),
        )),
    }
}

fn parse_id(id: &str) -> Result<(&str, &str)> {
    id.split_once(':')
        .ok_or_else(|| Error::other(MalformedId(id.to_string())))
}

#[derive(Debug, thiserror::Error)]
#[error("restore jobs are immutable, replace the resource instead")]
struct ImmutableResource;

#[derive(Debug, thiserror::Error)]
#[error("expected a <restore id>:<restore type> identifier, got {0}")]
struct MalformedId(String);
