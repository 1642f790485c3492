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

//! The subscription webhook resource.
//!
//! Webhooks are synchronous and mutable, so this handler exercises the
//! full lifecycle: create and update carry an idempotency token, delete
//! treats an already-gone webhook as success and then polls until the
//! webhook stops being visible.
//!
//! The webhook endpoint reports failures in-band: a response with a `Code`
//! other than `"200"` is a rejection even when the transport succeeded.

use crate::context::Context;
use crate::handler::{DeleteDisposition, ResourceHandler};
use crate::request::{FieldMap, OperationRequest, required_id};
use std::time::Duration;
use stratus_rpc::Result;
use stratus_rpc::error::{Error, Status};
use stratus_wait::{ConvergenceTarget, ObservedState};

pub const RESOURCE_TYPE: &str = "stratus_webhook";

const SERVICE: &str = "MscOpenSubscription";
const API_VERSION: &str = "2021-07-13";
const LOCALE: &str = "en";

const DELETE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// The create request body. Field names follow the remote API.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebhookPayload {
    pub webhook_name: String,
    pub server_url: String,
}

/// Handles the `stratus_webhook` resource type.
#[derive(Clone, Debug, Default)]
pub struct WebhookHandler;

#[async_trait::async_trait]
impl ResourceHandler for WebhookHandler {
    async fn create(&self, ctx: &Context, spec: &FieldMap) -> Result<String> {
        let payload: WebhookPayload =
            serde_json::from_value(serde_json::Value::Object(spec.clone())).map_err(Error::ser)?;
        let request =
            OperationRequest::from_payload(SERVICE, API_VERSION, "CreateWebhook", &payload)?
                .set_field("Locale", LOCALE)
                .set_client_token();
        let response = ctx.execute(&request, true).await?;
        check_response_code(&response, request.action())?;
        required_id(&response, "WebhookId")
    }

    async fn read(&self, ctx: &Context, id: &str) -> Result<Option<FieldMap>> {
        match describe(ctx, id).await {
            Ok(state) => Ok(Some(state.attributes)),
            Err(e) if e.is_not_found() => {
                tracing::debug!(id, "webhook is gone, dropping the record");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn update(&self, ctx: &Context, id: &str, changes: &FieldMap) -> Result<()> {
        if !changes.contains_key("ServerUrl") && !changes.contains_key("WebhookName") {
            return Ok(());
        }
        let request = OperationRequest::new(SERVICE, API_VERSION, "UpdateWebhook")
            .set_field("WebhookId", id)
            .set_field("Locale", LOCALE)
            .set_optional_field("ServerUrl", changes.get("ServerUrl").cloned())
            .set_optional_field("WebhookName", changes.get("WebhookName").cloned())
            .set_client_token();
        let response = ctx.execute(&request, true).await?;
        check_response_code(&response, request.action())
    }

    async fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        let request = OperationRequest::new(SERVICE, API_VERSION, "DeleteWebhook")
            .set_field("WebhookId", id)
            .set_field("Locale", LOCALE);
        // Deletes are naturally idempotent: repeating one observes
        // not-found, which is success.
        match ctx.execute(&request, true).await {
            Ok(_) => (),
            Err(e) if e.is_not_found() => {
                tracing::debug!(id, "webhook was already gone");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        let target = ConvergenceTarget::deleted().set_poll_interval(DELETE_POLL_INTERVAL);
        // A non-lending closure with per-call clones: rustc cannot prove a
        // borrowing closure's future `Send` under the higher-ranked
        // lifetimes that `#[async_trait]` introduces.
        let describe_ctx = ctx.clone();
        let describe_id = id.to_string();
        let describe_webhook = move || {
            let ctx = describe_ctx.clone();
            let id = describe_id.clone();
            async move { describe(&ctx, &id).await }
        };
        DeleteDisposition::Converge(target)
            .settle(describe_webhook)
            .await
    }
}

/// Fetches the webhook. The endpoint returns no `Webhook` object when the
/// id is unknown; that is not-found.
async fn describe(ctx: &Context, id: &str) -> Result<ObservedState> {
    let request = OperationRequest::new(SERVICE, API_VERSION, "GetWebhook")
        .set_field("WebhookId", id)
        .set_field("Locale", LOCALE);
    let response = ctx.execute(&request, true).await?;
    match response.get("Webhook").and_then(|v| v.as_object()) {
        Some(webhook) => Ok(ObservedState::from_response(webhook.clone(), "Status")),
        None => Err(Error::service(
            Status::default()
                .set_code("ResourceNotFound")
                .set_message(format!("webhook {id} does not exist")),
        )),
    }
}

/// Rejections reported in-band become service errors with the reported
/// code, so the classifier and the caller see them like any other
/// rejection.
fn check_response_code(response: &FieldMap, action: &str) -> Result<()> {
    let code = match response.get("Code") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    if code == "200" {
        return Ok(());
    }
    let message = response
        .get("Message")
        .and_then(|v| v.as_str())
        .unwrap_or("the service rejected the request")
        .to_string();
    Err(Error::service(
        Status::default()
            .set_code(code)
            .set_message(format!("{action}: {message}")),
    ))
}
