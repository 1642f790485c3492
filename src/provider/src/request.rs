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

use stratus_rpc::Result;
use stratus_rpc::error::Error;

/// A request or response mapping, as sent to and received from the remote
/// endpoint.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// The client token field recognized by the remote endpoint.
const CLIENT_TOKEN_FIELD: &str = "ClientToken";

/// Remote endpoints bound the token length.
const CLIENT_TOKEN_MAX_LEN: usize = 64;

/// One remote call: the target action and the request fields.
///
/// Requests are built once per invocation. Prefer typed construction via
/// [from_payload][OperationRequest::from_payload] with a `serde` payload
/// struct; `set_field()` and `set_optional_field()` remain as an escape
/// hatch for fields no payload struct models.
///
/// # Example
/// ```
/// # use stratus_provider::request::OperationRequest;
/// let request = OperationRequest::new("MscOpenSubscription", "2021-07-13", "CreateWebhook")
///     .set_field("WebhookName", "alerts")
///     .set_optional_field("ServerUrl", None::<String>)
///     .set_client_token();
/// assert!(request.fields().get("ServerUrl").is_none());
/// assert!(request.has_client_token());
/// ```
#[derive(Clone, Debug)]
pub struct OperationRequest {
    service: String,
    api_version: String,
    action: String,
    fields: FieldMap,
}

impl OperationRequest {
    /// Creates an empty request for the given service endpoint and action.
    pub fn new<S, V, A>(service: S, api_version: V, action: A) -> Self
    where
        S: Into<String>,
        V: Into<String>,
        A: Into<String>,
    {
        Self {
            service: service.into(),
            api_version: api_version.into(),
            action: action.into(),
            fields: FieldMap::new(),
        }
    }

    /// Creates a request with the fields of a serializable payload.
    ///
    /// The payload must serialize to a JSON object. Fields the payload
    /// skips (`skip_serializing_if`) are absent from the request, which is
    /// how optional-if-present fields are expressed.
    pub fn from_payload<S, V, A, T>(service: S, api_version: V, action: A, payload: &T) -> Result<Self>
    where
        S: Into<String>,
        V: Into<String>,
        A: Into<String>,
        T: serde::Serialize,
    {
        let value = serde_json::to_value(payload).map_err(Error::ser)?;
        let serde_json::Value::Object(fields) = value else {
            return Err(Error::ser(NotAnObject));
        };
        Ok(Self {
            service: service.into(),
            api_version: api_version.into(),
            action: action.into(),
            fields,
        })
    }

    /// Sets a request field, replacing any previous value.
    pub fn set_field<K, W>(mut self, name: K, value: W) -> Self
    where
        K: Into<String>,
        W: Into<serde_json::Value>,
    {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets a request field only when a value is present.
    pub fn set_optional_field<K, W>(self, name: K, value: Option<W>) -> Self
    where
        K: Into<String>,
        W: Into<serde_json::Value>,
    {
        match value {
            Some(value) => self.set_field(name, value),
            None => self,
        }
    }

    /// Attaches a fresh idempotency token to the request.
    ///
    /// With a token attached, the remote endpoint deduplicates repeated
    /// deliveries of the same mutation, so the call is safe to retry.
    pub fn set_client_token(mut self) -> Self {
        let token = build_client_token(&self.action);
        self.fields.insert(CLIENT_TOKEN_FIELD.into(), token.into());
        self
    }

    /// Returns `true` if an idempotency token is attached.
    pub fn has_client_token(&self) -> bool {
        self.fields.contains_key(CLIENT_TOKEN_FIELD)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

/// Builds a unique idempotency token tagged with the originating action.
fn build_client_token(action: &str) -> String {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let mut token = format!("{action}-{stamp}-{}", uuid::Uuid::new_v4().simple());
    token.truncate(CLIENT_TOKEN_MAX_LEN);
    token
}

/// The payload given to [OperationRequest::from_payload] did not serialize
/// to a JSON object.
#[derive(Debug, thiserror::Error)]
#[error("request payloads must serialize to a JSON object")]
pub struct NotAnObject;

/// Returns a required string field of a response.
pub fn required_str<'a>(response: &'a FieldMap, name: &str) -> Result<&'a str> {
    response
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::deser(MissingField(name.to_string())))
}

/// Returns a required identifier field of a response.
///
/// Some endpoints return identifiers as JSON numbers; both strings and
/// numbers are accepted.
pub fn required_id(response: &FieldMap, name: &str) -> Result<String> {
    match response.get(name) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(Error::deser(MissingField(name.to_string()))),
    }
}

/// A response is missing a field the caller requires.
#[derive(Debug, thiserror::Error)]
#[error("the response is missing the required field {0}")]
pub struct MissingField(pub String);
