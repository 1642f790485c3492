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

//! Test helpers shared by the unit tests in this crate.

use crate::context::RpcClient;
use crate::request::{FieldMap, OperationRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stratus_rpc::Result;
use stratus_rpc::error::Error;

/// An [RpcClient] returning a scripted sequence of responses.
///
/// Each call pops the next scripted result and records the action name, so
/// tests can assert both the responses observed by the code under test and
/// the exact sequence of remote calls it made.
#[derive(Debug, Default)]
pub(crate) struct FakeClient {
    responses: Mutex<VecDeque<Result<FieldMap>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Clone, Debug)]
pub(crate) struct RecordedCall {
    pub(crate) action: String,
    pub(crate) fields: FieldMap,
}

impl FakeClient {
    /// A client expecting no calls at all.
    pub(crate) fn idle() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn scripted<I>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = Result<FieldMap>>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// The action names of the calls made so far, in order.
    pub(crate) fn actions(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.action.clone())
            .collect()
    }

    /// The full calls made so far, in order.
    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RpcClient for FakeClient {
    async fn call(
        &self,
        request: &OperationRequest,
        _timeout: Option<Duration>,
    ) -> Result<FieldMap> {
        self.calls.lock().unwrap().push(RecordedCall {
            action: request.action().to_string(),
            fields: request.fields().clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::other("fake client script exhausted")))
    }
}

/// Unwraps a `serde_json::json!` literal into a [FieldMap].
pub(crate) fn object(json: serde_json::Value) -> FieldMap {
    match json {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other:?}"),
    }
}

/// A service error with the given vendor code.
pub(crate) fn service_error(code: &str) -> Error {
    Error::service(stratus_rpc::error::Status::default().set_code(code))
}
