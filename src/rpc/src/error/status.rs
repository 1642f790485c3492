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

use serde::{Deserialize, Serialize};

/// The error payload returned by the vendor service.
///
/// RPC-style vendor APIs report errors as a string code (`"Throttling.User"`,
/// `"EntityNotExist.Role"`, ...) plus a human-readable message and a request
/// id for support escalations. The classifier keys off the code; the request
/// id is carried so user-visible messages stay actionable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
#[non_exhaustive]
pub struct Status {
    /// The vendor error code.
    pub code: String,

    /// A developer-facing description of the error.
    pub message: String,

    /// The id assigned to the failing request, if the response carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// The HTTP status code of the response, if the error came over HTTP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<u16>,
}

impl Status {
    /// Sets the vendor error code.
    pub fn set_code<T: Into<String>>(mut self, v: T) -> Self {
        self.code = v.into();
        self
    }

    /// Sets the error message.
    pub fn set_message<T: Into<String>>(mut self, v: T) -> Self {
        self.message = v.into();
        self
    }

    /// Sets the request id.
    pub fn set_request_id<T: Into<String>>(mut self, v: T) -> Self {
        self.request_id = Some(v.into());
        self
    }

    /// Sets the HTTP status code.
    pub fn set_http_status_code<T: Into<u16>>(mut self, v: T) -> Self {
        self.http_status_code = Some(v.into());
        self
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)?;
        if let Some(id) = &self.request_id {
            write!(f, " [request id: {id}]")?;
        }
        Ok(())
    }
}
