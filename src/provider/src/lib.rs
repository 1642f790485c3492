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

//! Resource operation orchestration for Stratus providers.
//!
//! This crate ties the retry layer ([stratus_rpc]) and the convergence
//! layer ([stratus_wait]) together into resource lifecycle operations. A
//! [Context] carries the remote call boundary and the default retry
//! configuration, an [OperationRequest] describes one remote call, and a
//! [ResourceHandler] implements `{create, read, update, delete}` for one
//! resource type. Handlers are looked up by type identifier in a
//! [Registry].
//!
//! Two reference resources exercise the whole stack: [restore_job] shows a
//! create that polls the job status until it runs, and [webhook] shows a
//! full lifecycle including an update with an idempotency token and a
//! delete that treats an already-gone resource as success.

/// The result type used by this crate.
pub type Result<T> = stratus_rpc::Result<T>;

pub mod context;
pub mod handler;
pub mod request;
pub mod restore_job;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{Context, RpcClient};
pub use handler::{DeleteDisposition, Registry, ResourceHandler};
pub use request::{FieldMap, OperationRequest};
