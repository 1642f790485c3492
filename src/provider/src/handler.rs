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

use crate::context::Context;
use crate::request::FieldMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use stratus_rpc::Result;
use stratus_rpc::error::Error;
use stratus_wait::{ConvergenceTarget, ObservedState, wait_for};

/// The lifecycle operations of one resource type.
///
/// Implementations receive the [Context] explicitly on every call and use
/// it for all remote traffic. The identifier returned by `create` is what
/// `read`, `update` and `delete` later receive.
///
/// `read` distinguishes "the resource is gone" (`Ok(None)`, the caller
/// drops it from its records) from a failed read (`Err`); no error is
/// raised for a missing resource.
#[async_trait::async_trait]
pub trait ResourceHandler: Send + Sync + std::fmt::Debug {
    /// Creates the resource and returns its identifier.
    ///
    /// Implementations wait until the resource is usable before returning,
    /// so a successful create hands back a resource the caller can act on.
    async fn create(&self, ctx: &Context, spec: &FieldMap) -> Result<String>;

    /// Reads the current attributes, or `None` if the resource is gone.
    async fn read(&self, ctx: &Context, id: &str) -> Result<Option<FieldMap>>;

    /// Applies the changed fields to the resource.
    async fn update(&self, ctx: &Context, id: &str, changes: &FieldMap) -> Result<()>;

    /// Deletes the resource. Deleting a resource that is already gone
    /// succeeds.
    async fn delete(&self, ctx: &Context, id: &str) -> Result<()>;
}

/// Maps resource-type identifiers to their handlers.
///
/// # Example
/// ```
/// # use stratus_provider::handler::Registry;
/// # use stratus_provider::webhook::{self, WebhookHandler};
/// let mut registry = Registry::new();
/// registry.register(webhook::RESOURCE_TYPE, WebhookHandler);
/// assert!(registry.handler(webhook::RESOURCE_TYPE).is_ok());
/// assert!(registry.handler("stratus_unknown").is_err());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a resource type, replacing any previous
    /// registration.
    pub fn register<S, H>(&mut self, resource_type: S, handler: H)
    where
        S: Into<String>,
        H: ResourceHandler + 'static,
    {
        self.handlers.insert(resource_type.into(), Arc::new(handler));
    }

    /// Looks up the handler for a resource type.
    pub fn handler(&self, resource_type: &str) -> Result<Arc<dyn ResourceHandler>> {
        self.handlers
            .get(resource_type)
            .cloned()
            .ok_or_else(|| Error::other(UnknownResourceType(resource_type.to_string())))
    }

    /// The registered resource types, in no particular order.
    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// No handler is registered for the requested resource type.
#[derive(Debug, thiserror::Error)]
#[error("no handler registered for resource type {0}")]
pub struct UnknownResourceType(pub String);

/// How a delete operation confirms the resource is gone.
///
/// Prefer [Converge][DeleteDisposition::Converge]: poll the describe call
/// until it reports not-found. [FixedDelay][DeleteDisposition::FixedDelay]
/// exists only for resources whose service offers no observable delete
/// state; it sleeps unconditionally and learns nothing.
#[derive(Clone, Debug)]
pub enum DeleteDisposition {
    /// Poll until the describe call reports the resource gone, or until a
    /// terminal state in the target is reached.
    Converge(ConvergenceTarget),
    /// Sleep a fixed settle delay after the delete call returns.
    FixedDelay(Duration),
}

impl DeleteDisposition {
    /// Waits until the delete is settled per this disposition.
    ///
    /// `describe` is only called for [Converge][DeleteDisposition::Converge].
    pub async fn settle<D>(&self, describe: D) -> Result<()>
    where
        D: AsyncFn() -> Result<ObservedState>,
    {
        match self {
            Self::Converge(target) => {
                wait_for(describe, target).await?;
                Ok(())
            }
            Self::FixedDelay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }
}
