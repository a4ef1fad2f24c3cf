//! Testing utilities for lookups and verification.
//!
//! This module provides a scriptable stand-in for the remote control plane
//! so finders and verifiers can be exercised without network access.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hemmer_provider_lookup::error::RemoteError;
//! use hemmer_provider_lookup::finder::{Finder, LookupContext};
//! use hemmer_provider_lookup::key::LookupKey;
//! use hemmer_provider_lookup::testing::{assert_not_found, StubControlPlane, StubKind};
//!
//! # tokio_test::block_on(async {
//! let stub = StubControlPlane::new()
//!     .with_error("missing-group", RemoteError::new("ObjectNotFoundFault", "not found"));
//! let finder = Finder::new(Arc::new(stub));
//! let kind = StubKind::new("SubnetGroup", "ObjectNotFoundFault");
//!
//! let key = LookupKey::name("missing-group").unwrap();
//! let outcome = finder.lookup(&kind, &key, &LookupContext::new()).await.unwrap();
//! assert_not_found(&outcome);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::appsync::{AppSyncApi, GetDataSourceInput, GetDataSourceOutput};
use crate::error::{KeyError, RemoteError};
use crate::finder::LookupKind;
use crate::key::{KeyShape, LookupKey, IDENTITY_DELIMITER};
use crate::memorydb::{
    DescribeSubnetGroupsInput, DescribeSubnetGroupsOutput, DescribeUsersInput,
    DescribeUsersOutput, MemoryDbApi,
};
use crate::types::LookupOutcome;

/// How the stub answers a lookup for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum StubReply {
    /// Succeed with these items. `null` entries stand for missing objects.
    Items(Vec<Value>),
    /// Fail with this error.
    Error(RemoteError),
    /// Never answer.
    Hang,
}

/// A scripted remote control plane.
///
/// Replies are keyed by the encoded lookup key. Keys without a scripted
/// reply get the default reply, an empty item list unless changed.
/// Implements [`MemoryDbApi`] and [`AppSyncApi`], deserializing scripted
/// items into the service models.
#[derive(Debug)]
pub struct StubControlPlane {
    replies: RwLock<HashMap<String, StubReply>>,
    default_reply: StubReply,
    calls: AtomicUsize,
}

impl Default for StubControlPlane {
    fn default() -> Self {
        Self {
            replies: RwLock::new(HashMap::new()),
            default_reply: StubReply::Items(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl StubControlPlane {
    /// Create a stub with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a reply.
    pub fn with_reply(self, key: impl Into<String>, reply: StubReply) -> Self {
        self.set_reply(key, reply);
        self
    }

    /// Script a successful reply.
    pub fn with_items(self, key: impl Into<String>, items: Vec<Value>) -> Self {
        self.with_reply(key, StubReply::Items(items))
    }

    /// Script a failing reply.
    pub fn with_error(self, key: impl Into<String>, error: RemoteError) -> Self {
        self.with_reply(key, StubReply::Error(error))
    }

    /// Script a reply that never arrives.
    pub fn with_hang(self, key: impl Into<String>) -> Self {
        self.with_reply(key, StubReply::Hang)
    }

    /// Change the reply for keys that have none scripted.
    pub fn with_default_reply(mut self, reply: StubReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Replace the reply for a key on a shared stub, e.g. to simulate a destroy.
    pub fn set_reply(&self, key: impl Into<String>, reply: StubReply) {
        let mut replies = self
            .replies
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        replies.insert(key.into(), reply);
    }

    /// Number of remote calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Answer a call for the given encoded key.
    pub async fn call(&self, key: &str) -> Result<Vec<Option<Value>>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = {
            let replies = self
                .replies
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            replies.get(key).cloned().unwrap_or_else(|| self.default_reply.clone())
        };

        match reply {
            StubReply::Items(items) => Ok(items
                .into_iter()
                .map(|item| if item.is_null() { None } else { Some(item) })
                .collect()),
            StubReply::Error(err) => Err(err),
            StubReply::Hang => {
                std::future::pending::<Result<Vec<Option<Value>>, RemoteError>>().await
            },
        }
    }

    async fn call_typed<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Vec<Option<T>>, RemoteError> {
        self.call(key)
            .await?
            .into_iter()
            .map(|item| match item {
                Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
                    RemoteError::uncoded(format!("stub item for {} is malformed: {}", key, e))
                }),
                None => Ok(None),
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl MemoryDbApi for StubControlPlane {
    async fn describe_subnet_groups(
        &self,
        input: &DescribeSubnetGroupsInput,
    ) -> Result<DescribeSubnetGroupsOutput, RemoteError> {
        let key = input.subnet_group_name.clone().unwrap_or_default();
        Ok(DescribeSubnetGroupsOutput {
            subnet_groups: self.call_typed(&key).await?,
            next_token: None,
        })
    }

    async fn describe_users(
        &self,
        input: &DescribeUsersInput,
    ) -> Result<DescribeUsersOutput, RemoteError> {
        let key = input.user_name.clone().unwrap_or_default();
        Ok(DescribeUsersOutput {
            users: self.call_typed(&key).await?,
            next_token: None,
        })
    }
}

#[async_trait::async_trait]
impl AppSyncApi for StubControlPlane {
    async fn get_data_source(
        &self,
        input: &GetDataSourceInput,
    ) -> Result<GetDataSourceOutput, RemoteError> {
        let key = format!("{}{}{}", input.api_id, IDENTITY_DELIMITER, input.name);
        let mut items = self.call_typed(&key).await?;
        if items.len() > 1 {
            return Err(RemoteError::uncoded(format!(
                "stub returned {} data sources for a singleton call",
                items.len()
            )));
        }
        Ok(GetDataSourceOutput {
            data_source: items.pop().flatten(),
        })
    }
}

/// A resource kind with a configurable name and not-found code, backed by
/// [`StubControlPlane`]. Items are returned as raw JSON.
#[derive(Debug, Clone)]
pub struct StubKind {
    name: String,
    resource_type: String,
    shape: KeyShape,
    not_found_code: String,
}

impl StubKind {
    /// Create a simple-keyed kind. The resource type defaults to
    /// `stub_<name in lower case>`.
    pub fn new(name: impl Into<String>, not_found_code: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            resource_type: format!("stub_{}", name.to_lowercase()),
            name,
            shape: KeyShape::Simple,
            not_found_code: not_found_code.into(),
        }
    }

    /// Set the key shape.
    pub fn with_shape(mut self, shape: KeyShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the resource type.
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }
}

/// Request issued by [`StubKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubRequest {
    /// The encoded key.
    pub key: String,
}

#[async_trait::async_trait]
impl LookupKind for StubKind {
    type Client = StubControlPlane;
    type Request = StubRequest;
    type Item = Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn key_shape(&self) -> KeyShape {
        self.shape
    }

    fn not_found_code(&self) -> &str {
        &self.not_found_code
    }

    fn build_request(&self, key: &LookupKey) -> Result<Self::Request, KeyError> {
        Ok(StubRequest { key: key.encode() })
    }

    async fn invoke(
        &self,
        client: &StubControlPlane,
        request: &StubRequest,
    ) -> Result<Vec<Option<Value>>, RemoteError> {
        client.call(&request.key).await
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a lookup found an object and return it.
///
/// # Panics
///
/// Panics if the outcome is not `Found`.
pub fn assert_found<T>(outcome: &LookupOutcome<T>) -> &T {
    match outcome {
        LookupOutcome::Found(item) => item,
        other => panic!("Expected found, but got {}", other.label()),
    }
}

/// Assert that a lookup reported the object as not found.
///
/// # Panics
///
/// Panics if the outcome is not `NotFound`.
pub fn assert_not_found<T>(outcome: &LookupOutcome<T>) {
    assert!(
        outcome.is_not_found(),
        "Expected not found, but got {}",
        outcome.label()
    );
}

/// Assert that a lookup returned an empty result.
///
/// # Panics
///
/// Panics if the outcome is not `EmptyResult`.
pub fn assert_empty_result<T>(outcome: &LookupOutcome<T>) {
    assert!(
        matches!(outcome, LookupOutcome::EmptyResult),
        "Expected empty result, but got {}",
        outcome.label()
    );
}

/// Assert that a lookup returned `count` results for a unique key.
///
/// # Panics
///
/// Panics if the outcome is not `TooManyResults(count)`.
pub fn assert_too_many_results<T>(outcome: &LookupOutcome<T>, count: usize) {
    assert!(
        matches!(outcome, LookupOutcome::TooManyResults(n) if *n == count),
        "Expected too many results ({}), but got {}",
        count,
        outcome.label()
    );
}

/// Assert that a lookup failed transiently.
///
/// # Panics
///
/// Panics if the outcome is not `TransientFailure`.
pub fn assert_transient<T>(outcome: &LookupOutcome<T>) {
    assert!(
        matches!(outcome, LookupOutcome::TransientFailure(_)),
        "Expected transient failure, but got {}",
        outcome.label()
    );
}
