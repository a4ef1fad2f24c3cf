//! Remote lookups and their classification.
//!
//! A [`Finder`] issues one describe/get call per lookup and reduces the raw
//! response into a [`LookupOutcome`]. Everything that differs between
//! resource kinds (request building, the remote call, the not-found error
//! code) lives behind the [`LookupKind`] trait; the classification itself is
//! the single function [`classify`].
//!
//! # Classification order
//!
//! 1. The kind's not-found error code → `NotFound`
//! 2. Any other error → `TransientFailure`
//! 3. No items, or a null first item → `EmptyResult`
//! 4. More than one item → `TooManyResults`
//! 5. Otherwise → `Found`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hemmer_provider_lookup::finder::{Finder, LookupContext};
//! use hemmer_provider_lookup::key::LookupKey;
//! use hemmer_provider_lookup::memorydb::{MemoryDbApi, SubnetGroupByName};
//!
//! let client: Arc<dyn MemoryDbApi> = Arc::new(my_client);
//! let finder = Finder::new(client);
//! let key = LookupKey::name("my-subnet-group")?;
//! let group = finder.find(&SubnetGroupByName, &key, &LookupContext::new()).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::LookupOptions;
use crate::{appsync, memorydb};
use crate::error::{KeyError, LookupError, RemoteError, TransientCause};
use crate::key::{KeyShape, LookupKey};
use crate::types::LookupOutcome;

/// Not-found error codes, per resource kind.
///
/// Each remote API signals absence with its own code. The mapping is kept
/// here explicitly; it is never inferred from messages.
pub const NOT_FOUND_CODES: &[(&str, &str)] = &[
    (memorydb::SUBNET_GROUP_KIND, memorydb::SUBNET_GROUP_NOT_FOUND),
    (memorydb::USER_KIND, memorydb::USER_NOT_FOUND),
    (appsync::DATA_SOURCE_KIND, appsync::DATA_SOURCE_NOT_FOUND),
];

/// Look up the not-found error code registered for a kind.
pub fn not_found_code(kind: &str) -> Option<&'static str> {
    NOT_FOUND_CODES
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, code)| *code)
}

/// The capabilities a resource kind supplies to the finder.
#[async_trait::async_trait]
pub trait LookupKind: Send + Sync {
    /// The remote client handle this kind talks to.
    type Client: ?Sized + Send + Sync;
    /// The kind-specific request payload.
    type Request: fmt::Debug + Send + Sync;
    /// The remote object type.
    type Item: Send;

    /// Kind name used in logs and errors (e.g. `SubnetGroup`).
    fn name(&self) -> &str;

    /// The resource type this kind backs in declared state
    /// (e.g. `aws_memorydb_subnet_group`).
    fn resource_type(&self) -> &str;

    /// The shape of key this kind is addressed by.
    fn key_shape(&self) -> KeyShape;

    /// The error code the remote API uses to report absence for this kind.
    fn not_found_code(&self) -> &str;

    /// Build the request payload for a key.
    fn build_request(&self, key: &LookupKey) -> Result<Self::Request, KeyError>;

    /// Issue the remote call.
    ///
    /// Collection APIs return their items as-is; singleton APIs return a
    /// one-element vector holding the optional result.
    async fn invoke(
        &self,
        client: &Self::Client,
        request: &Self::Request,
    ) -> Result<Vec<Option<Self::Item>>, RemoteError>;
}

/// Reduce a raw remote response into a [`LookupOutcome`].
pub fn classify<T>(
    response: Result<Vec<Option<T>>, RemoteError>,
    not_found_code: &str,
) -> LookupOutcome<T> {
    let mut items = match response {
        Err(err) if err.has_code(not_found_code) => return LookupOutcome::NotFound(err),
        Err(err) => return LookupOutcome::TransientFailure(TransientCause::Remote(err)),
        Ok(items) => items,
    };

    if matches!(items.first(), None | Some(None)) {
        return LookupOutcome::EmptyResult;
    }

    if items.len() > 1 {
        return LookupOutcome::TooManyResults(items.len());
    }

    match items.pop().flatten() {
        Some(item) => LookupOutcome::Found(item),
        None => LookupOutcome::EmptyResult,
    }
}

/// Per-call cancellation and deadline.
#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl LookupContext {
    /// A context that is never cancelled and uses the finder's default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Override the finder's timeout for this call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The cancellation token.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Performs lookups against a shared remote client.
///
/// A finder holds no state besides the client handle and its options, so
/// it can be cloned cheaply and used from many tasks at once.
pub struct Finder<C: ?Sized> {
    client: Arc<C>,
    options: LookupOptions,
}

impl<C: ?Sized> Clone for Finder<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            options: self.options.clone(),
        }
    }
}

impl<C: ?Sized + Send + Sync> Finder<C> {
    /// Create a finder with default options.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_options(client, LookupOptions::default())
    }

    /// Create a finder with custom options.
    pub fn with_options(client: Arc<C>, options: LookupOptions) -> Self {
        Self { client, options }
    }

    /// The remote client handle.
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// The finder's options.
    pub fn options(&self) -> &LookupOptions {
        &self.options
    }

    /// Look up one object and classify the result.
    ///
    /// Only a key that does not fit the kind fails outright; every remote
    /// condition, cancellation included, is reported through the outcome.
    pub async fn lookup<K>(
        &self,
        kind: &K,
        key: &LookupKey,
        ctx: &LookupContext,
    ) -> Result<LookupOutcome<K::Item>, KeyError>
    where
        K: LookupKind<Client = C>,
    {
        let (outcome, _request) = self.lookup_with_request(kind, key, ctx).await?;
        Ok(outcome)
    }

    /// Look up one object, failing unless exactly one was found.
    pub async fn find<K>(
        &self,
        kind: &K,
        key: &LookupKey,
        ctx: &LookupContext,
    ) -> Result<K::Item, LookupError>
    where
        K: LookupKind<Client = C>,
    {
        let (outcome, request) = self.lookup_with_request(kind, key, ctx).await?;
        outcome.into_result(kind.name(), key, &request)
    }

    #[instrument(skip_all, name = "finder.lookup", fields(kind = %kind.name(), key = %key))]
    async fn lookup_with_request<K>(
        &self,
        kind: &K,
        key: &LookupKey,
        ctx: &LookupContext,
    ) -> Result<(LookupOutcome<K::Item>, String), KeyError>
    where
        K: LookupKind<Client = C>,
    {
        key.expect_shape(kind.key_shape())?;
        let request = kind.build_request(key)?;
        let rendered = format!("{:?}", request);

        let timeout = ctx.timeout.or(self.options.timeout);
        let call = kind.invoke(self.client.as_ref(), &request);

        let response = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(TransientCause::Cancelled),
            response = with_deadline(call, timeout) => response,
        };

        let outcome = match response {
            Ok(raw) => classify(raw, kind.not_found_code()),
            Err(cause) => LookupOutcome::TransientFailure(cause),
        };

        match &outcome {
            LookupOutcome::Found(_) => debug!("Lookup found object"),
            LookupOutcome::NotFound(cause) => debug!(error = %cause, "Object not found"),
            LookupOutcome::EmptyResult => {
                warn!(request = %rendered, "Lookup returned an empty result")
            },
            LookupOutcome::TooManyResults(count) => {
                warn!(count = *count, request = %rendered, "Lookup returned too many results")
            },
            LookupOutcome::TransientFailure(cause) => warn!(error = %cause, "Lookup failed"),
        }

        Ok((outcome, rendered))
    }
}

async fn with_deadline<F: Future>(
    future: F,
    timeout: Option<Duration>,
) -> Result<F::Output, TransientCause> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| TransientCause::TimedOut(limit)),
        None => Ok(future.await),
    }
}
