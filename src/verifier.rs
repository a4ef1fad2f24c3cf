//! Existence and destroy verification.
//!
//! The verifier answers two questions on top of the [`Finder`]:
//!
//! - does the remote object behind a tracked identity exist right now
//!   ([`Verifier::check_exists`]), and
//! - are all tracked objects of a kind gone after a destroy
//!   ([`Verifier::check_destroyed`]).
//!
//! Every check is a live round trip; nothing is cached between checks.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hemmer_provider_lookup::appsync::{AppSyncApi, DataSourceByApiIdAndName};
//! use hemmer_provider_lookup::finder::LookupContext;
//! use hemmer_provider_lookup::verifier::Verifier;
//!
//! let client: Arc<dyn AppSyncApi> = Arc::new(my_client);
//! let verifier = Verifier::new(client);
//! let ctx = LookupContext::new();
//!
//! verifier
//!     .check_exists(&DataSourceByApiIdAndName, &state, "aws_appsync_datasource.test", &ctx)
//!     .await?;
//! verifier.check_destroyed(&DataSourceByApiIdAndName, &state, &ctx).await?;
//! ```

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument};

use crate::config::VerifierConfig;
use crate::error::{KeyError, VerifyError};
use crate::finder::{Finder, LookupContext, LookupKind};
use crate::key::LookupKey;
use crate::state::StateSnapshot;
use crate::types::{IdentityState, LifecycleStep, LookupOutcome};

/// Checks tracked identities against the remote control plane.
pub struct Verifier<C: ?Sized> {
    finder: Finder<C>,
    config: VerifierConfig,
}

impl<C: ?Sized> Clone for Verifier<C> {
    fn clone(&self) -> Self {
        Self {
            finder: self.finder.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: ?Sized + Send + Sync> Verifier<C> {
    /// Create a verifier with default configuration.
    pub fn new(client: Arc<C>) -> Self {
        Self::with_config(client, VerifierConfig::default())
    }

    /// Create a verifier with custom configuration.
    pub fn with_config(client: Arc<C>, config: VerifierConfig) -> Self {
        Self {
            finder: Finder::with_options(client, config.lookup.clone()),
            config,
        }
    }

    /// The underlying finder.
    pub fn finder(&self) -> &Finder<C> {
        &self.finder
    }

    /// The verifier's configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Check that the object tracked at `address` exists remotely.
    ///
    /// Fails if the address is not tracked, has no identity, or its identity
    /// does not resolve to exactly one remote object.
    pub async fn check_exists<K>(
        &self,
        kind: &K,
        state: &StateSnapshot,
        address: &str,
        ctx: &LookupContext,
    ) -> Result<K::Item, VerifyError>
    where
        K: LookupKind<Client = C>,
    {
        let instance = state
            .get(address)
            .ok_or_else(|| VerifyError::MissingResource {
                kind: kind.name().to_string(),
                address: address.to_string(),
            })?;
        if instance.id.is_empty() {
            return Err(VerifyError::MissingId {
                kind: kind.name().to_string(),
                address: address.to_string(),
            });
        }
        self.check_identity_exists(kind, &instance.id, ctx).await
    }

    /// Check that the object behind a tracked identity exists remotely.
    #[instrument(skip_all, name = "verifier.check_exists", fields(kind = %kind.name(), identity = %identity))]
    pub async fn check_identity_exists<K>(
        &self,
        kind: &K,
        identity: &str,
        ctx: &LookupContext,
    ) -> Result<K::Item, VerifyError>
    where
        K: LookupKind<Client = C>,
    {
        let key = decode_identity(kind, identity)?;
        let outcome = self.lookup(kind, &key, ctx).await?;

        match outcome {
            LookupOutcome::Found(item) => {
                debug!("Existence check passed");
                Ok(item)
            },
            LookupOutcome::TransientFailure(cause) => Err(VerifyError::Transient {
                kind: kind.name().to_string(),
                key: key.encode(),
                cause,
            }),
            other => {
                error!(observed = %other.label(), "Existence check failed");
                Err(VerifyError::UnexpectedOutcome {
                    kind: kind.name().to_string(),
                    key: key.encode(),
                    expected: "found",
                    observed: other.label(),
                })
            },
        }
    }

    /// Check that no object of this kind tracked in `state` still exists.
    ///
    /// Only resources whose type matches the kind's resource type are checked.
    pub async fn check_destroyed<K>(
        &self,
        kind: &K,
        state: &StateSnapshot,
        ctx: &LookupContext,
    ) -> Result<(), VerifyError>
    where
        K: LookupKind<Client = C>,
    {
        let identities: Vec<&str> = state
            .of_type(kind.resource_type())
            .map(|(_, instance)| instance.id.as_str())
            .collect();
        self.check_all_absent(kind, identities, ctx).await
    }

    /// Check that every identity in `identities` is gone remotely.
    ///
    /// All identities are decoded before any lookup is issued; a malformed one
    /// fails the check without touching the remote API. Lookups then run
    /// concurrently, bounded by the configured concurrency. The first failure
    /// in the given order is reported: a found object, a transient failure, or
    /// any outcome the absence policy does not accept.
    #[instrument(skip_all, name = "verifier.check_destroyed", fields(kind = %kind.name()))]
    pub async fn check_all_absent<'a, K, I>(
        &self,
        kind: &K,
        identities: I,
        ctx: &LookupContext,
    ) -> Result<(), VerifyError>
    where
        K: LookupKind<Client = C>,
        I: IntoIterator<Item = &'a str>,
    {
        let keys = identities
            .into_iter()
            .map(|identity| decode_identity(kind, identity))
            .collect::<Result<Vec<_>, _>>()?;
        let total = keys.len();

        let outcomes: Vec<_> = stream::iter(keys)
            .map(|key| async move {
                let outcome = self.lookup(kind, &key, ctx).await;
                (key, outcome)
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        for (key, outcome) in outcomes {
            let outcome = outcome?;
            if outcome.is_absent(self.config.absence) {
                continue;
            }
            let kind_name = kind.name().to_string();
            let err = match outcome {
                LookupOutcome::Found(_) => VerifyError::StillExists {
                    kind: kind_name,
                    key: key.encode(),
                },
                LookupOutcome::TransientFailure(cause) => VerifyError::Transient {
                    kind: kind_name,
                    key: key.encode(),
                    cause,
                },
                other => VerifyError::UnexpectedOutcome {
                    kind: kind_name,
                    key: key.encode(),
                    expected: "not found",
                    observed: other.label(),
                },
            };
            error!(key = %key, error = %err, "Destroy check failed");
            return Err(err);
        }

        info!(checked = total, "Destroy check passed");
        Ok(())
    }

    /// Verify one lifecycle step for an identity and return its next state.
    ///
    /// Apply steps require the object to be found; destroy steps require it
    /// to be absent under the configured policy.
    pub async fn observe<K>(
        &self,
        kind: &K,
        identity: &str,
        state: IdentityState,
        step: LifecycleStep,
        ctx: &LookupContext,
    ) -> Result<IdentityState, VerifyError>
    where
        K: LookupKind<Client = C>,
    {
        let key = decode_identity(kind, identity)?;
        let outcome = self.lookup(kind, &key, ctx).await?;
        if let LookupOutcome::TransientFailure(cause) = outcome {
            return Err(VerifyError::Transient {
                kind: kind.name().to_string(),
                key: key.encode(),
                cause,
            });
        }
        state.advance(step, kind.name(), &key, &outcome, self.config.absence)
    }

    async fn lookup<K>(
        &self,
        kind: &K,
        key: &LookupKey,
        ctx: &LookupContext,
    ) -> Result<LookupOutcome<K::Item>, VerifyError>
    where
        K: LookupKind<Client = C>,
    {
        self.finder
            .lookup(kind, key, ctx)
            .await
            .map_err(|source| malformed(kind, source))
    }
}

fn decode_identity<K: LookupKind>(kind: &K, identity: &str) -> Result<LookupKey, VerifyError> {
    LookupKey::decode(identity, kind.key_shape()).map_err(|source| malformed(kind, source))
}

fn malformed<K: LookupKind>(kind: &K, source: KeyError) -> VerifyError {
    VerifyError::MalformedIdentity {
        kind: kind.name().to_string(),
        source,
    }
}
