//! Hemmer Provider Lookup
//!
//! Remote-state lookup and existence verification for Hemmer providers.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **Lookup keys**: Simple names and composite `<container>#<name>` identities
//! - **Finder**: Single-object lookups whose result is always classified as one of
//!   found, not found, empty result, too many results, or transient failure
//! - **LookupKind trait**: The per-kind capability (request shape, remote call,
//!   not-found code) that the finder is generic over
//! - **Verifier**: Existence and destroy checks against a declared-state snapshot
//! - **Concrete kinds**: MemoryDB subnet groups and users, AppSync data sources
//! - **Error types**: Typed lookup and verification failures
//! - **Logging**: Integration with `tracing` for structured logging
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use hemmer_provider_lookup::{
//!     memorydb::{MemoryDbApi, SubnetGroupByName},
//!     LookupContext, LookupKey, LookupOutcome, Finder,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     hemmer_provider_lookup::init_logging();
//!
//!     let client: Arc<dyn MemoryDbApi> = Arc::new(my_memorydb_client());
//!     let finder = Finder::new(client);
//!     let key = LookupKey::name("cache-subnets")?;
//!
//!     match finder.lookup(&SubnetGroupByName, &key, &LookupContext::new()).await? {
//!         LookupOutcome::Found(group) => println!("{}", group.arn),
//!         LookupOutcome::NotFound(_) => println!("gone"),
//!         other => eprintln!("inconclusive: {}", other.label()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Outcomes
//!
//! Only a not-found error carrying the kind's registered code means the object
//! is absent. Any other remote error, a cancellation, or a deadline produces a
//! transient failure, which never counts as absence.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod appsync;
pub mod config;
pub mod error;
pub mod finder;
pub mod key;
pub mod logging;
pub mod memorydb;
pub mod state;
pub mod testing;
pub mod types;
pub mod verifier;

// Re-export main types at crate root
pub use config::{ConfigError, LookupOptions, VerifierConfig};
pub use error::{KeyError, LookupError, RemoteError, TransientCause, VerifyError};
pub use finder::{Finder, LookupContext, LookupKind};
pub use key::{KeyShape, LookupKey, IDENTITY_DELIMITER};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use state::{ResourceInstance, StateSnapshot};
pub use types::{AbsencePolicy, IdentityState, LifecycleStep, LookupOutcome};
pub use verifier::Verifier;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tokio_util::sync::CancellationToken;
pub use tonic;
pub use tracing;
