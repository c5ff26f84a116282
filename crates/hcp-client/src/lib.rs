//! Management-cluster client
//!
//! A narrow async client over the objects platform adapters read and write
//! in the management cluster, plus the create-or-update primitive used to
//! reconcile them.
//!
//! # Example
//!
//! ```no_run
//! use hcp_client::{ClusterClient, KubeClusterClient, ReconcileContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeClusterClient::new(kube::Client::try_default().await?);
//! let ctx = ReconcileContext::new();
//! let secret = client.get_secret(&ctx, "clusters", "oci-credentials").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod context;
pub mod error;
#[path = "trait.rs"]
pub mod cluster_trait;
pub mod upsert;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeClusterClient;
pub use context::ReconcileContext;
pub use error::ClientError;
pub use cluster_trait::ClusterClient;
pub use upsert::{CreateOrUpdate, CreateOrUpdateProvider, MutateFn, OperationResult};
#[cfg(feature = "test-util")]
pub use mock::{InjectedFailure, MockClusterClient, Operation, WriteRecord};
