//! Create-or-update
//!
//! Reads the current object, applies a caller-supplied mutation and writes
//! back only when something changed. A write that races with another writer
//! (conflict) or with a deletion (not found) is retried once from a fresh read.

use crate::cluster_trait::{ClusterClient, object_key};
use crate::context::ReconcileContext;
use crate::error::ClientError;
use k8s_openapi::api::core::v1::Secret;
use std::fmt;
use tracing::{debug, warn};

/// What a create-or-update call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    /// Object already matched the desired state
    None,
    Created,
    Updated,
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "unchanged"),
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// Mutation applied to the fetched (or freshly initialised) object. It may be
/// called more than once if the write is retried, so it must be idempotent.
pub type MutateFn<'a> = dyn FnMut(&mut Secret) -> Result<(), ClientError> + Send + 'a;

#[async_trait::async_trait]
pub trait CreateOrUpdate: Send + Sync {
    /// Ensure `object` (identified by its namespace and name) exists with
    /// `mutate` applied
    async fn create_or_update(
        &self,
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        object: Secret,
        mutate: &mut MutateFn<'_>,
    ) -> Result<OperationResult, ClientError>;
}

/// Default read-mutate-write implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOrUpdateProvider;

impl CreateOrUpdateProvider {
    async fn attempt(
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        object: &Secret,
        mutate: &mut MutateFn<'_>,
    ) -> Result<OperationResult, ClientError> {
        let (namespace, name) = object_key(object)?;
        match client.get_secret(ctx, namespace, name).await {
            Ok(existing) => {
                let mut desired = existing.clone();
                mutate(&mut desired)?;
                if object_key(&desired)? != (namespace, name) {
                    return Err(ClientError::InvalidObject(format!(
                        "mutate changed the identity of {namespace}/{name}"
                    )));
                }
                if desired == existing {
                    return Ok(OperationResult::None);
                }
                client.update_secret(ctx, &desired).await?;
                Ok(OperationResult::Updated)
            }
            Err(e) if e.is_not_found() => {
                let mut desired = object.clone();
                mutate(&mut desired)?;
                client.create_secret(ctx, &desired).await?;
                Ok(OperationResult::Created)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl CreateOrUpdate for CreateOrUpdateProvider {
    async fn create_or_update(
        &self,
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        object: Secret,
        mutate: &mut MutateFn<'_>,
    ) -> Result<OperationResult, ClientError> {
        match Self::attempt(ctx, client, &object, mutate).await {
            Err(e) if e.is_conflict() || e.is_not_found() => {
                warn!(error = %e, "Write raced with another change, retrying once");
                Self::attempt(ctx, client, &object, mutate).await
            }
            result => {
                if let Ok(op) = &result {
                    debug!(result = %op, "create_or_update finished");
                }
                result
            }
        }
    }
}
