//! ClusterClient trait for mocking
//!
//! Platform adapters only ever see this trait. The concrete client talks to
//! the API server; tests use the in-memory mock behind `test-util`.

use crate::context::ReconcileContext;
use crate::error::ClientError;
use k8s_openapi::api::core::v1::Secret;

/// Management-cluster operations available to platform adapters
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClient: Send + Sync {
    async fn get_secret(
        &self,
        ctx: &ReconcileContext,
        namespace: &str,
        name: &str,
    ) -> Result<Secret, ClientError>;

    async fn create_secret(
        &self,
        ctx: &ReconcileContext,
        secret: &Secret,
    ) -> Result<Secret, ClientError>;

    /// Replace an existing secret; `resourceVersion` is honoured when set
    async fn update_secret(
        &self,
        ctx: &ReconcileContext,
        secret: &Secret,
    ) -> Result<Secret, ClientError>;

    async fn delete_secret(
        &self,
        ctx: &ReconcileContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError>;
}

/// Namespace and name of an object, or `InvalidObject` if either is unset
pub(crate) fn object_key(secret: &Secret) -> Result<(&str, &str), ClientError> {
    let namespace = secret
        .metadata
        .namespace
        .as_deref()
        .ok_or_else(|| ClientError::InvalidObject("secret has no namespace".to_string()))?;
    let name = secret
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| ClientError::InvalidObject("secret has no name".to_string()))?;
    Ok((namespace, name))
}
