//! The contract every platform adapter implements

use crate::error::PlatformError;
use crds::{APIEndpoint, HostedCluster, HostedControlPlane};
use hcp_client::{ClusterClient, CreateOrUpdate, ReconcileContext};
use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::rbac::v1::PolicyRule;
use kube::api::DynamicObject;

/// Cloud-specific hooks called by the hosted-cluster controller
#[async_trait::async_trait]
pub trait Platform: Send + Sync {
    /// Reconcile the CAPI infrastructure cluster object. Returns the object
    /// the caller should apply, or `None` if the platform has none yet.
    async fn reconcile_capi_infra_cr(
        &self,
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        create_or_update: &dyn CreateOrUpdate,
        hcluster: &HostedCluster,
        control_plane_namespace: &str,
        api_endpoint: &APIEndpoint,
    ) -> Result<Option<DynamicObject>, PlatformError>;

    /// Pod-level deployment spec for the CAPI infrastructure provider
    fn capi_provider_deployment_spec(
        &self,
        hcluster: &HostedCluster,
        hcp: &HostedControlPlane,
    ) -> Result<DeploymentSpec, PlatformError>;

    /// Copy cloud credentials into the control-plane namespace
    async fn reconcile_credentials(
        &self,
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        create_or_update: &dyn CreateOrUpdate,
        hcluster: &HostedCluster,
        control_plane_namespace: &str,
    ) -> Result<(), PlatformError>;

    /// Configure etcd secret encryption for the control plane
    async fn reconcile_secret_encryption(
        &self,
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        create_or_update: &dyn CreateOrUpdate,
        hcluster: &HostedCluster,
        control_plane_namespace: &str,
    ) -> Result<(), PlatformError>;

    /// RBAC rules the CAPI provider needs in the control-plane namespace
    fn capi_provider_policy_rules(&self) -> Vec<PolicyRule>;

    /// Remove credentials copied by `reconcile_credentials`. Idempotent.
    async fn delete_credentials(
        &self,
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        hcluster: &HostedCluster,
        control_plane_namespace: &str,
    ) -> Result<(), PlatformError>;
}
