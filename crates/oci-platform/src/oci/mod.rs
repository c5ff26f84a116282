//! Oracle Cloud Infrastructure platform adapter
//!
//! Deploys the CAPI OCI provider into the control-plane namespace and keeps
//! a copy of the user's OCI API credentials next to it. Infrastructure
//! cluster objects and secret encryption are not managed yet; both hooks
//! succeed without doing anything.

mod deployment;
mod rbac;
#[cfg(test)]
mod oci_test;

use crate::error::PlatformError;
use crate::platform::Platform;
use crds::{APIEndpoint, CAPI_PROVIDER_OCI_IMAGE_ANNOTATION, HostedCluster, HostedControlPlane};
use hcp_client::{ClientError, ClusterClient, CreateOrUpdate, ReconcileContext};
use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::api::rbac::v1::PolicyRule;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use kube::api::DynamicObject;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Entry in the credentials secret holding the OCI CLI-style config file
pub const CREDENTIALS_CONFIG_KEY: &str = "config";

/// Entry in the credentials secret holding the PEM API signing key
pub const CREDENTIALS_KEY_KEY: &str = "key";

const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// OCI platform adapter
#[derive(Debug, Clone, Default)]
pub struct Oci {
    capi_provider_image: String,
}

impl Oci {
    /// `capi_provider_image` may be empty if every HostedCluster is expected
    /// to carry the override annotation.
    pub fn new(capi_provider_image: impl Into<String>) -> Self {
        Self {
            capi_provider_image: capi_provider_image.into(),
        }
    }

    /// Provider image for `hcluster`: the annotation wins over the default,
    /// even when the annotation value is empty.
    fn provider_image<'a>(&'a self, hcluster: &'a HostedCluster) -> Result<&'a str, PlatformError> {
        let image = hcluster
            .annotations()
            .get(CAPI_PROVIDER_OCI_IMAGE_ANNOTATION)
            .map_or(self.capi_provider_image.as_str(), String::as_str);
        if image.is_empty() {
            return Err(PlatformError::ProviderImageNotSpecified);
        }
        Ok(image)
    }
}

#[async_trait::async_trait]
impl Platform for Oci {
    async fn reconcile_capi_infra_cr(
        &self,
        _ctx: &ReconcileContext,
        _client: &dyn ClusterClient,
        _create_or_update: &dyn CreateOrUpdate,
        hcluster: &HostedCluster,
        control_plane_namespace: &str,
        _api_endpoint: &APIEndpoint,
    ) -> Result<Option<DynamicObject>, PlatformError> {
        // OCICluster objects need the CAPOCI API types; until then there is
        // nothing to reconcile.
        debug!(
            hosted_cluster = %hcluster.name_any(),
            control_plane_namespace,
            "No CAPI infrastructure cluster object for OCI"
        );
        Ok(None)
    }

    fn capi_provider_deployment_spec(
        &self,
        hcluster: &HostedCluster,
        _hcp: &HostedControlPlane,
    ) -> Result<DeploymentSpec, PlatformError> {
        let image = self.provider_image(hcluster)?;
        Ok(deployment::provider_deployment_spec(image))
    }

    #[instrument(skip_all, fields(hosted_cluster = %hcluster.name_any(), control_plane_namespace = %control_plane_namespace))]
    async fn reconcile_credentials(
        &self,
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        create_or_update: &dyn CreateOrUpdate,
        hcluster: &HostedCluster,
        control_plane_namespace: &str,
    ) -> Result<(), PlatformError> {
        let oci = hcluster.oci().ok_or(PlatformError::MissingPlatformSpec)?;
        let secret_name = oci.identity_ref.name.as_str();
        let source_namespace = hcluster.namespace().unwrap_or_default();

        let source = client
            .get_secret(ctx, &source_namespace, secret_name)
            .await
            .map_err(|e| {
                PlatformError::from_client(e, |source| PlatformError::GetCredentials {
                    name: secret_name.to_string(),
                    source,
                })
            })?;

        let mut data = source.data.unwrap_or_default();
        let config = data
            .remove(CREDENTIALS_CONFIG_KEY)
            .ok_or(PlatformError::MissingCredentialsKey(CREDENTIALS_CONFIG_KEY))?;
        let key = data
            .remove(CREDENTIALS_KEY_KEY)
            .ok_or(PlatformError::MissingCredentialsKey(CREDENTIALS_KEY_KEY))?;
        let payload = BTreeMap::from([
            (CREDENTIALS_CONFIG_KEY.to_string(), config),
            (CREDENTIALS_KEY_KEY.to_string(), key),
        ]);

        let target = Secret {
            metadata: ObjectMeta {
                name: Some(secret_name.to_string()),
                namespace: Some(control_plane_namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = create_or_update
            .create_or_update(
                ctx,
                client,
                target,
                &mut |secret: &mut Secret| -> Result<(), ClientError> {
                    secret.type_ = Some(SECRET_TYPE_OPAQUE.to_string());
                    secret.data = Some(payload.clone());
                    Ok(())
                },
            )
            .await
            .map_err(|e| {
                PlatformError::from_client(e, |source| PlatformError::ReconcileCredentials {
                    name: secret_name.to_string(),
                    source,
                })
            })?;

        info!(secret = secret_name, %result, "Reconciled OCI credentials");
        Ok(())
    }

    async fn reconcile_secret_encryption(
        &self,
        _ctx: &ReconcileContext,
        _client: &dyn ClusterClient,
        _create_or_update: &dyn CreateOrUpdate,
        _hcluster: &HostedCluster,
        _control_plane_namespace: &str,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    fn capi_provider_policy_rules(&self) -> Vec<PolicyRule> {
        rbac::provider_policy_rules()
    }

    #[instrument(skip_all, fields(hosted_cluster = %hcluster.name_any(), control_plane_namespace = %control_plane_namespace))]
    async fn delete_credentials(
        &self,
        ctx: &ReconcileContext,
        client: &dyn ClusterClient,
        hcluster: &HostedCluster,
        control_plane_namespace: &str,
    ) -> Result<(), PlatformError> {
        let Some(oci) = hcluster.oci() else {
            debug!("No OCI platform spec, nothing to delete");
            return Ok(());
        };
        let secret_name = oci.identity_ref.name.as_str();

        match client
            .delete_secret(ctx, control_plane_namespace, secret_name)
            .await
        {
            Ok(()) => {
                info!(secret = secret_name, "Deleted OCI credentials");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(secret = secret_name, "OCI credentials already gone");
                Ok(())
            }
            Err(e) => Err(PlatformError::from_client(e, PlatformError::DeleteCredentials)),
        }
    }
}
