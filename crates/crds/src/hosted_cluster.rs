//! HostedCluster and HostedControlPlane
//!
//! Only the fields the OCI platform integration reads are modelled here. The
//! full resources are owned by the hosting orchestrator; these types are
//! enough to watch them and to pass them to platform adapters.

use crate::oci::OCIPlatformSpec;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Overrides the CAPI OCI provider image for a single hosted cluster
pub const CAPI_PROVIDER_OCI_IMAGE_ANNOTATION: &str =
    "hypershift.openshift.io/capi-provider-oci-image";

/// Annotation placed on control-plane objects naming their owning HostedCluster
pub const HOSTED_CLUSTER_ANNOTATION: &str = "hypershift.openshift.io/cluster";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[kube(
    group = "hypershift.openshift.io",
    version = "v1beta1",
    kind = "HostedCluster",
    plural = "hostedclusters",
    shortname = "hc",
    namespaced,
    status = "HostedClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct HostedClusterSpec {
    /// Infrastructure platform configuration
    pub platform: PlatformSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HostedClusterStatus {
    /// Endpoint the guest cluster API server is reachable on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_endpoint: Option<APIEndpoint>,
}

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[kube(
    group = "hypershift.openshift.io",
    version = "v1beta1",
    kind = "HostedControlPlane",
    plural = "hostedcontrolplanes",
    shortname = "hcp",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct HostedControlPlaneSpec {
    pub platform: PlatformSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSpec {
    /// Platform type
    #[serde(rename = "type")]
    pub type_: PlatformType,

    /// OCI configuration, set when `type` is `OCI`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oci: Option<OCIPlatformSpec>,
}

/// Supported infrastructure platforms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum PlatformType {
    #[serde(rename = "AWS")]
    Aws,
    Azure,
    #[serde(rename = "OCI")]
    Oci,
    KubeVirt,
    Agent,
    #[default]
    None,
}

/// Host and port of a reachable API server
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct APIEndpoint {
    pub host: String,
    pub port: i32,
}

impl HostedCluster {
    /// Namespace holding this cluster's control plane: `<namespace>-<name>`
    pub fn control_plane_namespace(&self) -> Option<String> {
        let namespace = self.namespace()?;
        Some(format!("{namespace}-{}", self.name_any()))
    }

    /// The `namespace/name` value used for [`HOSTED_CLUSTER_ANNOTATION`]
    pub fn annotation_value(&self) -> String {
        format!(
            "{}/{}",
            self.namespace().unwrap_or_default(),
            self.name_any()
        )
    }

    pub fn oci(&self) -> Option<&OCIPlatformSpec> {
        self.spec.platform.oci.as_ref()
    }
}

impl HostedControlPlane {
    /// Mirror the platform of a HostedCluster into a control plane object
    pub fn for_hosted_cluster(hcluster: &HostedCluster, namespace: &str) -> Self {
        let mut hcp = Self::new(
            &hcluster.name_any(),
            HostedControlPlaneSpec {
                platform: hcluster.spec.platform.clone(),
            },
        );
        hcp.metadata.namespace = Some(namespace.to_string());
        hcp
    }
}
