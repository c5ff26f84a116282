//! HyperShift OCI CRD Definitions
//!
//! Kubernetes Custom Resource Definitions and API types for running hosted
//! control planes on Oracle Cloud Infrastructure.

pub mod conditions;
pub mod feature_gates;
pub mod hosted_cluster;
pub mod oci;
pub mod oci_private_endpoint;
#[cfg(test)]
mod oci_private_endpoint_test;
pub mod references;
mod schema;
pub mod validation;

pub use conditions::*;
pub use feature_gates::*;
pub use hosted_cluster::*;
pub use oci::*;
pub use oci_private_endpoint::*;
pub use references::*;
pub use validation::{ValidationError, Validator};

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

/// Annotation marking a CRD as gated behind a feature gate
pub const FEATURE_GATE_ANNOTATION_PREFIX: &str = "feature-gate.release.openshift.io/";

/// CRDs owned by this project, filtered by the enabled feature gates.
///
/// HostedCluster and HostedControlPlane are owned by the hosting orchestrator
/// and are never emitted here.
pub fn custom_resource_definitions(gates: &FeatureGates) -> Vec<CustomResourceDefinition> {
    let mut crds = Vec::new();
    if gates.enabled(FeatureGate::OCIPlatform) {
        let mut crd = OCIPrivateEndpoint::crd();
        crd.metadata.annotations.get_or_insert_with(Default::default).insert(
            format!("{FEATURE_GATE_ANNOTATION_PREFIX}{}", FeatureGate::OCIPlatform),
            "true".to_string(),
        );
        crds.push(crd);
    }
    crds
}
