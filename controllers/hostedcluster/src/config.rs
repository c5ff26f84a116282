//! Controller configuration from environment variables

use crate::error::ControllerError;
use controlplane_component::FeatureSet;
use crds::FeatureGates;
use std::time::Duration;

const DEFAULT_CERT_ROTATION_SCALE_SECONDS: u64 = 86400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Default CAPI OCI provider image; may be empty when every HostedCluster
    /// carries the override annotation
    pub capi_provider_image: String,
    pub control_plane_operator_image: String,
    pub utilities_image: Option<String>,
    pub cert_rotation_scale: Duration,
    pub registry_overrides: String,
    pub openshift_registry_overrides: String,
    pub default_ingress_domain: String,
    pub feature_set: FeatureSet,
    pub enable_ocp_cluster_monitoring: bool,
    pub feature_gates: FeatureGates,
    /// Restrict the watch to one namespace
    pub watch_namespace: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset and empty are treated
    /// the same.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let control_plane_operator_image = var("CONTROL_PLANE_OPERATOR_IMAGE").ok_or_else(|| {
            ControllerError::InvalidConfig(
                "CONTROL_PLANE_OPERATOR_IMAGE environment variable is required".to_string(),
            )
        })?;

        let cert_rotation_scale = match var("CERT_ROTATION_SCALE") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                ControllerError::InvalidConfig(format!("CERT_ROTATION_SCALE {raw:?}: {e}"))
            })?,
            None => Duration::from_secs(DEFAULT_CERT_ROTATION_SCALE_SECONDS),
        };

        let feature_set = var("FEATURE_SET")
            .unwrap_or_default()
            .parse::<FeatureSet>()
            .map_err(|e| ControllerError::InvalidConfig(format!("FEATURE_SET: {e}")))?;

        let enable_ocp_cluster_monitoring = match var("ENABLE_OCP_CLUSTER_MONITORING") {
            Some(raw) => raw.parse::<bool>().map_err(|e| {
                ControllerError::InvalidConfig(format!(
                    "ENABLE_OCP_CLUSTER_MONITORING {raw:?}: {e}"
                ))
            })?,
            None => false,
        };

        let feature_gates = FeatureGates::parse(&var("FEATURE_GATES").unwrap_or_default())
            .map_err(|e| ControllerError::InvalidConfig(format!("FEATURE_GATES: {e}")))?;

        Ok(Self {
            capi_provider_image: var("CAPI_PROVIDER_OCI_IMAGE").unwrap_or_default(),
            control_plane_operator_image,
            utilities_image: var("UTILITIES_IMAGE"),
            cert_rotation_scale,
            registry_overrides: var("REGISTRY_OVERRIDES").unwrap_or_default(),
            openshift_registry_overrides: var("OPENSHIFT_REGISTRY_OVERRIDES").unwrap_or_default(),
            default_ingress_domain: var("DEFAULT_INGRESS_DOMAIN").unwrap_or_default(),
            feature_set,
            enable_ocp_cluster_monitoring,
            feature_gates,
            watch_namespace: var("WATCH_NAMESPACE"),
        })
    }
}
