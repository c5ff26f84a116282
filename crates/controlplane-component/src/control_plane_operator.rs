//! The control-plane-operator component
//!
//! Runs inside every hosted control plane namespace and manages the rest of
//! the control plane. It reads the HostedControlPlane, needs access to the
//! management API server, and on OCI also owns OCIPrivateEndpoint objects.

use crate::component::{
    ComponentOptions, ControlPlaneComponent, WorkloadContext, new_deployment_component,
    pod_spec_mut,
};
use crate::error::ComponentError;
use crate::feature_set::FeatureSet;
use crate::manifest::{ManifestAdapter, NamespaceSelector, PodMonitor};
use crate::token_minter::{TokenMinterContainerOptions, TokenType};
use crds::{HostedCluster, OCIPrivateEndpoint, PlatformType};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, EnvVar};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role};
use kube::Resource;
use std::sync::Arc;
use std::time::Duration;

pub const COMPONENT_NAME: &str = "control-plane-operator";

const TOKEN_MINTER_SERVICE_ACCOUNT: &str = "control-plane-operator";
const TOKEN_MINTER_NAMESPACE: &str = "kube-system";
const TOKEN_MINTER_KUBECONFIG_SECRET: &str = "service-network-admin-kubeconfig";

const ENDPOINT_VERBS: [&str; 5] = ["get", "list", "watch", "update", "patch"];

#[derive(Debug, Clone)]
pub struct ControlPlaneOperatorOptions {
    pub hosted_cluster: HostedCluster,
    pub image: String,
    pub utilities_image: String,
    pub has_utilities: bool,
    pub cert_rotation_scale: Duration,
    /// Value for `--registry-overrides`, omitted when empty
    pub registry_override_command_line: String,
    pub openshift_registry_overrides: String,
    pub default_ingress_domain: String,
    pub feature_set: FeatureSet,
    pub enable_ocp_cluster_monitoring: bool,
}

impl ComponentOptions for ControlPlaneOperatorOptions {
    fn is_request_serving(&self) -> bool {
        false
    }

    fn multi_zone_spread(&self) -> bool {
        false
    }

    fn needs_management_kas_access(&self) -> bool {
        true
    }
}

/// Describe the control-plane-operator for `options`
pub fn new_component(options: ControlPlaneOperatorOptions) -> ControlPlaneComponent {
    let options = Arc::new(options);
    let monitoring = options.enable_ocp_cluster_monitoring;

    let deployment_options = Arc::clone(&options);
    let mut builder = new_deployment_component(COMPONENT_NAME, options)
        .with_adapt_function(move |cx, deployment| {
            adapt_deployment(&deployment_options, cx, deployment)
        })
        .with_manifest_adapter("role.yaml", ManifestAdapter::with_adapt_function(adapt_role));
    if monitoring {
        builder = builder.with_manifest_adapter(
            "podmonitor.yaml",
            ManifestAdapter::with_adapt_function(adapt_pod_monitor),
        );
    }
    builder
        .with_manifest_adapter(
            "rolebinding.yaml",
            ManifestAdapter::set_hosted_cluster_annotation(),
        )
        .with_manifest_adapter(
            "serviceaccount.yaml",
            ManifestAdapter::set_hosted_cluster_annotation(),
        )
        .inject_token_minter_container(TokenMinterContainerOptions {
            token_type: TokenType::CloudToken,
            service_account_name: TOKEN_MINTER_SERVICE_ACCOUNT.to_string(),
            service_account_namespace: TOKEN_MINTER_NAMESPACE.to_string(),
            kubeconfig_secret_name: TOKEN_MINTER_KUBECONFIG_SECRET.to_string(),
        })
        .build()
}

fn adapt_deployment(
    options: &ControlPlaneOperatorOptions,
    _cx: &WorkloadContext,
    deployment: &mut Deployment,
) -> Result<(), ComponentError> {
    let deployment_name = deployment.metadata.name.clone().unwrap_or_default();
    let container = pod_spec_mut(deployment)?
        .containers
        .iter_mut()
        .find(|c| c.name == COMPONENT_NAME)
        .ok_or_else(|| ComponentError::ContainerNotFound {
            deployment: deployment_name,
            container: COMPONENT_NAME.to_string(),
        })?;

    container.image = Some(options.image.clone());
    set_env(
        container,
        "CERT_ROTATION_SCALE",
        format!("{}s", options.cert_rotation_scale.as_secs()),
    );
    if options.has_utilities {
        set_env(container, "UTILITIES_IMAGE", options.utilities_image.clone());
    }
    if !options.openshift_registry_overrides.is_empty() {
        set_env(
            container,
            "OPENSHIFT_IMG_OVERRIDES",
            options.openshift_registry_overrides.clone(),
        );
    }
    if !options.default_ingress_domain.is_empty() {
        set_env(
            container,
            "DEFAULT_INGRESS_DOMAIN",
            options.default_ingress_domain.clone(),
        );
    }

    let args = container.args.get_or_insert_with(Vec::new);
    if !options.registry_override_command_line.is_empty() {
        args.push(format!(
            "--registry-overrides={}",
            options.registry_override_command_line
        ));
    }
    if options.feature_set != FeatureSet::Default {
        args.push(format!("--feature-set={}", options.feature_set));
    }
    Ok(())
}

/// Set or replace a literal env var
fn set_env(container: &mut Container, name: &str, value: String) {
    let env = container.env.get_or_insert_with(Vec::new);
    let var = EnvVar {
        name: name.to_string(),
        value: Some(value),
        value_from: None,
    };
    match env.iter_mut().find(|e| e.name == name) {
        Some(existing) => *existing = var,
        None => env.push(var),
    }
}

fn adapt_role(cx: &WorkloadContext, role: &mut Role) -> Result<(), ComponentError> {
    if cx.hosted_cluster.spec.platform.type_ != PlatformType::Oci {
        return Ok(());
    }
    let plural = OCIPrivateEndpoint::plural(&()).into_owned();
    role.rules.get_or_insert_with(Vec::new).push(PolicyRule {
        api_groups: Some(vec![OCIPrivateEndpoint::group(&()).into_owned()]),
        resources: Some(vec![plural.clone(), format!("{plural}/status")]),
        verbs: ENDPOINT_VERBS.iter().map(ToString::to_string).collect(),
        ..Default::default()
    });
    Ok(())
}

fn adapt_pod_monitor(cx: &WorkloadContext, monitor: &mut PodMonitor) -> Result<(), ComponentError> {
    monitor.spec.namespace_selector = Some(NamespaceSelector {
        match_names: vec![cx.namespace.clone()],
    });
    Ok(())
}
