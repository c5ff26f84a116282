//! Deployment-based control-plane component descriptor and renderer

use crate::assets;
use crate::error::ComponentError;
use crate::manifest::{Manifest, ManifestAdapter};
use crate::token_minter::TokenMinterContainerOptions;
use crds::HostedCluster;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{PodSpec, TopologySpreadConstraint};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Pod label granting egress to the management cluster API server
pub const NEED_MANAGEMENT_KAS_ACCESS_LABEL: &str =
    "hypershift.openshift.io/need-management-kas-access";

/// Pod label marking components that serve guest cluster requests
pub const REQUEST_SERVING_COMPONENT_LABEL: &str =
    "hypershift.openshift.io/request-serving-component";

const ZONE_TOPOLOGY_KEY: &str = "topology.kubernetes.io/zone";

const DEPLOYMENT_MANIFEST: &str = "deployment.yaml";

/// Placement and access characteristics of a component
pub trait ComponentOptions: Send + Sync {
    fn is_request_serving(&self) -> bool;
    fn multi_zone_spread(&self) -> bool;
    fn needs_management_kas_access(&self) -> bool;
}

/// Inputs available while rendering for one hosted control plane
#[derive(Debug, Clone)]
pub struct WorkloadContext {
    /// Control-plane namespace the manifests are rendered into
    pub namespace: String,
    pub hosted_cluster: HostedCluster,
    /// Image used for injected token-minter sidecars
    pub token_minter_image: String,
}

type DeploymentAdaptFn =
    Box<dyn Fn(&WorkloadContext, &mut Deployment) -> Result<(), ComponentError> + Send + Sync>;

/// Start describing a Deployment-based component named `name`
pub fn new_deployment_component(
    name: impl Into<String>,
    options: Arc<dyn ComponentOptions>,
) -> DeploymentComponentBuilder {
    DeploymentComponentBuilder {
        component: ControlPlaneComponent {
            name: name.into(),
            options,
            adapt_deployment: None,
            manifests: Vec::new(),
            token_minter: None,
        },
    }
}

pub struct DeploymentComponentBuilder {
    component: ControlPlaneComponent,
}

impl DeploymentComponentBuilder {
    #[must_use]
    pub fn with_adapt_function<F>(mut self, f: F) -> Self
    where
        F: Fn(&WorkloadContext, &mut Deployment) -> Result<(), ComponentError>
            + Send
            + Sync
            + 'static,
    {
        self.component.adapt_deployment = Some(Box::new(f));
        self
    }

    /// Register a supporting manifest. Manifests render in registration order.
    #[must_use]
    pub fn with_manifest_adapter(mut self, name: impl Into<String>, adapter: ManifestAdapter) -> Self {
        self.component.manifests.push((name.into(), adapter));
        self
    }

    #[must_use]
    pub fn inject_token_minter_container(mut self, options: TokenMinterContainerOptions) -> Self {
        self.component.token_minter = Some(options);
        self
    }

    pub fn build(self) -> ControlPlaneComponent {
        self.component
    }
}

/// A described component, ready to render
pub struct ControlPlaneComponent {
    name: String,
    options: Arc<dyn ComponentOptions>,
    adapt_deployment: Option<DeploymentAdaptFn>,
    manifests: Vec<(String, ManifestAdapter)>,
    token_minter: Option<TokenMinterContainerOptions>,
}

impl fmt::Debug for ControlPlaneComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPlaneComponent")
            .field("name", &self.name)
            .field("is_request_serving", &self.options.is_request_serving())
            .field("multi_zone_spread", &self.options.multi_zone_spread())
            .field(
                "needs_management_kas_access",
                &self.options.needs_management_kas_access(),
            )
            .field("manifests", &self.manifests)
            .field("token_minter", &self.token_minter)
            .finish_non_exhaustive()
    }
}

impl ControlPlaneComponent {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Supporting manifest names in registration order
    pub fn manifest_names(&self) -> Vec<&str> {
        self.manifests.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn token_minter(&self) -> Option<&TokenMinterContainerOptions> {
        self.token_minter.as_ref()
    }

    pub fn is_request_serving(&self) -> bool {
        self.options.is_request_serving()
    }

    pub fn multi_zone_spread(&self) -> bool {
        self.options.multi_zone_spread()
    }

    pub fn needs_management_kas_access(&self) -> bool {
        self.options.needs_management_kas_access()
    }

    /// Render the Deployment followed by the supporting manifests
    pub fn render(&self, cx: &WorkloadContext) -> Result<Vec<Manifest>, ComponentError> {
        let mut rendered = Vec::with_capacity(self.manifests.len() + 1);
        rendered.push(Manifest::Deployment(self.render_deployment(cx)?));

        for (name, adapter) in &self.manifests {
            let mut manifest = Manifest::parse(name, self.asset(name)?)?;
            manifest.metadata_mut().namespace = Some(cx.namespace.clone());
            adapter.apply(cx, &mut manifest)?;
            debug!(
                component = %self.name,
                manifest = %name,
                kind = manifest.kind(),
                "Rendered manifest"
            );
            rendered.push(manifest);
        }
        Ok(rendered)
    }

    fn asset(&self, name: &str) -> Result<&'static str, ComponentError> {
        assets::manifest(&self.name, name).ok_or_else(|| ComponentError::MissingAsset {
            component: self.name.clone(),
            name: name.to_string(),
        })
    }

    fn render_deployment(&self, cx: &WorkloadContext) -> Result<Deployment, ComponentError> {
        let mut deployment =
            match Manifest::parse(DEPLOYMENT_MANIFEST, self.asset(DEPLOYMENT_MANIFEST)?)? {
                Manifest::Deployment(deployment) => deployment,
                other => {
                    return Err(ComponentError::UnexpectedKind {
                        expected: "Deployment",
                        found: other.kind(),
                    });
                }
            };
        deployment.metadata.namespace = Some(cx.namespace.clone());

        let pod_spec = pod_spec_mut(&mut deployment)?;
        if self.options.multi_zone_spread() {
            pod_spec
                .topology_spread_constraints
                .get_or_insert_with(Vec::new)
                .push(TopologySpreadConstraint {
                    max_skew: 1,
                    topology_key: ZONE_TOPOLOGY_KEY.to_string(),
                    when_unsatisfiable: "ScheduleAnyway".to_string(),
                    label_selector: Some(LabelSelector {
                        match_labels: Some(BTreeMap::from([(
                            "app".to_string(),
                            self.name.clone(),
                        )])),
                        ..Default::default()
                    }),
                    ..Default::default()
                });
        }

        let labels = pod_labels_mut(&mut deployment);
        if self.options.needs_management_kas_access() {
            labels.insert(NEED_MANAGEMENT_KAS_ACCESS_LABEL.to_string(), "true".to_string());
        }
        if self.options.is_request_serving() {
            labels.insert(REQUEST_SERVING_COMPONENT_LABEL.to_string(), "true".to_string());
        }

        if let Some(adapt) = &self.adapt_deployment {
            adapt(cx, &mut deployment)?;
        }

        if let Some(token_minter) = &self.token_minter {
            token_minter.inject(&cx.token_minter_image, pod_spec_mut(&mut deployment)?);
        }
        Ok(deployment)
    }
}

/// Pod spec of a Deployment's template
pub fn pod_spec_mut(deployment: &mut Deployment) -> Result<&mut PodSpec, ComponentError> {
    let name = deployment.metadata.name.clone().unwrap_or_default();
    deployment
        .spec
        .as_mut()
        .and_then(|spec| spec.template.spec.as_mut())
        .ok_or(ComponentError::MissingPodSpec(name))
}

fn pod_labels_mut(deployment: &mut Deployment) -> &mut BTreeMap<String, String> {
    deployment
        .spec
        .get_or_insert_with(Default::default)
        .template
        .metadata
        .get_or_insert_with(Default::default)
        .labels
        .get_or_insert_with(BTreeMap::new)
}
