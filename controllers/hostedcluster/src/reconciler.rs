//! HostedCluster reconciliation logic.
//!
//! For OCI hosted clusters (with the `OCIPlatform` gate on) the reconciler
//! copies credentials, deploys the CAPI OCI provider with its RBAC, and
//! renders the control-plane-operator into the control-plane namespace.
//! A finalizer removes the copied credentials when the cluster goes away.

use crate::apply::{apply, apply_dynamic, apply_manifest};
use crate::backoff::BackoffMap;
use crate::config::Config;
use crate::error::ControllerError;
use controlplane_component::WorkloadContext;
use controlplane_component::control_plane_operator::{self, ControlPlaneOperatorOptions};
use crds::{FeatureGate, FeatureGates, HostedCluster, HostedControlPlane, PlatformType};
use hcp_client::{ClusterClient, CreateOrUpdate, ReconcileContext};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::api::Api;
use kube::{Client, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::finalizer::{Event, finalizer};
use oci_platform::Platform;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Finalizer guarding credential cleanup
pub const FINALIZER: &str = "hypershift.openshift.io/oci-platform";

/// Name shared by the CAPI provider Deployment, Role, RoleBinding and ServiceAccount
pub const CAPI_PROVIDER_NAME: &str = "capi-provider";

const CONTROL_PLANE_COMPONENT_LABEL: &str = "control-plane-component";

/// Periodic resync for healthy clusters
const RESYNC_INTERVAL: Duration = Duration::from_secs(600);

/// Shared state handed to every reconcile.
pub struct Reconciler {
    pub client: Client,
    pub cluster_client: Arc<dyn ClusterClient>,
    pub create_or_update: Arc<dyn CreateOrUpdate>,
    pub platform: Arc<dyn Platform>,
    pub config: Config,
    /// Process-wide shutdown; each reconcile runs under a child of it
    pub shutdown: ReconcileContext,
    backoff: BackoffMap,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        client: Client,
        cluster_client: Arc<dyn ClusterClient>,
        create_or_update: Arc<dyn CreateOrUpdate>,
        platform: Arc<dyn Platform>,
        config: Config,
        shutdown: ReconcileContext,
    ) -> Self {
        Self {
            client,
            cluster_client,
            create_or_update,
            platform,
            config,
            shutdown,
            backoff: BackoffMap::default(),
        }
    }

    /// Requeue delay after a failed reconcile of `key`
    fn next_backoff(&self, key: &str) -> Duration {
        self.backoff.next_backoff(key)
    }

    fn reset_backoff(&self, key: &str) {
        self.backoff.clear(key);
    }

    /// Reconcile one HostedCluster
    pub async fn reconcile(
        self: Arc<Self>,
        hcluster: Arc<HostedCluster>,
    ) -> Result<Action, ControllerError> {
        let name = hcluster.name_any();
        if !should_reconcile(&hcluster, &self.config.feature_gates) {
            debug!(hosted_cluster = %name, "Not an enabled OCI hosted cluster, skipping");
            self.reset_backoff(&object_key(&hcluster.namespace().unwrap_or_default(), &name));
            return Ok(Action::await_change());
        }
        let namespace = hcluster
            .namespace()
            .ok_or_else(|| ControllerError::MissingNamespace(name.clone()))?;
        info!(hosted_cluster = %name, namespace = %namespace, "Reconciling HostedCluster");

        let api: Api<HostedCluster> = Api::namespaced(self.client.clone(), &namespace);
        let ctx = self.shutdown.child();
        let (this, ctx) = (&self, &ctx);
        let action = finalizer(&api, FINALIZER, hcluster, |event| async move {
            match event {
                Event::Apply(hc) => this.apply(ctx, &hc).await,
                Event::Cleanup(hc) => this.cleanup(ctx, &hc).await,
            }
        })
        .await
        .map_err(|e| ControllerError::Finalizer(Box::new(e)))?;

        self.reset_backoff(&object_key(&namespace, &name));
        Ok(action)
    }

    async fn apply(
        &self,
        ctx: &ReconcileContext,
        hcluster: &HostedCluster,
    ) -> Result<Action, ControllerError> {
        let cp_namespace = control_plane_namespace(hcluster)?;
        let client = self.cluster_client.as_ref();
        let upsert = self.create_or_update.as_ref();

        self.platform
            .reconcile_credentials(ctx, client, upsert, hcluster, &cp_namespace)
            .await?;
        self.platform
            .reconcile_secret_encryption(ctx, client, upsert, hcluster, &cp_namespace)
            .await?;

        let api_endpoint = hcluster
            .status
            .as_ref()
            .and_then(|s| s.control_plane_endpoint.clone())
            .unwrap_or_default();
        if let Some(infra) = self
            .platform
            .reconcile_capi_infra_cr(ctx, client, upsert, hcluster, &cp_namespace, &api_endpoint)
            .await?
        {
            apply_dynamic(&self.client, &cp_namespace, &infra).await?;
        }

        let hcp_api: Api<HostedControlPlane> = Api::namespaced(self.client.clone(), &cp_namespace);
        let hcp = hcp_api
            .get_opt(&hcluster.name_any())
            .await?
            .unwrap_or_else(|| HostedControlPlane::for_hosted_cluster(hcluster, &cp_namespace));

        let spec = self.platform.capi_provider_deployment_spec(hcluster, &hcp)?;
        let rules = self.platform.capi_provider_policy_rules();
        apply(&self.client, &cp_namespace, &capi_provider_service_account(&cp_namespace)).await?;
        apply(&self.client, &cp_namespace, &capi_provider_role(&cp_namespace, rules)).await?;
        apply(&self.client, &cp_namespace, &capi_provider_role_binding(&cp_namespace)).await?;
        apply(&self.client, &cp_namespace, &capi_provider_deployment(&cp_namespace, spec)).await?;

        let component = control_plane_operator::new_component(operator_options(&self.config, hcluster));
        let workload = WorkloadContext {
            namespace: cp_namespace.clone(),
            hosted_cluster: hcluster.clone(),
            token_minter_image: self.config.control_plane_operator_image.clone(),
        };
        for manifest in component.render(&workload)? {
            apply_manifest(&self.client, &cp_namespace, &manifest).await?;
        }

        info!(
            hosted_cluster = %hcluster.name_any(),
            control_plane_namespace = %cp_namespace,
            "HostedCluster reconciled"
        );
        Ok(Action::requeue(RESYNC_INTERVAL))
    }

    async fn cleanup(
        &self,
        ctx: &ReconcileContext,
        hcluster: &HostedCluster,
    ) -> Result<Action, ControllerError> {
        let cp_namespace = control_plane_namespace(hcluster)?;
        self.platform
            .delete_credentials(ctx, self.cluster_client.as_ref(), hcluster, &cp_namespace)
            .await?;
        self.reset_backoff(&object_key(
            &hcluster.namespace().unwrap_or_default(),
            &hcluster.name_any(),
        ));
        info!(hosted_cluster = %hcluster.name_any(), "HostedCluster cleaned up");
        Ok(Action::await_change())
    }
}

/// Error policy: per-object Fibonacci backoff; nothing to retry after shutdown
pub fn error_policy(
    hcluster: Arc<HostedCluster>,
    error: &ControllerError,
    reconciler: Arc<Reconciler>,
) -> Action {
    let namespace = hcluster.namespace().unwrap_or_default();
    let name = hcluster.name_any();
    if error.is_cancelled() {
        warn!(hosted_cluster = %name, namespace = %namespace, "Reconcile cancelled");
        return Action::await_change();
    }
    let delay = reconciler.next_backoff(&object_key(&namespace, &name));
    error!(
        hosted_cluster = %name,
        namespace = %namespace,
        requeue_seconds = delay.as_secs(),
        "Reconciliation failed: {}",
        error
    );
    Action::requeue(delay)
}

fn object_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// OCI hosted clusters are handled only while the gate is on. A cluster
/// being deleted that still carries our finalizer is always handled, so
/// turning the gate off never strands it in Terminating.
pub fn should_reconcile(hcluster: &HostedCluster, gates: &FeatureGates) -> bool {
    let enabled = hcluster.spec.platform.type_ == PlatformType::Oci
        && gates.enabled(FeatureGate::OCIPlatform);
    enabled || pending_cleanup(hcluster)
}

fn pending_cleanup(hcluster: &HostedCluster) -> bool {
    hcluster.metadata.deletion_timestamp.is_some()
        && hcluster.finalizers().iter().any(|f| f == FINALIZER)
}

fn control_plane_namespace(hcluster: &HostedCluster) -> Result<String, ControllerError> {
    hcluster
        .control_plane_namespace()
        .ok_or_else(|| ControllerError::MissingNamespace(hcluster.name_any()))
}

pub fn operator_options(config: &Config, hcluster: &HostedCluster) -> ControlPlaneOperatorOptions {
    ControlPlaneOperatorOptions {
        hosted_cluster: hcluster.clone(),
        image: config.control_plane_operator_image.clone(),
        utilities_image: config.utilities_image.clone().unwrap_or_default(),
        has_utilities: config.utilities_image.is_some(),
        cert_rotation_scale: config.cert_rotation_scale,
        registry_override_command_line: config.registry_overrides.clone(),
        openshift_registry_overrides: config.openshift_registry_overrides.clone(),
        default_ingress_domain: config.default_ingress_domain.clone(),
        feature_set: config.feature_set,
        enable_ocp_cluster_monitoring: config.enable_ocp_cluster_monitoring,
    }
}

fn capi_provider_meta(namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(CAPI_PROVIDER_NAME.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

fn capi_provider_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(
        CONTROL_PLANE_COMPONENT_LABEL.to_string(),
        CAPI_PROVIDER_NAME.to_string(),
    )])
}

/// Wrap the adapter's spec: selector, pod labels and service account are
/// owned here
pub fn capi_provider_deployment(namespace: &str, mut spec: DeploymentSpec) -> Deployment {
    spec.selector = LabelSelector {
        match_labels: Some(capi_provider_labels()),
        ..Default::default()
    };
    spec.template
        .metadata
        .get_or_insert_with(Default::default)
        .labels
        .get_or_insert_with(BTreeMap::new)
        .extend(capi_provider_labels());
    if let Some(pod) = spec.template.spec.as_mut() {
        pod.service_account_name = Some(CAPI_PROVIDER_NAME.to_string());
    }
    Deployment {
        metadata: capi_provider_meta(namespace),
        spec: Some(spec),
        status: None,
    }
}

pub fn capi_provider_role(namespace: &str, rules: Vec<PolicyRule>) -> Role {
    Role {
        metadata: capi_provider_meta(namespace),
        rules: Some(rules),
    }
}

fn capi_provider_service_account(namespace: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: capi_provider_meta(namespace),
        ..Default::default()
    }
}

fn capi_provider_role_binding(namespace: &str) -> RoleBinding {
    RoleBinding {
        metadata: capi_provider_meta(namespace),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "Role".to_string(),
            name: CAPI_PROVIDER_NAME.to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: CAPI_PROVIDER_NAME.to_string(),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }]),
    }
}
