//! Server-side apply helpers
//!
//! Everything the controller writes besides the credentials secret is owned
//! through server-side apply under a single field manager, so repeated
//! reconciles converge without read-modify-write cycles.

use crate::error::ControllerError;
use controlplane_component::Manifest;
use kube::api::{Api, ApiResource, DynamicObject, Patch, PatchParams};
use kube::core::{GroupVersionKind, NamespaceResourceScope};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// Field manager for every apply issued by this controller
pub const FIELD_MANAGER: &str = "hostedcluster-controller";

fn params() -> PatchParams {
    PatchParams::apply(FIELD_MANAGER).force()
}

/// Apply a namespaced typed object into `namespace`
pub async fn apply<K>(client: &Client, namespace: &str, obj: &K) -> Result<K, ControllerError>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope> + Clone + Debug + Serialize + DeserializeOwned,
{
    let name = obj.name_any();
    debug!(kind = %K::kind(&()), namespace, name = %name, "Applying");
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    Ok(api.patch(&name, &params(), &Patch::Apply(obj)).await?)
}

/// Apply an untyped object; its `apiVersion` and `kind` pick the resource
pub async fn apply_dynamic(
    client: &Client,
    namespace: &str,
    obj: &DynamicObject,
) -> Result<DynamicObject, ControllerError> {
    let types = obj.types.as_ref().ok_or_else(|| {
        ControllerError::InvalidInfraObject(format!("{} has no apiVersion/kind", obj.name_any()))
    })?;
    let gvk = GroupVersionKind::try_from(types)
        .map_err(|e| ControllerError::InvalidInfraObject(e.to_string()))?;
    let resource = ApiResource::from_gvk(&gvk);
    let name = obj.name_any();
    debug!(kind = %gvk.kind, namespace, name = %name, "Applying");
    let api: Api<DynamicObject> = Api::namespaced_with(client.clone(), namespace, &resource);
    Ok(api.patch(&name, &params(), &Patch::Apply(obj)).await?)
}

/// Apply one rendered control-plane component manifest
pub async fn apply_manifest(
    client: &Client,
    namespace: &str,
    manifest: &Manifest,
) -> Result<(), ControllerError> {
    match manifest {
        Manifest::Deployment(obj) => apply(client, namespace, obj).await.map(drop),
        Manifest::Role(obj) => apply(client, namespace, obj).await.map(drop),
        Manifest::RoleBinding(obj) => apply(client, namespace, obj).await.map(drop),
        Manifest::ServiceAccount(obj) => apply(client, namespace, obj).await.map(drop),
        Manifest::PodMonitor(obj) => apply(client, namespace, obj).await.map(drop),
    }
}
