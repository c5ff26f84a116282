//! Kubernetes-backed ClusterClient

use crate::cluster_trait::{ClusterClient, object_key};
use crate::context::ReconcileContext;
use crate::error::ClientError;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, DeleteParams, PostParams};
use tracing::debug;

const SECRET: &str = "Secret";

/// ClusterClient backed by a live `kube::Client`
#[derive(Clone)]
pub struct KubeClusterClient {
    client: kube::Client,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait::async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_secret(
        &self,
        ctx: &ReconcileContext,
        namespace: &str,
        name: &str,
    ) -> Result<Secret, ClientError> {
        let api = self.secrets(namespace);
        ctx.run(async {
            api.get(name)
                .await
                .map_err(|e| ClientError::from_kube(e, SECRET, namespace, name))
        })
        .await
    }

    async fn create_secret(
        &self,
        ctx: &ReconcileContext,
        secret: &Secret,
    ) -> Result<Secret, ClientError> {
        let (namespace, name) = object_key(secret)?;
        debug!(namespace, name, "Creating secret");
        let api = self.secrets(namespace);
        ctx.run(async {
            api.create(&PostParams::default(), secret)
                .await
                .map_err(|e| ClientError::from_kube(e, SECRET, namespace, name))
        })
        .await
    }

    async fn update_secret(
        &self,
        ctx: &ReconcileContext,
        secret: &Secret,
    ) -> Result<Secret, ClientError> {
        let (namespace, name) = object_key(secret)?;
        debug!(namespace, name, "Updating secret");
        let api = self.secrets(namespace);
        ctx.run(async {
            api.replace(name, &PostParams::default(), secret)
                .await
                .map_err(|e| ClientError::from_kube(e, SECRET, namespace, name))
        })
        .await
    }

    async fn delete_secret(
        &self,
        ctx: &ReconcileContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        debug!(namespace, name, "Deleting secret");
        let api = self.secrets(namespace);
        ctx.run(async {
            api.delete(name, &DeleteParams::default())
                .await
                .map(|_| ())
                .map_err(|e| ClientError::from_kube(e, SECRET, namespace, name))
        })
        .await
    }
}
