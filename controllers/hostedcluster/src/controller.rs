//! Main controller implementation.
//!
//! Builds the clients and the OCI platform adapter, then drives
//! `kube_runtime::Controller` over HostedClusters until shutdown.

use crate::config::Config;
use crate::error::ControllerError;
use crate::reconciler::{Reconciler, error_policy};
use crds::HostedCluster;
use futures::StreamExt;
use hcp_client::{CreateOrUpdateProvider, KubeClusterClient, ReconcileContext};
use kube::{Api, Client};
use kube_runtime::{Controller as RuntimeController, watcher};
use oci_platform::Oci;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// HostedCluster controller for the OCI platform.
#[derive(Debug)]
pub struct Controller {
    api: Api<HostedCluster>,
    reconciler: Arc<Reconciler>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing HostedCluster Controller");

        let client = Client::try_default().await?;
        let api: Api<HostedCluster> = match config.watch_namespace.as_deref() {
            Some(ns) => Api::namespaced(client.clone(), ns),
            None => Api::all(client.clone()),
        };

        let platform = Arc::new(Oci::new(config.capi_provider_image.clone()));
        let reconciler = Reconciler::new(
            client.clone(),
            Arc::new(KubeClusterClient::new(client)),
            Arc::new(CreateOrUpdateProvider),
            platform,
            config,
            ReconcileContext::new(),
        );

        Ok(Self {
            api,
            reconciler: Arc::new(reconciler),
        })
    }

    /// Run until SIGINT/SIGTERM. In-flight client calls are cancelled on
    /// the first signal.
    pub async fn run(self) -> Result<(), ControllerError> {
        let shutdown = self.reconciler.shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Shutdown signal received, cancelling in-flight reconciles");
            shutdown.cancel();
        });

        info!("Starting HostedCluster watcher");
        RuntimeController::new(self.api, watcher::Config::default())
            .shutdown_on_signal()
            .run(
                |hcluster, reconciler: Arc<Reconciler>| reconciler.reconcile(hcluster),
                error_policy,
                self.reconciler,
            )
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled {}", obj.name),
                    Err(e) => error!("Controller error: {}", e),
                }
            })
            .await;

        info!("HostedCluster Controller stopped");
        Ok(())
    }
}
