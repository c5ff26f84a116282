//! HostedCluster Controller
//!
//! Wires the OCI platform adapter into HostedCluster reconciliation:
//! - Copies OCI API credentials into the control-plane namespace
//! - Deploys the CAPI OCI provider and its RBAC
//! - Renders the control-plane-operator component
//!
//! Only clusters with `spec.platform.type: OCI` are handled, and only while
//! the `OCIPlatform` feature gate is enabled.

mod apply;
mod backoff;
mod config;
mod controller;
mod error;
mod reconciler;

use crate::config::Config;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    // kube's rustls client needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(ControllerError::InvalidConfig(
            "rustls crypto provider already installed".to_string(),
        ));
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting HostedCluster Controller");

    let config = Config::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Feature gates: {:?}", config.feature_gates);
    info!("  Control plane operator image: {}", config.control_plane_operator_image);
    if config.capi_provider_image.is_empty() {
        info!("  CAPI OCI provider image: <from annotation>");
    } else {
        info!("  CAPI OCI provider image: {}", config.capi_provider_image);
    }

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
