//! Controller-specific error types.
//!
//! Library errors from the platform adapter, the component renderer and
//! the Kubernetes client are wrapped here so the reconcile loop has a
//! single error type to report and classify.

use controlplane_component::ComponentError;
use kube::Error as KubeError;
use kube_runtime::finalizer;
use oci_platform::{ErrorKind, PlatformError};
use thiserror::Error;

/// Errors that can occur in the HostedCluster controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Platform adapter error
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Control-plane component rendering error
    #[error("Component error: {0}")]
    Component(#[from] ComponentError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HostedCluster without a namespace
    #[error("HostedCluster {0:?} has no namespace")]
    MissingNamespace(String),

    /// Infrastructure object returned by the adapter cannot be applied
    #[error("Invalid infrastructure object: {0}")]
    InvalidInfraObject(String),

    /// Finalizer add/remove or the wrapped apply/cleanup failed
    #[error("Finalizer error: {0}")]
    Finalizer(#[source] Box<finalizer::Error<ControllerError>>),
}

impl ControllerError {
    /// The reconcile was cut short by shutdown
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Platform(e) => e.kind() == ErrorKind::Cancellation,
            Self::Finalizer(e) => match e.as_ref() {
                finalizer::Error::ApplyFailed(e) | finalizer::Error::CleanupFailed(e) => {
                    e.is_cancelled()
                }
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcp_client::ClientError;

    #[test]
    fn test_cancellation_seen_through_finalizer() {
        let err = ControllerError::Finalizer(Box::new(finalizer::Error::ApplyFailed(
            ControllerError::Platform(PlatformError::Client(ClientError::Cancelled)),
        )));
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_other_errors_not_cancelled() {
        assert!(!ControllerError::Platform(PlatformError::MissingPlatformSpec).is_cancelled());
        assert!(!ControllerError::InvalidConfig("x".to_string()).is_cancelled());
    }
}
