//! Platform adapter errors

use hcp_client::ClientError;
use thiserror::Error;

/// Broad classification used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HostedCluster or operator configuration is missing a required piece
    Configuration,
    /// A referenced object is incomplete
    Validation,
    /// API read or write failed; retry with backoff
    TransientIo,
    /// The reconcile was cancelled
    Cancellation,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    /// HostedCluster has no `spec.platform.oci`
    #[error("OCI platform spec is nil")]
    MissingPlatformSpec,

    /// Neither the constructor nor the override annotation named an image
    #[error("CAPI OCI provider image not specified")]
    ProviderImageNotSpecified,

    /// Source credentials secret lacks a required entry
    #[error("OCI credentials secret missing '{0}' key")]
    MissingCredentialsKey(&'static str),

    #[error("failed to get OCI credentials secret {name:?}: {source}")]
    GetCredentials {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to reconcile OCI credentials secret {name:?}: {source}")]
    ReconcileCredentials {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to delete OCI credentials: {0}")]
    DeleteCredentials(#[source] ClientError),

    /// Client failure passed through unchanged (cancellation)
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PlatformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingPlatformSpec | Self::ProviderImageNotSpecified => ErrorKind::Configuration,
            Self::MissingCredentialsKey(_) => ErrorKind::Validation,
            Self::Client(e)
            | Self::GetCredentials { source: e, .. }
            | Self::ReconcileCredentials { source: e, .. }
            | Self::DeleteCredentials(e) => {
                if e.is_cancelled() {
                    ErrorKind::Cancellation
                } else {
                    ErrorKind::TransientIo
                }
            }
        }
    }

    /// Wrap a client error with `wrap`, except that cancellation is passed
    /// through unchanged
    pub(crate) fn from_client(
        err: ClientError,
        wrap: impl FnOnce(ClientError) -> Self,
    ) -> Self {
        if err.is_cancelled() { Self::Client(err) } else { wrap(err) }
    }
}
