//! Client errors

use thiserror::Error;

/// Errors that can occur when talking to the management cluster
#[derive(Debug, Error)]
pub enum ClientError {
    /// The object does not exist
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    /// Optimistic-concurrency conflict or create of an existing object
    #[error("conflict writing {kind} {namespace}/{name}: {message}")]
    Conflict {
        kind: &'static str,
        namespace: String,
        name: String,
        message: String,
    },

    /// Any other Kubernetes API or transport failure
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Failure that did not come from the Kubernetes client itself
    #[error("request failed: {0}")]
    Request(String),

    /// Object passed in was not addressable (missing name or namespace)
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// The reconcile context was cancelled before the call completed
    #[error("operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// Map a kube error for a specific object, lifting 404 and 409 into
    /// dedicated variants.
    pub fn from_kube(err: kube::Error, kind: &'static str, namespace: &str, name: &str) -> Self {
        match err {
            kube::Error::Api(status) if status.code == 404 => Self::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            kube::Error::Api(status) if status.code == 409 => Self::Conflict {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: status.message.clone(),
            },
            other => Self::Kube(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Kube(kube::Error::Api(status)) => status.code == 404,
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Kube(kube::Error::Api(status)) => status.code == 409,
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
