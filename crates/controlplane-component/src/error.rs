//! Component rendering errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComponentError {
    /// No embedded manifest with this name for the component
    #[error("component {component:?} has no manifest {name:?}")]
    MissingAsset { component: String, name: String },

    #[error("failed to parse manifest {name:?}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("manifest {name:?} has unsupported kind {kind:?}")]
    UnsupportedKind { name: String, kind: String },

    /// An adapter was registered for a manifest of a different kind
    #[error("adapter expected a {expected}, manifest is a {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("deployment {deployment:?} has no container {container:?}")]
    ContainerNotFound { deployment: String, container: String },

    #[error("deployment {0:?} has no pod spec")]
    MissingPodSpec(String),
}
