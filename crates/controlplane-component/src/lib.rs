//! Control-plane components
//!
//! A component is a Deployment plus the supporting manifests it needs
//! (RBAC, service account, monitoring), described once and rendered per
//! hosted control plane. Manifests ship embedded in the binary and are
//! adjusted by adapter functions at render time.

mod assets;
pub mod component;
pub mod control_plane_operator;
pub mod error;
pub mod feature_set;
pub mod manifest;
pub mod token_minter;

pub use component::{
    ComponentOptions, ControlPlaneComponent, DeploymentComponentBuilder, WorkloadContext,
    new_deployment_component,
};
pub use error::ComponentError;
pub use feature_set::FeatureSet;
pub use manifest::{Manifest, ManifestAdapter, ManifestObject, PodMonitor};
pub use token_minter::{TokenMinterContainerOptions, TokenType};
