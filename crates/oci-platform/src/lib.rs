//! HyperShift platform adapters
//!
//! A platform adapter supplies the cloud-specific pieces of a hosted
//! cluster's control plane: the CAPI infrastructure provider deployment and
//! its RBAC, cloud credentials, and secret encryption. `Oci` is the adapter
//! for Oracle Cloud Infrastructure.

pub mod error;
pub mod oci;
pub mod platform;

pub use error::{ErrorKind, PlatformError};
pub use oci::Oci;
pub use platform::Platform;
