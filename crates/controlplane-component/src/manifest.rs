//! Typed manifests and per-manifest adapters

use crate::component::WorkloadContext;
use crate::error::ComponentError;
use crds::HOSTED_CLUSTER_ANNOTATION;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prometheus operator PodMonitor (`monitoring.coreos.com/v1`)
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1",
    kind = "PodMonitor",
    namespaced,
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct PodMonitorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_label: Option<String>,

    pub selector: LabelSelector,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<NamespaceSelector>,

    #[serde(default)]
    pub pod_metrics_endpoints: Vec<PodMetricsEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelector {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PodMetricsEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// A rendered object
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    Deployment(Deployment),
    Role(Role),
    RoleBinding(RoleBinding),
    ServiceAccount(ServiceAccount),
    PodMonitor(PodMonitor),
}

/// Object types a [`Manifest`] can hold
pub trait ManifestObject: Sized {
    const KIND: &'static str;

    fn from_manifest_mut(manifest: &mut Manifest) -> Option<&mut Self>;
}

macro_rules! manifest_object {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl ManifestObject for $ty {
                const KIND: &'static str = stringify!($variant);

                fn from_manifest_mut(manifest: &mut Manifest) -> Option<&mut Self> {
                    match manifest {
                        Manifest::$variant(obj) => Some(obj),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Manifest {
                fn from(obj: $ty) -> Self {
                    Manifest::$variant(obj)
                }
            }
        )*

        impl Manifest {
            pub fn kind(&self) -> &'static str {
                match self {
                    $(Manifest::$variant(_) => stringify!($variant),)*
                }
            }

            pub fn metadata(&self) -> &ObjectMeta {
                match self {
                    $(Manifest::$variant(obj) => &obj.metadata,)*
                }
            }

            pub fn metadata_mut(&mut self) -> &mut ObjectMeta {
                match self {
                    $(Manifest::$variant(obj) => &mut obj.metadata,)*
                }
            }
        }
    };
}

manifest_object! {
    Deployment => Deployment,
    Role => Role,
    RoleBinding => RoleBinding,
    ServiceAccount => ServiceAccount,
    PodMonitor => PodMonitor,
}

impl Manifest {
    /// Parse a single YAML document, dispatching on `kind`
    pub fn parse(name: &str, yaml: &str) -> Result<Self, ComponentError> {
        let parse_err = |source| ComponentError::Parse {
            name: name.to_string(),
            source,
        };
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(parse_err)?;
        let kind = value
            .get("kind")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or_default()
            .to_string();
        let manifest = match kind.as_str() {
            "Deployment" => Self::Deployment(serde_yaml::from_value(value).map_err(parse_err)?),
            "Role" => Self::Role(serde_yaml::from_value(value).map_err(parse_err)?),
            "RoleBinding" => Self::RoleBinding(serde_yaml::from_value(value).map_err(parse_err)?),
            "ServiceAccount" => {
                Self::ServiceAccount(serde_yaml::from_value(value).map_err(parse_err)?)
            }
            "PodMonitor" => Self::PodMonitor(serde_yaml::from_value(value).map_err(parse_err)?),
            _ => {
                return Err(ComponentError::UnsupportedKind {
                    name: name.to_string(),
                    kind,
                });
            }
        };
        Ok(manifest)
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }
}

type AdaptFn =
    Box<dyn Fn(&WorkloadContext, &mut Manifest) -> Result<(), ComponentError> + Send + Sync>;

/// How a supporting manifest is adjusted before it is returned
#[derive(Default)]
pub struct ManifestAdapter {
    adapt: Option<AdaptFn>,
    hosted_cluster_annotation: bool,
}

impl fmt::Debug for ManifestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestAdapter")
            .field("adapt", &self.adapt.is_some())
            .field("hosted_cluster_annotation", &self.hosted_cluster_annotation)
            .finish()
    }
}

impl ManifestAdapter {
    /// Run `f` against the manifest, which must be a `T`
    pub fn with_adapt_function<T, F>(f: F) -> Self
    where
        T: ManifestObject + 'static,
        F: Fn(&WorkloadContext, &mut T) -> Result<(), ComponentError> + Send + Sync + 'static,
    {
        let adapt = move |cx: &WorkloadContext, manifest: &mut Manifest| -> Result<(), ComponentError> {
            let found = manifest.kind();
            let obj = T::from_manifest_mut(manifest)
                .ok_or(ComponentError::UnexpectedKind { expected: T::KIND, found })?;
            f(cx, obj)
        };
        Self {
            adapt: Some(Box::new(adapt)),
            hosted_cluster_annotation: false,
        }
    }

    /// Annotate the manifest with its owning HostedCluster
    pub fn set_hosted_cluster_annotation() -> Self {
        Self {
            adapt: None,
            hosted_cluster_annotation: true,
        }
    }

    pub(crate) fn apply(
        &self,
        cx: &WorkloadContext,
        manifest: &mut Manifest,
    ) -> Result<(), ComponentError> {
        if self.hosted_cluster_annotation {
            manifest
                .metadata_mut()
                .annotations
                .get_or_insert_with(Default::default)
                .insert(
                    HOSTED_CLUSTER_ANNOTATION.to_string(),
                    cx.hosted_cluster.annotation_value(),
                );
        }
        if let Some(adapt) = &self.adapt {
            adapt(cx, manifest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dispatches_on_kind() {
        let manifest = Manifest::parse(
            "sa.yaml",
            "apiVersion: v1\nkind: ServiceAccount\nmetadata:\n  name: demo\n",
        )
        .unwrap();
        assert_eq!(manifest.kind(), "ServiceAccount");
        assert_eq!(manifest.name(), "demo");
    }

    #[test]
    fn test_parse_unsupported_kind() {
        let err = Manifest::parse("cm.yaml", "apiVersion: v1\nkind: ConfigMap\n").unwrap_err();
        assert!(matches!(err, ComponentError::UnsupportedKind { ref kind, .. } if kind == "ConfigMap"));
    }

    #[test]
    fn test_parse_pod_monitor() {
        let manifest = Manifest::parse(
            "podmonitor.yaml",
            crate::assets::manifest("control-plane-operator", "podmonitor.yaml").unwrap(),
        )
        .unwrap();
        let Manifest::PodMonitor(pm) = manifest else {
            panic!("expected PodMonitor");
        };
        assert_eq!(pm.spec.pod_metrics_endpoints[0].port.as_deref(), Some("metrics"));
    }
}
