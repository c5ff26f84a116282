//! CAPI OCI provider (CAPOCI) deployment spec

use k8s_openapi::api::apps::v1::DeploymentSpec;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, HTTPGetAction, ObjectFieldSelector, PodSpec,
    PodTemplateSpec, Probe, ResourceRequirements, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

pub(crate) const MANAGER_CONTAINER: &str = "manager";
pub(crate) const CREDENTIALS_VOLUME: &str = "credentials";
pub(crate) const CREDENTIALS_MOUNT_PATH: &str = "/credentials";
/// Secret mounted into the provider pod
// TODO: mount the copied identityRef secret once CAPOCI reads credentials by name
pub(crate) const CREDENTIALS_SECRET: &str = "oci-credentials";
pub(crate) const HEALTHZ_PORT_NAME: &str = "healthz";
pub(crate) const HEALTHZ_PORT: i32 = 9440;

fn http_probe(path: &str) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.to_string()),
            port: IntOrString::String(HEALTHZ_PORT_NAME.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Pod-level spec; selector and labels are filled in by the caller
pub(crate) fn provider_deployment_spec(image: &str) -> DeploymentSpec {
    let manager = Container {
        name: MANAGER_CONTAINER.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        command: Some(vec!["/manager".to_string()]),
        args: Some(vec![
            "--namespace=$(MY_NAMESPACE)".to_string(),
            "--leader-elect".to_string(),
            "--v=2".to_string(),
        ]),
        env: Some(vec![EnvVar {
            name: "MY_NAMESPACE".to_string(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "metadata.namespace".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        volume_mounts: Some(vec![VolumeMount {
            name: CREDENTIALS_VOLUME.to_string(),
            mount_path: CREDENTIALS_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        }]),
        resources: Some(ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("cpu".to_string(), Quantity("10m".to_string())),
                ("memory".to_string(), Quantity("100Mi".to_string())),
            ])),
            ..Default::default()
        }),
        ports: Some(vec![ContainerPort {
            name: Some(HEALTHZ_PORT_NAME.to_string()),
            container_port: HEALTHZ_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        liveness_probe: Some(http_probe("/healthz")),
        readiness_probe: Some(http_probe("/readyz")),
        ..Default::default()
    };

    DeploymentSpec {
        replicas: Some(1),
        template: PodTemplateSpec {
            metadata: None,
            spec: Some(PodSpec {
                termination_grace_period_seconds: Some(10),
                volumes: Some(vec![Volume {
                    name: CREDENTIALS_VOLUME.to_string(),
                    secret: Some(SecretVolumeSource {
                        secret_name: Some(CREDENTIALS_SECRET.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                containers: vec![manager],
                ..Default::default()
            }),
        },
        ..Default::default()
    }
}
