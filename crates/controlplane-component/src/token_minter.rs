//! Token-minter sidecar injection
//!
//! The token minter runs next to a component's main container and keeps a
//! projected service account token fresh in a shared volume. A cloud token
//! is written for cloud API access; a kube-apiserver token replaces the
//! automounted service account credentials.

use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, PodSpec, ResourceRequirements, SecretVolumeSource, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

const COMMAND: &str = "/usr/bin/control-plane-operator";

const CLOUD_TOKEN_CONTAINER: &str = "cloud-token-minter";
const CLOUD_TOKEN_VOLUME: &str = "cloud-token";
const CLOUD_TOKEN_DIR: &str = "/var/run/secrets/openshift/serviceaccount";
const CLOUD_TOKEN_AUDIENCE: &str = "openshift";

const KAS_TOKEN_CONTAINER: &str = "kube-apiserver-token-minter";
const KAS_TOKEN_VOLUME: &str = "kube-api-access";
const KAS_TOKEN_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

const KUBECONFIG_VOLUME: &str = "token-minter-kubeconfig";
const KUBECONFIG_DIR: &str = "/etc/kubernetes";
const KUBECONFIG_KEY: &str = "kubeconfig";

/// Which tokens the sidecar mints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    CloudToken,
    KubeApiServerToken,
    CloudAndApiServerToken,
}

impl TokenType {
    fn cloud(self) -> bool {
        matches!(self, Self::CloudToken | Self::CloudAndApiServerToken)
    }

    fn kube_apiserver(self) -> bool {
        matches!(self, Self::KubeApiServerToken | Self::CloudAndApiServerToken)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMinterContainerOptions {
    pub token_type: TokenType,
    /// Guest cluster service account the token is minted for
    pub service_account_name: String,
    pub service_account_namespace: String,
    /// Secret holding the guest cluster kubeconfig used to mint
    pub kubeconfig_secret_name: String,
}

impl TokenMinterContainerOptions {
    /// Add sidecars, volumes and mounts to `spec`. Existing containers get
    /// the minted token mounted read-only.
    pub fn inject(&self, image: &str, spec: &mut PodSpec) {
        let volumes = spec.volumes.get_or_insert_with(Vec::new);
        volumes.push(Volume {
            name: KUBECONFIG_VOLUME.to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(self.kubeconfig_secret_name.clone()),
                default_mode: Some(0o640),
                ..Default::default()
            }),
            ..Default::default()
        });

        let mut sidecars = Vec::new();
        if self.token_type.cloud() {
            volumes.push(empty_dir(CLOUD_TOKEN_VOLUME));
            mount_into(&mut spec.containers, CLOUD_TOKEN_VOLUME, CLOUD_TOKEN_DIR);
            sidecars.push(self.minter_container(
                image,
                CLOUD_TOKEN_CONTAINER,
                CLOUD_TOKEN_VOLUME,
                CLOUD_TOKEN_DIR,
                Some(CLOUD_TOKEN_AUDIENCE),
            ));
        }
        if self.token_type.kube_apiserver() {
            let volumes = spec.volumes.get_or_insert_with(Vec::new);
            volumes.push(empty_dir(KAS_TOKEN_VOLUME));
            mount_into(&mut spec.containers, KAS_TOKEN_VOLUME, KAS_TOKEN_DIR);
            sidecars.push(self.minter_container(
                image,
                KAS_TOKEN_CONTAINER,
                KAS_TOKEN_VOLUME,
                KAS_TOKEN_DIR,
                None,
            ));
            // The minted token replaces the automounted one.
            spec.automount_service_account_token = Some(false);
        }
        spec.containers.extend(sidecars);
    }

    fn minter_container(
        &self,
        image: &str,
        name: &str,
        volume: &str,
        dir: &str,
        audience: Option<&str>,
    ) -> Container {
        let mut args = vec![
            format!("--service-account-namespace={}", self.service_account_namespace),
            format!("--service-account-name={}", self.service_account_name),
        ];
        if let Some(audience) = audience {
            args.push(format!("--token-audience={audience}"));
        }
        args.push(format!("--token-file={dir}/token"));
        args.push(format!("--kubeconfig={KUBECONFIG_DIR}/{KUBECONFIG_KEY}"));

        Container {
            name: name.to_string(),
            image: Some(image.to_string()),
            image_pull_policy: Some("IfNotPresent".to_string()),
            command: Some(vec![COMMAND.to_string(), "token-minter".to_string()]),
            args: Some(args),
            resources: Some(ResourceRequirements {
                requests: Some(BTreeMap::from([
                    ("cpu".to_string(), Quantity("10m".to_string())),
                    ("memory".to_string(), Quantity("30Mi".to_string())),
                ])),
                ..Default::default()
            }),
            volume_mounts: Some(vec![
                VolumeMount {
                    name: volume.to_string(),
                    mount_path: dir.to_string(),
                    ..Default::default()
                },
                VolumeMount {
                    name: KUBECONFIG_VOLUME.to_string(),
                    mount_path: KUBECONFIG_DIR.to_string(),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }
    }
}

fn empty_dir(name: &str) -> Volume {
    Volume {
        name: name.to_string(),
        empty_dir: Some(EmptyDirVolumeSource {
            medium: Some("Memory".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn mount_into(containers: &mut [Container], volume: &str, dir: &str) {
    for container in containers {
        container
            .volume_mounts
            .get_or_insert_with(Vec::new)
            .push(VolumeMount {
                name: volume.to_string(),
                mount_path: dir.to_string(),
                read_only: Some(true),
                ..Default::default()
            });
    }
}
