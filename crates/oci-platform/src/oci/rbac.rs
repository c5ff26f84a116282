//! RBAC required by the CAPI OCI provider

use k8s_openapi::api::rbac::v1::PolicyRule;

const VERB_ALL: &str = "*";

fn strings(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(ToString::to_string).collect())
}

pub(crate) fn provider_policy_rules() -> Vec<PolicyRule> {
    vec![
        PolicyRule {
            api_groups: strings(&["infrastructure.cluster.x-k8s.io"]),
            resources: strings(&[
                "ociclusters",
                "ociclusters/status",
                "ocimachines",
                "ocimachines/status",
                "ocimachinetemplates",
            ]),
            verbs: vec![VERB_ALL.to_string()],
            ..Default::default()
        },
        PolicyRule {
            api_groups: strings(&[""]),
            resources: strings(&["secrets"]),
            verbs: vec!["get".to_string(), "list".to_string(), "watch".to_string()],
            ..Default::default()
        },
    ]
}
