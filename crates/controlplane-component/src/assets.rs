//! Manifests embedded at build time, looked up by component and file name

pub(crate) fn manifest(component: &str, name: &str) -> Option<&'static str> {
    match (component, name) {
        ("control-plane-operator", "deployment.yaml") => {
            Some(include_str!("../assets/control-plane-operator/deployment.yaml"))
        }
        ("control-plane-operator", "role.yaml") => {
            Some(include_str!("../assets/control-plane-operator/role.yaml"))
        }
        ("control-plane-operator", "rolebinding.yaml") => {
            Some(include_str!("../assets/control-plane-operator/rolebinding.yaml"))
        }
        ("control-plane-operator", "serviceaccount.yaml") => {
            Some(include_str!("../assets/control-plane-operator/serviceaccount.yaml"))
        }
        ("control-plane-operator", "podmonitor.yaml") => {
            Some(include_str!("../assets/control-plane-operator/podmonitor.yaml"))
        }
        _ => None,
    }
}
