//! Prints the CRD manifests as a multi-document YAML stream.
//!
//! Gates come from `FEATURE_GATES` (e.g. `OCIPlatform=true`); when unset every
//! gated CRD is emitted so the output can be committed as the full API.

use anyhow::Context;
use crds::{FeatureGate, FeatureGates, custom_resource_definitions};

fn main() -> anyhow::Result<()> {
    let gates = match std::env::var("FEATURE_GATES") {
        Ok(raw) => FeatureGates::parse(&raw).context("parsing FEATURE_GATES")?,
        Err(_) => FeatureGates::default().with(FeatureGate::OCIPlatform),
    };

    for crd in custom_resource_definitions(&gates) {
        let yaml = serde_yaml::to_string(&crd).context("serializing CRD")?;
        print!("---\n{yaml}");
    }
    Ok(())
}
