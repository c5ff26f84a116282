//! Feature gates
//!
//! Parsed from the usual `Name=bool,Name=bool` form. The OCI platform is
//! off unless explicitly enabled.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureGate {
    /// OCI platform support and the OCIPrivateEndpoint API
    OCIPlatform,
}

impl FeatureGate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OCIPlatform => "OCIPlatform",
        }
    }
}

impl fmt::Display for FeatureGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureGate {
    type Err = FeatureGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OCIPlatform" => Ok(Self::OCIPlatform),
            other => Err(FeatureGateError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeatureGateError {
    #[error("unknown feature gate {0:?}")]
    Unknown(String),

    #[error("invalid feature gate entry {0:?}, expected Name=true|false")]
    Malformed(String),
}

/// The set of enabled gates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureGates(BTreeSet<FeatureGate>);

impl FeatureGates {
    /// Parse `OCIPlatform=true,Other=false`. Empty input enables nothing.
    pub fn parse(input: &str) -> Result<Self, FeatureGateError> {
        let mut gates = Self::default();
        for entry in input.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| FeatureGateError::Malformed(entry.to_string()))?;
            let gate: FeatureGate = name.trim().parse()?;
            match value.trim() {
                "true" => gates.0.insert(gate),
                "false" => gates.0.remove(&gate),
                _ => return Err(FeatureGateError::Malformed(entry.to_string())),
            };
        }
        Ok(gates)
    }

    #[must_use]
    pub fn with(mut self, gate: FeatureGate) -> Self {
        self.0.insert(gate);
        self
    }

    pub fn enabled(&self, gate: FeatureGate) -> bool {
        self.0.contains(&gate)
    }
}
