//! Cluster feature sets

use std::fmt;
use std::str::FromStr;

/// OpenShift feature set the control plane runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureSet {
    #[default]
    Default,
    TechPreviewNoUpgrade,
    DevPreviewNoUpgrade,
    CustomNoUpgrade,
}

impl FeatureSet {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::TechPreviewNoUpgrade => "TechPreviewNoUpgrade",
            Self::DevPreviewNoUpgrade => "DevPreviewNoUpgrade",
            Self::CustomNoUpgrade => "CustomNoUpgrade",
        }
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "Default" => Ok(Self::Default),
            "TechPreviewNoUpgrade" => Ok(Self::TechPreviewNoUpgrade),
            "DevPreviewNoUpgrade" => Ok(Self::DevPreviewNoUpgrade),
            "CustomNoUpgrade" => Ok(Self::CustomNoUpgrade),
            other => Err(format!("unknown feature set {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("".parse::<FeatureSet>(), Ok(FeatureSet::Default));
        assert_eq!(
            "TechPreviewNoUpgrade".parse::<FeatureSet>(),
            Ok(FeatureSet::TechPreviewNoUpgrade)
        );
        assert!("Preview".parse::<FeatureSet>().is_err());
    }
}
