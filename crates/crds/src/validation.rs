//! Field validation for OCI resources
//!
//! The patterns here are the same strings published in the generated CRD
//! schemas, so a value accepted by `validate()` is accepted by the API server
//! and the other way round. Write-once fields are checked against the prior
//! object with `validate_update()`.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Tenancy OCID, e.g. `ocid1.tenancy.oc1..aaaa`
pub const TENANCY_OCID_PATTERN: &str = r"^ocid1\.tenancy\.oc1\.\.[a-z0-9]+$";

/// Compartment OCID, e.g. `ocid1.compartment.oc1..aaaa`
pub const COMPARTMENT_OCID_PATTERN: &str = r"^ocid1\.compartment\.oc1\.\.[a-z0-9]+$";

/// Network Load Balancer OCID
pub const NLB_OCID_PATTERN: &str = r"^ocid1\.loadbalancer\.oc[0-9]+\.[a-z0-9.-]*\.[a-z0-9]+$";

/// Any OCI resource OCID (VCN, subnet, gateway, route table, DNS zone)
pub const OCID_PATTERN: &str = r"^ocid1\.[a-z0-9]+\.(oc[0-9]+|region)\.[a-z0-9.-]*\.[a-z0-9]+$";

/// OCI region identifier, e.g. `us-sanjose-1`
pub const REGION_PATTERN: &str = r"^[a-z]+-[a-z]+-[0-9]+$";

/// Dotted-quad IPv4 address
pub const IPV4_PATTERN: &str =
    r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$";

/// IPv4 CIDR block
pub const IPV4_CIDR_PATTERN: &str = r"^((25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\/(3[0-2]|[12]?[0-9])$";

/// Maximum length of an OCID
pub const MAX_OCID_LENGTH: usize = 255;

/// Maximum length of an IPv4 address string
pub const MAX_IPV4_LENGTH: usize = 15;

/// Maximum length of a single CIDR entry
pub const MAX_CIDR_LENGTH: usize = 43;

/// Maximum number of allowed CIDRs on a private endpoint
pub const MAX_ALLOWED_CIDRS: usize = 50;

/// Maximum length of a DNS record name
pub const MAX_DNS_RECORD_NAME_LENGTH: usize = 253;

/// Maximum number of conditions on a private endpoint status
pub const MAX_CONDITIONS: usize = 10;

static TENANCY_OCID: LazyLock<Regex> = LazyLock::new(|| compile(TENANCY_OCID_PATTERN));
static COMPARTMENT_OCID: LazyLock<Regex> = LazyLock::new(|| compile(COMPARTMENT_OCID_PATTERN));
static NLB_OCID: LazyLock<Regex> = LazyLock::new(|| compile(NLB_OCID_PATTERN));
static OCID: LazyLock<Regex> = LazyLock::new(|| compile(OCID_PATTERN));
static REGION: LazyLock<Regex> = LazyLock::new(|| compile(REGION_PATTERN));
static IPV4: LazyLock<Regex> = LazyLock::new(|| compile(IPV4_PATTERN));
static IPV4_CIDR: LazyLock<Regex> = LazyLock::new(|| compile(IPV4_CIDR_PATTERN));

#[allow(clippy::expect_used, reason = "patterns are compile-time constants covered by tests")]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("validation pattern must compile")
}

/// A single rejected field
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Value does not match the published pattern
    #[error("{field}: {value:?} does not match {pattern}")]
    Pattern {
        field: String,
        value: String,
        pattern: &'static str,
    },

    /// String length outside the allowed range
    #[error("{field}: length {len} must be between {min} and {max}")]
    Length {
        field: String,
        len: usize,
        min: usize,
        max: usize,
    },

    /// Too many list entries
    #[error("{field}: {count} items exceeds maximum of {max}")]
    TooMany {
        field: String,
        count: usize,
        max: usize,
    },

    /// Write-once field changed after creation
    #[error("{0}")]
    Immutable(&'static str),
}

/// Shape of a string value that can be checked against a published pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    TenancyOcid,
    CompartmentOcid,
    NetworkLoadBalancerOcid,
    Ocid,
    Region,
    Ipv4,
    Ipv4Cidr,
}

impl Format {
    /// The pattern string as published in the CRD schema
    pub fn pattern(self) -> &'static str {
        match self {
            Self::TenancyOcid => TENANCY_OCID_PATTERN,
            Self::CompartmentOcid => COMPARTMENT_OCID_PATTERN,
            Self::NetworkLoadBalancerOcid => NLB_OCID_PATTERN,
            Self::Ocid => OCID_PATTERN,
            Self::Region => REGION_PATTERN,
            Self::Ipv4 => IPV4_PATTERN,
            Self::Ipv4Cidr => IPV4_CIDR_PATTERN,
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            Self::TenancyOcid => &TENANCY_OCID,
            Self::CompartmentOcid => &COMPARTMENT_OCID,
            Self::NetworkLoadBalancerOcid => &NLB_OCID,
            Self::Ocid => &OCID,
            Self::Region => &REGION,
            Self::Ipv4 => &IPV4,
            Self::Ipv4Cidr => &IPV4_CIDR,
        }
    }

    /// Returns true if `value` matches this format
    pub fn matches(self, value: &str) -> bool {
        self.regex().is_match(value)
    }
}

/// Collects every violation instead of stopping at the first one, so a
/// single admission response can report all bad fields.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(&mut self, field: &str, value: &str, format: Format) -> &mut Self {
        if !format.matches(value) {
            self.errors.push(ValidationError::Pattern {
                field: field.to_string(),
                value: value.to_string(),
                pattern: format.pattern(),
            });
        }
        self
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.len();
        if len < min || len > max {
            self.errors.push(ValidationError::Length {
                field: field.to_string(),
                len,
                min,
                max,
            });
        }
        self
    }

    pub fn max_items(&mut self, field: &str, count: usize, max: usize) -> &mut Self {
        if count > max {
            self.errors.push(ValidationError::TooMany {
                field: field.to_string(),
                count,
                max,
            });
        }
        self
    }

    pub fn unchanged(&mut self, old: &str, new: &str, message: &'static str) -> &mut Self {
        if old != new {
            self.errors.push(ValidationError::Immutable(message));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        for format in [
            Format::TenancyOcid,
            Format::CompartmentOcid,
            Format::NetworkLoadBalancerOcid,
            Format::Ocid,
            Format::Region,
            Format::Ipv4,
            Format::Ipv4Cidr,
        ] {
            assert!(Regex::new(format.pattern()).is_ok(), "{format:?}");
        }
    }

    #[test]
    fn test_ocid_patterns() {
        assert!(Format::TenancyOcid.matches("ocid1.tenancy.oc1..aaaaaaaabc123"));
        assert!(!Format::TenancyOcid.matches("ocid1.compartment.oc1..aaaaaaaabc123"));
        assert!(!Format::TenancyOcid.matches("ocid1.tenancy.oc1..AAAA"));

        assert!(Format::CompartmentOcid.matches("ocid1.compartment.oc1..aaaaaaaaxyz"));
        assert!(!Format::CompartmentOcid.matches("ocid1.compartment.oc2..aaaa"));

        assert!(Format::NetworkLoadBalancerOcid.matches(
            "ocid1.loadbalancer.oc1.us-sanjose-1.aaaaaaaanlb"
        ));
        assert!(!Format::NetworkLoadBalancerOcid.matches("ocid1.vcn.oc1.us-sanjose-1.aaaa"));

        assert!(Format::Ocid.matches("ocid1.vcn.oc1.us-sanjose-1.aaaaaaaavcn"));
        // Hyphenated families are outside the generic shape; status IDs skip it
        assert!(!Format::Ocid.matches("ocid1.dns-zone.region.phx.aaaa"));
        assert!(Format::Ocid.matches("ocid1.dnszone.region..aaaa"));
    }

    #[test]
    fn test_region_pattern() {
        assert!(Format::Region.matches("us-sanjose-1"));
        assert!(Format::Region.matches("eu-frankfurt-1"));
        assert!(!Format::Region.matches("us_sanjose_1"));
        assert!(!Format::Region.matches("sanjose"));
    }

    #[test]
    fn test_ipv4_patterns() {
        assert!(Format::Ipv4.matches("10.0.0.1"));
        assert!(Format::Ipv4.matches("255.255.255.255"));
        assert!(!Format::Ipv4.matches("256.0.0.1"));
        assert!(!Format::Ipv4.matches("10.0.0"));

        assert!(Format::Ipv4Cidr.matches("10.0.0.0/16"));
        assert!(Format::Ipv4Cidr.matches("0.0.0.0/0"));
        assert!(!Format::Ipv4Cidr.matches("10.0.0.0/33"));
        assert!(!Format::Ipv4Cidr.matches("10.0.0.0"));
    }

    #[test]
    fn test_validator_collects_all_errors() {
        let errors = Validator::new()
            .format("region", "nowhere", Format::Region)
            .length("name", "", 1, 10)
            .max_items("cidrs", 51, MAX_ALLOWED_CIDRS)
            .unchanged("a", "b", "Region is immutable")
            .finish()
            .unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors[3], ValidationError::Immutable("Region is immutable"));
        assert_eq!(errors[3].to_string(), "Region is immutable");
    }

    #[test]
    fn test_validator_ok_when_clean() {
        assert!(Validator::new()
            .format("region", "us-ashburn-1", Format::Region)
            .length("name", "creds", 1, 253)
            .finish()
            .is_ok());
    }
}
