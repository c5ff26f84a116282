//! OCI platform configuration
//!
//! Carried on a HostedCluster under `spec.platform.oci`. Tenancy, compartment
//! and region are write-once: the API server rejects edits through CEL rules
//! and `validate_update` applies the same check in-process.

use crate::references::{OCIIdentityReference, OCIResourceReference};
use crate::schema;
use crate::validation::{Format, MAX_OCID_LENGTH, ValidationError, Validator};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// OCI-specific configuration for a hosted cluster
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OCIPlatformSpec {
    /// Secret in the HostedCluster namespace holding the OCI API credentials
    pub identity_ref: OCIIdentityReference,

    /// Tenancy OCID
    #[schemars(schema_with = "tenancy_schema")]
    pub tenancy: String,

    /// Compartment OCID where cluster resources are created
    ///
    /// Older manifests spell this `compartmentId`.
    #[serde(alias = "compartmentId")]
    #[schemars(schema_with = "compartment_schema")]
    pub compartment: String,

    /// OCI region, e.g. `us-sanjose-1`
    #[schemars(schema_with = "region_schema")]
    pub region: String,

    /// Networking the cluster attaches to
    pub network_config: OCINetworkConfig,

    /// How the API server endpoint is published
    #[serde(default)]
    pub endpoint_access: OCIEndpointAccessType,
}

fn tenancy_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schema::immutable_pattern_string(Format::TenancyOcid, "Tenancy is immutable")
}

fn compartment_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schema::immutable_pattern_string(Format::CompartmentOcid, "Compartment is immutable")
}

fn region_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schema::immutable_pattern_string(Format::Region, "Region is immutable")
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OCINetworkConfig {
    /// Customer VCN the cluster joins
    pub vcn: OCIResourceReference,

    /// Subnet used to reach the service gateway (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_gateway_subnet: Option<OCIResourceReference>,
}

/// API server endpoint publishing mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum OCIEndpointAccessType {
    /// Reachable only from inside the customer VCN
    #[default]
    Private,

    /// Reachable from the internet and the customer VCN
    PublicAndPrivate,
}

impl OCIPlatformSpec {
    /// Check every field against the published schema constraints
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut v = Validator::new();
        v.length("identityRef.name", &self.identity_ref.name, 1, 253)
            .format("tenancy", &self.tenancy, Format::TenancyOcid)
            .format("compartment", &self.compartment, Format::CompartmentOcid)
            .format("region", &self.region, Format::Region)
            .format("networkConfig.vcn.ocid", &self.network_config.vcn.ocid, Format::Ocid)
            .length("networkConfig.vcn.ocid", &self.network_config.vcn.ocid, 0, MAX_OCID_LENGTH);
        if let Some(subnet) = &self.network_config.service_gateway_subnet {
            v.format("networkConfig.serviceGatewaySubnet.ocid", &subnet.ocid, Format::Ocid)
                .length("networkConfig.serviceGatewaySubnet.ocid", &subnet.ocid, 0, MAX_OCID_LENGTH);
        }
        v.finish()
    }

    /// Reject changes to write-once fields
    pub fn validate_update(old: &Self, new: &Self) -> Result<(), Vec<ValidationError>> {
        Validator::new()
            .unchanged(&old.tenancy, &new.tenancy, "Tenancy is immutable")
            .unchanged(&old.compartment, &new.compartment, "Compartment is immutable")
            .unchanged(&old.region, &new.region, "Region is immutable")
            .finish()
    }
}
