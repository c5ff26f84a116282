//! OCIPrivateEndpoint CRD
//!
//! Describes private connectivity between a customer VCN and a hosted
//! control plane through an OCI Network Load Balancer. Progress is reported
//! through four sub-conditions that roll up into `OCIPrivateEndpointAvailable`.

use crate::conditions::{Condition, ConditionStatus, Conditions};
use crate::references::OCIResourceReference;
use crate::schema;
use crate::validation::{
    Format, MAX_ALLOWED_CIDRS, MAX_CIDR_LENGTH, MAX_CONDITIONS, MAX_DNS_RECORD_NAME_LENGTH,
    MAX_IPV4_LENGTH, MAX_OCID_LENGTH, ValidationError, Validator,
};
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason recorded on a condition whose status is `True`
pub const REASON_OCI_SUCCESS: &str = "OCISuccess";

/// Reason recorded on a condition whose status is `False`
pub const REASON_OCI_ERROR: &str = "OCIError";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[kube(
    group = "hypershift.openshift.io",
    version = "v1beta1",
    kind = "OCIPrivateEndpoint",
    plural = "ociprivateendpoints",
    shortname = "ocipe",
    namespaced,
    status = "OCIPrivateEndpointStatus",
    printcolumn = r#"{"name":"Network Load Balancer IP","type":"string","description":"IP address of the Network Load Balancer","jsonPath":".status.networkLoadBalancerIP"}"#,
    printcolumn = r#"{"name":"Service Gateway","type":"string","description":"OCID of the Service Gateway","jsonPath":".status.serviceGatewayID"}"#,
    printcolumn = r#"{"name":"Available","type":"string","description":"Overall private endpoint availability status","jsonPath":".status.conditions[?(@.type==\"OCIPrivateEndpointAvailable\")].status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OCIPrivateEndpointSpec {
    /// OCID of the Network Load Balancer fronting the control plane
    #[serde(rename = "networkLoadBalancerID")]
    #[schemars(schema_with = "nlb_ocid_schema")]
    pub network_load_balancer_id: String,

    /// Reserved private IP for the load balancer
    #[serde(rename = "reservedIP", default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "ipv4_schema")]
    pub reserved_ip: Option<String>,

    /// Service gateway to attach to the customer VCN, if already provisioned
    #[serde(rename = "serviceGateway", default, skip_serializing_if = "Option::is_none")]
    pub service_gateway: Option<OCIResourceReference>,

    /// Customer VCN that is granted access
    #[serde(rename = "customerVCN")]
    pub customer_vcn: OCIResourceReference,

    /// Source CIDRs allowed through the endpoint
    #[serde(rename = "allowedCIDRs", default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(schema_with = "allowed_cidrs_schema")]
    pub allowed_cidrs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OCIPrivateEndpointStatus {
    /// Private IP assigned to the load balancer
    #[serde(rename = "networkLoadBalancerIP", default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "ipv4_schema")]
    pub network_load_balancer_ip: Option<String>,

    /// Service gateway attached to the customer VCN
    #[serde(rename = "serviceGatewayID", default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 255))]
    pub service_gateway_id: Option<String>,

    /// Route table carrying the endpoint routes
    #[serde(rename = "routeTableID", default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 255))]
    pub route_table_id: Option<String>,

    /// Private DNS zone holding the endpoint record
    #[serde(rename = "dnsZoneID", default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 255))]
    pub dns_zone_id: Option<String>,

    /// Fully-qualified DNS record name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 253))]
    pub dns_record_name: Option<String>,

    #[serde(default)]
    pub conditions: Conditions,
}

fn nlb_ocid_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schema::pattern_string(Format::NetworkLoadBalancerOcid, Some(1), MAX_OCID_LENGTH)
}

fn ipv4_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schema::pattern_string(Format::Ipv4, None, MAX_IPV4_LENGTH)
}

fn allowed_cidrs_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schema::pattern_string_list(Format::Ipv4Cidr, MAX_CIDR_LENGTH, MAX_ALLOWED_CIDRS)
}

/// List wrapper used by list endpoints
pub type OCIPrivateEndpointList = kube::core::ObjectList<OCIPrivateEndpoint>;

/// Condition types reported on an OCIPrivateEndpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OCIPrivateEndpointConditionType {
    /// Aggregate: all sub-conditions are True
    Available,
    NetworkLoadBalancerReady,
    ServiceGatewayAttached,
    RouteRulesConfigured,
    DnsConfigured,
}

impl OCIPrivateEndpointConditionType {
    /// Sub-conditions that feed the aggregate, in reporting order
    pub const SUB_CONDITIONS: [Self; 4] = [
        Self::NetworkLoadBalancerReady,
        Self::ServiceGatewayAttached,
        Self::RouteRulesConfigured,
        Self::DnsConfigured,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "OCIPrivateEndpointAvailable",
            Self::NetworkLoadBalancerReady => "OCINetworkLoadBalancerReady",
            Self::ServiceGatewayAttached => "OCIServiceGatewayAttached",
            Self::RouteRulesConfigured => "OCIRouteRulesConfigured",
            Self::DnsConfigured => "OCIDNSConfigured",
        }
    }

    pub fn is_aggregate(self) -> bool {
        self == Self::Available
    }
}

impl AsRef<str> for OCIPrivateEndpointConditionType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for OCIPrivateEndpointConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OCIPrivateEndpointSpec {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut v = Validator::new();
        v.length("networkLoadBalancerID", &self.network_load_balancer_id, 1, MAX_OCID_LENGTH)
            .format(
                "networkLoadBalancerID",
                &self.network_load_balancer_id,
                Format::NetworkLoadBalancerOcid,
            )
            .format("customerVCN.ocid", &self.customer_vcn.ocid, Format::Ocid)
            .length("customerVCN.ocid", &self.customer_vcn.ocid, 1, MAX_OCID_LENGTH)
            .max_items("allowedCIDRs", self.allowed_cidrs.len(), MAX_ALLOWED_CIDRS);
        if let Some(gateway) = &self.service_gateway {
            v.length("serviceGateway.ocid", &gateway.ocid, 1, MAX_OCID_LENGTH)
                .format("serviceGateway.ocid", &gateway.ocid, Format::Ocid);
        }
        if let Some(ip) = &self.reserved_ip {
            v.length("reservedIP", ip, 0, MAX_IPV4_LENGTH)
                .format("reservedIP", ip, Format::Ipv4);
        }
        for (i, cidr) in self.allowed_cidrs.iter().enumerate() {
            let field = format!("allowedCIDRs[{i}]");
            v.length(&field, cidr, 0, MAX_CIDR_LENGTH)
                .format(&field, cidr, Format::Ipv4Cidr);
        }
        v.finish()
    }
}

impl OCIPrivateEndpointStatus {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut v = Validator::new();
        v.max_items("conditions", self.conditions.len(), MAX_CONDITIONS);
        if let Some(ip) = &self.network_load_balancer_ip {
            v.length("networkLoadBalancerIP", ip, 0, MAX_IPV4_LENGTH)
                .format("networkLoadBalancerIP", ip, Format::Ipv4);
        }
        // Resource families like `dns-zone` fall outside the generic OCID
        // pattern, so observed IDs are only length-checked
        for (field, value) in [
            ("serviceGatewayID", &self.service_gateway_id),
            ("routeTableID", &self.route_table_id),
            ("dnsZoneID", &self.dns_zone_id),
        ] {
            if let Some(ocid) = value {
                v.length(field, ocid, 0, MAX_OCID_LENGTH);
            }
        }
        if let Some(name) = &self.dns_record_name {
            v.length("dnsRecordName", name, 0, MAX_DNS_RECORD_NAME_LENGTH);
        }
        v.finish()
    }

    /// Record the outcome of one sub-step and refresh the aggregate.
    ///
    /// `Ok(message)` marks the sub-condition True, `Err(message)` marks it
    /// False. Writes against the aggregate type itself are ignored; it is
    /// only ever derived. Returns true if any condition changed.
    pub fn set_sub_condition(
        &mut self,
        type_: OCIPrivateEndpointConditionType,
        outcome: Result<String, String>,
        generation: Option<i64>,
        now: DateTime<Utc>,
    ) -> bool {
        if type_.is_aggregate() {
            return false;
        }
        let (status, reason, message) = match outcome {
            Ok(message) => (ConditionStatus::True, REASON_OCI_SUCCESS, message),
            Err(message) => (ConditionStatus::False, REASON_OCI_ERROR, message),
        };
        let changed = self.conditions.set(
            Condition::new(type_.as_str(), status, reason, message, now)
                .with_observed_generation(generation),
        );
        self.update_availability(generation, now) || changed
    }

    /// Recompute `OCIPrivateEndpointAvailable` from the sub-conditions.
    ///
    /// True with reason `OCISuccess` only when every sub-condition is True.
    /// Otherwise False with reason `OCIError`, carrying the message of the
    /// most recently failed sub-condition, or naming the first sub-condition
    /// that has not been reported yet.
    pub fn update_availability(&mut self, generation: Option<i64>, now: DateTime<Utc>) -> bool {
        let pending: Vec<OCIPrivateEndpointConditionType> =
            OCIPrivateEndpointConditionType::SUB_CONDITIONS
                .into_iter()
                .filter(|t| !self.conditions.is_true(t))
                .collect();

        let aggregate = if pending.is_empty() {
            Condition::new(
                OCIPrivateEndpointConditionType::Available.as_str(),
                ConditionStatus::True,
                REASON_OCI_SUCCESS,
                "Private endpoint is available",
                now,
            )
        } else {
            let latest_failure = pending
                .iter()
                .filter_map(|t| self.conditions.get(t))
                .filter(|c| c.status == ConditionStatus::False)
                .fold(None::<&Condition>, |latest, c| match latest {
                    Some(l) if l.last_transition_time >= c.last_transition_time => Some(l),
                    _ => Some(c),
                });
            let message = match latest_failure {
                Some(c) => c.message.clone(),
                None => format!("{} not yet reported", pending[0]),
            };
            Condition::new(
                OCIPrivateEndpointConditionType::Available.as_str(),
                ConditionStatus::False,
                REASON_OCI_ERROR,
                message,
                now,
            )
        };
        self.conditions.set(aggregate.with_observed_generation(generation))
    }

    /// Whether the aggregate condition is True
    pub fn is_available(&self) -> bool {
        self.conditions.is_true(OCIPrivateEndpointConditionType::Available)
    }
}

impl OCIPrivateEndpoint {
    /// Validate both spec and status, if present
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = self.spec.validate().err().unwrap_or_default();
        if let Some(status) = &self.status {
            errors.extend(status.validate().err().unwrap_or_default());
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
