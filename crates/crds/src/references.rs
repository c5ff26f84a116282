//! OCI object references
//!
//! OCI resources are addressed by OCID. The `ocid` field is validated against
//! the generic OCID shape; the resource family sits in the second segment.

use crate::schema;
use crate::validation::{Format, MAX_OCID_LENGTH};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to an existing OCI resource
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OCIResourceReference {
    /// OCID of the referenced resource
    #[schemars(schema_with = "ocid_schema")]
    pub ocid: String,
}

fn ocid_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schema::pattern_string(Format::Ocid, Some(1), MAX_OCID_LENGTH)
}

impl OCIResourceReference {
    /// Create a reference from an OCID
    pub fn new(ocid: impl Into<String>) -> Self {
        Self { ocid: ocid.into() }
    }

    /// Resource family encoded in the OCID (`vcn`, `subnet`, `servicegateway`, ...)
    pub fn resource_type(&self) -> Option<&str> {
        let mut parts = self.ocid.split('.');
        match parts.next() {
            Some("ocid1") => parts.next().filter(|kind| !kind.is_empty()),
            _ => None,
        }
    }
}

/// Reference to the Secret that holds OCI API credentials
///
/// The secret lives in the HostedCluster's namespace and must carry the
/// `config` and `key` entries.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OCIIdentityReference {
    /// Name of the credentials Secret
    #[schemars(length(min = 1, max = 253))]
    pub name: String,
}

impl OCIIdentityReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
