//! Status conditions
//!
//! Conditions follow the Kubernetes `metav1.Condition` shape. A set of
//! conditions is keyed by type: it serializes as a list (so kubectl and
//! server-side apply treat it as a list-map on `type`) but never holds two
//! entries with the same type.

use crate::schema;
use crate::validation::MAX_CONDITIONS;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Condition status values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A single observation about one aspect of an object's state
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, unique within a condition set
    #[serde(rename = "type")]
    #[schemars(length(min = 1, max = 316))]
    pub type_: String,

    /// Current status
    pub status: ConditionStatus,

    /// Generation of the object this condition was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time `status` changed
    pub last_transition_time: DateTime<Utc>,

    /// Machine-readable CamelCase reason
    #[schemars(length(min = 1, max = 1024))]
    pub reason: String,

    /// Human-readable detail
    #[serde(default)]
    #[schemars(length(max = 32768))]
    pub message: String,
}

impl Condition {
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            observed_generation: None,
            last_transition_time: now,
            reason: reason.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_observed_generation(mut self, generation: Option<i64>) -> Self {
        self.observed_generation = generation;
        self
    }
}

/// Conditions keyed by type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions(BTreeMap<String, Condition>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, type_: impl AsRef<str>) -> Option<&Condition> {
        self.0.get(type_.as_ref())
    }

    /// True only if the condition exists and its status is `True`
    pub fn is_true(&self, type_: impl AsRef<str>) -> bool {
        self.get(type_)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Insert or update a condition.
    ///
    /// `last_transition_time` is only taken from `condition` when the status
    /// actually changes; otherwise the stored timestamp is kept. Returns true
    /// if anything observable changed.
    pub fn set(&mut self, condition: Condition) -> bool {
        match self.0.get_mut(&condition.type_) {
            Some(existing) if existing.status == condition.status => {
                let changed = existing.reason != condition.reason
                    || existing.message != condition.message
                    || existing.observed_generation != condition.observed_generation;
                existing.reason = condition.reason;
                existing.message = condition.message;
                existing.observed_generation = condition.observed_generation;
                changed
            }
            _ => {
                self.0.insert(condition.type_.clone(), condition);
                true
            }
        }
    }

    pub fn remove(&mut self, type_: impl AsRef<str>) -> Option<Condition> {
        self.0.remove(type_.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.values()
    }
}

impl FromIterator<Condition> for Conditions {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        let mut conditions = Self::new();
        for condition in iter {
            conditions.set(condition);
        }
        conditions
    }
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.values())
    }
}

impl<'de> Deserialize<'de> for Conditions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<Condition>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for condition in list {
            if map.contains_key(&condition.type_) {
                return Err(D::Error::custom(format!(
                    "duplicate condition type {:?}",
                    condition.type_
                )));
            }
            map.insert(condition.type_.clone(), condition);
        }
        Ok(Self(map))
    }
}

impl JsonSchema for Conditions {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "Conditions".into()
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schema::list_map(generator.subschema_for::<Condition>(), "type", MAX_CONDITIONS)
    }

    fn inline_schema() -> bool {
        true
    }
}
