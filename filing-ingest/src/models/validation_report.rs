//! Validation report returned by the taxonomy validator
//!
//! On the wire the report is a flat object: a few well-known top-level keys
//! plus one array of findings per category.
//!
//! ```json
//! {
//!   "validation_status": "failed",
//!   "is_valid": false,
//!   "validation_timestamp": "2024-03-01T10:00:00Z",
//!   "taxonomy_version": "2022.2",
//!   "filing_information": [{ "message": "...", "error_type": "missing", "severity": "ERROR" }]
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const STATUS_KEY: &str = "validation_status";
const IS_VALID_KEY: &str = "is_valid";
const TIMESTAMP_KEY: &str = "validation_timestamp";
const TAXONOMY_KEY: &str = "taxonomy_version";

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }

    /// Case-insensitive parse; unrecognised labels count as errors
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "WARNING" | "WARN" => Severity::Warning,
            "INFO" | "INFORMATION" => Severity::Info,
            _ => Severity::Error,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Severity::parse_lenient(&label))
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorItem {
    pub message: String,
    #[serde(default)]
    pub error_type: String,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

fn default_severity() -> Severity {
    Severity::Error
}

impl ValidationErrorItem {
    pub fn new(severity: Severity, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: error_type.into(),
            severity,
            actual_value: None,
            recommendation: None,
        }
    }

    pub fn with_actual_value(mut self, value: Value) -> Self {
        self.actual_value = Some(value);
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// Findings grouped by category plus report metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub validation_status: Option<String>,
    pub is_valid: bool,
    pub validation_timestamp: Option<String>,
    pub taxonomy_version: Option<String>,
    pub categories: BTreeMap<String, Vec<ValidationErrorItem>>,
}

/// An empty report has no ERROR findings, so it is valid
impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            validation_status: None,
            is_valid: true,
            validation_timestamp: None,
            taxonomy_version: None,
            categories: BTreeMap::new(),
        }
    }
}

impl ValidationReport {
    /// All findings with their category, in category order
    pub fn items(&self) -> impl Iterator<Item = (&str, &ValidationErrorItem)> {
        self.categories
            .iter()
            .flat_map(|(category, items)| items.iter().map(move |item| (category.as_str(), item)))
    }

    pub fn push(&mut self, category: impl Into<String>, item: ValidationErrorItem) {
        self.categories.entry(category.into()).or_default().push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }

    /// Parse a raw report; top-level keys holding arrays are categories,
    /// anything else unrecognised is ignored
    pub fn from_map(mut map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let take_string = |map: &mut Map<String, Value>, key: &str| match map.remove(key) {
            Some(Value::String(s)) => Some(s),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        let validation_status = take_string(&mut map, STATUS_KEY);
        let validation_timestamp = take_string(&mut map, TIMESTAMP_KEY);
        let taxonomy_version = take_string(&mut map, TAXONOMY_KEY);
        let is_valid = match map.remove(IS_VALID_KEY) {
            Some(Value::Bool(b)) => Some(b),
            _ => None,
        };

        let mut categories = BTreeMap::new();
        for (key, value) in map {
            if let Value::Array(entries) = value {
                let items = entries
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<ValidationErrorItem>, _>>()?;
                categories.insert(key, items);
            }
        }

        let is_valid = is_valid.unwrap_or_else(|| {
            !categories
                .values()
                .flatten()
                .any(|item: &ValidationErrorItem| item.severity == Severity::Error)
        });

        Ok(Self {
            validation_status,
            is_valid,
            validation_timestamp,
            taxonomy_version,
            categories,
        })
    }

    /// Flat JSON representation
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (category, items) in &self.categories {
            map.insert(
                category.clone(),
                Value::Array(
                    items
                        .iter()
                        .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
                        .collect(),
                ),
            );
        }
        if let Some(status) = &self.validation_status {
            map.insert(STATUS_KEY.to_string(), Value::String(status.clone()));
        }
        map.insert(IS_VALID_KEY.to_string(), Value::Bool(self.is_valid));
        if let Some(ts) = &self.validation_timestamp {
            map.insert(TIMESTAMP_KEY.to_string(), Value::String(ts.clone()));
        }
        if let Some(version) = &self.taxonomy_version {
            map.insert(TAXONOMY_KEY.to_string(), Value::String(version.clone()));
        }
        map
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValidationReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        ValidationReport::from_map(map).map_err(serde::de::Error::custom)
    }
}
