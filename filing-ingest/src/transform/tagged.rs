//! Tagged format generation
//!
//! Every leaf of the domain model becomes an envelope:
//!
//! ```json
//! {
//!   "value": 1200,
//!   "numeric_value": 1200.0,
//!   "tags": [{ "element_name": "sg-as:CurrentAssets", "data_type": "xbrli:monetaryItemType",
//!              "period_type": "instant", "balance_type": "debit", "unit": "SGD" }]
//! }
//! ```
//!
//! Null leaves stay a literal `null`. A value that cannot be coerced to its
//! field's kind keeps `value` and carries a `null` typed value, so nothing
//! is silently dropped on the way to document generation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::fields::{mappings, FieldMapping, LeafKind};
use super::DomainFiling;

/// Domain path of the presentation currency, used as the monetary unit
const CURRENCY_PATH: [&str; 2] = ["filingInformation", "DescriptionOfPresentationCurrency"];

/// Filing in tagged shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaggedFiling(Value);

impl TaggedFiling {
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        super::lookup(&self.0, path)
    }

    /// Number of envelopes (non-null leaves)
    pub fn tagged_count(&self) -> usize {
        mappings()
            .filter(|m| self.get(&m.domain_path()).is_some_and(Value::is_object))
            .count()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Metadata describing one tagged fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTag {
    pub element_name: String,
    pub data_type: String,
    pub period_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

pub(super) fn tag(domain: &DomainFiling) -> TaggedFiling {
    let unit = domain
        .get(&CURRENCY_PATH)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());

    let mut root = Value::Object(Map::new());
    for mapping in mappings() {
        let path = mapping.domain_path();
        let leaf = match domain.get(&path) {
            None | Some(Value::Null) => Value::Null,
            Some(value) => envelope(&mapping, value, unit.as_deref()),
        };
        super::insert(&mut root, &path, leaf);
    }

    TaggedFiling(root)
}

fn envelope(mapping: &FieldMapping, value: &Value, unit: Option<&str>) -> Value {
    let kind = mapping.leaf.kind;
    let element_tag = ElementTag {
        element_name: mapping.element_name(),
        data_type: kind.data_type().to_string(),
        period_type: mapping.leaf.period.as_str().to_string(),
        balance_type: mapping.leaf.balance.map(|b| b.as_str().to_string()),
        unit: match kind {
            LeafKind::Monetary => unit.map(str::to_string),
            _ => None,
        },
    };

    let typed = coerce(kind, value);
    if typed.is_null() {
        tracing::debug!(
            element = %element_tag.element_name,
            value = %value,
            "Leaf value does not match its field kind"
        );
    }

    let mut envelope = Map::new();
    envelope.insert("value".to_string(), value.clone());
    envelope.insert(kind.value_key().to_string(), typed);
    envelope.insert("tags".to_string(), json!([element_tag]));
    Value::Object(envelope)
}

/// Convert a leaf to the JSON type its kind requires, or `null`
fn coerce(kind: LeafKind, value: &Value) -> Value {
    match kind {
        LeafKind::Monetary => match value {
            Value::Number(_) => value.clone(),
            Value::String(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        LeafKind::Text => match value {
            Value::String(s) => Value::String(s.clone()),
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            _ => Value::Null,
        },
        LeafKind::Boolean => match value {
            Value::Bool(_) => value.clone(),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Value::Bool(true),
                "false" | "no" => Value::Bool(false),
                _ => Value::Null,
            },
            _ => Value::Null,
        },
        LeafKind::Date => match value {
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
    }
}
