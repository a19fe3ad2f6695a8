//! Cross-representation schema transformation
//!
//! Converts a filing between three shapes:
//! - **Domain model**: camelCase sections, taxonomy field names (`CurrentAssets`)
//! - **Wire format**: snake_case sections and fields (`total_current_assets`)
//!   plus opaque top-level cross references (`id`, `document`, `mapped_filing`)
//! - **Tagged format**: domain-shaped, every leaf wrapped in a tag envelope
//!
//! All conversions are pure and total. Missing sections become empty
//! objects, missing or sentinel leaves become `null`, and non-object input
//! degrades to an all-null skeleton. Data quality problems are left for
//! validation to report.

pub mod fields;
pub mod tagged;

use filing_common::config::TransformConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use fields::{mappings, FieldMapping, LeafKind, SECTIONS};
pub use tagged::TaggedFiling;

/// Filing in domain model shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainFiling(Value);

/// Filing in wire (storage) shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireFiling(Value);

/// Opaque wire-only references carried alongside the filing body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossReferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_filing: Option<Value>,
}

impl DomainFiling {
    /// Leaf or section at `path`
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        lookup(&self.0, path)
    }

    /// Numeric leaf at `path`, if present and numeric
    pub fn number(&self, path: &[&str]) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    /// Overwrite a leaf; intermediate sections are created as needed
    pub fn set(&mut self, path: &[&str], value: Value) {
        insert(&mut self.0, path, value);
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl WireFiling {
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        lookup(&self.0, path)
    }

    /// Extract `id`, `document` and `mapped_filing`
    pub fn cross_references(&self) -> CrossReferences {
        CrossReferences::from_wire(&self.0)
    }

    /// Attach cross references, replacing any that are already present
    pub fn with_cross_references(mut self, refs: &CrossReferences) -> Self {
        if let Value::Object(map) = &mut self.0 {
            let pairs = [
                ("id", &refs.id),
                ("document", &refs.document),
                ("mapped_filing", &refs.mapped_filing),
            ];
            for (key, value) in pairs {
                match value {
                    Some(value) => {
                        map.insert(key.to_string(), value.clone());
                    }
                    None => {
                        map.remove(key);
                    }
                }
            }
        }
        self
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl CrossReferences {
    /// Read cross references from a raw wire payload (non-objects yield none)
    pub fn from_wire(wire: &Value) -> Self {
        let get = |key: &str| wire.get(key).filter(|v| !v.is_null()).cloned();
        Self {
            id: get("id"),
            document: get("document"),
            mapped_filing: get("mapped_filing"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.document.is_none() && self.mapped_filing.is_none()
    }
}

impl From<DomainFiling> for Value {
    fn from(filing: DomainFiling) -> Self {
        filing.0
    }
}

impl From<WireFiling> for Value {
    fn from(filing: WireFiling) -> Self {
        filing.0
    }
}

/// Table-driven transformer carrying its explicit context
#[derive(Debug, Clone)]
pub struct Transformer {
    missing_sentinel: String,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(&TransformConfig::default())
    }
}

impl Transformer {
    pub fn new(config: &TransformConfig) -> Self {
        Self {
            missing_sentinel: config.missing_sentinel.clone(),
        }
    }

    /// Wire format → domain model
    pub fn to_domain(&self, wire: &Value) -> DomainFiling {
        DomainFiling(self.project(wire, FieldMapping::wire_path, FieldMapping::domain_path))
    }

    /// Domain model → wire format (cross references are not part of the
    /// domain model; attach them with [`WireFiling::with_cross_references`])
    pub fn to_wire(&self, domain: &Value) -> WireFiling {
        WireFiling(self.project(domain, FieldMapping::domain_path, FieldMapping::wire_path))
    }

    /// Domain model → tagged format
    pub fn to_tagged(&self, domain: &DomainFiling) -> TaggedFiling {
        tagged::tag(domain)
    }

    /// Copy every table leaf from `source` into a fresh skeleton
    fn project(
        &self,
        source: &Value,
        source_path: fn(&FieldMapping) -> Vec<&'static str>,
        target_path: fn(&FieldMapping) -> Vec<&'static str>,
    ) -> Value {
        let mut target = skeleton(target_path);

        if !source.is_object() {
            tracing::debug!(
                kind = value_kind(source),
                "Filing payload is not an object, producing empty skeleton"
            );
            return target;
        }

        for mapping in mappings() {
            let value = lookup(source, &source_path(&mapping))
                .map(|v| self.decode_leaf(v))
                .unwrap_or(Value::Null);
            insert(&mut target, &target_path(&mapping), value);
        }

        target
    }

    /// Normalize one leaf: sentinel and non-scalar values become `null`
    fn decode_leaf(&self, value: &Value) -> Value {
        match value {
            Value::String(s) if s.trim() == self.missing_sentinel => Value::Null,
            Value::Object(_) | Value::Array(_) => Value::Null,
            other => other.clone(),
        }
    }
}

/// Wire format → domain model using default settings
pub fn to_domain(wire: &Value) -> DomainFiling {
    Transformer::default().to_domain(wire)
}

/// Domain model → wire format using default settings
pub fn to_wire(domain: &Value) -> WireFiling {
    Transformer::default().to_wire(domain)
}

/// Object with every section present and every leaf `null`
fn skeleton(path_of: fn(&FieldMapping) -> Vec<&'static str>) -> Value {
    let mut root = Value::Object(Map::new());
    for mapping in mappings() {
        insert(&mut root, &path_of(&mapping), Value::Null);
    }
    root
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.as_object()?.get(*key))
}

/// Set `path` to `value`, replacing any non-object found along the way
fn insert(root: &mut Value, path: &[&str], value: Value) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };

    let mut node = root;
    for key in parents {
        node = ensure_object(node)
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(leaf.to_string(), value);
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_input_yields_full_skeletons() {
        let domain = to_domain(&json!({}));
        for section in SECTIONS {
            assert!(domain.get(section.domain).unwrap().is_object());
        }
        assert_eq!(domain.get(&["incomeStatement", "Revenue"]), Some(&Value::Null));

        let wire = to_wire(&json!({}));
        for section in SECTIONS {
            assert!(wire.get(section.wire).unwrap().is_object());
        }
        assert_eq!(wire.get(&["income_statement", "revenue"]), Some(&Value::Null));
    }

    #[test]
    fn non_object_input_does_not_panic() {
        for input in [json!(null), json!(42), json!("filing"), json!([1, 2, 3]), json!(true)] {
            let domain = to_domain(&input);
            assert!(domain.get(&["notes", "revenue"]).unwrap().is_object());
            let wire = to_wire(&input);
            assert!(wire.get(&["notes", "revenue"]).unwrap().is_object());
        }
    }

    #[test]
    fn malformed_section_degrades_to_empty() {
        let domain = to_domain(&json!({
            "income_statement": "not an object",
            "statement_of_financial_position": { "current_assets": [1, 2] },
        }));
        assert!(domain.get(&["incomeStatement"]).unwrap().is_object());
        assert_eq!(domain.get(&["incomeStatement", "ProfitLoss"]), Some(&Value::Null));
        assert_eq!(
            domain.get(&["statementOfFinancialPosition", "currentAssets", "CurrentAssets"]),
            Some(&Value::Null)
        );
    }

    #[test]
    fn values_are_type_preserving() {
        let domain = to_domain(&json!({
            "filing_information": {
                "company_name": "Acme Pte. Ltd.",
                "is_going_concern": true,
            },
            "income_statement": { "revenue": 1250000.5, "profit_loss": -3200 },
        }));
        assert_eq!(domain.get(&["filingInformation", "NameOfCompany"]), Some(&json!("Acme Pte. Ltd.")));
        assert_eq!(
            domain.get(&["filingInformation", "WhetherTheFinancialStatementsArePreparedOnGoingConcernBasis"]),
            Some(&json!(true))
        );
        assert_eq!(domain.get(&["incomeStatement", "Revenue"]), Some(&json!(1250000.5)));
        assert_eq!(domain.get(&["incomeStatement", "ProfitLoss"]), Some(&json!(-3200)));
    }

    #[test]
    fn sentinel_becomes_null() {
        let domain = to_domain(&json!({ "income_statement": { "revenue": "N/A", "finance_costs": " N/A " } }));
        assert_eq!(domain.get(&["incomeStatement", "Revenue"]), Some(&Value::Null));
        assert_eq!(domain.get(&["incomeStatement", "FinanceCosts"]), Some(&Value::Null));
    }

    #[test]
    fn custom_sentinel_is_honoured() {
        let transformer = Transformer::new(&TransformConfig {
            missing_sentinel: "-".to_string(),
        });
        let domain = transformer.to_domain(&json!({ "income_statement": { "revenue": "-", "other_income": "N/A" } }));
        assert_eq!(domain.get(&["incomeStatement", "Revenue"]), Some(&Value::Null));
        assert_eq!(domain.get(&["incomeStatement", "OtherIncome"]), Some(&json!("N/A")));
    }

    #[test]
    fn fields_outside_table_are_dropped() {
        let domain = to_domain(&json!({
            "income_statement": { "revenue": 10, "made_up_field": 99 },
            "unknown_section": { "x": 1 },
        }));
        assert!(domain.get(&["incomeStatement", "made_up_field"]).is_none());
        assert!(domain.get(&["unknown_section"]).is_none());
    }

    #[test]
    fn cross_references_survive_reattachment() {
        let raw = json!({
            "id": "rec-1",
            "document": { "file": "fs-2024.pdf" },
            "mapped_filing": 17,
            "income_statement": { "revenue": 5 },
        });
        let refs = CrossReferences::from_wire(&raw);
        assert!(!refs.is_empty());

        let wire = to_wire(to_domain(&raw).as_value()).with_cross_references(&refs);
        assert_eq!(wire.get(&["id"]), Some(&json!("rec-1")));
        assert_eq!(wire.get(&["document", "file"]), Some(&json!("fs-2024.pdf")));
        assert_eq!(wire.get(&["mapped_filing"]), Some(&json!(17)));
        assert_eq!(wire.get(&["income_statement", "revenue"]), Some(&json!(5)));
    }
}
