//! Aggregate consistency checks
//!
//! Recomputes totals from their components and reports differences larger
//! than a rounding tolerance as `calculation` warnings. Checks never reject a
//! filing: a rule with a missing aggregate, or with no components present,
//! is skipped.
//!
//! Subtotal rules are derived from the translation table: within each
//! balance-sheet subsection and each note, the section's total leaf must
//! equal the sum of its other monetary leaves.

use serde_json::{json, Value};
use tracing::debug;

use crate::models::{Severity, ValidationErrorItem, ValidationReport};
use crate::transform::fields::{LeafKind, SECTIONS};
use crate::transform::DomainFiling;

/// Category holding every finding produced here
pub const CALCULATION_CATEGORY: &str = "calculation";

/// Largest difference treated as rounding
pub const ROUNDING_TOLERANCE: f64 = 1.0;

const SFP: &str = "statementOfFinancialPosition";

/// `aggregate == Σ sign * component`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRule {
    pub name: String,
    pub aggregate: Vec<&'static str>,
    pub components: Vec<(f64, Vec<&'static str>)>,
}

impl AggregateRule {
    fn sum_of(name: impl Into<String>, aggregate: &[&'static str], components: &[&[&'static str]]) -> Self {
        Self {
            name: name.into(),
            aggregate: aggregate.to_vec(),
            components: components.iter().map(|c| (1.0, c.to_vec())).collect(),
        }
    }
}

/// Sections whose total leaf is the sum of the section's other leaves
const SUBTOTAL_SECTIONS: &[(&[&str], &str)] = &[
    (&[SFP, "currentAssets"], "CurrentAssets"),
    (&[SFP, "nonCurrentAssets"], "NoncurrentAssets"),
    (&[SFP, "currentLiabilities"], "CurrentLiabilities"),
    (&[SFP, "nonCurrentLiabilities"], "NoncurrentLiabilities"),
    (&["notes", "tradeAndOtherReceivables"], "TradeAndOtherReceivables"),
    (&["notes", "tradeAndOtherPayables"], "TradeAndOtherPayables"),
    (&["notes", "revenue"], "Revenue"),
];

/// The full rule set
pub fn rules() -> Vec<AggregateRule> {
    let mut rules: Vec<AggregateRule> = SUBTOTAL_SECTIONS
        .iter()
        .filter_map(|(section_path, total)| subtotal_rule(section_path, total))
        .collect();

    rules.push(AggregateRule::sum_of(
        "Total assets",
        &[SFP, "Assets"],
        &[
            &[SFP, "currentAssets", "CurrentAssets"],
            &[SFP, "nonCurrentAssets", "NoncurrentAssets"],
        ],
    ));
    rules.push(AggregateRule::sum_of(
        "Total liabilities",
        &[SFP, "Liabilities"],
        &[
            &[SFP, "currentLiabilities", "CurrentLiabilities"],
            &[SFP, "nonCurrentLiabilities", "NoncurrentLiabilities"],
        ],
    ));
    rules.push(AggregateRule {
        name: "Total equity".to_string(),
        aggregate: vec![SFP, "equity", "Equity"],
        components: vec![
            (1.0, vec![SFP, "equity", "ShareCapital"]),
            (-1.0, vec![SFP, "equity", "TreasuryShares"]),
            (1.0, vec![SFP, "equity", "AccumulatedProfitsLosses"]),
            (1.0, vec![SFP, "equity", "ReservesOtherThanAccumulatedProfitsLosses"]),
            (1.0, vec![SFP, "equity", "NoncontrollingInterests"]),
        ],
    });
    rules.push(AggregateRule::sum_of(
        "Balance sheet equation",
        &[SFP, "Assets"],
        &[&[SFP, "Liabilities"], &[SFP, "equity", "Equity"]],
    ));
    rules.push(AggregateRule::sum_of(
        "Revenue note agrees with income statement",
        &["notes", "revenue", "Revenue"],
        &[&["incomeStatement", "Revenue"]],
    ));
    rules.push(AggregateRule::sum_of(
        "Net change in cash",
        &["statementOfCashFlows", "IncreaseDecreaseInCashAndCashEquivalents"],
        &[
            &["statementOfCashFlows", "CashFlowsFromUsedInOperatingActivities"],
            &["statementOfCashFlows", "CashFlowsFromUsedInInvestingActivities"],
            &["statementOfCashFlows", "CashFlowsFromUsedInFinancingActivities"],
        ],
    ));
    rules.push(AggregateRule::sum_of(
        "Closing cash",
        &["statementOfCashFlows", "CashAndCashEquivalentsAtEndOfPeriod"],
        &[
            &["statementOfCashFlows", "CashAndCashEquivalentsAtBeginningOfPeriod"],
            &["statementOfCashFlows", "IncreaseDecreaseInCashAndCashEquivalents"],
        ],
    ));

    rules
}

fn subtotal_rule(section_path: &[&str], total: &'static str) -> Option<AggregateRule> {
    let section = SECTIONS.iter().find(|s| s.domain == section_path)?;

    let mut aggregate = section.domain.to_vec();
    aggregate.push(total);

    let components = section
        .leaves
        .iter()
        .filter(|leaf| leaf.kind == LeafKind::Monetary && leaf.domain != total)
        .map(|leaf| {
            let mut path = section.domain.to_vec();
            path.push(leaf.domain);
            (1.0, path)
        })
        .collect();

    Some(AggregateRule {
        name: total.to_string(),
        aggregate,
        components,
    })
}

/// Numeric value of a leaf; accepts numbers and numeric strings with
/// thousands separators
fn amount(domain: &DomainFiling, path: &[&str]) -> Option<f64> {
    match domain.get(path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Result of applying one rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub reported: f64,
    pub computed: f64,
}

impl RuleOutcome {
    pub fn difference(&self) -> f64 {
        self.reported - self.computed
    }

    pub fn is_consistent(&self) -> bool {
        self.difference().abs() <= ROUNDING_TOLERANCE
    }
}

/// Apply a rule; `None` when it cannot be evaluated
pub fn evaluate(rule: &AggregateRule, domain: &DomainFiling) -> Option<RuleOutcome> {
    let reported = amount(domain, &rule.aggregate)?;

    let present: Vec<f64> = rule
        .components
        .iter()
        .filter_map(|(sign, path)| amount(domain, path).map(|v| sign * v))
        .collect();
    if present.is_empty() {
        return None;
    }

    Some(RuleOutcome {
        reported,
        computed: present.iter().sum(),
    })
}

/// Run every rule against `domain`
pub fn check_aggregates(domain: &DomainFiling) -> ValidationReport {
    let mut report = ValidationReport {
        validation_status: None,
        is_valid: true,
        validation_timestamp: Some(filing_common::time::to_storage(filing_common::time::now())),
        taxonomy_version: domain
            .get(&["filingInformation", "TaxonomyVersion"])
            .and_then(Value::as_str)
            .map(str::to_string),
        categories: Default::default(),
    };

    let mut evaluated = 0usize;
    for rule in rules() {
        let Some(outcome) = evaluate(&rule, domain) else {
            continue;
        };
        evaluated += 1;

        if outcome.is_consistent() {
            continue;
        }

        report.push(
            CALCULATION_CATEGORY,
            ValidationErrorItem::new(
                Severity::Warning,
                "calculation_mismatch",
                format!(
                    "{} ({}) does not match the sum of its components ({})",
                    rule.name,
                    outcome.reported,
                    outcome.computed
                ),
            )
            .with_actual_value(json!(outcome.reported))
            .with_recommendation(format!(
                "Expected {} at {}; difference {}",
                outcome.computed,
                rule.aggregate.join("."),
                outcome.difference()
            )),
        );
    }

    let warnings = report.items().count();
    report.validation_status = Some(if warnings == 0 { "passed" } else { "warnings" }.to_string());
    debug!(evaluated, warnings, "Aggregate checks complete");

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::to_domain;

    /// Skeleton filing with leaves set by dotted path
    fn domain(values: Vec<(&str, Value)>) -> DomainFiling {
        let mut domain = to_domain(&json!({}));
        for (path, value) in values {
            let path: Vec<&str> = path.split('.').collect();
            domain.set(&path, value);
        }
        domain
    }

    #[test]
    fn empty_filing_has_no_findings() {
        let report = check_aggregates(&to_domain(&json!({})));
        assert!(report.is_valid);
        assert!(report.is_empty());
        assert_eq!(report.validation_status.as_deref(), Some("passed"));
    }

    #[test]
    fn subtotal_rules_cover_every_listed_section() {
        let names: Vec<String> = rules().into_iter().map(|r| r.name).collect();
        for (_, total) in SUBTOTAL_SECTIONS {
            assert!(names.iter().any(|n| n == total), "missing rule for {}", total);
        }
    }

    #[test]
    fn consistent_balance_sheet_passes() {
        let d = domain(vec![
            ("statementOfFinancialPosition.currentAssets.CashAndBankBalances", json!(400)),
            ("statementOfFinancialPosition.currentAssets.Inventories", json!(100)),
            ("statementOfFinancialPosition.currentAssets.CurrentAssets", json!(500)),
            ("statementOfFinancialPosition.nonCurrentAssets.PropertyPlantAndEquipment", json!(500)),
            ("statementOfFinancialPosition.nonCurrentAssets.NoncurrentAssets", json!(500)),
            ("statementOfFinancialPosition.Assets", json!(1000)),
            ("statementOfFinancialPosition.Liabilities", json!(300)),
            ("statementOfFinancialPosition.equity.ShareCapital", json!(700)),
            ("statementOfFinancialPosition.equity.Equity", json!(700)),
        ]);
        let report = check_aggregates(&d);
        assert!(report.is_empty(), "{:?}", report.categories);
    }

    #[test]
    fn rounding_within_tolerance() {
        let d = domain(vec![
            ("statementOfFinancialPosition.currentAssets.CashAndBankBalances", json!(100.4)),
            ("statementOfFinancialPosition.currentAssets.CurrentAssets", json!(101)),
        ]);
        assert!(check_aggregates(&d).is_empty());
    }

    #[test]
    fn mismatch_is_a_warning() {
        let d = domain(vec![
            ("statementOfFinancialPosition.currentAssets.CashAndBankBalances", json!("1,200")),
            ("statementOfFinancialPosition.currentAssets.Inventories", json!(300)),
            ("statementOfFinancialPosition.currentAssets.CurrentAssets", json!(1600)),
        ]);
        let report = check_aggregates(&d);
        assert!(report.is_valid);
        assert_eq!(report.validation_status.as_deref(), Some("warnings"));

        let items = &report.categories[CALCULATION_CATEGORY];
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].severity, Severity::Warning);
        assert_eq!(items[0].actual_value, Some(json!(1600.0)));
        assert!(items[0].message.starts_with("CurrentAssets"));
    }

    #[test]
    fn treasury_shares_reduce_equity() {
        let d = domain(vec![
            ("statementOfFinancialPosition.equity.ShareCapital", json!(1000)),
            ("statementOfFinancialPosition.equity.TreasuryShares", json!(200)),
            ("statementOfFinancialPosition.equity.Equity", json!(800)),
        ]);
        assert!(check_aggregates(&d).is_empty());
    }

    #[test]
    fn missing_aggregate_skips_rule() {
        let d = domain(vec![(
            "statementOfFinancialPosition.currentAssets.CashAndBankBalances",
            json!(10),
        )]);
        let rule = subtotal_rule(&[SFP, "currentAssets"], "CurrentAssets").unwrap();
        assert!(evaluate(&rule, &d).is_none());
    }
}
