//! Validation report queries: counting, filtering, ordering

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::models::{Severity, ValidationErrorItem, ValidationReport};

const ALL_SEVERITIES: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];

/// Finding counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_count: usize,
    /// Every severity is present, zero counts included
    pub counts_by_severity: BTreeMap<String, usize>,
    pub counts_by_category: BTreeMap<String, usize>,
}

impl ReportSummary {
    pub fn count(&self, severity: Severity) -> usize {
        self.counts_by_severity
            .get(severity.as_str())
            .copied()
            .unwrap_or(0)
    }
}

pub fn summarize(report: &ValidationReport) -> ReportSummary {
    let mut counts_by_severity: BTreeMap<String, usize> = ALL_SEVERITIES
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    let mut counts_by_category = BTreeMap::new();

    for (category, items) in &report.categories {
        counts_by_category.insert(category.clone(), items.len());
        for item in items {
            *counts_by_severity
                .entry(item.severity.as_str().to_string())
                .or_insert(0) += 1;
        }
    }

    ReportSummary {
        total_count: counts_by_category.values().sum(),
        counts_by_severity,
        counts_by_category,
    }
}

/// Keep findings matching `predicate`; categories left empty are dropped
pub fn filter<F>(report: &ValidationReport, predicate: F) -> ValidationReport
where
    F: Fn(&str, &ValidationErrorItem) -> bool,
{
    let categories = report
        .categories
        .iter()
        .filter_map(|(category, items)| {
            let kept: Vec<ValidationErrorItem> = items
                .iter()
                .filter(|item| predicate(category, item))
                .cloned()
                .collect();
            (!kept.is_empty()).then(|| (category.clone(), kept))
        })
        .collect();

    ValidationReport {
        validation_status: report.validation_status.clone(),
        is_valid: report.is_valid,
        validation_timestamp: report.validation_timestamp.clone(),
        taxonomy_version: report.taxonomy_version.clone(),
        categories,
    }
}

/// Case-insensitive free-text search over message, error type,
/// recommendation and category name. A blank query keeps everything.
pub fn search(report: &ValidationReport, query: &str) -> ValidationReport {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return report.clone();
    }

    filter(report, |category, item| {
        let contains = |text: &str| text.to_lowercase().contains(&needle);
        contains(category)
            || contains(&item.message)
            || contains(&item.error_type)
            || item.recommendation.as_deref().is_some_and(contains)
    })
}

pub fn filter_by_severity(report: &ValidationReport, severity: Severity) -> ValidationReport {
    filter(report, |_, item| item.severity == severity)
}

/// One category in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView<'a> {
    pub category: &'a str,
    pub count: usize,
    pub has_errors: bool,
    /// Categories holding errors start expanded
    pub expanded: bool,
    pub items: &'a [ValidationErrorItem],
}

/// Categories with errors first, then by descending size, then by name
pub fn ordered_categories(report: &ValidationReport) -> Vec<CategoryView<'_>> {
    let mut views: Vec<CategoryView<'_>> = report
        .categories
        .iter()
        .map(|(category, items)| {
            let has_errors = items.iter().any(|i| i.severity == Severity::Error);
            CategoryView {
                category,
                count: items.len(),
                has_errors,
                expanded: has_errors,
                items,
            }
        })
        .collect();

    views.sort_by_key(|v| (Reverse(v.has_errors), Reverse(v.count), v.category));
    views
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValidationReport {
        let mut report = ValidationReport::default();
        report.push(
            "notes",
            ValidationErrorItem::new(Severity::Info, "rounding", "Rounded to nearest dollar"),
        );
        report.push(
            "notes",
            ValidationErrorItem::new(Severity::Warning, "sum_mismatch", "Receivables total differs"),
        );
        report.push(
            "notes",
            ValidationErrorItem::new(Severity::Info, "format", "Date reformatted"),
        );
        report.push(
            "equity",
            ValidationErrorItem::new(Severity::Error, "missing_field", "Share capital is required")
                .with_recommendation("Enter issued share capital"),
        );
        report.push(
            "audit_report",
            ValidationErrorItem::new(Severity::Warning, "missing_field", "Auditor name absent"),
        );
        report
    }

    #[test]
    fn summary_counts_add_up() {
        let summary = summarize(&sample());
        assert_eq!(summary.total_count, 5);
        assert_eq!(
            summary.total_count,
            summary.counts_by_category.values().sum::<usize>()
        );
        assert_eq!(summary.count(Severity::Error), 1);
        assert_eq!(summary.count(Severity::Warning), 2);
        assert_eq!(summary.count(Severity::Info), 2);
    }

    #[test]
    fn empty_report_summary_has_all_severities() {
        let summary = summarize(&ValidationReport::default());
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.counts_by_severity.len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_and_drops_empty_categories() {
        let found = search(&sample(), "SHARE");
        assert_eq!(found.categories.len(), 1);
        assert_eq!(found.categories["equity"].len(), 1);

        // Matches on the recommendation text
        assert_eq!(search(&sample(), "issued").categories.len(), 1);
        // Matches on the category name
        assert_eq!(search(&sample(), "audit").categories["audit_report"].len(), 1);
        assert_eq!(search(&sample(), "   ").categories.len(), 3);
        assert!(search(&sample(), "nothing like this").is_empty());
    }

    #[test]
    fn severity_filter() {
        let warnings = filter_by_severity(&sample(), Severity::Warning);
        assert_eq!(summarize(&warnings).total_count, 2);
        assert!(!warnings.categories.contains_key("equity"));
    }

    #[test]
    fn errors_first_then_size() {
        let report = sample();
        let order: Vec<&str> = ordered_categories(&report)
            .iter()
            .map(|v| v.category)
            .collect();
        assert_eq!(order, vec!["equity", "notes", "audit_report"]);

        let views = ordered_categories(&report);
        assert!(views[0].expanded);
        assert!(!views[1].expanded);
    }
}
