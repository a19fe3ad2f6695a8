//! Field translation table
//!
//! One entry per leaf field: domain path, wire path, and the codec metadata
//! used for tagging. Both transform directions and the tagged generator read
//! this table, so adding a field here is the only change needed to carry it
//! through every representation.

/// Scalar kind of a leaf field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// Currency amount
    Monetary,
    /// Free text or enumerated code
    Text,
    /// Yes/no flag
    Boolean,
    /// ISO 8601 calendar date
    Date,
}

impl LeafKind {
    /// XBRL item type label
    pub fn data_type(&self) -> &'static str {
        match self {
            LeafKind::Monetary => "xbrli:monetaryItemType",
            LeafKind::Text => "xbrli:stringItemType",
            LeafKind::Boolean => "xbrli:booleanItemType",
            LeafKind::Date => "xbrli:dateItemType",
        }
    }

    /// Key carrying the typed value inside a tagged envelope
    pub fn value_key(&self) -> &'static str {
        match self {
            LeafKind::Monetary => "numeric_value",
            LeafKind::Text => "string_value",
            LeafKind::Boolean => "boolean_value",
            LeafKind::Date => "date_value",
        }
    }
}

/// Period over which a fact is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodType {
    Instant,
    Duration,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Instant => "instant",
            PeriodType::Duration => "duration",
        }
    }
}

/// Natural balance of a monetary element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceType {
    Debit,
    Credit,
}

impl BalanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceType::Debit => "debit",
            BalanceType::Credit => "credit",
        }
    }
}

/// A single leaf field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafSpec {
    /// Taxonomy-derived identifier used in the domain model
    pub domain: &'static str,
    /// Underscore-separated key used in the wire format
    pub wire: &'static str,
    pub kind: LeafKind,
    pub period: PeriodType,
    pub balance: Option<BalanceType>,
}

/// A section (or subsection) and the leaves it owns
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub domain: &'static [&'static str],
    pub wire: &'static [&'static str],
    pub leaves: &'static [LeafSpec],
}

/// One row of the flattened translation table
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub section: &'static SectionSpec,
    pub leaf: &'static LeafSpec,
}

impl FieldMapping {
    pub fn domain_path(&self) -> Vec<&'static str> {
        let mut path = self.section.domain.to_vec();
        path.push(self.leaf.domain);
        path
    }

    pub fn wire_path(&self) -> Vec<&'static str> {
        let mut path = self.section.wire.to_vec();
        path.push(self.leaf.wire);
        path
    }

    /// Element name as used by the tagged representation
    pub fn element_name(&self) -> String {
        format!("{}:{}", TAXONOMY_PREFIX, self.leaf.domain)
    }
}

/// Namespace prefix for generated element names
pub const TAXONOMY_PREFIX: &str = "sg-as";

const fn text(domain: &'static str, wire: &'static str) -> LeafSpec {
    LeafSpec { domain, wire, kind: LeafKind::Text, period: PeriodType::Duration, balance: None }
}

const fn flag(domain: &'static str, wire: &'static str) -> LeafSpec {
    LeafSpec { domain, wire, kind: LeafKind::Boolean, period: PeriodType::Duration, balance: None }
}

const fn date(domain: &'static str, wire: &'static str) -> LeafSpec {
    LeafSpec { domain, wire, kind: LeafKind::Date, period: PeriodType::Duration, balance: None }
}

/// Balance-sheet amount (point in time)
const fn instant(domain: &'static str, wire: &'static str, balance: BalanceType) -> LeafSpec {
    LeafSpec {
        domain,
        wire,
        kind: LeafKind::Monetary,
        period: PeriodType::Instant,
        balance: Some(balance),
    }
}

/// Flow amount (over the reporting period)
const fn flow(domain: &'static str, wire: &'static str, balance: Option<BalanceType>) -> LeafSpec {
    LeafSpec { domain, wire, kind: LeafKind::Monetary, period: PeriodType::Duration, balance }
}

use BalanceType::{Credit, Debit};

const FILING_INFORMATION: &[LeafSpec] = &[
    text("NameOfCompany", "company_name"),
    text("UniqueEntityNumber", "unique_entity_number"),
    date("CurrentPeriodStartDate", "current_period_start"),
    date("CurrentPeriodEndDate", "current_period_end"),
    date("PriorPeriodStartDate", "prior_period_start"),
    text("TypeOfXBRLFiling", "xbrl_filing_type"),
    text("NatureOfFinancialStatementsCompanyLevelOrConsolidated", "financial_statement_type"),
    text("TypeOfAccountingStandardUsedToPrepareFinancialStatements", "accounting_standard"),
    date("DateOfAuthorisationForIssueOfFinancialStatements", "authorisation_date"),
    text("TypeOfStatementOfFinancialPosition", "financial_position_type"),
    flag("WhetherTheFinancialStatementsArePreparedOnGoingConcernBasis", "is_going_concern"),
    flag("WhetherThereAreAnyChangesToComparativeAmounts", "has_comparative_changes"),
    text("DescriptionOfPresentationCurrency", "presentation_currency"),
    text("DescriptionOfFunctionalCurrency", "functional_currency"),
    text("LevelOfRoundingUsedInFinancialStatements", "rounding_level"),
    text("DescriptionOfNatureOfEntitysOperationsAndPrincipalActivities", "entity_operations_description"),
    text("PrincipalPlaceOfBusinessIfDifferentFromRegisteredOffice", "principal_place_of_business"),
    flag("WhetherCompanyOrGroupIfConsolidatedAccountsArePreparedHasMoreThan50Employees", "has_more_than_50_employees"),
    text("NameOfParentEntity", "parent_entity"),
    text("NameOfUltimateParentOfGroup", "ultimate_parent_entity"),
    text("TaxonomyVersion", "taxonomy_version"),
    text("NameAndVersionOfSoftwareUsedToGenerateXBRLFile", "xbrl_software"),
    text("HowWasXBRLFilePrepared", "xbrl_preparation_method"),
];

const DIRECTORS_STATEMENT: &[LeafSpec] = &[
    flag(
        "WhetherInDirectorsOpinionFinancialStatementsAreDrawnUpSoAsToExhibitATrueAndFairView",
        "true_and_fair_view",
    ),
    flag(
        "WhetherThereAreReasonableGroundsToBelieveThatCompanyWillBeAbleToPayItsDebtsAsAndWhenTheyFallDueAtDateOfStatement",
        "reasonable_grounds_company_debts",
    ),
];

const AUDIT_REPORT: &[LeafSpec] = &[
    text("TypeOfAuditOpinionInIndependentAuditorsReport", "audit_opinion"),
    text("AuditingStandardsUsedToConductTheAudit", "auditing_standards"),
    flag("WhetherThereIsAnyMaterialUncertaintyRelatingToGoingConcern", "material_uncertainty_going_concern"),
    flag("WhetherInAuditorsOpinionAccountingAndOtherRecordsRequiredAreProperlyKept", "proper_accounting_records"),
];

const FINANCIAL_POSITION_TOTALS: &[LeafSpec] = &[
    instant("Assets", "total_assets", Debit),
    instant("Liabilities", "total_liabilities", Credit),
];

const CURRENT_ASSETS: &[LeafSpec] = &[
    instant("CashAndBankBalances", "cash_and_bank_balances", Debit),
    instant("TradeAndOtherReceivablesCurrent", "trade_and_other_receivables", Debit),
    instant("CurrentFinanceLeaseReceivables", "finance_lease_receivables", Debit),
    instant("CurrentDerivativeFinancialAssets", "derivative_financial_assets", Debit),
    instant("CurrentFinancialAssetsMeasuredAtFairValueThroughProfitOrLoss", "financial_assets_fvtpl", Debit),
    instant("OtherCurrentFinancialAssets", "other_financial_assets", Debit),
    instant("DevelopmentProperties", "development_properties", Debit),
    instant("Inventories", "inventories", Debit),
    instant("OtherCurrentNonfinancialAssets", "other_non_financial_assets", Debit),
    instant(
        "NoncurrentAssetsOrDisposalGroupsClassifiedAsHeldForSaleOrAsHeldForDistributionToOwners",
        "held_for_sale_assets",
        Debit,
    ),
    instant("CurrentAssets", "total_current_assets", Debit),
];

const NONCURRENT_ASSETS: &[LeafSpec] = &[
    instant("TradeAndOtherReceivablesNoncurrent", "trade_and_other_receivables", Debit),
    instant("NoncurrentFinanceLeaseReceivables", "finance_lease_receivables", Debit),
    instant("NoncurrentDerivativeFinancialAssets", "derivative_financial_assets", Debit),
    instant("NoncurrentFinancialAssetsMeasuredAtFairValueThroughProfitOrLoss", "financial_assets_fvtpl", Debit),
    instant("OtherNoncurrentFinancialAssets", "other_financial_assets", Debit),
    instant("PropertyPlantAndEquipment", "property_plant_equipment", Debit),
    instant("InvestmentProperties", "investment_properties", Debit),
    instant("Goodwill", "goodwill", Debit),
    instant("IntangibleAssetsOtherThanGoodwill", "intangible_assets", Debit),
    instant("InvestmentsInSubsidiariesAssociatesOrJointVentures", "investments_in_entities", Debit),
    instant("DeferredTaxAssets", "deferred_tax_assets", Debit),
    instant("OtherNoncurrentNonfinancialAssets", "other_non_financial_assets", Debit),
    instant("NoncurrentAssets", "total_non_current_assets", Debit),
];

const CURRENT_LIABILITIES: &[LeafSpec] = &[
    instant("TradeAndOtherPayablesCurrent", "trade_and_other_payables", Credit),
    instant("CurrentLoansAndBorrowings", "loans_and_borrowings", Credit),
    instant("CurrentFinancialLiabilitiesMeasuredAtFairValueThroughProfitOrLoss", "financial_liabilities_fvtpl", Credit),
    instant("CurrentFinanceLeaseLiabilities", "finance_lease_liabilities", Credit),
    instant("OtherCurrentFinancialLiabilities", "other_financial_liabilities", Credit),
    instant("CurrentIncomeTaxLiabilities", "income_tax_liabilities", Credit),
    instant("CurrentProvisions", "provisions", Credit),
    instant("OtherCurrentNonfinancialLiabilities", "other_non_financial_liabilities", Credit),
    instant(
        "LiabilitiesClassifiedAsHeldForSale",
        "held_for_sale_liabilities",
        Credit,
    ),
    instant("CurrentLiabilities", "total_current_liabilities", Credit),
];

const NONCURRENT_LIABILITIES: &[LeafSpec] = &[
    instant("TradeAndOtherPayablesNoncurrent", "trade_and_other_payables", Credit),
    instant("NoncurrentLoansAndBorrowings", "loans_and_borrowings", Credit),
    instant("NoncurrentFinancialLiabilitiesMeasuredAtFairValueThroughProfitOrLoss", "financial_liabilities_fvtpl", Credit),
    instant("NoncurrentFinanceLeaseLiabilities", "finance_lease_liabilities", Credit),
    instant("OtherNoncurrentFinancialLiabilities", "other_financial_liabilities", Credit),
    instant("DeferredTaxLiabilities", "deferred_tax_liabilities", Credit),
    instant("NoncurrentProvisions", "provisions", Credit),
    instant("OtherNoncurrentNonfinancialLiabilities", "other_non_financial_liabilities", Credit),
    instant("NoncurrentLiabilities", "total_non_current_liabilities", Credit),
];

const EQUITY: &[LeafSpec] = &[
    instant("ShareCapital", "share_capital", Credit),
    instant("TreasuryShares", "treasury_shares", Debit),
    instant("AccumulatedProfitsLosses", "accumulated_profits_losses", Credit),
    instant("ReservesOtherThanAccumulatedProfitsLosses", "other_reserves", Credit),
    instant("NoncontrollingInterests", "non_controlling_interests", Credit),
    instant("Equity", "total_equity", Credit),
];

const INCOME_STATEMENT: &[LeafSpec] = &[
    flow("Revenue", "revenue", Some(Credit)),
    flow("OtherIncome", "other_income", Some(Credit)),
    flow("EmployeeBenefitsExpense", "employee_expenses", Some(Debit)),
    flow("DepreciationExpense", "depreciation_expense", Some(Debit)),
    flow("AmortisationExpense", "amortisation_expense", Some(Debit)),
    flow("RepairsAndMaintenanceExpense", "repairs_and_maintenance_expense", Some(Debit)),
    flow("SalesAndMarketingExpense", "sales_and_marketing_expense", Some(Debit)),
    flow("OtherExpensesByNature", "other_expenses", Some(Debit)),
    flow("OtherGainsLosses", "other_gains_losses", Some(Credit)),
    flow("FinanceCosts", "finance_costs", Some(Debit)),
    flow(
        "ShareOfProfitLossOfAssociatesAndJointVenturesAccountedForUsingEquityMethod",
        "share_of_profit_of_associates",
        Some(Credit),
    ),
    flow("ProfitLossBeforeTaxation", "profit_before_tax", Some(Credit)),
    flow("TaxExpenseBenefitContinuingOperations", "income_tax", Some(Debit)),
    flow("ProfitLossFromDiscontinuedOperations", "profit_from_discontinued_operations", Some(Credit)),
    flow("ProfitLoss", "profit_loss", Some(Credit)),
    flow("ProfitLossAttributableToOwnersOfCompany", "profit_attributable_to_owners", Some(Credit)),
    flow("ProfitLossAttributableToNoncontrollingInterests", "profit_attributable_to_nci", Some(Credit)),
];

const CASH_FLOW_STATEMENT: &[LeafSpec] = &[
    flow("CashFlowsFromUsedInOperatingActivities", "operating_cash_flow", None),
    flow("CashFlowsFromUsedInInvestingActivities", "investing_cash_flow", None),
    flow("CashFlowsFromUsedInFinancingActivities", "financing_cash_flow", None),
    flow(
        "IncreaseDecreaseInCashAndCashEquivalents",
        "net_change_in_cash",
        None,
    ),
    instant("CashAndCashEquivalentsAtBeginningOfPeriod", "cash_at_beginning", Debit),
    instant("CashAndCashEquivalentsAtEndOfPeriod", "cash_at_end", Debit),
];

const CHANGES_IN_EQUITY: &[LeafSpec] = &[
    instant("ShareCapitalAtBeginningOfPeriod", "share_capital_at_beginning", Credit),
    instant("AccumulatedProfitsLossesAtBeginningOfPeriod", "accumulated_profits_at_beginning", Credit),
    flow("TotalComprehensiveIncome", "total_comprehensive_income", Some(Credit)),
    flow("IssueOfShareCapital", "share_issuance", Some(Credit)),
    flow("DividendsDeclared", "dividends_declared", Some(Debit)),
    instant("ShareCapitalAtEndOfPeriod", "share_capital_at_end", Credit),
    instant("AccumulatedProfitsLossesAtEndOfPeriod", "accumulated_profits_at_end", Credit),
    instant("EquityAtEndOfPeriod", "total_equity_at_end", Credit),
];

const TRADE_RECEIVABLES_NOTE: &[LeafSpec] = &[
    instant("TradeAndOtherReceivablesDueFromThirdParties", "receivables_from_third_parties", Debit),
    instant("TradeAndOtherReceivablesDueFromRelatedParties", "receivables_from_related_parties", Debit),
    instant("UnbilledReceivables", "unbilled_receivables", Debit),
    instant("OtherReceivables", "other_receivables", Debit),
    instant("TradeAndOtherReceivables", "total_trade_and_other_receivables", Debit),
];

const TRADE_PAYABLES_NOTE: &[LeafSpec] = &[
    instant("TradeAndOtherPayablesDueToThirdParties", "payables_to_third_parties", Credit),
    instant("TradeAndOtherPayablesDueToRelatedParties", "payables_to_related_parties", Credit),
    instant("DeferredIncome", "deferred_income", Credit),
    instant("OtherPayables", "other_payables", Credit),
    instant("TradeAndOtherPayables", "total_trade_and_other_payables", Credit),
];

const REVENUE_NOTE: &[LeafSpec] = &[
    flow("RevenueFromPropertyTransferredAtPointInTime", "property_point_in_time", Some(Credit)),
    flow("RevenueFromGoodsTransferredAtPointInTime", "goods_point_in_time", Some(Credit)),
    flow("RevenueFromServicesTransferredAtPointInTime", "services_point_in_time", Some(Credit)),
    flow("RevenueFromPropertyTransferredOverTime", "property_over_time", Some(Credit)),
    flow("RevenueFromConstructionContractsOverTime", "construction_over_time", Some(Credit)),
    flow("RevenueFromServicesTransferredOverTime", "services_over_time", Some(Credit)),
    flow("OtherRevenue", "other_revenue", Some(Credit)),
    flow("Revenue", "total_revenue", Some(Credit)),
];

/// Every section of the filing, in display order
pub static SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        domain: &["filingInformation"],
        wire: &["filing_information"],
        leaves: FILING_INFORMATION,
    },
    SectionSpec {
        domain: &["directorsStatement"],
        wire: &["directors_statement"],
        leaves: DIRECTORS_STATEMENT,
    },
    SectionSpec {
        domain: &["auditReport"],
        wire: &["audit_report"],
        leaves: AUDIT_REPORT,
    },
    SectionSpec {
        domain: &["statementOfFinancialPosition"],
        wire: &["statement_of_financial_position"],
        leaves: FINANCIAL_POSITION_TOTALS,
    },
    SectionSpec {
        domain: &["statementOfFinancialPosition", "currentAssets"],
        wire: &["statement_of_financial_position", "current_assets"],
        leaves: CURRENT_ASSETS,
    },
    SectionSpec {
        domain: &["statementOfFinancialPosition", "nonCurrentAssets"],
        wire: &["statement_of_financial_position", "non_current_assets"],
        leaves: NONCURRENT_ASSETS,
    },
    SectionSpec {
        domain: &["statementOfFinancialPosition", "currentLiabilities"],
        wire: &["statement_of_financial_position", "current_liabilities"],
        leaves: CURRENT_LIABILITIES,
    },
    SectionSpec {
        domain: &["statementOfFinancialPosition", "nonCurrentLiabilities"],
        wire: &["statement_of_financial_position", "non_current_liabilities"],
        leaves: NONCURRENT_LIABILITIES,
    },
    SectionSpec {
        domain: &["statementOfFinancialPosition", "equity"],
        wire: &["statement_of_financial_position", "equity"],
        leaves: EQUITY,
    },
    SectionSpec {
        domain: &["incomeStatement"],
        wire: &["income_statement"],
        leaves: INCOME_STATEMENT,
    },
    SectionSpec {
        domain: &["statementOfCashFlows"],
        wire: &["statement_of_cash_flows"],
        leaves: CASH_FLOW_STATEMENT,
    },
    SectionSpec {
        domain: &["statementOfChangesInEquity"],
        wire: &["statement_of_changes_in_equity"],
        leaves: CHANGES_IN_EQUITY,
    },
    SectionSpec {
        domain: &["notes", "tradeAndOtherReceivables"],
        wire: &["notes", "trade_and_other_receivables"],
        leaves: TRADE_RECEIVABLES_NOTE,
    },
    SectionSpec {
        domain: &["notes", "tradeAndOtherPayables"],
        wire: &["notes", "trade_and_other_payables"],
        leaves: TRADE_PAYABLES_NOTE,
    },
    SectionSpec {
        domain: &["notes", "revenue"],
        wire: &["notes", "revenue"],
        leaves: REVENUE_NOTE,
    },
];

/// Flattened view of the table, one row per leaf
pub fn mappings() -> impl Iterator<Item = FieldMapping> {
    SECTIONS.iter().flat_map(|section| {
        section
            .leaves
            .iter()
            .map(move |leaf| FieldMapping { section, leaf })
    })
}

/// Look up a mapping by its domain path (e.g. `["incomeStatement", "Revenue"]`)
pub fn find_by_domain_path(path: &[&str]) -> Option<FieldMapping> {
    mappings().find(|m| m.domain_path() == path)
}
