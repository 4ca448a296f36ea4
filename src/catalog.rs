use crate::error::{AnalyticsError, Result};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Read-only mapping of canonical concept key -> ordered synonym labels
/// (taxonomy tags and free text as they appear in filings). Synonym order
/// within a key encodes match preference. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptCatalog {
    concepts: BTreeMap<String, Vec<String>>,
}

impl ConceptCatalog {
    /// The built-in catalog, constructed once for the process lifetime.
    pub fn builtin() -> &'static ConceptCatalog {
        static BUILTIN: Lazy<ConceptCatalog> = Lazy::new(|| {
            let mut concepts = BTreeMap::new();
            for (key, synonyms) in builtin_entries() {
                concepts.insert(
                    key.to_string(),
                    synonyms.iter().map(|s| s.to_string()).collect(),
                );
            }
            ConceptCatalog { concepts }
        });
        &BUILTIN
    }

    /// Ordered synonyms for a key; empty for unknown keys so resolution
    /// degrades to the caller's fallback rather than failing.
    pub fn synonyms(&self, key: &str) -> &[String] {
        self.concepts.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.concepts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.concepts.keys().map(String::as_str)
    }

    /// Load a versioned catalog from JSON. Changing the mapping is a data
    /// change, not a code change.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let file: CatalogFile = serde_json::from_reader(reader)?;
        Self::from_catalog_file(file)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn from_catalog_file(file: CatalogFile) -> Result<Self> {
        let mut concepts: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in file.concepts {
            if entry.key.trim().is_empty() {
                return Err(AnalyticsError::InvalidCatalogEntry {
                    key: entry.key,
                    details: "empty concept key".to_string(),
                });
            }
            if entry.synonyms.is_empty() {
                return Err(AnalyticsError::InvalidCatalogEntry {
                    key: entry.key,
                    details: "no synonyms listed".to_string(),
                });
            }
            if concepts.insert(entry.key.clone(), entry.synonyms).is_some() {
                return Err(AnalyticsError::DuplicateConceptKey(entry.key));
            }
        }
        log::info!(
            "Loaded concept catalog version '{}' with {} concepts",
            file.version,
            concepts.len()
        );
        Ok(ConceptCatalog { concepts })
    }
}

/// On-disk representation of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CatalogFile {
    #[schemars(description = "Catalog revision identifier, e.g. '2024-02'")]
    pub version: String,

    #[schemars(description = "One entry per canonical concept")]
    pub concepts: Vec<ConceptEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConceptEntry {
    #[schemars(description = "Canonical concept key, e.g. 'revenue'")]
    pub key: String,

    #[schemars(
        description = "Synonym labels in preference order: taxonomy tags first, then free-text labels"
    )]
    pub synonyms: Vec<String>,
}

impl CatalogFile {
    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(CatalogFile);
        serde_json::to_string_pretty(&schema)
    }
}

#[rustfmt::skip]
fn builtin_entries() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("revenue", &[
            "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax",
            "us-gaap_RevenueFromContractWithCustomerExcludingAssessedTax",
            "us-gaap:SalesRevenueNet",
            "us-gaap_SalesRevenueNet",
            "us-gaap:Revenues",
            "us-gaap_Revenues",
            "Revenue",
            "Revenues",
            "Net sales",
            "Net Sales",
            "Operating revenue",
            "Total revenue",
            "RevenueFromContractWithCustomer",
            "BusinessAcquisitionsProFormaRevenue",
        ]),
        ("gross_profit", &[
            "us-gaap:GrossProfit",
            "us-gaap_GrossProfit",
            "Gross Profit",
            "Gross margin",
            "Gross margin, net",
            "GrossProfit",
        ]),
        ("cost_of_revenue", &[
            "us-gaap:CostOfGoodsAndServicesSold",
            "us-gaap_CostOfGoodsAndServicesSold",
            "us-gaap_CostOfRevenue",
            "Cost of revenue",
            "Cost of sales",
            "CostOfSalesPolicyTextBlock",
            "Cost of Sales",
            "Cost of sales (including depreciation)",
        ]),
        ("operating_expenses", &[
            "us-gaap:OperatingExpenses",
            "us-gaap_OperatingExpenses",
            "Operating expenses",
            "Operating expense",
            "Total operating expenses",
        ]),
        ("rnd_expenses", &[
            "us-gaap:ResearchAndDevelopmentExpense",
            "us-gaap_ResearchAndDevelopmentExpense",
            "R&D",
            "Research and development",
            "ResearchAndDevelopmentExpensePolicy",
        ]),
        ("sales_marketing", &[
            "us-gaap:SellingAndMarketingExpense",
            "us-gaap_SellingAndMarketingExpense",
            "Selling and marketing",
            "Marketing and advertising",
            "MarketingAndAdvertisingExpense",
            "AdvertisingCostsPolicyTextBlock",
        ]),
        ("general_administrative", &[
            "us-gaap:GeneralAndAdministrativeExpense",
            "us-gaap_GeneralAndAdministrativeExpense",
            "General and administrative",
            "SGA",
            "Selling, general and administrative",
        ]),
        ("operating_income", &[
            "us-gaap:OperatingIncomeLoss",
            "us-gaap_OperatingIncomeLoss",
            "Operating income",
            "Operating profit",
        ]),
        ("other_income_expense", &[
            "us-gaap:NonoperatingIncomeExpense",
            "us-gaap_NonoperatingIncomeExpense",
            "Other income/(expense), net",
            "Non-operating income/(expense)",
            "OtherNonoperatingIncomeExpense",
        ]),
        ("income_before_taxes", &[
            "us-gaap:IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
            "us-gaap_IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
            "Income before provision for income taxes",
            "Pretax income",
        ]),
        ("income_tax_expense", &[
            "us-gaap:IncomeTaxExpenseBenefit",
            "us-gaap_IncomeTaxExpenseBenefit",
            "Provision for income taxes",
            "Tax expense",
            "Current income tax expense",
            "Deferred income tax expense",
        ]),
        ("interest_expense", &[
            "us-gaap:InterestExpense",
            "us-gaap_InterestExpense",
            "us-gaap_InterestExpenseDebt",
            "Interest expense",
            "Interest expense, net",
            "InterestAndDebtExpense",
        ]),
        ("net_income", &[
            "us-gaap:NetIncomeLoss",
            "us-gaap_NetIncomeLoss",
            "Net Income",
            "Net Earnings",
            "Income (loss) from continuing operations",
            "BusinessAcquisitionsProFormaNetIncomeLoss",
        ]),
        ("depreciation_amortization", &[
            "us-gaap:DepreciationDepletionAndAmortization",
            "us-gaap_DepreciationDepletionAndAmortization",
            "us-gaap_DepreciationAmortizationAndAccretionNet",
            "Depreciation and amortization",
            "Depreciation & amortization",
            "Depreciation, amortization and accretion",
            "Depreciation expense",
        ]),
        ("depreciation_in_cost_of_sales", &[
            "Depreciation included in cost of sales",
            "Depreciation in cost of sales",
            "Depreciation (cost of sales)",
        ]),
        ("earnings_per_share_basic", &[
            "us-gaap:EarningsPerShareBasic",
            "us-gaap_EarningsPerShareBasic",
            "Basic EPS",
        ]),
        ("earnings_per_share_diluted", &[
            "us-gaap:EarningsPerShareDiluted",
            "us-gaap_EarningsPerShareDiluted",
            "Diluted EPS",
        ]),
        ("common_shares_outstanding", &[
            "dei_EntityCommonStockSharesOutstanding",
            "us-gaap_CommonStockSharesOutstanding",
            "Common Stock, shares outstanding",
            "Shares outstanding",
            "SharesIssued",
        ]),
        ("cash_equivalents", &[
            "us-gaap:CashAndCashEquivalentsAtCarryingValue",
            "us-gaap_CashAndCashEquivalentsAtCarryingValue",
            "Cash and cash equivalents",
            "CashCashEquivalentsAndShortTermInvestments",
            "Cash, cash equivalents, restricted",
        ]),
        ("short_term_investments", &[
            "us-gaap_AvailableForSaleSecuritiesDebtSecuritiesCurrent",
            "us-gaap_MarketableSecuritiesCurrent",
            "ST investments",
            "Marketable securities, current",
            "Short-term investments",
        ]),
        ("accounts_receivable", &[
            "us-gaap:AccountsReceivableNetCurrent",
            "us-gaap_AccountsReceivableNetCurrent",
            "Accounts receivable",
            "Accounts receivable, net",
            "Receivables",
        ]),
        ("inventory", &[
            "us-gaap:InventoryNet",
            "us-gaap_InventoryNet",
            "Inventories",
            "Inventory, net",
            "Inventory",
            "Inventory, finished goods",
            "Finished goods inventory",
            "Inventory, raw materials",
            "us-gaap_InventoryDisclosureTextBlock",
        ]),
        ("other_current_assets", &[
            "us-gaap_OtherAssetsCurrent",
            "us-gaap_PrepaidExpenseAndOtherAssetsCurrent",
            "Prepaid expenses and other current assets",
            "Other current assets",
        ]),
        ("current_assets", &[
            "us-gaap:AssetsCurrent",
            "us-gaap_AssetsCurrent",
            "Total current assets",
            "Assets, current",
        ]),
        ("long_term_investments", &[
            "us-gaap_LongTermInvestments",
            "us-gaap_MarketableSecuritiesNoncurrent",
            "Marketable securities, noncurrent",
            "Equity and other investments",
        ]),
        ("ppe_net", &[
            "us-gaap:PropertyPlantAndEquipmentNet",
            "us-gaap_PropertyPlantAndEquipmentNet",
            "Property, plant and equipment, net",
            "Property and equipment, net",
            "PPE net",
        ]),
        ("intangible_assets", &[
            "us-gaap:IntangibleAssetsNetExcludingGoodwill",
            "us-gaap_IntangibleAssetsNetExcludingGoodwill",
            "FiniteLivedIntangibleAssetsNet",
            "us-gaap_FiniteLivedIntangibleAssetsGross",
            "Intangible assets, net",
            "Acquired intangible assets",
        ]),
        ("goodwill", &[
            "us-gaap:Goodwill",
            "us-gaap_Goodwill",
            "Goodwill",
        ]),
        ("other_noncurrent_assets", &[
            "us-gaap:AssetsNoncurrent",
            "us-gaap_AssetsNoncurrent",
            "Total non-current assets",
            "Other non-current assets",
            "Long-lived assets",
        ]),
        ("total_assets", &[
            "us-gaap:Assets",
            "us-gaap_Assets",
            "Total assets",
        ]),
        ("accounts_payable", &[
            "us-gaap:AccountsPayableCurrent",
            "us-gaap_AccountsPayableCurrent",
            "Accounts payable",
            "AP",
            "Trade payables",
        ]),
        ("accrued_expenses", &[
            "us-gaap_AccruedLiabilitiesCurrent",
            "us-gaap_AccruedExpenses",
            "Accrued expenses",
            "Other accrued liabilities",
        ]),
        ("current_liabilities", &[
            "us-gaap:LiabilitiesCurrent",
            "us-gaap_LiabilitiesCurrent",
            "Total current liabilities",
            "Liabilities, current",
        ]),
        ("deferred_revenue", &[
            "us-gaap:ContractWithCustomerLiabilityCurrent",
            "us-gaap_ContractWithCustomerLiabilityCurrent",
            "Deferred revenue",
            "Unearned revenue",
            "Contract liability",
        ]),
        ("short_term_debt", &[
            "us-gaap_CommercialPaper",
            "Commercial paper",
            "LineOfCreditFacility",
            "Short-term debt",
        ]),
        ("long_term_debt", &[
            "us-gaap:LongTermDebt",
            "us-gaap_LongTermDebt",
            "Term debt",
            "Notes payable",
            "Bond obligations",
        ]),
        ("operating_lease_liabilities", &[
            "us-gaap_OperatingLeaseLiability",
            "Operating lease liabilities",
        ]),
        ("finance_lease_liabilities", &[
            "us-gaap_FinanceLeaseLiability",
            "Finance lease liabilities",
        ]),
        ("other_noncurrent_liabilities", &[
            "us-gaap_LiabilitiesNoncurrent",
            "us-gaap_OtherLiabilitiesNoncurrent",
            "Other non-current liabilities",
            "Total non-current liabilities",
        ]),
        ("total_liabilities", &[
            "us-gaap:Liabilities",
            "us-gaap_Liabilities",
            "Total liabilities",
        ]),
        ("total_equity", &[
            "us-gaap:StockholdersEquity",
            "us-gaap_StockholdersEquity",
            "Total shareholders\u{2019} equity",
            "Equity",
            "Shareholders' equity",
        ]),
        ("common_stock_and_apic", &[
            "us-gaap_CommonStocksIncludingAdditionalPaidInCapital",
            "us-gaap_AdditionalPaidInCapital",
            "Common stock and additional paid-in capital",
            "Additional paid-in capital",
        ]),
        ("treasury_stock", &[
            "us-gaap_TreasuryStockValue",
            "Treasury stock",
        ]),
        ("retained_earnings", &[
            "us-gaap_RetainedEarningsAccumulatedDeficit",
            "Retained earnings",
            "Accumulated deficit",
        ]),
        ("accumulated_oci", &[
            "us-gaap_AccumulatedOtherComprehensiveIncomeLossNetOfTax",
            "us-gaap_OtherComprehensiveIncomeLossNetOfTax",
            "Accumulated other comprehensive loss",
            "AOCI",
            "Other comprehensive income/loss",
        ]),
        ("comprehensive_income", &[
            "us-gaap:ComprehensiveIncomeNetOfTax",
            "us-gaap_ComprehensiveIncomeNetOfTax",
            "Total comprehensive income",
            "Other comprehensive income, net of tax",
        ]),
        ("cash_flow_operating", &[
            "us-gaap:NetCashProvidedByUsedInOperatingActivities",
            "us-gaap_NetCashProvidedByUsedInOperatingActivities",
            "Cash from/(used in) operating activities",
            "Cash generated by operating activities",
        ]),
        ("cash_flow_investing", &[
            "us-gaap:NetCashProvidedByUsedInInvestingActivities",
            "us-gaap_NetCashProvidedByUsedInInvestingActivities",
            "Cash from/(used in) investing activities",
            "Cash generated by/(used in) investing activities",
        ]),
        ("cash_flow_financing", &[
            "us-gaap:NetCashProvidedByUsedInFinancingActivities",
            "us-gaap_NetCashProvidedByUsedInFinancingActivities",
            "Cash from/(used in) financing activities",
            "Cash used in financing activities",
        ]),
        ("capital_expenditures", &[
            "us-gaap:PaymentsToAcquirePropertyPlantAndEquipment",
            "us-gaap_PaymentsToAcquirePropertyPlantAndEquipment",
            "Capital expenditures",
            "Purchase of PP&E",
            "Purchase of fixed assets",
            "Additions to property, plant and equipment",
            "PurchaseOfPropertyAndEquipment",
            "Capital expenditures, net",
            "Capital Expenditures, net",
            "Capital expenditure",
            "Capital Expenditure",
            "Capital investment",
            "CapEx",
            "Capex",
            "Property, plant and equipment acquisitions",
            "Capital asset purchases",
            "Purchase of property, plant, and equipment",
        ]),
        ("intangible_purchases", &[
            "us-gaap:PaymentsToAcquireIntangibleAssets",
            "us-gaap_PaymentsToAcquireIntangibleAssets",
            "Purchases of intangible assets",
            "Purchase of intangibles",
            "Payments for intangible assets",
        ]),
        ("acquisitions", &[
            "us-gaap:PaymentsToAcquireBusinessesNetOfCashAcquired",
            "us-gaap_PaymentsToAcquireBusinessesNetOfCashAcquired",
            "Acquisitions, net of cash acquired",
            "Payments for business acquisitions",
            "Purchase of businesses, net of cash",
        ]),
        ("share_based_compensation", &[
            "us-gaap_ShareBasedCompensation",
            "us-gaap_AllocatedShareBasedCompensationExpense",
            "Stock-based compensation expense",
            "Share-based compensation",
            "Equity compensation",
        ]),
        ("deferred_tax_assets", &[
            "us-gaap_DeferredTaxAssetsGross",
            "us-gaap_DeferredTaxAssetsNet",
            "Deferred tax assets",
            "DTA",
        ]),
        ("deferred_tax_liabilities", &[
            "us-gaap_DeferredTaxLiabilities",
            "us-gaap_DeferredTaxLiabilitiesNet",
            "DTL",
        ]),
        ("dividends", &[
            "us-gaap_Dividends",
            "us-gaap_CommonStockDividendsPerShareDeclared",
            "Dividends",
            "Dividends declared",
            "PaymentsOfDividends",
        ]),
        ("share_repurchase", &[
            "us-gaap_PaymentsForRepurchaseOfCommonStock",
            "us-gaap_StockRepurchasedAndRetiredDuringPeriodShares",
            "Repurchases of common stock",
            "Stock repurchased and retired",
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = ConceptCatalog::builtin();
        assert!(catalog.len() >= 50);
        for key in [
            "revenue",
            "cost_of_revenue",
            "net_income",
            "total_assets",
            "capital_expenditures",
            "interest_expense",
            "depreciation_amortization",
            "intangible_purchases",
            "acquisitions",
        ] {
            assert!(catalog.contains(key), "missing concept key: {}", key);
            assert!(!catalog.synonyms(key).is_empty());
        }
    }

    #[test]
    fn test_synonym_order_is_preserved() {
        let catalog = ConceptCatalog::builtin();
        let revenue = catalog.synonyms("revenue");
        assert_eq!(
            revenue[0],
            "us-gaap:RevenueFromContractWithCustomerExcludingAssessedTax"
        );
        assert!(revenue.contains(&"Net sales".to_string()));
    }

    #[test]
    fn test_unknown_key_yields_empty_slice() {
        let catalog = ConceptCatalog::builtin();
        assert!(catalog.synonyms("not_a_real_concept").is_empty());
    }

    #[test]
    fn test_catalog_file_round_trip_and_validation() {
        let json = r#"{
            "version": "2024-02",
            "concepts": [
                {"key": "revenue", "synonyms": ["Total revenue", "Net sales"]},
                {"key": "net_income", "synonyms": ["Net income"]}
            ]
        }"#;
        let catalog = ConceptCatalog::from_reader(json.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.synonyms("revenue")[0], "Total revenue");
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let json = r#"{
            "version": "2024-02",
            "concepts": [
                {"key": "revenue", "synonyms": ["Total revenue"]},
                {"key": "revenue", "synonyms": ["Net sales"]}
            ]
        }"#;
        let err = ConceptCatalog::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, AnalyticsError::DuplicateConceptKey(_)));
    }

    #[test]
    fn test_empty_synonyms_rejected() {
        let json = r#"{
            "version": "2024-02",
            "concepts": [{"key": "revenue", "synonyms": []}]
        }"#;
        assert!(ConceptCatalog::from_reader(json.as_bytes()).is_err());
    }

    #[test]
    fn test_schema_generation() {
        let schema = CatalogFile::schema_as_json().unwrap();
        assert!(schema.contains("version"));
        assert!(schema.contains("synonyms"));
    }
}
