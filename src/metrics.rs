use crate::capex::CapexEstimator;
use crate::frame::TabularFrame;
use crate::resolver::{flip_sign_if_negative_expense, ConceptResolver, ExtractionPolicy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Thresholds behind the red-flag alerts. A data/configuration concern, so
/// the struct deserializes from the same config file as the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AlertThresholds {
    #[schemars(description = "Net margin at or below this percentage raises an alert")]
    pub negative_margin: f64,
    #[schemars(description = "Debt-to-equity ratio above this raises an alert")]
    pub high_leverage: f64,
    #[schemars(description = "Positive ROE below this percentage raises an alert")]
    pub low_roe: f64,
    #[schemars(description = "Positive ROA below this percentage raises an alert")]
    pub low_roa: f64,
    #[schemars(description = "Net Debt/EBITDA above this raises an alert when net debt is positive")]
    pub net_debt_to_ebitda: f64,
    #[schemars(description = "Nonzero interest coverage below this raises an alert")]
    pub low_interest_coverage: f64,
    #[schemars(description = "Consecutive quarters of negative FCF before alerting")]
    pub sustained_neg_fcf_quarters: usize,
    #[schemars(description = "Quarter-over-quarter inventory growth percentage treated as a spike")]
    pub inventory_spike_threshold: f64,
    #[schemars(description = "Quarter-over-quarter receivables growth percentage treated as a spike")]
    pub receivable_spike_threshold: f64,
}

impl AlertThresholds {
    /// Ratio and spike thresholds must be non-negative; a negative value
    /// would fire the corresponding alert on healthy data.
    pub fn validate(&self) -> crate::error::Result<()> {
        let non_negative = [
            ("high_leverage", self.high_leverage),
            ("low_roe", self.low_roe),
            ("low_roa", self.low_roa),
            ("net_debt_to_ebitda", self.net_debt_to_ebitda),
            ("low_interest_coverage", self.low_interest_coverage),
            ("inventory_spike_threshold", self.inventory_spike_threshold),
            ("receivable_spike_threshold", self.receivable_spike_threshold),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(crate::error::AnalyticsError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            negative_margin: 0.0,
            high_leverage: 3.0,
            low_roe: 5.0,
            low_roa: 2.0,
            net_debt_to_ebitda: 3.5,
            low_interest_coverage: 2.0,
            sustained_neg_fcf_quarters: 2,
            inventory_spike_threshold: 30.0,
            receivable_spike_threshold: 30.0,
        }
    }
}

/// Snapshot metrics for one reporting period plus the ordered alert list.
/// Metric names are stable strings consumed by the reporting side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsResult {
    pub values: BTreeMap<String, f64>,
    pub alerts: Vec<String>,
}

impl MetricsResult {
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

/// Derives ratios, margins, EBIT/EBITDA variants, free cash flow, leverage
/// and coverage metrics from one period's balance sheet, income statement,
/// and cash-flow statement. Every derived value is defined for all inputs;
/// zero denominators yield 0.0, never NaN or infinity.
#[derive(Debug, Clone)]
pub struct MetricsEngine<'a> {
    resolver: ConceptResolver<'a>,
    thresholds: AlertThresholds,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(resolver: ConceptResolver<'a>) -> Self {
        Self::with_thresholds(resolver, AlertThresholds::default())
    }

    pub fn with_thresholds(resolver: ConceptResolver<'a>, thresholds: AlertThresholds) -> Self {
        Self {
            resolver,
            thresholds,
        }
    }

    pub fn compute(
        &self,
        balance: &TabularFrame,
        income: &TabularFrame,
        cashflow: &TabularFrame,
    ) -> MetricsResult {
        let mut result = MetricsResult::default();
        let income_cols = income.columns().to_vec();
        let balance_cols = balance.columns().to_vec();
        let cashflow_cols = cashflow.columns().to_vec();
        let policy = ExtractionPolicy::LastNonMissing;

        // ---------- income statement ----------
        let revenue = self
            .resolver
            .resolve_value(income, "revenue", &income_cols, policy, 0.0);
        let mut cost_rev = self
            .resolver
            .resolve_value(income, "cost_of_revenue", &income_cols, policy, 0.0);
        let op_exp = self
            .resolver
            .resolve_value(income, "operating_expenses", &income_cols, policy, 0.0);
        let net_income = self
            .resolver
            .resolve_value(income, "net_income", &income_cols, policy, 0.0);

        cost_rev = flip_sign_if_negative_expense(cost_rev, "cost_of_revenue");
        let op_exp = flip_sign_if_negative_expense(op_exp, "operating_expenses");

        // Unresolved gross profit falls back to revenue - cost of revenue so
        // every downstream figure stays defined.
        let gross_profit = self
            .resolver
            .resolve(income, "gross_profit", &income_cols, policy)
            .map(|r| r.value)
            .unwrap_or(revenue - cost_rev);

        result.set("Revenue", revenue);
        result.set("Gross Profit", gross_profit);
        result.set("Gross Margin %", ratio_pct(gross_profit, revenue));

        let operating_income_approx = gross_profit - op_exp;
        result.set("Operating Margin %", ratio_pct(operating_income_approx, revenue));
        result.set("Operating Expenses", op_exp);
        result.set("Net Income", net_income);
        result.set("Net Margin %", ratio_pct(net_income, revenue));

        // ---------- balance sheet ----------
        let curr_assets = self
            .resolver
            .resolve_value(balance, "current_assets", &balance_cols, policy, 0.0);
        let curr_liabs = self
            .resolver
            .resolve_value(balance, "current_liabilities", &balance_cols, policy, 0.0);
        let total_assets = self
            .resolver
            .resolve_value(balance, "total_assets", &balance_cols, policy, 0.0);
        let total_liabs = self
            .resolver
            .resolve_value(balance, "total_liabilities", &balance_cols, policy, 0.0);
        let total_equity = self
            .resolver
            .resolve_value(balance, "total_equity", &balance_cols, policy, 0.0);

        result.set("Current Ratio", ratio(curr_assets, curr_liabs));
        result.set("Debt-to-Equity", ratio(total_liabs, total_equity));
        result.set("Equity Ratio %", ratio_pct(total_equity, total_assets));

        // ---------- cash flow ----------
        let op_cf = self
            .resolver
            .resolve_value(cashflow, "cash_flow_operating", &cashflow_cols, policy, 0.0);
        let capex = CapexEstimator::new(self.resolver).estimate(cashflow);
        result.set("Cash from Operations", op_cf);
        result.set("CapEx", capex);
        result.set("Free Cash Flow", op_cf - capex);

        // ---------- depreciation / cost-of-sales adjustment ----------
        let mut dep_amort = self.resolver.resolve_value(
            income,
            "depreciation_amortization",
            &income_cols,
            policy,
            0.0,
        );
        dep_amort = flip_sign_if_negative_expense(dep_amort, "depreciation_amortization");

        // Separately disclosed COGS-embedded depreciation would otherwise be
        // counted in both cost of revenue and D&A.
        let dep_in_cogs = self.resolver.resolve_value(
            income,
            "depreciation_in_cost_of_sales",
            &income_cols,
            policy,
            0.0,
        );
        if dep_in_cogs != 0.0 {
            log::debug!(
                "depreciation in cost of sales = {:.2}; adjusting cost of revenue and D&A",
                dep_in_cogs
            );
            cost_rev -= dep_in_cogs;
            dep_amort += dep_in_cogs;
        }

        result.set("CostOfRev", cost_rev);
        result.set("OpEx", op_exp);
        result.set("EBIT (approx)", operating_income_approx);
        let ebitda_approx = operating_income_approx + dep_amort;
        result.set("EBITDA (approx)", ebitda_approx);

        // ---------- returns ----------
        result.set("ROE %", ratio_pct(net_income, total_equity));
        result.set("ROA %", ratio_pct(net_income, total_assets));

        // ---------- IFRS/GAAP expansions ----------
        let intangibles = self
            .resolver
            .resolve_value(balance, "intangible_assets", &balance_cols, policy, 0.0);
        let goodwill = self
            .resolver
            .resolve_value(balance, "goodwill", &balance_cols, policy, 0.0);
        let oper_lease = self.resolver.resolve_value(
            balance,
            "operating_lease_liabilities",
            &balance_cols,
            policy,
            0.0,
        );
        let fin_lease = self.resolver.resolve_value(
            balance,
            "finance_lease_liabilities",
            &balance_cols,
            policy,
            0.0,
        );
        let short_debt = self
            .resolver
            .resolve_value(balance, "short_term_debt", &balance_cols, policy, 0.0);
        let long_debt = self
            .resolver
            .resolve_value(balance, "long_term_debt", &balance_cols, policy, 0.0);
        let cash_equiv = self
            .resolver
            .resolve_value(balance, "cash_equivalents", &balance_cols, policy, 0.0);

        result.set("Intangible Ratio %", ratio_pct(intangibles, total_assets));
        result.set("Goodwill Ratio %", ratio_pct(goodwill, total_assets));
        result.set(
            "Tangible Equity",
            (total_equity - (intangibles + goodwill)).max(0.0),
        );

        let total_leases = oper_lease + fin_lease;
        let gross_debt = short_debt + long_debt + total_leases;
        let net_debt = gross_debt - cash_equiv;
        result.set("Net Debt", net_debt);
        result.set("Net Debt/EBITDA", ratio(net_debt, ebitda_approx));
        result.set("Lease Liabilities Ratio %", ratio_pct(total_leases, total_assets));

        // ---------- standard EBIT / EBITDA, coverage ----------
        let mut interest_exp = self
            .resolver
            .resolve_value(income, "interest_expense", &income_cols, policy, 0.0);
        interest_exp = flip_sign_if_negative_expense(interest_exp, "interest_expense");
        result.set("Interest Expense", interest_exp);

        let mut income_tax = self
            .resolver
            .resolve_value(income, "income_tax_expense", &income_cols, policy, 0.0);
        if income_tax < 0.0 {
            income_tax = income_tax.abs();
        }
        result.set("Income Tax Expense", income_tax);

        let ebit_standard = net_income + interest_exp + income_tax;
        result.set("EBIT (standard)", ebit_standard);
        result.set("EBITDA (standard)", ebit_standard + dep_amort);
        result.set("Interest Coverage", ratio(ebit_standard, interest_exp));

        self.append_alerts(&mut result);
        result
    }

    fn append_alerts(&self, result: &mut MetricsResult) {
        let t = &self.thresholds;

        if result.get("Net Margin %") < t.negative_margin {
            result.alerts.push(format!(
                "Net margin below {:.1}% (negative)",
                t.negative_margin
            ));
        }
        if result.get("Debt-to-Equity") > t.high_leverage {
            result.alerts.push(format!(
                "Debt-to-Equity above {:.1} (high leverage)",
                t.high_leverage
            ));
        }
        let roe = result.get("ROE %");
        if roe > 0.0 && roe < t.low_roe {
            result.alerts.push(format!("ROE < {:.1}%", t.low_roe));
        }
        let roa = result.get("ROA %");
        if roa > 0.0 && roa < t.low_roa {
            result.alerts.push(format!("ROA < {:.1}%", t.low_roa));
        }
        if result.get("Net Debt") > 0.0 && result.get("Net Debt/EBITDA") > t.net_debt_to_ebitda {
            result.alerts.push(format!(
                "Net Debt/EBITDA above {} (heavy leverage).",
                t.net_debt_to_ebitda
            ));
        }
        let coverage = result.get("Interest Coverage");
        if coverage != 0.0 && coverage < t.low_interest_coverage {
            result.alerts.push(format!(
                "Interest coverage below {:.1} => potential default risk.",
                t.low_interest_coverage
            ));
        }
    }
}

/// Total ratio: 0.0 whenever the denominator is zero.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    ratio(numerator, denominator) * 100.0
}
