use crate::capex::CapexEstimator;
use crate::frame::TabularFrame;
use crate::metrics::AlertThresholds;
use crate::period::{parse_period_label, period_sort_key, sort_periods};
use crate::resolver::ConceptResolver;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse period-label-keyed series. Periods missing in the source frame are
/// omitted, never zero-filled. Chronological order comes from parsing the
/// labels, not from the map's key order.
pub type TrendSeries = BTreeMap<String, f64>;

/// Series keys sorted chronologically (parse date, then label).
fn chronological_keys(series: &TrendSeries) -> Vec<&String> {
    let mut keys: Vec<&String> = series.keys().collect();
    keys.sort_by_key(|k| period_sort_key(k));
    keys
}

/// Period-over-period percentage growth for chronologically adjacent points.
/// A point following a zero previous value is omitted. Fewer than two points
/// yields an empty series.
pub fn growth_series(series: &TrendSeries) -> TrendSeries {
    let mut growth = TrendSeries::new();
    if series.len() < 2 {
        return growth;
    }
    let mut prev: Option<f64> = None;
    for key in chronological_keys(series) {
        let curr = series[key];
        if let Some(prev_val) = prev {
            if prev_val != 0.0 {
                growth.insert(key.clone(), ((curr - prev_val) / prev_val.abs()) * 100.0);
            }
        }
        prev = Some(curr);
    }
    growth
}

/// Compound annual growth rate between the earliest and latest points, in
/// percent. 0.0 for fewer than two points or a non-positive endpoint; a
/// fractional root of a negative ratio has no real value.
pub fn cagr(series: &TrendSeries) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let keys = chronological_keys(series);
    let first_key = keys[0];
    let last_key = keys[keys.len() - 1];
    let first = series[first_key];
    let last = series[last_key];
    if first <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = (parse_period_label(last_key).year() - parse_period_label(first_key).year()).max(1);
    ((last / first).powf(1.0 / years as f64) - 1.0) * 100.0
}

/// Revenue and net-income series for one filing cadence, with growth maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiPeriodSummary {
    pub annual_revenue: TrendSeries,
    pub annual_net_income: TrendSeries,
    pub quarterly_revenue: TrendSeries,
    pub quarterly_net_income: TrendSeries,
    pub yoy_revenue_growth: TrendSeries,
    pub yoy_net_income_growth: TrendSeries,
    pub qoq_revenue_growth: TrendSeries,
    pub qoq_net_income_growth: TrendSeries,
    pub cagr_revenue: f64,
}

/// Multi-period analysis over frames whose columns are fiscal periods:
/// per-concept time series, growth and CAGR, and quarterly red flags
/// (spikes, sustained negative free cash flow).
#[derive(Debug, Clone)]
pub struct TrendAnalyzer<'a> {
    resolver: ConceptResolver<'a>,
    thresholds: AlertThresholds,
}

impl<'a> TrendAnalyzer<'a> {
    pub fn new(resolver: ConceptResolver<'a>) -> Self {
        Self::with_thresholds(resolver, AlertThresholds::default())
    }

    pub fn with_thresholds(resolver: ConceptResolver<'a>, thresholds: AlertThresholds) -> Self {
        Self {
            resolver,
            thresholds,
        }
    }

    /// Best-matching row for a concept, read across all period columns in
    /// chronological order. Missing cells are skipped.
    pub fn extract_series(&self, frame: &TabularFrame, concept_key: &str) -> TrendSeries {
        let mut series = TrendSeries::new();
        if frame.is_empty() {
            log::debug!("extract_series({}): empty frame", concept_key);
            return series;
        }

        let mut sorted_cols = frame.columns().to_vec();
        sort_periods(&mut sorted_cols);

        let Some(matched) = self.resolver.best_row(frame, concept_key, &sorted_cols) else {
            log::debug!("extract_series({}): no matching row", concept_key);
            return series;
        };

        for col in &sorted_cols {
            if let Some(value) = frame.value_at(matched.row_index, col) {
                series.insert(col.clone(), value);
            }
        }
        series
    }

    /// Annual and quarterly income statements -> growth summary.
    pub fn analyze_income_frames(
        &self,
        annual_income: &TabularFrame,
        quarterly_income: &TabularFrame,
    ) -> MultiPeriodSummary {
        let annual_revenue = self.extract_series(annual_income, "revenue");
        let annual_net_income = self.extract_series(annual_income, "net_income");
        let quarterly_revenue = self.extract_series(quarterly_income, "revenue");
        let quarterly_net_income = self.extract_series(quarterly_income, "net_income");

        MultiPeriodSummary {
            yoy_revenue_growth: growth_series(&annual_revenue),
            yoy_net_income_growth: growth_series(&annual_net_income),
            qoq_revenue_growth: growth_series(&quarterly_revenue),
            qoq_net_income_growth: growth_series(&quarterly_net_income),
            cagr_revenue: cagr(&annual_revenue),
            annual_revenue,
            annual_net_income,
            quarterly_revenue,
            quarterly_net_income,
        }
    }

    /// Quarterly red flags from multi-quarter balance-sheet and cash-flow
    /// frames: a sustained negative-FCF streak, then inventory and
    /// receivables spikes, in that order.
    pub fn quarterly_alerts(
        &self,
        quarterly_balance: &TabularFrame,
        quarterly_cashflow: &TabularFrame,
    ) -> Vec<String> {
        let fcf = self.free_cash_flow_series(quarterly_cashflow);
        let inventory = self.extract_series(quarterly_balance, "inventory");
        let receivables = self.extract_series(quarterly_balance, "accounts_receivable");

        let mut alerts =
            negative_streak_alert(&fcf, self.thresholds.sustained_neg_fcf_quarters);
        alerts.extend(spike_alerts(
            &inventory,
            self.thresholds.inventory_spike_threshold,
            "Inventory",
        ));
        alerts.extend(spike_alerts(
            &receivables,
            self.thresholds.receivable_spike_threshold,
            "Receivables",
        ));
        alerts
    }

    /// Per-period free cash flow: operating cash flow minus the capex
    /// estimate for that column.
    pub fn free_cash_flow_series(&self, quarterly_cashflow: &TabularFrame) -> TrendSeries {
        let mut fcf = TrendSeries::new();
        if quarterly_cashflow.is_empty() {
            return fcf;
        }

        let operating = self.extract_series(quarterly_cashflow, "cash_flow_operating");
        let estimator = CapexEstimator::new(self.resolver);

        let mut sorted_cols = quarterly_cashflow.columns().to_vec();
        sort_periods(&mut sorted_cols);
        for col in &sorted_cols {
            let op_cf = operating.get(col).copied().unwrap_or(0.0);
            let capex = estimator.estimate_for_column(quarterly_cashflow, col);
            fcf.insert(col.clone(), op_cf - capex);
        }
        fcf
    }
}

/// One alert per adjacent pair whose growth exceeds the threshold.
pub fn spike_alerts(series: &TrendSeries, threshold_pct: f64, label: &str) -> Vec<String> {
    let mut alerts = Vec::new();
    if series.len() < 2 {
        return alerts;
    }
    let mut prev: Option<f64> = None;
    for key in chronological_keys(series) {
        let curr = series[key];
        if let Some(prev_val) = prev {
            if prev_val != 0.0 {
                let growth_pct = ((curr - prev_val) / prev_val.abs()) * 100.0;
                if growth_pct > threshold_pct {
                    alerts.push(format!(
                        "{} spiked +{:.2}% from previous quarter to {}.",
                        label, growth_pct, key
                    ));
                }
            }
        }
        prev = Some(curr);
    }
    alerts
}

/// Scan chronologically counting consecutive negative values; once the count
/// reaches `min_quarters`, emit one alert and stop. At most one alert per
/// call.
pub fn negative_streak_alert(fcf_series: &TrendSeries, min_quarters: usize) -> Vec<String> {
    let mut alerts = Vec::new();
    if fcf_series.len() < 2 || min_quarters == 0 {
        return alerts;
    }
    let mut consecutive = 0usize;
    for key in chronological_keys(fcf_series) {
        if fcf_series[key] < 0.0 {
            consecutive += 1;
        } else {
            consecutive = 0;
        }
        if consecutive >= min_quarters {
            alerts.push(format!(
                "{} consecutive quarters of negative FCF (through {}).",
                consecutive, key
            ));
            break;
        }
    }
    alerts
}
