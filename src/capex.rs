use crate::frame::TabularFrame;
use crate::resolver::{ConceptResolver, ExtractionPolicy};

/// Resolves a capital-expenditure figure from a cash-flow frame via a
/// direct-then-fallback chain. When no explicit capex line exists, the
/// investing outflow net of intangible and acquisition outflows stands in.
/// Results are always >= 0.
#[derive(Debug, Clone, Copy)]
pub struct CapexEstimator<'a> {
    resolver: ConceptResolver<'a>,
}

impl<'a> CapexEstimator<'a> {
    pub fn new(resolver: ConceptResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Capex for a single-period frame (last non-missing context column).
    pub fn estimate(&self, cashflow: &TabularFrame) -> f64 {
        let columns = cashflow.columns().to_vec();
        self.estimate_with_policy(cashflow, &columns, ExtractionPolicy::LastNonMissing)
    }

    /// Capex for one fiscal-period column of a multi-period frame. The same
    /// chain applied to that column in isolation.
    pub fn estimate_for_column(&self, cashflow: &TabularFrame, column: &str) -> f64 {
        let columns = cashflow.columns().to_vec();
        self.estimate_with_policy(cashflow, &columns, ExtractionPolicy::ExactColumn(column))
    }

    fn estimate_with_policy(
        &self,
        cashflow: &TabularFrame,
        columns: &[String],
        policy: ExtractionPolicy<'_>,
    ) -> f64 {
        if let Some(direct) = self
            .resolver
            .resolve(cashflow, "capital_expenditures", columns, policy)
        {
            // Capex is usually reported as a negative cash-flow line.
            return direct.value.abs();
        }

        let investing =
            self.resolver
                .resolve_value(cashflow, "cash_flow_investing", columns, policy, 0.0);
        if investing >= 0.0 {
            // No net investing outflow, nothing to attribute to capex.
            return 0.0;
        }

        let investing_outflow = investing.abs();
        let intangible_outflow = self
            .resolver
            .resolve_value(cashflow, "intangible_purchases", columns, policy, 0.0)
            .abs();
        let acquisitions_outflow = self
            .resolver
            .resolve_value(cashflow, "acquisitions", columns, policy, 0.0)
            .abs();

        let mut estimate = investing_outflow - intangible_outflow - acquisitions_outflow;
        if estimate < 0.0 {
            // Intangible + M&A outflows overshoot the total investing
            // outflow; the breakdown is unreliable, keep the total.
            log::debug!(
                "capex fallback overshoot ({:.2}), reverting to investing outflow {:.2}",
                estimate,
                investing_outflow
            );
            estimate = investing_outflow;
        }

        estimate.max(0.0)
    }
}
