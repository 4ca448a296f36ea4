//! # Filing Analytics
//!
//! A library for turning messy financial-statement tables (as extracted from
//! regulatory filings) into named metrics, trend series, and alerts.
//!
//! ## Core Concepts
//!
//! - **TabularFrame**: A labelled table of one statement — row labels as
//!   reported, period columns, sparse numeric cells
//! - **Concept Catalog**: Canonical concept keys (e.g. `revenue`) mapped to
//!   ordered synonym lists that cover filer-specific label wording
//! - **Resolution**: Exact-then-partial label matching that picks the single
//!   best row for a concept, preferring rows with the largest magnitudes
//! - **Metrics**: Margins, leverage, returns, and approximate vs. standard
//!   EBIT/EBITDA computed from resolved values, with threshold-driven alerts
//! - **Trends**: Period-keyed series with YoY/QoQ growth, CAGR, spike and
//!   negative-FCF-streak detection, and pluggable one-step forecasting
//!
//! ## Example
//!
//! ```rust,ignore
//! use filing_analytics::*;
//!
//! let mut income = TabularFrame::new(vec!["FY2022", "FY2023"]);
//! income.push_row("Total revenue", vec![Some(900.0), Some(1000.0)]);
//! income.push_row("Cost of revenue", vec![Some(540.0), Some(600.0)]);
//! income.push_row("Net income", vec![Some(90.0), Some(120.0)]);
//!
//! let resolver = ConceptResolver::new(ConceptCatalog::builtin());
//! let engine = MetricsEngine::new(resolver);
//! let result = engine.compute(&TabularFrame::new::<String>(vec![]), &income, &TabularFrame::new::<String>(vec![]));
//!
//! assert_eq!(result.get("Revenue"), 1000.0);
//! assert_eq!(result.get("Gross Margin %"), 40.0);
//! ```

pub mod capex;
pub mod catalog;
pub mod error;
pub mod forecast;
pub mod frame;
pub mod metrics;
pub mod period;
pub mod resolver;
pub mod trends;

pub use capex::CapexEstimator;
pub use catalog::{CatalogFile, ConceptCatalog, ConceptEntry};
pub use error::{AnalyticsError, Result};
pub use forecast::{
    CandidateOrder, DefaultForecastStrategy, FitError, FittedCandidate, ForecastStrategy,
    ModelFitter, SeasonalOrder, MIN_DATA_POINTS,
};
pub use frame::{normalize_label, FrameInput, FrameRow, TabularFrame};
pub use metrics::{AlertThresholds, MetricsEngine, MetricsResult};
pub use period::{parse_period_label, period_sort_key, sort_periods};
pub use resolver::{
    flip_sign_if_negative_expense, ConceptResolver, ExtractionPolicy, MatchKind, ResolvedValue,
    RowMatch,
};
pub use trends::{
    cagr, growth_series, negative_streak_alert, spike_alerts, MultiPeriodSummary, TrendAnalyzer,
    TrendSeries,
};
