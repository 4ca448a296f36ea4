use crate::period::period_sort_key;
use crate::trends::TrendSeries;
use thiserror::Error;

/// Below this many data points no forecast is attempted.
pub const MIN_DATA_POINTS: usize = 4;

/// Non-seasonal (p, d, q) order plus an optional seasonal component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOrder {
    pub order: (usize, usize, usize),
    pub seasonal: Option<SeasonalOrder>,
}

impl CandidateOrder {
    pub fn nonseasonal(p: usize, d: usize, q: usize) -> Self {
        Self {
            order: (p, d, q),
            seasonal: None,
        }
    }

    pub fn seasonal(p: usize, d: usize, q: usize, seasonal: SeasonalOrder) -> Self {
        Self {
            order: (p, d, q),
            seasonal: Some(seasonal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonalOrder {
    pub order: (usize, usize, usize),
    pub period: usize,
}

/// Outcome of fitting one candidate: a lower-is-better fit-quality score
/// (an information criterion) and the one-step-ahead point forecast.
#[derive(Debug, Clone)]
pub struct FittedCandidate {
    pub aic: f64,
    pub one_step_forecast: f64,
}

#[derive(Error, Debug)]
#[error("model fit failed: {0}")]
pub struct FitError(pub String);

/// External statistical model-fitting capability. The crate never implements
/// the numerical machinery itself; it only ranks what a fitter returns.
pub trait ModelFitter {
    fn fit(
        &self,
        values: &[f64],
        candidate: &CandidateOrder,
    ) -> std::result::Result<FittedCandidate, FitError>;
}

/// One-step-ahead forecast over a period-keyed series. Implementations are
/// stateless between calls and always return a value >= 0.
pub trait ForecastStrategy {
    fn forecast(&self, series: &TrendSeries, is_quarterly: bool) -> f64;
}

/// Default strategy: fit a small set of candidate orders independently and
/// take the one-step forecast of the lowest-AIC fit. Any failure degrades to
/// 0.0 so a batch run never aborts on one bad series.
pub struct DefaultForecastStrategy {
    fitter: Option<Box<dyn ModelFitter>>,
}

impl DefaultForecastStrategy {
    pub fn new(fitter: Box<dyn ModelFitter>) -> Self {
        Self {
            fitter: Some(fitter),
        }
    }

    /// No fitting capability available; every forecast is 0.0.
    pub fn unavailable() -> Self {
        Self { fitter: None }
    }

    fn candidates(n_points: usize, is_quarterly: bool) -> Vec<CandidateOrder> {
        if n_points < 6 {
            vec![
                CandidateOrder::nonseasonal(0, 1, 1),
                CandidateOrder::nonseasonal(1, 1, 0),
            ]
        } else {
            let mut candidates = vec![
                CandidateOrder::nonseasonal(1, 1, 1),
                CandidateOrder::nonseasonal(1, 1, 0),
                CandidateOrder::nonseasonal(0, 1, 1),
            ];
            if is_quarterly {
                candidates.push(CandidateOrder::seasonal(
                    1,
                    1,
                    1,
                    SeasonalOrder {
                        order: (1, 1, 1),
                        period: 4,
                    },
                ));
            }
            candidates
        }
    }
}

impl ForecastStrategy for DefaultForecastStrategy {
    fn forecast(&self, series: &TrendSeries, is_quarterly: bool) -> f64 {
        let Some(fitter) = self.fitter.as_deref() else {
            log::warn!("No model fitter available => forecast=0.0");
            return 0.0;
        };
        if series.len() < MIN_DATA_POINTS {
            log::warn!(
                "Insufficient data ({} points, need {}) => forecast=0.0",
                series.len(),
                MIN_DATA_POINTS
            );
            return 0.0;
        }

        let mut keys: Vec<&String> = series.keys().collect();
        keys.sort_by_key(|k| period_sort_key(k));
        let values: Vec<f64> = keys.iter().map(|k| series[*k]).collect();

        let mut best: Option<FittedCandidate> = None;
        for candidate in Self::candidates(values.len(), is_quarterly) {
            match fitter.fit(&values, &candidate) {
                Ok(fit) => {
                    if best.as_ref().is_none_or(|b| fit.aic < b.aic) {
                        best = Some(fit);
                    }
                }
                Err(err) => {
                    log::warn!("Candidate {:?} fit error: {}", candidate.order, err);
                }
            }
        }

        let Some(winner) = best else {
            log::warn!("No suitable model found => forecast=0.0");
            return 0.0;
        };

        let forecast = winner.one_step_forecast.max(0.0);
        log::debug!("Forecast={:.2} (aic={:.2})", forecast, winner.aic);
        forecast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted fitter: answers per candidate, so tests can steer selection.
    struct ScriptedFitter {
        responses: Vec<(CandidateOrder, std::result::Result<FittedCandidate, String>)>,
        fallback_aic: f64,
        fallback_forecast: f64,
    }

    impl ScriptedFitter {
        fn uniform(aic: f64, forecast: f64) -> Self {
            Self {
                responses: Vec::new(),
                fallback_aic: aic,
                fallback_forecast: forecast,
            }
        }

        fn with_response(
            mut self,
            candidate: CandidateOrder,
            response: std::result::Result<FittedCandidate, String>,
        ) -> Self {
            self.responses.push((candidate, response));
            self
        }
    }

    impl ModelFitter for ScriptedFitter {
        fn fit(
            &self,
            _values: &[f64],
            candidate: &CandidateOrder,
        ) -> std::result::Result<FittedCandidate, FitError> {
            for (scripted, response) in &self.responses {
                if scripted == candidate {
                    return response
                        .clone()
                        .map_err(|msg| FitError(msg));
                }
            }
            Ok(FittedCandidate {
                aic: self.fallback_aic,
                one_step_forecast: self.fallback_forecast,
            })
        }
    }

    fn series(values: &[(&str, f64)]) -> TrendSeries {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn annual_series(n: usize) -> TrendSeries {
        (0..n)
            .map(|i| (format!("FY{}", 2015 + i), 100.0 + 10.0 * i as f64))
            .collect()
    }

    #[test]
    fn test_too_few_points_yields_zero() {
        let strategy =
            DefaultForecastStrategy::new(Box::new(ScriptedFitter::uniform(1.0, 500.0)));
        assert_eq!(strategy.forecast(&annual_series(3), false), 0.0);
    }

    #[test]
    fn test_unavailable_fitter_yields_zero() {
        let strategy = DefaultForecastStrategy::unavailable();
        assert_eq!(strategy.forecast(&annual_series(8), false), 0.0);
    }

    #[test]
    fn test_negative_forecast_clamped() {
        let strategy =
            DefaultForecastStrategy::new(Box::new(ScriptedFitter::uniform(1.0, -250.0)));
        assert_eq!(strategy.forecast(&annual_series(5), false), 0.0);
    }

    #[test]
    fn test_lowest_aic_wins() {
        let fitter = ScriptedFitter::uniform(100.0, 111.0).with_response(
            CandidateOrder::nonseasonal(1, 1, 0),
            Ok(FittedCandidate {
                aic: 10.0,
                one_step_forecast: 222.0,
            }),
        );
        let strategy = DefaultForecastStrategy::new(Box::new(fitter));
        assert_eq!(strategy.forecast(&annual_series(8), false), 222.0);
    }

    #[test]
    fn test_seasonal_candidate_only_for_quarterly() {
        let seasonal = CandidateOrder::seasonal(
            1,
            1,
            1,
            SeasonalOrder {
                order: (1, 1, 1),
                period: 4,
            },
        );
        let fitter = ScriptedFitter::uniform(100.0, 111.0).with_response(
            seasonal.clone(),
            Ok(FittedCandidate {
                aic: 1.0,
                one_step_forecast: 333.0,
            }),
        );
        let quarterly = series(&[
            ("2022-Q1", 100.0),
            ("2022-Q2", 110.0),
            ("2022-Q3", 105.0),
            ("2022-Q4", 140.0),
            ("2023-Q1", 120.0),
            ("2023-Q2", 130.0),
        ]);

        // Quarterly: the seasonal candidate has the best score and wins.
        let strategy = DefaultForecastStrategy::new(Box::new(
            ScriptedFitter::uniform(100.0, 111.0).with_response(
                seasonal,
                Ok(FittedCandidate {
                    aic: 1.0,
                    one_step_forecast: 333.0,
                }),
            ),
        ));
        assert_eq!(strategy.forecast(&quarterly, true), 333.0);

        // Annual cadence: the seasonal candidate is never tried.
        let strategy = DefaultForecastStrategy::new(Box::new(fitter));
        assert_eq!(strategy.forecast(&quarterly, false), 111.0);
    }

    #[test]
    fn test_failed_candidates_are_skipped() {
        let fitter = ScriptedFitter::uniform(50.0, 444.0)
            .with_response(
                CandidateOrder::nonseasonal(1, 1, 1),
                Err("did not converge".to_string()),
            )
            .with_response(
                CandidateOrder::nonseasonal(1, 1, 0),
                Err("singular matrix".to_string()),
            );
        let strategy = DefaultForecastStrategy::new(Box::new(fitter));
        // Only (0,1,1) fits; its forecast is used.
        assert_eq!(strategy.forecast(&annual_series(8), false), 444.0);
    }

    #[test]
    fn test_all_candidates_failing_yields_zero() {
        struct FailingFitter;
        impl ModelFitter for FailingFitter {
            fn fit(
                &self,
                _values: &[f64],
                _candidate: &CandidateOrder,
            ) -> std::result::Result<FittedCandidate, FitError> {
                Err(FitError("no fit".to_string()))
            }
        }
        let strategy = DefaultForecastStrategy::new(Box::new(FailingFitter));
        assert_eq!(strategy.forecast(&annual_series(8), false), 0.0);
    }

    #[test]
    fn test_candidate_sets_by_length() {
        let short = DefaultForecastStrategy::candidates(5, true);
        assert_eq!(
            short,
            vec![
                CandidateOrder::nonseasonal(0, 1, 1),
                CandidateOrder::nonseasonal(1, 1, 0),
            ]
        );

        let long_annual = DefaultForecastStrategy::candidates(8, false);
        assert_eq!(long_annual.len(), 3);
        assert!(long_annual.iter().all(|c| c.seasonal.is_none()));

        let long_quarterly = DefaultForecastStrategy::candidates(8, true);
        assert_eq!(long_quarterly.len(), 4);
        assert_eq!(
            long_quarterly[3].seasonal,
            Some(SeasonalOrder {
                order: (1, 1, 1),
                period: 4,
            })
        );
    }
}
