/// Projection engine
/// Steps atmospheric CO2 forward one year at a time until the toxicity threshold
/// is crossed or the year bound runs out.

use crate::error::ProjectionResult;
use crate::projection_params::{NegativeNetPolicy, ProjectionParams};
use serde::{Deserialize, Serialize};

/// State of the atmosphere at the end of one simulated year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    /// Offset from the baseline year; 0 is the baseline itself
    pub year: u32,
    pub concentration_ppm: f64,
    pub emissions_gt: f64,
    pub sequestration_gt: f64,
    /// Change in concentration applied this year (0 at year 0)
    pub net_ppm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThresholdCrossing {
    /// First year index with concentration >= threshold
    Reached { year: u32 },
    /// Threshold still not met after `bound` years
    NotReached { bound: u32 },
}

impl ThresholdCrossing {
    pub fn year(&self) -> Option<u32> {
        match self {
            ThresholdCrossing::Reached { year } => Some(*year),
            ThresholdCrossing::NotReached { .. } => None,
        }
    }

    pub fn is_reached(&self) -> bool {
        matches!(self, ThresholdCrossing::Reached { .. })
    }
}

/// When a run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRule {
    /// At the first year on or above the threshold, or at `max_years`
    AtThreshold,
    /// At the given year offset, whatever the concentration
    ThroughYear(u32),
}

/// Year-by-year stepping engine.
///
/// Yields the baseline record first, then one record per year. Iteration stops
/// after the record that crosses the threshold, or after year `max_years`.
pub struct ProjectionEngine<'a> {
    params: &'a ProjectionParams,
    stop: StopRule,
    current: Option<YearRecord>,
    finished: bool,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(params: &'a ProjectionParams) -> ProjectionResult<Self> {
        Self::with_stop_rule(params, StopRule::AtThreshold)
    }

    /// Engine that keeps stepping past the threshold until `year`
    pub fn through_year(params: &'a ProjectionParams, year: u32) -> ProjectionResult<Self> {
        Self::with_stop_rule(params, StopRule::ThroughYear(year))
    }

    pub fn with_stop_rule(params: &'a ProjectionParams, stop: StopRule) -> ProjectionResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            stop,
            current: None,
            finished: false,
        })
    }

    pub fn params(&self) -> &ProjectionParams {
        self.params
    }

    /// Most recent record produced, if any
    pub fn current(&self) -> Option<&YearRecord> {
        self.current.as_ref()
    }

    fn baseline(&self) -> YearRecord {
        YearRecord {
            year: 0,
            concentration_ppm: self.params.initial_concentration_ppm,
            emissions_gt: self.params.initial_emissions_gt,
            sequestration_gt: self.params.initial_sequestration_gt(),
            net_ppm: 0.0,
        }
    }

    fn advance(&self, prev: &YearRecord) -> YearRecord {
        let year = prev.year + 1;
        let emissions_gt = prev.emissions_gt * (1.0 + self.params.growth_rate_at(year));
        let sequestration_gt = self.params.sequestration_at(year);

        let raw_net_ppm = (emissions_gt - sequestration_gt) * self.params.ppm_per_gigaton;
        let net_ppm = match self.params.negative_net_policy {
            NegativeNetPolicy::Clamp => raw_net_ppm.max(0.0),
            // Concentration cannot go below zero
            NegativeNetPolicy::AllowDrawdown => raw_net_ppm.max(-prev.concentration_ppm),
        };

        YearRecord {
            year,
            concentration_ppm: prev.concentration_ppm + net_ppm,
            emissions_gt,
            sequestration_gt,
            net_ppm,
        }
    }

    /// Produce the next year's record, or `None` once the run has ended
    pub fn step(&mut self) -> Option<YearRecord> {
        if self.finished {
            return None;
        }

        let record = match &self.current {
            None => self.baseline(),
            Some(prev) => self.advance(prev),
        };

        self.finished = match self.stop {
            StopRule::AtThreshold => {
                record.concentration_ppm >= self.params.toxicity_threshold_ppm
                    || record.year >= self.params.max_years
            }
            StopRule::ThroughYear(last) => record.year >= last,
        };
        self.current = Some(record);
        Some(record)
    }

    /// Drive the engine to completion
    pub fn run(self) -> Projection {
        let params = self.params;
        Projection::from_records(self.collect(), params)
    }
}

impl Iterator for ProjectionEngine<'_> {
    type Item = YearRecord;

    fn next(&mut self) -> Option<YearRecord> {
        self.step()
    }
}

/// A finished projection: the full trajectory plus where it crossed the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    records: Vec<YearRecord>,
    crossing: ThresholdCrossing,
}

impl Projection {
    fn from_records(records: Vec<YearRecord>, params: &ProjectionParams) -> Self {
        let crossing = records
            .iter()
            .find(|r| r.concentration_ppm >= params.toxicity_threshold_ppm)
            .map(|r| ThresholdCrossing::Reached { year: r.year })
            .unwrap_or(ThresholdCrossing::NotReached {
                bound: params.max_years,
            });

        match crossing {
            ThresholdCrossing::Reached { year } => log::debug!(
                "projection crossed {:.0} ppm at year {}",
                params.toxicity_threshold_ppm,
                year
            ),
            ThresholdCrossing::NotReached { bound } => log::debug!(
                "projection stayed below {:.0} ppm for {} years",
                params.toxicity_threshold_ppm,
                bound
            ),
        }

        Self { records, crossing }
    }

    pub fn records(&self) -> &[YearRecord] {
        &self.records
    }

    pub fn crossing(&self) -> ThresholdCrossing {
        self.crossing
    }

    pub fn crossing_year(&self) -> Option<u32> {
        self.crossing.year()
    }

    pub fn crossing_record(&self) -> Option<&YearRecord> {
        self.crossing_year()
            .and_then(|year| self.records.get(year as usize))
    }

    pub fn last(&self) -> Option<&YearRecord> {
        self.records.last()
    }

    pub fn peak_concentration_ppm(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.concentration_ppm)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Run a full projection for `params`
pub fn project(params: &ProjectionParams) -> ProjectionResult<Projection> {
    Ok(ProjectionEngine::new(params)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use more_asserts::{assert_ge, assert_le, assert_lt};

    #[test]
    fn test_baseline_record_is_exact() {
        let params = ProjectionParams::default();
        let projection = project(&params).unwrap();
        let first = projection.records()[0];
        assert_eq!(first.year, 0);
        assert_eq!(first.concentration_ppm, 420.0);
        assert_eq!(first.emissions_gt, 36.8);
        assert_eq!(first.net_ppm, 0.0);
    }

    #[test]
    fn test_first_step_matches_formula() {
        let params = ProjectionParams::default();
        let projection = project(&params).unwrap();
        let year_one = projection.records()[1];

        let expected_emissions = 36.8 * (1.0 + 0.01 * (-0.01_f64).exp());
        let expected_sequestration = 17.7 * 0.999;
        assert_abs_diff_eq!(year_one.emissions_gt, expected_emissions, epsilon = 1e-12);
        assert_abs_diff_eq!(year_one.sequestration_gt, expected_sequestration, epsilon = 1e-12);
        assert_abs_diff_eq!(
            year_one.concentration_ppm,
            420.0 + (expected_emissions - expected_sequestration) * 0.1292,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_indices_are_contiguous() {
        let projection = project(&ProjectionParams::default()).unwrap();
        for (i, record) in projection.records().iter().enumerate() {
            assert_eq!(record.year as usize, i);
        }
    }

    #[test]
    fn test_stops_at_crossing_year() {
        let projection = project(&ProjectionParams::default()).unwrap();
        let year = projection.crossing_year().unwrap();
        assert_eq!(projection.last().unwrap().year, year);
        assert_ge!(projection.crossing_record().unwrap().concentration_ppm, 4200.0);
    }

    #[test]
    fn test_threshold_already_met_crosses_at_zero() {
        let params = ProjectionParams::new().with_concentrations(5000.0, 4200.0);
        let projection = project(&params).unwrap();
        assert_eq!(projection.crossing(), ThresholdCrossing::Reached { year: 0 });
        assert_eq!(projection.len(), 1);
    }

    #[test]
    fn test_bound_exhausted_reports_not_reached() {
        let params = ProjectionParams::new().with_max_years(50);
        let projection = project(&params).unwrap();
        assert_eq!(projection.crossing(), ThresholdCrossing::NotReached { bound: 50 });
        assert_eq!(projection.len(), 51);
        assert_lt!(projection.last().unwrap().concentration_ppm, 4200.0);
    }

    #[test]
    fn test_drawdown_lowers_concentration() {
        let params = ProjectionParams::new()
            .with_flows(5.0, 20.0)
            .with_emissions_growth(0.0, 0.0, 0.0)
            .with_sequestration_decay(0.0)
            .with_max_years(10);
        let projection = project(&params).unwrap();
        let records = projection.records();
        assert_lt!(records[10].concentration_ppm, records[0].concentration_ppm);
        assert_abs_diff_eq!(records[1].net_ppm, -15.0 * 0.1292, epsilon = 1e-12);
    }

    #[test]
    fn test_drawdown_never_goes_below_zero() {
        let params = ProjectionParams::new()
            .with_concentrations(1.0, 4200.0)
            .with_flows(1.0, 100.0)
            .with_emissions_growth(0.0, 0.0, 0.0)
            .with_max_years(5);
        let projection = project(&params).unwrap();
        for record in projection.records() {
            assert_ge!(record.concentration_ppm, 0.0);
        }
        assert_eq!(projection.last().unwrap().concentration_ppm, 0.0);
    }

    #[test]
    fn test_clamp_holds_concentration() {
        let params = ProjectionParams::new()
            .with_flows(5.0, 20.0)
            .with_negative_net_policy(NegativeNetPolicy::Clamp)
            .with_max_years(10);
        let projection = project(&params).unwrap();
        for record in projection.records() {
            assert_eq!(record.concentration_ppm, 420.0);
            assert_le!(record.net_ppm, 0.0);
        }
    }

    #[test]
    fn test_engine_iterator_matches_run() {
        let params = ProjectionParams::new().with_max_years(25);
        let stepped: Vec<YearRecord> = ProjectionEngine::new(&params).unwrap().collect();
        let projection = project(&params).unwrap();
        assert_eq!(stepped.as_slice(), projection.records());
    }

    #[test]
    fn test_through_year_continues_past_threshold() {
        let params = ProjectionParams::default();
        let crossing = project(&params).unwrap().crossing_year().unwrap();
        let extended: Vec<YearRecord> = ProjectionEngine::through_year(&params, crossing + 20)
            .unwrap()
            .collect();
        assert_eq!(extended.len() as u32, crossing + 21);
        assert_ge!(extended.last().unwrap().concentration_ppm, 4200.0);
        assert_eq!(
            &extended[..=crossing as usize],
            project(&params).unwrap().records()
        );
    }

    #[test]
    fn test_engine_rejects_invalid_params() {
        let params = ProjectionParams::new().with_ppm_per_gigaton(-0.1);
        assert!(ProjectionEngine::new(&params).is_err());
        assert!(project(&params).is_err());
    }
}
