/// Projection parameters
/// Immutable inputs for the emissions-and-sequestration projection, validated once at startup

use crate::constants::*;
use crate::error::{ProjectionError, ProjectionResult};
use serde::{Deserialize, Serialize};

/// How the engine treats a year in which sequestration exceeds emissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeNetPolicy {
    /// Concentration may fall, but never below 0 ppm
    #[default]
    AllowDrawdown,
    /// Net increase is clamped at zero; concentration never falls
    Clamp,
}

/// Natural sinks that make up the initial sequestration, in Gt CO2 per year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkBreakdown {
    pub forests_gt: f64,
    /// Oceans, soil and other non-forest sinks
    pub other_gt: f64,
}

impl Default for SinkBreakdown {
    fn default() -> Self {
        Self {
            forests_gt: FOREST_SEQUESTRATION_GT,
            other_gt: OTHER_NATURAL_SINKS_GT,
        }
    }
}

impl SinkBreakdown {
    pub fn total_gt(&self) -> f64 {
        self.forests_gt + self.other_gt
    }
}

/// Inputs for a single projection run.
///
/// Growth of emissions follows `floor + (g0 - floor) * exp(-decay * year)`,
/// applied multiplicatively to the previous year's emissions. Sequestration
/// loses `sequestration_decay` of its capacity every year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    pub initial_concentration_ppm: f64,
    pub toxicity_threshold_ppm: f64,
    pub initial_emissions_gt: f64,
    pub sinks: SinkBreakdown,
    pub emissions_growth_rate: f64,
    pub emissions_growth_decay: f64,
    pub emissions_growth_floor: f64,
    pub sequestration_decay: f64,
    pub ppm_per_gigaton: f64,
    pub max_years: u32,
    pub negative_net_policy: NegativeNetPolicy,
    pub baseline_year: i32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            initial_concentration_ppm: CURRENT_CO2_PPM,
            toxicity_threshold_ppm: TOXIC_BREATHING_CO2_PPM,
            initial_emissions_gt: CURRENT_ANNUAL_EMISSIONS_GT,
            sinks: SinkBreakdown::default(),
            emissions_growth_rate: EMISSIONS_GROWTH_RATE,
            emissions_growth_decay: EMISSIONS_GROWTH_DECAY,
            emissions_growth_floor: EMISSIONS_GROWTH_FLOOR,
            sequestration_decay: SEQUESTRATION_DECAY,
            ppm_per_gigaton: GT_CO2_TO_PPM,
            max_years: DEFAULT_MAX_YEARS,
            negative_net_policy: NegativeNetPolicy::default(),
            baseline_year: BASELINE_YEAR,
        }
    }
}

impl ProjectionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the parameters, returning them only if they pass `validate`
    pub fn validated(self) -> ProjectionResult<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Load a parameter set from JSON; missing fields fall back to the defaults
    pub fn from_json(json: &str) -> ProjectionResult<Self> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| ProjectionError::Config(e.to_string()))?;
        params.validated()
    }

    pub fn with_concentrations(mut self, initial_ppm: f64, threshold_ppm: f64) -> Self {
        self.initial_concentration_ppm = initial_ppm;
        self.toxicity_threshold_ppm = threshold_ppm;
        self
    }

    pub fn with_flows(mut self, emissions_gt: f64, sequestration_gt: f64) -> Self {
        self.initial_emissions_gt = emissions_gt;
        // A single aggregate figure carries no forest/other split
        self.sinks = SinkBreakdown {
            forests_gt: 0.0,
            other_gt: sequestration_gt,
        };
        self
    }

    pub fn with_sinks(mut self, sinks: SinkBreakdown) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn with_emissions_growth(mut self, rate: f64, decay: f64, floor: f64) -> Self {
        self.emissions_growth_rate = rate;
        self.emissions_growth_decay = decay;
        self.emissions_growth_floor = floor;
        self
    }

    pub fn with_sequestration_decay(mut self, decay: f64) -> Self {
        self.sequestration_decay = decay;
        self
    }

    pub fn with_ppm_per_gigaton(mut self, ppm_per_gigaton: f64) -> Self {
        self.ppm_per_gigaton = ppm_per_gigaton;
        self
    }

    pub fn with_max_years(mut self, max_years: u32) -> Self {
        self.max_years = max_years;
        self
    }

    pub fn with_negative_net_policy(mut self, policy: NegativeNetPolicy) -> Self {
        self.negative_net_policy = policy;
        self
    }

    pub fn with_baseline_year(mut self, year: i32) -> Self {
        self.baseline_year = year;
        self
    }

    pub fn initial_sequestration_gt(&self) -> f64 {
        self.sinks.total_gt()
    }

    pub fn initial_net_gt(&self) -> f64 {
        self.initial_emissions_gt - self.initial_sequestration_gt()
    }

    /// Calendar year `offset` years after the baseline, if it fits in an `i32`
    pub fn calendar_year(&self, offset: u32) -> Option<i32> {
        i32::try_from(self.baseline_year as i64 + offset as i64).ok()
    }

    /// Emissions growth rate applied in `year` (fraction per year)
    pub fn growth_rate_at(&self, year: u32) -> f64 {
        let floor = self.emissions_growth_floor;
        floor + (self.emissions_growth_rate - floor) * (-self.emissions_growth_decay * year as f64).exp()
    }

    /// Sequestration capacity remaining in `year`
    pub fn sequestration_at(&self, year: u32) -> f64 {
        self.initial_sequestration_gt() * (1.0 - self.sequestration_decay).powi(year as i32)
    }

    /// Check every value before a simulation begins
    pub fn validate(&self) -> ProjectionResult<()> {
        positive("initial_concentration_ppm", self.initial_concentration_ppm)?;
        positive("toxicity_threshold_ppm", self.toxicity_threshold_ppm)?;
        positive("initial_emissions_gt", self.initial_emissions_gt)?;
        non_negative("sinks.forests_gt", self.sinks.forests_gt)?;
        non_negative("sinks.other_gt", self.sinks.other_gt)?;
        finite("emissions_growth_rate", self.emissions_growth_rate)?;
        non_negative("emissions_growth_decay", self.emissions_growth_decay)?;
        finite("emissions_growth_floor", self.emissions_growth_floor)?;
        non_negative("sequestration_decay", self.sequestration_decay)?;
        if self.sequestration_decay >= 1.0 {
            return Err(invalid(
                "sequestration_decay",
                self.sequestration_decay,
                "must be below 1 (a full loss of capacity per year)",
            ));
        }
        if self.emissions_growth_rate <= -1.0 || self.emissions_growth_floor <= -1.0 {
            return Err(invalid(
                "emissions_growth_rate",
                self.emissions_growth_rate.min(self.emissions_growth_floor),
                "growth rates must stay above -1",
            ));
        }
        positive("ppm_per_gigaton", self.ppm_per_gigaton)?;
        if self.max_years == 0 {
            return Err(invalid("max_years", 0.0, "must simulate at least one year"));
        }
        // Room for every simulated year plus the longest chart tail
        let last_offset = self.max_years as i64 + MAX_CHART_YEARS_AFTER_CROSSING as i64;
        if self.baseline_year as i64 + last_offset > i32::MAX as i64 {
            return Err(invalid(
                "baseline_year",
                self.baseline_year as f64,
                "calendar years of the run would overflow",
            ));
        }

        if self.initial_net_gt() <= 0.0 {
            log::warn!(
                "sequestration ({:.2} Gt) meets or exceeds emissions ({:.2} Gt); policy {:?} applies",
                self.initial_sequestration_gt(),
                self.initial_emissions_gt,
                self.negative_net_policy
            );
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: f64, reason: &'static str) -> ProjectionError {
    ProjectionError::InvalidParameter { name, value, reason }
}

fn finite(name: &'static str, value: f64) -> ProjectionResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, value, "must be a finite number"))
    }
}

fn non_negative(name: &'static str, value: f64) -> ProjectionResult<()> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(invalid(name, value, "must not be negative"));
    }
    Ok(())
}

fn positive(name: &'static str, value: f64) -> ProjectionResult<()> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(invalid(name, value, "must be greater than zero"));
    }
    Ok(())
}
