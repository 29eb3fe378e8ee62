/// Projection report
/// Human-readable summary of a finished projection: current levels, assumptions,
/// the crossing year and the time left until the threshold.

use crate::constants::*;
use crate::projection::{Projection, ThresholdCrossing};
use crate::projection_params::{NegativeNetPolicy, ProjectionParams, SinkBreakdown};
use colored::Colorize;
use serde::Serialize;
use std::fmt;

/// Time until the threshold expressed in calendar units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeLeft {
    pub years: u64,
    pub months: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeLeft {
    pub fn from_years(years: u64) -> Self {
        let days = years * DAYS_PER_YEAR;
        let hours = days * HOURS_PER_DAY;
        let minutes = hours * MINUTES_PER_HOUR;
        Self {
            years,
            months: years * MONTHS_PER_YEAR,
            days,
            hours,
            minutes,
            seconds: minutes * SECONDS_PER_MINUTE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectionReport {
    pub baseline_year: i32,
    pub initial_concentration_ppm: f64,
    pub toxicity_threshold_ppm: f64,
    pub initial_emissions_gt: f64,
    pub sinks: SinkBreakdown,
    pub initial_net_gt: f64,
    /// Concentration change implied by the baseline flows
    pub initial_net_ppm_per_year: f64,
    pub negative_net_policy: NegativeNetPolicy,
    /// Emissions growth at year 0, its decay and floor (fractions per year)
    pub emissions_growth_rate: f64,
    pub emissions_growth_decay: f64,
    pub emissions_growth_floor: f64,
    /// Fraction of sink capacity lost per year
    pub sequestration_decay: f64,
    pub crossing: ThresholdCrossing,
    pub crossing_calendar_year: Option<i32>,
    pub time_left: Option<TimeLeft>,
    pub crossing_concentration_ppm: Option<f64>,
    pub peak_concentration_ppm: f64,
    /// Crossing (or final) concentration as a multiple of pre-industrial levels
    pub preindustrial_multiple: f64,
}

impl ProjectionReport {
    pub fn from_projection(params: &ProjectionParams, projection: &Projection) -> Self {
        let crossing = projection.crossing();
        let crossing_concentration_ppm = projection.crossing_record().map(|r| r.concentration_ppm);
        let end_concentration = crossing_concentration_ppm
            .or_else(|| projection.last().map(|r| r.concentration_ppm))
            .unwrap_or(params.initial_concentration_ppm);

        Self {
            baseline_year: params.baseline_year,
            initial_concentration_ppm: params.initial_concentration_ppm,
            toxicity_threshold_ppm: params.toxicity_threshold_ppm,
            initial_emissions_gt: params.initial_emissions_gt,
            sinks: params.sinks,
            initial_net_gt: params.initial_net_gt(),
            initial_net_ppm_per_year: params.initial_net_gt() * params.ppm_per_gigaton,
            negative_net_policy: params.negative_net_policy,
            emissions_growth_rate: params.emissions_growth_rate,
            emissions_growth_decay: params.emissions_growth_decay,
            emissions_growth_floor: params.emissions_growth_floor,
            sequestration_decay: params.sequestration_decay,
            crossing,
            crossing_calendar_year: crossing.year().and_then(|y| params.calendar_year(y)),
            time_left: crossing.year().map(|y| TimeLeft::from_years(y as u64)),
            crossing_concentration_ppm,
            peak_concentration_ppm: projection.peak_concentration_ppm(),
            preindustrial_multiple: end_concentration / PREINDUSTRIAL_CO2_PPM,
        }
    }

    pub fn years_until_threshold(&self) -> Option<u32> {
        self.crossing.year()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ProjectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", "---- EARTH'S ATMOSPHERE & CO2 ESTIMATION ----".bold())?;
        writeln!(f, "Current CO2 level: {:.0} ppm", self.initial_concentration_ppm)?;
        writeln!(f, "Toxic breathing CO2 level: {:.0} ppm", self.toxicity_threshold_ppm)?;
        writeln!(f, "Observed annual CO2 increase: {CURRENT_ANNUAL_CO2_INCREASE_PPM} ppm/year")?;
        writeln!(f, "Current annual emissions: {:.2} gigatons/year", self.initial_emissions_gt)?;
        writeln!(f, "Tree sequestration: {:.2} gigatons/year", self.sinks.forests_gt)?;
        writeln!(f, "Other natural sinks: {:.2} gigatons/year", self.sinks.other_gt)?;
        writeln!(f, "Total natural sequestration: {:.2} gigatons/year", self.sinks.total_gt())?;
        writeln!(
            f,
            "Net annual increase: {:.2} gigatons/year ({:.2} ppm/year, 1 ppm ≈ {PPM_TO_GT_CO2} Gt)",
            self.initial_net_gt, self.initial_net_ppm_per_year
        )?;
        self.write_assumptions(f)?;

        writeln!(f)?;
        writeln!(f, "Baseline Year: {}", self.baseline_year)?;

        let (Some(year), Some(calendar_year), Some(time_left)) =
            (self.years_until_threshold(), self.crossing_calendar_year, self.time_left)
        else {
            let bound = match self.crossing {
                ThresholdCrossing::NotReached { bound } => bound,
                ThresholdCrossing::Reached { year } => year,
            };
            writeln!(
                f,
                "{}",
                format!(
                    "CO2 does not reach toxic levels within {bound} years in this model (peak {:.0} ppm)",
                    self.peak_concentration_ppm
                )
                .yellow()
            )?;
            return write_caveat(f);
        };

        writeln!(
            f,
            "Estimated Year When Atmosphere Becomes Toxic for Breathing: {}",
            calendar_year.to_string().red().bold()
        )?;
        if let Some(ppm) = self.crossing_concentration_ppm {
            writeln!(
                f,
                "Concentration at crossing: {:.0} ppm ({:.1}x pre-industrial)",
                ppm, self.preindustrial_multiple
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Time Left Until Earth's Atmosphere Becomes Toxic for Human Breathing:")?;
        writeln!(f, "Years: {}", group_thousands(year as u64))?;
        writeln!(f, "Months: {}", group_thousands(time_left.months))?;
        writeln!(f, "Days: {}", group_thousands(time_left.days))?;
        writeln!(f, "Hours: {}", group_thousands(time_left.hours))?;
        writeln!(f, "Minutes: {}", group_thousands(time_left.minutes))?;
        writeln!(f, "Seconds: {}", group_thousands(time_left.seconds))?;

        write_caveat(f)
    }
}

impl ProjectionReport {
    fn write_assumptions(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Assumptions:")?;
        if self.emissions_growth_decay > 0.0 {
            writeln!(
                f,
                "  Emissions growth: {:.2}%/year, decaying toward {:.2}%/year with a {:.0}-year e-folding time",
                self.emissions_growth_rate * 100.0,
                self.emissions_growth_floor * 100.0,
                1.0 / self.emissions_growth_decay
            )?;
        } else {
            writeln!(
                f,
                "  Emissions growth: {:.2}%/year, held constant",
                self.emissions_growth_rate * 100.0
            )?;
        }
        writeln!(
            f,
            "  Natural sequestration capacity: declining {:.2}%/year",
            self.sequestration_decay * 100.0
        )?;
        match self.negative_net_policy {
            NegativeNetPolicy::AllowDrawdown => {
                writeln!(f, "  Net removals lower concentration (never below 0 ppm)")
            }
            NegativeNetPolicy::Clamp => {
                writeln!(f, "  Net removals are clamped: concentration never falls")
            }
        }
    }
}

fn write_caveat(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f)?;
    writeln!(
        f,
        "{}",
        "NOTE: This is a simplified model based on current trends and assumptions.".dimmed()
    )?;
    writeln!(
        f,
        "{}",
        "Technological advances, policy changes, and natural feedback loops could significantly alter these projections."
            .dimmed()
    )
}

/// Format an integer with comma thousands separators
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::project;
    use approx::assert_relative_eq;

    #[test]
    fn test_time_left_units() {
        let t = TimeLeft::from_years(2);
        assert_eq!(t.months, 24);
        assert_eq!(t.days, 730);
        assert_eq!(t.hours, 17_520);
        assert_eq!(t.minutes, 1_051_200);
        assert_eq!(t.seconds, 63_072_000);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(13_749_696_000), "13,749,696,000");
    }

    #[test]
    fn test_report_for_default_run() {
        let params = ProjectionParams::default();
        let projection = project(&params).unwrap();
        let report = ProjectionReport::from_projection(&params, &projection);

        let years = report.years_until_threshold().unwrap();
        assert_eq!(report.crossing_calendar_year, Some(2023 + years as i32));
        assert_eq!(report.time_left.unwrap().days, years as u64 * 365);
        assert_relative_eq!(report.initial_net_ppm_per_year, 19.1 * 0.1292, max_relative = 1e-9);
        assert!(report.preindustrial_multiple > 14.0);

        let text = report.to_string();
        assert!(text.contains("Estimated Year When Atmosphere Becomes Toxic"));
        assert!(text.contains(&(2023 + years as i32).to_string()));
    }

    #[test]
    fn test_report_states_decay_assumptions() {
        let params = ProjectionParams::default();
        let projection = project(&params).unwrap();
        let text = ProjectionReport::from_projection(&params, &projection).to_string();

        assert!(text.contains("Emissions growth: 1.00%/year"));
        assert!(text.contains("toward 0.00%/year with a 100-year e-folding time"));
        assert!(text.contains("declining 0.10%/year"));

        let held = ProjectionParams::new()
            .with_emissions_growth(0.02, 0.0, 0.0)
            .with_negative_net_policy(NegativeNetPolicy::Clamp);
        let projection = project(&held).unwrap();
        let text = ProjectionReport::from_projection(&held, &projection).to_string();
        assert!(text.contains("Emissions growth: 2.00%/year, held constant"));
        assert!(text.contains("clamped"));
    }

    #[test]
    fn test_far_baseline_year_reports_without_overflow() {
        let params = ProjectionParams::new().with_baseline_year(i32::MAX - 3000);
        let projection = project(&params).unwrap();
        let report = ProjectionReport::from_projection(&params, &projection);
        let years = report.years_until_threshold().unwrap();
        assert_eq!(report.crossing_calendar_year, Some(i32::MAX - 3000 + years as i32));
    }

    #[test]
    fn test_report_when_not_reached() {
        let params = ProjectionParams::new().with_max_years(100);
        let projection = project(&params).unwrap();
        let report = ProjectionReport::from_projection(&params, &projection);

        assert_eq!(report.years_until_threshold(), None);
        assert!(report.time_left.is_none());
        assert!(report.to_string().contains("does not reach toxic levels within 100 years"));
    }

    #[test]
    fn test_report_json_carries_crossing() {
        let params = ProjectionParams::new().with_max_years(100);
        let projection = project(&params).unwrap();
        let json = ProjectionReport::from_projection(&params, &projection).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["crossing"]["status"], "not_reached");
        assert_eq!(value["crossing"]["bound"], 100);
    }
}
