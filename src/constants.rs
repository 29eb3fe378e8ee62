// Baseline atmosphere (2023)
pub const BASELINE_YEAR: i32 = 2023;
pub const CURRENT_CO2_PPM: f64 = 420.0;
pub const TOXIC_BREATHING_CO2_PPM: f64 = 4200.0; // 10x current levels
pub const PREINDUSTRIAL_CO2_PPM: f64 = 280.0;
pub const CURRENT_ANNUAL_CO2_INCREASE_PPM: f64 = 2.5; // observed, ppm/year

// Emissions
pub const CURRENT_ANNUAL_EMISSIONS_GT: f64 = 36.8;
pub const EMISSIONS_GROWTH_RATE: f64 = 0.01; // fraction per year at year 0
pub const EMISSIONS_GROWTH_DECAY: f64 = 0.01; // e-folding of 100 years
pub const EMISSIONS_GROWTH_FLOOR: f64 = 0.0;

// Natural sinks (Gt CO2 per year)
pub const FOREST_SEQUESTRATION_GT: f64 = 7.6;
pub const OTHER_NATURAL_SINKS_GT: f64 = 10.1; // oceans, soil
pub const SEQUESTRATION_DECAY: f64 = 0.001; // 0.1% capacity lost per year

// Conversion factors
pub const GT_CO2_TO_PPM: f64 = 0.1292;
pub const PPM_TO_GT_CO2: f64 = 7.74;

pub const DEFAULT_MAX_YEARS: u32 = 1000;

// Time units
pub const MONTHS_PER_YEAR: u64 = 12;
pub const DAYS_PER_YEAR: u64 = 365;
pub const HOURS_PER_DAY: u64 = 24;
pub const MINUTES_PER_HOUR: u64 = 60;
pub const SECONDS_PER_MINUTE: u64 = 60;

// Chart output
pub const DEFAULT_CHART_PATH: &str = "co2_trajectory.png";
pub const CHART_YEARS_AFTER_CROSSING: u32 = 19; // last plotted year is crossing + 19
pub const MAX_CHART_YEARS_AFTER_CROSSING: u32 = 1000;
