use co2_horizon::chart::save_default_chart;
use co2_horizon::constants::DEFAULT_CHART_PATH;
use co2_horizon::report::ProjectionReport;
use co2_horizon::{logging, project, ProjectionParams};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("failed to install logger: {e}");
    }

    println!("🌍 Calculating time until Earth's atmosphere becomes toxic for human breathing...");
    println!("   Based on current CO2 levels being 10% of toxic breathing threshold.");

    let params = match ProjectionParams::new().validated() {
        Ok(params) => params,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let projection = match project(&params) {
        Ok(projection) => projection,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let report = ProjectionReport::from_projection(&params, &projection);
    print!("{report}");

    println!();
    println!("📊 Plotting trajectory to {DEFAULT_CHART_PATH}...");
    if let Err(e) = save_default_chart(&params, &projection) {
        log::error!("could not write chart (results above are complete): {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
