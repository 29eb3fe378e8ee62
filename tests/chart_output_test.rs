use co2_horizon::chart::{render_trajectory, save_trajectory_png, ChartConfig};
use co2_horizon::{project, ProjectionError, ProjectionParams};
use image::Rgb;
use more_asserts::assert_gt;
use std::fs;

fn count_color(image: &image::RgbImage, color: [u8; 3]) -> usize {
    image.pixels().filter(|p| **p == Rgb(color)).count()
}

#[test]
fn chart_has_configured_size_and_series() {
    let params = ProjectionParams::default();
    let projection = project(&params).unwrap();
    let config = ChartConfig::default();

    let image = render_trajectory(&params, &projection, &config).unwrap();
    assert_eq!(image.dimensions(), (config.width, config.height));

    let palette = config.palette;
    assert_gt!(count_color(&image, palette.trajectory), 0);
    assert_gt!(count_color(&image, palette.threshold), 0);
    assert_gt!(count_color(&image, palette.current_level), 0);
    assert_gt!(count_color(&image, palette.crossing_marker), 0);
}

#[test]
fn chart_without_crossing_has_no_marker() {
    let params = ProjectionParams::new().with_max_years(120);
    let projection = project(&params).unwrap();
    let config = ChartConfig::default().with_size(800, 600);

    let image = render_trajectory(&params, &projection, &config).unwrap();
    assert_eq!(count_color(&image, config.palette.crossing_marker), 0);
    assert_gt!(count_color(&image, config.palette.trajectory), 0);
}

#[test]
fn rendering_is_deterministic() {
    let params = ProjectionParams::default();
    let projection = project(&params).unwrap();
    let config = ChartConfig::default().with_size(640, 480);

    let a = render_trajectory(&params, &projection, &config).unwrap();
    let b = render_trajectory(&params, &projection, &config).unwrap();
    assert!(a == b);
}

#[test]
fn saves_png_that_reopens() {
    let params = ProjectionParams::default();
    let projection = project(&params).unwrap();
    let config = ChartConfig::default().with_size(600, 400);
    let path = std::env::temp_dir().join(format!("co2_horizon_chart_{}.png", std::process::id()));

    save_trajectory_png(&params, &projection, &config, &path).unwrap();
    let reopened = image::open(&path).unwrap();
    assert_eq!((reopened.width(), reopened.height()), (600, 400));

    let _ = fs::remove_file(&path);
}

#[test]
fn unwritable_path_reports_error() {
    let params = ProjectionParams::default();
    let projection = project(&params).unwrap();
    let path = std::env::temp_dir()
        .join("co2_horizon_missing_dir")
        .join("nested")
        .join("chart.png");

    let err = save_trajectory_png(&params, &projection, &ChartConfig::default(), &path).unwrap_err();
    assert!(matches!(err, ProjectionError::Image(_) | ProjectionError::Io(_)));
}
