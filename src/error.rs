use thiserror::Error;

/// Errors raised while validating, projecting or rendering a CO2 trajectory.
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("invalid parameter set: {0}")]
    Config(String),
    #[error("cannot render chart: {0}")]
    Render(String),
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, ProjectionError>`.
pub type ProjectionResult<T> = Result<T, ProjectionError>;
