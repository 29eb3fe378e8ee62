pub mod chart;
pub mod constants;
pub mod error;
pub mod logging;
pub mod projection;
pub mod projection_params;
pub mod report;

pub use error::{ProjectionError, ProjectionResult};
pub use projection::{project, Projection, ProjectionEngine, ThresholdCrossing, YearRecord};
pub use projection_params::{NegativeNetPolicy, ProjectionParams, SinkBreakdown};
