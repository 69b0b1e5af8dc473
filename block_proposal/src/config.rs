use core::time::Duration;

use derivative::Derivative;
use tracing::level_filters::LevelFilter;

use crate::score::SLASHING_WEIGHT;

pub const DEFAULT_PROCESS_CONCURRENCY: usize = 16;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, Derivative)]
#[derivative(Default)]
pub struct Config {
    /// Maximum number of provider calls in flight at once.
    #[derivative(Default(value = "DEFAULT_PROCESS_CONCURRENCY"))]
    pub process_concurrency: usize,
    /// Deadline for a single provider call.
    #[derivative(Default(value = "DEFAULT_TIMEOUT"))]
    pub timeout: Duration,
    #[derivative(Default(value = "SLASHING_WEIGHT"))]
    pub slashing_weight: f64,
    #[derivative(Default(value = "LevelFilter::INFO"))]
    pub minimum_log_level: LevelFilter,
}
