use derivative::Derivative;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_PROCESS_CONCURRENCY: usize = 16;

#[derive(Clone, Copy, Debug, Derivative)]
#[derivative(Default)]
pub struct SubscriberConfig {
    /// Maximum number of aggregator checks in flight at once.
    #[derivative(Default(value = "DEFAULT_PROCESS_CONCURRENCY"))]
    pub process_concurrency: usize,
    #[derivative(Default(value = "LevelFilter::INFO"))]
    pub minimum_log_level: LevelFilter,
}
