use core::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("at least one beacon block proposal provider is required")]
    NoProviders,
    #[error("process concurrency must be positive")]
    ZeroProcessConcurrency,
    #[error("provider timeout must be positive")]
    ZeroTimeout,
    #[error("slashing weight must be finite and non-negative (got {slashing_weight})")]
    InvalidSlashingWeight { slashing_weight: f64 },
    #[error("provider did not respond within {timeout:?}")]
    ProviderTimeout { timeout: Duration },
}
