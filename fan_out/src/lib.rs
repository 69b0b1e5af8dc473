use core::{future::Future, num::NonZeroUsize};

use futures::stream::{FuturesUnordered, StreamExt as _};
use tokio::sync::Semaphore;
use tracing::warn;

/// Bounded fan-out over independent units of work.
///
/// Every unit waits for one permit before it is first polled and gives it back when it completes
/// or is dropped. A `FanOut` is meant to live for a single call.
pub struct FanOut {
    semaphore: Semaphore,
}

impl FanOut {
    #[must_use]
    pub fn new(process_concurrency: NonZeroUsize) -> Self {
        Self {
            semaphore: Semaphore::new(process_concurrency.get()),
        }
    }

    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Runs all `units` and resolves once every one of them has finished.
    ///
    /// Outputs are returned in completion order. Dropping the returned future cancels the units
    /// that are still waiting or running.
    pub async fn run<I>(&self, units: I) -> Vec<<I::Item as Future>::Output>
    where
        I: IntoIterator,
        I::Item: Future,
    {
        units
            .into_iter()
            .map(|unit| self.admit(unit))
            .collect::<FuturesUnordered<_>>()
            .filter_map(core::future::ready)
            .collect()
            .await
    }

    async fn admit<F: Future>(&self, unit: F) -> Option<F::Output> {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(error) => {
                warn!("failed to acquire fan-out permit: {error}");
                return None;
            }
        };

        Some(unit.await)
    }
}
