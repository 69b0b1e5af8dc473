use core::time::Duration;
use std::time::Instant;

use anyhow::Result;
use prometheus::{histogram_opts, opts, Histogram, HistogramVec, IntCounterVec, IntGauge};
use strum::AsRefStr;
use tracing::warn;

#[derive(Clone, Copy, PartialEq, Eq, Debug, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum OperationResult {
    Succeeded,
    Failed,
}

impl From<bool> for OperationResult {
    fn from(succeeded: bool) -> Self {
        if succeeded {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

#[derive(Debug)]
pub struct Metrics {
    // Upstream beacon node calls
    client_operations: IntCounterVec,
    client_operation_times: HistogramVec,

    // Beacon committee subscriptions
    beacon_committee_subscribers: IntGauge,
    beacon_committee_aggregators: IntGauge,
    beacon_committee_subscription_times: Histogram,
    beacon_committee_subscriptions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client_operations: IntCounterVec::new(
                opts!(
                    "CLIENT_OPERATIONS",
                    "Number of operations performed against upstream beacon nodes"
                ),
                &["provider", "operation", "result"],
            )?,

            client_operation_times: HistogramVec::new(
                histogram_opts!(
                    "CLIENT_OPERATION_TIMES",
                    "Times of operations performed against upstream beacon nodes"
                ),
                &["provider", "operation"],
            )?,

            beacon_committee_subscribers: IntGauge::new(
                "BEACON_COMMITTEE_SUBSCRIBERS",
                "Number of beacon committee subscriptions in the latest calculation",
            )?,

            beacon_committee_aggregators: IntGauge::new(
                "BEACON_COMMITTEE_AGGREGATORS",
                "Number of beacon committee aggregators in the latest calculation",
            )?,

            beacon_committee_subscription_times: Histogram::with_opts(histogram_opts!(
                "BEACON_COMMITTEE_SUBSCRIPTION_PROCESS_TIMES",
                "Time from the start of a subscription round until it completed",
            ))?,

            beacon_committee_subscriptions: IntCounterVec::new(
                opts!(
                    "BEACON_COMMITTEE_SUBSCRIPTIONS",
                    "Number of completed beacon committee subscription rounds"
                ),
                &["result"],
            )?,
        })
    }

    pub fn register_with_default_metrics(&self) -> Result<()> {
        let default_registry = prometheus::default_registry();

        default_registry.register(Box::new(self.client_operations.clone()))?;
        default_registry.register(Box::new(self.client_operation_times.clone()))?;
        default_registry.register(Box::new(self.beacon_committee_subscribers.clone()))?;
        default_registry.register(Box::new(self.beacon_committee_aggregators.clone()))?;
        default_registry.register(Box::new(self.beacon_committee_subscription_times.clone()))?;
        default_registry.register(Box::new(self.beacon_committee_subscriptions.clone()))?;

        Ok(())
    }

    // Upstream beacon node calls
    pub fn client_operation(
        &self,
        provider: &str,
        operation: &str,
        result: OperationResult,
        elapsed: Duration,
    ) {
        match self
            .client_operations
            .get_metric_with_label_values(&[provider, operation, result.as_ref()])
        {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to count {operation} operation for {provider}: {error}"),
        }

        match self
            .client_operation_times
            .get_metric_with_label_values(&[provider, operation])
        {
            Ok(histogram) => histogram.observe(elapsed.as_secs_f64()),
            Err(error) => warn!("unable to time {operation} operation for {provider}: {error}"),
        }
    }

    #[must_use]
    pub fn client_operation_count(
        &self,
        provider: &str,
        operation: &str,
        result: OperationResult,
    ) -> u64 {
        self.client_operations
            .get_metric_with_label_values(&[provider, operation, result.as_ref()])
            .map(|counter| counter.get())
            .unwrap_or_default()
    }

    // Beacon committee subscriptions
    pub fn set_beacon_committee_subscribers(&self, subscriptions: usize) {
        self.beacon_committee_subscribers
            .set(i64::try_from(subscriptions).unwrap_or(i64::MAX))
    }

    pub fn set_beacon_committee_aggregators(&self, aggregators: usize) {
        self.beacon_committee_aggregators
            .set(i64::try_from(aggregators).unwrap_or(i64::MAX))
    }

    pub fn beacon_committee_subscription_completed(
        &self,
        started: Instant,
        result: OperationResult,
    ) {
        self.beacon_committee_subscription_times
            .observe(started.elapsed().as_secs_f64());

        match self
            .beacon_committee_subscriptions
            .get_metric_with_label_values(&[result.as_ref()])
        {
            Ok(counter) => counter.inc(),
            Err(error) => warn!("unable to count beacon committee subscription round: {error}"),
        }
    }

    #[must_use]
    pub fn beacon_committee_subscribers(&self) -> i64 {
        self.beacon_committee_subscribers.get()
    }

    #[must_use]
    pub fn beacon_committee_aggregators(&self) -> i64 {
        self.beacon_committee_aggregators.get()
    }

    #[must_use]
    pub fn beacon_committee_subscription_count(&self, result: OperationResult) -> u64 {
        self.beacon_committee_subscriptions
            .get_metric_with_label_values(&[result.as_ref()])
            .map(|counter| counter.get())
            .unwrap_or_default()
    }
}
