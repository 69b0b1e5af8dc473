use core::num::NonZeroUsize;
use std::{collections::HashMap, sync::Arc, time::Instant};

use anyhow::{ensure, Context as _, Result};
use eth2_client::{AttesterDutiesProvider, BeaconCommitteeSubscriptionsSubmitter};
use fan_out::FanOut;
use itertools::Itertools as _;
use logging::{
    debug_with_context, error_with_context, info_with_context, trace_with_context,
    warn_with_context, ComponentLogger,
};
use prometheus_metrics::{Metrics, OperationResult};
use types::phase0::primitives::{CommitteeIndex, Epoch, ValidatorIndex};

use crate::{
    accounts::ValidatingAccount,
    aggregator::{AggregatorStatus, IsAggregatorProvider},
    attester_duties::{merge_duties, Duty},
    config::SubscriberConfig,
    error::Error,
    subscription_map::{Subscription, SubscriptionMap, Subscriptions},
};

type AccountsByIndex<'accounts> = HashMap<ValidatorIndex, &'accounts dyn ValidatingAccount>;

/// Works out which beacon committees own validators have to subscribe to and submits the
/// subscriptions.
pub struct BeaconCommitteeSubscriber {
    process_concurrency: NonZeroUsize,
    attester_duties_provider: Arc<dyn AttesterDutiesProvider>,
    aggregator: Arc<dyn IsAggregatorProvider>,
    submitter: Arc<dyn BeaconCommitteeSubscriptionsSubmitter>,
    metrics: Option<Arc<Metrics>>,
    logger: ComponentLogger,
}

impl BeaconCommitteeSubscriber {
    pub fn new(
        config: SubscriberConfig,
        attester_duties_provider: Arc<dyn AttesterDutiesProvider>,
        aggregator: Arc<dyn IsAggregatorProvider>,
        submitter: Arc<dyn BeaconCommitteeSubscriptionsSubmitter>,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<Self> {
        let SubscriberConfig {
            process_concurrency,
            minimum_log_level,
        } = config;

        let process_concurrency =
            NonZeroUsize::new(process_concurrency).ok_or(Error::ZeroProcessConcurrency)?;

        Ok(Self {
            process_concurrency,
            attester_duties_provider,
            aggregator,
            submitter,
            metrics,
            logger: ComponentLogger::new(
                "beacon_committee_subscriber",
                "standard",
                minimum_log_level,
            ),
        })
    }

    /// Calculates subscriptions for `epoch` and submits them in the background.
    ///
    /// The returned subscriptions may not have reached the beacon node yet.
    /// The outcome of the submission is only logged and recorded in metrics.
    pub async fn subscribe(
        &self,
        epoch: Epoch,
        accounts: &[Arc<dyn ValidatingAccount>],
    ) -> Result<Subscriptions> {
        let started = Instant::now();

        let subscriptions = match self.obtain_subscriptions(epoch, accounts).await {
            Ok(subscriptions) => subscriptions,
            Err(error) => {
                if let Some(metrics) = self.metrics.as_ref() {
                    metrics.beacon_committee_subscription_completed(
                        started,
                        OperationResult::Failed,
                    );
                }

                return Err(error);
            }
        };

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.set_beacon_committee_subscribers(subscriptions.len());
            metrics.set_beacon_committee_aggregators(subscriptions.aggregator_count());
        }

        self.spawn_submission(epoch, started, &subscriptions);

        Ok(subscriptions)
    }

    /// Decides, for every validator with a duty, whether it aggregates for its committee.
    ///
    /// Each committee ends up with one subscription, preferring one of its aggregators.
    /// Validators whose account, aggregator status or public key cannot be obtained are skipped.
    pub async fn calculate(
        &self,
        epoch: Epoch,
        accounts: &[Arc<dyn ValidatingAccount>],
        duties: &[Duty],
    ) -> Result<Subscriptions> {
        let accounts_by_index = self.accounts_by_index(accounts).await?;

        Ok(self
            .calculate_for_accounts(epoch, &accounts_by_index, duties)
            .await)
    }

    async fn obtain_subscriptions(
        &self,
        epoch: Epoch,
        accounts: &[Arc<dyn ValidatingAccount>],
    ) -> Result<Subscriptions> {
        let accounts_by_index = self.accounts_by_index(accounts).await?;

        let validator_indices = accounts_by_index.keys().copied().sorted().collect_vec();

        let attester_duties = self
            .attester_duties_provider
            .attester_duties(epoch, &validator_indices)
            .await
            .with_context(|| format!("failed to obtain attester duties for epoch {epoch}"))?;

        trace_with_context!(
            self.logger,
            "obtained {} attester duties for epoch {epoch}",
            attester_duties.len(),
        );

        let duties = merge_duties(attester_duties)
            .with_context(|| format!("failed to merge attester duties for epoch {epoch}"))?;

        Ok(self
            .calculate_for_accounts(epoch, &accounts_by_index, &duties)
            .await)
    }

    async fn accounts_by_index<'accounts>(
        &self,
        accounts: &'accounts [Arc<dyn ValidatingAccount>],
    ) -> Result<AccountsByIndex<'accounts>> {
        let mut accounts_by_index = HashMap::with_capacity(accounts.len());

        for account in accounts {
            match account.index().await {
                Ok(validator_index) => {
                    accounts_by_index.insert(validator_index, account.as_ref());
                }
                Err(error) => {
                    warn_with_context!(
                        self.logger,
                        "failed to obtain validator index for account: {error:?}",
                    );
                }
            }
        }

        ensure!(
            accounts.is_empty() || !accounts_by_index.is_empty(),
            Error::NoResolvableAccounts {
                accounts: accounts.len(),
            },
        );

        Ok(accounts_by_index)
    }

    async fn calculate_for_accounts(
        &self,
        epoch: Epoch,
        accounts_by_index: &AccountsByIndex<'_>,
        duties: &[Duty],
    ) -> Subscriptions {
        let subscription_map = SubscriptionMap::default();
        let fan_out = FanOut::new(self.process_concurrency);

        let members = duties
            .iter()
            .flat_map(|duty| {
                duty.members()
                    .map(move |(validator_index, committee_index)| {
                        (duty, validator_index, committee_index)
                    })
            })
            .map(|(duty, validator_index, committee_index)| {
                self.subscribe_member(
                    duty,
                    validator_index,
                    committee_index,
                    accounts_by_index,
                    &subscription_map,
                )
            });

        fan_out.run(members).await;

        let subscriptions = subscription_map.into_subscriptions();

        debug_with_context!(
            self.logger,
            "calculated {} beacon committee subscriptions ({} aggregating) for epoch {epoch}",
            subscriptions.len(),
            subscriptions.aggregator_count(),
        );

        subscriptions
    }

    async fn subscribe_member(
        &self,
        duty: &Duty,
        validator_index: ValidatorIndex,
        committee_index: CommitteeIndex,
        accounts_by_index: &AccountsByIndex<'_>,
        subscription_map: &SubscriptionMap,
    ) {
        let slot = duty.slot();

        let Some(account) = accounts_by_index.get(&validator_index).copied() else {
            error_with_context!(
                self.logger,
                "no account for validator {validator_index} with a duty at slot {slot}",
            );

            return;
        };

        let Some(committee_size) = duty.committee_size(committee_index) else {
            error_with_context!(
                self.logger,
                "no size for committee {committee_index} at slot {slot}",
            );

            return;
        };

        if subscription_map.has_aggregator(slot, committee_index).await {
            trace_with_context!(
                self.logger,
                "committee {committee_index} at slot {slot} already has an aggregator",
            );

            return;
        }

        let AggregatorStatus {
            is_aggregator,
            selection_proof,
        } = match self
            .aggregator
            .is_aggregator(validator_index, committee_index, slot, committee_size)
            .await
        {
            Ok(status) => status,
            Err(error) => {
                error_with_context!(
                    self.logger,
                    "failed to check if validator {validator_index} aggregates for committee \
                     {committee_index} at slot {slot}: {error:?}",
                );

                return;
            }
        };

        let validator_public_key = match account.public_key().await {
            Ok(public_key) => public_key,
            Err(error) => {
                error_with_context!(
                    self.logger,
                    "failed to obtain public key of validator {validator_index}: {error:?}",
                );

                return;
            }
        };

        let subscription = Subscription {
            validator_index,
            validator_public_key,
            committee_size,
            is_aggregator,
            selection_proof,
        };

        if !subscription_map
            .insert(slot, committee_index, subscription)
            .await
        {
            trace_with_context!(
                self.logger,
                "discarded subscription of validator {validator_index} for committee \
                 {committee_index} at slot {slot} in favor of an existing aggregator",
            );
        }
    }

    fn spawn_submission(&self, epoch: Epoch, started: Instant, subscriptions: &Subscriptions) {
        let beacon_committee_subscriptions = subscriptions.beacon_committee_subscriptions();
        let submitter = Arc::clone(&self.submitter);
        let metrics = self.metrics.clone();
        let logger = self.logger;

        tokio::spawn(async move {
            let count = beacon_committee_subscriptions.len();

            let result = match submitter
                .submit_beacon_committee_subscriptions(beacon_committee_subscriptions)
                .await
            {
                Ok(()) => {
                    info_with_context!(
                        logger,
                        "submitted {count} beacon committee subscriptions for epoch {epoch} \
                         (elapsed: {:?})",
                        started.elapsed(),
                    );

                    OperationResult::Succeeded
                }
                Err(error) => {
                    error_with_context!(
                        logger,
                        "failed to submit {count} beacon committee subscriptions for epoch \
                         {epoch}: {error:?}",
                    );

                    OperationResult::Failed
                }
            };

            if let Some(metrics) = metrics {
                metrics.beacon_committee_subscription_completed(started, result);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use core::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };
    use std::collections::HashSet;

    use anyhow::{anyhow, bail, Context as _};
    use async_trait::async_trait;
    use futures::{
        channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
        StreamExt as _,
    };
    use parking_lot::Mutex;
    use types::{
        nonstandard::{AttesterDuty, BeaconCommitteeSubscription},
        phase0::primitives::{PublicKeyBytes, SignatureBytes, Slot},
    };

    use crate::{
        accounts::{PublicKeyProvider, ValidatorIndexProvider},
        aggregator::AttestationAggregator,
        error::MergeError,
    };

    use super::*;

    #[expect(clippy::cast_possible_truncation)]
    fn public_key(validator_index: ValidatorIndex) -> PublicKeyBytes {
        PublicKeyBytes::repeat_byte(validator_index as u8)
    }

    #[expect(clippy::cast_possible_truncation)]
    fn selection_proof(validator_index: ValidatorIndex) -> SignatureBytes {
        SignatureBytes::repeat_byte(validator_index as u8)
    }

    struct Account {
        validator_index: Option<ValidatorIndex>,
        has_public_key: bool,
    }

    #[async_trait]
    impl ValidatorIndexProvider for Account {
        async fn index(&self) -> Result<ValidatorIndex> {
            self.validator_index
                .ok_or_else(|| anyhow!("account is not known to the beacon node"))
        }
    }

    #[async_trait]
    impl PublicKeyProvider for Account {
        async fn public_key(&self) -> Result<PublicKeyBytes> {
            let validator_index = self.validator_index.unwrap_or_default();

            if !self.has_public_key {
                bail!("public key of validator {validator_index} is locked");
            }

            Ok(public_key(validator_index))
        }
    }

    fn account(validator_index: ValidatorIndex) -> Arc<dyn ValidatingAccount> {
        Arc::new(Account {
            validator_index: Some(validator_index),
            has_public_key: true,
        })
    }

    fn unresolvable_account() -> Arc<dyn ValidatingAccount> {
        Arc::new(Account {
            validator_index: None,
            has_public_key: true,
        })
    }

    fn locked_account(validator_index: ValidatorIndex) -> Arc<dyn ValidatingAccount> {
        Arc::new(Account {
            validator_index: Some(validator_index),
            has_public_key: false,
        })
    }

    #[derive(Default)]
    struct Aggregator {
        aggregators: HashSet<ValidatorIndex>,
        failing: HashSet<ValidatorIndex>,
        delay: Duration,
        calls: Mutex<Vec<ValidatorIndex>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl Aggregator {
        fn with_aggregators(aggregators: impl IntoIterator<Item = ValidatorIndex>) -> Self {
            Self {
                aggregators: aggregators.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl IsAggregatorProvider for Aggregator {
        async fn is_aggregator(
            &self,
            validator_index: ValidatorIndex,
            _committee_index: CommitteeIndex,
            _slot: Slot,
            _committee_size: u64,
        ) -> Result<AggregatorStatus> {
            self.calls.lock().push(validator_index);

            let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(&validator_index) {
                bail!("failed to sign selection proof for validator {validator_index}");
            }

            Ok(AggregatorStatus {
                is_aggregator: self.aggregators.contains(&validator_index),
                selection_proof: selection_proof(validator_index),
            })
        }
    }

    #[async_trait]
    impl AttestationAggregator for Aggregator {
        async fn aggregate(
            &self,
            _slot: Slot,
            _committee_index: CommitteeIndex,
            _validator_index: ValidatorIndex,
            _selection_proof: SignatureBytes,
        ) -> Result<()> {
            Ok(())
        }
    }

    struct DutiesProvider {
        duties: Option<Vec<AttesterDuty>>,
        requested: Mutex<Vec<ValidatorIndex>>,
    }

    impl DutiesProvider {
        fn new(duties: impl IntoIterator<Item = AttesterDuty>) -> Self {
            Self {
                duties: Some(duties.into_iter().collect()),
                requested: Mutex::default(),
            }
        }

        fn failing() -> Self {
            Self {
                duties: None,
                requested: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl AttesterDutiesProvider for DutiesProvider {
        async fn attester_duties(
            &self,
            epoch: Epoch,
            validator_indices: &[ValidatorIndex],
        ) -> Result<Vec<AttesterDuty>> {
            self.requested.lock().extend_from_slice(validator_indices);

            self.duties
                .clone()
                .ok_or_else(|| anyhow!("beacon node has no duties for epoch {epoch}"))
        }
    }

    struct Submitter {
        succeeds: bool,
        sender: UnboundedSender<Vec<BeaconCommitteeSubscription>>,
    }

    #[async_trait]
    impl BeaconCommitteeSubscriptionsSubmitter for Submitter {
        async fn submit_beacon_committee_subscriptions(
            &self,
            subscriptions: Vec<BeaconCommitteeSubscription>,
        ) -> Result<()> {
            self.sender.unbounded_send(subscriptions)?;

            if !self.succeeds {
                bail!("beacon node rejected subscriptions");
            }

            Ok(())
        }
    }

    struct StalledSubmitter {
        sender: UnboundedSender<Vec<BeaconCommitteeSubscription>>,
    }

    #[async_trait]
    impl BeaconCommitteeSubscriptionsSubmitter for StalledSubmitter {
        async fn submit_beacon_committee_subscriptions(
            &self,
            subscriptions: Vec<BeaconCommitteeSubscription>,
        ) -> Result<()> {
            self.sender.unbounded_send(subscriptions)?;
            core::future::pending().await
        }
    }

    fn duty(
        slot: Slot,
        validator_index: ValidatorIndex,
        committee_index: CommitteeIndex,
    ) -> AttesterDuty {
        AttesterDuty {
            public_key: public_key(validator_index),
            slot,
            validator_index,
            committee_index,
            committee_length: 128,
            committees_at_slot: 4,
            validator_committee_index: validator_index,
        }
    }

    fn merged(duties: impl IntoIterator<Item = AttesterDuty>) -> Vec<Duty> {
        merge_duties(duties).expect("test duties should not conflict")
    }

    struct Context {
        subscriber: BeaconCommitteeSubscriber,
        aggregator: Arc<Aggregator>,
        duties_provider: Arc<DutiesProvider>,
        metrics: Arc<Metrics>,
        submissions: UnboundedReceiver<Vec<BeaconCommitteeSubscription>>,
    }

    fn context(
        process_concurrency: usize,
        aggregator: Aggregator,
        duties_provider: DutiesProvider,
        submission_succeeds: bool,
    ) -> Result<Context> {
        let aggregator = Arc::new(aggregator);
        let duties_provider = Arc::new(duties_provider);
        let metrics = Arc::new(Metrics::new()?);
        let (sender, submissions) = mpsc::unbounded();

        let subscriber = BeaconCommitteeSubscriber::new(
            SubscriberConfig {
                process_concurrency,
                ..SubscriberConfig::default()
            },
            Arc::<DutiesProvider>::clone(&duties_provider),
            Arc::<Aggregator>::clone(&aggregator),
            Arc::new(Submitter {
                succeeds: submission_succeeds,
                sender,
            }),
            Some(Arc::clone(&metrics)),
        )?;

        Ok(Context {
            subscriber,
            aggregator,
            duties_provider,
            metrics,
            submissions,
        })
    }

    #[tokio::test]
    async fn committee_with_aggregator_gets_single_aggregating_subscription() -> Result<()> {
        let Context {
            subscriber,
            aggregator,
            ..
        } = context(
            16,
            Aggregator::with_aggregators([1]),
            DutiesProvider::new([]),
            true,
        )?;

        let duties = merged([duty(50, 1, 3), duty(50, 2, 3)]);
        let subscriptions = subscriber
            .calculate(1, &[account(1), account(2)], &duties)
            .await?;

        assert_eq!(subscriptions.len(), 1);
        assert_eq!(
            subscriptions.get(50, 3),
            Some(&Subscription {
                validator_index: 1,
                validator_public_key: public_key(1),
                committee_size: 128,
                is_aggregator: true,
                selection_proof: selection_proof(1),
            }),
        );
        assert!(aggregator.calls.lock().contains(&1));

        Ok(())
    }

    #[tokio::test]
    async fn committee_without_aggregator_still_gets_a_subscription() -> Result<()> {
        let Context { subscriber, .. } =
            context(16, Aggregator::default(), DutiesProvider::new([]), true)?;

        let duties = merged([duty(50, 1, 3), duty(50, 2, 3), duty(51, 3, 0)]);
        let subscriptions = subscriber
            .calculate(1, &[account(1), account(2), account(3)], &duties)
            .await?;

        assert_eq!(subscriptions.len(), 2);
        assert_eq!(subscriptions.aggregator_count(), 0);
        assert!(subscriptions
            .get(50, 3)
            .is_some_and(|subscription| [1, 2].contains(&subscription.validator_index)));
        assert_eq!(
            subscriptions
                .get(51, 0)
                .map(|subscription| subscription.validator_index),
            Some(3),
        );

        Ok(())
    }

    #[tokio::test]
    async fn known_aggregator_skips_remaining_committee_members() -> Result<()> {
        let Context {
            subscriber,
            aggregator,
            ..
        } = context(
            1,
            Aggregator::with_aggregators([10]),
            DutiesProvider::new([]),
            true,
        )?;

        let duties = merged([duty(50, 10, 3), duty(50, 11, 3), duty(50, 12, 3)]);
        let accounts = [account(10), account(11), account(12)];
        let subscriptions = subscriber.calculate(1, &accounts, &duties).await?;

        assert_eq!(*aggregator.calls.lock(), [10]);
        assert_eq!(
            subscriptions
                .get(50, 3)
                .map(|subscription| subscription.validator_index),
            Some(10),
        );

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn aggregator_checks_respect_process_concurrency() -> Result<()> {
        for process_concurrency in [1, 4, 64] {
            let aggregator = Aggregator {
                delay: Duration::from_millis(100),
                ..Aggregator::default()
            };

            let Context {
                subscriber,
                aggregator,
                ..
            } = context(process_concurrency, aggregator, DutiesProvider::new([]), true)?;

            let raw_duties = (0..32).map(|validator_index| {
                duty(50 + validator_index % 8, validator_index, validator_index)
            });

            let accounts = (0..32).map(account).collect_vec();
            let subscriptions = subscriber
                .calculate(1, &accounts, &merged(raw_duties))
                .await?;

            assert_eq!(subscriptions.len(), 32);
            assert_eq!(aggregator.calls.lock().len(), 32);
            assert_eq!(
                aggregator.max_in_flight.load(Ordering::SeqCst),
                process_concurrency.min(32),
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn subscriptions_never_exceed_distinct_committees() -> Result<()> {
        let aggregators = (0..96).filter(|validator_index| validator_index % 7 == 0);

        let Context { subscriber, .. } = context(
            8,
            Aggregator::with_aggregators(aggregators),
            DutiesProvider::new([]),
            true,
        )?;

        let raw_duties = (0..96)
            .map(|validator_index| {
                duty(40 + validator_index % 4, validator_index, validator_index % 5)
            })
            .collect_vec();

        let distinct_committees = raw_duties
            .iter()
            .map(|duty| (duty.slot, duty.committee_index))
            .unique()
            .count();

        let accounts = (0..96).map(account).collect_vec();
        let subscriptions = subscriber
            .calculate(1, &accounts, &merged(raw_duties))
            .await?;

        assert_eq!(subscriptions.len(), distinct_committees);

        for (slot, committee_index, subscription) in subscriptions.iter() {
            let committee_has_aggregator = (0..96).any(|validator_index| {
                validator_index % 7 == 0
                    && 40 + validator_index % 4 == slot
                    && validator_index % 5 == committee_index
            });

            assert_eq!(subscription.is_aggregator, committee_has_aggregator);
        }

        Ok(())
    }

    #[tokio::test]
    async fn failures_of_single_validators_are_skipped() -> Result<()> {
        let aggregator = Aggregator {
            failing: HashSet::from([2]),
            ..Aggregator::with_aggregators([2, 3])
        };

        let Context { subscriber, .. } =
            context(16, aggregator, DutiesProvider::new([]), true)?;

        let duties = merged([
            duty(50, 1, 0),
            duty(50, 2, 1),
            duty(50, 3, 2),
            duty(50, 4, 3),
        ]);

        let accounts = [
            unresolvable_account(),
            account(2),
            locked_account(3),
            account(4),
        ];

        let subscriptions = subscriber.calculate(1, &accounts, &duties).await?;

        // Validator 1 has no account, 2 fails the aggregator check, 3 has no public key.
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(
            subscriptions
                .get(50, 3)
                .map(|subscription| subscription.validator_index),
            Some(4),
        );

        Ok(())
    }

    #[tokio::test]
    async fn fails_when_no_account_resolves() -> Result<()> {
        let Context { subscriber, .. } =
            context(16, Aggregator::default(), DutiesProvider::new([]), true)?;

        let error = subscriber
            .calculate(1, &[unresolvable_account(), unresolvable_account()], &[])
            .await
            .expect_err("calculation should fail without resolvable accounts");

        assert_eq!(
            error.downcast::<Error>()?,
            Error::NoResolvableAccounts { accounts: 2 },
        );

        Ok(())
    }

    #[tokio::test]
    async fn no_accounts_yield_no_subscriptions() -> Result<()> {
        let Context { subscriber, .. } =
            context(16, Aggregator::default(), DutiesProvider::new([]), true)?;

        let duties = merged([duty(50, 1, 3)]);
        let subscriptions = subscriber.calculate(1, &[], &duties).await?;

        assert!(subscriptions.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn subscribe_submits_subscriptions_in_background() -> Result<()> {
        let Context {
            subscriber,
            duties_provider,
            metrics,
            mut submissions,
            ..
        } = context(
            16,
            Aggregator::with_aggregators([2]),
            DutiesProvider::new([
                duty(50, 2, 3),
                duty(50, 1, 3),
                duty(50, 1, 3),
                duty(53, 4, 0),
            ]),
            true,
        )?;

        let accounts = [account(4), account(2), unresolvable_account(), account(1)];
        let subscriptions = subscriber.subscribe(1, &accounts).await?;

        assert_eq!(*duties_provider.requested.lock(), [1, 2, 4]);
        assert_eq!(subscriptions.len(), 2);
        assert_eq!(subscriptions.aggregator_count(), 1);

        assert_eq!(metrics.beacon_committee_subscribers(), 2);
        assert_eq!(metrics.beacon_committee_aggregators(), 1);

        let submitted = submissions
            .next()
            .await
            .expect("subscriptions should be submitted");

        assert_eq!(submitted, subscriptions.beacon_committee_subscriptions());
        assert_eq!(
            submitted
                .iter()
                .map(|subscription| (subscription.slot, subscription.validator_index))
                .collect_vec(),
            [(50, 2), (53, 4)],
        );

        assert_eq!(
            metrics.beacon_committee_subscription_count(OperationResult::Succeeded),
            1,
        );
        assert_eq!(
            metrics.beacon_committee_subscription_count(OperationResult::Failed),
            0,
        );

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn subscribe_returns_before_submission_completes() -> Result<()> {
        let (sender, mut submissions) = mpsc::unbounded();

        let subscriber = BeaconCommitteeSubscriber::new(
            SubscriberConfig::default(),
            Arc::new(DutiesProvider::new([duty(50, 1, 3), duty(50, 2, 3)])),
            Arc::new(Aggregator::with_aggregators([1])),
            Arc::new(StalledSubmitter { sender }),
            None,
        )?;

        let subscriptions = tokio::time::timeout(
            Duration::from_secs(1),
            subscriber.subscribe(1, &[account(1), account(2)]),
        )
        .await
        .context("subscribing should not wait for the submission")??;

        assert_eq!(subscriptions.len(), 1);
        assert_eq!(
            subscriptions
                .get(50, 3)
                .map(|subscription| (subscription.validator_index, subscription.is_aggregator)),
            Some((1, true)),
        );

        let submitted = submissions
            .next()
            .await
            .expect("submission should have started");

        assert_eq!(submitted, subscriptions.beacon_committee_subscriptions());

        Ok(())
    }

    #[tokio::test]
    async fn failed_submission_is_only_recorded() -> Result<()> {
        let Context {
            subscriber,
            metrics,
            mut submissions,
            ..
        } = context(
            16,
            Aggregator::default(),
            DutiesProvider::new([duty(50, 1, 3)]),
            false,
        )?;

        let subscriptions = subscriber.subscribe(1, &[account(1)]).await?;

        assert_eq!(subscriptions.len(), 1);

        submissions
            .next()
            .await
            .expect("subscriptions should be submitted");

        assert_eq!(
            metrics.beacon_committee_subscription_count(OperationResult::Failed),
            1,
        );

        Ok(())
    }

    #[tokio::test]
    async fn subscribe_fails_when_duties_are_unavailable() -> Result<()> {
        let Context {
            subscriber,
            aggregator,
            metrics,
            mut submissions,
            ..
        } = context(16, Aggregator::default(), DutiesProvider::failing(), true)?;

        let error = subscriber
            .subscribe(1, &[account(1)])
            .await
            .expect_err("subscribing should fail without duties");

        assert!(error.to_string().contains("attester duties for epoch 1"));
        assert!(aggregator.calls.lock().is_empty());
        assert_eq!(
            metrics.beacon_committee_subscription_count(OperationResult::Failed),
            1,
        );

        drop(subscriber);

        assert_eq!(submissions.next().await, None);

        Ok(())
    }

    #[tokio::test]
    async fn subscribe_fails_on_conflicting_duties() -> Result<()> {
        let Context {
            subscriber,
            aggregator,
            metrics,
            ..
        } = context(
            16,
            Aggregator::default(),
            DutiesProvider::new([duty(50, 1, 3), duty(51, 1, 3)]),
            true,
        )?;

        let error = subscriber
            .subscribe(1, &[account(1)])
            .await
            .expect_err("subscribing should fail with conflicting duties");

        assert_eq!(
            error.downcast::<MergeError>()?,
            MergeError::ConflictingAssignment { validator_index: 1 },
        );
        assert!(aggregator.calls.lock().is_empty());
        assert_eq!(
            metrics.beacon_committee_subscription_count(OperationResult::Failed),
            1,
        );

        Ok(())
    }

    #[tokio::test]
    async fn subscribe_fails_when_no_account_resolves() -> Result<()> {
        let Context {
            subscriber,
            duties_provider,
            ..
        } = context(16, Aggregator::default(), DutiesProvider::new([]), true)?;

        let error = subscriber
            .subscribe(1, &[unresolvable_account()])
            .await
            .expect_err("subscribing should fail without resolvable accounts");

        assert_eq!(
            error.downcast::<Error>()?,
            Error::NoResolvableAccounts { accounts: 1 },
        );
        assert!(duties_provider.requested.lock().is_empty());

        Ok(())
    }

    #[test]
    fn zero_process_concurrency_is_rejected() {
        let result = context(0, Aggregator::default(), DutiesProvider::new([]), true);

        let Err(error) = result else {
            panic!("construction should fail with zero process concurrency");
        };

        assert_eq!(
            error.downcast::<Error>().ok(),
            Some(Error::ZeroProcessConcurrency),
        );
    }
}
