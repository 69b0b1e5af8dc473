use core::{num::NonZeroUsize, time::Duration};
use std::{collections::BTreeMap, sync::Arc, time::Instant};

use anyhow::{ensure, Result};
use eth2_client::BeaconBlockProposalProvider;
use fan_out::FanOut;
use logging::{debug_with_context, trace_with_context, warn_with_context, ComponentLogger};
use parking_lot::Mutex;
use prometheus_metrics::Metrics;
use types::phase0::{
    containers::BeaconBlock,
    primitives::{SignatureBytes, Slot, H256},
};

use crate::{config::Config, error::Error, score::ProposalScorer};

const OPERATION: &str = "beacon block proposal";

struct ScoredProposal<'provider> {
    provider: &'provider str,
    score: f64,
    proposal: BeaconBlock,
}

/// Obtains block proposals from every configured beacon node and keeps the one with the
/// highest expected reward.
pub struct BestBlockProposal {
    process_concurrency: NonZeroUsize,
    timeout: Duration,
    scorer: ProposalScorer,
    providers: BTreeMap<String, Arc<dyn BeaconBlockProposalProvider>>,
    metrics: Option<Arc<Metrics>>,
    logger: ComponentLogger,
}

impl BestBlockProposal {
    pub fn new(
        config: Config,
        providers: impl IntoIterator<Item = (String, Arc<dyn BeaconBlockProposalProvider>)>,
        metrics: Option<Arc<Metrics>>,
    ) -> Result<Self> {
        let Config {
            process_concurrency,
            timeout,
            slashing_weight,
            minimum_log_level,
        } = config;

        let process_concurrency =
            NonZeroUsize::new(process_concurrency).ok_or(Error::ZeroProcessConcurrency)?;

        ensure!(!timeout.is_zero(), Error::ZeroTimeout);

        ensure!(
            slashing_weight.is_finite() && slashing_weight >= 0.0,
            Error::InvalidSlashingWeight { slashing_weight },
        );

        let providers = providers.into_iter().collect::<BTreeMap<_, _>>();

        ensure!(!providers.is_empty(), Error::NoProviders);

        Ok(Self {
            process_concurrency,
            timeout,
            scorer: ProposalScorer::new(slashing_weight),
            providers,
            metrics,
            logger: ComponentLogger::new("beacon_block_proposal", "best", minimum_log_level),
        })
    }

    /// Returns `None` if no provider produced a proposal in time.
    ///
    /// Waits for every provider to either respond or time out, even after a proposal has been
    /// obtained, because a later response may score higher.
    pub async fn beacon_block_proposal(
        &self,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
    ) -> Option<BeaconBlock> {
        let best = Mutex::new(None);
        let fan_out = FanOut::new(self.process_concurrency);

        fan_out
            .run(self.providers.iter().map(|(name, provider)| {
                self.obtain_and_score(
                    name,
                    provider.as_ref(),
                    slot,
                    randao_reveal,
                    graffiti,
                    &best,
                )
            }))
            .await;

        match best.into_inner() {
            Some(ScoredProposal {
                provider,
                score,
                proposal,
            }) => {
                debug_with_context!(
                    self.logger,
                    "selected beacon block proposal for slot {slot} from {provider} \
                     (score: {score})",
                );

                Some(proposal)
            }
            None => {
                warn_with_context!(
                    self.logger,
                    "none of {} providers returned a beacon block proposal for slot {slot}",
                    self.providers.len(),
                );

                None
            }
        }
    }

    async fn obtain_and_score<'provider>(
        &self,
        name: &'provider str,
        provider: &dyn BeaconBlockProposalProvider,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
        best: &Mutex<Option<ScoredProposal<'provider>>>,
    ) {
        let started = Instant::now();

        let result = tokio::time::timeout(
            self.timeout,
            provider.beacon_block_proposal(slot, randao_reveal, graffiti),
        )
        .await
        .unwrap_or_else(|_| {
            Err(Error::ProviderTimeout {
                timeout: self.timeout,
            }
            .into())
        });

        let elapsed = started.elapsed();

        if let Some(metrics) = self.metrics.as_ref() {
            metrics.client_operation(name, OPERATION, result.is_ok().into(), elapsed);
        }

        let proposal = match result {
            Ok(proposal) => proposal,
            Err(error) => {
                warn_with_context!(
                    self.logger,
                    "failed to obtain beacon block proposal for slot {slot} from {name}: {error:?}",
                );

                return;
            }
        };

        let breakdown = self.scorer.breakdown(slot, &proposal);
        let score = breakdown.total();

        trace_with_context!(
            self.logger,
            "obtained beacon block proposal for slot {slot} from {name} \
             (elapsed: {elapsed:?}, score: {breakdown:?}, total: {score})",
        );

        let mut best = best.lock();

        if best.as_ref().is_none_or(|current| score > current.score) {
            *best = Some(ScoredProposal {
                provider: name,
                score,
                proposal,
            });
        }
    }
}
