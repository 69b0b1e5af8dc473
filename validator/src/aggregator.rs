use anyhow::Result;
use async_trait::async_trait;
use types::phase0::primitives::{CommitteeIndex, SignatureBytes, Slot, ValidatorIndex};

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct AggregatorStatus {
    pub is_aggregator: bool,
    /// Slot signature the aggregator selection was derived from.
    pub selection_proof: SignatureBytes,
}

#[async_trait]
pub trait IsAggregatorProvider: Send + Sync {
    async fn is_aggregator(
        &self,
        validator_index: ValidatorIndex,
        committee_index: CommitteeIndex,
        slot: Slot,
        committee_size: u64,
    ) -> Result<AggregatorStatus>;
}

/// Full aggregation service. Subscription calculation only needs [`IsAggregatorProvider`].
#[async_trait]
pub trait AttestationAggregator: IsAggregatorProvider {
    async fn aggregate(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
        validator_index: ValidatorIndex,
        selection_proof: SignatureBytes,
    ) -> Result<()>;
}
