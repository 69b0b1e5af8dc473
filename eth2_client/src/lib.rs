//! Operations the validator strategies need from upstream beacon nodes.
//!
//! Implementations wrap a single beacon node connection. Errors cover transport failures as
//! well as responses that fail validation.

use anyhow::Result;
use async_trait::async_trait;
use types::{
    nonstandard::{AttesterDuty, BeaconCommitteeSubscription},
    phase0::{
        containers::BeaconBlock,
        primitives::{Epoch, SignatureBytes, Slot, ValidatorIndex, H256},
    },
};

#[async_trait]
pub trait BeaconBlockProposalProvider: Send + Sync {
    async fn beacon_block_proposal(
        &self,
        slot: Slot,
        randao_reveal: SignatureBytes,
        graffiti: H256,
    ) -> Result<BeaconBlock>;
}

#[async_trait]
pub trait AttesterDutiesProvider: Send + Sync {
    async fn attester_duties(
        &self,
        epoch: Epoch,
        validator_indices: &[ValidatorIndex],
    ) -> Result<Vec<AttesterDuty>>;
}

#[async_trait]
pub trait BeaconCommitteeSubscriptionsSubmitter: Send + Sync {
    async fn submit_beacon_committee_subscriptions(
        &self,
        subscriptions: Vec<BeaconCommitteeSubscription>,
    ) -> Result<()>;
}
