use crate::phase0::primitives::{
    CommitteeIndex, PublicKeyBytes, SignatureBytes, Slot, ValidatorIndex,
};

/// Attester duty as reported by a single beacon node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct AttesterDuty {
    pub public_key: PublicKeyBytes,
    pub slot: Slot,
    pub validator_index: ValidatorIndex,
    pub committee_index: CommitteeIndex,
    pub committee_length: u64,
    pub committees_at_slot: u64,
    pub validator_committee_index: u64,
}

/// Subscription to a beacon committee subnet in the form submitted to beacon nodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BeaconCommitteeSubscription {
    pub slot: Slot,
    pub committee_index: CommitteeIndex,
    pub committee_size: u64,
    pub validator_index: ValidatorIndex,
    pub validator_public_key: PublicKeyBytes,
    pub is_aggregator: bool,
    pub selection_proof: SignatureBytes,
}
