use thiserror::Error;
use types::phase0::primitives::{CommitteeIndex, Slot, ValidatorIndex};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("process concurrency must be positive")]
    ZeroProcessConcurrency,
    #[error("none of {accounts} accounts could be resolved to a validator index")]
    NoResolvableAccounts { accounts: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("validator {validator_index} was reported with conflicting attester duties")]
    ConflictingAssignment { validator_index: ValidatorIndex },
    #[error(
        "committee {committee_index} at slot {slot} was reported with conflicting sizes \
         ({first} and {second})"
    )]
    ConflictingCommitteeSize {
        slot: Slot,
        committee_index: CommitteeIndex,
        first: u64,
        second: u64,
    },
}
