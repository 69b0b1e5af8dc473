use std::collections::{btree_map::Entry, BTreeMap};

use types::{
    nonstandard::AttesterDuty,
    phase0::primitives::{CommitteeIndex, Slot, ValidatorIndex},
};

use crate::error::MergeError;

/// Attester duties of all own validators sharing one slot.
///
/// The validator at position `i` of [`Duty::validator_indices`] attests in the committee at
/// position `i` of [`Duty::committee_indices`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Duty {
    slot: Slot,
    validator_indices: Vec<ValidatorIndex>,
    committee_indices: Vec<CommitteeIndex>,
    committee_sizes: BTreeMap<CommitteeIndex, u64>,
}

impl Duty {
    const fn new(slot: Slot) -> Self {
        Self {
            slot,
            validator_indices: vec![],
            committee_indices: vec![],
            committee_sizes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.slot
    }

    #[must_use]
    pub fn validator_indices(&self) -> &[ValidatorIndex] {
        &self.validator_indices
    }

    #[must_use]
    pub fn committee_indices(&self) -> &[CommitteeIndex] {
        &self.committee_indices
    }

    #[must_use]
    pub fn committee_size(&self, committee_index: CommitteeIndex) -> Option<u64> {
        self.committee_sizes.get(&committee_index).copied()
    }

    pub fn members(&self) -> impl Iterator<Item = (ValidatorIndex, CommitteeIndex)> + '_ {
        self.validator_indices
            .iter()
            .copied()
            .zip(self.committee_indices.iter().copied())
    }

    fn push(
        &mut self,
        validator_index: ValidatorIndex,
        committee_index: CommitteeIndex,
        committee_size: u64,
    ) {
        self.validator_indices.push(validator_index);
        self.committee_indices.push(committee_index);
        self.committee_sizes.insert(committee_index, committee_size);
    }
}

/// Groups raw attester duties by slot.
///
/// Raw duties may come from several beacon nodes and contain repeats. Repeats that agree on the
/// slot, committee index and committee length are collapsed into the first one seen. Repeats that
/// disagree on any of those make the whole merge fail.
pub fn merge_duties(
    duties: impl IntoIterator<Item = AttesterDuty>,
) -> Result<Vec<Duty>, MergeError> {
    let mut by_validator = BTreeMap::<ValidatorIndex, AttesterDuty>::new();

    for duty in duties {
        match by_validator.entry(duty.validator_index) {
            Entry::Vacant(vacant) => {
                vacant.insert(duty);
            }
            Entry::Occupied(occupied) => {
                if assignment(occupied.get()) != assignment(&duty) {
                    return Err(MergeError::ConflictingAssignment {
                        validator_index: duty.validator_index,
                    });
                }
            }
        }
    }

    let mut committee_sizes = BTreeMap::<(Slot, CommitteeIndex), u64>::new();
    let mut by_slot = BTreeMap::<Slot, Duty>::new();

    for duty in by_validator.into_values() {
        let AttesterDuty {
            slot,
            validator_index,
            committee_index,
            committee_length,
            ..
        } = duty;

        match committee_sizes.entry((slot, committee_index)) {
            Entry::Vacant(vacant) => {
                vacant.insert(committee_length);
            }
            Entry::Occupied(occupied) => {
                let first = *occupied.get();

                if first != committee_length {
                    return Err(MergeError::ConflictingCommitteeSize {
                        slot,
                        committee_index,
                        first,
                        second: committee_length,
                    });
                }
            }
        }

        by_slot
            .entry(slot)
            .or_insert_with(|| Duty::new(slot))
            .push(validator_index, committee_index, committee_length);
    }

    Ok(by_slot.into_values().collect())
}

const fn assignment(duty: &AttesterDuty) -> (Slot, CommitteeIndex, u64) {
    (duty.slot, duty.committee_index, duty.committee_length)
}
