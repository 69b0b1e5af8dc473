use std::collections::{btree_map::Entry, BTreeMap};

use tokio::sync::RwLock;
use types::{
    nonstandard::BeaconCommitteeSubscription,
    phase0::primitives::{CommitteeIndex, PublicKeyBytes, SignatureBytes, Slot, ValidatorIndex},
};

type SubscriptionsBySlot = BTreeMap<Slot, BTreeMap<CommitteeIndex, Subscription>>;

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct Subscription {
    pub validator_index: ValidatorIndex,
    pub validator_public_key: PublicKeyBytes,
    pub committee_size: u64,
    pub is_aggregator: bool,
    pub selection_proof: SignatureBytes,
}

/// Subscriptions being collected by concurrent workers.
///
/// Holds at most one subscription per slot and committee.
/// An aggregator is never replaced, so the first confirmed aggregator of a committee stays.
/// Any other subscription is replaced by the latest one inserted for the same committee.
#[derive(Default)]
pub struct SubscriptionMap {
    subscriptions: RwLock<SubscriptionsBySlot>,
}

impl SubscriptionMap {
    pub async fn has_aggregator(&self, slot: Slot, committee_index: CommitteeIndex) -> bool {
        self.subscriptions
            .read()
            .await
            .get(&slot)
            .and_then(|committees| committees.get(&committee_index))
            .is_some_and(|subscription| subscription.is_aggregator)
    }

    /// Returns `false` if `subscription` was discarded in favor of an existing aggregator.
    pub async fn insert(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
        subscription: Subscription,
    ) -> bool {
        let mut subscriptions = self.subscriptions.write().await;

        match subscriptions.entry(slot).or_default().entry(committee_index) {
            Entry::Vacant(vacant) => {
                vacant.insert(subscription);
            }
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_aggregator {
                    return false;
                }

                occupied.insert(subscription);
            }
        }

        true
    }

    #[must_use]
    pub fn into_subscriptions(self) -> Subscriptions {
        Subscriptions {
            by_slot: self.subscriptions.into_inner(),
        }
    }
}

/// Beacon committee subscriptions for one epoch, ordered by slot and committee index.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct Subscriptions {
    by_slot: SubscriptionsBySlot,
}

impl Subscriptions {
    #[must_use]
    pub fn get(&self, slot: Slot, committee_index: CommitteeIndex) -> Option<&Subscription> {
        self.by_slot.get(&slot)?.get(&committee_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, CommitteeIndex, &Subscription)> {
        self.by_slot.iter().flat_map(|(slot, committees)| {
            committees
                .iter()
                .map(|(committee_index, subscription)| (*slot, *committee_index, subscription))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_slot.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn aggregator_count(&self) -> usize {
        self.iter()
            .filter(|(_, _, subscription)| subscription.is_aggregator)
            .count()
    }

    #[must_use]
    pub fn beacon_committee_subscriptions(&self) -> Vec<BeaconCommitteeSubscription> {
        self.iter()
            .map(|(slot, committee_index, subscription)| {
                let Subscription {
                    validator_index,
                    validator_public_key,
                    committee_size,
                    is_aggregator,
                    selection_proof,
                } = *subscription;

                BeaconCommitteeSubscription {
                    slot,
                    committee_index,
                    committee_size,
                    validator_index,
                    validator_public_key,
                    is_aggregator,
                    selection_proof,
                }
            })
            .collect()
    }
}
