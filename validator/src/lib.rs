pub use crate::{
    accounts::{PublicKeyProvider, ValidatingAccount, ValidatorIndexProvider},
    aggregator::{AggregatorStatus, AttestationAggregator, IsAggregatorProvider},
    attester_duties::{merge_duties, Duty},
    beacon_committee_subscriber::BeaconCommitteeSubscriber,
    config::{SubscriberConfig, DEFAULT_PROCESS_CONCURRENCY},
    error::{Error, MergeError},
    subscription_map::{Subscription, SubscriptionMap, Subscriptions},
};

mod accounts;
mod aggregator;
mod attester_duties;
mod beacon_committee_subscriber;
mod config;
mod error;
mod subscription_map;
