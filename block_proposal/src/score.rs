use core::num::NonZeroU64;

use types::phase0::{containers::BeaconBlock, primitives::Slot};

// Slashing reward is at most MAX_EFFECTIVE_BALANCE / WHISTLEBLOWER_REWARD_QUOTIENT (0.0625 ETH).
// A single attestation is worth around 90,000 Gwei at 16K validators,
// so one slashing weighs about as much as 700 attestations.
pub const SLASHING_WEIGHT: f64 = 700.0;

/// Expected proposer reward of a block, split by source.
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct ProposalScore {
    /// Part of `attestations` contributed by attestations from the previous slot.
    /// Not counted separately in the total.
    pub immediate_attestations: f64,
    pub attestations: f64,
    pub proposer_slashings: f64,
    pub attester_slashings: f64,
}

impl ProposalScore {
    #[must_use]
    #[expect(clippy::float_arithmetic)]
    pub fn total(&self) -> f64 {
        self.attestations + self.proposer_slashings + self.attester_slashings
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ProposalScorer {
    slashing_weight: f64,
}

impl Default for ProposalScorer {
    fn default() -> Self {
        Self::new(SLASHING_WEIGHT)
    }
}

impl ProposalScorer {
    #[must_use]
    pub const fn new(slashing_weight: f64) -> Self {
        Self { slashing_weight }
    }

    #[must_use]
    pub fn score(&self, slot: Slot, proposal: &BeaconBlock) -> f64 {
        self.breakdown(slot, proposal).total()
    }

    /// Attestations that are not strictly older than `slot` contribute nothing.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    #[expect(clippy::float_arithmetic)]
    pub fn breakdown(&self, slot: Slot, proposal: &BeaconBlock) -> ProposalScore {
        let body = &proposal.body;

        let mut immediate_attestations = 0.0;
        let mut attestations = 0.0;

        for attestation in &body.attestations {
            let Some(inclusion_distance) = slot
                .checked_sub(attestation.data.slot)
                .and_then(NonZeroU64::new)
            else {
                continue;
            };

            let contribution =
                attestation.participant_count() as f64 / inclusion_distance.get() as f64;

            attestations += contribution;

            if inclusion_distance.get() == 1 {
                immediate_attestations += contribution;
            }
        }

        ProposalScore {
            immediate_attestations,
            attestations,
            proposer_slashings: body.proposer_slashings.len() as f64 * self.slashing_weight,
            attester_slashings: body.attester_slashings.len() as f64 * self.slashing_weight,
        }
    }
}
