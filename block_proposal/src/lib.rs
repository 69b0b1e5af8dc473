pub use crate::{
    best_block_proposal::BestBlockProposal,
    config::{Config as BlockProposalConfig, DEFAULT_PROCESS_CONCURRENCY, DEFAULT_TIMEOUT},
    error::Error,
    score::{ProposalScore, ProposalScorer, SLASHING_WEIGHT},
};

mod best_block_proposal;
mod config;
mod error;
mod score;
