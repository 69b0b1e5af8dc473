use anyhow::Result;
use async_trait::async_trait;
use types::phase0::primitives::{PublicKeyBytes, ValidatorIndex};

#[async_trait]
pub trait ValidatorIndexProvider: Send + Sync {
    async fn index(&self) -> Result<ValidatorIndex>;
}

#[async_trait]
pub trait PublicKeyProvider: Send + Sync {
    async fn public_key(&self) -> Result<PublicKeyBytes>;
}

/// An account that can be looked up both by index and by public key.
pub trait ValidatingAccount: ValidatorIndexProvider + PublicKeyProvider {}

impl<A: ValidatorIndexProvider + PublicKeyProvider + ?Sized> ValidatingAccount for A {}
