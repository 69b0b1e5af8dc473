use fixed_hash::construct_fixed_hash;

pub use ethereum_types::H256;

pub type CommitteeIndex = u64;
pub type Epoch = u64;
pub type Slot = u64;
pub type ValidatorIndex = u64;

construct_fixed_hash! {
    /// Compressed BLS public key. Not validated.
    pub struct PublicKeyBytes(48);
}

construct_fixed_hash! {
    /// Compressed BLS signature. Not validated.
    pub struct SignatureBytes(96);
}
