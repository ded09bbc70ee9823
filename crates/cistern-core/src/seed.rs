//! Deterministic drop identifier derivation
//!
//! Each drop id is drawn from SHA-256 over the decimal renderings of the
//! batch index, the salted sequence number, and the caller-supplied entropy:
//!
//! ```text
//!   preimage = dec(index) || dec(sequence + index) || entropy
//!   id       = u64::from_le_bytes(sha256(preimage)[0..8])
//! ```
//!
//! The global sequence number decorrelates batches that reuse entropy; the
//! batch index decorrelates drops within one batch. The preimage layout and
//! the little-endian byte order are a compatibility surface and must not
//! change.

use sha2::{Digest, Sha256};

use crate::types::DropId;

/// Derive the id of the `index`-th drop of a batch begun at `sequence`
pub fn derive_drop_id(index: u32, sequence: u64, entropy: &str) -> DropId {
    let preimage = format!("{}{}{}", index, sequence + u64::from(index), entropy);
    let digest = Sha256::digest(preimage.as_bytes());
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest[..8]);
    DropId::new(u64::from_le_bytes(word))
}

/// Derive all ids of a batch of `amount` drops
pub fn derive_batch(amount: u32, sequence: u64, entropy: &str) -> Vec<DropId> {
    (0..amount)
        .map(|index| derive_drop_id(index, sequence, entropy))
        .collect()
}
