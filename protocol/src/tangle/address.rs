//! Seed to address derivation.
//!
//! ```text
//! seed ──(+index)──► subseed ──Kerl──► private key (security × 27 × 243 trits)
//!                                           │
//!                 each 243-trit segment hashed 26 times, each fragment Kerl'd
//!                                           ▼
//!                                       digests ──Kerl──► address
//! ```
//!
//! Only the address is ever returned; the key material is dropped as soon
//! as the digests are computed.

use crate::config::{HASH_LENGTH_TRYTES, SEED_LENGTH_TRYTES};
use crate::crypto::kerl::{Kerl, HASH_LENGTH};
use crate::crypto::ternary::{self, Trit};

use super::error::LedgerError;

/// 243-trit segments per key fragment.
const SEGMENTS_PER_FRAGMENT: usize = 27;

/// Trits per key fragment (one per security level).
const FRAGMENT_LENGTH: usize = SEGMENTS_PER_FRAGMENT * HASH_LENGTH;

/// Hash rounds applied to each key segment.
const SEGMENT_ROUNDS: usize = 26;

/// Derive the address at `index` for `seed`, as 81 trytes without checksum.
pub fn generate_address(seed: &str, index: u64, security: u8) -> Result<String, LedgerError> {
    if !(1..=3).contains(&security) {
        return Err(LedgerError::InvalidSecurity(security));
    }
    let seed_trits = seed_to_trits(seed)?;
    let subseed = subseed(&seed_trits, index)?;
    let key = key(&subseed, security)?;
    let digests = digests(&key)?;
    let address = Kerl::digest(&digests)?;
    Ok(ternary::trits_to_trytes(&address)?)
}

/// Validate a seed and expand it to 243 trits, right-padding with `9`.
pub fn seed_to_trits(seed: &str) -> Result<Vec<Trit>, LedgerError> {
    if seed.is_empty() || seed.len() > SEED_LENGTH_TRYTES || !ternary::is_trytes(seed) {
        return Err(LedgerError::InvalidSeed(format!(
            "expected 1 to {} trytes",
            SEED_LENGTH_TRYTES
        )));
    }
    Ok(ternary::trytes_to_trits(&ternary::pad_trytes(
        seed,
        HASH_LENGTH_TRYTES,
    ))?)
}

fn subseed(seed: &[Trit], index: u64) -> Result<Vec<Trit>, LedgerError> {
    let mut trits = seed.to_vec();
    ternary::add_assign(&mut trits, index as i64);
    Ok(Kerl::digest(&trits)?)
}

fn key(subseed: &[Trit], security: u8) -> Result<Vec<Trit>, LedgerError> {
    let mut kerl = Kerl::new();
    kerl.absorb(subseed)?;
    Ok(kerl.squeeze(security as usize * FRAGMENT_LENGTH)?)
}

fn digests(key: &[Trit]) -> Result<Vec<Trit>, LedgerError> {
    let mut out = Vec::with_capacity(key.len() / SEGMENTS_PER_FRAGMENT);
    for fragment in key.chunks(FRAGMENT_LENGTH) {
        let mut hashed = Vec::with_capacity(FRAGMENT_LENGTH);
        for segment in fragment.chunks(HASH_LENGTH) {
            let mut buffer = segment.to_vec();
            for _ in 0..SEGMENT_ROUNDS {
                buffer = Kerl::digest(&buffer)?;
            }
            hashed.extend_from_slice(&buffer);
        }
        out.extend_from_slice(&Kerl::digest(&hashed)?);
    }
    Ok(out)
}
