//! # Kerl
//!
//! Keccak-384 wearing a ternary coat. Kerl absorbs and squeezes 243-trit
//! blocks; each block is mapped to a 384-bit two's-complement integer
//! (big-endian bytes) before it touches the Keccak state, and each 48-byte
//! digest is mapped back to 243 trits on the way out.
//!
//! The 243rd trit of every block is forced to zero in both directions: 242
//! balanced trits are what fit in 384 signed bits. Out-of-range digests wrap
//! modulo 3^242.
//!
//! After every squeezed block the sponge is reset and re-seeded with the
//! bitwise complement of the digest, which is what makes multi-block
//! squeezes (key generation) produce fresh output.

use sha3::{Digest, Keccak384};

use super::ternary::{TernaryError, Trit};

/// Trits per Kerl block.
pub const HASH_LENGTH: usize = 243;

/// Bytes per Keccak-384 digest.
const BYTE_LENGTH: usize = 48;

/// 32-bit words in a 384-bit integer.
const WORD_LENGTH: usize = 12;

/// The Kerl sponge.
#[derive(Clone, Default)]
pub struct Kerl {
    keccak: Keccak384,
}

impl Kerl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the sponge state.
    pub fn reset(&mut self) {
        self.keccak = Keccak384::new();
    }

    /// Absorb whole 243-trit blocks.
    pub fn absorb(&mut self, trits: &[Trit]) -> Result<(), TernaryError> {
        if trits.len() % HASH_LENGTH != 0 {
            return Err(TernaryError::UnalignedHash(trits.len()));
        }
        for chunk in trits.chunks(HASH_LENGTH) {
            let mut block = [0 as Trit; HASH_LENGTH];
            block.copy_from_slice(chunk);
            block[HASH_LENGTH - 1] = 0;
            self.keccak.update(trits_to_bytes(&block));
        }
        Ok(())
    }

    /// Squeeze `len` trits, a multiple of 243.
    pub fn squeeze(&mut self, len: usize) -> Result<Vec<Trit>, TernaryError> {
        if len == 0 || len % HASH_LENGTH != 0 {
            return Err(TernaryError::UnalignedHash(len));
        }
        let mut out = Vec::with_capacity(len);
        for _ in 0..len / HASH_LENGTH {
            let digest = self.keccak.finalize_reset();
            let mut bytes = [0u8; BYTE_LENGTH];
            bytes.copy_from_slice(&digest);
            out.extend_from_slice(&bytes_to_trits(&bytes));

            for b in bytes.iter_mut() {
                *b = !*b;
            }
            self.keccak.update(bytes);
        }
        Ok(out)
    }

    /// One-shot: absorb `trits` into a fresh sponge and squeeze one block.
    pub fn digest(trits: &[Trit]) -> Result<Vec<Trit>, TernaryError> {
        let mut kerl = Self::new();
        kerl.absorb(trits)?;
        kerl.squeeze(HASH_LENGTH)
    }
}

/// Map one 243-trit block to 48 big-endian two's-complement bytes.
/// The last trit is ignored.
pub fn trits_to_bytes(trits: &[Trit; HASH_LENGTH]) -> [u8; BYTE_LENGTH] {
    let mut words = [0u32; WORD_LENGTH];
    for &t in trits[..HASH_LENGTH - 1].iter().rev() {
        mul3(&mut words);
        match t {
            1 => increment(&mut words),
            -1 => decrement(&mut words),
            _ => {}
        }
    }

    let mut bytes = [0u8; BYTE_LENGTH];
    for (i, word) in words.iter().rev().enumerate() {
        bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
    }
    bytes
}

/// Map 48 big-endian two's-complement bytes to one 243-trit block.
pub fn bytes_to_trits(bytes: &[u8; BYTE_LENGTH]) -> [Trit; HASH_LENGTH] {
    let mut words = [0u32; WORD_LENGTH];
    for (i, chunk) in bytes.chunks(4).enumerate() {
        words[WORD_LENGTH - 1 - i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let negative = words[WORD_LENGTH - 1] >> 31 == 1;
    if negative {
        negate(&mut words);
    }

    let mut trits = [0 as Trit; HASH_LENGTH];
    for slot in trits[..HASH_LENGTH - 1].iter_mut() {
        let trit = match divmod3(&mut words) {
            0 => 0,
            1 => 1,
            _ => {
                increment(&mut words);
                -1
            }
        };
        *slot = if negative { -trit } else { trit };
    }
    trits
}

fn mul3(words: &mut [u32; WORD_LENGTH]) {
    let mut carry = 0u64;
    for w in words.iter_mut() {
        let v = *w as u64 * 3 + carry;
        *w = v as u32;
        carry = v >> 32;
    }
}

fn increment(words: &mut [u32; WORD_LENGTH]) {
    for w in words.iter_mut() {
        let (v, overflow) = w.overflowing_add(1);
        *w = v;
        if !overflow {
            return;
        }
    }
}

fn decrement(words: &mut [u32; WORD_LENGTH]) {
    for w in words.iter_mut() {
        let (v, borrow) = w.overflowing_sub(1);
        *w = v;
        if !borrow {
            return;
        }
    }
}

fn negate(words: &mut [u32; WORD_LENGTH]) {
    for w in words.iter_mut() {
        *w = !*w;
    }
    increment(words);
}

/// Divide the unsigned integer in place by 3, returning the remainder.
fn divmod3(words: &mut [u32; WORD_LENGTH]) -> u64 {
    let mut rem = 0u64;
    for w in words.iter_mut().rev() {
        let cur = (rem << 32) | *w as u64;
        *w = (cur / 3) as u32;
        rem = cur % 3;
    }
    rem
}
