//! Curl-P-81, the ternary sponge that produces Tangle transaction hashes.

use super::ternary::{TernaryError, Trit};

/// Trits per Curl block.
pub const HASH_LENGTH: usize = 243;

const STATE_LENGTH: usize = 3 * HASH_LENGTH;
const ROUNDS: usize = 81;
const TRUTH_TABLE: [Trit; 11] = [1, 0, -1, 2, 1, -1, 0, 2, -1, 1, 0];

/// Curl-P sponge with 81 rounds.
#[derive(Clone)]
pub struct Curl {
    state: [Trit; STATE_LENGTH],
}

impl Default for Curl {
    fn default() -> Self {
        Self {
            state: [0; STATE_LENGTH],
        }
    }
}

impl Curl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.state = [0; STATE_LENGTH];
    }

    pub fn absorb(&mut self, trits: &[Trit]) -> Result<(), TernaryError> {
        if trits.len() % HASH_LENGTH != 0 {
            return Err(TernaryError::UnalignedHash(trits.len()));
        }
        for chunk in trits.chunks(HASH_LENGTH) {
            self.state[..HASH_LENGTH].copy_from_slice(chunk);
            self.transform();
        }
        Ok(())
    }

    pub fn squeeze(&mut self, len: usize) -> Result<Vec<Trit>, TernaryError> {
        if len == 0 || len % HASH_LENGTH != 0 {
            return Err(TernaryError::UnalignedHash(len));
        }
        let mut out = Vec::with_capacity(len);
        for _ in 0..len / HASH_LENGTH {
            out.extend_from_slice(&self.state[..HASH_LENGTH]);
            self.transform();
        }
        Ok(out)
    }

    /// One-shot hash of `trits` into a single 243-trit block.
    pub fn digest(trits: &[Trit]) -> Result<Vec<Trit>, TernaryError> {
        let mut curl = Self::new();
        curl.absorb(trits)?;
        curl.squeeze(HASH_LENGTH)
    }

    fn transform(&mut self) {
        let mut scratch = [0 as Trit; STATE_LENGTH];
        for _ in 0..ROUNDS {
            scratch.copy_from_slice(&self.state);
            let mut index = 0usize;
            for slot in self.state.iter_mut() {
                let a = scratch[index];
                index = if index < 365 { index + 364 } else { index - 365 };
                let b = scratch[index];
                *slot = TRUTH_TABLE[(a + (b << 2) + 5) as usize];
            }
        }
    }
}
