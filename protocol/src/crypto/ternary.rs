//! # Balanced Ternary Primitives
//!
//! The Tangle speaks ternary. A *trit* is one of `-1`, `0`, `1`; three trits
//! make a *tryte*, written as one character of the alphabet
//! `9ABCDEFGHIJKLMNOPQRSTUVWXYZ`. `9` is zero, `A`..`M` are 1..13 and
//! `N`..`Z` are -13..-1.
//!
//! Trits are stored little-endian: `trits[0]` is the least significant
//! digit. Every conversion here is total over valid input and returns a
//! [`TernaryError`] otherwise.

use thiserror::Error;

/// A single balanced ternary digit.
pub type Trit = i8;

/// Tryte alphabet, indexed by unbalanced tryte value (0..27).
pub const TRYTE_ALPHABET: &[u8; 27] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of trits in one tryte.
pub const TRITS_PER_TRYTE: usize = 3;

/// Errors raised by ternary conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TernaryError {
    /// A character outside the tryte alphabet was encountered.
    #[error("invalid tryte character {0:?}")]
    InvalidTryte(char),

    /// A trit value outside `-1..=1`.
    #[error("invalid trit value {0}")]
    InvalidTrit(i8),

    /// The trit slice length is not a multiple of three.
    #[error("trit length {0} is not a multiple of 3")]
    UnalignedTrits(usize),

    /// Sponge input or output is not a whole number of 243-trit blocks.
    #[error("trit length {0} is not a multiple of the 243-trit hash length")]
    UnalignedHash(usize),

    /// An integer does not fit in the requested number of trits.
    #[error("value {value} does not fit in {trits} trits")]
    Overflow {
        /// The value that was being encoded.
        value: i64,
        /// The requested width.
        trits: usize,
    },

    /// A string of trytes has the wrong length for its field.
    #[error("expected {expected} trytes, got {got}")]
    Length {
        /// Required tryte count.
        expected: usize,
        /// Actual tryte count.
        got: usize,
    },
}

/// Balanced value of the tryte character `c`, in `-13..=13`.
pub fn tryte_value(c: char) -> Result<i8, TernaryError> {
    match c {
        '9' => Ok(0),
        'A'..='M' => Ok(c as i8 - b'A' as i8 + 1),
        'N'..='Z' => Ok(c as i8 - b'N' as i8 - 13),
        _ => Err(TernaryError::InvalidTryte(c)),
    }
}

/// Character for a balanced tryte value in `-13..=13`.
pub fn tryte_char(value: i8) -> Result<char, TernaryError> {
    if !(-13..=13).contains(&value) {
        return Err(TernaryError::Overflow {
            value: value as i64,
            trits: TRITS_PER_TRYTE,
        });
    }
    let index = if value < 0 { value + 27 } else { value };
    Ok(TRYTE_ALPHABET[index as usize] as char)
}

/// Returns `true` if every character of `s` is in the tryte alphabet.
pub fn is_trytes(s: &str) -> bool {
    s.bytes().all(|b| b == b'9' || b.is_ascii_uppercase())
}

/// Returns `true` if `s` is exactly `len` valid trytes.
pub fn is_trytes_of_len(s: &str, len: usize) -> bool {
    s.len() == len && is_trytes(s)
}

/// Expand a tryte string into trits (three per tryte).
pub fn trytes_to_trits(trytes: &str) -> Result<Vec<Trit>, TernaryError> {
    let mut trits = Vec::with_capacity(trytes.len() * TRITS_PER_TRYTE);
    for c in trytes.chars() {
        let mut v = tryte_value(c)?;
        for _ in 0..TRITS_PER_TRYTE {
            let (trit, rest) = split_balanced(v as i64);
            trits.push(trit);
            v = rest as i8;
        }
    }
    Ok(trits)
}

/// Collapse trits into a tryte string. The length must be a multiple of 3.
pub fn trits_to_trytes(trits: &[Trit]) -> Result<String, TernaryError> {
    if trits.len() % TRITS_PER_TRYTE != 0 {
        return Err(TernaryError::UnalignedTrits(trits.len()));
    }
    let mut out = String::with_capacity(trits.len() / TRITS_PER_TRYTE);
    for chunk in trits.chunks(TRITS_PER_TRYTE) {
        for &t in chunk {
            if !(-1..=1).contains(&t) {
                return Err(TernaryError::InvalidTrit(t));
            }
        }
        let value = chunk[0] + 3 * chunk[1] + 9 * chunk[2];
        out.push(tryte_char(value)?);
    }
    Ok(out)
}

/// Encode `value` as exactly `len` balanced trits.
pub fn int_to_trits(value: i64, len: usize) -> Result<Vec<Trit>, TernaryError> {
    let mut trits = vec![0; len];
    let mut rest = value;
    for slot in trits.iter_mut() {
        if rest == 0 {
            break;
        }
        let (trit, next) = split_balanced(rest);
        *slot = trit;
        rest = next;
    }
    if rest != 0 {
        return Err(TernaryError::Overflow { value, trits: len });
    }
    Ok(trits)
}

/// Decode balanced trits into an integer.
///
/// Callers are expected to pass at most 39 trits; wider fields on the
/// Tangle (the 81-trit value field) never carry more than that in practice.
pub fn trits_to_int(trits: &[Trit]) -> i64 {
    trits
        .iter()
        .rev()
        .fold(0i64, |acc, &t| acc.wrapping_mul(3).wrapping_add(t as i64))
}

/// Encode `value` as `len` trytes.
pub fn int_to_trytes(value: i64, len: usize) -> Result<String, TernaryError> {
    trits_to_trytes(&int_to_trits(value, len * TRITS_PER_TRYTE)?)
}

/// Add `value` into `trits` in place, discarding any carry out of the top.
pub fn add_assign(trits: &mut [Trit], value: i64) {
    let mut carry = value;
    for slot in trits.iter_mut() {
        if carry == 0 {
            return;
        }
        let (trit, next) = split_balanced(*slot as i64 + carry);
        *slot = trit;
        carry = next;
    }
}

/// Split `v` into its least significant balanced trit and the remaining
/// quotient, so that `v == trit + 3 * rest`.
fn split_balanced(v: i64) -> (Trit, i64) {
    let mut rem = v.rem_euclid(3);
    let mut quot = v.div_euclid(3);
    if rem == 2 {
        rem = -1;
        quot += 1;
    }
    (rem as Trit, quot)
}

/// Right-pad `trytes` with `9` up to `len` characters.
pub fn pad_trytes(trytes: &str, len: usize) -> String {
    let mut out = String::with_capacity(len.max(trytes.len()));
    out.push_str(trytes);
    while out.len() < len {
        out.push('9');
    }
    out
}
