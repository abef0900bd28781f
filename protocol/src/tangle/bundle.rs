//! Bundle construction for zero-value transfers.
//!
//! A transfer whose message does not fit in one 2187-tryte fragment spills
//! over into further transactions. Once every transaction is laid out the
//! bundle hash is computed with Kerl over the essences; if the normalized
//! hash contains a 13 (`M`), the obsolete tag of the first transaction is
//! incremented and the hash recomputed, since such a bundle hash would leak
//! key material were it ever signed.

use crate::config::{HASH_LENGTH_TRYTES, MESSAGE_FRAGMENT_TRYTES, TAG_LENGTH_TRYTES};
use crate::crypto::kerl::{Kerl, HASH_LENGTH};
use crate::crypto::ternary;

use super::address::seed_to_trits;
use super::error::LedgerError;
use super::transaction::{null_hash, Transaction, NONCE_TRYTES};

/// Trytes per normalization chunk.
const NORMALIZE_CHUNK: usize = 27;

/// One requested transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// 81-tryte receive address.
    pub address: String,
    pub value: i64,
    /// Message trytes, any length.
    pub message: String,
    /// Up to 27 trytes, padded with `9`.
    pub tag: String,
}

impl Transfer {
    /// A zero-value transfer carrying `message` to `address`.
    pub fn zero_value(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            value: 0,
            message: message.into(),
            tag: String::new(),
        }
    }
}

/// Lay out, hash and serialize a bundle of zero-value transfers.
///
/// `seed` is validated but never used to sign: zero-value bundles have no
/// inputs. Returns the transaction trytes head first, the order in which
/// they are handed to `attachToTangle`.
pub fn prepare_transfers(
    seed: &str,
    transfers: &[Transfer],
    timestamp: u64,
) -> Result<Vec<String>, LedgerError> {
    seed_to_trits(seed)?;
    if transfers.is_empty() {
        return Err(LedgerError::EmptyBundle);
    }

    let mut transactions = Vec::new();
    for transfer in transfers {
        validate_transfer(transfer)?;
        let tag = ternary::pad_trytes(&transfer.tag, TAG_LENGTH_TRYTES);

        let fragments = split_message(&transfer.message);
        for (i, fragment) in fragments.into_iter().enumerate() {
            transactions.push(Transaction {
                hash: String::new(),
                signature_message_fragment: fragment,
                address: transfer.address.clone(),
                value: if i == 0 { transfer.value } else { 0 },
                obsolete_tag: tag.clone(),
                timestamp,
                current_index: 0,
                last_index: 0,
                bundle: null_hash(),
                trunk_transaction: null_hash(),
                branch_transaction: null_hash(),
                tag: tag.clone(),
                attachment_timestamp: 0,
                attachment_timestamp_lower_bound: 0,
                attachment_timestamp_upper_bound: 0,
                nonce: "9".repeat(NONCE_TRYTES),
            });
        }
    }

    let last_index = (transactions.len() - 1) as u64;
    for (i, tx) in transactions.iter_mut().enumerate() {
        tx.current_index = i as u64;
        tx.last_index = last_index;
    }

    let bundle_hash = finalize(&mut transactions)?;
    tracing::debug!(
        bundle = %bundle_hash,
        transactions = transactions.len(),
        "bundle prepared"
    );

    transactions
        .iter()
        .rev()
        .map(Transaction::to_trytes)
        .collect()
}

/// Compute the bundle hash, bumping the first obsolete tag until the
/// normalized hash is free of `M`, and write it into every transaction.
pub fn finalize(transactions: &mut [Transaction]) -> Result<String, LedgerError> {
    if transactions.is_empty() {
        return Err(LedgerError::EmptyBundle);
    }

    loop {
        let mut kerl = Kerl::new();
        for tx in transactions.iter() {
            kerl.absorb(&tx.essence_trits()?)?;
        }
        let hash = ternary::trits_to_trytes(&kerl.squeeze(HASH_LENGTH)?)?;

        if normalized_bundle(&hash)?.contains(&13) {
            let mut tag = ternary::trytes_to_trits(&transactions[0].obsolete_tag)?;
            ternary::add_assign(&mut tag, 1);
            transactions[0].obsolete_tag = ternary::trits_to_trytes(&tag)?;
            continue;
        }

        for tx in transactions.iter_mut() {
            tx.bundle = hash.clone();
        }
        return Ok(hash);
    }
}

/// Normalize a bundle hash: each 27-tryte chunk is shifted, one tryte at a
/// time, until its balanced values sum to zero.
pub fn normalized_bundle(hash: &str) -> Result<Vec<i8>, LedgerError> {
    if !ternary::is_trytes_of_len(hash, HASH_LENGTH_TRYTES) {
        return Err(LedgerError::InvalidTransaction(
            "bundle hash must be 81 trytes".into(),
        ));
    }

    let mut values = hash
        .chars()
        .map(ternary::tryte_value)
        .collect::<Result<Vec<i8>, _>>()?;

    for chunk in values.chunks_mut(NORMALIZE_CHUNK) {
        let mut sum: i32 = chunk.iter().map(|&v| v as i32).sum();
        if sum > 0 {
            for v in chunk.iter_mut() {
                while sum > 0 && *v > -13 {
                    *v -= 1;
                    sum -= 1;
                }
                if sum == 0 {
                    break;
                }
            }
        } else {
            for v in chunk.iter_mut() {
                while sum < 0 && *v < 13 {
                    *v += 1;
                    sum += 1;
                }
                if sum == 0 {
                    break;
                }
            }
        }
    }
    Ok(values)
}

fn validate_transfer(transfer: &Transfer) -> Result<(), LedgerError> {
    if transfer.value != 0 {
        return Err(LedgerError::ValueTransfer);
    }
    if !ternary::is_trytes_of_len(&transfer.address, HASH_LENGTH_TRYTES) {
        return Err(LedgerError::InvalidAddress(format!(
            "expected {} trytes",
            HASH_LENGTH_TRYTES
        )));
    }
    if transfer.tag.len() > TAG_LENGTH_TRYTES || !ternary::is_trytes(&transfer.tag) {
        return Err(LedgerError::InvalidTag(format!(
            "expected at most {} trytes",
            TAG_LENGTH_TRYTES
        )));
    }
    if !ternary::is_trytes(&transfer.message) {
        return Err(LedgerError::InvalidMessage);
    }
    Ok(())
}

/// Split a message into padded 2187-tryte fragments; an empty message still
/// yields one fragment.
fn split_message(message: &str) -> Vec<String> {
    if message.is_empty() {
        return vec![ternary::pad_trytes("", MESSAGE_FRAGMENT_TRYTES)];
    }
    message
        .as_bytes()
        .chunks(MESSAGE_FRAGMENT_TRYTES)
        .map(|chunk| {
            // Validated as trytes, so every chunk is ASCII.
            let text = String::from_utf8_lossy(chunk);
            ternary::pad_trytes(&text, MESSAGE_FRAGMENT_TRYTES)
        })
        .collect()
}
