//! Transaction wire format.
//!
//! A transaction is 2673 trytes with fixed field offsets:
//!
//! | Field                         | Trytes |
//! |-------------------------------|--------|
//! | signature / message fragment  | 2187   |
//! | address                       | 81     |
//! | value                         | 27     |
//! | obsolete tag                  | 27     |
//! | timestamp                     | 9      |
//! | current index                 | 9      |
//! | last index                    | 9      |
//! | bundle                        | 81     |
//! | trunk transaction             | 81     |
//! | branch transaction            | 81     |
//! | tag                           | 27     |
//! | attachment timestamp          | 9      |
//! | attachment lower bound        | 9      |
//! | attachment upper bound        | 9      |
//! | nonce                         | 27     |
//!
//! The transaction hash is Curl-P-81 over all 8019 trits.

use serde::{Deserialize, Serialize};

use crate::config::{
    HASH_LENGTH_TRYTES, MESSAGE_FRAGMENT_TRYTES, TAG_LENGTH_TRYTES, TRANSACTION_LENGTH_TRYTES,
};
use crate::crypto::curl::Curl;
use crate::crypto::ternary::{self, Trit, TRITS_PER_TRYTE};

use super::error::LedgerError;

const VALUE_TRYTES: usize = 27;
const SHORT_FIELD_TRYTES: usize = 9;
pub const NONCE_TRYTES: usize = 27;

/// Value and obsolete tag both occupy 81 trits, but only the first 33 of
/// the value field are significant.
const VALUE_SIGNIFICANT_TRITS: usize = 33;

/// A transaction hash of all nines: the null hash.
pub fn null_hash() -> String {
    "9".repeat(HASH_LENGTH_TRYTES)
}

/// One Tangle transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Curl hash of the serialized transaction. Empty until attached.
    pub hash: String,
    pub signature_message_fragment: String,
    pub address: String,
    pub value: i64,
    pub obsolete_tag: String,
    pub timestamp: u64,
    pub current_index: u64,
    pub last_index: u64,
    pub bundle: String,
    pub trunk_transaction: String,
    pub branch_transaction: String,
    pub tag: String,
    pub attachment_timestamp: i64,
    pub attachment_timestamp_lower_bound: i64,
    pub attachment_timestamp_upper_bound: i64,
    pub nonce: String,
}

impl Transaction {
    /// Serialize to 2673 trytes.
    pub fn to_trytes(&self) -> Result<String, LedgerError> {
        let mut out = String::with_capacity(TRANSACTION_LENGTH_TRYTES);
        push_field(
            &mut out,
            &self.signature_message_fragment,
            MESSAGE_FRAGMENT_TRYTES,
            "signatureMessageFragment",
        )?;
        push_field(&mut out, &self.address, HASH_LENGTH_TRYTES, "address")?;
        out.push_str(&ternary::int_to_trytes(self.value, VALUE_TRYTES)?);
        push_field(&mut out, &self.obsolete_tag, TAG_LENGTH_TRYTES, "obsoleteTag")?;
        for field in [self.timestamp, self.current_index, self.last_index] {
            out.push_str(&ternary::int_to_trytes(field as i64, SHORT_FIELD_TRYTES)?);
        }
        push_field(&mut out, &self.bundle, HASH_LENGTH_TRYTES, "bundle")?;
        push_field(&mut out, &self.trunk_transaction, HASH_LENGTH_TRYTES, "trunkTransaction")?;
        push_field(&mut out, &self.branch_transaction, HASH_LENGTH_TRYTES, "branchTransaction")?;
        push_field(&mut out, &self.tag, TAG_LENGTH_TRYTES, "tag")?;
        for field in [
            self.attachment_timestamp,
            self.attachment_timestamp_lower_bound,
            self.attachment_timestamp_upper_bound,
        ] {
            out.push_str(&ternary::int_to_trytes(field, SHORT_FIELD_TRYTES)?);
        }
        push_field(&mut out, &self.nonce, NONCE_TRYTES, "nonce")?;
        Ok(out)
    }

    /// Parse 2673 trytes and compute the transaction hash.
    pub fn from_trytes(trytes: &str) -> Result<Self, LedgerError> {
        if !ternary::is_trytes_of_len(trytes, TRANSACTION_LENGTH_TRYTES) {
            return Err(LedgerError::InvalidTransaction(format!(
                "expected {} trytes, got {} characters",
                TRANSACTION_LENGTH_TRYTES,
                trytes.len()
            )));
        }

        let mut cursor = Cursor { trytes, offset: 0 };
        let signature_message_fragment = cursor.take(MESSAGE_FRAGMENT_TRYTES).to_string();
        let address = cursor.take(HASH_LENGTH_TRYTES).to_string();
        let value = cursor.int_limited(VALUE_TRYTES, VALUE_SIGNIFICANT_TRITS)?;
        let obsolete_tag = cursor.take(TAG_LENGTH_TRYTES).to_string();
        let timestamp = cursor.int(SHORT_FIELD_TRYTES)?;
        let current_index = cursor.int(SHORT_FIELD_TRYTES)?;
        let last_index = cursor.int(SHORT_FIELD_TRYTES)?;
        let bundle = cursor.take(HASH_LENGTH_TRYTES).to_string();
        let trunk_transaction = cursor.take(HASH_LENGTH_TRYTES).to_string();
        let branch_transaction = cursor.take(HASH_LENGTH_TRYTES).to_string();
        let tag = cursor.take(TAG_LENGTH_TRYTES).to_string();
        let attachment_timestamp = cursor.int(SHORT_FIELD_TRYTES)?;
        let attachment_timestamp_lower_bound = cursor.int(SHORT_FIELD_TRYTES)?;
        let attachment_timestamp_upper_bound = cursor.int(SHORT_FIELD_TRYTES)?;
        let nonce = cursor.take(NONCE_TRYTES).to_string();

        Ok(Self {
            hash: transaction_hash(trytes)?,
            signature_message_fragment,
            address,
            value,
            obsolete_tag,
            timestamp: non_negative(timestamp, "timestamp")?,
            current_index: non_negative(current_index, "currentIndex")?,
            last_index: non_negative(last_index, "lastIndex")?,
            bundle,
            trunk_transaction,
            branch_transaction,
            tag,
            attachment_timestamp,
            attachment_timestamp_lower_bound,
            attachment_timestamp_upper_bound,
            nonce,
        })
    }

    /// The 486 trits that feed the bundle hash: address, value, obsolete
    /// tag, timestamp, current index and last index.
    pub fn essence_trits(&self) -> Result<Vec<Trit>, LedgerError> {
        let mut essence = Vec::with_capacity(162 * TRITS_PER_TRYTE);
        essence.extend(ternary::trytes_to_trits(&self.address)?);
        essence.extend(ternary::int_to_trits(self.value, VALUE_TRYTES * TRITS_PER_TRYTE)?);
        essence.extend(ternary::trytes_to_trits(&self.obsolete_tag)?);
        for field in [self.timestamp, self.current_index, self.last_index] {
            essence.extend(ternary::int_to_trits(
                field as i64,
                SHORT_FIELD_TRYTES * TRITS_PER_TRYTE,
            )?);
        }
        Ok(essence)
    }

    /// The tail is the first transaction of its bundle.
    pub fn is_tail(&self) -> bool {
        self.current_index == 0
    }
}

/// Curl-P-81 hash of a serialized transaction.
pub fn transaction_hash(trytes: &str) -> Result<String, LedgerError> {
    let trits = ternary::trytes_to_trits(trytes)?;
    Ok(ternary::trits_to_trytes(&Curl::digest(&trits)?)?)
}

fn push_field(out: &mut String, value: &str, len: usize, name: &str) -> Result<(), LedgerError> {
    if !ternary::is_trytes_of_len(value, len) {
        return Err(LedgerError::InvalidTransaction(format!(
            "{} must be {} trytes",
            name, len
        )));
    }
    out.push_str(value);
    Ok(())
}

fn non_negative(value: i64, name: &str) -> Result<u64, LedgerError> {
    u64::try_from(value)
        .map_err(|_| LedgerError::InvalidTransaction(format!("{} is negative", name)))
}

struct Cursor<'a> {
    trytes: &'a str,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> &'a str {
        let field = &self.trytes[self.offset..self.offset + len];
        self.offset += len;
        field
    }

    fn int(&mut self, len: usize) -> Result<i64, LedgerError> {
        let trits = ternary::trytes_to_trits(self.take(len))?;
        Ok(ternary::trits_to_int(&trits))
    }

    fn int_limited(&mut self, len: usize, significant: usize) -> Result<i64, LedgerError> {
        let trits = ternary::trytes_to_trits(self.take(len))?;
        if trits[significant..].iter().any(|&t| t != 0) {
            return Err(LedgerError::InvalidTransaction("value out of range".into()));
        }
        Ok(ternary::trits_to_int(&trits[..significant]))
    }
}
