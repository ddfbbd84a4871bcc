//! Account address canonicalization
//!
//! Substrate chains encode the same 32-byte account id differently per
//! network (SS58 prefix), and indexers sometimes hand back the raw public key
//! as `0x` hex. Every eligibility comparison goes through [`canonicalize`] so
//! two spellings of one account compare equal.
//!
//! SS58 layout: `base58(prefix ‖ account_id ‖ checksum[..2])` where the
//! checksum is `blake2b_512("SS58PRE" ‖ prefix ‖ account_id)`.

use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic Substrate prefix used for the canonical form
pub const CANONICAL_SS58_PREFIX: u16 = 42;

const SS58_CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
const ACCOUNT_ID_LEN: usize = 32;
const EVM_ACCOUNT_LEN: usize = 20;
const CHECKSUM_LEN: usize = 2;

/// Canonical account address
///
/// Only constructed through [`canonicalize`], so equality between two
/// `Address` values is the self-dealing test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw account string
///
/// Returns `None` when the input is not a recognizable account; callers treat
/// that as "cannot evaluate eligibility" rather than retrying.
pub fn canonicalize(raw: &str) -> Option<Address> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(hex_part) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        let bytes = hex::decode(hex_part).ok()?;
        return match bytes.len() {
            ACCOUNT_ID_LEN => Some(Address(ss58_encode(&bytes, CANONICAL_SS58_PREFIX))),
            EVM_ACCOUNT_LEN => Some(Address(format!("0x{}", hex::encode(bytes)))),
            _ => None,
        };
    }

    let (account_id, _prefix) = ss58_decode(raw)?;
    Some(Address(ss58_encode(&account_id, CANONICAL_SS58_PREFIX)))
}

/// Decode an SS58 string into its account id and network prefix, verifying the checksum
pub fn ss58_decode(encoded: &str) -> Option<([u8; ACCOUNT_ID_LEN], u16)> {
    let data = bs58::decode(encoded).into_vec().ok()?;
    let first = *data.first()?;

    let (prefix, prefix_len) = match first {
        0..=63 => (u16::from(first), 1),
        64..=127 => {
            let second = *data.get(1)?;
            let lower = (first << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (u16::from(lower) | (u16::from(upper) << 8), 2)
        }
        _ => return None,
    };

    if data.len() != prefix_len + ACCOUNT_ID_LEN + CHECKSUM_LEN {
        return None;
    }

    let body_end = prefix_len + ACCOUNT_ID_LEN;
    let expected = ss58_checksum(&data[..body_end]);
    if data[body_end..] != expected[..CHECKSUM_LEN] {
        return None;
    }

    let mut account_id = [0u8; ACCOUNT_ID_LEN];
    account_id.copy_from_slice(&data[prefix_len..body_end]);
    Some((account_id, prefix))
}

/// Encode an account id under the given network prefix (must be < 16384)
pub fn ss58_encode(account_id: &[u8], prefix: u16) -> String {
    let mut data = Vec::with_capacity(2 + account_id.len() + CHECKSUM_LEN);
    match prefix {
        0..=63 => data.push(prefix as u8),
        _ => {
            let first = ((prefix & 0b0000_0000_1111_1100) as u8 >> 2) | 0b0100_0000;
            let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
            data.push(first);
            data.push(second);
        }
    }
    data.extend_from_slice(account_id);
    let checksum = ss58_checksum(&data);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    bs58::encode(data).into_string()
}

fn ss58_checksum(payload: &[u8]) -> Vec<u8> {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CHECKSUM_PREAMBLE);
    hasher.update(payload);
    hasher.finalize().to_vec()
}
