//! Address group (shard) derivation

use crate::error::ClassificationError;

pub const TOTAL_NUMBER_OF_GROUPS: u8 = 4;

const P2PKH: u8 = 0x00;
const P2MPKH: u8 = 0x01;
const P2SH: u8 = 0x02;
const P2C: u8 = 0x03;

const HASH_LENGTH: usize = 32;

/// Group of a base58 address, derived from its decoded body
pub fn group_of_address(address: &str) -> Result<u8, ClassificationError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| ClassificationError::InvalidAddress(format!("{}: {}", address, e)))?;

    let (address_type, body) = decoded
        .split_first()
        .ok_or_else(|| ClassificationError::InvalidAddress("Address string is empty".into()))?;

    match *address_type {
        P2PKH => group_of_p2pkh(address, body),
        P2MPKH => group_of_p2mpkh(address, body),
        P2SH => Ok(group_of_address_bytes(body)),
        // Contract ids carry their group in the last byte
        P2C => body
            .last()
            .copied()
            .ok_or_else(|| invalid_length(address)),
        other => Err(ClassificationError::InvalidAddress(format!(
            "{}: unknown address type {}",
            address, other
        ))),
    }
}

fn group_of_p2pkh(address: &str, body: &[u8]) -> Result<u8, ClassificationError> {
    if body.len() != HASH_LENGTH {
        return Err(invalid_length(address));
    }
    Ok(group_of_address_bytes(body))
}

/// Body: compact key count n, n public key hashes, compact signature threshold m.
/// The group is the group of the first key.
fn group_of_p2mpkh(address: &str, body: &[u8]) -> Result<u8, ClassificationError> {
    let (keys, threshold) = match (body.first(), body.last()) {
        (Some(&n), Some(&m)) if body.len() >= 2 => (
            single_byte_compact(n).ok_or_else(|| invalid_length(address))?,
            single_byte_compact(m).ok_or_else(|| invalid_length(address))?,
        ),
        _ => return Err(invalid_length(address)),
    };

    if keys == 0 || body.len() != 2 + keys * HASH_LENGTH {
        return Err(invalid_length(address));
    }
    if threshold == 0 || threshold > keys {
        return Err(ClassificationError::InvalidAddress(format!(
            "{}: threshold {} of {} keys",
            address, threshold, keys
        )));
    }

    group_of_p2pkh(address, &body[1..1 + HASH_LENGTH])
}

/// Compact integers below 64 fit in one byte with the two high bits clear
fn single_byte_compact(byte: u8) -> Option<usize> {
    (byte & 0xc0 == 0).then_some(usize::from(byte))
}

fn group_of_address_bytes(bytes: &[u8]) -> u8 {
    let hint = djb2(bytes) | 1;
    xor_byte(hint) % TOTAL_NUMBER_OF_GROUPS
}

/// 32-bit djb2 with wrapping arithmetic
fn djb2(bytes: &[u8]) -> i32 {
    bytes.iter().fold(5381i32, |hash, byte| {
        hash.wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(i32::from(*byte))
    })
}

fn xor_byte(value: i32) -> u8 {
    value.to_be_bytes().iter().fold(0u8, |acc, byte| acc ^ byte)
}

fn invalid_length(address: &str) -> ClassificationError {
    ClassificationError::InvalidAddress(format!("{}: unexpected address length", address))
}
