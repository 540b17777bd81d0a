//! Amount derivation
//!
//! The ledger stores no "amount" for a transaction: it has to be derived from
//! inputs and outputs. Amounts are fixed-point integers in atto ALPH carried
//! as decimal strings on the wire.

use std::collections::HashSet;

use super::model::{Transaction, TransactionIo};
use crate::error::ClassificationError;

/// Smallest amount an output may carry (0.001 ALPH)
pub const MIN_UTXO_SET_AMOUNT: u128 = 1_000_000_000_000_000;

pub fn is_amount_within_range(amount: u128, max_amount: u128) -> bool {
    amount >= MIN_UTXO_SET_AMOUNT && amount <= max_amount
}

pub fn parse_amount(value: &str) -> Result<u128, ClassificationError> {
    value
        .trim()
        .parse::<u128>()
        .map_err(|_| ClassificationError::InvalidAmount(value.to_string()))
}

fn to_signed(amount: u128) -> Result<i128, ClassificationError> {
    i128::try_from(amount).map_err(|_| ClassificationError::InvalidAmount(amount.to_string()))
}

fn checked_sum<I: IntoIterator<Item = u128>>(amounts: I) -> Result<u128, ClassificationError> {
    amounts.into_iter().try_fold(0u128, |acc, amount| {
        acc.checked_add(amount)
            .ok_or_else(|| ClassificationError::InvalidAmount("amount overflow".into()))
    })
}

/// Net change of `address`' balance caused by `tx`
///
/// Outputs addressed to it minus inputs spent from it. Negative means value
/// left the address. Every input attributed to the address must carry its
/// resolved amount.
pub fn cal_amount_delta(tx: &Transaction, address: &str) -> Result<i128, ClassificationError> {
    let received = checked_sum(
        tx.outputs
            .iter()
            .filter(|output| output.address == address)
            .map(|output| output.atto_alph_amount),
    )?;

    let spent = checked_sum(
        tx.inputs
            .iter()
            .filter(|input| input.address.as_deref() == Some(address))
            .map(|input| {
                input
                    .atto_alph_amount
                    .ok_or_else(|| ClassificationError::UnresolvedInputAmount(tx.hash.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?,
    )?;

    Ok(to_signed(received)? - to_signed(spent)?)
}

/// Total value transferred by a transaction, excluding presumed change
///
/// Best effort only: outputs are walked from last to first (the first output
/// is never considered change) and an output is taken as change when its
/// address matches a not-yet-matched input address. Change that is not
/// placed last, or several inputs sharing an address, are misattributed.
/// Displayed amounts depend on this exact behaviour, so it is not refined.
pub fn calculate_total_tx_output<T: TransactionIo>(tx: &T) -> Result<i128, ClassificationError> {
    let outputs = tx.outputs();
    let total = checked_sum(outputs.iter().map(|output| output.atto_alph_amount))?;

    let mut seen = HashSet::new();
    let mut input_addresses: Vec<&str> = tx
        .inputs()
        .iter()
        .filter_map(|input| input.address.as_deref())
        .filter(|address| seen.insert(*address))
        .collect();

    let mut change = 0u128;
    for output in outputs.iter().skip(1).rev() {
        if let Some(position) = input_addresses
            .iter()
            .position(|address| *address == output.address)
        {
            change = change
                .checked_add(output.atto_alph_amount)
                .ok_or_else(|| ClassificationError::InvalidAmount("amount overflow".into()))?;
            input_addresses.remove(position);
        }
        if input_addresses.is_empty() {
            break;
        }
    }

    Ok(to_signed(total)? - to_signed(change)?)
}

/// Serde adapters for amounts carried as decimal strings
pub(crate) mod unsigned {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        deserializer.deserialize_any(UnsignedVisitor)
    }

    pub(super) struct UnsignedVisitor;

    impl<'de> Visitor<'de> for UnsignedVisitor {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer amount as a decimal string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u128, E> {
            super::parse_amount(value).map_err(E::custom)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u128, E> {
            Ok(u128::from(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u128, E> {
            u128::try_from(value).map_err(|_| E::custom(format!("negative amount {}", value)))
        }
    }
}

pub(crate) mod optional {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Option<u128>, serializer: S) -> Result<S::Ok, S::Error> {
        match amount {
            Some(amount) => super::unsigned::serialize(amount, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u128>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapper(#[serde(with = "super::unsigned")] u128);

        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(amount)| amount))
    }
}

pub(crate) mod signed {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(amount: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        deserializer.deserialize_any(SignedVisitor)
    }

    struct SignedVisitor;

    impl<'de> Visitor<'de> for SignedVisitor {
        type Value = i128;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer amount as a decimal string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<i128, E> {
            value
                .trim()
                .parse::<i128>()
                .map_err(|_| E::custom(format!("invalid amount '{}'", value)))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i128, E> {
            Ok(i128::from(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i128, E> {
            Ok(i128::from(value))
        }
    }
}
