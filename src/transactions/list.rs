//! Ordering and merging of per-address transaction lists

use std::cmp::Ordering;

use super::model::{PendingTx, Transaction, TransactionVariant};
use crate::addresses::AddressHash;

pub trait HasTimestamp {
    fn timestamp(&self) -> i64;

    /// Tie-breaker between records sharing a timestamp
    fn tx_id(&self) -> &str;
}

impl HasTimestamp for Transaction {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn tx_id(&self) -> &str {
        &self.hash
    }
}

impl HasTimestamp for PendingTx {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn tx_id(&self) -> &str {
        &self.tx_id
    }
}

impl HasTimestamp for TransactionVariant {
    fn timestamp(&self) -> i64 {
        TransactionVariant::timestamp(self)
    }

    fn tx_id(&self) -> &str {
        self.id()
    }
}

impl<T: HasTimestamp> HasTimestamp for BelongingToAddress<T> {
    fn timestamp(&self) -> i64 {
        self.data.timestamp()
    }

    fn tx_id(&self) -> &str {
        self.data.tx_id()
    }
}

/// Newest first; records from the same block are ordered by id so the
/// result does not depend on input order
pub fn compare_transactions<T: HasTimestamp>(a: &T, b: &T) -> Ordering {
    b.timestamp()
        .cmp(&a.timestamp())
        .then_with(|| a.tx_id().cmp(b.tx_id()))
}

pub fn sort_transactions<T: HasTimestamp>(transactions: &mut [T]) {
    transactions.sort_by(compare_transactions);
}

/// A transaction paired with the wallet address whose history it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongingToAddress<T> {
    pub data: T,
    pub address: AddressHash,
}

/// Flatten per-address lists into one list, newest first
///
/// A transaction between two addresses of the wallet appears once per address.
pub fn merge_address_transactions<'a, T, I>(per_address: I) -> Vec<BelongingToAddress<T>>
where
    T: HasTimestamp + Clone + 'a,
    I: IntoIterator<Item = (&'a AddressHash, &'a [T])>,
{
    let mut merged: Vec<BelongingToAddress<T>> = per_address
        .into_iter()
        .flat_map(|(address, transactions)| {
            transactions.iter().map(move |tx| BelongingToAddress {
                data: tx.clone(),
                address: address.clone(),
            })
        })
        .collect();

    sort_transactions(&mut merged);
    merged
}
