//! Transaction records as delivered by the explorer, and locally synthesized
//! pending transactions

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::amount;
use crate::addresses::AddressHash;
use crate::error::ClassificationError;
use crate::settings::NetworkName;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRef {
    #[serde(default)]
    pub hint: i32,
    #[serde(default)]
    pub key: String,
}

/// Spent reference to a prior output
///
/// The amount is not part of the ledger input itself; the explorer resolves
/// it from the referenced output when it can.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub output_ref: OutputRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressHash>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "amount::optional"
    )]
    pub atto_alph_amount: Option<u128>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    #[serde(default)]
    pub hint: i32,
    #[serde(default)]
    pub key: String,
    #[serde(with = "amount::unsigned")]
    pub atto_alph_amount: u128,
    pub address: AddressHash,
    /// Absolute release time in ms since epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_time: Option<i64>,
}

/// Confirmed transaction, immutable once retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub block_hash: String,
    pub timestamp: i64,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    pub gas_amount: u64,
    #[serde(with = "amount::unsigned")]
    pub gas_price: u128,
}

/// Transaction seen in the mempool but not yet confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnconfirmedTransaction {
    pub hash: String,
    #[serde(default)]
    pub chain_from: u8,
    #[serde(default)]
    pub chain_to: u8,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    pub gas_amount: u64,
    #[serde(with = "amount::unsigned")]
    pub gas_price: u128,
    /// Last time the mempool reported the transaction, in ms
    pub last_seen: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingTxType {
    Transfer,
    Consolidation,
    Sweep,
}

/// Locally submitted transaction that the explorer has not confirmed yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTx {
    pub tx_id: String,
    pub from_address: AddressHash,
    pub to_address: AddressHash,
    /// Submission time in ms (approximate)
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub tx_type: PendingTxType,
    /// Network active when the transaction was created
    pub network: NetworkName,
    #[serde(with = "amount::signed")]
    pub amount: i128,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_time: Option<i64>,
}

impl PendingTx {
    /// A pending transaction from another network must never be displayed
    pub fn is_displayable_on(&self, active_network: NetworkName) -> bool {
        self.network == active_network
    }
}

/// Either kind of transaction a list can hold, tagged at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransactionVariant {
    Confirmed(Transaction),
    Pending(PendingTx),
}

impl TransactionVariant {
    /// Transaction hash for confirmed entries, tx id for pending ones
    pub fn id(&self) -> &str {
        match self {
            Self::Confirmed(tx) => &tx.hash,
            Self::Pending(tx) => &tx.tx_id,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Confirmed(tx) => tx.timestamp,
            Self::Pending(tx) => tx.timestamp,
        }
    }

    pub fn status(&self) -> TransactionStatus {
        match self {
            Self::Confirmed(_) => TransactionStatus::Confirmed,
            Self::Pending(_) => TransactionStatus::Pending,
        }
    }

    /// Discriminate an untagged JSON record by the fields it carries
    ///
    /// A record matching both shapes or neither is rejected.
    pub fn from_untagged(value: &Value) -> Result<Self, ClassificationError> {
        match (is_explorer_transaction(value), is_pending_tx(value)) {
            (true, false) => serde_json::from_value(value.clone())
                .map(Self::Confirmed)
                .map_err(|e| ClassificationError::MalformedTransaction(e.to_string())),
            (false, true) => serde_json::from_value(value.clone())
                .map(Self::Pending)
                .map_err(|e| ClassificationError::MalformedTransaction(e.to_string())),
            _ => Err(ClassificationError::UnknownTransactionShape),
        }
    }
}

impl From<Transaction> for TransactionVariant {
    fn from(tx: Transaction) -> Self {
        Self::Confirmed(tx)
    }
}

impl From<PendingTx> for TransactionVariant {
    fn from(tx: PendingTx) -> Self {
        Self::Pending(tx)
    }
}

const EXPLORER_TRANSACTION_FIELDS: [&str; 5] =
    ["hash", "blockHash", "timestamp", "gasAmount", "gasPrice"];
const PENDING_TX_FIELDS: [&str; 6] = [
    "txId",
    "fromAddress",
    "toAddress",
    "timestamp",
    "type",
    "network",
];

fn has_defined_fields(value: &Value, fields: &[&str]) -> bool {
    fields
        .iter()
        .all(|field| value.get(*field).map(|v| !v.is_null()).unwrap_or(false))
}

/// Whether a raw record carries every field of a confirmed transaction
pub fn is_explorer_transaction(value: &Value) -> bool {
    has_defined_fields(value, &EXPLORER_TRANSACTION_FIELDS)
}

/// Whether a raw record carries every field of a pending transaction
pub fn is_pending_tx(value: &Value) -> bool {
    has_defined_fields(value, &PENDING_TX_FIELDS)
}

/// Access to the input/output lists shared by confirmed and unconfirmed records
pub trait TransactionIo {
    fn inputs(&self) -> &[Input];
    fn outputs(&self) -> &[Output];
}

impl TransactionIo for Transaction {
    fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    fn outputs(&self) -> &[Output] {
        &self.outputs
    }
}

impl TransactionIo for UnconfirmedTransaction {
    fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    fn outputs(&self) -> &[Output] {
        &self.outputs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionDirection {
    Out,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionInfoType {
    Out,
    In,
    Move,
    Pending,
}

impl From<TransactionDirection> for TransactionInfoType {
    fn from(direction: TransactionDirection) -> Self {
        match direction {
            TransactionDirection::Out => Self::Out,
            TransactionDirection::In => Self::In,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn confirmed_json() -> Value {
        json!({
            "hash": "aa",
            "blockHash": "bb",
            "timestamp": 1_660_000_000_000i64,
            "gasAmount": 20000,
            "gasPrice": "100000000000",
            "inputs": [{"outputRef": {"hint": 1, "key": "k"}, "address": "A", "attoAlphAmount": "100"}],
            "outputs": [{"hint": 2, "key": "k2", "attoAlphAmount": "30", "address": "A"}]
        })
    }

    fn pending_json() -> Value {
        json!({
            "txId": "cc",
            "fromAddress": "A",
            "toAddress": "B",
            "timestamp": 1_660_000_000_000i64,
            "type": "transfer",
            "network": "testnet",
            "amount": "42"
        })
    }

    #[test]
    fn test_predicates_are_exclusive() {
        let confirmed = confirmed_json();
        let pending = pending_json();

        assert!(is_explorer_transaction(&confirmed));
        assert!(!is_pending_tx(&confirmed));
        assert!(is_pending_tx(&pending));
        assert!(!is_explorer_transaction(&pending));
    }

    #[test]
    fn test_null_fields_count_as_missing() {
        let mut confirmed = confirmed_json();
        confirmed["gasPrice"] = Value::Null;
        assert!(!is_explorer_transaction(&confirmed));
    }

    #[test]
    fn test_from_untagged() {
        let confirmed = TransactionVariant::from_untagged(&confirmed_json()).unwrap();
        assert_eq!(confirmed.status(), TransactionStatus::Confirmed);
        assert_eq!(confirmed.id(), "aa");

        let pending = TransactionVariant::from_untagged(&pending_json()).unwrap();
        match pending {
            TransactionVariant::Pending(tx) => {
                assert_eq!(tx.network, NetworkName::Testnet);
                assert_eq!(tx.amount, 42);
                assert_eq!(tx.tx_type, PendingTxType::Transfer);
            }
            other => panic!("expected pending, got {:?}", other),
        }
    }

    #[test]
    fn test_untagged_neither_or_both_is_error() {
        assert_eq!(
            TransactionVariant::from_untagged(&json!({"hash": "aa", "timestamp": 1})),
            Err(ClassificationError::UnknownTransactionShape)
        );

        let mut both = confirmed_json();
        for (key, value) in pending_json().as_object().unwrap() {
            both[key] = value.clone();
        }
        assert_eq!(
            TransactionVariant::from_untagged(&both),
            Err(ClassificationError::UnknownTransactionShape)
        );
    }

    #[test]
    fn test_tagged_serialization() {
        let variant = TransactionVariant::from_untagged(&pending_json()).unwrap();
        let value = serde_json::to_value(&variant).unwrap();
        assert_eq!(value["kind"], "pending");
        assert_eq!(value["amount"], "42");

        let back: TransactionVariant = serde_json::from_value(value).unwrap();
        assert_eq!(back, variant);
    }

    #[test]
    fn test_foreign_network_is_not_displayable() {
        let tx: PendingTx = serde_json::from_value(pending_json()).unwrap();
        assert!(tx.is_displayable_on(NetworkName::Testnet));
        assert!(!tx.is_displayable_on(NetworkName::Mainnet));
    }
}
