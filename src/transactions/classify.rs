//! Direction, amount and type of a transaction relative to one address

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::amount::{cal_amount_delta, calculate_total_tx_output};
use super::model::{
    Input, Output, PendingTx, PendingTxType, Transaction, TransactionDirection,
    TransactionInfoType, TransactionVariant, UnconfirmedTransaction,
};
use crate::addresses::{Address, AddressHash};
use crate::error::{ClassificationError, CounterpartySide};
use crate::settings::NetworkName;

/// Where a transaction is being looked at from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionView {
    /// Wallet-wide lists, where the owning address is shown next to the entry
    #[default]
    Wallet,
    /// Detail page of a single address; moves are shown as plain outflows
    AddressDetails,
}

/// Display-ready classification of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInfo {
    pub direction: TransactionDirection,
    pub info_type: TransactionInfoType,
    /// Absolute amount in atto ALPH
    pub amount: u128,
    pub timestamp: i64,
    pub lock_time: Option<DateTime<Utc>>,
    pub outputs: Vec<Output>,
}

fn belongs_to(address: Option<&str>, wallet_addresses: &[Address]) -> bool {
    address.map_or(false, |hash| wallet_addresses.iter().any(|a| a.hash == hash))
}

/// Whether every input was spent from one of the wallet's addresses
pub fn has_only_inputs_with(inputs: &[Input], wallet_addresses: &[Address]) -> bool {
    inputs
        .iter()
        .all(|input| belongs_to(input.address.as_deref(), wallet_addresses))
}

/// Whether every output lands on one of the wallet's addresses
pub fn has_only_outputs_with(outputs: &[Output], wallet_addresses: &[Address]) -> bool {
    outputs
        .iter()
        .all(|output| belongs_to(Some(&output.address), wallet_addresses))
}

/// Funds moved between addresses of the same wallet, with no outside party
pub fn is_consolidation_tx(tx: &Transaction, wallet_addresses: &[Address]) -> bool {
    has_only_inputs_with(&tx.inputs, wallet_addresses)
        && has_only_outputs_with(&tx.outputs, wallet_addresses)
}

/// `Out` when `address` lost funds, `In` otherwise (a zero delta included)
pub fn get_direction(tx: &Transaction, address: &str) -> Result<TransactionDirection, ClassificationError> {
    cal_amount_delta(tx, address).map(direction_of)
}

fn direction_of(delta: i128) -> TransactionDirection {
    if delta < 0 {
        TransactionDirection::Out
    } else {
        TransactionDirection::In
    }
}

/// Latest lock time among the outputs; the zero epoch means unlocked
pub fn resolve_lock_time(outputs: &[Output]) -> Option<DateTime<Utc>> {
    let latest = outputs
        .iter()
        .filter_map(|output| output.lock_time)
        .fold(0i64, i64::max);

    if latest == 0 {
        None
    } else {
        DateTime::from_timestamp_millis(latest)
    }
}

/// Classify `tx` from the perspective of `address`
///
/// `wallet_addresses` is the full address set of the active wallet; it decides
/// consolidations and moves.
pub fn classify_transaction(
    tx: &TransactionVariant,
    address: &str,
    wallet_addresses: &[Address],
    view: TransactionView,
) -> Result<TransactionInfo, ClassificationError> {
    match tx {
        TransactionVariant::Confirmed(tx) => classify_confirmed(tx, address, wallet_addresses, view),
        TransactionVariant::Pending(tx) => Ok(classify_pending(tx)),
    }
}

/// Classify a raw record whose kind is only known from its fields
pub fn classify_json(
    value: &Value,
    address: &str,
    wallet_addresses: &[Address],
    view: TransactionView,
) -> Result<TransactionInfo, ClassificationError> {
    let tx = TransactionVariant::from_untagged(value)?;
    classify_transaction(&tx, address, wallet_addresses, view)
}

fn classify_confirmed(
    tx: &Transaction,
    address: &str,
    wallet_addresses: &[Address],
    view: TransactionView,
) -> Result<TransactionInfo, ClassificationError> {
    let (direction, info_type, amount) = if is_consolidation_tx(tx, wallet_addresses) {
        let total = tx.outputs.iter().try_fold(0u128, |acc, output| {
            acc.checked_add(output.atto_alph_amount)
                .ok_or_else(|| ClassificationError::InvalidAmount("amount overflow".into()))
        })?;
        (TransactionDirection::Out, TransactionInfoType::Move, total)
    } else {
        let delta = cal_amount_delta(tx, address)?;
        let direction = direction_of(delta);
        let info_type = if view == TransactionView::Wallet
            && direction == TransactionDirection::Out
            && has_only_outputs_with(&tx.outputs, wallet_addresses)
        {
            TransactionInfoType::Move
        } else {
            direction.into()
        };
        (direction, info_type, delta.unsigned_abs())
    };

    log::debug!(
        "Classified {} for {}: {:?} {:?} {}",
        tx.hash,
        address,
        direction,
        info_type,
        amount
    );

    Ok(TransactionInfo {
        direction,
        info_type,
        amount,
        timestamp: tx.timestamp,
        lock_time: resolve_lock_time(&tx.outputs),
        outputs: tx.outputs.clone(),
    })
}

fn classify_pending(tx: &PendingTx) -> TransactionInfo {
    TransactionInfo {
        direction: TransactionDirection::Out,
        info_type: TransactionInfoType::Pending,
        amount: tx.amount.unsigned_abs(),
        timestamp: tx.timestamp,
        lock_time: tx.lock_time.and_then(DateTime::from_timestamp_millis),
        // Only the recipient is known until the explorer reports the tx
        outputs: vec![Output {
            address: tx.to_address.clone(),
            ..Default::default()
        }],
    }
}

/// Build the pending entry for a mempool transaction involving `belonging_to`
///
/// `network` must be the network the transaction was observed on, otherwise
/// the entry would later be displayed against the wrong ledger.
pub fn from_unconfirmed_transaction_to_pending_tx(
    tx: &UnconfirmedTransaction,
    belonging_to: &str,
    network: NetworkName,
) -> Result<PendingTx, ClassificationError> {
    let total = calculate_total_tx_output(tx)?;
    let direction = if total < 0 {
        TransactionDirection::Out
    } else {
        TransactionDirection::In
    };
    let amount = match direction {
        TransactionDirection::Out => -total,
        TransactionDirection::In => total,
    };

    let from_address: Option<AddressHash> = match direction {
        TransactionDirection::Out => Some(belonging_to.to_string()),
        TransactionDirection::In => tx.inputs.first().and_then(|input| input.address.clone()),
    };
    let to_address: Option<AddressHash> = match direction {
        TransactionDirection::In => tx.outputs.first().map(|output| output.address.clone()),
        TransactionDirection::Out => Some(belonging_to.to_string()),
    };

    let from_address = from_address
        .filter(|address| !address.is_empty())
        .ok_or(ClassificationError::MissingCounterpartyAddress(CounterpartySide::From))?;
    let to_address = to_address
        .filter(|address| !address.is_empty())
        .ok_or(ClassificationError::MissingCounterpartyAddress(CounterpartySide::To))?;

    Ok(PendingTx {
        tx_id: tx.hash.clone(),
        from_address,
        to_address,
        // The mempool does not report submission time
        timestamp: tx.last_seen,
        tx_type: PendingTxType::Transfer,
        network,
        amount,
        lock_time: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addresses::test_support::address;

    fn output(address: &str, amount: u128) -> Output {
        Output {
            atto_alph_amount: amount,
            address: address.to_string(),
            ..Default::default()
        }
    }

    fn input(address: &str, amount: u128) -> Input {
        Input {
            address: Some(address.to_string()),
            atto_alph_amount: Some(amount),
            ..Default::default()
        }
    }

    fn confirmed(inputs: Vec<Input>, outputs: Vec<Output>) -> TransactionVariant {
        TransactionVariant::Confirmed(Transaction {
            hash: "h1".into(),
            block_hash: "b1".into(),
            timestamp: 1_000,
            inputs,
            outputs,
            gas_amount: 20_000,
            gas_price: 100_000_000_000,
        })
    }

    fn unconfirmed(inputs: Vec<Input>, outputs: Vec<Output>) -> UnconfirmedTransaction {
        UnconfirmedTransaction {
            hash: "u1".into(),
            chain_from: 0,
            chain_to: 0,
            inputs,
            outputs,
            gas_amount: 20_000,
            gas_price: 100_000_000_000,
            last_seen: 5_000,
        }
    }

    fn transaction(inputs: Vec<Input>, outputs: Vec<Output>) -> Transaction {
        match confirmed(inputs, outputs) {
            TransactionVariant::Confirmed(tx) => tx,
            TransactionVariant::Pending(_) => unreachable!(),
        }
    }

    #[test]
    fn test_get_direction() {
        let tx = transaction(
            vec![input("A", 100)],
            vec![output("B", 60), output("A", 40)],
        );
        assert_eq!(get_direction(&tx, "A").unwrap(), TransactionDirection::Out);
        assert_eq!(get_direction(&tx, "B").unwrap(), TransactionDirection::In);
        // Not involved: zero delta
        assert_eq!(get_direction(&tx, "C").unwrap(), TransactionDirection::In);

        let self_transfer = transaction(vec![input("A", 50)], vec![output("A", 50)]);
        assert_eq!(get_direction(&self_transfer, "A").unwrap(), TransactionDirection::In);
    }

    #[test]
    fn test_get_direction_requires_input_amounts() {
        let tx = transaction(
            vec![Input {
                address: Some("A".into()),
                ..Default::default()
            }],
            vec![output("B", 10)],
        );
        assert!(get_direction(&tx, "A").is_err());
    }

    #[test]
    fn test_consolidation_sums_outputs() {
        let a = address(1, 0);
        let tx = confirmed(
            vec![input(&a.hash, 160)],
            vec![output(&a.hash, 100), output(&a.hash, 50)],
        );

        let info = classify_transaction(&tx, &a.hash, &[a.clone()], TransactionView::Wallet).unwrap();
        assert_eq!(info.direction, TransactionDirection::Out);
        assert_eq!(info.info_type, TransactionInfoType::Move);
        assert_eq!(info.amount, 150);
    }

    #[test]
    fn test_outflow_amount_is_absolute_delta() {
        let a = address(1, 0);
        let tx = confirmed(
            vec![input(&a.hash, 100)],
            vec![output("external", 70), output(&a.hash, 30)],
        );

        let info = classify_transaction(&tx, &a.hash, &[a.clone()], TransactionView::Wallet).unwrap();
        assert_eq!(info.direction, TransactionDirection::Out);
        assert_eq!(info.info_type, TransactionInfoType::Out);
        assert_eq!(info.amount, 70);
    }

    #[test]
    fn test_inflow() {
        let a = address(1, 0);
        let tx = confirmed(vec![input("external", 500)], vec![output(&a.hash, 400)]);

        let info = classify_transaction(&tx, &a.hash, &[a.clone()], TransactionView::Wallet).unwrap();
        assert_eq!(info.direction, TransactionDirection::In);
        assert_eq!(info.info_type, TransactionInfoType::In);
        assert_eq!(info.amount, 400);
    }

    #[test]
    fn test_move_only_in_wallet_view() {
        let a = address(1, 0);
        let b = address(2, 1);
        let wallet = vec![a.clone(), b.clone()];
        // Input from outside keeps it from being a consolidation
        let tx = confirmed(
            vec![input(&a.hash, 100), input("external", 1)],
            vec![output(&b.hash, 90)],
        );

        let wallet_view = classify_transaction(&tx, &a.hash, &wallet, TransactionView::Wallet).unwrap();
        assert_eq!(wallet_view.info_type, TransactionInfoType::Move);
        assert_eq!(wallet_view.amount, 100);

        let details = classify_transaction(&tx, &a.hash, &wallet, TransactionView::AddressDetails).unwrap();
        assert_eq!(details.info_type, TransactionInfoType::Out);
    }

    #[test]
    fn test_input_without_address_is_not_own() {
        let a = address(1, 0);
        let inputs = vec![Input::default()];
        assert!(!has_only_inputs_with(&inputs, &[a]));
    }

    #[test]
    fn test_zero_lock_time_is_none() {
        let mut locked = output("x", 1);
        locked.lock_time = Some(0);
        assert_eq!(resolve_lock_time(&[locked.clone(), output("y", 2)]), None);
        assert_eq!(resolve_lock_time(&[]), None);

        locked.lock_time = Some(1_700_000_000_000);
        let mut earlier = output("y", 2);
        earlier.lock_time = Some(1_600_000_000_000);
        let lock_time = resolve_lock_time(&[earlier, locked]).unwrap();
        assert_eq!(lock_time.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_pending_classification() {
        let pending = TransactionVariant::Pending(PendingTx {
            tx_id: "p1".into(),
            from_address: "A".into(),
            to_address: "B".into(),
            timestamp: 9_000,
            tx_type: PendingTxType::Transfer,
            network: NetworkName::Mainnet,
            amount: 25,
            lock_time: Some(1_700_000_000_000),
        });

        let info = classify_transaction(&pending, "A", &[], TransactionView::Wallet).unwrap();
        assert_eq!(info.direction, TransactionDirection::Out);
        assert_eq!(info.info_type, TransactionInfoType::Pending);
        assert_eq!(info.amount, 25);
        assert_eq!(info.outputs.len(), 1);
        assert_eq!(info.outputs[0].address, "B");
        assert!(info.lock_time.is_some());
    }

    #[test]
    fn test_classify_json_rejects_unknown_shape() {
        let value = serde_json::json!({ "foo": 1 });
        assert_eq!(
            classify_json(&value, "A", &[], TransactionView::Wallet),
            Err(ClassificationError::UnknownTransactionShape)
        );
    }

    #[test]
    fn test_incoming_unconfirmed_to_pending() {
        let tx = unconfirmed(
            vec![Input {
                address: Some("sender".into()),
                ..Default::default()
            }],
            vec![output("me", 40), output("sender", 60)],
        );

        let pending = from_unconfirmed_transaction_to_pending_tx(&tx, "me", NetworkName::Testnet).unwrap();
        assert_eq!(pending.tx_id, "u1");
        assert_eq!(pending.from_address, "sender");
        assert_eq!(pending.to_address, "me");
        assert_eq!(pending.amount, 40);
        assert_eq!(pending.timestamp, 5_000);
        assert_eq!(pending.tx_type, PendingTxType::Transfer);
        assert_eq!(pending.network, NetworkName::Testnet);
        assert!(!pending.is_displayable_on(NetworkName::Mainnet));
    }

    #[test]
    fn test_unconfirmed_without_sender_fails() {
        let tx = unconfirmed(vec![Input::default()], vec![output("me", 40)]);
        assert_eq!(
            from_unconfirmed_transaction_to_pending_tx(&tx, "me", NetworkName::Mainnet),
            Err(ClassificationError::MissingCounterpartyAddress(CounterpartySide::From))
        );
    }

    #[test]
    fn test_unconfirmed_without_outputs_fails() {
        let tx = unconfirmed(
            vec![Input {
                address: Some("sender".into()),
                ..Default::default()
            }],
            vec![],
        );
        assert_eq!(
            from_unconfirmed_transaction_to_pending_tx(&tx, "me", NetworkName::Mainnet),
            Err(ClassificationError::MissingCounterpartyAddress(CounterpartySide::To))
        );
    }
}
