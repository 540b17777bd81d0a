//! Transaction records and their classification
//!
//! - Explorer-shaped confirmed and unconfirmed transactions, local pending entries
//! - Amount derivation (net delta, change heuristic)
//! - Direction/type classification relative to an address
//! - Sorting and merging of per-address lists

pub mod amount;
mod classify;
mod list;
mod model;

pub use amount::{
    cal_amount_delta, calculate_total_tx_output, is_amount_within_range, MIN_UTXO_SET_AMOUNT,
};
pub use classify::{
    classify_json, classify_transaction, from_unconfirmed_transaction_to_pending_tx,
    get_direction, has_only_inputs_with, has_only_outputs_with, is_consolidation_tx,
    resolve_lock_time, TransactionInfo, TransactionView,
};
pub use list::{
    compare_transactions, merge_address_transactions, sort_transactions, BelongingToAddress,
    HasTimestamp,
};
pub use model::{
    is_explorer_transaction, is_pending_tx, Input, Output, OutputRef, PendingTx, PendingTxType,
    Transaction, TransactionDirection, TransactionInfoType, TransactionIo, TransactionStatus,
    TransactionVariant, UnconfirmedTransaction,
};
