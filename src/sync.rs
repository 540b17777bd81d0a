//! Reconciliation of per-address sync responses
//!
//! Addresses are synced concurrently, one task each. Responses are applied to
//! the session one at a time, in arrival order, by the single writer.

use std::fmt::Display;
use std::future::Future;
use tokio::sync::mpsc;

use crate::addresses::AddressHash;
use crate::session::WalletSession;
use crate::transactions::Transaction;

/// Confirmed transactions reported for one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTransactions {
    pub address: AddressHash,
    pub transactions: Vec<Transaction>,
}

/// Fetch every address concurrently, delivering responses as they complete
///
/// Failed fetches are logged and produce no response. The channel closes
/// once every task finished.
pub fn spawn_address_syncs<F, Fut, E>(
    addresses: Vec<AddressHash>,
    fetch: F,
) -> mpsc::Receiver<AddressTransactions>
where
    F: Fn(AddressHash) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<Vec<Transaction>, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let (tx, rx) = mpsc::channel(addresses.len().max(1));

    for address in addresses {
        let tx = tx.clone();
        let fetch = fetch.clone();
        tokio::spawn(async move {
            match fetch(address.clone()).await {
                Ok(transactions) => {
                    log::debug!("Fetched {} transactions of {}", transactions.len(), address);
                    if tx
                        .send(AddressTransactions {
                            address,
                            transactions,
                        })
                        .await
                        .is_err()
                    {
                        log::debug!("Sync receiver dropped");
                    }
                }
                Err(e) => log::warn!("Failed to sync address {}: {}", address, e),
            }
        });
    }

    rx
}

/// Apply responses until the channel closes
///
/// Returns the number of pending transactions confirmed along the way.
pub async fn reconcile_responses(
    session: &mut WalletSession,
    responses: &mut mpsc::Receiver<AddressTransactions>,
) -> usize {
    let mut confirmed = 0;
    while let Some(response) = responses.recv().await {
        let removed = session.apply_sync_response(&response);
        if removed > 0 {
            log::info!(
                "{} pending transactions of {} confirmed",
                removed,
                response.address
            );
        }
        confirmed += removed;
    }
    confirmed
}
