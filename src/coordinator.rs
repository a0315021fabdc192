//! Transaction submission and confirmation coordinator.
//!
//! Owns the in-flight flag. Exactly one mutation may sit between submission
//! and confirmation; the flag is claimed by compare-and-set on entry and
//! released on every exit path, success or failure, by a drop guard.

use crate::contract::ContractError;
use crate::eth::{EthereumRpc, PendingTx, RpcError, TxOutcome};
use crate::governance::{GovernanceError, ReadError};
use crate::session::PreconditionError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A transaction that left the gate but did not take effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    /// Submission failed before the transaction reached the chain.
    #[error("transaction rejected: {reason}")]
    Rejected { reason: String },

    /// Mined but reverted. No state changed on chain.
    #[error("transaction reverted: {}", reason.as_deref().unwrap_or("no reason available"))]
    Reverted { reason: Option<String> },

    /// Broadcast but never mined.
    #[error("transaction dropped before it was mined")]
    Dropped,
}

/// Drives a mutation from submission through confirmation.
#[derive(Clone)]
pub struct TransactionCoordinator {
    loading: Arc<AtomicBool>,
}

struct LoadingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl TransactionCoordinator {
    /// The flag is shared with whoever surfaces the loading state.
    pub fn new(loading: Arc<AtomicBool>) -> Self {
        Self { loading }
    }

    /// True while a mutation is between submission and confirmation.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Submit one transaction, wait for it to be mined, then run a
    /// follow-up read to fold the new chain state back into the caller.
    ///
    /// The in-flight flag is held from before `submit` until the receipt
    /// arrives. The follow-up runs after the flag is released: it is a
    /// read, and a failed one must not fail an already-confirmed action,
    /// so it is logged and swallowed.
    pub async fn submit_and_wait<P, S, SF, F, FF>(
        &self,
        submit: S,
        follow_up: F,
    ) -> Result<TxOutcome, GovernanceError>
    where
        P: EthereumRpc,
        S: FnOnce() -> SF,
        SF: Future<Output = Result<PendingTx<P>, ContractError>>,
        F: FnOnce() -> FF,
        FF: Future<Output = Result<(), ReadError>>,
    {
        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PreconditionError::MutationInFlight.into());
        }
        let guard = LoadingGuard {
            flag: &self.loading,
        };

        let pending = match submit().await {
            Ok(pending) => pending,
            Err(ContractError::Precondition(p)) => return Err(p.into()),
            Err(e) => {
                return Err(TxError::Rejected {
                    reason: e.to_string(),
                }
                .into())
            }
        };
        tracing::info!(tx_hash = %pending.tx_hash(), "transaction submitted, awaiting confirmation");

        let outcome = match pending.confirm().await {
            Ok(outcome) => outcome,
            Err(RpcError::TxDropped) => return Err(TxError::Dropped.into()),
            Err(e) => {
                return Err(TxError::Rejected {
                    reason: e.to_string(),
                }
                .into())
            }
        };
        if !outcome.success {
            tracing::warn!(tx_hash = %outcome.tx_hash, reason = ?outcome.revert_reason, "transaction reverted");
            return Err(TxError::Reverted {
                reason: outcome.revert_reason,
            }
            .into());
        }
        tracing::info!(tx_hash = %outcome.tx_hash, "transaction confirmed");
        drop(guard);

        if let Err(error) = follow_up().await {
            tracing::warn!(%error, "post-transaction refresh failed");
        }
        Ok(outcome)
    }
}
