//! Wallet session lifecycle and capability handles.
//!
//! A [`SessionManager`] validates the provider's chain before anything else
//! may run, then hands out [`Handle`]s scoped to the established session.
//! Handles outlive nothing: disconnecting flips a shared liveness token and
//! every handle minted for that session goes stale.

use crate::eth::{EthereumRpc, RpcError};
use ethers::types::Address;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Errors establishing a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("wrong network: expected chain id {expected}, connected node reports {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("provider error: {0}")]
    Provider(#[from] RpcError),
}

/// A gate rejected the operation before any network traffic was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("not connected; establish a session first")]
    NotConnected,

    #[error("session handle is stale; the session it belonged to has ended")]
    StaleSession,

    #[error("read-only handle cannot submit transactions")]
    ReadOnlyHandle,

    #[error("session has no signing identity")]
    SigningUnavailable,

    #[error("no membership token held; creating and voting require at least one")]
    NotAMember,

    #[error("connected identity is not the DAO owner")]
    NotOwner,

    #[error("another transaction is already in flight")]
    MutationInFlight,
}

/// Capability level of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Reads only; no signing key attached.
    ReadOnly,
    /// Reads and transaction submission on behalf of an identity.
    Signing,
}

/// An established, validated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    mode: SessionMode,
    chain_id: u64,
    identity: Option<Address>,
}

impl Session {
    fn read_only(chain_id: u64) -> Self {
        Self {
            mode: SessionMode::ReadOnly,
            chain_id,
            identity: None,
        }
    }

    fn signing(chain_id: u64, identity: Address) -> Self {
        Self {
            mode: SessionMode::Signing,
            chain_id,
            identity: Some(identity),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Signing identity; `None` in read-only mode.
    pub fn identity(&self) -> Option<Address> {
        self.identity
    }
}

/// Provider access scoped to one session.
///
/// Signing handles carry the session identity; read-only handles do not, so
/// a read-only handle can never submit even if the provider has a key.
pub struct Handle<P: EthereumRpc + ?Sized> {
    provider: Arc<P>,
    identity: Option<Address>,
    live: Arc<AtomicBool>,
}

impl<P: EthereumRpc + ?Sized> Clone for Handle<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            identity: self.identity,
            live: self.live.clone(),
        }
    }
}

impl<P: EthereumRpc + ?Sized> std::fmt::Debug for Handle<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("identity", &self.identity)
            .field("live", &self.live.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<P: EthereumRpc + ?Sized> Handle<P> {
    /// Whether this handle may submit transactions.
    pub fn can_sign(&self) -> bool {
        self.identity.is_some()
    }

    /// Identity of a signing handle.
    pub fn identity(&self) -> Option<Address> {
        self.identity
    }

    /// Fail if the session this handle was minted for has ended.
    pub fn ensure_live(&self) -> Result<(), PreconditionError> {
        if self.live.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PreconditionError::StaleSession)
        }
    }

    pub(crate) fn provider(&self) -> Arc<P> {
        self.provider.clone()
    }
}

/// Owns the session lifecycle against one provider.
pub struct SessionManager<P: EthereumRpc> {
    provider: Arc<P>,
    required_chain_id: u64,
    session: Option<Session>,
    live: Arc<AtomicBool>,
}

impl<P: EthereumRpc> SessionManager<P> {
    pub fn new(provider: P, required_chain_id: u64) -> Self {
        Self {
            provider: Arc::new(provider),
            required_chain_id,
            session: None,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Establish a session, validating the chain id first.
    ///
    /// No contract call is issued until the reported chain id matches the
    /// required one. Calling again on an established session is a no-op that
    /// returns the existing session without touching the network.
    pub async fn connect(&mut self) -> Result<Session, SessionError> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        let actual = self.provider.chain_id().await?;
        if actual != self.required_chain_id {
            return Err(SessionError::NetworkMismatch {
                expected: self.required_chain_id,
                actual,
            });
        }
        let session = match self.provider.signer_address() {
            Some(identity) => Session::signing(actual, identity),
            None => Session::read_only(actual),
        };
        // Fresh liveness token per session; handles from earlier sessions
        // keep pointing at their own, already-false token.
        self.live = Arc::new(AtomicBool::new(true));
        self.session = Some(session.clone());
        Ok(session)
    }

    /// End the session. Every handle minted for it goes stale.
    pub fn disconnect(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        self.session = None;
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Mint a handle for the current session.
    ///
    /// `needs_signing` requests a handle that may submit transactions, which
    /// requires the session to carry an identity.
    pub fn handle(&self, needs_signing: bool) -> Result<Handle<P>, PreconditionError> {
        let session = self.session.as_ref().ok_or(PreconditionError::NotConnected)?;
        let identity = if needs_signing {
            Some(session.identity().ok_or(PreconditionError::SigningUnavailable)?)
        } else {
            None
        };
        Ok(Handle {
            provider: self.provider.clone(),
            identity,
            live: self.live.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eth::{MockProvider, GOERLI_CHAIN_ID};

    #[tokio::test]
    async fn connect_rejects_wrong_chain() {
        let mock = MockProvider::new();
        mock.set_chain_id(1);
        let mut manager = SessionManager::new(mock.clone(), GOERLI_CHAIN_ID);

        let err = manager.connect().await.unwrap_err();
        assert_eq!(
            err,
            SessionError::NetworkMismatch {
                expected: 5,
                actual: 1
            }
        );
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let mock = MockProvider::new();
        let mut manager = SessionManager::new(mock.clone(), GOERLI_CHAIN_ID);

        let first = manager.connect().await.unwrap();
        let second = manager.connect().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.chain_id_queries(), 1);
    }

    #[tokio::test]
    async fn session_mode_follows_signer_presence() {
        let mock = MockProvider::new();
        let mut manager = SessionManager::new(mock.clone(), GOERLI_CHAIN_ID);
        let session = manager.connect().await.unwrap();
        assert_eq!(session.mode(), SessionMode::ReadOnly);
        assert_eq!(session.identity(), None);

        let mock = MockProvider::new();
        let me = ethers::types::Address::from_low_u64_be(0x22);
        mock.set_signer(me);
        let mut manager = SessionManager::new(mock.clone(), GOERLI_CHAIN_ID);
        let session = manager.connect().await.unwrap();
        assert_eq!(session.mode(), SessionMode::Signing);
        assert_eq!(session.identity(), Some(me));
    }

    #[tokio::test]
    async fn handle_requires_connection() {
        let mock = MockProvider::new();
        let manager = SessionManager::new(mock, GOERLI_CHAIN_ID);
        assert_eq!(
            manager.handle(false).unwrap_err(),
            PreconditionError::NotConnected
        );
    }

    #[tokio::test]
    async fn signing_handle_requires_identity() {
        let mock = MockProvider::new();
        let mut manager = SessionManager::new(mock, GOERLI_CHAIN_ID);
        manager.connect().await.unwrap();

        assert_eq!(
            manager.handle(true).unwrap_err(),
            PreconditionError::SigningUnavailable
        );
        assert!(manager.handle(false).is_ok());
    }

    #[tokio::test]
    async fn disconnect_invalidates_existing_handles() {
        let mock = MockProvider::new();
        let mut manager = SessionManager::new(mock, GOERLI_CHAIN_ID);
        manager.connect().await.unwrap();
        let handle = manager.handle(false).unwrap();
        assert!(handle.ensure_live().is_ok());

        manager.disconnect();

        assert_eq!(
            handle.ensure_live().unwrap_err(),
            PreconditionError::StaleSession
        );
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn reconnect_mints_live_handles_while_old_ones_stay_stale() {
        let mock = MockProvider::new();
        let mut manager = SessionManager::new(mock, GOERLI_CHAIN_ID);
        manager.connect().await.unwrap();
        let old = manager.handle(false).unwrap();
        manager.disconnect();
        manager.connect().await.unwrap();
        let fresh = manager.handle(false).unwrap();

        assert_eq!(
            old.ensure_live().unwrap_err(),
            PreconditionError::StaleSession
        );
        assert!(fresh.ensure_live().is_ok());
    }

    #[tokio::test]
    async fn connect_surfaces_provider_failure() {
        let mock = MockProvider::new();
        mock.go_offline();
        let mut manager = SessionManager::new(mock, GOERLI_CHAIN_ID);

        let err = manager.connect().await.unwrap_err();
        assert_eq!(err, SessionError::Provider(RpcError::Disconnected));
    }
}
