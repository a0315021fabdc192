//! Integration tests for the end-to-end governance flow.
//!
//! Drives the public facade the way the CLI does, against a mock chain:
//! 1. Connect a session (chain id validated against Goerli)
//! 2. Create a proposal with a member wallet
//! 3. Vote, with weight equal to the membership NFT balance
//! 4. Execute after the deadline (purchase on YAY, no-op on NAY)
//! 5. Withdraw the treasury as owner
//!
//! Plus the failure paths: wrong network, non-member and read-only
//! gating, rejected transactions, and partial read failures.

use std::time::{Duration, SystemTime};

use agora::coordinator::TxError;
use agora::eth::{MockProvider, GOERLI_CHAIN_ID};
use agora::governance::{ConnectionState, GovernanceError, GovernanceFacade};
use agora::proposals::{ProposalStatus, Vote};
use agora::session::{PreconditionError, SessionError};
use ethers::types::{Address, U256};

fn facade(mock: &MockProvider) -> GovernanceFacade<MockProvider> {
    GovernanceFacade::new(
        mock.clone(),
        GOERLI_CHAIN_ID,
        mock.dao_address(),
        mock.token_address(),
    )
}

fn member() -> Address {
    Address::from_low_u64_be(0xA11CE)
}

/// Attach a signing member holding `nfts` membership tokens.
fn signing_member(mock: &MockProvider, nfts: u64) -> Address {
    let who = member();
    mock.set_signer(who);
    mock.grant_membership(who, nfts);
    who
}

fn one_ether() -> U256 {
    U256::exp10(18)
}

/// NFT price on the mock marketplace, 0.1 ETH.
fn nft_price() -> U256 {
    U256::exp10(17)
}

#[tokio::test]
async fn wrong_network_refuses_session_without_touching_contracts() {
    let mock = MockProvider::new();
    mock.set_chain_id(1);
    signing_member(&mock, 1);

    let mut gov = facade(&mock);
    let err = gov.connect().await.unwrap_err();

    match err {
        GovernanceError::Session(SessionError::NetworkMismatch { expected, actual }) => {
            assert_eq!(expected, GOERLI_CHAIN_ID);
            assert_eq!(actual, 1);
        }
        other => panic!("expected network mismatch, got: {other}"),
    }

    let state = gov.state();
    assert_eq!(state.connection, ConnectionState::Disconnected);
    assert!(!state.wallet_connected);
    // The chain id probe is the only traffic allowed before refusal
    assert_eq!(mock.call_count(), 0);
    assert_eq!(mock.send_count(), 0);
}

#[tokio::test]
async fn member_creates_and_votes_with_balance_weight() {
    let mock = MockProvider::new();
    signing_member(&mock, 2);
    mock.fund(mock.dao_address(), one_ether());

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();

    let state = gov.state();
    assert_eq!(state.connection, ConnectionState::Connected);
    assert!(state.wallet_connected);
    assert_eq!(state.member_token_balance, U256::from(2));
    assert_eq!(state.proposal_count, 0);
    assert_eq!(state.treasury_balance, one_ether());

    let outcome = gov.create_proposal(U256::from(42)).await.unwrap();
    assert!(outcome.success);

    // Follow-up refresh pulled the new proposal
    let state = gov.state();
    assert_eq!(state.proposal_count, 1);
    let proposal = gov.proposal(0).unwrap();
    assert_eq!(proposal.nft_token_id, U256::from(42));
    assert_eq!(proposal.status(), ProposalStatus::Active);
    assert_eq!(proposal.yay_votes, U256::zero());

    gov.vote(0, Vote::Yay).await.unwrap();

    // Vote weight is the full NFT balance, not one
    let proposal = gov.proposal(0).unwrap();
    assert_eq!(proposal.yay_votes, U256::from(2));
    assert_eq!(proposal.nay_votes, U256::zero());
    assert!(!gov.state().loading);
}

#[tokio::test]
async fn executing_yay_majority_buys_the_nft() {
    let mock = MockProvider::new();
    signing_member(&mock, 1);
    mock.fund(mock.dao_address(), one_ether());
    let past = SystemTime::now() - Duration::from_secs(60);
    let id = mock.seed_proposal(7, past, 3, 1, false);

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();
    gov.refresh_proposals().await.unwrap();
    assert_eq!(
        gov.proposal(id).unwrap().status(),
        ProposalStatus::ExpiredUnexecuted
    );

    gov.execute(id).await.unwrap();

    let proposal = gov.proposal(id).unwrap();
    assert!(proposal.executed);
    assert_eq!(proposal.status(), ProposalStatus::Executed);
    assert_eq!(proposal.winning_side(), Vote::Yay);

    // Treasury paid the 0.1 ETH purchase price
    assert_eq!(gov.state().treasury_balance, one_ether() - nft_price());
}

#[tokio::test]
async fn executing_nay_majority_spends_nothing() {
    let mock = MockProvider::new();
    signing_member(&mock, 1);
    mock.fund(mock.dao_address(), one_ether());
    let past = SystemTime::now() - Duration::from_secs(60);
    let id = mock.seed_proposal(7, past, 1, 3, false);

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();
    gov.refresh_proposals().await.unwrap();

    gov.execute(id).await.unwrap();

    // Marked executed either way; no purchase on a NAY win
    let proposal = gov.proposal(id).unwrap();
    assert!(proposal.executed);
    assert_eq!(proposal.winning_side(), Vote::Nay);
    assert_eq!(gov.state().treasury_balance, one_ether());
}

#[tokio::test]
async fn non_member_cannot_create_or_vote() {
    let mock = MockProvider::new();
    mock.set_signer(member()); // signing, but zero NFTs

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();
    let sends_before = mock.send_count();

    let err = gov.create_proposal(U256::from(1)).await.unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::Precondition(PreconditionError::NotAMember)
    ));

    let err = gov.vote(0, Vote::Nay).await.unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::Precondition(PreconditionError::NotAMember)
    ));

    // Both were refused client-side, before any transaction
    assert_eq!(mock.send_count(), sends_before);
}

#[tokio::test]
async fn read_only_session_cannot_execute() {
    let mock = MockProvider::new();
    let past = SystemTime::now() - Duration::from_secs(60);
    mock.seed_proposal(7, past, 3, 1, false);

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();
    gov.refresh_proposals().await.unwrap();

    let state = gov.state();
    assert_eq!(state.connection, ConnectionState::Connected);
    assert!(!state.wallet_connected);

    // The proposal list is fully readable without a wallet
    assert_eq!(gov.proposals().len(), 1);

    let err = gov.execute(0).await.unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::Precondition(PreconditionError::SigningUnavailable)
    ));
    assert_eq!(mock.send_count(), 0);
}

#[tokio::test]
async fn rejected_transaction_surfaces_and_rearms() {
    let mock = MockProvider::new();
    signing_member(&mock, 1);

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();

    mock.reject_next_send("nonce too low");
    let err = gov.create_proposal(U256::from(9)).await.unwrap_err();

    match err {
        GovernanceError::Tx(TxError::Rejected { reason }) => {
            assert!(reason.contains("nonce too low"));
        }
        other => panic!("expected rejection, got: {other}"),
    }
    assert!(!gov.state().loading);

    // The failure released the mutation gate; the retry goes through
    gov.create_proposal(U256::from(9)).await.unwrap();
    assert_eq!(gov.state().proposal_count, 1);
}

#[tokio::test]
async fn double_vote_reverts_with_contract_reason() {
    let mock = MockProvider::new();
    signing_member(&mock, 1);
    let future = SystemTime::now() + Duration::from_secs(300);
    let id = mock.seed_proposal(3, future, 0, 0, false);

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();

    gov.vote(id, Vote::Yay).await.unwrap();
    let err = gov.vote(id, Vote::Yay).await.unwrap_err();

    match err {
        GovernanceError::Tx(TxError::Reverted { reason }) => {
            assert_eq!(reason.as_deref(), Some("ALREADY_VOTED"));
        }
        other => panic!("expected revert, got: {other}"),
    }

    // The first vote stands
    assert_eq!(gov.proposal(id).unwrap().yay_votes, U256::one());
    assert!(!gov.state().loading);
}

#[tokio::test]
async fn failed_proposal_read_omits_only_that_entry() {
    let mock = MockProvider::new();
    let future = SystemTime::now() + Duration::from_secs(300);
    for token in [10, 11, 12] {
        mock.seed_proposal(token, future, 0, 0, false);
    }
    mock.fail_proposal_read(1);

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();
    gov.refresh_proposals().await.unwrap();

    let ids: Vec<u64> = gov.proposals().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![0, 2]);
    // The count still reflects the chain
    assert_eq!(gov.state().proposal_count, 3);

    mock.restore_proposal_read(1);
    gov.refresh_proposals().await.unwrap();

    let ids: Vec<u64> = gov.proposals().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[tokio::test]
async fn owner_withdraws_the_treasury() {
    let mock = MockProvider::new();
    mock.set_signer(mock.owner_address());
    mock.fund(mock.dao_address(), U256::from(2) * one_ether());

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();

    let state = gov.state();
    assert!(state.is_owner);
    assert_eq!(state.treasury_balance, U256::from(2) * one_ether());

    gov.withdraw().await.unwrap();

    assert!(gov.state().treasury_balance.is_zero());
}

#[tokio::test]
async fn non_owner_withdraw_is_refused_client_side() {
    let mock = MockProvider::new();
    signing_member(&mock, 1);
    mock.fund(mock.dao_address(), one_ether());

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();
    let sends_before = mock.send_count();

    let err = gov.withdraw().await.unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::Precondition(PreconditionError::NotOwner)
    ));
    assert_eq!(mock.send_count(), sends_before);
}

#[tokio::test]
async fn disconnect_discards_session_and_derived_state() {
    let mock = MockProvider::new();
    signing_member(&mock, 1);
    let future = SystemTime::now() + Duration::from_secs(300);
    mock.seed_proposal(5, future, 0, 0, false);
    mock.fund(mock.dao_address(), one_ether());

    let mut gov = facade(&mock);
    gov.connect().await.unwrap();
    gov.refresh_proposals().await.unwrap();
    assert_eq!(gov.proposals().len(), 1);

    gov.disconnect();

    let state = gov.state();
    assert_eq!(state.connection, ConnectionState::Disconnected);
    assert!(!state.wallet_connected);
    assert!(state.treasury_balance.is_zero());
    assert!(gov.proposals().is_empty());
    assert!(gov.identity().is_none());

    // Mutations on a dead session fail before reaching the provider
    let err = gov.execute(0).await.unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::Precondition(PreconditionError::NotConnected)
    ));
}
