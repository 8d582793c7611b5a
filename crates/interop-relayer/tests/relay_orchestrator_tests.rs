// End-to-end relay tests against scripted mock chains
//
// Every test wires two MockChain instances into a RelayOrchestrator and checks
// phase ordering, produced transactions and failure semantics.

mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use tokio_test::{assert_err, assert_ok};

use common::*;
use interop_relayer::chains::mock::MockCall;
use interop_relayer::interop::abi::{
    IERC20, IInteropCenter, IInteropHandler, IInteropRootStorage, IL1Messenger, IMessageVerification,
    INativeTokenVault,
};
use interop_relayer::interop::{compute_asset_id, decode_bundle, BundleError};
use interop_relayer::relay::{NoProgress, PollPolicy};
use interop_relayer::{
    cancellation, CancelToken, ChainSide, ErrorClass, MockChain, RelayDirection, RelayError, RelayOrchestrator,
    RelayPhase, RelayProgress, RelayerMetrics,
};

fn orchestrator(source: &Arc<MockChain>, destination: &Arc<MockChain>) -> RelayOrchestrator {
    RelayOrchestrator::new(source.clone(), destination.clone(), create_test_settings())
}

/// Asset id carried in the second-bridge data of the executed bundle
fn executed_bundle_asset(destination: &MockChain) -> B256 {
    let execute = destination
        .submitted()
        .into_iter()
        .find(|tx| tx.selector() == Some(IInteropHandler::executeBundleCall::SELECTOR))
        .unwrap();
    let call = IInteropHandler::executeBundleCall::abi_decode(&execute.data, true).unwrap();
    let bundle = decode_bundle(&call._bundle).unwrap();
    let data = &bundle.calls[0].data;
    assert_eq!(data[0], 0x01);
    let (asset_id, _burn) = <(B256, Bytes)>::abi_decode_params(&data[1..], true).unwrap();
    asset_id
}

#[tokio::test]
async fn test_message_relay_a_to_b() {
    let proof = sample_proof(7);
    let journal = interop_relayer::chains::mock::Journal::default();
    let source = Arc::new(
        MockChain::new(CHAIN_A)
            .with_journal(journal.clone())
            .with_transaction_index(3)
            .script_proofs(vec![Ok(None), Ok(None), Ok(Some(proof.clone()))]),
    );
    let destination = Arc::new(
        MockChain::new(CHAIN_B)
            .with_journal(journal.clone())
            .script_root(CHAIN_A, 7, vec![Ok(B256::ZERO), Ok(proof.root)]),
    );

    let relay = orchestrator(&source, &destination);
    let outcome = assert_ok!(
        relay
            .send_interop_message("hello interop", RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );

    assert_eq!(outcome.direction, RelayDirection::AToB);
    assert_eq!(outcome.message, "hello interop");
    assert_eq!(outcome.batch_number, 7);
    assert_eq!(outcome.message_index, proof.id);
    assert_eq!(serde_json::to_value(&outcome).unwrap()["direction"], "A→B");

    // proof available on the third poll, root on the second
    assert_eq!(
        journal.count(|e| e.chain_id == CHAIN_A && matches!(e.call, MockCall::InclusionProof { .. })),
        3
    );
    assert_eq!(
        journal.count(|e| is_read(e, CHAIN_B, IInteropRootStorage::interopRootsCall::SELECTOR)),
        2
    );
    assert_eq!(
        journal.count(|e| is_read(e, CHAIN_B, IMessageVerification::proveL2MessageInclusionSharedCall::SELECTOR)),
        1
    );

    let sent = source.submitted();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].selector(), Some(IL1Messenger::sendToL1Call::SELECTOR));
    assert_eq!(sent[0].gas, Some(200_000));
    assert_eq!(sent[0].max_fee_per_gas, Some(1_000_000_000));
    assert_eq!(sent[0].max_priority_fee_per_gas, Some(0));
    assert!(destination.submitted().is_empty());
}

#[tokio::test]
async fn test_message_relay_b_to_a_uses_reverse_chains() {
    let proof = sample_proof(2);
    let journal = interop_relayer::chains::mock::Journal::default();
    let chain_a = Arc::new(
        MockChain::new(CHAIN_A)
            .with_journal(journal.clone())
            .script_root(CHAIN_B, 2, vec![Ok(proof.root)]),
    );
    let chain_b = Arc::new(
        MockChain::new(CHAIN_B)
            .with_journal(journal.clone())
            .script_proofs(vec![Ok(Some(proof.clone()))]),
    );

    let relay = orchestrator(&chain_a, &chain_b);
    let outcome = assert_ok!(
        relay
            .send_interop_message("pong", RelayDirection::BToA, &NoProgress, &CancelToken::never())
            .await
    );

    assert_eq!(outcome.direction, RelayDirection::BToA);
    assert_eq!(chain_b.submitted().len(), 1);
    assert!(chain_a.submitted().is_empty());
    assert_eq!(
        journal.count(|e| is_read(e, CHAIN_A, IInteropRootStorage::interopRootsCall::SELECTOR)),
        1
    );
}

#[tokio::test]
async fn test_message_not_included_fails_execution_phase() {
    let proof = sample_proof(5);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source);
    let destination = Arc::new(destination.with_message_included(false));

    let relay = orchestrator(&source, &destination);
    let failure = assert_err!(
        relay
            .send_interop_message("lost", RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );

    assert_eq!(failure.phase, RelayPhase::Executed);
    assert_eq!(failure.class(), ErrorClass::ProtocolViolation);
    match failure.source {
        RelayError::MessageNotIncluded {
            chain_id,
            batch_number,
            index,
        } => {
            assert_eq!(chain_id, CHAIN_A);
            assert_eq!(batch_number, 5);
            assert_eq!(index, proof.id);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_token_transfer_registers_once() {
    let proof = sample_proof(11);
    let (source, destination, journal) = create_chain_pair(&proof);
    let source = Arc::new(source);
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);
    let amount = U256::from(100u64);

    assert!(!source.is_registered(TOKEN));
    let first = assert_ok!(
        relay
            .transfer_tokens_interop(TOKEN, amount, RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert!(source.is_registered(TOKEN));
    assert_eq!(
        source.submitted_with(INativeTokenVault::ensureTokenIsRegisteredCall::SELECTOR),
        1
    );

    // registration lands before the approval
    let registered_at = journal
        .position(|e| is_submit(e, CHAIN_A, INativeTokenVault::ensureTokenIsRegisteredCall::SELECTOR))
        .unwrap();
    let approved_at = journal
        .position(|e| is_submit(e, CHAIN_A, IERC20::approveCall::SELECTOR))
        .unwrap();
    assert!(registered_at < approved_at);

    let second = assert_ok!(
        relay
            .transfer_tokens_interop(TOKEN, amount, RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(
        source.submitted_with(INativeTokenVault::ensureTokenIsRegisteredCall::SELECTOR),
        1
    );
    assert_eq!(source.submitted_with(IERC20::approveCall::SELECTOR), 2);
    assert_eq!(destination.submitted_with(IInteropHandler::executeBundleCall::SELECTOR), 2);

    assert_eq!(first.amount, amount);
    assert_eq!(first.asset_id, second.asset_id);
    assert_ne!(first.send_tx_hash, second.send_tx_hash);
}

#[tokio::test]
async fn test_token_transfer_transactions() {
    let proof = sample_proof(11);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source.with_transaction_index(4));
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);
    let contracts = relay.settings().contracts;
    let amount = U256::from(250u64);

    let outcome = assert_ok!(
        relay
            .transfer_tokens_interop(TOKEN, amount, RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(outcome.asset_id, compute_asset_id(CHAIN_A, contracts.native_token_vault, TOKEN));
    assert_eq!(outcome.batch_number, 11);

    let approve = source
        .submitted()
        .into_iter()
        .find(|tx| tx.selector() == Some(IERC20::approveCall::SELECTOR))
        .unwrap();
    let approve_call = IERC20::approveCall::abi_decode(&approve.data, true).unwrap();
    assert_eq!(approve.to, TOKEN);
    assert_eq!(approve_call.spender, contracts.native_token_vault);
    assert_eq!(approve_call.amount, amount);

    let send = source
        .submitted()
        .into_iter()
        .find(|tx| tx.selector() == Some(IInteropCenter::sendBundleCall::SELECTOR))
        .unwrap();
    assert_eq!(send.to, contracts.interop_center);
    assert_eq!(send.gas, Some(5_000_000));
    assert_eq!(send.gas_price, Some(1_000_000_000));

    let execute = destination
        .submitted()
        .into_iter()
        .find(|tx| tx.selector() == Some(IInteropHandler::executeBundleCall::SELECTOR))
        .unwrap();
    assert_eq!(execute.to, contracts.interop_handler);
    assert_eq!(execute.from, Some(ACCOUNT));

    let call = IInteropHandler::executeBundleCall::abi_decode(&execute.data, true).unwrap();
    let bundle = decode_bundle(&call._bundle).unwrap();
    assert_eq!(bundle.sourceChainId, U256::from(CHAIN_A));
    assert_eq!(bundle.destinationChainId, U256::from(CHAIN_B));
    assert_eq!(bundle.calls.len(), 1);
    assert_eq!(bundle.calls[0].to, contracts.asset_router);
    assert_eq!(executed_bundle_asset(&destination), outcome.asset_id);

    let proof_arg = call._proof;
    assert_eq!(proof_arg.chainId, U256::from(CHAIN_A));
    assert_eq!(proof_arg.l1BatchNumber, U256::from(11u64));
    assert_eq!(proof_arg.l2MessageIndex, U256::from(proof.id));
    assert_eq!(proof_arg.proof, proof.proof);
    assert_eq!(proof_arg.message.txNumberInBatch, 4);
    assert_eq!(proof_arg.message.sender, contracts.interop_center);
    assert_eq!(proof_arg.message.data[0], 0x01);
    assert_eq!(&proof_arg.message.data[1..], &call._bundle[..]);
}

#[tokio::test]
async fn test_transfer_burns_the_moved_token() {
    let proof = sample_proof(11);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source);
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);
    let vault = relay.settings().contracts.native_token_vault;
    let other = Address::repeat_byte(0xaa);

    let outcome = assert_ok!(
        relay
            .transfer_tokens_interop(other, U256::from(5u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert!(source.is_registered(other));

    let expected = compute_asset_id(CHAIN_A, vault, other);
    assert_ne!(expected, compute_asset_id(CHAIN_A, vault, TOKEN));
    assert_eq!(outcome.asset_id, expected);
    assert_eq!(executed_bundle_asset(&destination), expected);
}

#[tokio::test]
async fn test_bridged_token_burns_registered_asset() {
    let proof = sample_proof(11);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let vault = create_test_settings().contracts.native_token_vault;
    let bridged = Address::repeat_byte(0xbb);
    let origin_id = compute_asset_id(CHAIN_B, vault, Address::repeat_byte(0xcc));
    let source = Arc::new(source.with_registered_token(bridged, origin_id));
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);

    let outcome = assert_ok!(
        relay
            .transfer_tokens_interop(bridged, U256::from(5u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(
        source.submitted_with(INativeTokenVault::ensureTokenIsRegisteredCall::SELECTOR),
        0
    );
    assert_eq!(outcome.asset_id, origin_id);
    assert_eq!(executed_bundle_asset(&destination), origin_id);
}

#[tokio::test]
async fn test_conflicting_registration_is_rejected() {
    let proof = sample_proof(11);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source.with_registered_token(TOKEN, B256::repeat_byte(0x77)));
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);

    let failure = assert_err!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(5u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(failure.phase, RelayPhase::TokenRegistrationChecked);
    assert!(matches!(
        failure.source,
        RelayError::AssetMismatch { token, registered, .. } if token == TOKEN && registered == B256::repeat_byte(0x77)
    ));
    assert_eq!(failure.class(), ErrorClass::ProtocolViolation);
    assert_eq!(source.submitted_with(IERC20::approveCall::SELECTOR), 0);
}

#[tokio::test]
async fn test_unconfirmed_send_bundle_is_not_retryable() {
    let proof = sample_proof(3);
    let (source, destination, journal) = create_chain_pair(&proof);
    let source = Arc::new(source.unconfirmed(IInteropCenter::sendBundleCall::SELECTOR));
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);

    let failure = assert_err!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(failure.phase, RelayPhase::BundleSubmitted);
    assert!(matches!(
        failure.source,
        RelayError::ReceiptUnavailable { chain_id: CHAIN_A, .. }
    ));
    assert_eq!(failure.class(), ErrorClass::OutcomeUnknown);
    assert!(!failure.source.is_retryable());
    assert_eq!(source.submitted_with(IInteropCenter::sendBundleCall::SELECTOR), 1);
    assert_eq!(journal.count(|e| e.call == MockCall::FinalizedBlock), 0);
}

#[tokio::test]
async fn test_phases_run_in_order() {
    let proof = sample_proof(3);
    let (source, destination, journal) = create_chain_pair(&proof);
    let source = Arc::new(source);
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);

    assert_ok!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );

    let sent = journal
        .position(|e| is_submit(e, CHAIN_A, IInteropCenter::sendBundleCall::SELECTOR))
        .unwrap();
    let finalized = journal
        .position(|e| e.chain_id == CHAIN_A && e.call == MockCall::FinalizedBlock)
        .unwrap();
    let proved = journal
        .position(|e| e.chain_id == CHAIN_A && matches!(e.call, MockCall::InclusionProof { log_index: 0, .. }))
        .unwrap();
    let root = journal
        .position(|e| is_read(e, CHAIN_B, IInteropRootStorage::interopRootsCall::SELECTOR))
        .unwrap();
    let executed = journal
        .position(|e| is_submit(e, CHAIN_B, IInteropHandler::executeBundleCall::SELECTOR))
        .unwrap();

    assert!(sent < finalized);
    assert!(finalized < proved);
    assert!(proved < root);
    assert!(root < executed);
}

#[tokio::test]
async fn test_progress_events_follow_phases() {
    let proof = sample_proof(3);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source);
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);
    let (sink, events) = recording_sink();

    assert_ok!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &sink, &CancelToken::never())
            .await
    );

    let events = events.lock().unwrap().clone();
    assert_eq!(
        events[0],
        RelayProgress::Connected {
            source_chain: CHAIN_A,
            destination_chain: CHAIN_B,
        }
    );

    let completed: Vec<RelayPhase> = events
        .iter()
        .filter_map(|e| match e {
            RelayProgress::PhaseCompleted { phase } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        completed,
        vec![
            RelayPhase::TokenRegistrationChecked,
            RelayPhase::Approved,
            RelayPhase::BundleBuilt,
            RelayPhase::BundleSubmitted,
            RelayPhase::Finalized,
            RelayPhase::ProofObtained,
            RelayPhase::RootPropagated,
            RelayPhase::Executed,
        ]
    );

    // each phase starts only after the previous one completed
    let mut open: Option<RelayPhase> = None;
    for event in &events {
        match event {
            RelayProgress::PhaseStarted { phase } => {
                assert!(open.is_none(), "{phase} started while {open:?} was running");
                open = Some(*phase);
            }
            RelayProgress::PhaseCompleted { phase } => {
                assert_eq!(open.take(), Some(*phase));
            }
            RelayProgress::TransactionSent { phase, .. } => assert_eq!(open, Some(*phase)),
            _ => {}
        }
    }

    let sent = events
        .iter()
        .filter(|e| matches!(e, RelayProgress::TransactionSent { .. }))
        .count();
    // register, approve, send bundle, execute
    assert_eq!(sent, 4);
}

#[tokio::test]
async fn test_reverted_send_bundle_is_not_retried() {
    let proof = sample_proof(3);
    let (source, destination, journal) = create_chain_pair(&proof);
    let source = Arc::new(source.reverting(IInteropCenter::sendBundleCall::SELECTOR));
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);

    let failure = assert_err!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(failure.phase, RelayPhase::BundleSubmitted);
    assert!(matches!(
        failure.source,
        RelayError::SubmissionReverted { chain_id: CHAIN_A, .. }
    ));
    assert!(!failure.source.is_retryable());
    assert_eq!(source.submitted_with(IInteropCenter::sendBundleCall::SELECTOR), 1);
    assert_eq!(journal.count(|e| e.call == MockCall::FinalizedBlock), 0);
}

#[tokio::test]
async fn test_rejected_approval_fails_approval_phase() {
    let proof = sample_proof(3);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source.rejecting(IERC20::approveCall::SELECTOR));
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);

    let failure = assert_err!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(failure.phase, RelayPhase::Approved);
    assert!(matches!(failure.source, RelayError::Submission(_)));
    assert_eq!(source.submitted_with(IInteropCenter::sendBundleCall::SELECTOR), 0);
}

#[tokio::test]
async fn test_missing_bundle_event_is_protocol_violation() {
    let proof = sample_proof(3);
    let (source, destination, journal) = create_chain_pair(&proof);
    let source = Arc::new(source.with_bundle_event_copies(0));
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);

    let failure = assert_err!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(failure.phase, RelayPhase::BundleSubmitted);
    assert_eq!(failure.class(), ErrorClass::ProtocolViolation);
    assert!(matches!(
        failure.source,
        RelayError::Bundle(BundleError::EventNotFound { .. })
    ));
    assert_eq!(journal.count(|e| e.call == MockCall::FinalizedBlock), 0);
}

#[tokio::test]
async fn test_duplicate_bundle_events_are_rejected() {
    let proof = sample_proof(3);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source.with_bundle_event_copies(2));
    let destination = Arc::new(destination);
    let relay = orchestrator(&source, &destination);

    let failure = assert_err!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert!(matches!(
        failure.source,
        RelayError::Bundle(BundleError::DuplicateEvent { count: 2, .. })
    ));
}

#[tokio::test]
async fn test_execution_revert_is_terminal() {
    let proof = sample_proof(3);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source);
    let destination = Arc::new(destination.reverting(IInteropHandler::executeBundleCall::SELECTOR));
    let relay = orchestrator(&source, &destination);

    let failure = assert_err!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(failure.phase, RelayPhase::Executed);
    assert!(matches!(
        failure.source,
        RelayError::ExecutionReverted { chain_id: CHAIN_B, .. }
    ));
    assert_eq!(destination.submitted_with(IInteropHandler::executeBundleCall::SELECTOR), 1);
}

#[tokio::test]
async fn test_root_mismatch_aborts_before_execution() {
    let proof = sample_proof(9);
    let journal = interop_relayer::chains::mock::Journal::default();
    let source = Arc::new(
        MockChain::new(CHAIN_A)
            .with_journal(journal.clone())
            .script_proofs(vec![Ok(Some(proof.clone()))]),
    );
    let destination = Arc::new(
        MockChain::new(CHAIN_B)
            .with_journal(journal.clone())
            .script_root(CHAIN_A, 9, vec![Ok(B256::repeat_byte(0x99))]),
    );
    let relay = orchestrator(&source, &destination);

    let failure = assert_err!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_eq!(failure.phase, RelayPhase::RootPropagated);
    assert!(matches!(failure.source, RelayError::RootMismatch { .. }));
    assert!(destination.submitted().is_empty());
}

#[tokio::test]
async fn test_cancel_during_finality() {
    let proof = sample_proof(3);
    let (source, destination, journal) = create_chain_pair(&proof);
    let source = Arc::new(source.script_finalized(vec![Ok(Some(0))]));
    let destination = Arc::new(destination);

    let mut settings = create_test_settings();
    settings.polling.finality = PollPolicy::new(Duration::from_millis(20), 1_000);
    let relay = RelayOrchestrator::new(source.clone(), destination.clone(), settings);

    let (handle, token) = cancellation();
    let (result, _) = tokio::join!(
        relay.send_interop_message("never finalized", RelayDirection::AToB, &NoProgress, &token),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.cancel();
        }
    );

    let failure = assert_err!(result);
    assert_eq!(failure.phase, RelayPhase::Finalized);
    assert_eq!(failure.class(), ErrorClass::Cancelled);

    let polls = journal.len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(journal.len(), polls);
    assert_eq!(
        journal.count(|e| matches!(e.call, MockCall::InclusionProof { .. })),
        0
    );
}

#[tokio::test]
async fn test_metrics_track_outcomes() {
    let proof = sample_proof(3);
    let (source, destination, _journal) = create_chain_pair(&proof);
    let source = Arc::new(source);
    let destination = Arc::new(destination.with_message_included(false));
    let metrics = Arc::new(RelayerMetrics::new().unwrap());
    let relay = orchestrator(&source, &destination).with_metrics(metrics.clone());

    assert_ok!(
        relay
            .transfer_tokens_interop(TOKEN, U256::from(1u64), RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );
    assert_err!(
        relay
            .send_interop_message("dropped", RelayDirection::AToB, &NoProgress, &CancelToken::never())
            .await
    );

    assert_eq!(metrics.relays_started.get(), 2.0);
    assert_eq!(metrics.relays_completed.get(), 1.0);
    assert_eq!(metrics.relays_failed.with_label_values(&["execution"]).get(), 1.0);
    assert_eq!(metrics.relay_duration.get_sample_count(), 1);
}

#[tokio::test]
async fn test_wrapped_token_lookup() {
    let asset_id = compute_asset_id(CHAIN_A, interop_relayer::interop::abi::L2_NATIVE_TOKEN_VAULT_ADDRESS, TOKEN);
    let wrapped = Address::repeat_byte(0x77);
    let chain_a = Arc::new(MockChain::new(CHAIN_A));
    let chain_b = Arc::new(
        MockChain::new(CHAIN_B)
            .with_wrapped_token(asset_id, wrapped)
            .with_balance(wrapped, ACCOUNT, U256::from(42u64)),
    );
    let relay = orchestrator(&chain_a, &chain_b);

    assert_eq!(assert_ok!(relay.wrapped_token_address(ChainSide::A, asset_id).await), None);
    assert_eq!(
        assert_ok!(relay.wrapped_token_address(ChainSide::B, asset_id).await),
        Some(wrapped)
    );
    assert_eq!(
        assert_ok!(relay.token_balance(ChainSide::B, wrapped, ACCOUNT).await),
        U256::from(42u64)
    );
    assert_eq!(relay.asset_id_for(TOKEN, CHAIN_B), asset_id);
}
