// Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{address, Address, B256};
use interop_relayer::chains::mock::{Journal, JournalEntry, MockCall};
use interop_relayer::config::PollingConfig;
use interop_relayer::interop::{AssetOrigin, ProofResponse, SystemContracts};
use interop_relayer::relay::{PollPolicy, RelayProgress};
use interop_relayer::{MockChain, RelaySettings};

pub const CHAIN_A: u64 = 6565;
pub const CHAIN_B: u64 = 6566;
pub const ACCOUNT: Address = address!("36615cf349d7f6344891b1e7ca7c72883f5dc049");
pub const TOKEN: Address = address!("e441cf0795af14ddb9f7984da85cd36db1b8790d");

/// Millisecond polling so scenarios run quickly
pub fn fast_polling() -> PollingConfig {
    PollingConfig {
        finality: PollPolicy::new(Duration::from_millis(1), 50),
        proof: PollPolicy::new(Duration::from_millis(1), 240),
        root: PollPolicy::new(Duration::from_millis(1), 50),
        receipt: PollPolicy::new(Duration::from_millis(1), 10),
    }
}

pub fn create_test_settings() -> RelaySettings {
    RelaySettings {
        account: ACCOUNT,
        contracts: SystemContracts::default(),
        polling: fast_polling(),
        asset_origin: Some(AssetOrigin::new(CHAIN_A, TOKEN)),
    }
}

pub fn sample_proof(batch_number: u64) -> ProofResponse {
    ProofResponse {
        id: 4,
        batch_number,
        proof: vec![B256::repeat_byte(0x11), B256::repeat_byte(0x12)],
        root: B256::repeat_byte(0x22),
    }
}

/// Source chain serving `proof` at once and a destination already holding its root
pub fn create_chain_pair(proof: &ProofResponse) -> (MockChain, MockChain, Journal) {
    let journal = Journal::default();
    let source = MockChain::new(CHAIN_A)
        .with_journal(journal.clone())
        .script_proofs(vec![Ok(Some(proof.clone()))]);
    let destination = MockChain::new(CHAIN_B)
        .with_journal(journal.clone())
        .script_root(CHAIN_A, proof.batch_number, vec![Ok(proof.root)]);
    (source, destination, journal)
}

/// Progress sink collecting every event
pub fn recording_sink() -> (impl Fn(&RelayProgress) + Send + Sync, Arc<Mutex<Vec<RelayProgress>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();
    let sink = move |event: &RelayProgress| sink_events.lock().unwrap().push(event.clone());
    (sink, events)
}

pub fn is_submit(entry: &JournalEntry, chain_id: u64, selector: [u8; 4]) -> bool {
    entry.chain_id == chain_id
        && matches!(entry.call, MockCall::SubmitTransaction { selector: Some(s), .. } if s == selector)
}

pub fn is_read(entry: &JournalEntry, chain_id: u64, selector: [u8; 4]) -> bool {
    entry.chain_id == chain_id && matches!(entry.call, MockCall::Call { selector: Some(s), .. } if s == selector)
}
