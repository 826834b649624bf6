//! Runs the audit handlers against a snapshot written to a temp directory.

use std::path::{Path, PathBuf};

use pharma_cli::audit::{run_history, run_status, run_trace, run_verify, BatchArgs, StatusArgs, VerifyArgs};
use pharma_cli::registry::{run_actors, run_role, ActorsArgs, RoleArgs};
use pharma_cli::{ChainSource, EXIT_INTEGRITY_FAILURE};
use pharma_core::{BatchId, Timestamp};
use pharma_crypto::Ed25519KeyPair;
use pharma_ledger::{
    ActionRequest, LedgerConfig, LedgerSnapshot, PharmaChain, ProductDescriptor, RegistryCommand,
    Signed,
};
use pharma_state::{Action, Role};

fn key(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(&[seed; 32])
}

/// One delivered batch and one freshly registered batch.
fn build_chain() -> PharmaChain {
    let (authority, regulator, manufacturer, distributor) = (key(0xa0), key(1), key(2), key(3));
    let mut chain = PharmaChain::new(authority.actor_id(), LedgerConfig::default());
    chain
        .administer(
            &Signed::sign(
                RegistryCommand::register(authority.actor_id(), regulator.actor_id(), Role::Regulator),
                &authority,
            )
            .unwrap(),
        )
        .unwrap();
    for (k, role) in [(&manufacturer, Role::Manufacturer), (&distributor, Role::Distributor)] {
        chain
            .administer(
                &Signed::sign(
                    RegistryCommand::register(regulator.actor_id(), k.actor_id(), role),
                    &regulator,
                )
                .unwrap(),
            )
            .unwrap();
    }
    for _ in 0..2 {
        let req = ActionRequest::register(
            manufacturer.actor_id(),
            ProductDescriptor::new("Atorvastatin 20mg", "tablet", 900),
            Timestamp::parse("2026-07-01T00:00:00Z").unwrap(),
        );
        chain.submit(&Signed::sign(req, &manufacturer).unwrap()).unwrap();
    }
    let ship = ActionRequest::existing(manufacturer.actor_id(), BatchId::FIRST, 1, Action::Ship)
        .with_recipient(distributor.actor_id())
        .with_metadata("waybill 5521");
    chain.submit(&Signed::sign(ship, &manufacturer).unwrap()).unwrap();
    chain
}

fn write_snapshot(dir: &Path, snapshot: &LedgerSnapshot) -> PathBuf {
    let path = dir.join("ledger.json");
    snapshot.save(&path).unwrap();
    path
}

fn open(path: &Path) -> PharmaChain {
    ChainSource {
        config: None,
        snapshot: Some(path.to_path_buf()),
    }
    .open()
    .unwrap()
}

fn output(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<u8>) -> (u8, String) {
    let mut buf = Vec::new();
    let code = f(&mut buf).unwrap();
    (code, String::from_utf8(buf).unwrap())
}

#[test]
fn verify_all_batches_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path(), &LedgerSnapshot::capture(&build_chain()));
    let chain = open(&path);

    let (code, text) = output(|out| run_verify(&VerifyArgs { batch: None }, &chain, false, out));
    assert_eq!(code, 0);
    assert!(text.contains("OK    batch:1"));
    assert!(text.contains("OK    batch:2"));
    assert!(text.contains("2 verified, 0 failed"));
}

#[test]
fn verify_json_output() {
    let chain = build_chain();
    let (code, text) = output(|out| {
        run_verify(&VerifyArgs { batch: Some(BatchId::FIRST) }, &chain, true, out)
    });
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["ok"], true);
    assert_eq!(value[0]["report"]["state"], "IN_TRANSIT");
    assert_eq!(value[0]["report"]["records"], 2);
}

#[test]
fn verify_unknown_batch_is_an_error() {
    let chain = build_chain();
    let mut buf = Vec::new();
    let err = run_verify(&VerifyArgs { batch: Some(BatchId::new(9)) }, &chain, false, &mut buf)
        .unwrap_err();
    let ledger_err = err.downcast_ref::<pharma_ledger::LedgerError>().unwrap();
    assert_eq!(ledger_err.kind(), pharma_ledger::ErrorKind::NotFound);
    assert!(buf.is_empty());
}

#[test]
fn verify_success_does_not_use_integrity_exit_code() {
    let chain = build_chain();
    let (code, _) = output(|out| {
        run_verify(&VerifyArgs { batch: Some(BatchId::new(2)) }, &chain, false, out)
    });
    assert_ne!(code, EXIT_INTEGRITY_FAILURE);
    assert_eq!(code, 0);
}

#[test]
fn tampered_snapshot_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = LedgerSnapshot::capture(&build_chain());
    snapshot.batches[0].history[1].body.metadata = Some("waybill 0000".into());
    let path = write_snapshot(dir.path(), &snapshot);

    let err = ChainSource {
        config: None,
        snapshot: Some(path),
    }
    .open()
    .unwrap_err();
    assert!(format!("{err:#}").contains("failed verification"));
}

#[test]
fn trace_and_history_text() {
    let chain = build_chain();
    let args = BatchArgs { batch: BatchId::FIRST };

    let (_, trace) = output(|out| run_trace(&args, &chain, false, out));
    assert!(trace.starts_with("Custody trace for batch:1:"));
    assert!(trace.contains(&key(2).actor_id().to_hex()));
    assert!(trace.contains(&key(3).actor_id().to_hex()));

    let (_, history) = output(|out| run_history(&args, &chain, false, out));
    assert!(history.contains("(2 records)"));
    assert!(history.contains("[waybill 5521]"));
}

#[test]
fn history_json_is_record_list() {
    let chain = build_chain();
    let (_, text) = output(|out| {
        run_history(&BatchArgs { batch: BatchId::FIRST }, &chain, true, out)
    });
    let records: Vec<pharma_state::TransitionRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.digest_matches()));
}

#[test]
fn history_of_unknown_batch_is_an_error() {
    let chain = build_chain();
    let mut buf = Vec::new();
    assert!(run_history(&BatchArgs { batch: BatchId::new(5) }, &chain, false, &mut buf).is_err());
}

#[test]
fn status_lists_every_batch() {
    let chain = build_chain();
    let (_, text) = output(|out| run_status(&StatusArgs { batch: None }, &chain, false, out));
    assert!(text.contains("Total: 2 batches"));
    assert!(text.contains("Atorvastatin 20mg"));
}

#[test]
fn role_and_actor_listing() {
    let chain = build_chain();
    let (_, text) = output(|out| {
        run_role(&RoleArgs { actor: key(3).actor_id() }, &chain, true, out)
    });
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["status"], "registered");
    assert_eq!(value["role"], "DISTRIBUTOR");

    let (_, text) = output(|out| {
        run_role(&RoleArgs { actor: key(0x55).actor_id() }, &chain, false, out)
    });
    assert!(text.trim_end().ends_with("unknown"));

    let (_, text) = output(|out| run_actors(&ActorsArgs { events: true }, &chain, false, out));
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("as REGULATOR"));
}

#[test]
fn config_supplies_snapshot_path() {
    let dir = tempfile::tempdir().unwrap();
    let chain = build_chain();
    let path = write_snapshot(dir.path(), &LedgerSnapshot::capture(&chain));
    let config_path = dir.path().join("chain.yaml");
    std::fs::write(
        &config_path,
        format!(
            "authority: {}\nsnapshot_path: {}\n",
            key(0xa0).actor_id(),
            path.display()
        ),
    )
    .unwrap();

    let opened = ChainSource {
        config: Some(config_path.clone()),
        snapshot: None,
    }
    .open()
    .unwrap();
    assert_eq!(opened.ledger().len(), 2);

    std::fs::write(
        &config_path,
        format!(
            "authority: {}\nsnapshot_path: {}\n",
            key(0xa1).actor_id(),
            path.display()
        ),
    )
    .unwrap();
    let err = ChainSource {
        config: Some(config_path),
        snapshot: None,
    }
    .open()
    .unwrap_err();
    assert!(err.to_string().contains("does not match configured authority"));
}
