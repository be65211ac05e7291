//! Integration tests for the Cosign CLI
//!
//! These tests drive the command layer against a real data directory and
//! reopen the context between steps, the way separate `cosign` runs would.

use cosign_cli::{commands, AppContext, StoredState};
use cosign_core::{Address, Amount};
use cosign_events::EventKind;
use cosign_vault::{VaultConfig, VaultError};
use rust_decimal_macros::dec;
use std::path::Path;
use tempfile::TempDir;

fn addr(n: u8) -> Address {
    Address::from_low_u8(n)
}

fn init_vault(data_path: &Path) {
    commands::init(data_path, "ops", vec![addr(1), addr(2), addr(3)], 2).unwrap();
}

/// Test: init → deposit → submit → confirm x2 → execute, across reopens
#[tokio::test]
async fn test_full_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();
    init_vault(data_path);

    let mut ctx = AppContext::open(data_path).unwrap();
    commands::deposit(&mut ctx, addr(0x42), dec!(100)).unwrap();
    let tx_index =
        commands::submit(&mut ctx, addr(1), addr(0x99), dec!(40), Some("0xbeef")).unwrap();
    assert_eq!(tx_index, 0);
    drop(ctx);

    let mut ctx = AppContext::open(data_path).unwrap();
    commands::confirm(&mut ctx, addr(1), 0).unwrap();
    drop(ctx);

    let mut ctx = AppContext::open(data_path).unwrap();
    commands::confirm(&mut ctx, addr(2), 0).unwrap();
    commands::execute(&mut ctx, addr(3), 0).await.unwrap();
    drop(ctx);

    let ctx = AppContext::open(data_path).unwrap();
    let tx = ctx.vault.transaction(0).unwrap();
    assert!(tx.executed);
    assert_eq!(tx.num_confirmations, 2);
    assert_eq!(tx.data, vec![0xbe, 0xef]);
    assert_eq!(ctx.vault.balance(), Amount::from_units(60));
    assert_eq!(ctx.treasury.paid_to(&addr(0x99)), Amount::from_units(40));

    let kinds: Vec<EventKind> = ctx.history().unwrap().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Deposit,
            EventKind::Submit,
            EventKind::Confirm,
            EventKind::Confirm,
            EventKind::Execute,
        ]
    );
    commands::audit(&ctx).unwrap();
}

/// Test: init refuses to overwrite and rejects bad setups before writing
#[test]
fn test_init_validation() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();

    let err = commands::init(data_path, "bad", vec![addr(1), addr(1)], 1).unwrap_err();
    assert_eq!(
        err.downcast_ref::<VaultError>(),
        Some(&VaultError::OwnerNotUnique(addr(1)))
    );
    assert!(!data_path.join("vault.json").exists());

    init_vault(data_path);
    assert!(commands::init(data_path, "again", vec![addr(4)], 1).is_err());

    let config = VaultConfig::from_file(&data_path.join("vault.json")).unwrap();
    assert_eq!(config.name, "ops");
    assert_eq!(config.required_confirmations, 2);
}

/// Test: open without init fails
#[test]
fn test_open_requires_init() {
    let temp_dir = TempDir::new().unwrap();
    assert!(AppContext::open(temp_dir.path()).is_err());
}

/// Test: rejected operations leave stored state untouched
#[tokio::test]
async fn test_rejections_are_not_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();
    init_vault(data_path);

    let mut ctx = AppContext::open(data_path).unwrap();
    commands::submit(&mut ctx, addr(1), addr(0x99), dec!(5), None).unwrap();
    commands::confirm(&mut ctx, addr(1), 0).unwrap();
    let state_before = std::fs::read_to_string(ctx.state_path()).unwrap();

    let err = commands::confirm(&mut ctx, addr(0x77), 0).unwrap_err();
    assert_eq!(
        err.downcast_ref::<VaultError>(),
        Some(&VaultError::NotOwner(addr(0x77)))
    );
    let err = commands::confirm(&mut ctx, addr(1), 0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VaultError>(),
        Some(VaultError::TxAlreadyConfirmed { .. })
    ));
    let err = commands::execute(&mut ctx, addr(2), 0).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VaultError>(),
        Some(VaultError::CannotExecuteTx { .. })
    ));
    assert!(commands::submit(&mut ctx, addr(1), addr(0x99), dec!(1.5), None).is_err());

    let state_after = std::fs::read_to_string(ctx.state_path()).unwrap();
    assert_eq!(state_before, state_after);
    assert_eq!(ctx.journal_count().unwrap(), 2);
}

/// Test: transfer failure rolls back and the transaction stays executable
#[tokio::test]
async fn test_underfunded_execute_can_retry() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();
    init_vault(data_path);

    let mut ctx = AppContext::open(data_path).unwrap();
    commands::submit(&mut ctx, addr(1), addr(0x99), dec!(10), None).unwrap();
    commands::confirm(&mut ctx, addr(1), 0).unwrap();
    commands::confirm(&mut ctx, addr(2), 0).unwrap();

    let err = commands::execute(&mut ctx, addr(1), 0).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VaultError>(),
        Some(VaultError::TransferFailed { tx_index: 0, .. })
    ));
    drop(ctx);

    let mut ctx = AppContext::open(data_path).unwrap();
    assert!(!ctx.vault.transaction(0).unwrap().executed);
    commands::deposit(&mut ctx, addr(0x42), dec!(10)).unwrap();
    commands::execute(&mut ctx, addr(1), 0).await.unwrap();
    assert!(ctx.vault.transaction(0).unwrap().executed);
    assert_eq!(ctx.vault.balance(), Amount::ZERO);
}

/// Test: revoke persists and history filters by transaction and kind
#[test]
fn test_revoke_and_history_filters() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();
    init_vault(data_path);

    let mut ctx = AppContext::open(data_path).unwrap();
    commands::submit(&mut ctx, addr(1), addr(0x99), dec!(5), None).unwrap();
    commands::submit(&mut ctx, addr(2), addr(0x98), dec!(6), None).unwrap();
    commands::confirm(&mut ctx, addr(3), 1).unwrap();
    commands::revoke(&mut ctx, addr(3), 1).unwrap();
    drop(ctx);

    let ctx = AppContext::open(data_path).unwrap();
    assert!(!ctx.vault.is_confirmed(1, &addr(3)).unwrap());
    assert_eq!(ctx.vault.transaction(1).unwrap().num_confirmations, 0);

    let for_tx = commands::history(&ctx, Some(1), None).unwrap();
    assert_eq!(for_tx.len(), 3);
    let revokes = commands::history(&ctx, None, Some(EventKind::Revoke)).unwrap();
    assert_eq!(revokes.len(), 1);
    assert_eq!(revokes[0].actor(), addr(3));
    assert!(commands::history(&ctx, Some(7), None).unwrap().is_empty());
}

/// Test: a tampered state file is refused on open
#[test]
fn test_tampered_state_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();
    init_vault(data_path);

    let mut ctx = AppContext::open(data_path).unwrap();
    commands::submit(&mut ctx, addr(1), addr(0x99), dec!(5), None).unwrap();
    commands::confirm(&mut ctx, addr(1), 0).unwrap();
    let state_path = ctx.state_path().to_path_buf();
    drop(ctx);

    let content = std::fs::read_to_string(&state_path).unwrap();
    let mut state: StoredState = serde_json::from_str(&content).unwrap();
    state.vault.transactions[0].transaction.num_confirmations = 2;
    std::fs::write(&state_path, serde_json::to_string(&state).unwrap()).unwrap();

    assert!(AppContext::open(data_path).is_err());
}

/// Test: a deposit that cannot be saved is not journaled
#[test]
fn test_unsaved_deposit_not_journaled() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();
    init_vault(data_path);

    let mut ctx = AppContext::open(data_path).unwrap();
    let state_path = ctx.state_path().to_path_buf();
    std::fs::remove_file(&state_path).unwrap();
    std::fs::create_dir(&state_path).unwrap();

    assert!(commands::deposit(&mut ctx, addr(0x42), dec!(10)).is_err());
    assert_eq!(ctx.journal_count().unwrap(), 0);
}

/// Test: list reports pending, ready and executed transactions
#[tokio::test]
async fn test_list_statuses() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path();
    init_vault(data_path);

    let mut ctx = AppContext::open(data_path).unwrap();
    commands::deposit(&mut ctx, addr(0x42), dec!(10)).unwrap();
    for _ in 0..3 {
        commands::submit(&mut ctx, addr(1), addr(0x99), dec!(2), None).unwrap();
    }
    for tx_index in [1, 2] {
        commands::confirm(&mut ctx, addr(1), tx_index).unwrap();
        commands::confirm(&mut ctx, addr(2), tx_index).unwrap();
    }
    commands::execute(&mut ctx, addr(3), 2).await.unwrap();

    assert!(!ctx.vault.is_executable(0).unwrap());
    assert!(ctx.vault.is_executable(1).unwrap());
    assert!(!ctx.vault.is_executable(2).unwrap());
    commands::list(&ctx).unwrap();
}
