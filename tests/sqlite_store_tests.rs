#![cfg(feature = "sqlite")]

#[macro_use]
mod common;

use std::time::Duration;

use kvspace::config::SqliteConfig;
use kvspace::databases::sqlite_store::SqliteStore;
use kvspace::prelude::*;
use kvspace::TxnStatus;
use tempfile::TempDir;

fn file_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(dir.path().join("kv.db")).unwrap();
    (dir, store)
}

mod file {
    use super::*;
    conformance_tests!(file_store);
}

mod memory {
    use super::*;
    conformance_tests!(|| ((), SqliteStore::temp().unwrap()));
}

#[test]
fn test_snapshot_isolation() {
    common::init_logging();
    let (_dir, store) = file_store();
    common::snapshot_isolation(&store);
}

#[test]
fn test_memory_stores_are_private() {
    let ctx = Context::new();
    let first = SqliteStore::temp().unwrap();
    let second = SqliteStore::temp().unwrap();
    first.put(&ctx, b"k", b"v").unwrap();
    assert!(second.get(&ctx, b"k").unwrap_err().is_not_found());
    assert_eq!(first.path(), None);
}

#[test]
fn test_data_survives_reopen() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kv.db");
    let ctx = Context::new();
    {
        let config = SqliteConfig::builder()
            .path(&path)
            .busy_timeout(Duration::from_millis(500))
            .build();
        let store = SqliteStore::new(config).unwrap();
        store.put(&ctx, b"persist", b"yes").unwrap();
        store.close().unwrap();
    }
    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.path(), Some(path.as_path()));
    assert_eq!(store.get(&ctx, b"persist").unwrap(), b"yes");
}

#[test]
fn test_blob_keys_order_bytewise() {
    let ctx = Context::new();
    let (_dir, store) = file_store();
    for key in [&b"\xff"[..], b"a", b"\x00", b"", b"a\x00", b"ab"] {
        store.put(&ctx, key, b"v").unwrap();
    }
    let keys: Vec<Vec<u8>> = store
        .view(&ctx, |txn| collect(txn.seek(&ctx, b"")?, &ctx))
        .unwrap()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    let expected: Vec<&[u8]> = vec![&b""[..], b"\x00", b"a", b"a\x00", b"ab", b"\xff"];
    assert_eq!(keys, expected);
}

#[test]
fn test_failed_commit_leaves_transaction_discarded() {
    let ctx = Context::new();
    let (_dir, store) = file_store();
    let txn = store.new_transaction(&ctx, false).unwrap();
    txn.put(&ctx, b"k", b"v").unwrap();

    let cancelled = Context::new();
    cancelled.cancel();
    assert!(txn.commit(&cancelled).is_err());
    common::assert_status(txn.status(), TxnStatus::Discarded);
    assert!(store.get(&ctx, b"k").unwrap_err().is_not_found());
}
