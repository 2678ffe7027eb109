#![cfg(feature = "sled")]

#[macro_use]
mod common;

use kvspace::config::SledConfig;
use kvspace::databases::sled_store::SledStore;
use kvspace::prelude::*;
use kvspace::TxnStatus;
use tempfile::TempDir;

fn file_store() -> (TempDir, SledStore) {
    let dir = TempDir::new().unwrap();
    let store = SledStore::open(dir.path().join("kv")).unwrap();
    (dir, store)
}

mod file {
    use super::*;
    conformance_tests!(file_store);
}

mod memory {
    use super::*;
    conformance_tests!(|| ((), SledStore::temp().unwrap()));
}

#[test]
fn test_reads_are_read_committed() {
    common::init_logging();
    let ctx = Context::new();
    let store = SledStore::temp().unwrap();
    store.put(&ctx, b"k", b"old").unwrap();

    let reader = store.new_transaction(&ctx, true).unwrap();
    assert_eq!(reader.get(&ctx, b"k").unwrap(), b"old");
    store.put(&ctx, b"k", b"new").unwrap();
    assert_eq!(reader.get(&ctx, b"k").unwrap(), b"new");
    reader.discard(&ctx).unwrap();
}

#[test]
fn test_own_writes_shadow_concurrent_commits() {
    let ctx = Context::new();
    let store = SledStore::temp().unwrap();
    let txn = store.new_transaction(&ctx, false).unwrap();
    txn.put(&ctx, b"k", b"mine").unwrap();
    store.put(&ctx, b"k", b"theirs").unwrap();
    assert_eq!(txn.get(&ctx, b"k").unwrap(), b"mine");
    txn.commit(&ctx).unwrap();
    assert_eq!(store.get(&ctx, b"k").unwrap(), b"mine");
}

#[test]
fn test_data_survives_reopen() {
    common::init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kv");
    let ctx = Context::new();
    {
        let config = SledConfig::builder()
            .path(&path)
            .cache_capacity(8 << 20)
            .flush_every_ms(100)
            .build();
        let store = SledStore::new(config).unwrap();
        store.put(&ctx, b"persist", b"yes").unwrap();
        store.close().unwrap();
    }
    let store = SledStore::open(&path).unwrap();
    assert_eq!(store.get(&ctx, b"persist").unwrap(), b"yes");
}

#[test]
fn test_status_transitions() {
    let ctx = Context::new();
    let store = SledStore::temp().unwrap();
    let txn = store.new_transaction(&ctx, false).unwrap();
    common::assert_status(txn.status(), TxnStatus::Active);
    txn.discard(&ctx).unwrap();
    common::assert_status(txn.status(), TxnStatus::Discarded);
    txn.commit(&ctx).unwrap();
    common::assert_status(txn.status(), TxnStatus::Discarded);
}

#[test]
fn test_from_db_shares_tree() {
    let ctx = Context::new();
    let db = sled::Config::new().temporary(true).open().unwrap();
    db.insert(b"native", b"1".as_slice()).unwrap();
    let store = SledStore::from_db(db);
    assert_eq!(store.get(&ctx, b"native").unwrap(), b"1");
    store.flush().unwrap();
}
