// Shared conformance suite run against every backend.
#![allow(dead_code)]

use std::sync::Once;
use std::thread;
use std::time::Duration;

use kvspace::prelude::*;
use kvspace::TxnStatus;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn kv(key: &str, value: &str) -> (Vec<u8>, Vec<u8>) {
    (key.as_bytes().to_vec(), value.as_bytes().to_vec())
}

/// Generate one `#[test]` per conformance check.
///
/// `$open` returns `(guard, store)`; the guard keeps temporary directories
/// alive for the duration of the test.
#[macro_export]
macro_rules! conformance_tests {
    (@tests $open:expr; $($check:ident),+ $(,)?) => {
        $(
            #[test]
            fn $check() {
                $crate::common::init_logging();
                let (_guard, store) = $open();
                $crate::common::$check(&store);
            }
        )+
    };
    ($open:expr) => {
        conformance_tests!(@tests $open;
            last_write_wins,
            delete_semantics,
            seek_order,
            own_writes_merge_into_scans,
            prefix_scenario,
            two_transactions_iterate_alike,
            commit_publishes_all_writes,
            discard_drops_writes,
            use_after_end,
            double_close,
            read_only_rejects_writes,
            cancellation,
            drop_discards,
            update_discards_on_error,
            concurrent_transactions,
        );
    };
}

pub fn last_write_wins<S: Transactional>(store: &S) {
    let ctx = Context::new();
    store.put(&ctx, b"k", b"1").unwrap();
    store.put(&ctx, b"k", b"2").unwrap();
    assert_eq!(store.get(&ctx, b"k").unwrap(), b"2");

    store
        .update(&ctx, |txn| {
            txn.put(&ctx, b"k", b"3")?;
            assert_eq!(txn.get(&ctx, b"k")?, b"3");
            txn.put(&ctx, b"k", b"4")?;
            assert_eq!(txn.get(&ctx, b"k")?, b"4");
            Ok(())
        })
        .unwrap();
    assert_eq!(store.get(&ctx, b"k").unwrap(), b"4");

    store.put(&ctx, b"empty", b"").unwrap();
    assert_eq!(store.get(&ctx, b"empty").unwrap(), b"");
}

pub fn delete_semantics<S: Transactional>(store: &S) {
    let ctx = Context::new();
    assert!(store.delete(&ctx, b"missing").unwrap_err().is_not_found());
    assert!(store.get(&ctx, b"missing").unwrap_err().is_not_found());

    store.put(&ctx, b"k", b"v").unwrap();
    store.delete(&ctx, b"k").unwrap();
    assert!(store.get(&ctx, b"k").unwrap_err().is_not_found());
    assert!(store.delete(&ctx, b"k").unwrap_err().is_not_found());

    store.put(&ctx, b"t", b"v").unwrap();
    let txn = store.new_transaction(&ctx, false).unwrap();
    assert!(txn.delete(&ctx, b"missing").unwrap_err().is_not_found());
    txn.delete(&ctx, b"t").unwrap();
    assert!(txn.get(&ctx, b"t").unwrap_err().is_not_found());
    assert!(txn.delete(&ctx, b"t").unwrap_err().is_not_found());
    assert_eq!(store.get(&ctx, b"t").unwrap(), b"v");
    txn.commit(&ctx).unwrap();
    assert!(store.get(&ctx, b"t").unwrap_err().is_not_found());
}

pub fn seek_order<S: Transactional>(store: &S) {
    let ctx = Context::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut keys: Vec<Vec<u8>> = (0..600)
        .map(|_| {
            let len = rng.gen_range(1..12);
            (0..len).map(|_| rng.gen_range(0..=u8::MAX)).collect()
        })
        .collect();

    store
        .update(&ctx, |txn| {
            for key in &keys {
                txn.put(&ctx, key, key)?;
            }
            Ok(())
        })
        .unwrap();
    keys.sort();
    keys.dedup();

    let all = store
        .view(&ctx, |txn| collect(txn.seek(&ctx, b"")?, &ctx))
        .unwrap();
    let scanned: Vec<Vec<u8>> = all.iter().map(|(key, _)| key.clone()).collect();
    assert_eq!(scanned, keys);
    assert!(all.iter().all(|(key, value)| key == value));

    let start = keys[keys.len() / 2].clone();
    let mut probe = start.clone();
    probe.push(0);
    for from in [start, probe] {
        let tail = store
            .view(&ctx, |txn| collect_n(txn.seek(&ctx, &from)?, &ctx, 50))
            .unwrap();
        assert!(!tail.is_empty());
        assert!(tail[0].0 >= from);
        assert!(tail.windows(2).all(|pair| pair[0].0 < pair[1].0));
        let expected: Vec<_> = keys.iter().filter(|key| **key >= from).take(50).collect();
        let got: Vec<_> = tail.iter().map(|(key, _)| key).collect();
        assert_eq!(got, expected);
    }
}

pub fn own_writes_merge_into_scans<S: Transactional>(store: &S) {
    let ctx = Context::new();
    for (key, value) in [("a", "1"), ("c", "3"), ("e", "5")] {
        store.put(&ctx, key.as_bytes(), value.as_bytes()).unwrap();
    }

    let txn = store.new_transaction(&ctx, false).unwrap();
    txn.put(&ctx, b"b", b"2").unwrap();
    txn.put(&ctx, b"c", b"33").unwrap();
    txn.delete(&ctx, b"e").unwrap();
    txn.put(&ctx, b"f", b"6").unwrap();

    let seen = collect(txn.seek(&ctx, b"").unwrap(), &ctx).unwrap();
    assert_eq!(seen, vec![kv("a", "1"), kv("b", "2"), kv("c", "33"), kv("f", "6")]);

    let from_c = collect(txn.seek(&ctx, b"c").unwrap(), &ctx).unwrap();
    assert_eq!(from_c, vec![kv("c", "33"), kv("f", "6")]);
    txn.discard(&ctx).unwrap();

    let committed = store
        .view(&ctx, |txn| collect(txn.seek(&ctx, b"")?, &ctx))
        .unwrap();
    assert_eq!(committed, vec![kv("a", "1"), kv("c", "3"), kv("e", "5")]);
}

pub fn prefix_scenario<S: Transactional>(store: &S) {
    let ctx = Context::new();
    for (key, value) in [("A0", "1"), ("A01", "2"), ("A02", "3"), ("A021", "4"), ("A022", "5")] {
        store.put(&ctx, key.as_bytes(), value.as_bytes()).unwrap();
    }
    store.delete(&ctx, b"A02").unwrap();

    assert_eq!(store.get(&ctx, b"A0").unwrap(), b"1");
    assert_eq!(store.get(&ctx, b"A01").unwrap(), b"2");
    assert!(store.get(&ctx, b"A02").unwrap_err().is_not_found());
    assert_eq!(store.get(&ctx, b"A021").unwrap(), b"4");
    assert_eq!(store.get(&ctx, b"A022").unwrap(), b"5");

    let scanned = store
        .view(&ctx, |txn| collect(txn.seek(&ctx, b"A0")?, &ctx))
        .unwrap();
    assert_eq!(
        scanned,
        vec![kv("A0", "1"), kv("A01", "2"), kv("A021", "4"), kv("A022", "5")]
    );
}

const B_RECORDS: [(&str, &str); 9] = [
    ("B0", "1"),
    ("B01", "2"),
    ("B02", "3"),
    ("B021", "4"),
    ("B022", "5"),
    ("B1", "6"),
    ("B12", "7"),
    ("B123", "8"),
    ("B124", "9"),
];

fn load_b_records<S: Transactional>(store: &S, ctx: &Context) {
    for (key, value) in B_RECORDS {
        store.put(ctx, key.as_bytes(), value.as_bytes()).unwrap();
    }
}

pub fn two_transactions_iterate_alike<S: Transactional>(store: &S) {
    let ctx = Context::new();
    load_b_records(store, &ctx);

    let t1 = store.new_transaction(&ctx, false).unwrap();
    let t2 = store.new_transaction(&ctx, false).unwrap();
    let mut it1 = t1.seek(&ctx, b"B02").unwrap();
    let mut it2 = t2.seek(&ctx, b"B02").unwrap();

    let mut first = Vec::new();
    let mut second = Vec::new();
    // Interleave the two cursors.
    loop {
        let a = it1.next(&ctx);
        let b = it2.next(&ctx);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                first.push(a);
                second.push(b);
            }
            (Err(a), Err(b)) => {
                assert!(a.is_not_found() && b.is_not_found());
                break;
            }
            (a, b) => panic!("cursors diverged: {:?} vs {:?}", a.is_ok(), b.is_ok()),
        }
    }
    it1.close().unwrap();
    it2.close().unwrap();

    assert_eq!(first, second);
    let values: Vec<&[u8]> = first.iter().map(|(_, value)| value.as_slice()).collect();
    assert_eq!(values, vec![b"3", b"4", b"5", b"6", b"7", b"8", b"9"]);

    t1.commit(&ctx).unwrap();
    t2.commit(&ctx).unwrap();
}

/// Two transactions opened before a third one commits into their range keep
/// seeing the range as it was.
pub fn snapshot_isolation<S: Transactional>(store: &S) {
    let ctx = Context::new();
    load_b_records(store, &ctx);

    let t1 = store.new_transaction(&ctx, true).unwrap();
    let t2 = store.new_transaction(&ctx, true).unwrap();

    let writer = store.new_transaction(&ctx, false).unwrap();
    writer.put(&ctx, b"B05", b"new").unwrap();
    writer.delete(&ctx, b"B12").unwrap();
    writer.put(&ctx, b"B1", b"changed").unwrap();
    writer.commit(&ctx).unwrap();

    let before: Vec<_> = B_RECORDS[2..].iter().map(|(k, v)| kv(k, v)).collect();
    let seen1 = collect(t1.seek(&ctx, b"B02").unwrap(), &ctx).unwrap();
    let seen2 = collect(t2.seek(&ctx, b"B02").unwrap(), &ctx).unwrap();
    assert_eq!(seen1, before);
    assert_eq!(seen2, before);
    assert_eq!(t1.get(&ctx, b"B1").unwrap(), b"6");
    assert!(t1.get(&ctx, b"B05").unwrap_err().is_not_found());
    t1.discard(&ctx).unwrap();
    t2.discard(&ctx).unwrap();

    let after = store
        .view(&ctx, |txn| collect(txn.seek(&ctx, b"B02")?, &ctx))
        .unwrap();
    assert_eq!(
        after,
        vec![
            kv("B02", "3"),
            kv("B021", "4"),
            kv("B022", "5"),
            kv("B05", "new"),
            kv("B1", "changed"),
            kv("B123", "8"),
            kv("B124", "9"),
        ]
    );
}

pub fn commit_publishes_all_writes<S: Transactional>(store: &S) {
    let ctx = Context::new();
    let txn = store.new_transaction(&ctx, false).unwrap();
    txn.put(&ctx, b"x1", b"1").unwrap();
    txn.put(&ctx, b"x2", b"2").unwrap();
    assert!(store.get(&ctx, b"x1").unwrap_err().is_not_found());
    assert!(store.get(&ctx, b"x2").unwrap_err().is_not_found());

    txn.commit(&ctx).unwrap();
    assert_eq!(store.get(&ctx, b"x1").unwrap(), b"1");
    assert_eq!(store.get(&ctx, b"x2").unwrap(), b"2");

    // A second commit is a no-op.
    txn.commit(&ctx).unwrap();
}

pub fn discard_drops_writes<S: Transactional>(store: &S) {
    let ctx = Context::new();
    store.put(&ctx, b"keep", b"1").unwrap();

    let txn = store.new_transaction(&ctx, false).unwrap();
    txn.put(&ctx, b"gone", b"1").unwrap();
    txn.delete(&ctx, b"keep").unwrap();
    txn.discard(&ctx).unwrap();
    txn.discard(&ctx).unwrap();

    assert!(store.get(&ctx, b"gone").unwrap_err().is_not_found());
    assert_eq!(store.get(&ctx, b"keep").unwrap(), b"1");
}

pub fn use_after_end<S: Transactional>(store: &S) {
    let ctx = Context::new();
    store.put(&ctx, b"a", b"1").unwrap();
    store.put(&ctx, b"b", b"2").unwrap();

    let txn = store.new_transaction(&ctx, false).unwrap();
    let mut iter = txn.seek(&ctx, b"").unwrap();
    assert_eq!(iter.next(&ctx).unwrap(), kv("a", "1"));
    txn.commit(&ctx).unwrap();

    assert!(matches!(iter.next(&ctx), Err(KvError::UseAfterEnd)));
    iter.close().unwrap();
    assert!(matches!(txn.get(&ctx, b"a"), Err(KvError::UseAfterEnd)));
    assert!(matches!(txn.put(&ctx, b"c", b"3"), Err(KvError::UseAfterEnd)));
    assert!(matches!(txn.delete(&ctx, b"a"), Err(KvError::UseAfterEnd)));
    assert!(matches!(txn.seek(&ctx, b""), Err(KvError::UseAfterEnd)));
    txn.discard(&ctx).unwrap();
    txn.commit(&ctx).unwrap();
}

pub fn double_close<S: Transactional>(store: &S) {
    let ctx = Context::new();
    store.put(&ctx, b"only", b"1").unwrap();

    let txn = store.new_transaction(&ctx, true).unwrap();
    let mut iter = txn.seek(&ctx, b"").unwrap();
    assert_eq!(iter.next(&ctx).unwrap(), kv("only", "1"));
    let end = iter.next(&ctx).unwrap_err();
    assert!(end.is_not_found() && end.is_exhausted());
    assert!(iter.next(&ctx).unwrap_err().is_not_found());

    iter.close().unwrap();
    iter.close().unwrap();
    assert!(iter.next(&ctx).unwrap_err().is_not_found());
    drop(iter);

    let mut unread = txn.seek(&ctx, b"").unwrap();
    unread.close().unwrap();
    assert!(unread.next(&ctx).unwrap_err().is_not_found());
    txn.discard(&ctx).unwrap();
}

pub fn read_only_rejects_writes<S: Transactional>(store: &S) {
    let ctx = Context::new();
    store.put(&ctx, b"k", b"v").unwrap();

    let txn = store.new_transaction(&ctx, true).unwrap();
    assert!(matches!(txn.put(&ctx, b"k", b"w"), Err(KvError::ReadOnly)));
    assert!(matches!(txn.delete(&ctx, b"k"), Err(KvError::ReadOnly)));
    assert_eq!(txn.get(&ctx, b"k").unwrap(), b"v");
    assert_eq!(
        collect(txn.seek(&ctx, b"").unwrap(), &ctx).unwrap(),
        vec![kv("k", "v")]
    );
    txn.commit(&ctx).unwrap();
    assert_eq!(store.get(&ctx, b"k").unwrap(), b"v");
}

pub fn cancellation<S: Transactional>(store: &S) {
    let ctx = Context::new();
    let cancelled = Context::new();
    cancelled.cancel();

    assert!(matches!(store.put(&cancelled, b"k", b"v"), Err(KvError::Cancelled)));
    assert!(matches!(store.get(&cancelled, b"k"), Err(KvError::Cancelled)));
    assert!(matches!(store.delete(&cancelled, b"k"), Err(KvError::Cancelled)));
    assert!(matches!(
        store.new_transaction(&cancelled, false),
        Err(KvError::Cancelled)
    ));

    let expired = Context::with_timeout(Duration::ZERO);
    assert!(matches!(store.get(&expired, b"k"), Err(KvError::Cancelled)));

    store.put(&ctx, b"a", b"1").unwrap();
    let txn = store.new_transaction(&ctx, false).unwrap();
    let mut iter = txn.seek(&ctx, b"").unwrap();
    assert!(matches!(iter.next(&cancelled), Err(KvError::Cancelled)));
    assert_eq!(iter.next(&ctx).unwrap(), kv("a", "1"));
    iter.close().unwrap();

    txn.put(&ctx, b"k", b"v").unwrap();
    assert!(matches!(txn.commit(&cancelled), Err(KvError::Cancelled)));
    assert!(matches!(txn.get(&ctx, b"k"), Err(KvError::UseAfterEnd)));
    assert!(store.get(&ctx, b"k").unwrap_err().is_not_found());
}

pub fn drop_discards<S: Transactional>(store: &S) {
    let ctx = Context::new();
    {
        let txn = store.new_transaction(&ctx, false).unwrap();
        txn.put(&ctx, b"dropped", b"1").unwrap();
        let mut iter = txn.seek(&ctx, b"").unwrap();
        assert_eq!(iter.next(&ctx).unwrap(), kv("dropped", "1"));
    }
    assert!(store.get(&ctx, b"dropped").unwrap_err().is_not_found());
}

pub fn update_discards_on_error<S: Transactional>(store: &S) {
    let ctx = Context::new();
    let result = store.update(&ctx, |txn| {
        txn.put(&ctx, b"partial", b"1")?;
        txn.delete(&ctx, b"absent")
    });
    assert!(result.unwrap_err().is_not_found());
    assert!(store.get(&ctx, b"partial").unwrap_err().is_not_found());
}

const WRITERS: usize = 8;
const WRITES_PER_THREAD: usize = 25;

/// Several threads share one store, each running its own transactions.
pub fn concurrent_transactions<S: Transactional>(store: &S) {
    thread::scope(|scope| {
        for writer in 0..WRITERS {
            scope.spawn(move || {
                let ctx = Context::new();
                let prefix = format!("t{writer}/");
                for i in 0..WRITES_PER_THREAD {
                    let key = format!("{prefix}{i:03}");
                    let txn = store.new_transaction(&ctx, false).unwrap();
                    txn.put(&ctx, key.as_bytes(), key.as_bytes()).unwrap();

                    let mut seen = Vec::new();
                    let mut iter = txn.seek(&ctx, prefix.as_bytes()).unwrap();
                    while let Ok((found, _)) = iter.next(&ctx) {
                        if !found.starts_with(prefix.as_bytes()) {
                            break;
                        }
                        seen.push(found);
                    }
                    iter.close().unwrap();
                    assert_eq!(seen.len(), i + 1, "{key}: own writes missing from scan");

                    txn.commit(&ctx).unwrap();
                }
            });
        }
    });

    let ctx = Context::new();
    let all = store
        .view(&ctx, |txn| collect(txn.seek(&ctx, b"")?, &ctx))
        .unwrap();
    assert_eq!(all.len(), WRITERS * WRITES_PER_THREAD);
    assert!(all.iter().all(|(key, value)| key == value));
}

/// Transaction lifecycle as seen through an adapter's `status()`.
pub fn assert_status(status: TxnStatus, expected: TxnStatus) {
    assert_eq!(status, expected, "unexpected transaction status {status}");
}
