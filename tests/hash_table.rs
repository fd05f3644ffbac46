// HashTable public API suite.
//
// The core invariants exercised:
// - Round-trip: insert then lookup returns the stored value.
// - Uniqueness: duplicate insert rejects without touching the table.
// - Removal: remove returns the stored value; absent keys are a no-op.
// - Sizing: bucket count is a power of two >= 16 and follows the 0.50 /
//   0.10 load thresholds.
// - Strategies: pointer hash, closures and BuildHasher all plug in.
use chain_table::{
    AllocError, BuildHasherStrategy, HashTable, InsertError, KeyStrategy, PointerHash,
};
use std::collections::hash_map::RandomState;

// Test: basic round-trip and removal with the default strategy.
#[test]
fn insert_lookup_remove() {
    let mut t: HashTable<usize, u64> = HashTable::new();
    t.insert(0x1000, 1).expect("insert ok");
    t.insert(0x1010, 2).expect("insert ok");
    assert_eq!(t.len(), 2);
    assert_eq!(t.get(&0x1000), Some(&1));
    assert_eq!(t.get(&0x1010), Some(&2));
    assert!(t.get(&0x1020).is_none());

    assert_eq!(t.remove(&0x1000), Some(1));
    assert!(t.get(&0x1000).is_none());
    assert_eq!(t.len(), 1);
}

// Test: unique keys policy.
// Verifies: DuplicateKey error; original value and size unchanged.
#[test]
fn duplicate_insert_rejected() {
    let mut t: HashTable<u32, &str> = HashTable::new();
    t.insert(7, "first").unwrap();
    match t.insert(7, "second") {
        Err(InsertError::DuplicateKey) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(t.get(&7), Some(&"first"));
    assert_eq!(t.len(), 1);
}

// Test: grow and shrink keep every pair reachable and the bucket count a
// power of two, through several resizes in both directions.
#[test]
fn resizes_preserve_contents() {
    let mut t: HashTable<u64, u64> = HashTable::new();
    let mut sizes = vec![t.num_buckets()];
    for k in 0..5_000u64 {
        t.insert(k * 64, k).unwrap();
        if *sizes.last().unwrap() != t.num_buckets() {
            sizes.push(t.num_buckets());
        }
    }
    assert!(sizes.len() > 5, "expected several grows, got {:?}", sizes);
    assert!(sizes.windows(2).all(|w| w[0] < w[1]));
    for k in 0..5_000u64 {
        assert_eq!(t.get(&(k * 64)), Some(&k));
    }

    for k in 0..4_990u64 {
        assert_eq!(t.remove(&(k * 64)), Some(k));
        let n = t.num_buckets();
        assert!(n.is_power_of_two() && n >= 16);
        assert!(t.load_factor() <= 0.5);
        if n > 16 {
            assert!(t.load_factor() >= 0.1);
        }
    }
    // 12 entries shrink 128 -> 64; 10 entries at 64 buckets stay above 0.10.
    assert_eq!(t.num_buckets(), 64);
    for k in 4_990..5_000u64 {
        assert_eq!(t.get(&(k * 64)), Some(&k));
    }
}

// Test: an absent remove neither changes the count nor resizes.
#[test]
fn remove_absent_is_noop() {
    let mut t: HashTable<u64, u64> = HashTable::with_capacity(1024).unwrap();
    t.insert(1, 1).unwrap();
    assert_eq!(t.remove(&2), None);
    assert_eq!(t.len(), 1);
    // A present remove would shrink this sparse table; an absent one must not.
    assert_eq!(t.num_buckets(), 1024);

    assert_eq!(t.remove(&1), Some(1));
    assert_eq!(t.num_buckets(), 16);
}

#[test]
fn capacity_overflow_is_reported() {
    let r: Result<HashTable<u64, u64>, _> = HashTable::with_capacity(usize::MAX);
    assert!(matches!(r, Err(AllocError::CapacityOverflow)));
}

// Test: closures as the strategy. Keys compare case-insensitively, so the
// hash must fold case too.
#[test]
fn closure_strategy() {
    let mut t = HashTable::with_fns(
        0,
        |k: &[u8; 4]| u32::from_ne_bytes(k.map(|b| b.to_ascii_lowercase())) as u64,
        |a: &[u8; 4], b: &[u8; 4]| a.eq_ignore_ascii_case(b),
    )
    .unwrap();
    t.insert(*b"ABCD", 1u8).unwrap();
    assert_eq!(t.get(b"abcd"), Some(&1));
    assert_eq!(t.insert(*b"abCD", 2), Err(InsertError::DuplicateKey));
    assert_eq!(t.remove(b"AbCd"), Some(1));
    assert!(t.is_empty());
}

// Test: BuildHasher-backed strategy for ordinary `Hash + Eq` keys.
#[test]
fn build_hasher_strategy() {
    let mut t: HashTable<(u32, u32), char, _> =
        HashTable::with_strategy(BuildHasherStrategy::new(RandomState::new()));
    for i in 0..100u32 {
        t.insert((i, i * 2), char::from(b'a' + (i % 26) as u8)).unwrap();
    }
    assert_eq!(t.get(&(3, 6)), Some(&'d'));
    assert!(t.get(&(3, 7)).is_none());

    let mut d: HashTable<u16, u16, BuildHasherStrategy> =
        HashTable::with_strategy(BuildHasherStrategy::default());
    d.insert(5, 50).unwrap();
    assert_eq!(d.get(&5), Some(&50));
}

// Test: the cached hash on an entry equals the strategy's hash of its key.
#[test]
fn lookup_reports_cached_hash() {
    let mut t: HashTable<u64, ()> = HashTable::new();
    t.insert(0xdead_beef_0, ()).unwrap();
    let e = t.lookup(&0xdead_beef_0).unwrap();
    assert_eq!(e.hash(), PointerHash.hash(&0xdead_beef_0u64));
}

#[test]
fn widths_follow_types() {
    let t: HashTable<[u8; 18], [u8; 11]> = HashTable::new();
    assert_eq!(t.key_size(), 18);
    assert_eq!(t.value_size(), 11);
}

// Test: the table can be shared behind a lock for concurrent lookups.
#[test]
fn shareable_behind_rwlock() {
    use std::sync::{Arc, RwLock};

    let mut t: HashTable<usize, usize> = HashTable::new();
    for k in 0..64 {
        t.insert(k, k * k).unwrap();
    }
    let shared = Arc::new(RwLock::new(t));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                let t = shared.read().unwrap();
                (0..64).filter(|k| t.get(k) == Some(&(k * k))).count()
            })
        })
        .collect();
    for h in readers {
        assert_eq!(h.join().unwrap(), 64);
    }
    shared.write().unwrap().remove(&3);
    assert!(!shared.read().unwrap().contains_key(&3));
}
