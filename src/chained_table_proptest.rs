#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check the
// chain structure through `assert_consistent`.

use crate::chained_table::HashTable;
use crate::error::InsertError;
use crate::strategy::{FnStrategy, KeyStrategy};
use proptest::prelude::*;
use std::collections::HashMap;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, u32),
    Replace(usize, u32),
    Remove(usize),
    Lookup(usize),
    Mutate(usize, u32),
    Bulk(Vec<usize>),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u64>, Vec<OpI>)> {
    // Mix of small ids and aligned "addresses" so both the low and the
    // rotated-in high bits of the pointer hash are exercised.
    let key = prop_oneof![0u64..64, (0u64..1 << 20).prop_map(|a| 0x7f00_0000 + a * 16)];
    proptest::collection::vec(key, 1..=48).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            6 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Replace(i, v)),
            5 => idx.clone().prop_map(OpI::Remove),
            3 => idx.clone().prop_map(OpI::Lookup),
            1 => (idx.clone(), any::<u32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => proptest::collection::vec(idx.clone(), 0..40).prop_map(OpI::Bulk),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn check_load_bounds<K, V, S>(t: &HashTable<K, V, S>) -> Result<(), TestCaseError> {
    let lf = t.load_factor();
    prop_assert!(lf <= t.policy().grow_above(), "load {} above grow threshold", lf);
    if t.num_buckets() > t.policy().min_buckets() {
        prop_assert!(lf >= t.policy().shrink_below(), "load {} below shrink threshold", lf);
    }
    Ok(())
}

fn run<S: KeyStrategy<u64>>(
    mut sut: HashTable<u64, u32, S>,
    pool: Vec<u64>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<u64, u32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i];
                let already = model.contains_key(&k);
                match sut.insert(k, v) {
                    Ok(()) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.get(&k), model.get(&k), "rejected insert left value alone");
                    }
                    Err(InsertError::Alloc(e)) => prop_assert!(false, "unexpected alloc failure: {}", e),
                }
            }
            OpI::Replace(i, v) => {
                let k = pool[i];
                let prev = sut.replace(k, v).expect("replace allocates");
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = pool[i];
                let buckets = sut.num_buckets();
                let removed = sut.remove(&k);
                prop_assert_eq!(removed, model.remove(&k));
                if removed.is_none() {
                    prop_assert_eq!(sut.num_buckets(), buckets, "absent remove must not resize");
                }
                prop_assert!(sut.lookup(&k).is_none());
            }
            OpI::Lookup(i) => {
                let k = pool[i];
                let found = sut.lookup(&k);
                prop_assert_eq!(found.map(|e| *e.value()), model.get(&k).copied());
                if let Some(e) = found {
                    prop_assert_eq!(*e.key(), k);
                    prop_assert_eq!(e.hash(), sut.strategy().hash(&k));
                }
            }
            OpI::Mutate(i, d) => {
                let k = pool[i];
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(s), Some(m)) => {
                        *s = s.wrapping_add(d);
                        *m = m.wrapping_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "get_mut presence differs from model"),
                }
            }
            OpI::Bulk(idxs) => {
                // Long runs of inserts push the table through several grows.
                for i in idxs {
                    let k = pool[i];
                    let _ = sut.replace(k, i as u32).expect("replace allocates");
                    model.insert(k, i as u32);
                }
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.num_buckets(), sut.policy().min_buckets());
            }
        }

        // Post-conditions after each op
        sut.assert_consistent();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        check_load_bounds(&sut)?;
    }

    // Every pair the model holds is reachable, so no rehash lost content.
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - Duplicate keys are rejected; the stored value is untouched.
// - Round-trip: a stored value is returned by lookup until removed.
// - `remove` returns the stored value; absent removes do not resize.
// - Bucket count stays a power of two >= 16; load factor stays within the
//   thresholds except at the minimum size.
// - Rehash never changes the set of reachable pairs.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(HashTable::new(), pool, ops)?;
    }
}

// Property: Same state-machine invariants as above under worst-case
// collision behavior (constant hash). Every entry lands in one chain, which
// stresses head, middle and tail unlinking.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let strategy = FnStrategy::new(|_: &u64| 0x5a5a_u64, |a: &u64, b: &u64| a == b);
        run(HashTable::with_strategy(strategy), pool, ops)?;
    }
}

// Property: Hashes that differ only above the bucket mask collide in the
// index but never satisfy the cached-hash check against each other.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_high_bit_hashes((pool, ops) in arb_scenario()) {
        let strategy = FnStrategy::new(|k: &u64| k.wrapping_mul(0x9e37_79b9) << 32, |a: &u64, b: &u64| a == b);
        run(HashTable::with_strategy(strategy), pool, ops)?;
    }
}
