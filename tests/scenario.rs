// Presence-predicate scenario.
//
// A driver owns one table (default pointer-hash strategy) and one fixed key.
// `set_pred_true` removes the key and inserts it again, `set_pred_false`
// only removes it, and `get_pred` asks whether the key is present. Each test
// builds its own driver; there is no shared state between tests.
use chain_table::HashTable;

type Key = [u8; 18];
type Value = [u8; 11];

const KEY: &Key = b"some random string";
const VALUE: &Value = b"some string";

struct Driver {
    table: HashTable<Key, Value>,
    key: Key,
}

impl Driver {
    fn new() -> Self {
        Self {
            table: HashTable::new(),
            key: *KEY,
        }
    }

    fn set_pred_true(&mut self) {
        let _ = self.table.remove(&self.key);
        self.table.insert(self.key, *VALUE).expect("insert after remove");
    }

    fn set_pred_false(&mut self) -> Option<Value> {
        self.table.remove(&self.key)
    }

    fn get_pred(&self) -> bool {
        self.table.lookup(&self.key).is_some()
    }
}

// Test: the full remove / insert / lookup / remove / lookup sequence.
// Verifies: the absent remove is a no-op, the inserted value is found, and
// the second remove hands back exactly that value.
#[test]
fn found_then_not_found() {
    let mut t: HashTable<Key, Value> = HashTable::new();

    assert_eq!(t.remove(KEY), None);
    assert_eq!(t.len(), 0);

    t.insert(*KEY, *VALUE).unwrap();
    let e = t.lookup(KEY).expect("found");
    assert_eq!(e.key(), KEY);
    assert_eq!(e.value(), VALUE);

    assert_eq!(t.remove(KEY), Some(*VALUE));
    assert!(t.lookup(KEY).is_none());
    assert!(t.is_empty());
}

#[test]
fn driver_fresh_table_is_false() {
    let d = Driver::new();
    assert!(!d.get_pred());
}

#[test]
fn driver_set_true() {
    let mut d = Driver::new();
    d.set_pred_true();
    assert!(d.get_pred());
    // Repeating is idempotent: the remove clears the way for the insert.
    d.set_pred_true();
    assert!(d.get_pred());
    assert_eq!(d.table.len(), 1);
}

#[test]
fn driver_set_false() {
    let mut d = Driver::new();
    assert_eq!(d.set_pred_false(), None);
    assert!(!d.get_pred());

    d.set_pred_true();
    assert_eq!(d.set_pred_false(), Some(*VALUE));
    assert!(!d.get_pred());
}

// Test: keys that are real addresses, as in an embedding runtime that maps
// objects to metadata. The address of each string is the key, not its text.
#[test]
fn address_keys() {
    let a = String::from("some random string");
    let b = a.clone();
    let mut t: HashTable<*const u8, &'static str> = HashTable::new();

    t.insert(a.as_ptr(), "some string").unwrap();
    assert_eq!(t.get(&a.as_ptr()), Some(&"some string"));
    // Same text, different allocation: a different key.
    assert!(t.get(&b.as_ptr()).is_none());

    assert_eq!(t.remove(&a.as_ptr()), Some("some string"));
    assert!(!t.contains_key(&a.as_ptr()));
}
