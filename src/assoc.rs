//! External per-instance storage keyed by object identity.
//!
//! Containers gain their pipeline, cancellation bag, and cached state
//! without declaring stored fields: each slot kind owns a side table
//! mapping an owner's identity to a value. The table never keeps an owner
//! alive, and a value is unreachable once its owner is gone.
//!
//! The locking here only makes the tables memory-safe. The usage contract
//! is single-writer: callers must not mutate one owner's entries from
//! multiple execution contexts at once.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Side table for one slot kind.
///
/// Keys are the owner's allocation address. Every entry carries a `Weak`
/// to its owner, so a lookup by a dead key never succeeds even if the
/// address has been reused, and dead entries are swept whenever a new
/// entry is inserted.
pub(crate) struct AssocTable {
    entries: Mutex<HashMap<usize, Entry>>,
}

struct Entry {
    owner: Weak<dyn Any + Send + Sync>,
    value: Box<dyn Any + Send + Sync>,
}

impl Entry {
    fn new<R, V>(owner: &Arc<R>, value: V) -> Self
    where
        R: Any + Send + Sync,
        V: Any + Send + Sync,
    {
        let weak = Arc::downgrade(owner);
        Self {
            owner: weak,
            value: Box::new(value),
        }
    }

    fn is_live(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

impl AssocTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the value stored for `owner`, inserting `init()` if the
    /// slot is empty. The flag is `true` when this call inserted.
    pub(crate) fn value_or_insert_with<R, V, F>(&self, owner: &Arc<R>, init: F) -> (V, bool)
    where
        R: Any + Send + Sync,
        V: Any + Send + Sync + Clone,
        F: FnOnce() -> V,
    {
        let key = key_of(owner);
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(&key) {
            if entry.is_live() {
                let value = entry
                    .value
                    .downcast_ref::<V>()
                    .expect("associated slot holds one payload type per owner");
                return (value.clone(), false);
            }
        }
        entries.retain(|_, entry| entry.is_live());
        let value = init();
        entries.insert(key, Entry::new(owner, value.clone()));
        (value, true)
    }

    /// Returns the value stored for `owner`, if any.
    pub(crate) fn value<R, V>(&self, owner: &Arc<R>) -> Option<V>
    where
        R: Any + Send + Sync,
        V: Any + Send + Sync + Clone,
    {
        let entries = self.entries.lock();
        let entry = entries.get(&key_of(owner)).filter(|entry| entry.is_live())?;
        entry.value.downcast_ref::<V>().cloned()
    }

    /// Stores `value` for `owner`, replacing any previous value.
    pub(crate) fn set_value<R, V>(&self, owner: &Arc<R>, value: V)
    where
        R: Any + Send + Sync,
        V: Any + Send + Sync,
    {
        let key = key_of(owner);
        let mut entries = self.entries.lock();
        if !entries.contains_key(&key) {
            entries.retain(|_, entry| entry.is_live());
        }
        entries.insert(key, Entry::new(owner, value));
    }
}

fn key_of<R>(owner: &Arc<R>) -> usize {
    Arc::as_ptr(owner) as *const () as usize
}
