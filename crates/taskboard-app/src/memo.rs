//! Last-input memoization keyed on reference identity.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::Arc;

use tracing::trace;

/// Input comparison used by [`Memo`]: shared handles compare by pointer, never by content.
pub trait Identity {
    /// True when `self` and `other` denote the same input.
    fn same(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Arc<T> {
    fn same(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T: Identity> Identity for Option<T> {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! tuple_identity {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Identity),+> Identity for ($($name,)+) {
            fn same(&self, other: &Self) -> bool {
                $(self.$idx.same(&other.$idx))&&+
            }
        }
    };
}

tuple_identity!(A: 0);
tuple_identity!(A: 0, B: 1);
tuple_identity!(A: 0, B: 1, C: 2);
tuple_identity!(A: 0, B: 1, C: 2, D: 3);
tuple_identity!(A: 0, B: 1, C: 2, D: 3, E: 4);

/// Single-slot cache remembering the last key and the output computed for it.
///
/// A lookup with a key that is [`Identity::same`] as the stored one returns the stored
/// [`Arc`] unchanged; anything else recomputes and replaces the slot.
pub struct Memo<K, V: ?Sized> {
    name: &'static str,
    slot: RefCell<Option<(K, Arc<V>)>>,
    recomputations: Cell<u64>,
}

impl<K: Identity, V: ?Sized> Memo<K, V> {
    /// Create an empty slot. `name` shows up in trace logs.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: RefCell::new(None),
            recomputations: Cell::new(0),
        }
    }

    /// Return the cached output for `key`, computing it first if the key changed.
    pub fn get_or_compute(&self, key: K, compute: impl FnOnce(&K) -> Arc<V>) -> Arc<V> {
        if let Some((last, output)) = self.slot.borrow().as_ref()
            && last.same(&key)
        {
            return Arc::clone(output);
        }

        let recomputations = self.recomputations.get() + 1;
        self.recomputations.set(recomputations);
        trace!(derivation = self.name, recomputations, "recomputing");
        let output = compute(&key);
        *self.slot.borrow_mut() = Some((key, Arc::clone(&output)));
        output
    }
}

impl<K, V: ?Sized> fmt::Debug for Memo<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("name", &self.name)
            .field("cached", &self.slot.borrow().is_some())
            .field("recomputations", &self.recomputations.get())
            .finish()
    }
}
