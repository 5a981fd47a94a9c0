use core::ops::{Index, IndexMut};

/// A fixed number of slots holding values of the same type.
///
/// Free slots form a stack so that both insertion and removal take constant time. Each occupied
/// slot also carries the link to its successor in whatever [`Queue`] it is part of.
///
/// [`Queue`]: struct.Queue.html
pub struct Arena<T, const N: usize> {
    entries: [Entry<T>; N],
    free_top: Option<usize>,
    len: usize,
}

/// Refers to an occupied slot of an arena.
///
/// The key is only meaningful until the value is removed, afterwards the slot may be handed out
/// again for another value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Key(usize);

enum Entry<T> {
    Occupied {
        value: T,
        next: Option<Key>,
    },
    Free {
        next_free: Option<usize>,
    },
}

impl Key {
    /// The slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl<T, const N: usize> Arena<T, N> {
    /// Create an arena with all slots free.
    pub fn new() -> Self {
        Arena {
            entries: core::array::from_fn(|idx| Entry::Free {
                next_free: if idx + 1 < N { Some(idx + 1) } else { None },
            }),
            free_top: if N > 0 { Some(0) } else { None },
            len: 0,
        }
    }

    /// Store a value, returning it back if all slots are taken.
    pub fn insert(&mut self, value: T) -> Result<Key, T> {
        let idx = match self.free_top {
            Some(idx) => idx,
            None => return Err(value),
        };

        self.free_top = match self.entries[idx] {
            Entry::Free { next_free } => next_free,
            // The free list only ever refers to free entries.
            Entry::Occupied { .. } => return Err(value),
        };

        self.entries[idx] = Entry::Occupied { value, next: None };
        self.len += 1;
        Ok(Key(idx))
    }

    /// Free a slot, returning its value.
    ///
    /// The slot must not be linked into a queue anymore.
    pub fn remove(&mut self, key: Key) -> Option<T> {
        let entry = self.entries.get_mut(key.0)?;
        if let Entry::Free { .. } = entry {
            return None;
        }

        let free = Entry::Free { next_free: self.free_top };
        self.free_top = Some(key.0);
        self.len -= 1;
        match core::mem::replace(entry, free) {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Free { .. } => None,
        }
    }

    /// Retrieve a value.
    pub fn get(&self, key: Key) -> Option<&T> {
        match self.entries.get(key.0)? {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Free { .. } => None,
        }
    }

    /// Retrieve a mutable value.
    pub fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        match self.entries.get_mut(key.0)? {
            Entry::Occupied { value, .. } => Some(value),
            Entry::Free { .. } => None,
        }
    }

    /// The number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Query whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The total number of slots.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Query whether all slots are occupied.
    pub fn is_full(&self) -> bool {
        self.free_top.is_none()
    }

    pub(crate) fn next(&self, key: Key) -> Option<Key> {
        match self.entries.get(key.0)? {
            Entry::Occupied { next, .. } => *next,
            Entry::Free { .. } => None,
        }
    }

    pub(crate) fn set_next(&mut self, key: Key, link: Option<Key>) {
        if let Some(Entry::Occupied { next, .. }) = self.entries.get_mut(key.0) {
            *next = link;
        }
    }
}

impl<T, const N: usize> Default for Arena<T, N> {
    fn default() -> Self {
        Arena::new()
    }
}

impl<T, const N: usize> Index<Key> for Arena<T, N> {
    type Output = T;

    /// # Panics
    /// This panics if the slot is free.
    fn index(&self, key: Key) -> &T {
        match self.get(key) {
            Some(value) => value,
            None => panic!("Arena slot {} is not occupied", key.0),
        }
    }
}

impl<T, const N: usize> IndexMut<Key> for Arena<T, N> {
    fn index_mut(&mut self, key: Key) -> &mut T {
        match self.get_mut(key) {
            Some(value) => value,
            None => panic!("Arena slot {} is not occupied", key.0),
        }
    }
}

impl<T: core::fmt::Debug, const N: usize> core::fmt::Debug for Arena<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let occupied = self.entries.iter()
            .enumerate()
            .filter_map(|(idx, entry)| match entry {
                Entry::Occupied { value, .. } => Some((idx, value)),
                Entry::Free { .. } => None,
            });
        f.debug_map().entries(occupied).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaust_and_reuse() {
        let mut arena = Arena::<&str, 2>::new();
        let a = arena.insert("a").unwrap();
        let b = arena.insert("b").unwrap();
        assert!(arena.is_full());
        assert_eq!(arena.insert("c"), Err("c"));

        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena[b], "b");

        let c = arena.insert("c").unwrap();
        assert_eq!(c.index(), a.index());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn zero_capacity() {
        let mut arena = Arena::<u8, 0>::new();
        assert!(arena.is_full());
        assert_eq!(arena.insert(1), Err(1));
        assert_eq!(arena.capacity(), 0);
    }
}
