use super::{Arena, Key};

/// A FIFO of arena slots, linked through the slots themselves.
///
/// The queue only stores its ends. All operations take the arena that holds the links, which must
/// be the same arena for the whole lifetime of the queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Queue {
    head: Option<Key>,
    tail: Option<Key>,
    len: usize,
}

/// Iterates the values of a queue from front to back.
pub struct Iter<'a, T, const N: usize> {
    arena: &'a Arena<T, N>,
    next: Option<Key>,
}

impl Queue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Queue {
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// The number of linked slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Query whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The key at the front.
    pub fn front(&self) -> Option<Key> {
        self.head
    }

    /// Link a slot at the back.
    pub fn push_back<T, const N: usize>(&mut self, arena: &mut Arena<T, N>, key: Key) {
        arena.set_next(key, None);
        match self.tail {
            Some(tail) => arena.set_next(tail, Some(key)),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.len += 1;
    }

    /// Link a slot at the front.
    pub fn push_front<T, const N: usize>(&mut self, arena: &mut Arena<T, N>, key: Key) {
        arena.set_next(key, self.head);
        if self.tail.is_none() {
            self.tail = Some(key);
        }
        self.head = Some(key);
        self.len += 1;
    }

    /// Unlink the slot at the front.
    pub fn pop_front<T, const N: usize>(&mut self, arena: &mut Arena<T, N>) -> Option<Key> {
        let head = self.head?;
        self.head = arena.next(head);
        if self.head.is_none() {
            self.tail = None;
        }
        arena.set_next(head, None);
        self.len -= 1;
        Some(head)
    }

    /// Move all slots of `other` in front of this queue, keeping their order.
    ///
    /// Leaves `other` empty.
    pub fn append_front<T, const N: usize>(&mut self, arena: &mut Arena<T, N>, other: &mut Queue) {
        let (head, tail) = match (other.head, other.tail) {
            (Some(head), Some(tail)) => (head, tail),
            _ => return,
        };

        arena.set_next(tail, self.head);
        if self.tail.is_none() {
            self.tail = Some(tail);
        }
        self.head = Some(head);
        self.len += other.len;
        *other = Queue::new();
    }

    /// Unlink a specific slot wherever it is.
    ///
    /// Returns `false` if the slot is not part of this queue.
    pub fn unlink<T, const N: usize>(&mut self, arena: &mut Arena<T, N>, key: Key) -> bool {
        let mut prev: Option<Key> = None;
        let mut cursor = self.head;

        while let Some(current) = cursor {
            if current == key {
                let next = arena.next(current);
                match prev {
                    Some(prev) => arena.set_next(prev, next),
                    None => self.head = next,
                }
                if self.tail == Some(current) {
                    self.tail = prev;
                }
                arena.set_next(current, None);
                self.len -= 1;
                return true;
            }
            prev = cursor;
            cursor = arena.next(current);
        }

        false
    }

    /// Unlink and free every slot.
    pub fn clear<T, const N: usize>(&mut self, arena: &mut Arena<T, N>) {
        while let Some(key) = self.pop_front(arena) {
            arena.remove(key);
        }
    }

    /// Iterate over keys and values from front to back.
    pub fn iter<'a, T, const N: usize>(&self, arena: &'a Arena<T, N>) -> Iter<'a, T, N> {
        Iter {
            arena,
            next: self.head,
        }
    }
}

impl<'a, T, const N: usize> Iterator for Iter<'a, T, N> {
    type Item = (Key, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        self.next = self.arena.next(key);
        Some((key, self.arena.get(key)?))
    }
}
