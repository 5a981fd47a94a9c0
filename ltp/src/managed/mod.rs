//! Fixed capacity containers for packets.
//!
//! A link never allocates. Its packets live in an [`Arena`] of slots whose number is chosen at
//! compile time, and every queue of the link is a [`Queue`] threading a singly linked list through
//! the slots of that arena by [`Key`].
//!
//! A slot is linked into at most one queue at a time. Moving a packet between queues only ever
//! changes links, never the packet itself, and freeing the slot is a separate step after unlinking.
//!
//! ```
//! # use ltp::managed::{Arena, Queue};
//! let mut arena = Arena::<u32, 4>::new();
//! let mut queue = Queue::new();
//!
//! for value in 0..3 {
//!     let key = arena.insert(value).unwrap();
//!     queue.push_back(&mut arena, key);
//! }
//!
//! let first = queue.pop_front(&mut arena).unwrap();
//! assert_eq!(arena.remove(first), Some(0));
//! assert_eq!(queue.iter(&arena).map(|(_, v)| *v).collect::<Vec<_>>(), [1, 2]);
//! ```
//!
//! [`Arena`]: struct.Arena.html
//! [`Queue`]: struct.Queue.html
//! [`Key`]: struct.Key.html
mod arena;
mod queue;

pub use self::arena::{Arena, Key};
pub use self::queue::{Iter, Queue};
