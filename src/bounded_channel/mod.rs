//! # Bounded channel
//!
//! The classical bounded buffer: a fixed ring of slots plus
//! - `free_slots` - a semaphore counting slots a producer may claim, starts at `capacity`
//! - `filled_slots` - a semaphore counting slots with a ready item, starts at 0
//! - a mutex over the `head` / `tail` indices
//!
//! ```text
//! push: free_slots.acquire -> lock -> slots[tail] = item, tail += 1 -> unlock -> filled_slots.release
//! pop:  filled_slots.acquire -> lock -> item = slots[head], head += 1 -> unlock -> free_slots.release
//! ```
//!
//! Producers block on a full channel, consumers on an empty one. Nothing else blocks.
//!
//! ## Ordering
//! One producer + one consumer => FIFO. With more of them the order between producers (or consumers)
//! is whatever the scheduler makes of it, but:
//! - an item can't be read before it's written: `filled_slots.release` happens after the write
//!   and the reader's `filled_slots.acquire` synchronizes with it
//! - a slot can't be overwritten before it's read: same story with `free_slots`
//!
//! ## Shutdown
//! There's none. `pop` on a channel nobody pushes to anymore waits forever.
//! Agree on the number of items up front or send a poison item, see [crate::actors::Packet].

use std::{cell::UnsafeCell, mem::MaybeUninit};

use tracing::trace;

use crate::{
    error::{Error, Result},
    primitives::{Mutex, Semaphore},
};

/// Ring indices, only touched under the channel's mutex
#[derive(Debug, Default)]
struct Cursors {
    head: usize, // next slot to read
    tail: usize, // next slot to write
}

pub struct BoundedChannel<Y> {
    slots: Box<[UnsafeCell<MaybeUninit<Y>>]>,
    cursors: Mutex<Cursors>,
    free_slots: Semaphore,
    filled_slots: Semaphore,
}

/// Items travel between threads => Y: Send is enough, nobody shares a &Y
unsafe impl<Y> Sync for BoundedChannel<Y> where Y: Send {}

impl<Y> BoundedChannel<Y> {
    /// # Errors
    /// - [Error::ZeroCapacity] for a channel with no slots
    /// - [Error::Initialization] if the slot semaphore can't count that far
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        // semaphores first, so an absurd capacity fails before allocating
        let free_slots = Semaphore::new(capacity)?;
        let filled_slots = Semaphore::new(0)?;
        Ok(Self {
            slots: (0..capacity)
                .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
                .collect(),
            cursors: Mutex::new(Cursors::default()),
            free_slots,
            filled_slots,
        })
    }

    /// Blocks while the channel is full
    pub fn push(&self, item: Y) {
        self.push_indexed(item);
    }

    /// Same as [Self::push], returns the slot the item landed in
    pub fn push_indexed(&self, item: Y) -> usize {
        self.free_slots.acquire();
        let index = {
            let mut cursors = self.cursors.lock();
            let index = cursors.tail;
            // SAFETY: the free permit says the slot is empty and the lock says the tail is ours
            unsafe { (*self.slots[index].get()).write(item) };
            cursors.tail = (index + 1) % self.capacity();
            index
        };
        trace!(index, "item pushed");
        self.filled_slots.release();
        index
    }

    /// Blocks while the channel is empty, returns the oldest item
    pub fn pop(&self) -> Y {
        self.pop_indexed().1
    }

    /// Same as [Self::pop], also tells which slot the item came from
    pub fn pop_indexed(&self) -> (usize, Y) {
        self.filled_slots.acquire();
        let (index, item) = {
            let mut cursors = self.cursors.lock();
            let index = cursors.head;
            // SAFETY: the filled permit says the slot was written, the lock says the head is ours.
            // The slot is logically empty once head moves on, so reading it out is a move
            let item = unsafe { (*self.slots[index].get()).assume_init_read() };
            cursors.head = (index + 1) % self.capacity();
            (index, item)
        };
        trace!(index, "item popped");
        self.free_slots.release();
        (index, item)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of ready items, a snapshot
    pub fn len(&self) -> usize {
        self.filled_slots.available()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// No free slots left, a snapshot
    pub fn is_full(&self) -> bool {
        self.free_slots.available() == 0
    }

    /// Takes out whatever is left, oldest first.
    /// &mut self => all the actors are gone and no operation is in flight.
    pub fn drain(&mut self) -> Vec<Y> {
        let capacity = self.capacity();
        let mut items = Vec::with_capacity(self.len());
        while self.filled_slots.try_acquire() {
            let cursors = self.cursors.get_mut();
            let index = cursors.head;
            // SAFETY: same as in pop, exclusivity comes from &mut self
            items.push(unsafe { self.slots[index].get_mut().assume_init_read() });
            cursors.head = (index + 1) % capacity;
            self.free_slots.release();
        }
        items
    }
}

/// Unreceived items have to be dropped
impl<Y> Drop for BoundedChannel<Y> {
    fn drop(&mut self) {
        drop(self.drain());
    }
}
