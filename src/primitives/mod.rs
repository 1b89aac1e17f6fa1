//! # Primitives
//!
//! The two building blocks everything else is made of:
//! - a mutex, in two flavours: [RawMutex] without data nor guard (it can be unlocked by any thread)
//!   and [Mutex] that wraps a value and unlocks on the guard's drop
//! - a counting [Semaphore]
//!
//! Both are futex-based: the [atomic-wait](https://crates.io/crates/atomic-wait) crate gives us
//! - `wait(&AtomicU32, u32)` - blocks only if the atomic still has the value, may wake up spuriously
//! - `wake_one(&AtomicU32)` - wakes a single waiter
//! - `wake_all(&AtomicU32)` - wakes everyone
//!
//! There's no poisoning: a thread that leaves a lock locked leaves it locked forever.

pub mod p1_mutex;
pub mod p2_semaphore;

pub use p1_mutex::{Mutex, MutexGuard, RawMutex};
pub use p2_semaphore::{Semaphore, MAX_PERMITS};
