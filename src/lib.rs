pub mod actors;
pub mod bounded_channel;
pub mod config;
pub mod consts;
pub mod error;
pub mod primitives;
pub mod priority_rwlock;

pub use bounded_channel::BoundedChannel;
pub use error::{Error, Result};
pub use priority_rwlock::{PriorityRwLock, ReaderPreferenceGate};
