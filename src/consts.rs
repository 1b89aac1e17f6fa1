use std::time::Duration;

// -----------------------------------------------------------------------------
// Producer / Consumer
// -----------------------------------------------------------------------------

/// Slots in the bounded buffer.
pub const DEFAULT_CAPACITY: usize = 5;

/// Items each producer puts into the buffer.
pub const DEFAULT_ITEMS: usize = 10;

pub const DEFAULT_PRODUCERS: usize = 1;

pub const DEFAULT_CONSUMERS: usize = 1;

/// Pause after every produced item.
pub const DEFAULT_PRODUCE_DELAY: Duration = Duration::from_secs(1);

/// Pause after every consumed item.
pub const DEFAULT_CONSUME_DELAY: Duration = Duration::from_secs(2);

/// Items are drawn from `0..ITEM_RANGE`.
pub const ITEM_RANGE: i32 = 100;

// -----------------------------------------------------------------------------
// Readers / Writers
// -----------------------------------------------------------------------------

pub const DEFAULT_READERS: usize = 5;

pub const DEFAULT_WRITERS: usize = 2;

/// Time spent inside a read or a write.
pub const DEFAULT_HOLD_DELAY: Duration = Duration::from_secs(1);

/// Pause between spawning two readers.
pub const DEFAULT_STAGGER_DELAY: Duration = Duration::from_secs(1);

/// The shared value before any writer touches it.
pub const DEFAULT_INITIAL_VALUE: i32 = 10;
