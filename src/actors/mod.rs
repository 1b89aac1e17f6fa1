//! # Actors
//!
//! The clients of the core: threads that push and pop through a [crate::bounded_channel::BoundedChannel]
//! or read and write through a [crate::priority_rwlock::PriorityRwLock].
//!
//! Every actor is a named scoped thread. Its parameters (an [ActorId], references to the shared structures,
//! the config) are moved into the closure, nothing is allocated for it to clean up.
//! Lifecycle is on the harness: spawn, join, report.

use std::{
    any::Any,
    fmt,
    thread::{self, Scope, ScopedJoinHandle},
};

use tracing::error;

use crate::error::{Error, Result};

pub mod producer_consumer;
pub mod reader_writer;

/// What travels through the channel in the demo.
///
/// The channel can't tell consumers that producers are done => the harness sends
/// one [Packet::Poison] per consumer once every producer has been joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<Y> {
    Item(Y),
    Poison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
    Reader,
    Writer,
}

impl Role {
    fn name(self) -> &'static str {
        match self {
            Role::Producer => "producer",
            Role::Consumer => "consumer",
            Role::Reader => "reader",
            Role::Writer => "writer",
        }
    }
}

/// Role + 1-based number, cheap to copy into a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId {
    pub role: Role,
    pub number: usize,
}

impl ActorId {
    pub fn new(role: Role, number: usize) -> Self {
        Self { role, number }
    }

    fn thread_name(&self) -> String {
        format!("{}-{}", self.role.name(), self.number)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.role.name(), self.number)
    }
}

/// Starts `f` on a thread named after the actor
pub(crate) fn spawn<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    actor: ActorId,
    f: F,
) -> Result<(ActorId, ScopedJoinHandle<'scope, T>)>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    #[cfg(test)]
    if REFUSED_SPAWN.with(|refused| refused.get()) == Some(actor) {
        return Err(Error::Initialization {
            primitive: "thread",
            reason: format!("spawn of {actor} refused"),
        });
    }

    thread::Builder::new()
        .name(actor.thread_name())
        .spawn_scoped(scope, f)
        .map(|handle| (actor, handle))
        .map_err(|e| Error::Initialization {
            primitive: "thread",
            reason: e.to_string(),
        })
}

#[cfg(test)]
thread_local! {
    static REFUSED_SPAWN: std::cell::Cell<Option<ActorId>> = const { std::cell::Cell::new(None) };
}

/// Makes every [spawn] of `actor` from this thread fail as if the OS refused the thread
#[cfg(test)]
pub(crate) fn refuse_spawn(actor: ActorId) {
    REFUSED_SPAWN.with(|refused| refused.set(Some(actor)));
}

/// Waits for the actor, a panic turns into [Error::ActorPanicked]
pub(crate) fn join<T>((actor, handle): (ActorId, ScopedJoinHandle<'_, T>)) -> Result<T> {
    handle.join().map_err(|payload| {
        error!(%actor, reason = panic_message(&*payload), "actor panicked");
        Error::ActorPanicked(actor.to_string())
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown"
    }
}
