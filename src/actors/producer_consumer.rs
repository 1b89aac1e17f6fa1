//! # Producer / Consumer
//!
//! Producers push random numbers into a [BoundedChannel], consumers pop and "consume" them.
//! A producer blocks on a full buffer, a consumer on an empty one.
//!
//! Consumers don't know how many items to expect: the harness joins every producer,
//! then pushes a [Packet::Poison] per consumer. Each consumer stops at the first poison it pops.
//!
//! Consumers are spawned before producers. If a spawn fails, the actors already running are
//! wound down (producers finish, consumers get their poison) and only then the error is returned.
//!
//! If a consumer panics, producers may block on a full buffer forever and so does the harness.
//! That's the price of a channel without shutdown.

use std::thread::{scope, sleep};

use tracing::{debug, info};

use super::{join, spawn, ActorId, Packet, Role};
use crate::{bounded_channel::BoundedChannel, config::DemoConfig, consts::ITEM_RANGE, error::Result};

/// What every actor saw, indexed by actor number - 1
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProducerConsumerReport {
    pub produced: Vec<Vec<i32>>,
    pub consumed: Vec<Vec<i32>>,
}

impl ProducerConsumerReport {
    pub fn produced_count(&self) -> usize {
        self.produced.iter().map(Vec::len).sum()
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.iter().map(Vec::len).sum()
    }
}

pub fn run(config: &DemoConfig) -> Result<ProducerConsumerReport> {
    let channel = BoundedChannel::new(config.capacity)?;
    info!(
        capacity = config.capacity,
        producers = config.producers,
        consumers = config.consumers,
        items = config.items,
        "starting producers and consumers"
    );

    let report = scope(|s| -> Result<_> {
        let channel = &channel;

        // consumers first: whatever happens to the producers, somebody drains the channel
        let mut consumers = Vec::with_capacity(config.consumers);
        for n in 1..=config.consumers {
            let id = ActorId::new(Role::Consumer, n);
            match spawn(s, id, move || consume(id, channel, config)) {
                Ok(consumer) => consumers.push(consumer),
                Err(e) => {
                    // no producers yet => the poison is all the spawned consumers will ever pop
                    poison(channel, consumers.len());
                    return Err(e);
                }
            }
        }

        let mut producers = Vec::with_capacity(config.producers);
        let mut spawn_error = None;
        for n in 1..=config.producers {
            let id = ActorId::new(Role::Producer, n);
            match spawn(s, id, move || produce(id, channel, config)) {
                Ok(producer) => producers.push(producer),
                Err(e) => {
                    spawn_error = Some(e);
                    break;
                }
            }
        }

        // join everyone before looking at errors, consumers need their poison either way
        let produced: Vec<_> = producers.into_iter().map(join).collect();
        poison(channel, consumers.len());
        let consumed: Vec<_> = consumers.into_iter().map(join).collect();

        if let Some(e) = spawn_error {
            return Err(e);
        }
        Ok(ProducerConsumerReport {
            produced: produced.into_iter().collect::<Result<_>>()?,
            consumed: consumed.into_iter().collect::<Result<_>>()?,
        })
    })?;

    info!(
        produced = report.produced_count(),
        consumed = report.consumed_count(),
        "all items produced and consumed"
    );
    Ok(report)
}

/// One poison per consumer. Blocks while the channel is full, so the consumers have to be alive to take them.
fn poison(channel: &BoundedChannel<Packet<i32>>, consumers: usize) {
    debug!(consumers, "production is over, poisoning consumers");
    for _ in 0..consumers {
        channel.push(Packet::Poison);
    }
}

fn produce(id: ActorId, channel: &BoundedChannel<Packet<i32>>, config: &DemoConfig) -> Vec<i32> {
    let mut produced = Vec::with_capacity(config.items);
    for _ in 0..config.items {
        let item = fastrand::i32(0..ITEM_RANGE);
        let index = channel.push_indexed(Packet::Item(item));
        info!(actor = %id, item, index, "produced");
        produced.push(item);
        sleep(config.produce_delay);
    }
    produced
}

fn consume(id: ActorId, channel: &BoundedChannel<Packet<i32>>, config: &DemoConfig) -> Vec<i32> {
    let mut consumed = Vec::new();
    loop {
        match channel.pop_indexed() {
            (index, Packet::Item(item)) => {
                info!(actor = %id, item, index, "consumed");
                consumed.push(item);
                sleep(config.consume_delay);
            }
            (_, Packet::Poison) => {
                debug!(actor = %id, "poisoned, stopping");
                return consumed;
            }
        }
    }
}
