//! # Readers / Writers
//!
//! Writers start first, then readers one by one with a pause in between.
//! Each writer stores one random number, each reader looks at the value once.
//! With long enough reads the readers overlap and a late writer waits for the whole pool to drain.

use std::thread::{scope, sleep};

use tracing::info;

use super::{join, spawn, ActorId, Role};
use crate::{config::DemoConfig, consts::ITEM_RANGE, error::Result, priority_rwlock::PriorityRwLock};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReaderWriterReport {
    /// per writer
    pub written: Vec<i32>,
    /// per reader
    pub observed: Vec<i32>,
    pub final_value: i32,
}

pub fn run(config: &DemoConfig) -> Result<ReaderWriterReport> {
    let lock = PriorityRwLock::new(config.initial_value);
    info!(
        readers = config.readers,
        writers = config.writers,
        initial_value = config.initial_value,
        "spawning readers and writers"
    );

    let (written, observed) = scope(|s| -> Result<_> {
        let lock = &lock;
        let writers = (1..=config.writers)
            .map(|n| {
                let id = ActorId::new(Role::Writer, n);
                spawn(s, id, move || write(id, lock, config))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut readers = Vec::with_capacity(config.readers);
        for n in 1..=config.readers {
            let id = ActorId::new(Role::Reader, n);
            readers.push(spawn(s, id, move || read(id, lock, config))?);
            sleep(config.stagger_delay);
        }

        let observed: Vec<_> = readers.into_iter().map(join).collect();
        let written: Vec<_> = writers.into_iter().map(join).collect();
        Ok((
            written.into_iter().collect::<Result<Vec<_>>>()?,
            observed.into_iter().collect::<Result<Vec<_>>>()?,
        ))
    })?;

    let final_value = lock.into_inner();
    info!(final_value, "all readers and writers are done");
    Ok(ReaderWriterReport {
        written,
        observed,
        final_value,
    })
}

fn write(id: ActorId, lock: &PriorityRwLock<i32>, config: &DemoConfig) -> i32 {
    info!(actor = %id, "trying to write");
    let mut value = lock.write();
    info!(actor = %id, "writing");
    let new_value = fastrand::i32(0..ITEM_RANGE);
    *value = new_value;
    info!(actor = %id, value = new_value, "wrote");
    sleep(config.hold_delay);
    drop(value);
    info!(actor = %id, "finished writing");
    new_value
}

fn read(id: ActorId, lock: &PriorityRwLock<i32>, config: &DemoConfig) -> i32 {
    info!(actor = %id, "trying to read");
    let value = lock.read();
    if value.is_first() {
        info!(actor = %id, "first reader, locked the resource gate");
    }
    let seen = *value;
    info!(actor = %id, value = seen, "reading");
    sleep(config.hold_delay);
    if value.release() == 0 {
        info!(actor = %id, "last reader, unlocked the resource gate");
    }
    info!(actor = %id, "finished reading");
    seen
}

#[cfg(test)]
mod test {
    use std::{
        io,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use super::*;

    /// Collects formatted log lines of the current thread
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_logs_taking_the_gate() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer({
                let logs = logs.clone();
                move || logs.clone()
            })
            .finish();
        let lock = PriorityRwLock::new(0);
        let config = DemoConfig::new().without_delays();

        let value = tracing::subscriber::with_default(subscriber, || {
            write(ActorId::new(Role::Writer, 1), &lock, &config)
        });
        assert_eq!(lock.into_inner(), value);

        let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let steps: Vec<_> = ["trying to write", "writing", "wrote", "finished writing"]
            .iter()
            .map(|step| logs.find(&format!(" {step}")).unwrap_or_else(|| panic!("no `{step}' in {logs}")))
            .collect();
        assert!(steps.windows(2).all(|w| w[0] < w[1]), "steps out of order: {logs}");
    }

    #[test]
    fn test_report_is_consistent() {
        let config = DemoConfig {
            readers: 8,
            writers: 3,
            ..DemoConfig::new().without_delays()
        };
        let report = run(&config).unwrap();
        assert_eq!(report.written.len(), 3);
        assert_eq!(report.observed.len(), 8);
        // a reader sees either the initial value or something a writer wrote
        for seen in &report.observed {
            assert!(*seen == config.initial_value || report.written.contains(seen));
        }
        assert!(report.written.contains(&report.final_value));
    }

    #[test]
    fn test_without_writers_value_is_untouched() {
        let config = DemoConfig {
            readers: 3,
            writers: 0,
            initial_value: -7,
            ..DemoConfig::new().without_delays()
        };
        let report = run(&config).unwrap();
        assert_eq!(report.observed, [-7, -7, -7]);
        assert_eq!(report.final_value, -7);
    }

    #[test]
    fn test_overlapping_readers_with_short_delays() {
        let config = DemoConfig {
            readers: 4,
            writers: 2,
            hold_delay: Duration::from_millis(30),
            stagger_delay: Duration::from_millis(5),
            ..DemoConfig::new()
        };
        let report = run(&config).unwrap();
        assert_eq!(report.observed.len(), 4);
        assert!(report.written.contains(&report.final_value));
    }
}
