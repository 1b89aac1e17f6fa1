//! # Demo configuration
//!
//! Plain struct with defaults from [crate::consts], overridable with `--key value` pairs:
//!
//! ```text
//! --capacity 5 --items 10 --producers 1 --consumers 1 --produce-delay-ms 1000 --consume-delay-ms 2000
//! --readers 5 --writers 2 --hold-delay-ms 1000 --stagger-delay-ms 1000 --initial-value 10
//! --verbose --very-verbose
//! ```

use std::{str::FromStr, time::Duration};

use crate::{
    consts,
    error::{Error, Result},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoConfig {
    // ---------------------------------------------------------------------------
    // Producer / Consumer
    // ---------------------------------------------------------------------------
    pub capacity: usize,
    pub items: usize,
    pub producers: usize,
    pub consumers: usize,
    pub produce_delay: Duration,
    pub consume_delay: Duration,
    // ---------------------------------------------------------------------------
    // Readers / Writers
    // ---------------------------------------------------------------------------
    pub readers: usize,
    pub writers: usize,
    pub hold_delay: Duration,
    pub stagger_delay: Duration,
    pub initial_value: i32,
    // ---------------------------------------------------------------------------
    // Tracing Subscriber Configuration
    // ---------------------------------------------------------------------------
    pub tracing_verbose: bool,
    pub tracing_very_verbose: bool,
}

impl DemoConfig {
    pub fn new() -> Self {
        Self {
            capacity: consts::DEFAULT_CAPACITY,
            items: consts::DEFAULT_ITEMS,
            producers: consts::DEFAULT_PRODUCERS,
            consumers: consts::DEFAULT_CONSUMERS,
            produce_delay: consts::DEFAULT_PRODUCE_DELAY,
            consume_delay: consts::DEFAULT_CONSUME_DELAY,
            readers: consts::DEFAULT_READERS,
            writers: consts::DEFAULT_WRITERS,
            hold_delay: consts::DEFAULT_HOLD_DELAY,
            stagger_delay: consts::DEFAULT_STAGGER_DELAY,
            initial_value: consts::DEFAULT_INITIAL_VALUE,
            tracing_verbose: false,
            tracing_very_verbose: false,
        }
    }

    /// No pauses anywhere, handy in tests
    pub fn without_delays(mut self) -> Self {
        self.produce_delay = Duration::ZERO;
        self.consume_delay = Duration::ZERO;
        self.hold_delay = Duration::ZERO;
        self.stagger_delay = Duration::ZERO;
        self
    }

    /// Applies `--key value` options on top of the defaults
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let key = arg.as_ref();
            match key {
                "--verbose" => config.tracing_verbose = true,
                "--very-verbose" => config.tracing_very_verbose = true,
                _ => {
                    let value = args.next().ok_or_else(|| Error::invalid_option(key, ""))?;
                    config.set(key, value.as_ref())?;
                }
            }
        }
        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "--capacity" => self.capacity = parse(key, value)?,
            "--items" => self.items = parse(key, value)?,
            "--producers" => self.producers = parse(key, value)?,
            "--consumers" => self.consumers = parse(key, value)?,
            "--produce-delay-ms" => self.produce_delay = parse_millis(key, value)?,
            "--consume-delay-ms" => self.consume_delay = parse_millis(key, value)?,
            "--readers" => self.readers = parse(key, value)?,
            "--writers" => self.writers = parse(key, value)?,
            "--hold-delay-ms" => self.hold_delay = parse_millis(key, value)?,
            "--stagger-delay-ms" => self.stagger_delay = parse_millis(key, value)?,
            "--initial-value" => self.initial_value = parse(key, value)?,
            _ => return Err(Error::invalid_option(key, value)),
        }
        Ok(())
    }

    pub const fn tracing_filter(&self) -> tracing::Level {
        if self.tracing_very_verbose {
            tracing::Level::TRACE
        } else if self.tracing_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| Error::invalid_option(key, value))
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    parse(key, value).map(Duration::from_millis)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DemoConfig::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.capacity, 5);
        assert_eq!(config.items, 10);
        assert_eq!(config.readers, 5);
        assert_eq!(config.writers, 2);
        assert_eq!(config.tracing_filter(), tracing::Level::INFO);
    }

    #[test]
    fn test_overrides() {
        let config = DemoConfig::from_args([
            "--capacity",
            "3",
            "--consume-delay-ms",
            "250",
            "--initial-value",
            "-4",
            "--very-verbose",
        ])
        .unwrap();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.consume_delay, Duration::from_millis(250));
        assert_eq!(config.initial_value, -4);
        assert_eq!(config.tracing_filter(), tracing::Level::TRACE);
    }

    #[test]
    fn test_bad_options() {
        assert_eq!(
            DemoConfig::from_args(["--capacity", "many"]),
            Err(Error::invalid_option("--capacity", "many"))
        );
        assert_eq!(
            DemoConfig::from_args(["--colour", "blue"]),
            Err(Error::invalid_option("--colour", "blue"))
        );
        assert_eq!(
            DemoConfig::from_args(["--items"]),
            Err(Error::invalid_option("--items", ""))
        );
    }
}
