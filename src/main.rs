use std::env::args;
use std::process::ExitCode;
use std::str::FromStr;
use std::string::ToString;

use classic_sync::actors::{producer_consumer, reader_writer};
use classic_sync::config::DemoConfig;
use classic_sync::Error;
use strum::IntoEnumIterator;
use strum_macros::{self, Display, EnumIter, EnumString};
use tracing::debug;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Error> {
    let mut args = args().skip(1);
    let demo = args.next().ok_or_else(|| {
        Error::MissingDemo(
            Demo::iter()
                .map(|d| d.to_string())
                .collect::<Vec<String>>()
                .join(","),
        )
    })?;
    let demo = Demo::from_str(&demo).map_err(|_| Error::UnknownDemo(demo))?;
    let config = DemoConfig::from_args(args)?;
    init_tracing_subscriber(&config);
    debug!(%demo, ?config, "running");

    match demo {
        Demo::ProducerConsumer => producer_consumer::run(&config).map(drop),
        Demo::ReaderWriter => reader_writer::run(&config).map(drop),
    }
}

/// Compact lines with thread names, so every actor shows up as e.g. `reader-3`
fn init_tracing_subscriber(config: &DemoConfig) {
    use tracing_subscriber::fmt::format;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::FmtSubscriber;

    let result = FmtSubscriber::builder()
        .event_format(format().compact())
        .with_max_level(config.tracing_filter())
        .with_target(false)
        .with_thread_names(true)
        .finish()
        .try_init();
    if let Err(error) = result {
        eprintln!("failed to set tracing subscriber: {error}");
    }
}

#[derive(Clone, Copy, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
enum Demo {
    ProducerConsumer,
    ReaderWriter,
}
