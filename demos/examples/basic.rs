//! Minimal end-to-end walkthrough: a console [`Sink`], a worker thread, and a handful of
//! submissions exercising the format specifiers the capture/reconstruct pair supports.
//!
//! Run with `cargo run --example basic -p demos`.

use std::thread;
use std::time::Duration;

use rtlog::{LogArg, Logger, Severity, Sink, StdWake};

struct ConsoleSink;

impl Sink for ConsoleSink {
    fn emit(&self, module: &str, function: &str, level: Severity, line: &str) -> bool {
        println!("{}[{:>3}] {}::{}: {}{}", level.ansi_color(), level.tag(), module, function, line, "\u{1b}[0m");
        true
    }
}

static SINK: ConsoleSink = ConsoleSink;
static LOGGER: Logger<8, 32, 8, 2, StdWake> = Logger::new(StdWake::new());

fn main() {
    LOGGER.init();
    LOGGER.register_sink(&SINK).expect("room for one sink");

    let worker = thread::spawn(|| rtlog::run_worker(&LOGGER));

    LOGGER
        .submit("net", "connect", Severity::Info, "connecting to %s:%d\n", &[
            LogArg::Str("10.0.0.1"),
            LogArg::Int(443),
        ])
        .unwrap();

    LOGGER
        .submit("net", "connect", Severity::Debug, "retry budget=%lld\n", &[LogArg::LongLong(1 << 40)])
        .unwrap();

    LOGGER
        .submit("sensor", "sample", Severity::Warning, "reading=%f out of range\n", &[LogArg::Double(98.6)])
        .unwrap();

    LOGGER
        .submit("boot", "main", Severity::Info, "startup complete\n", &[])
        .unwrap();

    // Give the worker a moment to drain before the process exits; a real deployment never joins
    // this thread, since it runs for the lifetime of the device.
    thread::sleep(Duration::from_millis(50));
    drop(worker);

    println!("submitted: {}", LOGGER.stats().submitted());
    println!("processed: {}", LOGGER.stats().processed());
}
