use log::{Level, LevelFilter, Metadata, Record};

/// `log` facade sink writing to the standard error channel.
///
/// Optional: the library's misuse diagnostics go to stderr directly and do
/// not depend on a logger being installed. This sink exists for hosts that
/// want the scheduler's tracing output as well.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// The logger instance handed to the `log` facade.
static LOGGER: StderrLogger = StderrLogger;

/// Install the stderr logger.
///
/// Safe to call more than once; if a logger is already installed the call
/// leaves it in place.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}
