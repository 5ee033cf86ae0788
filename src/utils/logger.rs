/*
 * Kernel Logging System
 *
 * Routes the `log` facade to standard error with the record's level as a
 * prefix. On the real machine this would write to the serial console; the
 * host's stderr plays that role here.
 *
 * Why this is important:
 * - Enables systematic debugging and monitoring of scheduler operations
 * - Integrates with Rust's standard logging framework
 * - Allows tracking of boot, spawn, and context-switch behavior
 */

use std::io::Write;
use std::sync::Once;

use log::{Level, LevelFilter, Metadata, Record};

/// Logger implementation writing to the host's standard error.
struct HostLogger;

impl log::Log for HostLogger {
    /// Checks if the given log level is enabled.
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    /// Logs the record by printing it to standard error.
    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    /// Flushes standard error.
    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// The logger instance used for logging.
static LOGGER: HostLogger = HostLogger;

static INIT: Once = Once::new();

/// Initialize the logger, once per process.
///
/// Later kernels in the same process reuse the first registration. If an
/// embedding application already installed its own `log` implementation,
/// that one wins and this call is a no-op.
pub fn init() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Info);
        }
    });
}
