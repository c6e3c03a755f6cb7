//! Crash log for panics in the host.
//!
//! Plugins own the terminal while they run, so a host panic is easy to miss.
//! Each panic appends one report to `crash.log` in the data directory.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::panic::{self, PanicHookInfo};
use std::path::Path;

use crate::utils::paths::get_crash_log_path;

#[derive(Debug, Clone)]
pub struct CrashReport {
    pub at: DateTime<Local>,
    /// Full command line, so the failing dispatch can be replayed.
    pub command_line: Vec<String>,
    pub message: Option<String>,
    pub location: Option<String>,
    pub backtrace: String,
}

impl CrashReport {
    fn capture(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned());

        Self {
            at: Local::now(),
            command_line: std::env::args_os()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
            message,
            location: info.location().map(|location| location.to_string()),
            backtrace: std::backtrace::Backtrace::force_capture().to_string(),
        }
    }

    pub fn render(&self) -> String {
        let mut report = String::new();
        let _ = writeln!(
            report,
            "=== pipectl {} panicked at {} ===",
            env!("CARGO_PKG_VERSION"),
            self.at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(report, "Command: {:?}", self.command_line);
        if let Some(message) = &self.message {
            let _ = writeln!(report, "Message: {}", message);
        }
        if let Some(location) = &self.location {
            let _ = writeln!(report, "Location: {}", location);
        }
        let _ = write!(report, "\nBacktrace:\n{}\n\n", self.backtrace);
        report
    }

    /// Append the rendered report to `path`, creating its directory.
    pub fn append_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(self.render().as_bytes())
    }
}

/// Chain a panic hook that records a [`CrashReport`] before the default hook
/// prints the panic.
pub fn install_crash_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        if let Ok(crash_log_path) = get_crash_log_path() {
            match CrashReport::capture(info).append_to(&crash_log_path) {
                Ok(()) => eprintln!("\nCrash logged to: {}", crash_log_path.display()),
                Err(e) => eprintln!("\nCould not write crash log {}: {}", crash_log_path.display(), e),
            }
        }

        default_hook(info);
    }));
}
