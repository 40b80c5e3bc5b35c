//! Terminal output.
//!
//! - `log!("module"; ...)` prints a colored `[module]` prefix and a message
//! - `debug!` does the same, only with `--verbose`
//! - [`ProgressLine`] keeps one in-place `[run] assets(3/12)` line at the
//!   bottom while a batch runs; log lines are printed above it
//!
//! ```ignore
//! log!("run"; "12 assets in {}", scope);
//!
//! let progress = ProgressLine::new("run", &[("assets", 12)]);
//! progress.inc("assets");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{StdoutLock, Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set while a [`ProgressLine`] owns the last terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but only with `--verbose`. Arguments are not evaluated
/// otherwise.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    if PROGRESS_ACTIVE.load(Ordering::Relaxed) {
        // Overwrite the progress line; the next refresh redraws it below.
        clear_line(&mut out);
    } else {
        execute!(out, Clear(ClearType::UntilNewLine)).ok();
    }
    writeln!(out, "{} {message}", prefix(module)).ok();
    out.flush().ok();
}

fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "run" | "process" => tag.bright_blue().bold().to_string(),
        "done" => tag.bright_green().bold().to_string(),
        "failed" | "error" => tag.bright_red().bold().to_string(),
        "warning" => tag.yellow().bold().to_string(),
        _ => tag.bright_black().bold().to_string(),
    }
}

fn clear_line(out: &mut StdoutLock<'_>) {
    execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
}

// ============================================================================
// ProgressLine
// ============================================================================

/// In-place counters for a running batch.
///
/// Shareable across rayon workers. Refreshes use `try_lock`, so a worker
/// never waits on the terminal; a contended refresh is skipped.
pub struct ProgressLine {
    label: &'static str,
    counters: Vec<(&'static str, usize, AtomicUsize)>,
    draw: Mutex<()>,
}

impl ProgressLine {
    /// Counters with a total of zero are left out.
    pub fn new(label: &'static str, items: &[(&'static str, usize)]) -> Self {
        let counters = items
            .iter()
            .filter(|&&(_, total)| total > 0)
            .map(|&(name, total)| (name, total, AtomicUsize::new(0)))
            .collect();

        let progress = Self {
            label,
            counters,
            draw: Mutex::new(()),
        };
        PROGRESS_ACTIVE.store(true, Ordering::Relaxed);
        progress.draw(false);
        progress
    }

    pub fn inc(&self, name: &str) {
        let Some((_, _, current)) = self.counters.iter().find(|(n, _, _)| *n == name) else {
            return;
        };
        current.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.draw.try_lock() {
            self.draw(false);
        }
    }

    /// Leave the final counts on their own line.
    pub fn finish(self) {
        PROGRESS_ACTIVE.store(false, Ordering::Relaxed);
        let _guard = self.draw.lock();
        self.draw(true);
    }

    fn snapshot(&self) -> String {
        format_counters(
            self.counters
                .iter()
                .map(|(name, total, current)| (*name, current.load(Ordering::Relaxed), *total)),
        )
    }

    fn draw(&self, newline: bool) {
        let line = format!("{} {}", prefix(self.label), self.snapshot());
        let mut out = stdout().lock();
        clear_line(&mut out);
        if newline {
            writeln!(out, "{line}").ok();
        } else {
            write!(out, "{line}").ok();
        }
        out.flush().ok();
    }
}

fn format_counters<'a>(counters: impl Iterator<Item = (&'a str, usize, usize)>) -> String {
    counters
        .map(|(name, current, total)| format!("{name}({current}/{total})"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_counters() {
        let line = format_counters([("assets", 3, 10), ("failed", 1, 10)].into_iter());
        assert_eq!(line, "assets(3/10) failed(1/10)");
        assert_eq!(format_counters(std::iter::empty()), "");
    }

    #[test]
    fn test_progress_counts() {
        let progress = ProgressLine::new("run", &[("assets", 2), ("skipped", 0)]);
        progress.inc("assets");
        progress.inc("unknown");
        assert_eq!(progress.snapshot(), "assets(1/2)");
        progress.finish();
    }

    #[test]
    fn test_verbose_flag_roundtrip() {
        let before = is_verbose();
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(before);
    }
}
