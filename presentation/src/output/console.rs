//! Console renderer for streamed reviews

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sentinel_application::{ReviewCallbacks, ReviewError};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Writes review text as it arrives, with a spinner until the first chunk.
pub struct ConsoleRenderer<W: Write + Send> {
    out: Mutex<W>,
    spinner: Mutex<Option<ProgressBar>>,
    show_progress: bool,
    truncated: AtomicBool,
    failed: AtomicBool,
}

impl ConsoleRenderer<std::io::Stdout> {
    pub fn stdout(show_progress: bool) -> Self {
        Self::new(std::io::stdout(), show_progress)
    }
}

impl<W: Write + Send> ConsoleRenderer<W> {
    pub fn new(out: W, show_progress: bool) -> Self {
        Self {
            out: Mutex::new(out),
            spinner: Mutex::new(None),
            show_progress,
            truncated: AtomicBool::new(false),
            failed: AtomicBool::new(false),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Show a spinner with `message` until output starts.
    pub fn start(&self, message: &str) {
        if !self.show_progress {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    /// Whether the last finished review was truncated.
    pub fn was_truncated(&self) -> bool {
        self.truncated.load(Ordering::Acquire)
    }

    /// Whether any review rendered so far reported an error.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear_spinner(&self) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Ignore broken pipes (e.g. `| head`).
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// One-line error as shown to the user.
pub fn format_error(error: &ReviewError) -> String {
    format!("{} {}", "x".red(), error.user_message().red().bold())
}

/// Hint printed after a truncated review.
pub fn truncation_hint(continuing: bool) -> String {
    if continuing {
        format!("{} Response truncated, continuing...", "->".cyan())
    } else {
        format!(
            "{} {}",
            "!".yellow(),
            "Response truncated by the model's output limit. Re-run with --auto-continue N to resume it."
                .yellow()
        )
    }
}

impl<W: Write + Send> ReviewCallbacks for ConsoleRenderer<W> {
    fn on_chunk(&self, text: &str) {
        self.clear_spinner();
        self.write(text);
    }

    fn on_error(&self, error: &ReviewError) {
        self.clear_spinner();
        self.failed.store(true, Ordering::Release);
        eprintln!("\n{}", format_error(error));
    }

    fn on_finish(&self, truncated: bool) {
        self.clear_spinner();
        self.truncated.store(truncated, Ordering::Release);
        if !truncated {
            self.write("\n");
        }
    }
}
