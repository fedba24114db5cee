//! Terminal output helpers: colored status lines and progress spinners.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Print a success message in green.
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an informational message in blue.
pub fn info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), message);
}

/// Print a warning message in yellow.
pub fn warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), message);
}

/// Print an error message in red.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a bold step heading.
pub fn step(message: &str) {
    println!("\n{}", style(message).bold());
}

/// Start a spinner with the given message.
///
/// Callers finish it with `finish_and_clear` once the operation resolves;
/// dropping the bar leaves a stale line otherwise.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.blue} {msg}")
            .expect("static spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
