//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use optimizer_lib::{diff, Delta};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status {
        "planned" => status.yellow().to_string(),
        "updated" => status.green().to_string(),
        "unchanged" => status.dimmed().to_string(),
        "skipped" => status.blue().to_string(),
        "failed" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// One line per changed field: `path: old → new`
pub fn format_delta(delta: &Delta) -> String {
    delta
        .flatten()
        .iter()
        .map(|change| {
            format!(
                "{}: {} → {}",
                change.path,
                diff::render(change.old.as_ref()).red(),
                diff::render(change.new.as_ref()).green()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
