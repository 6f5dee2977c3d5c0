//! Output formatting utilities

use chrono::NaiveDateTime;
use clap::ValueEnum;
use colored::Colorize;
use diamond_lib::registry::CREATED_FORMAT;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or `items` as JSON
pub fn print_table<R: Tabled, T: Serialize>(rows: Vec<R>, items: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(items),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to render JSON: {}", e)),
    }
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

/// Format a price
pub fn format_price(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// Format a metric value for display
pub fn format_metric(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else if value.abs() >= 100.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.4}", value)
    }
}

/// Color an R² score by how well the model fits
pub fn color_r2(r2: Option<f64>) -> String {
    match r2 {
        Some(r2) if r2 >= 0.9 => format_metric(r2).green().to_string(),
        Some(r2) if r2 >= 0.7 => format_metric(r2).yellow().to_string(),
        Some(r2) => format_metric(r2).red().to_string(),
        None => "-".to_string(),
    }
}

/// Format a registry timestamp for display
pub fn format_timestamp(ts: &str) -> String {
    match NaiveDateTime::parse_from_str(ts, CREATED_FORMAT) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(1234.567), "$1234.57");
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(0.91234), "0.9123");
        assert_eq!(format_metric(412.345), "412.3");
        assert_eq!(format_metric(f64::NAN), "-");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2026-03-01 12:34:56"), "2026-03-01 12:34");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_color_r2_without_score() {
        assert_eq!(color_r2(None), "-");
    }
}
