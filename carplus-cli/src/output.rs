//! Terminal output helpers shared by the commands

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Goes to stderr so `--json` output stays parseable
pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Quantities print without a trailing `.0` when whole
pub fn format_qty(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

pub fn format_money(value: f64) -> String {
    format!("€{:.2}", value)
}
