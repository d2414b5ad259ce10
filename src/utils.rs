use colored::Colorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Eligibility status badge: green for Eligible, red otherwise
pub fn format_eligibility_status(status: &str) -> String {
    if status.is_empty() {
        String::new()
    } else if status.trim().eq_ignore_ascii_case("eligible") {
        status.green().to_string()
    } else {
        status.red().to_string()
    }
}

/// Truncate to a display width, marking the cut with "..."
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let mut out = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width - 3 {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push_str("...");
    out
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> std::io::Result<bool> {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Pad a cell to `width` display columns, ignoring ANSI colour codes
pub fn pad_cell(cell: &str, width: usize) -> String {
    let visible = console::measure_text_width(cell);
    format!("{}{}", cell, " ".repeat(width.saturating_sub(visible)))
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    println!("{}", format_table_row(columns, widths));
}

pub fn format_table_row(columns: &[&str], widths: &[usize]) -> String {
    let mut row = String::new();
    for (col, width) in columns.iter().zip(widths) {
        row.push_str(&pad_cell(col, *width));
        row.push_str("  ");
    }
    row.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_display_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("No matching eligibility", 10), "No matc...");
        assert_eq!(truncate("abcdef", 2), "..");
    }

    #[test]
    fn test_pad_ignores_colour_codes() {
        colored::control::set_override(true);
        let coloured = "valid".green().to_string();
        let padded = pad_cell(&coloured, 8);
        assert_eq!(console::strip_ansi_codes(&padded), "valid   ");

        let wide = "日本".red().to_string();
        assert_eq!(console::strip_ansi_codes(&pad_cell(&wide, 6)), "日本  ");
        colored::control::unset_override();
    }

    #[test]
    fn test_row_formatting() {
        assert_eq!(format_table_row(&["a", "bb"], &[3, 3]), "a    bb");
    }
}
