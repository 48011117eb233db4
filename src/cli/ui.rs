use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(
        Cell::new("N/A")
            .fg(Color::DarkGrey)
            .set_alignment(CellAlignment::Right),
        |v| Cell::new(format_fn(v)).set_alignment(CellAlignment::Right),
    )
}

/// Creates a cell for displaying percentage change with color coding.
pub fn change_cell(change: f64) -> Cell {
    let text = delta_text(change);
    let color = if change > 0.0 {
        Color::Green
    } else if change < 0.0 {
        Color::Red
    } else {
        Color::DarkGrey
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

/// Arrow-prefixed percentage, e.g. `▲ 0.25%`.
pub fn delta_text(change_percent: f64) -> String {
    if change_percent > 0.0 {
        format!("▲ {change_percent:.2}%")
    } else if change_percent < 0.0 {
        format!("▼ {:.2}%", change_percent.abs())
    } else {
        "● 0.00%".to_string()
    }
}

/// [`delta_text`] coloured for the terminal.
pub fn styled_delta(change_percent: f64) -> String {
    let text = delta_text(change_percent);
    let styled = if change_percent > 0.0 {
        style(text).green()
    } else if change_percent < 0.0 {
        style(text).red()
    } else {
        style(text).dim()
    };
    styled.to_string()
}

/// Formats an amount as `USD 1,234.56`.
pub fn format_money(amount: f64, currency: &str) -> String {
    if !amount.is_finite() {
        return format!("{currency} N/A");
    }
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{currency} {sign}{grouped}.{fraction}")
}

/// Relative age of a provider timestamp.
pub fn last_update_text(timestamp_seconds: i64, now_seconds: i64) -> String {
    let minutes = ((now_seconds - timestamp_seconds).max(0) as f64 / 60.0).round() as i64;
    if minutes <= 1 {
        "just now".to_string()
    } else {
        format!("{minutes} minutes ago")
    }
}

/// Creates a spinner shown while waiting on the first fetch.
pub fn new_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(2000.0, "USD"), "USD 2,000.00");
        assert_eq!(format_money(64.3015, "USD"), "USD 64.30");
        assert_eq!(format_money(1234567.891, "INR"), "INR 1,234,567.89");
        assert_eq!(format_money(-5.0, "USD"), "USD -5.00");
        assert_eq!(format_money(-0.001, "USD"), "USD 0.00");
        assert_eq!(format_money(999.999, "EUR"), "EUR 1,000.00");
        assert_eq!(format_money(f64::NAN, "EUR"), "EUR N/A");
    }

    #[test]
    fn test_delta_text() {
        assert_eq!(delta_text(0.25), "▲ 0.25%");
        assert_eq!(delta_text(-0.25), "▼ 0.25%");
        assert_eq!(delta_text(0.0), "● 0.00%");
    }

    #[test]
    fn test_last_update_text() {
        assert_eq!(last_update_text(1000, 1000), "just now");
        assert_eq!(last_update_text(1000, 1080), "just now");
        assert_eq!(last_update_text(1000, 1300), "5 minutes ago");
        assert_eq!(last_update_text(2000, 1000), "just now");
    }
}
