//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use std::time::Duration;

use chrono::{DateTime, Local};
use colored::{Color, Colorize};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a neutral "nothing to do" notice (yellow)
pub fn notice(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().yellow());
}

/// Print progress to stderr so stdout stays clean for data
pub fn progress(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{} {}", "…".dimmed(), msg);
}

/// Print labelled value (label padded to a fixed column)
pub fn field(label: &str, value: &(impl std::fmt::Display + ?Sized)) {
    println!("{:<21}{}", format!("{label}:"), value);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print plain output (no color, for data such as config documents)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print prompt without newline (cyan)
pub fn prompt(msg: &(impl std::fmt::Display + ?Sized)) {
    use std::io::Write;
    print!("{} ", msg.to_string().cyan());
    std::io::stdout().flush().ok();
}

/// Color used for a build result or node state label.
pub fn status_color(label: &str) -> Option<Color> {
    match label {
        "SUCCESS" | "Online" => Some(Color::Green),
        "FAILURE" | "ERROR" | "Offline" => Some(Color::Red),
        "UNSTABLE" => Some(Color::Yellow),
        "ABORTED" => Some(Color::Magenta),
        _ => None,
    }
}

/// Seconds with one decimal, e.g. `12.3s`.
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

/// Local time of an epoch-milliseconds timestamp.
pub fn format_timestamp(epoch_ms: i64, fmt: &str) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.with_timezone(&Local).format(fmt).to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// One table cell with optional color.
#[derive(Debug, Clone)]
pub struct Cell {
    text: String,
    color: Option<Color>,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Option<Color>) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    /// Cell colored by [`status_color`].
    pub fn status(text: impl Into<String>) -> Self {
        let text = text.into();
        let color = status_color(&text);
        Self { text, color }
    }
}

/// Boxed text table; columns are padded on the plain text, then colored.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Render the table; `with_color` false produces plain text for files.
    pub fn render(&self, with_color: bool) -> String {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; columns];
        for (i, h) in self.headers.iter().enumerate() {
            widths[i] = widths[i].max(h.chars().count());
        }
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.text.chars().count());
            }
        }

        let separator = {
            let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
            format!("+{}+", dashes.join("+"))
        };

        let line = |cells: Vec<(String, Option<Color>)>| -> String {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    let (text, color) = cells.get(i).cloned().unwrap_or_default();
                    let text = format!("{text:<w$}");
                    match color {
                        Some(c) if with_color => text.color(c).to_string(),
                        _ => text,
                    }
                })
                .collect();
            format!("| {} |", padded.join(" | "))
        };

        let mut out = Vec::with_capacity(self.rows.len() + 4);
        out.push(separator.clone());
        out.push(line(
            self.headers.iter().map(|h| (h.clone(), None)).collect(),
        ));
        out.push(separator.clone());
        for row in &self.rows {
            out.push(line(
                row.iter().map(|c| (c.text.clone(), c.color)).collect(),
            ));
        }
        out.push(separator);
        out.join("\n")
    }

    /// Print the table to stdout with colors.
    pub fn print(&self) {
        println!("{}", self.render(true));
    }
}
