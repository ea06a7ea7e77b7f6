//! Terminal output helpers for the `kload` CLI.
//!
//! - `Table` - box-drawn table sized to its content, clipped to the terminal
//! - `human_bytes` - short size strings for cache listings

use colored::*;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(console::measure_text_width(cell));
            }
        }

        // Shrink the widest column until the table fits, but not below 8.
        let overhead = 3 + 3 * widths.len();
        while overhead + widths.iter().sum::<usize>() > max_width {
            let Some((idx, &widest)) = widths.iter().enumerate().max_by_key(|(_, w)| **w) else {
                break;
            };
            if widest <= 8 {
                break;
            }
            widths[idx] -= 1;
        }
        widths
    }

    fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }

        let widths = self.column_widths(max_width);
        let rule = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, segments.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| {
            let mut out = String::from("  │");
            for (cell, width) in cells.iter().zip(&widths) {
                let clipped = console::truncate_str(cell, *width, "...");
                let pad = width.saturating_sub(console::measure_text_width(&clipped));
                let text = if bold {
                    clipped.bold().to_string()
                } else {
                    clipped.to_string()
                };
                out.push_str(&format!(" {}{} │", text, " ".repeat(pad)));
            }
            out
        };

        let mut lines = vec![rule("┌", "┬", "┐"), line(self.headers.as_slice(), true), rule("├", "┼", "┤")];
        lines.extend(self.rows.iter().map(|row| line(row.as_slice(), false)));
        lines.push(rule("└", "┴", "┘"));
        lines
    }
}

pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_with_wrong_arity_are_dropped() {
        let mut table = Table::new(&["Name", "Version"]);
        table.add_row(vec!["stdlib".to_string()]);
        table.add_row(vec!["stdlib".to_string(), "1.8.0".to_string()]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn render_has_borders_and_rows() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Name", "Version"]);
        table.add_row(vec!["stdlib".to_string(), "1.8.0".to_string()]);

        let lines = table.render(80);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("  ┌"));
        assert!(lines[3].contains("stdlib"));
        assert!(lines[3].contains("1.8.0"));
    }

    #[test]
    fn narrow_terminal_clips_widest_column() {
        let mut table = Table::new(&["Artifact", "Size"]);
        table.add_row(vec!["x".repeat(60), "1 B".to_string()]);

        let widths = table.column_widths(40);
        assert!(3 + 3 * 2 + widths.iter().sum::<usize>() <= 40);
    }

    #[test]
    fn human_bytes_units() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(3 * 1024 * 1024), "3.0 MiB");
    }
}
