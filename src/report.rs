//! Human-readable stage output.
//!
//! Every stage ends with a printed summary so a partially successful run can
//! be assessed at a glance. Issue lists are bounded: the first few entries
//! are shown followed by `... and K more`.

use serde::Deserialize;
use std::fmt;

/// How many entries of an issue list are printed before truncating.
pub const PREVIEW_LIMIT: usize = 5;

const TABLE_COLUMNS: usize = 4;
const TABLE_WIDTH: usize = 40;

/// Severity of a collected validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Makes the pre-validation report fail
    Error,
    /// Reported, does not affect validity
    #[default]
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Error => write!(f, "error"),
            IssueSeverity::Warning => write!(f, "warning"),
        }
    }
}

pub fn print_section(title: &str) {
    println!("\n📋 {}", title);
    println!("{}", "-".repeat(title.chars().count() + 3));
}

/// Lines of a bounded preview: at most `limit` items, then a remainder line.
pub fn bounded_lines<T: fmt::Display>(items: &[T], limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = items.iter().take(limit).map(|i| i.to_string()).collect();
    if items.len() > limit {
        lines.push(format!("... and {} more", items.len() - limit));
    }
    lines
}

pub fn print_bounded<T: fmt::Display>(header: &str, items: &[T]) {
    if items.is_empty() {
        return;
    }
    println!("{} ({}):", header, items.len());
    for line in bounded_lines(items, PREVIEW_LIMIT) {
        println!("   {}", line);
    }
}

/// Rows of names, four per row, each padded to a fixed width.
pub fn name_table_rows<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .chunks(TABLE_COLUMNS)
        .map(|row| {
            row.iter()
                .map(|n| format!("{:<width$}", n.as_ref(), width = TABLE_WIDTH))
                .collect::<Vec<_>>()
                .join("\t")
                .trim_end()
                .to_string()
        })
        .collect()
}

pub fn print_name_table<S: AsRef<str>>(names: &[S]) {
    for row in name_table_rows(names) {
        println!("{}", row);
    }
}

/// Counts plus a PASS/FAIL status, printed at the end of a stage.
#[derive(Debug, Clone)]
pub struct Summary {
    title: String,
    counts: Vec<(String, usize)>,
    passed: bool,
}

impl Summary {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            counts: Vec::new(),
            passed: true,
        }
    }

    pub fn count(mut self, label: impl Into<String>, value: usize) -> Self {
        self.counts.push((label.into(), value));
        self
    }

    pub fn passed(mut self, passed: bool) -> Self {
        self.passed = passed;
        self
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    pub fn print(&self) {
        print!("{}", self);
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n📊 {}", self.title)?;
        for (label, value) in &self.counts {
            writeln!(f, "   {:<24} {}", format!("{}:", label), value)?;
        }
        if self.passed {
            writeln!(f, "   Status: ✅ PASS")
        } else {
            writeln!(f, "   Status: ❌ FAIL")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_lines_truncates_with_remainder() {
        let items: Vec<usize> = (1..=8).collect();
        let lines = bounded_lines(&items, 5);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[4], "5");
        assert_eq!(lines[5], "... and 3 more");
        assert_eq!(bounded_lines(&items[..3], 5).len(), 3);
    }

    #[test]
    fn test_name_table_four_per_row() {
        let names = ["A", "B", "C", "D", "E"];
        let rows = name_table_rows(&names);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].split('\t').count(), 4);
        assert!(rows[0].starts_with(&format!("{:<40}", "A")));
        assert_eq!(rows[1], "E");
    }

    #[test]
    fn test_summary_renders_status() {
        let summary = Summary::new("Schemas")
            .count("Models processed", 3)
            .passed(false);
        let text = summary.to_string();
        assert!(text.contains("Models processed:"));
        assert!(text.contains("❌ FAIL"));
        assert!(!summary.is_passed());
    }
}
