use crate::{BatchReport, SpellError};
use anyhow::Result;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Widest a table cell may grow before it is cut with an ellipsis
const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonFailure {
    file: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    files_checked: usize,
    files_failed: usize,
    total_errors: usize,
    cancelled: bool,
    errors: &'a [SpellError],
    failures: Vec<JsonFailure>,
}

pub fn print_results(report: &BatchReport, colored_output: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print!("{}", render_table(&report.records, colored_output));
            Ok(())
        }
        OutputFormat::Json => print_json(report),
    }
}

fn print_json(report: &BatchReport) -> Result<()> {
    let output = JsonOutput {
        files_checked: report.files_processed - report.failures.len(),
        files_failed: report.failures.len(),
        total_errors: report.records.len(),
        cancelled: report.cancelled,
        errors: &report.records,
        failures: report
            .failures
            .iter()
            .map(|f| JsonFailure {
                file: f.path.display().to_string(),
                error: f.error.to_string(),
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn truncate(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL_WIDTH {
        return cell.to_string();
    }
    let mut cut: String = cell.chars().take(MAX_CELL_WIDTH - 1).collect();
    cut.push('…');
    cut
}

fn cells(record: &SpellError) -> [String; 6] {
    [
        truncate(&record.document_file_name),
        truncate(&record.misspelled_text),
        record.page_number.to_string(),
        record.line_number.to_string(),
        record.position.to_string(),
        truncate(&record.suggested_words),
    ]
}

/// Fixed-width table with the record columns in field order.
pub fn render_table(records: &[SpellError], colored_output: bool) -> String {
    if records.is_empty() {
        return String::new();
    }

    let rows: Vec<[String; 6]> = records.iter().map(cells).collect();
    let mut widths = SpellError::COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = SpellError::COLUMNS
        .iter()
        .zip(widths)
        .map(|(name, width)| format!("{:<width$}", name, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    if colored_output {
        out.push_str(&format!("{}\n", header.trim_end().bold()));
    } else {
        out.push_str(&format!("{}\n", header.trim_end()));
    }

    for row in rows {
        let line = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(col, (cell, width))| {
                let padded = if (2..=4).contains(&col) {
                    format!("{:>width$}", cell, width = width)
                } else {
                    format!("{:<width$}", cell, width = width)
                };
                match col {
                    1 if colored_output => padded.red().bold().to_string(),
                    5 if colored_output => padded.green().to_string(),
                    _ => padded,
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

pub fn print_summary(report: &BatchReport, colored: bool) {
    let total = report.records.len();
    let checked = report.files_processed - report.failures.len();
    let files = if checked == 1 { "file" } else { "files" };

    println!();
    if total == 0 {
        let msg = format!("✓ No spelling errors found in {} {}", checked, files);
        if colored {
            println!("{}", msg.green().bold());
        } else {
            println!("{}", msg);
        }
    } else {
        let error_word = if total == 1 { "error" } else { "errors" };
        if colored {
            println!(
                "{} {} {} found in {} {}",
                "✗".red().bold(),
                total.to_string().red().bold(),
                error_word,
                checked,
                files
            );
        } else {
            println!("✗ {} {} found in {} {}", total, error_word, checked, files);
        }
    }

    if !report.failures.is_empty() {
        let msg = format!(
            "! {} of {} documents could not be checked (see log)",
            report.failures.len(),
            report.files_total
        );
        if colored {
            println!("{}", msg.yellow());
        } else {
            println!("{}", msg);
        }
    }

    if report.cancelled {
        let msg = format!(
            "! Cancelled after {} of {} documents",
            report.files_processed, report.files_total
        );
        if colored {
            println!("{}", msg.yellow());
        } else {
            println!("{}", msg);
        }
    }
}

pub fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

/// Ask where to save the spreadsheet. Empty answer or a closed prompt skips export.
pub fn prompt_export_path() -> Option<PathBuf> {
    let answer: String = dialoguer::Input::new()
        .with_prompt("Save results to (.xlsx, empty to skip)")
        .allow_empty(true)
        .interact_text()
        .ok()?;

    let answer = answer.trim();
    if answer.is_empty() {
        None
    } else {
        Some(PathBuf::from(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(word: &str, suggestions: &str) -> SpellError {
        SpellError {
            document_file_name: "report.docx".to_string(),
            misspelled_text: word.to_string(),
            page_number: 1,
            line_number: 12,
            position: 345,
            suggested_words: suggestions.to_string(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_table_has_header_and_rows() {
        let table = render_table(&[record("teh", "the, tea"), record("wrold", "")], false);
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("documentFileName  misspelledText  pageNumber"));
        assert!(lines[0].ends_with("suggestedWords"));
        assert!(lines[1].starts_with("report.docx"));
        assert!(lines[1].contains("teh"));
        assert!(lines[1].ends_with("the, tea"));
        assert!(lines[2].contains("wrold"));
        assert!(lines[2].ends_with("345"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render_table(&[], false), "");
    }

    #[test]
    fn test_long_cells_are_cut() {
        let long = "a, ".repeat(40);
        let table = render_table(&[record("teh", &long)], false);
        assert!(table.lines().nth(1).unwrap().ends_with('…'));
    }
}
