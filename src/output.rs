//! Text Output Rendering
//!
//! Everything the session prints to the operator is rendered here as plain
//! text, so the session itself only decides *what* to show.
//!
//! # Output Contract
//! - Result sets: aligned table with a header row and a dashed separator,
//!   followed by `N row(s) returned.`
//! - Empty result sets: `0 rows returned.`
//! - Row-affecting statements: `N row(s) affected.`
//! - Listings: numbered lines (`1. name`)

use serde_json::Value;

use crate::engine::{ColumnDescriptor, QueryResult};

/// Render a query result for the terminal
#[must_use]
pub fn render_result(result: &QueryResult) -> String {
    match result {
        QueryResult::Rows { rows, .. } if rows.is_empty() => "0 rows returned.".to_string(),
        QueryResult::Rows { columns, rows } => {
            let cells: Vec<Vec<String>> =
                rows.iter().map(|row| row.iter().map(format_value).collect()).collect();
            let mut out = render_table(columns, &cells);
            out.push_str(&format!("\n{} row(s) returned.", rows.len()));
            out
        }
        QueryResult::Affected { rows_affected } => format!("{rows_affected} row(s) affected."),
    }
}

/// Render a numbered listing
#[must_use]
pub fn render_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render table columns as an aligned table
#[must_use]
pub fn render_columns(columns: &[ColumnDescriptor]) -> String {
    let headers = ["column", "type", "nullable", "default"].map(String::from);
    let cells: Vec<Vec<String>> = columns
        .iter()
        .map(|col| {
            let data_type = match col.max_length {
                Some(len) => format!("{}({len})", col.data_type),
                None => col.data_type.clone(),
            };
            vec![
                col.name.clone(),
                data_type,
                if col.nullable { "YES" } else { "NO" }.to_string(),
                col.default.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&headers, &cells)
}

/// Format a single cell value
///
/// NULL prints as `NULL`, strings print without quotes, everything else uses
/// its JSON text.
#[must_use]
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers, &widths));

    let total_width = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 3;
    lines.push("-".repeat(total_width));

    for row in rows {
        lines.push(render_row(row, &widths));
    }
    lines.join("\n")
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    parts.join(" | ").trim_end().to_string()
}
