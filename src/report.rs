//! Run summaries and plain-text table rendering for the CLI.

use std::{collections::BTreeMap, fmt::Write as _, fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    frame::Frame,
    pipeline::{Enrichment, PipelineOutput, RejectReason},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub raw_lines: usize,
    pub retained_lines: usize,
    pub rejected_lines: usize,
    pub rejected_by_reason: BTreeMap<RejectReason, usize>,
    pub baskets: usize,
    pub coupon_baskets: usize,
    pub coupon_rate: f64,
    pub enrichment: Enrichment,
}

impl RunSummary {
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            raw_lines: output.raw_lines,
            retained_lines: output.lines.height(),
            rejected_lines: output.rejected.height(),
            rejected_by_reason: output.reject_counts.clone(),
            baskets: output.baskets.len(),
            coupon_baskets: output.treated_baskets(),
            coupon_rate: output.coupon_rate(),
            enrichment: output.enrichment.clone(),
        }
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating summary file {path:?}"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).context("Writing summary JSON")
    }

    /// Metric/value pairs in display order.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![
            vec!["raw lines".to_string(), self.raw_lines.to_string()],
            vec!["retained lines".to_string(), self.retained_lines.to_string()],
            vec!["rejected lines".to_string(), self.rejected_lines.to_string()],
        ];
        for (reason, count) in &self.rejected_by_reason {
            rows.push(vec![format!("  {reason}"), count.to_string()]);
        }
        rows.push(vec!["baskets".to_string(), self.baskets.to_string()]);
        rows.push(vec![
            "coupon baskets".to_string(),
            self.coupon_baskets.to_string(),
        ]);
        rows.push(vec![
            "coupon rate".to_string(),
            format!("{:.3}", self.coupon_rate),
        ]);
        let enrichment = match &self.enrichment {
            Enrichment::Joined { columns, .. } => format!("joined {}", columns.names().join(", ")),
            Enrichment::Skipped { reason } => format!("skipped ({reason})"),
        };
        rows.push(vec!["attributes".to_string(), enrichment]);
        rows
    }
}

/// Renders a frame preview of at most `limit` rows.
pub fn render_frame(frame: &Frame, limit: usize) -> String {
    render_table(frame.columns(), &frame.preview_rows(limit))
}

/// Aligned text table. Columns whose cells all look numeric are right-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }
    let numeric = (0..headers.len())
        .map(|idx| {
            !rows.is_empty()
                && rows.iter().all(|row| {
                    row.get(idx)
                        .is_none_or(|cell| cell.is_empty() || cell.parse::<f64>().is_ok())
                })
        })
        .collect::<Vec<_>>();

    let mut output = String::new();
    let header_cells = headers.iter().map(String::as_str).collect::<Vec<_>>();
    push_line(&mut output, &header_cells, &widths, &numeric);
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let rule_cells = rule.iter().map(String::as_str).collect::<Vec<_>>();
    push_line(&mut output, &rule_cells, &widths, &numeric);
    for row in rows {
        let cells = row
            .iter()
            .map(|cell| cell.as_str())
            .collect::<Vec<_>>();
        push_line(&mut output, &cells, &widths, &numeric);
    }
    output
}

fn push_line(output: &mut String, cells: &[&str], widths: &[usize], numeric: &[bool]) {
    let mut line = String::new();
    for (idx, &width) in widths.iter().enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = cells.get(idx).copied().unwrap_or("").replace(['\n', '\r', '\t'], " ");
        if numeric[idx] {
            let _ = write!(line, "{cell:>width$}");
        } else {
            let _ = write!(line, "{cell:<width$}");
        }
    }
    let _ = writeln!(output, "{}", line.trim_end());
}
