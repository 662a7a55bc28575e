//! Fixed-width score tables.
//!
//! The layout round-trips through
//! [`parse_score_table`](rubricforge_core::merge::parse_score_table).

use std::fmt::Write;

use rubricforge_core::merge::{ScoreTable, AVERAGE_ROW_LABEL};
use rubricforge_core::report::BatchSummary;

const HEADER: &str = "需求文档                 总分         得分率";

fn push_row(out: &mut String, name: &str, total: f64, rate: f64) {
    let _ = writeln!(out, "{name:<20} {total:>6.1}       {rate:>6.2}");
}

fn push_header(out: &mut String) {
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(&"-".repeat(80));
    out.push('\n');
}

/// Render a score table in its row order.
pub fn render_score_table(table: &ScoreTable) -> String {
    let mut out = String::new();
    push_header(&mut out);
    for row in &table.rows {
        push_row(&mut out, &row.name, row.total, row.rate);
    }
    out
}

/// Render a batch ranking followed by its average row.
pub fn render_batch_table(batch: &BatchSummary) -> String {
    let mut out = render_score_table(&ScoreTable::from_batch(batch));
    out.push_str(&"=".repeat(80));
    out.push('\n');
    push_row(
        &mut out,
        AVERAGE_ROW_LABEL,
        batch.average_total,
        batch.average_percentage,
    );
    out
}
