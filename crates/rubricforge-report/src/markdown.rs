//! Markdown report renderer.
//!
//! This is the canonical report document. Sections follow dimension order
//! and every list keeps the order it was recorded in, so the same report
//! always renders to the same bytes.

use std::fmt::Write;

use rubricforge_core::aggregate::display_number;
use rubricforge_core::report::AggregateReport;
use rubricforge_core::results::EvaluationResult;

/// Render a report as Markdown.
pub fn render_markdown(report: &AggregateReport) -> String {
    let summary = &report.summary;
    let mut md = String::new();

    let _ = writeln!(md, "# {}", report.title);
    md.push('\n');
    md.push_str("## 评估概览\n");
    let _ = writeln!(md, "- **评估日期**: {}", summary.date_string());
    let _ = writeln!(
        md,
        "- **总分**: {}/{}",
        display_number(summary.total_score),
        display_number(summary.max_total_score)
    );
    let _ = writeln!(md, "- **得分率**: {}%", display_number(summary.percentage));
    let _ = writeln!(md, "- **等级**: {}", summary.grade);

    for (i, result) in report.dimension_results.iter().enumerate() {
        md.push('\n');
        push_dimension(&mut md, i + 1, result);
    }

    md.push_str("\n## 改进建议\n\n");
    for (i, recommendation) in report.recommendations.iter().enumerate() {
        let _ = writeln!(md, "{}. {}", i + 1, recommendation);
    }

    md
}

fn push_dimension(md: &mut String, number: usize, result: &EvaluationResult) {
    let _ = writeln!(
        md,
        "## {}. {} ({}/{}分)",
        number,
        result.name,
        display_number(result.score),
        display_number(result.max_score)
    );

    if !result.rule.is_empty() {
        md.push_str("\n### 评估标准\n");
        let _ = writeln!(md, "{}", result.rule);
    }

    if !result.facts.is_empty() {
        md.push_str("\n### 评估结果\n");
        for fact in &result.facts {
            let _ = writeln!(md, "- **{}**: {}", fact.label, fact.value);
        }
    }

    md.push_str("\n### 详细结果\n");
    for line in &result.detail_lines {
        let _ = writeln!(md, "- {line}");
    }
}
