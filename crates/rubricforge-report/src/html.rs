//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use rubricforge_core::aggregate::display_number;
use rubricforge_core::report::AggregateReport;
use rubricforge_core::results::EvaluationResult;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report.
pub fn generate_html(report: &AggregateReport) -> String {
    let summary = &report.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"zh\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(&report.title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.title)));
    html.push_str(&format!(
        "<p class=\"meta\">评估日期: <strong>{}</strong></p>\n",
        summary.date_string()
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>评估概览</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>总分</th><th>得分率</th><th>等级</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}/{}</td><td>{}%</td><td class=\"{}\">{}</td></tr></tbody>\n",
        display_number(summary.total_score),
        display_number(summary.max_total_score),
        display_number(summary.percentage),
        score_class(summary.percentage / 100.0),
        html_escape(&summary.grade.to_string()),
    ));
    html.push_str("</table>\n");

    if !report.dimension_results.is_empty() {
        html.push_str(&generate_bar_chart(&report.dimension_results));
    }
    html.push_str("</section>\n");

    // Per-dimension sections
    for (i, result) in report.dimension_results.iter().enumerate() {
        push_dimension(&mut html, i + 1, result);
    }

    // Recommendations
    html.push_str("<section class=\"recommendations\">\n");
    html.push_str("<h2>改进建议</h2>\n<ol>\n");
    for recommendation in &report.recommendations {
        html.push_str(&format!("<li>{}</li>\n", html_escape(recommendation)));
    }
    html.push_str("</ol>\n</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>原始数据 (JSON)</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

fn push_dimension(html: &mut String, number: usize, result: &EvaluationResult) {
    html.push_str("<section class=\"dimension\">\n");
    html.push_str(&format!(
        "<h2>{}. {} <span class=\"{}\">({}/{}分)</span></h2>\n",
        number,
        html_escape(&result.name),
        score_class(result.fraction()),
        display_number(result.score),
        display_number(result.max_score)
    ));

    if !result.rule.is_empty() {
        html.push_str("<h3>评估标准</h3>\n");
        html.push_str(&format!("<p class=\"rule\">{}</p>\n", html_escape(&result.rule)));
    }

    if !result.facts.is_empty() {
        html.push_str("<h3>评估结果</h3>\n<ul class=\"facts\">\n");
        for fact in &result.facts {
            html.push_str(&format!(
                "<li><strong>{}</strong>: {}</li>\n",
                html_escape(&fact.label),
                html_escape(&fact.value)
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("<h3>详细结果</h3>\n<ul class=\"details\">\n");
    for line in &result.detail_lines {
        html.push_str(&format!("<li>{}</li>\n", html_escape(line)));
    }
    html.push_str("</ul>\n</section>\n");
}

fn score_class(fraction: f64) -> &'static str {
    if fraction >= 0.8 {
        "pass"
    } else if fraction >= 0.6 {
        "warn"
    } else {
        "fail"
    }
}

fn generate_bar_chart(results: &[EvaluationResult]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = results.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 80,
        total_height
    );

    for (i, result) in results.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let fraction = result.fraction().clamp(0.0, 1.0);
        let width = (fraction * max_width as f64) as usize;

        let color = if fraction >= 0.8 {
            "#22c55e"
        } else if fraction >= 0.6 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&result.name)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}/{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            display_number(result.score),
            display_number(result.max_score)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --warn: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --warn: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'PingFang SC', 'Microsoft YaHei', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
h3 { margin-bottom: 0.25rem; }
.meta { color: #6b7280; }
.rule { white-space: pre-wrap; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.pass { background: var(--pass); }
.warn { background: var(--warn); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;
