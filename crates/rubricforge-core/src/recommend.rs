//! Recommendation synthesis.
//!
//! Recommendations follow dimension order. Within one dimension they are
//! emitted as: missing items (or the priority split), shortfalls, the quality
//! flag message, and finally the low-score message when nothing else was
//! said about that dimension.

use crate::results::EvaluationResult;
use crate::rubric::{Dimension, Rubric};

/// Fill `{items}`, `{item}`, `{label}` and `{count}` placeholders.
fn fill(template: &str, items: &str, label: &str, count: u64) -> String {
    template
        .replace("{items}", items)
        .replace("{item}", items)
        .replace("{label}", label)
        .replace("{count}", &count.to_string())
}

/// Recommendations for a single dimension result.
pub fn recommend_dimension(dim: &Dimension, result: &EvaluationResult) -> Vec<String> {
    let advice = &dim.advice;
    let mut out = Vec::new();

    if !result.unmatched.is_empty() {
        if let Some(priority) = &advice.priority {
            let weight = |name: &String| dim.criterion_weight(name).unwrap_or(1.0);
            let (high, low): (Vec<&String>, Vec<&String>) = result
                .unmatched
                .iter()
                .partition(|name| weight(name) >= priority.threshold);
            let join = |names: &[&String]| {
                names
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            if !high.is_empty() {
                out.push(fill(&priority.template, &join(&high), "", 0));
            }
            if !low.is_empty() {
                out.push(fill(&priority.secondary, &join(&low), "", 0));
            }
        } else if let Some(template) = &advice.missing {
            out.push(fill(template, &result.unmatched.join(", "), "", 0));
        }

        if let Some(template) = &advice.per_item {
            for item in &result.unmatched {
                out.push(fill(template, item, "", 0));
            }
        }
    }

    if let Some(template) = &advice.shortfall {
        for shortfall in result.shortfalls.iter().filter(|s| s.count > 0) {
            let label = shortfall.label.as_deref().unwrap_or("");
            out.push(fill(template, "", label, shortfall.count));
        }
    }

    if !result.flags.is_empty() {
        if let Some(message) = &advice.flagged {
            out.push(message.clone());
        }
    }

    if out.is_empty() {
        if let Some(low) = &advice.low_score {
            if result.fraction() < low.below {
                out.push(low.message.clone());
            }
        }
    }

    out
}

/// Recommendations for a whole run, falling back to the rubric's canned
/// message when no dimension produced one.
pub fn recommend(rubric: &Rubric, results: &[EvaluationResult]) -> Vec<String> {
    let mut out: Vec<String> = rubric
        .dimensions
        .iter()
        .zip(results)
        .flat_map(|(dim, result)| recommend_dimension(dim, result))
        .collect();

    if out.is_empty() {
        out.push(rubric.fallback.clone());
    }
    out
}
