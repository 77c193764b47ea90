//! Plain-text combined report: canvas JSON followed by the chain analysis.

use crate::chain::{ChainStep, SessionContext};

/// Header preceding the canvas JSON.
pub const JSON_SECTION_HEADER: &str = "=== BUSINESS MODEL CANVAS JSON ===";

/// Header preceding the chain results.
pub const ANALYSIS_SECTION_HEADER: &str = "=== BUSINESS MODEL CANVAS ANALYSIS ===";

/// Renders the three step results under their titles.
///
/// Steps that have not produced a result are written with a placeholder.
pub fn analysis_text(session: &SessionContext) -> String {
    let sections: Vec<String> = ChainStep::ALL
        .iter()
        .map(|step| {
            let body = session
                .text(*step)
                .unwrap_or_else(|| step.missing_placeholder());
            format!("{}:\n{}", step.report_title(), body)
        })
        .collect();
    format!("{}\n", sections.join("\n\n"))
}

/// Assembles the full report from the canvas JSON and the analysis text.
pub fn combined_report(canvas_json: &str, analysis: &str) -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n{}",
        JSON_SECTION_HEADER, canvas_json, ANALYSIS_SECTION_HEADER, analysis
    )
}
