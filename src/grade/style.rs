#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::Path;

use super::{parsers::parse_style_report, results::StyleResult};

/// Label used for the style row of the report.
const STYLE_DESCRIPTION: &str = "checkstyle";

/// Builds the line item for a style tool that left no usable report.
fn crashed(points_possible: u32) -> StyleResult {
    StyleResult {
        ran: false,
        passed: false,
        points_earned: 0,
        points_possible,
        description: STYLE_DESCRIPTION.to_string(),
        explanation: "checkstyle crashed".to_string(),
    }
}

/// Folds the style checker's XML report into a pass/fail line item worth
/// `points`.
///
/// An absent or empty report means the checker crashed, and so does one that
/// can't be parsed. A crash is scored as a failure and asks for a full
/// teardown through [`StyleResult::teardown_required`].
pub fn grade_style(report: &Path, points: u32) -> StyleResult {
    let contents = match std::fs::read_to_string(report) {
        Ok(c) if !c.trim().is_empty() => c,
        Ok(_) => {
            tracing::warn!("Style report {} is empty", report.display());
            return crashed(points);
        }
        Err(e) => {
            tracing::warn!("Style report {} is missing: {e}", report.display());
            return crashed(points);
        }
    };

    let parsed = match parse_style_report(&contents) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Could not parse style report {}: {e:#}", report.display());
            return crashed(points);
        }
    };

    let errors = parsed.error_count();
    let passed = errors == 0;
    StyleResult {
        ran: true,
        passed,
        points_earned: if passed { points } else { 0 },
        points_possible: points,
        description: STYLE_DESCRIPTION.to_string(),
        explanation: if passed {
            "No checkstyle errors were reported".to_string()
        } else {
            format!("checkstyle found style issues ({errors})")
        },
    }
}
