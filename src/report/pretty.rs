#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Write;

use anyhow::Context;
use itertools::Itertools;

use super::{Delivery, Report};
use crate::{
    config::PrettyPolicy,
    constants::{DESCRIPTION_WIDTH, POINTS_WIDTH, REPORT_WIDTH},
};

/// Reminder printed when a run raised the score from uncommitted changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitBanner {
    /// best score before this run
    pub previous_best: u32,
    /// this run's capped score
    pub points_earned: u32,
}

/// Writes a rendered report to `out`.
pub fn write_to(out: &mut impl std::io::Write, rendered: &str) -> Delivery {
    let result = std::io::Write::write_all(out, rendered.as_bytes())
        .and_then(|()| std::io::Write::flush(out))
        .context("Could not write the pretty report");
    Delivery::from_result("Pretty", result)
}

/// Writes a rendered report to stdout.
pub fn print(rendered: &str) -> Delivery {
    write_to(&mut std::io::stdout().lock(), rendered)
}

/// Greedy word wrap at `width` columns. Words longer than a line are kept
/// whole on a line of their own.
pub fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = vec![];
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.iter().join("\n")
}

/// Renders the fixed-width table students see.
///
/// * `report`: the report
/// * `policy`: title, notes, and whether to show the total
/// * `banner`: commit reminder, when the score rose from uncommitted changes
pub fn render(report: &Report, policy: &PrettyPolicy, banner: Option<CommitBanner>) -> String {
    let rule = "-".repeat(REPORT_WIDTH);
    let mut out = String::new();

    // writing to a String can't fail
    let _ = writeln!(out, "{rule}");
    if let Some(title) = &policy.title {
        let _ = writeln!(out, "{title}\n{rule}");
    }

    for entry in &report.scores {
        let description: String = entry.description().chars().take(DESCRIPTION_WIDTH).collect();
        let _ = writeln!(
            out,
            "{:<desc_width$}{:<points_width$}{}",
            description,
            entry.points_earned(),
            entry.explanation(),
            desc_width = DESCRIPTION_WIDTH + 1,
            points_width = POINTS_WIDTH,
        );
    }
    let _ = writeln!(out, "{rule}");

    if policy.show_total {
        let _ = write!(
            out,
            "{:<desc_width$}{:<points_width$}",
            "Total",
            report.total.points_earned,
            desc_width = DESCRIPTION_WIDTH + 1,
            points_width = POINTS_WIDTH,
        );
        if let Some(raw) = report.total.raw_points_earned {
            let _ = write!(out, "(the maximum, capped from {raw})");
        }
        let _ = writeln!(out, "\n{rule}");
    }

    if let Some(notes) = &policy.notes {
        let notes = if notes.contains('\n') {
            notes.clone()
        } else {
            wrap(notes, REPORT_WIDTH)
        };
        let _ = writeln!(out, "{notes}\n{rule}");
    }

    if let Some(banner) = banner {
        let _ = writeln!(
            out,
            "CONGRATULATIONS: Your changes increased your score from {} to {}!",
            banner.previous_best, banner.points_earned
        );
        let _ = writeln!(
            out,
            "Commit your work right away! The autograder will not run again until you do."
        );
        let _ = writeln!(out, "{rule}");
    }

    out
}
