#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Reads the contributors (partners) file students fill in before grading.

use std::path::Path;

use crate::{config::IdentificationPolicy, error::GradeError};

/// Reads the contributors file and checks how many contributors it names.
///
/// Blank lines are ignored; every other line is one contributor, trimmed.
/// Returns `Ok(None)` when identification is disabled.
///
/// * `policy`: identification settings
/// * `base`: directory a relative contributors path is resolved against
pub fn read_contributors(
    policy: &IdentificationPolicy,
    base: &Path,
) -> Result<Option<Vec<String>>, GradeError> {
    if !policy.enabled {
        return Ok(None);
    }

    let Some(file) = &policy.file else {
        return Err(crate::config::ConfigError::MissingIdentificationFile.into());
    };
    let file = base.join(file);

    let contents = std::fs::read_to_string(&file).map_err(|_| {
        GradeError::Identification(format!(
            "Missing contributor identification file: {}",
            file.display()
        ))
    })?;

    let contributors = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    let count = contributors.len();
    if count < policy.min_count || count > policy.max_count {
        return Err(GradeError::Identification(policy.message.clone().unwrap_or_else(
            || {
                format!(
                    "Invalid number of contributors ({count}) in identification file: {}",
                    file.display()
                )
            },
        )));
    }

    tracing::debug!("{count} contributor(s) identified");
    Ok(Some(contributors))
}
