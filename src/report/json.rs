#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{io::Write, path::Path};

use anyhow::Context;

use super::Delivery;

/// Writes the serialized report to `path`, creating parent directories.
pub fn write_file(body: &str, path: &Path) -> Delivery {
    let result = (|| -> anyhow::Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        std::fs::write(path, body).with_context(|| format!("Could not write {}", path.display()))
    })();

    if result.is_ok() {
        tracing::debug!("Wrote JSON report to {}", path.display());
    }
    Delivery::from_result("JSON file", result)
}

/// Echoes the serialized report to stdout.
pub fn print(body: &str) -> Delivery {
    let mut stdout = std::io::stdout().lock();
    let result = writeln!(stdout, "{body}").context("Could not write the report to stdout");
    Delivery::from_result("JSON", result)
}
