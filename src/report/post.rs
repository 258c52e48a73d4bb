#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use super::{Delivery, Report};

/// A file embedded in the networked report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludedFile {
    /// file name
    pub name: String,
    /// absolute path
    pub path: String,
    /// contents; left out when the file can't be read as text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Embeds the allow-listed files that exist.
///
/// * `paths`: allow-list from the policy
/// * `base`: directory relative paths are resolved against
pub fn collect_files(paths: &[PathBuf], base: &Path) -> Vec<IncludedFile> {
    paths
        .iter()
        .map(|p| base.join(p))
        .filter(|p| p.exists())
        .map(|path| {
            let absolute = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            IncludedFile {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path: absolute.display().to_string(),
                data: std::fs::read_to_string(&path).ok(),
            }
        })
        .collect()
}

/// POSTs the report as JSON. Never fails; problems come back as
/// [`Delivery::Failed`].
///
/// * `endpoint`: collection URL
/// * `report`: the report, files included
/// * `timeout`: bound on the whole request
pub async fn post_report(endpoint: &str, report: &Report, timeout: Duration) -> Delivery {
    let result = async {
        let body = report.to_json()?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to send report to {endpoint}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{endpoint} answered {status}");
        }
        tracing::debug!("Report accepted by {endpoint} ({status})");
        Ok::<(), anyhow::Error>(())
    }
    .await;

    Delivery::from_result("POST", result)
}
