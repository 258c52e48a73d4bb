#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Reads `@Graded`/`@Tag` annotations out of Java test sources.
pub mod annotations;
/// Tree-sitter parser wrapper.
pub mod parser;

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use annotations::scan_sources;
pub use parser::Parser;

use crate::grade::results::{TagValue, Tags};

/// A name/value tag declared on a graded test.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// tag name
    pub name:  String,
    /// tag value; empty when the annotation gave none
    #[serde(default)]
    pub value: String,
}

/// Points and presentation for one graded test method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointMetadata {
    /// points awarded when the test passes
    pub points:        u32,
    /// description shown instead of the method name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    /// tags copied onto the test's report entry
    #[serde(default)]
    pub tags:          Vec<Tag>,
}

impl PointMetadata {
    /// Creates metadata worth `points` with no name or tags.
    pub fn new(points: u32) -> Self {
        Self {
            points,
            ..Default::default()
        }
    }

    /// Sets the friendly name.
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag {
            name:  name.into(),
            value: value.into(),
        });
        self
    }

    /// Tags as they appear on a report entry.
    pub fn tag_map(&self) -> Tags {
        self.tags
            .iter()
            .map(|t| (t.name.clone(), TagValue::Text(t.value.clone())))
            .collect()
    }
}

/// Looks up how many points a test method is worth.
///
/// Returning `None` means the method is not graded (helpers, setup methods)
/// and is left out of the score entirely.
pub trait MetadataResolver {
    /// * `suite`: fully qualified test suite name, eg. `cs.ExampleTest`
    /// * `method`: test method name without parameters
    fn resolve(&self, suite: &str, method: &str) -> Option<PointMetadata>;
}

/// One row of a JSON points manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    /// fully qualified test suite name
    suite:    String,
    /// test method name
    method:   String,
    /// the rest of the metadata
    #[serde(flatten)]
    metadata: PointMetadata,
}

/// An in-memory table of graded tests keyed by suite and method.
#[derive(Clone, Debug, Default)]
pub struct PointManifest {
    /// suite -> method -> metadata
    entries: HashMap<String, HashMap<String, PointMetadata>>,
}

impl PointManifest {
    /// Creates an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a graded test, replacing any earlier registration.
    pub fn insert(
        &mut self,
        suite: impl Into<String>,
        method: impl Into<String>,
        metadata: PointMetadata,
    ) {
        self.entries
            .entry(suite.into())
            .or_default()
            .insert(method.into(), metadata);
    }

    /// Builder-style [`PointManifest::insert`].
    pub fn with(
        mut self,
        suite: impl Into<String>,
        method: impl Into<String>,
        metadata: PointMetadata,
    ) -> Self {
        self.insert(suite, method, metadata);
        self
    }

    /// Number of graded tests.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Whether no graded tests are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merges another manifest into this one; `other` wins on conflicts.
    pub fn extend(&mut self, other: PointManifest) {
        for (suite, methods) in other.entries {
            self.entries.entry(suite).or_default().extend(methods);
        }
    }

    /// Parses a JSON manifest: an array of
    /// `{suite, method, points, friendlyName?, tags?}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<ManifestEntry> =
            serde_json::from_str(json).context("Could not parse points manifest")?;

        let mut manifest = Self::new();
        for row in rows {
            manifest.insert(row.suite, row.method, row.metadata);
        }
        Ok(manifest)
    }

    /// Reads a JSON manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read points manifest {}", path.display()))?;
        Self::from_json(&json)
    }
}

impl MetadataResolver for PointManifest {
    fn resolve(&self, suite: &str, method: &str) -> Option<PointMetadata> {
        self.entries.get(suite)?.get(method).cloned()
    }
}
