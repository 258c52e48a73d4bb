#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The grading policy: one immutable value, built once per run and handed to
//! every stage.
//!
//! Precedence (lowest to highest):
//! 1. Defaults below
//! 2. The policy file (`grade.yaml` unless another path is given)
//! 3. `GRADER_*` environment variables, `__` separating nested keys, eg.
//!    `GRADER_REPORTING__POST__ENDPOINT`

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_POST_TIMEOUT_SECS, DEFAULT_SCORE_FILE, DEFAULT_TEST_PATTERNS, DEFAULT_TEST_ROOT,
        POLICY_ENV_PREFIX,
    },
    grade::{TagValue, Tags},
};

/// Problems with the grading policy. All of them stop the run before grading.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The policy file passed explicitly does not exist.
    #[error("Grading policy file not found: {}", .0.display())]
    MissingPolicyFile(PathBuf),
    /// The policy could not be parsed or merged.
    #[error("Could not load the grading policy: {0}")]
    Load(String),
    /// No assignment name.
    #[error("No assignment configured; set `assignment` in the grading policy")]
    MissingAssignment,
    /// No module to collect test reports from.
    #[error("No modules configured; list at least one under `modules`")]
    NoModules,
    /// Neither a points manifest nor annotated sources.
    #[error("No point metadata configured; set `metadata.manifest` or `metadata.sources`")]
    NoMetadata,
    /// Style checking is on but has no configuration file.
    #[error("checkstyle.config_file not specified")]
    MissingStyleConfig,
    /// Identification is on but no contributors file is named.
    #[error("identification.file not specified")]
    MissingIdentificationFile,
    /// The contributor count limits can't be satisfied.
    #[error("Invalid contributor limits: min_count ({0}) is greater than max_count ({1})")]
    InvalidContributorLimits(usize, usize),
    /// The checkpoint file could not be read.
    #[error("Could not read the current checkpoint from {path}: {reason}", path = .0.display(), reason = .1)]
    Checkpoint(PathBuf, String),
}

/// A module (sub-project) whose test reports are graded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePolicy {
    /// module name shown in the report
    pub name:    String,
    /// directory holding the module's JUnit XML reports
    pub reports: PathBuf,
}

/// Where point values for tests come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataPolicy {
    /// JSON points manifest
    pub manifest: Option<PathBuf>,
    /// directory of annotated Java test sources
    pub sources:  Option<PathBuf>,
    /// globs, relative to `sources`, of files to scan
    pub include:  Vec<String>,
}

impl Default for MetadataPolicy {
    fn default() -> Self {
        Self {
            manifest: None,
            sources:  Some(PathBuf::from(DEFAULT_TEST_ROOT)),
            include:  vec!["**/*.java".to_string()],
        }
    }
}

/// Test suite tamper detection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintPolicy {
    /// verify fingerprints before grading
    pub enabled: bool,
    /// directory holding the test suites
    pub root:    PathBuf,
    /// globs, relative to `root`, of fingerprinted files
    pub include: Vec<String>,
}

impl Default for FingerprintPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            root:    PathBuf::from(DEFAULT_TEST_ROOT),
            include: DEFAULT_TEST_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Style checking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePolicy {
    /// grade the style report
    pub enabled:     bool,
    /// points for a clean report
    pub points:      u32,
    /// the checker's XML report
    pub report:      PathBuf,
    /// the checker's rules; required when enabled
    pub config_file: Option<PathBuf>,
}

impl Default for StylePolicy {
    fn default() -> Self {
        Self {
            enabled:     false,
            points:      0,
            report:      PathBuf::from("build/reports/checkstyle/checkstyle.xml"),
            config_file: None,
        }
    }
}

/// Contributor (partner) identification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentificationPolicy {
    /// require a contributors file
    pub enabled:   bool,
    /// file with one contributor per line
    pub file:      Option<PathBuf>,
    /// fewest contributors allowed
    pub min_count: usize,
    /// most contributors allowed
    pub max_count: usize,
    /// message shown instead of the default when the count is wrong
    pub message:   Option<String>,
}

impl Default for IdentificationPolicy {
    fn default() -> Self {
        Self {
            enabled:   false,
            file:      None,
            min_count: 1,
            max_count: 1,
            message:   None,
        }
    }
}

/// Version control integration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsPolicy {
    /// include git information in the report
    pub git:            bool,
    /// make students commit after raising their score
    pub require_commit: bool,
    /// where the score history is kept
    pub score_file:     PathBuf,
}

impl Default for VcsPolicy {
    fn default() -> Self {
        Self {
            git:            false,
            require_commit: false,
            score_file:     PathBuf::from(DEFAULT_SCORE_FILE),
        }
    }
}

/// Settings of the human-readable report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrettyPolicy {
    /// print the table
    pub enabled:    bool,
    /// heading above the rows
    pub title:      Option<String>,
    /// free text below the total
    pub notes:      Option<String>,
    /// print the total row
    pub show_total: bool,
}

impl Default for PrettyPolicy {
    fn default() -> Self {
        Self {
            enabled:    true,
            title:      None,
            notes:      None,
            show_total: true,
        }
    }
}

/// Settings of the networked report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPolicy {
    /// URL to POST the report to
    pub endpoint:      Option<String>,
    /// files whose contents travel with the report
    pub include_files: Vec<PathBuf>,
    /// request timeout in seconds
    pub timeout_secs:  u64,
}

impl Default for PostPolicy {
    fn default() -> Self {
        Self {
            endpoint:      None,
            include_files: vec![],
            timeout_secs:  DEFAULT_POST_TIMEOUT_SECS,
        }
    }
}

/// Which reports to produce.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingPolicy {
    /// write the JSON report here
    pub json_file:    Option<PathBuf>,
    /// echo the JSON report to stdout
    pub print_json:   bool,
    /// custom top-level report fields
    pub tags:         Tags,
    /// the human-readable report
    pub print_pretty: PrettyPolicy,
    /// the networked report
    pub post:         PostPolicy,
}

/// Checkpointing: grading one milestone of an assignment at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointPolicy {
    /// YAML file with a `checkpoint` key naming the current checkpoint
    pub file: Option<PathBuf>,
}

/// Contents of the checkpoint file.
#[derive(Deserialize)]
struct CheckpointFile {
    /// current checkpoint id; usually a number
    checkpoint: TagValue,
}

/// Everything that decides how a submission is graded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradePolicy {
    /// assignment id, copied into the report
    pub assignment:     Option<String>,
    /// keep the host process alive when grading ends or fails
    pub keep_alive:     bool,
    /// ceiling on the total score
    pub max_points:     Option<u32>,
    /// include captured tool output in the report
    pub capture_output: bool,
    /// modules to grade
    pub modules:        Vec<ModulePolicy>,
    /// point metadata sources
    pub metadata:       MetadataPolicy,
    /// tamper detection
    pub fingerprint:    FingerprintPolicy,
    /// style checking
    pub checkstyle:     StylePolicy,
    /// contributor identification
    pub identification: IdentificationPolicy,
    /// version control integration
    pub vcs:            VcsPolicy,
    /// checkpointing
    pub checkpointing:  CheckpointPolicy,
    /// report sinks
    pub reporting:      ReportingPolicy,
}

impl Default for GradePolicy {
    fn default() -> Self {
        Self {
            assignment:     None,
            keep_alive:     true,
            max_points:     None,
            capture_output: false,
            modules:        vec![],
            metadata:       MetadataPolicy::default(),
            fingerprint:    FingerprintPolicy::default(),
            checkstyle:     StylePolicy::default(),
            identification: IdentificationPolicy::default(),
            vcs:            VcsPolicy::default(),
            checkpointing:  CheckpointPolicy::default(),
            reporting:      ReportingPolicy::default(),
        }
    }
}

impl GradePolicy {
    /// Merges defaults, the policy file at `path`, and `GRADER_*` environment
    /// variables, then validates the result.
    ///
    /// * `path`: policy file
    /// * `required`: fail if the file doesn't exist instead of using defaults
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::MissingPolicyFile(path.to_path_buf()));
        }

        let policy: GradePolicy = Figment::new()
            .merge(Serialized::defaults(GradePolicy::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(POLICY_ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        policy.validate()?;
        Ok(policy)
    }

    /// Parses a policy from YAML text, without the environment layer.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let policy: GradePolicy = Figment::new()
            .merge(Serialized::defaults(GradePolicy::default()))
            .merge(Yaml::string(yaml))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        policy.validate()?;
        Ok(policy)
    }

    /// Checks that every setting a run depends on is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assignment.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingAssignment);
        }
        if self.modules.is_empty() {
            return Err(ConfigError::NoModules);
        }
        if self.metadata.manifest.is_none() && self.metadata.sources.is_none() {
            return Err(ConfigError::NoMetadata);
        }
        if self.checkstyle.enabled && self.checkstyle.config_file.is_none() {
            return Err(ConfigError::MissingStyleConfig);
        }
        if self.identification.enabled {
            if self.identification.file.is_none() {
                return Err(ConfigError::MissingIdentificationFile);
            }
            if self.identification.min_count > self.identification.max_count {
                return Err(ConfigError::InvalidContributorLimits(
                    self.identification.min_count,
                    self.identification.max_count,
                ));
            }
        }
        Ok(())
    }

    /// Reads the current checkpoint, if checkpointing is configured.
    ///
    /// * `base`: directory relative paths are resolved against
    pub fn current_checkpoint(&self, base: &Path) -> Result<Option<String>, ConfigError> {
        let Some(file) = &self.checkpointing.file else {
            return Ok(None);
        };
        let file = base.join(file);

        let parsed: CheckpointFile = Figment::from(Yaml::file(&file))
            .extract()
            .map_err(|e| ConfigError::Checkpoint(file.clone(), e.to_string()))?;
        Ok(Some(parsed.checkpoint.to_string()))
    }

    /// Timeout for the POST report.
    pub fn post_timeout(&self) -> Duration {
        Duration::from_secs(self.reporting.post.timeout_secs)
    }
}
