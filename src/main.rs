#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # gradeguard
//!
//! Grades a project from the reports its build left behind, and helps
//! course staff fingerprint test suites and collect reports.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use gradeguard::{
    ExitDecision, Failure, GradePolicy, Grader, Lifecycle,
    constants::{DEFAULT_POLICY_FILE, DEFAULT_SERVER_PORT, DEFAULT_TEST_PATTERNS, DEFAULT_TEST_ROOT},
    fingerprint,
    server::{self, ServerConfig},
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade the project in the current directory
    Grade {
        /// grading policy file
        config:     Option<PathBuf>,
        /// captured build output to include in the report
        output_log: Option<PathBuf>,
        /// log debug output
        verbose:    bool,
    },
    /// Print fingerprints of test suites
    Fingerprint(Option<PathBuf>),
    /// Verify fingerprints of test suites
    CheckFingerprints(Option<PathBuf>),
    /// Collect reports over HTTP
    Serve(ServerConfig),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the test suite directory
    fn root() -> impl Parser<Option<PathBuf>> {
        long("root")
            .help("Directory holding the test suites (default: src/test)")
            .argument::<PathBuf>("DIR")
            .optional()
    }

    let config = long("config")
        .help("Grading policy file (default: grade.yaml)")
        .argument::<PathBuf>("PATH")
        .optional();
    let output_log = long("output-log")
        .help("Captured build output to include in the report")
        .argument::<PathBuf>("PATH")
        .optional();
    let verbose = short('v').long("verbose").help("Log debug output").switch();
    let grade = construct!(Cmd::Grade {
        config,
        output_log,
        verbose
    })
    .to_options()
    .command("grade")
    .help("Grade your work");

    let fingerprint = construct!(Cmd::Fingerprint(root()))
        .to_options()
        .command("fingerprint")
        .help("Print the fingerprint of every test suite");

    let check = construct!(Cmd::CheckFingerprints(root()))
        .to_options()
        .command("check-fingerprints")
        .help("Check that no test suite was modified");

    let host = long("host")
        .help("Interface to bind")
        .argument::<String>("HOST")
        .fallback("0.0.0.0".to_string());
    let port = long("port")
        .help("Port to listen on")
        .argument::<u16>("PORT")
        .fallback(DEFAULT_SERVER_PORT);
    let log = long("log")
        .help("JSON-lines file reports are appended to")
        .argument::<PathBuf>("PATH")
        .fallback(PathBuf::from("reports.jsonl"));
    let check_x_forwarded = long("x-forwarded")
        .help("Trust X-Forwarded-For for client addresses")
        .switch();
    let semester = long("semester")
        .help("Semester stamped onto stored reports")
        .argument::<String>("NAME")
        .optional();
    let serve = construct!(ServerConfig {
        host,
        port,
        log,
        check_x_forwarded,
        semester
    })
    .map(Cmd::Serve)
    .to_options()
    .command("serve")
    .help("Collect grading reports");

    let cmd = construct!([grade, fingerprint, check, serve]);

    cmd.to_options()
        .descr("Grades coursework from test and style reports")
        .run()
}

/// Default test suite globs.
fn default_patterns() -> Vec<String> {
    DEFAULT_TEST_PATTERNS.iter().map(|s| s.to_string()).collect()
}

/// Grades the current directory and acts on the lifecycle decision.
async fn grade(config: Option<PathBuf>, output_log: Option<PathBuf>) -> Result<()> {
    let path = config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_POLICY_FILE));

    let (policy, lifecycle) = match GradePolicy::load(&path, config.is_some()) {
        Ok(policy) => {
            let lifecycle = Lifecycle::new(policy.keep_alive);
            (policy, lifecycle)
        }
        Err(e) => return conclude(Lifecycle::new(true).fail(e.into(), false)),
    };

    let mut grader = Grader::new(&policy, ".");
    if let Some(log) = output_log {
        let output = std::fs::read_to_string(&log)
            .with_context(|| format!("Could not read {}", log.display()))?;
        grader = grader.with_output(output);
    }

    match grader.run().await {
        Ok(outcome) => {
            if let ExitDecision::Terminate(code) = lifecycle.finish(outcome.teardown) {
                terminate(code);
            }
            Ok(())
        }
        Err(e) => conclude(lifecycle.fail(e, false)),
    }
}

/// Reports a failed run.
fn conclude(failure: Failure) -> Result<()> {
    match failure {
        Failure::Recoverable(e) => Err(e.into()),
        Failure::Terminate { error, code } => {
            let _ = writeln!(std::io::stderr(), "{}", format!("FAILURE: {error}").red());
            terminate(code)
        }
    }
}

/// Flushes output and exits.
fn terminate(code: i32) -> ! {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    std::process::exit(code)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cmd = options();

    let level = match cmd {
        Cmd::Grade { verbose: true, .. } => Level::DEBUG,
        _ => Level::INFO,
    };
    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(level);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match cmd {
        Cmd::Grade {
            config, output_log, ..
        } => grade(config, output_log).await?,
        Cmd::Fingerprint(root) => {
            let root = root.unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_ROOT));
            let mut stdout = std::io::stdout().lock();
            for line in fingerprint::generate_tree(Path::new("."), &root, &default_patterns())? {
                writeln!(stdout, "{line}").context("Could not write fingerprints")?;
            }
        }
        Cmd::CheckFingerprints(root) => {
            let root = root.unwrap_or_else(|| PathBuf::from(DEFAULT_TEST_ROOT));
            let checked = fingerprint::verify_tree(Path::new("."), &root, &default_patterns())?;
            writeln!(
                std::io::stdout(),
                "{}",
                format!("{checked} test suite(s) unmodified").green()
            )
            .context("Could not write the fingerprint check")?;
        }
        Cmd::Serve(config) => server::serve(config).await?,
    };

    Ok(())
}
