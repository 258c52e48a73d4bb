use gradeguard::{
    config::PrettyPolicy,
    grade::{
        CompileFailure, ModuleResult, ScoreTotal, ScoringEntry, StyleResult, TagValue, Tags,
        TestCaseResult,
    },
    report::{CommitBanner, Delivery, GitBlock, IncludedFile, Report, pretty, render},
    vcs::VcsUser,
};
use pretty_assertions::assert_eq;

fn rule() -> String {
    "-".repeat(80)
}

fn test_entry(description: &str, test: &str, earned: u32, possible: u32) -> ScoringEntry {
    ScoringEntry::Test(
        TestCaseResult::builder()
            .module("app")
            .class_name("cs.MathTest")
            .test_case(test)
            .passed(earned == possible)
            .points_possible(possible)
            .points_earned(earned)
            .description(description)
            .explanation(format!(
                "{test} {}",
                if earned == possible { "passed" } else { "failed" }
            ))
            .build(),
    )
}

fn report(total: ScoreTotal) -> Report {
    Report::builder()
        .modules(vec![
            ModuleResult {
                name:     "app".to_string(),
                compiled: true,
            },
            ModuleResult {
                name:     "lib".to_string(),
                compiled: false,
            },
        ])
        .scores(vec![
            test_entry("Adds two numbers together correctly", "add()", 5u32, 5u32),
            test_entry("sub", "sub()", 0u32, 3u32),
            ScoringEntry::CompileError(CompileFailure::new("lib")),
            ScoringEntry::Style(StyleResult {
                ran:             true,
                passed:          true,
                points_earned:   2,
                points_possible: 2,
                description:     "checkstyle".to_string(),
                explanation:     "No checkstyle errors were reported".to_string(),
            }),
        ])
        .total(total)
        .assignment("MP1")
        .build()
}

#[test]
fn pretty_report_layout() {
    let policy = PrettyPolicy {
        enabled:    true,
        title:      Some("MP1 Results".to_string()),
        notes:      Some("Line one\n  kept as written".to_string()),
        show_total: true,
    };

    let rendered = render(&report(ScoreTotal::new(7, 10)), &policy, None);
    let expected = [
        rule(),
        "MP1 Results".to_string(),
        rule(),
        "Adds two numbers together corr 5    add() passed".to_string(),
        "sub                            0    sub() failed".to_string(),
        "Compiler                       0    lib didn't compile".to_string(),
        "checkstyle                     2    No checkstyle errors were reported".to_string(),
        rule(),
        "Total                          7    ".to_string(),
        rule(),
        "Line one".to_string(),
        "  kept as written".to_string(),
        rule(),
    ]
    .map(|line| format!("{line}\n"))
    .concat();

    assert_eq!(rendered, expected);
}

#[test]
fn pretty_report_shows_cap_and_commit_banner() {
    let policy = PrettyPolicy {
        enabled:    true,
        title:      None,
        notes:      Some(
            "Grades are final once the deadline passes and late submissions are not \
             accepted without an approved extension."
                .to_string(),
        ),
        show_total: true,
    };
    let total = ScoreTotal::new(65, 70).capped(Some(50));
    let banner = CommitBanner {
        previous_best: 30,
        points_earned: 50,
    };

    let rendered = render(&report(total), &policy, Some(banner));
    let lines = rendered.lines().collect::<Vec<_>>();

    assert_eq!(lines[0], rule());
    assert_eq!(lines[1], "Adds two numbers together corr 5    add() passed");
    assert_eq!(
        lines[6],
        "Total                          50   (the maximum, capped from 65)"
    );
    assert_eq!(
        lines[8],
        "Grades are final once the deadline passes and late submissions are not accepted"
    );
    assert_eq!(lines[9], "without an approved extension.");
    assert_eq!(
        lines[11],
        "CONGRATULATIONS: Your changes increased your score from 30 to 50!"
    );
    assert_eq!(
        lines[12],
        "Commit your work right away! The autograder will not run again until you do."
    );
    assert_eq!(lines[13], rule());
    assert_eq!(lines.len(), 14);
}

#[test]
fn pretty_report_without_total() {
    let policy = PrettyPolicy {
        enabled:    true,
        title:      None,
        notes:      None,
        show_total: false,
    };

    let rendered = render(&report(ScoreTotal::new(7, 10)), &policy, None);
    assert_eq!(rendered.lines().count(), 6);
    assert!(!rendered.contains("Total"));
}

#[test]
fn json_report_shape() {
    let mut tags = Tags::new();
    tags.insert("semester".to_string(), TagValue::from("Fall"));
    tags.insert("week".to_string(), TagValue::from(3i64));

    let mut report = report(ScoreTotal::new(65, 70).capped(Some(50)));
    report.tags = tags;
    report.checkpoint = Some("2".to_string());
    report.contributors = Some(vec!["student@example.com".to_string()]);
    report.git = Some(GitBlock {
        remotes: [("origin".to_string(), "https://example.com/mp1.git".to_string())]
            .into_iter()
            .collect(),
        user:    VcsUser {
            name:  Some("Student".to_string()),
            email: None,
        },
        head:    Some("abc123".to_string()),
    });

    let json = serde_json::to_value(&report).expect("serialize report");
    assert_eq!(json["semester"], "Fall");
    assert_eq!(json["week"], 3);
    assert_eq!(json["assignment"], "MP1");
    assert_eq!(json["checkpoint"], "2");
    assert_eq!(json["pointsEarned"], 50);
    assert_eq!(json["pointsPossible"], 50);
    assert_eq!(json["rawPointsEarned"], 65);
    assert_eq!(json["contributors"][0], "student@example.com");
    assert_eq!(json["git"]["head"], "abc123");
    assert_eq!(json["git"]["remotes"]["origin"], "https://example.com/mp1.git");
    assert_eq!(json["git"]["user"]["name"], "Student");
    assert_eq!(json["modules"][1]["compiled"], false);
    assert!(json.get("files").is_none());
    assert!(json.get("output").is_none());

    assert_eq!(json["scores"][0]["type"], "test");
    assert_eq!(json["scores"][0]["className"], "cs.MathTest");
    assert_eq!(json["scores"][0]["testCase"], "add()");
    assert_eq!(json["scores"][0]["pointsEarned"], 5);
    assert_eq!(json["scores"][2]["type"], "compileError");
    assert_eq!(json["scores"][2]["explanation"], "lib didn't compile");
    assert_eq!(json["scores"][3]["type"], "checkstyle");
    assert_eq!(json["scores"][3]["ran"], true);

    let with_files = report.with_files(vec![IncludedFile {
        name: "README.md".to_string(),
        path: "/tmp/README.md".to_string(),
        data: None,
    }]);
    let json = serde_json::to_value(&with_files).expect("serialize report");
    assert_eq!(json["files"][0]["name"], "README.md");
    assert!(json["files"][0].get("data").is_none());
}

#[test]
fn uncapped_report_omits_raw_points() {
    let json = serde_json::to_value(report(ScoreTotal::new(7, 10))).expect("serialize report");
    assert!(json.get("rawPointsEarned").is_none());
    assert!(json.get("checkpoint").is_none());
    assert!(json.get("git").is_none());
}

/// A stdout whose reader went away.
struct ClosedPipe;

impl std::io::Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn closed_stdout_fails_the_pretty_sink_only() {
    let policy = PrettyPolicy {
        enabled:    true,
        title:      None,
        notes:      None,
        show_total: true,
    };
    let rendered = render(&report(ScoreTotal::new(7, 10)), &policy, None);

    assert!(matches!(
        pretty::write_to(&mut ClosedPipe, &rendered),
        Delivery::Failed(_)
    ));

    let mut buffer = Vec::new();
    assert_eq!(pretty::write_to(&mut buffer, &rendered), Delivery::Delivered);
    assert_eq!(String::from_utf8(buffer).expect("utf8"), rendered);
}

#[test]
fn tags_never_shadow_fixed_fields() {
    let mut case_tags = Tags::new();
    case_tags.insert("passed".to_string(), TagValue::from("nope"));
    case_tags.insert("type".to_string(), TagValue::from("bonus"));
    case_tags.insert("week".to_string(), TagValue::from(3i64));
    let row = ScoringEntry::Test(
        TestCaseResult::builder()
            .module("app")
            .class_name("cs.MathTest")
            .test_case("add()")
            .passed(true)
            .points_possible(5u32)
            .points_earned(5u32)
            .description("add")
            .explanation("add() passed")
            .tags(case_tags)
            .build(),
    );

    let mut report = report(ScoreTotal::new(7, 10));
    report.scores = vec![row];
    report.tags.insert("assignment".to_string(), TagValue::from("MP9"));
    report.tags.insert("semester".to_string(), TagValue::from("Fall"));

    let body = serde_json::to_string(&report).expect("serialize report");
    assert_eq!(body.matches("\"passed\"").count(), 1);
    assert_eq!(body.matches("\"type\"").count(), 1);
    assert_eq!(body.matches("\"assignment\"").count(), 1);

    let json: serde_json::Value = serde_json::from_str(&body).expect("report json");
    assert_eq!(json["assignment"], "MP1");
    assert_eq!(json["semester"], "Fall");
    assert_eq!(json["scores"][0]["passed"], true);
    assert_eq!(json["scores"][0]["type"], "test");
    assert_eq!(json["scores"][0]["week"], 3);
}
