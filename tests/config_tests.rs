use std::{fs, path::PathBuf};

use gradeguard::{
    GradePolicy,
    config::ConfigError,
    grade::TagValue,
    identification::read_contributors,
    GradeError,
};
use uuid::Uuid;

const MINIMAL: &str = "
assignment: MP1
modules:
  - name: app
    reports: build/test-results/test
";

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("gradeguard-config-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

#[test]
fn minimal_policy_uses_defaults() {
    let policy = GradePolicy::from_yaml(MINIMAL).expect("valid policy");

    assert_eq!(policy.assignment.as_deref(), Some("MP1"));
    assert!(policy.keep_alive);
    assert_eq!(policy.max_points, None);
    assert_eq!(policy.modules[0].name, "app");
    assert_eq!(policy.modules[0].reports, PathBuf::from("build/test-results/test"));
    assert!(!policy.checkstyle.enabled);
    assert!(!policy.fingerprint.enabled);
    assert_eq!(policy.fingerprint.root, PathBuf::from("src/test"));
    assert_eq!(policy.vcs.score_file, PathBuf::from("config/.score.json"));
    assert!(policy.reporting.print_pretty.enabled);
    assert!(policy.reporting.print_pretty.show_total);
    assert_eq!(policy.reporting.post.timeout_secs, 10);
    assert_eq!(policy.identification.min_count, 1);
    assert_eq!(policy.identification.max_count, 1);
}

#[test]
fn full_policy_is_read() {
    let yaml = "
assignment: MP2
keep_alive: false
max_points: 100
modules:
  - name: app
    reports: app/build/test-results/test
  - name: lib
    reports: lib/build/test-results/test
checkstyle:
  enabled: true
  points: 10
  config_file: config/checkstyle.xml
vcs:
  git: true
  require_commit: true
reporting:
  json_file: grade.json
  tags:
    semester: Fall
    week: 4
  print_pretty:
    title: MP2 Results
    show_total: false
  post:
    endpoint: https://grades.example.com/
    include_files: [README.md]
    timeout_secs: 3
";
    let policy = GradePolicy::from_yaml(yaml).expect("valid policy");

    assert!(!policy.keep_alive);
    assert_eq!(policy.max_points, Some(100));
    assert_eq!(policy.modules.len(), 2);
    assert_eq!(policy.checkstyle.points, 10);
    assert!(policy.vcs.require_commit);
    assert_eq!(
        policy.reporting.tags.get("semester"),
        Some(&TagValue::Text("Fall".to_string()))
    );
    assert_eq!(policy.reporting.tags.get("week"), Some(&TagValue::Int(4)));
    assert!(policy.reporting.print_pretty.enabled);
    assert!(!policy.reporting.print_pretty.show_total);
    assert_eq!(policy.post_timeout().as_secs(), 3);
    assert_eq!(
        policy.reporting.post.include_files,
        vec![PathBuf::from("README.md")]
    );
}

#[test]
fn required_settings_are_enforced() {
    assert!(matches!(
        GradePolicy::from_yaml("modules: [{name: app, reports: build}]"),
        Err(ConfigError::MissingAssignment)
    ));
    assert!(matches!(
        GradePolicy::from_yaml("assignment: MP1"),
        Err(ConfigError::NoModules)
    ));
    assert!(matches!(
        GradePolicy::from_yaml(&format!("{MINIMAL}checkstyle: {{enabled: true}}")),
        Err(ConfigError::MissingStyleConfig)
    ));
    assert!(matches!(
        GradePolicy::from_yaml(&format!("{MINIMAL}identification: {{enabled: true}}")),
        Err(ConfigError::MissingIdentificationFile)
    ));
    assert!(matches!(
        GradePolicy::from_yaml(&format!(
            "{MINIMAL}identification: {{enabled: true, file: email.txt, min_count: 3, max_count: 2}}"
        )),
        Err(ConfigError::InvalidContributorLimits(3, 2))
    ));
    assert!(matches!(
        GradePolicy::from_yaml("assignment: [not, a, string]"),
        Err(ConfigError::Load(_))
    ));
}

#[test]
fn policy_files_load_from_disk() {
    let root = temp_root();
    let path = root.join("grade.yaml");

    assert!(matches!(
        GradePolicy::load(&path, true),
        Err(ConfigError::MissingPolicyFile(_))
    ));

    fs::write(&path, MINIMAL).expect("write policy");
    let policy = GradePolicy::load(&path, true).expect("load policy");
    assert_eq!(policy.assignment.as_deref(), Some("MP1"));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn checkpoint_is_read_from_yaml() {
    let root = temp_root();
    let mut policy = GradePolicy::from_yaml(MINIMAL).expect("valid policy");
    assert_eq!(policy.current_checkpoint(&root).expect("no checkpointing"), None);

    policy.checkpointing.file = Some(PathBuf::from("config/checkpoint.yaml"));
    let missing = policy.current_checkpoint(&root).unwrap_err();
    assert!(matches!(missing, ConfigError::Checkpoint(..)));
    assert!(
        missing
            .to_string()
            .starts_with("Could not read the current checkpoint from ")
    );
    assert!(missing.to_string().contains("checkpoint.yaml"));

    fs::create_dir_all(root.join("config")).expect("create config dir");
    fs::write(root.join("config/checkpoint.yaml"), "checkpoint: 2\n").expect("write checkpoint");
    assert_eq!(
        policy.current_checkpoint(&root).expect("read checkpoint"),
        Some("2".to_string())
    );

    let _ = fs::remove_dir_all(root);
}

#[test]
fn contributors_are_counted() {
    let root = temp_root();
    let mut policy = GradePolicy::from_yaml(MINIMAL).expect("valid policy");
    assert_eq!(
        read_contributors(&policy.identification, &root).expect("disabled"),
        None
    );

    policy.identification.enabled = true;
    policy.identification.file = Some(PathBuf::from("email.txt"));
    policy.identification.max_count = 2;

    let missing = read_contributors(&policy.identification, &root).unwrap_err();
    assert!(matches!(missing, GradeError::Identification(ref m) if m.contains("Missing contributor")));

    fs::write(root.join("email.txt"), "\n  student@example.com  \n\n").expect("write partners");
    assert_eq!(
        read_contributors(&policy.identification, &root).expect("one contributor"),
        Some(vec!["student@example.com".to_string()])
    );

    fs::write(root.join("email.txt"), "a@example.com\nb@example.com\nc@example.com\n")
        .expect("write partners");
    let too_many = read_contributors(&policy.identification, &root).unwrap_err();
    assert!(too_many.to_string().contains("Invalid number of contributors (3)"));

    policy.identification.message = Some("List one or two partners.".to_string());
    let custom = read_contributors(&policy.identification, &root).unwrap_err();
    assert_eq!(custom.to_string(), "List one or two partners.");

    let _ = fs::remove_dir_all(root);
}
