use std::{fs, path::PathBuf};

use gradeguard::{
    GradeError, IntegrityError,
    fingerprint::{fingerprint, generate, generate_tree, stored_fingerprint, verify, verify_tree},
};
use uuid::Uuid;

const BODY: &str = "package cs;\n\nclass MathTest {\n    void add() {}\n}\n";

fn temp_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("gradeguard-fp-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    root
}

fn patterns() -> Vec<String> {
    vec!["**/*Test.java".to_string(), "**/*Test.kt".to_string()]
}

#[test]
fn fingerprint_is_lowercase_md5() {
    assert_eq!(fingerprint(""), "d41d8cd98f00b204e9800998ecf8427e");
    assert_eq!(fingerprint("hello"), "5d41402abc4b2a76b9719d911017c592");
}

#[test]
fn sentinel_lines_are_ignored_wherever_they_are() {
    let hash = fingerprint(BODY);

    let top = format!("// md5: {hash}\n{BODY}");
    let bottom = format!("{BODY}// md5: {hash}\n");
    let middle = BODY.replacen("class", &format!("// md5: {hash}\nclass"), 1);

    for content in [&top, &bottom, &middle] {
        assert_eq!(fingerprint(content), hash);
        verify("MathTest.java".as_ref(), content).expect("untouched file verifies");
    }
}

#[test]
fn line_endings_do_not_change_the_fingerprint() {
    let unix = fingerprint(BODY);
    let windows = BODY.replace('\n', "\r\n");
    let classic_mac = BODY.replace('\n', "\r");

    assert_eq!(fingerprint(&windows), unix);
    assert_eq!(fingerprint(&classic_mac), unix);

    let sealed = format!("// md5: {unix}\r{classic_mac}");
    assert_eq!(stored_fingerprint(&sealed).as_deref(), Some(unix.as_str()));
    verify("MathTest.java".as_ref(), &sealed).expect("classic mac file verifies");
}

#[test]
fn stored_fingerprint_is_first_token_of_first_sentinel() {
    let content = "// md5: abc def\n// md5: second\nclass A {}";
    assert_eq!(stored_fingerprint(content).as_deref(), Some("abc"));
    assert_eq!(stored_fingerprint("class A {}"), None);
}

#[test]
fn missing_and_mismatched_fingerprints_are_distinct() {
    let missing = verify("MathTest.java".as_ref(), BODY).unwrap_err();
    assert!(matches!(missing, IntegrityError::MissingFingerprint { .. }));
    assert!(missing.to_string().contains("Can't find fingerprint"));

    let tampered = format!(
        "// md5: {}\n{}",
        fingerprint(BODY),
        BODY.replace("add", "subtract")
    );
    let mismatch = verify("MathTest.java".as_ref(), &tampered).unwrap_err();
    match &mismatch {
        IntegrityError::FingerprintMismatch {
            path,
            stored,
            computed,
        } => {
            assert_eq!(path, &PathBuf::from("MathTest.java"));
            assert_eq!(stored, &fingerprint(BODY));
            assert_ne!(stored, computed);
        }
        other => panic!("expected a mismatch, got {other:?}"),
    }
    assert!(mismatch.to_string().contains("restore from Git"));
}

#[test]
fn generate_renders_paste_line() {
    let line = generate("src/test/MathTest.java".as_ref(), BODY);
    assert_eq!(
        line,
        format!("src/test/MathTest.java -> // md5: {}", fingerprint(BODY))
    );
}

#[test]
fn tree_verification_stops_on_tampered_suite() {
    let root = temp_root();
    let tests = root.join("src/test/java/cs");
    fs::create_dir_all(&tests).expect("create test dir");

    let kotlin = "class StringTest\n";
    fs::write(
        tests.join("MathTest.java"),
        format!("// md5: {}\n{BODY}", fingerprint(BODY)),
    )
    .expect("write java suite");
    fs::write(
        tests.join("StringTest.kt"),
        format!("{kotlin}// md5: {}\n", fingerprint(kotlin)),
    )
    .expect("write kotlin suite");
    fs::write(tests.join("Helper.java"), "class Helper {}").expect("write helper");

    let checked = verify_tree(&root, &root.join("src/test"), &patterns()).expect("verify tree");
    assert_eq!(checked, 2);

    let lines = generate_tree(&root, &root.join("src/test"), &patterns()).expect("generate");
    assert_eq!(
        lines,
        vec![
            format!("src/test/java/cs/MathTest.java -> // md5: {}", fingerprint(BODY)),
            format!("src/test/java/cs/StringTest.kt -> // md5: {}", fingerprint(kotlin)),
        ]
    );

    fs::write(
        tests.join("MathTest.java"),
        format!("// md5: {}\n{BODY}// sneaky\n", fingerprint(BODY)),
    )
    .expect("tamper");
    let err = verify_tree(&root, &root.join("src/test"), &patterns()).unwrap_err();
    match err {
        GradeError::Integrity(IntegrityError::FingerprintMismatch { path, .. }) => {
            assert_eq!(path, PathBuf::from("src/test/java/cs/MathTest.java"));
        }
        other => panic!("expected an integrity error, got {other:?}"),
    }

    let _ = fs::remove_dir_all(root);
}
