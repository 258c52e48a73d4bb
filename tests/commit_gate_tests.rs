use std::{fs, path::PathBuf};

use gradeguard::{
    GradeError,
    vcs::{CheckpointScoreRecord, CommitGate, ScoreHistory, VcsFacts, post_update, pre_check},
};
use uuid::Uuid;

fn score_file() -> (PathBuf, PathBuf) {
    let root = std::env::temp_dir().join(format!("gradeguard-gate-{}", Uuid::new_v4()));
    fs::create_dir_all(&root).expect("create temp root");
    let file = root.join("config").join(".score.json");
    (root, file)
}

fn facts(head: &str, clean: bool) -> VcsFacts {
    VcsFacts {
        head: Some(head.to_string()),
        clean,
        ..Default::default()
    }
}

#[test]
fn four_run_scenario() {
    let (root, file) = score_file();
    let checkpoint = Some("1".to_string());

    // 1. dirty tree raises the score from nothing
    let gate = CommitGate::open(&file, checkpoint.clone(), &facts("c1", false)).expect("head");
    gate.check().expect("first run is allowed");
    let first = gate.record_score(10).expect("record");
    assert!(first.needs_commit);
    assert_eq!(first.previous_best, 0);
    assert_eq!(
        first.record,
        CheckpointScoreRecord {
            checkpoint:       checkpoint.clone(),
            last_seen_commit: Some("c1".to_string()),
            max_score:        10,
            increased:        true,
        }
    );

    // 2. same commit, still dirty: refused
    let gate = CommitGate::open(&file, checkpoint.clone(), &facts("c1", false)).expect("head");
    let refused = gate.check().unwrap_err();
    assert!(matches!(
        refused,
        GradeError::CommitRequired { ref commit, .. } if commit == "c1"
    ));
    assert!(refused.to_string().contains("commit the changes"));

    // 3. committed: allowed, nothing new to commit
    let gate = CommitGate::open(&file, checkpoint.clone(), &facts("c2", true)).expect("head");
    gate.check().expect("new commit satisfies the gate");
    let third = gate.record_score(10).expect("record");
    assert!(!third.needs_commit);
    assert_eq!(third.record.max_score, 10);
    assert!(!third.record.increased);

    // 4. dirty again but lower: allowed, best score kept
    let gate = CommitGate::open(&file, checkpoint.clone(), &facts("c2", false)).expect("head");
    gate.check().expect("no increase recorded");
    let fourth = gate.record_score(7).expect("record");
    assert!(!fourth.needs_commit);
    assert_eq!(fourth.previous_best, 10);
    assert_eq!(fourth.record.max_score, 10);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn cleaning_the_tree_reopens_the_same_commit() {
    let (root, file) = score_file();
    let record = |commit: &str, max_score: u32, increased: bool| CheckpointScoreRecord {
        checkpoint: None,
        last_seen_commit: Some(commit.to_string()),
        max_score,
        increased,
    };

    let gate = CommitGate::open(&file, None, &facts("A", false)).expect("head");
    gate.check().expect("empty history allows");
    let first = gate.record_score(10).expect("record");
    assert!(first.needs_commit);
    assert_eq!(first.record, record("A", 10, true));

    let gate = CommitGate::open(&file, None, &facts("A", false)).expect("head");
    assert!(matches!(gate.check(), Err(GradeError::CommitRequired { .. })));

    let gate = CommitGate::open(&file, None, &facts("A", true)).expect("head");
    gate.check().expect("clean tree allows");
    let third = gate.record_score(10).expect("record");
    assert!(!third.needs_commit);
    assert_eq!(third.record, record("A", 10, false));

    let gate = CommitGate::open(&file, None, &facts("B", false)).expect("head");
    gate.check().expect("new commit allows");
    let fourth = gate.record_score(15).expect("record");
    assert!(fourth.needs_commit);
    assert_eq!(fourth.previous_best, 10);
    assert_eq!(fourth.record, record("B", 15, true));

    let stored = ScoreHistory::load(&file);
    assert_eq!(stored.records(), &[record("B", 15, true)][..]);

    let _ = fs::remove_dir_all(root);
}

#[test]
fn clean_tree_is_never_refused() {
    let record = CheckpointScoreRecord {
        checkpoint:       None,
        last_seen_commit: Some("c1".to_string()),
        max_score:        10,
        increased:        true,
    };
    pre_check(&record, "c1", true).expect("clean tree passes");
    assert!(pre_check(&record, "c1", false).is_err());
    pre_check(&record, "c2", false).expect("other commit passes");
}

#[test]
fn max_score_never_decreases() {
    let mut record = CheckpointScoreRecord::empty(None);
    let mut best = 0;
    for (i, earned) in [3u32, 9, 4, 9, 12, 0].into_iter().enumerate() {
        let update = post_update(&record, &format!("c{i}"), i % 2 == 0, earned);
        assert!(update.record.max_score >= record.max_score);
        best = best.max(earned);
        assert_eq!(update.record.max_score, best);
        record = update.record;
    }
}

#[test]
fn other_checkpoints_are_untouched() {
    let (root, file) = score_file();

    let history = ScoreHistory::new(vec![
        CheckpointScoreRecord {
            checkpoint:       Some("0".to_string()),
            last_seen_commit: Some("old".to_string()),
            max_score:        20,
            increased:        false,
        },
        CheckpointScoreRecord::empty(None),
    ]);
    history.persist(&file).expect("seed history");

    let gate = CommitGate::open(&file, Some("1".to_string()), &facts("c1", true)).expect("head");
    gate.record_score(5).expect("record");

    let stored = ScoreHistory::load(&file);
    assert_eq!(stored.records().len(), 3);
    assert_eq!(stored.records()[0].max_score, 20);
    assert_eq!(stored.records()[0].last_seen_commit.as_deref(), Some("old"));
    assert_eq!(stored.get(None), Some(&CheckpointScoreRecord::empty(None)));
    assert_eq!(stored.get(Some("1")).map(|r| r.max_score), Some(5));

    let _ = fs::remove_dir_all(root);
}

#[test]
fn corrupt_history_is_replaced() {
    let (root, file) = score_file();
    fs::create_dir_all(file.parent().expect("parent")).expect("create config dir");
    fs::write(&file, "{ not json").expect("write corrupt file");

    assert!(ScoreHistory::load(&file).records().is_empty());

    let gate = CommitGate::open(&file, None, &facts("c1", false)).expect("head");
    let update = gate.record_score(4).expect("record");
    assert!(update.needs_commit);

    let json = fs::read_to_string(&file).expect("read history");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(
        parsed,
        serde_json::json!([{
            "checkpoint": null,
            "lastSeenCommit": "c1",
            "maxScore": 4,
            "increased": true
        }])
    );

    let _ = fs::remove_dir_all(root);
}

#[test]
fn legacy_history_and_duplicates_load() {
    let legacy = r#"{"checkpoints": [
        {"checkpoint": "1", "lastSeenCommit": "a", "maxScore": 3, "increased": false},
        {"checkpoint": "1", "lastSeenCommit": "b", "maxScore": 9, "increased": true}
    ]}"#;

    let history = ScoreHistory::from_json(legacy).expect("parse legacy");
    assert_eq!(history.records().len(), 1);
    assert_eq!(history.records()[0].last_seen_commit.as_deref(), Some("a"));
}

#[test]
fn unborn_repository_skips_the_gate() {
    let (root, file) = score_file();
    let unborn = VcsFacts {
        head: None,
        clean: false,
        ..Default::default()
    };
    assert!(CommitGate::open(&file, None, &unborn).is_none());
    let _ = fs::remove_dir_all(root);
}
