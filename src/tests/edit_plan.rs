use super::{file_key, Edit, EditPlan, SectionOp};
use crate::error::Error;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file.flush().unwrap();
    file
}

fn edit(file: &NamedTempFile, op: SectionOp) -> Edit {
    Edit {
        file_name: file.path().to_string_lossy().to_string(),
        op,
    }
}

#[test]
fn test_plan_json_shape() {
    let json = r#"{"edits":[
        {"file_name":"pjsip.conf","op":"replace","name":"6001","body":"x=1"},
        {"file_name":"pjsip.conf","op":"delete","name":"6002"}
    ]}"#;

    let plan: EditPlan = serde_json::from_str(json).unwrap();

    assert_eq!(plan.edits.len(), 2);
    assert_eq!(
        plan.edits[0].op,
        SectionOp::Replace {
            name: "6001".to_string(),
            body: "x=1".to_string()
        }
    );
    assert_eq!(plan.edits[1].op.name(), "6002");
}

#[test]
fn test_apply_sequences_edits_per_file() {
    let file = config_file(";--- a ---\nx=1\n;/--- a ---\n");

    let plan = EditPlan {
        edits: vec![
            edit(
                &file,
                SectionOp::Create {
                    name: "b".to_string(),
                    body: "y=2".to_string(),
                },
            ),
            edit(
                &file,
                SectionOp::Replace {
                    name: "b".to_string(),
                    body: "y=3".to_string(),
                },
            ),
            edit(
                &file,
                SectionOp::Delete {
                    name: "a".to_string(),
                },
            ),
        ],
    };

    let written = plan.apply().unwrap();

    assert_eq!(written, vec![file.path().to_path_buf()]);
    let content = fs::read_to_string(file.path()).unwrap();
    assert_eq!(content, "\n;--- b ---\ny=3\n;/--- b ---\n");
}

#[test]
fn test_apply_is_all_or_nothing() {
    let first = config_file(";--- a ---\nx=1\n;/--- a ---\n");
    let second = config_file(";--- b ---\ny=1\n;/--- b ---\n");

    let plan = EditPlan {
        edits: vec![
            edit(
                &first,
                SectionOp::Replace {
                    name: "a".to_string(),
                    body: "x=2".to_string(),
                },
            ),
            edit(
                &second,
                SectionOp::Delete {
                    name: "missing".to_string(),
                },
            ),
        ],
    };

    assert!(matches!(plan.apply(), Err(Error::NotFound { .. })));
    assert_eq!(
        fs::read_to_string(first.path()).unwrap(),
        ";--- a ---\nx=1\n;/--- a ---\n"
    );
}

#[test]
fn test_apply_merges_spellings_of_one_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("x.conf");
    fs::write(&path, ";--- a ---\nx=1\n;/--- a ---\n").unwrap();
    let plain = path.to_string_lossy().to_string();
    let dotted = format!("{}/./x.conf", dir.path().display());

    let plan = EditPlan {
        edits: vec![
            Edit {
                file_name: plain.clone(),
                op: SectionOp::Create {
                    name: "b".to_string(),
                    body: "y=1".to_string(),
                },
            },
            Edit {
                file_name: dotted,
                op: SectionOp::Create {
                    name: "c".to_string(),
                    body: "z=1".to_string(),
                },
            },
        ],
    };

    let written = plan.apply().unwrap();

    assert_eq!(written, vec![path.clone()]);
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(";--- b ---"), "{content}");
    assert!(content.contains(";--- c ---"), "{content}");
}

#[test]
fn test_file_key_resolves_missing_paths_lexically() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("sub").join("..").join(".").join("new.conf");

    assert_eq!(
        file_key(&missing),
        file_key(&dir.path().join("new.conf"))
    );
}

#[test]
fn test_apply_rejects_sentinel_in_body() {
    let file = config_file(";--- a ---\nx=1\n;/--- a ---\n");
    let plan = EditPlan {
        edits: vec![edit(
            &file,
            SectionOp::Replace {
                name: "a".to_string(),
                body: ";/--- a ---".to_string(),
            },
        )],
    };

    assert!(matches!(plan.apply(), Err(Error::InvalidBody { line: 1, .. })));
    assert_eq!(
        fs::read_to_string(file.path()).unwrap(),
        ";--- a ---\nx=1\n;/--- a ---\n"
    );
}

#[test]
fn test_load_rejects_bad_json() {
    let file = config_file("{\"edits\": [");
    assert!(matches!(
        EditPlan::load(file.path()),
        Err(Error::Json { .. })
    ));
}

#[test]
fn test_load_reads_plan() {
    let file = config_file(r#"{"edits":[{"file_name":"x.conf","op":"create","name":"n","body":""}]}"#);
    let plan = EditPlan::load(file.path()).unwrap();
    assert_eq!(plan.edits[0].file_name, "x.conf");
}
