use super::{
    create_section, delete_section, get_section, inspect, list_sections, replace_section_body,
    validate,
};
use crate::error::Error;
use pretty_assertions::assert_eq;

const LITERAL: &str = ";--- a ---\nx=1\n;/--- a ---\n;--- b ---\ny=2\n;/--- b ---";

const PJSIP: &str = "\
[transport-udp]
type=transport
protocol=udp
bind=0.0.0.0

;--- 6001 ---
[6001]
type=endpoint
context=from-internal
auth=6001
;/--- 6001 ---

; keep this comment
;--- 6002 ---
[6002]
type=endpoint
;/--- 6002 ---
";

fn assert_not_found<T: std::fmt::Debug>(result: Result<T, Error>, expected: &str) {
    match result {
        Err(Error::NotFound { name }) => assert_eq!(name, expected),
        other => panic!("expected NotFound for {expected:?}, got {other:?}"),
    }
}

#[test]
fn test_literal_example_lists_both_sections() {
    let sections = list_sections(LITERAL);

    let summary: Vec<(&str, String)> = sections
        .iter()
        .map(|s| (s.name.as_str(), s.body_text()))
        .collect();
    assert_eq!(
        summary,
        vec![("a", "x=1".to_string()), ("b", "y=2".to_string())]
    );
}

#[test]
fn test_literal_example_replace_touches_only_a() {
    let updated = replace_section_body(LITERAL, "a", "x=9").unwrap();
    assert_eq!(
        updated,
        ";--- a ---\nx=9\n;/--- a ---\n;--- b ---\ny=2\n;/--- b ---"
    );
}

#[test]
fn test_round_trip_reconstructs_document() {
    for doc in [LITERAL, PJSIP, "  ;--- a ---\r\nx=1\r\n ;/--- a --- \r\n"] {
        let original: Vec<&str> = doc.split('\n').collect();
        let sections = list_sections(doc);
        assert!(!sections.is_empty());

        for section in &sections {
            let mut rebuilt = original.clone();
            rebuilt.splice(section.line_range(), section.render());
            assert_eq!(rebuilt.join("\n"), doc);
        }
    }
}

#[test]
fn test_round_trip_counts_sections() {
    assert_eq!(list_sections(PJSIP).len(), 2);
    assert_eq!(list_sections("[global]\ntype=global\n").len(), 0);
}

#[test]
fn test_idempotent_replace() {
    for name in ["6001", "6002"] {
        let body = get_section(PJSIP, name).unwrap().body_text();
        assert_eq!(replace_section_body(PJSIP, name, &body).unwrap(), PJSIP);
    }
}

#[test]
fn test_idempotent_replace_with_crlf() {
    let doc = ";--- a ---\r\nx=1\r\ny=2\r\n;/--- a ---\r\n";
    let body = get_section(doc, "a").unwrap().body_text();
    assert_eq!(replace_section_body(doc, "a", &body).unwrap(), doc);
}

#[test]
fn test_replace_isolation() {
    let updated = replace_section_body(PJSIP, "6001", "[6001]\ntype=endpoint").unwrap();
    let section = get_section(PJSIP, "6001").unwrap();

    let before: Vec<&str> = PJSIP.split('\n').collect();
    let after: Vec<&str> = updated.split('\n').collect();
    let body_len = 2;

    assert_eq!(
        after[..=section.start_line].to_vec(),
        before[..=section.start_line].to_vec()
    );
    assert_eq!(
        after[section.start_line + 1 + body_len..].to_vec(),
        before[section.end_line..].to_vec()
    );
    assert_eq!(
        get_section(&updated, "6001").unwrap().body_text(),
        "[6001]\ntype=endpoint"
    );
}

#[test]
fn test_replace_with_empty_body() {
    let updated = replace_section_body(LITERAL, "b", "").unwrap();
    assert_eq!(
        updated,
        ";--- a ---\nx=1\n;/--- a ---\n;--- b ---\n;/--- b ---"
    );
    assert!(get_section(&updated, "b").unwrap().body.is_empty());
}

#[test]
fn test_delete_isolation() {
    let updated = delete_section(PJSIP, "6001").unwrap();
    assert_eq!(
        updated,
        "\
[transport-udp]
type=transport
protocol=udp
bind=0.0.0.0


; keep this comment
;--- 6002 ---
[6002]
type=endpoint
;/--- 6002 ---
"
    );
}

#[test]
fn test_delete_then_list() {
    let before = list_sections(PJSIP);
    let updated = delete_section(PJSIP, "6002").unwrap();
    let after = list_sections(&updated);

    assert_eq!(after.len(), before.len() - 1);
    assert!(after.iter().all(|s| s.name != "6002"));
    assert!(updated.ends_with("; keep this comment\n"));
}

#[test]
fn test_delete_last_section_without_trailing_newline() {
    let updated = delete_section(LITERAL, "b").unwrap();
    assert_eq!(updated, ";--- a ---\nx=1\n;/--- a ---\n");
}

#[test]
fn test_delete_only_section() {
    assert_eq!(delete_section(";--- a ---\nx=1\n;/--- a ---", "a").unwrap(), "");
}

#[test]
fn test_create_then_get() {
    let updated = create_section(PJSIP, "foo", "line1\nline2").unwrap();
    let section = get_section(&updated, "foo").unwrap();

    assert_eq!(section.body_text(), "line1\nline2");
    assert!(updated.starts_with(PJSIP));
}

#[test]
fn test_create_separates_with_blank_line() {
    let updated = create_section("[global]", "a", "x=1").unwrap();
    assert_eq!(updated, "[global]\n\n;--- a ---\nx=1\n;/--- a ---\n");

    let updated = create_section("[global]\n\n", "a", "x=1").unwrap();
    assert_eq!(updated, "[global]\n\n;--- a ---\nx=1\n;/--- a ---\n");
}

#[test]
fn test_create_in_empty_document() {
    let updated = create_section("", "a", "x=1").unwrap();
    assert_eq!(updated, ";--- a ---\nx=1\n;/--- a ---\n");
}

#[test]
fn test_create_duplicate_keeps_first_authoritative() {
    let updated = create_section(LITERAL, "a", "x=2").unwrap();
    let sections = list_sections(&updated);

    assert_eq!(sections.iter().filter(|s| s.name == "a").count(), 2);
    assert_eq!(get_section(&updated, "a").unwrap().body_text(), "x=1");

    let replaced = replace_section_body(&updated, "a", "x=3").unwrap();
    let bodies: Vec<String> = list_sections(&replaced)
        .into_iter()
        .filter(|s| s.name == "a")
        .map(|s| s.body_text())
        .collect();
    assert_eq!(bodies, vec!["x=3".to_string(), "x=2".to_string()]);
}

#[test]
fn test_create_rejects_invalid_names() {
    for name in ["", "a --- b", " padded", "two\nlines"] {
        assert!(
            matches!(
                create_section(LITERAL, name, "x"),
                Err(Error::InvalidName { .. })
            ),
            "name {name:?} should be rejected"
        );
    }
}

#[test]
fn test_create_rejects_sentinel_in_body() {
    let result = create_section(LITERAL, "c", "k=1\n;/--- c ---\nstray");

    match result {
        Err(err @ Error::InvalidBody { line: 2, .. }) => assert_eq!(err.status_code(), 400),
        other => panic!("expected InvalidBody at line 2, got {other:?}"),
    }
    assert!(matches!(
        create_section(LITERAL, "c", "  ;--- other ---\r"),
        Err(Error::InvalidBody { line: 1, .. })
    ));
}

#[test]
fn test_replace_rejects_sentinel_in_body() {
    assert!(matches!(
        replace_section_body(LITERAL, "a", "x=9\n;/--- a ---\n;--- zz ---"),
        Err(Error::InvalidBody { line: 2, .. })
    ));

    let updated = replace_section_body(LITERAL, "a", "; plain comment\n;---not a sentinel").unwrap();
    validate(&updated).unwrap();
    assert_eq!(
        get_section(&updated, "a").unwrap().body_text(),
        "; plain comment\n;---not a sentinel"
    );
}

#[test]
fn test_single_blank_line_body_reads_back_empty() {
    let doc = ";--- a ---\n\n;/--- a ---\n";
    let section = get_section(doc, "a").unwrap();

    assert_eq!(section.body, vec![String::new()]);
    assert_eq!(section.body_text(), "");
    assert_eq!(
        replace_section_body(doc, "a", &section.body_text()).unwrap(),
        ";--- a ---\n;/--- a ---\n"
    );
}

#[test]
fn test_not_found() {
    assert_not_found(get_section(PJSIP, "missing"), "missing");
    assert_not_found(replace_section_body(PJSIP, "missing", "x"), "missing");
    assert_not_found(delete_section(PJSIP, "missing"), "missing");
}

#[test]
fn test_regex_special_names_do_not_match_other_sections() {
    let doc = create_section(LITERAL, "a.*", "z=0").unwrap();

    assert_eq!(get_section(&doc, "a.*").unwrap().body_text(), "z=0");
    assert_not_found(get_section(&doc, "."), ".");
    let updated = replace_section_body(&doc, "a.*", "z=1").unwrap();
    assert_eq!(get_section(&updated, "a").unwrap().body_text(), "x=1");
}

#[test]
fn test_malformed_regions_cannot_be_targeted() {
    let doc = ";--- a ---\nx=1\n;/--- b ---\n;--- c ---\ny=2";

    assert!(list_sections(doc).is_empty());
    assert_eq!(inspect(doc).malformations.len(), 2);
    assert_not_found(replace_section_body(doc, "a", "x=2"), "a");
    assert_not_found(delete_section(doc, "b"), "b");
    assert!(matches!(validate(doc), Err(Error::Malformed(_))));
    validate(PJSIP).unwrap();
}
