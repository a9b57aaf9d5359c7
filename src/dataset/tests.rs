use super::*;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

const HOTPOT_LINE: &str = r#"{"id": "5a8b57f25542995d1e6f1371", "input": "Were Scott Derrickson and Ed Wood of the same nationality?", "output": [{"answer": "yes"}, {"provenance": [{"wikipedia_id": "2816539", "title": "Scott Derrickson", "section": "Section::::Abstract.", "start_paragraph_id": 1, "start_character": 0, "end_paragraph_id": 1, "end_character": 229, "bleu_score": 1.0}]}]}"#;

fn reader(text: &str) -> RecordReader<Cursor<Vec<u8>>> {
    RecordReader::new(
        Cursor::new(text.as_bytes().to_vec()),
        PathBuf::from("inline.jsonl"),
    )
}

#[test]
fn test_parse_record_fields() {
    let record = parse_record(HOTPOT_LINE, 1).expect("valid record");

    assert_eq!(record.id, "5a8b57f25542995d1e6f1371");
    assert_eq!(record.outputs.len(), 2);
    assert_eq!(record.outputs[0].answer.as_deref(), Some("yes"));
    assert!(record.outputs[0].provenance.is_none());

    let spans = record.outputs[1].provenance.as_ref().unwrap();
    assert_eq!(spans[0].document_id, 2816539);
    assert_eq!(spans[0].start_paragraph_id, 1);
    assert_eq!(spans[0].end_character, Some(229));
    assert_eq!(spans[0].extra["title"], "Scott Derrickson");
}

#[test]
fn test_parse_record_accepts_numeric_document_id() {
    let line = r#"{"id": "q", "input": "x", "output": [{"provenance": [{"wikipedia_id": 42, "start_paragraph_id": 0, "end_paragraph_id": 0}]}]}"#;
    let record = parse_record(line, 1).unwrap();

    let span = record.spans().next().unwrap();
    assert_eq!(span.document_id, 42);
    assert_eq!(span.start_character, None);
    assert_eq!(span.end_character, None);
}

#[test]
fn test_parse_record_null_offsets() {
    let line = r#"{"id": "q", "input": "x", "output": [{"provenance": [{"wikipedia_id": "7", "start_paragraph_id": 2, "end_paragraph_id": 2, "start_character": null, "end_character": null}]}]}"#;
    let record = parse_record(line, 1).unwrap();

    let span = record.spans().next().unwrap();
    assert_eq!(span.start_character, None);
    assert_eq!(span.end_character, None);
}

#[test]
fn test_parse_record_rejects_non_integer_document_id() {
    let line = r#"{"id": "q", "input": "x", "output": [{"provenance": [{"wikipedia_id": "Ed_Wood", "start_paragraph_id": 0, "end_paragraph_id": 0}]}]}"#;

    let err = parse_record(line, 7).unwrap_err();
    match err {
        DatasetError::InvalidRecord { line, reason } => {
            assert_eq!(line, 7);
            assert!(reason.contains("Ed_Wood"), "reason: {}", reason);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_record_rejects_missing_fields() {
    assert!(parse_record(r#"{"input": "x", "output": []}"#, 1).is_err());
    assert!(parse_record(r#"{"id": "q", "output": []}"#, 1).is_err());
    assert!(parse_record(r#"{"id": "q", "input": "x"}"#, 1).is_err());
}

#[test]
fn test_parse_record_rejects_missing_paragraph_id() {
    let line = r#"{"id": "q", "input": "x", "output": [{"provenance": [{"wikipedia_id": "7", "start_paragraph_id": 2}]}]}"#;
    assert!(matches!(
        parse_record(line, 3),
        Err(DatasetError::InvalidRecord { line: 3, .. })
    ));
}

#[test]
fn test_parse_record_rejects_empty_id() {
    let line = r#"{"id": "  ", "input": "x", "output": []}"#;
    assert!(matches!(
        parse_record(line, 1),
        Err(DatasetError::InvalidRecord { .. })
    ));
}

#[test]
fn test_round_trip_preserves_unknown_fields() {
    let record = parse_record(HOTPOT_LINE, 1).unwrap();
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["output"][1]["provenance"][0]["wikipedia_id"], "2816539");
    assert_eq!(json["output"][1]["provenance"][0]["bleu_score"], 1.0);
    assert_eq!(
        json["output"][1]["provenance"][0]["section"],
        "Section::::Abstract."
    );
    assert!(json["output"][0].get("provenance").is_none());
}

#[test]
fn test_annotate_source_creates_and_extends_meta() {
    let mut span = ProvenanceSpan::new(1, 0);
    span.annotate_source("full paragraph");
    assert_eq!(span.extra["meta"]["src_context"], "full paragraph");

    span.extra
        .get_mut("meta")
        .and_then(|m| m.as_object_mut())
        .unwrap()
        .insert("note".to_string(), serde_json::json!("kept"));
    span.annotate_source("replaced");

    assert_eq!(span.extra["meta"]["src_context"], "replaced");
    assert_eq!(span.extra["meta"]["note"], "kept");
}

#[test]
fn test_reader_skips_blank_lines_and_counts_lines() {
    let text = format!("{}\n\n{}\n{{broken\n", HOTPOT_LINE, HOTPOT_LINE);
    let results: Vec<_> = reader(&text).collect();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(
        results[2],
        Err(DatasetError::InvalidRecord { line: 4, .. })
    ));
}

#[test]
fn test_read_records_with_limit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hotpotqa-dev-kilt.jsonl");
    std::fs::write(&path, format!("{0}\n{0}\n{0}\n", HOTPOT_LINE)).unwrap();

    assert_eq!(read_records(&path, None).unwrap().len(), 3);
    assert_eq!(read_records(&path, Some(2)).unwrap().len(), 2);
}

#[test]
fn test_read_records_missing_file() {
    let err = read_records("/nonexistent/split.jsonl", None).unwrap_err();
    assert!(matches!(err, DatasetError::Io { .. }));
}

#[test]
fn test_find_split_file_single_match() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("hotpotqa-dev-kilt.jsonl"), "").unwrap();
    std::fs::write(
        dir.path().join("hotpotqa-test_without_answers-kilt.jsonl"),
        "",
    )
    .unwrap();
    std::fs::write(dir.path().join("nq-dev-kilt.jsonl"), "").unwrap();
    std::fs::write(dir.path().join("hotpotqa-dev-kilt.json"), "").unwrap();

    let found = find_split_file("hotpotqa", "dev", dir.path()).unwrap();
    assert_eq!(found, dir.path().join("hotpotqa-dev-kilt.jsonl"));
}

#[test]
fn test_find_split_file_not_found() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("nq-dev-kilt.jsonl"), "").unwrap();

    let err = find_split_file("hotpotqa", "dev", dir.path()).unwrap_err();
    assert!(matches!(err, DatasetError::SplitFileNotFound { .. }));
}

#[test]
fn test_find_split_file_ambiguous() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("triviaqa-dev_id-kilt.jsonl"), "").unwrap();
    std::fs::write(dir.path().join("triviaqa-dev-kilt.jsonl"), "").unwrap();

    let err = find_split_file("triviaqa", "dev", dir.path()).unwrap_err();
    match err {
        DatasetError::AmbiguousSplitFile { matches, .. } => assert_eq!(matches.len(), 2),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_referenced_document_ids_sorted_and_unique() {
    let line_a = r#"{"id": "a", "input": "x", "output": [{"provenance": [{"wikipedia_id": "30", "start_paragraph_id": 0, "end_paragraph_id": 0}, {"wikipedia_id": "4", "start_paragraph_id": 1, "end_paragraph_id": 1}]}]}"#;
    let line_b = r#"{"id": "b", "input": "y", "output": [{"answer": "z"}, {"provenance": [{"wikipedia_id": "30", "start_paragraph_id": 2, "end_paragraph_id": 2}]}]}"#;
    let records = vec![parse_record(line_a, 1).unwrap(), parse_record(line_b, 2).unwrap()];

    let ids: Vec<u64> = referenced_document_ids(&records).into_iter().collect();
    assert_eq!(ids, vec![4, 30]);
}
