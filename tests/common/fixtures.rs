//! A tiny KILT-shaped data directory.

use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

pub const ALABAMA: &str = "Alabama is a state in the southeastern region of the United States.\n";
pub const LETTER_A: &str = "A is the first letter and the first vowel of the Latin alphabet.\n";
pub const BETA: &str = "Beta is the second letter of the Greek alphabet, after alpha.\n";

pub struct DataDir {
    pub dir: TempDir,
    pub knowledge_path: PathBuf,
}

impl DataDir {
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}

fn span(document_id: &str, paragraph_id: usize, end_character: usize) -> serde_json::Value {
    json!({
        "wikipedia_id": document_id,
        "start_paragraph_id": paragraph_id,
        "end_paragraph_id": paragraph_id,
        "start_character": 0,
        "end_character": end_character,
        "bleu_score": 1.0
    })
}

/// Split `hotpotqa-dev-kilt.jsonl` with three questions plus a knowledge
/// source holding the referenced pages and one unreferenced page.
pub fn write_data_dir() -> DataDir {
    let dir = TempDir::new().unwrap();

    let records = [
        json!({
            "id": "q1",
            "input": "Where is Alabama?",
            "output": [
                { "answer": "the southeastern United States" },
                { "provenance": [span("303", 1, 7)] }
            ]
        }),
        json!({
            "id": "q2",
            "input": "Which letter comes first?",
            "output": [
                { "answer": "A", "provenance": [span("290", 1, 1)] }
            ]
        }),
        json!({
            "id": "q3",
            "input": "Which letter follows alpha?",
            "output": [
                { "answer": "Beta", "provenance": [span("50", 2, 4), span("290", 1, 1)] }
            ]
        }),
    ];
    let split: String = records.iter().map(|r| format!("{}\n", r)).collect();
    std::fs::write(dir.path().join("hotpotqa-dev-kilt.jsonl"), split).unwrap();
    std::fs::write(dir.path().join("hotpotqa-train-kilt.jsonl"), "").unwrap();

    let pages = [
        json!({ "_id": "303", "wikipedia_id": "303", "wikipedia_title": "Alabama",
                "text": ["Alabama\n", ALABAMA] }),
        json!({ "_id": "290", "wikipedia_id": "290", "wikipedia_title": "A",
                "text": ["A\n", LETTER_A] }),
        json!({ "_id": "50", "wikipedia_id": "50", "wikipedia_title": "Beta",
                "text": ["Beta\n", "Section::::Name.\n", BETA] }),
        json!({ "_id": "999", "wikipedia_id": "999", "wikipedia_title": "Unused",
                "text": ["Unused\n", "Never referenced by any question.\n"] }),
    ];
    let knowledge: String = pages.iter().map(|p| format!("{}\n", p)).collect();
    let knowledge_path = dir.path().join("kilt_knowledgesource.json");
    std::fs::write(&knowledge_path, knowledge).unwrap();

    DataDir {
        dir,
        knowledge_path,
    }
}
