use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn fixture_corpus() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("papers.jsonl")
}

fn paperscan() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("paperscan"));
    cmd.env_remove("PAPERSCAN_DATASET").env_remove("RUST_LOG");
    cmd
}

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    let s = String::from_utf8_lossy(stdout);
    s.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<Value>(l).expect("valid jsonl line"))
        .collect()
}

fn titles(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|v| v.get("title").and_then(|t| t.as_str()).unwrap().to_string())
        .collect()
}

fn write_corpus(path: &Path, lines: &[String]) {
    fs::write(path, lines.join("\n")).unwrap();
}

#[test]
fn search_prints_projected_matches_as_jsonl() {
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(fixture_corpus())
        .arg("--workers")
        .arg("1")
        .arg("search")
        .arg("DEEP");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);

    assert_eq!(titles(&items), vec!["Playing Atari with Deep Reinforcement Learning"]);
    let paper = items[0].as_object().unwrap();
    assert!(!paper.contains_key("id"));
    assert_eq!(paper["categories"], "cs.LG");
    assert_eq!(paper["update_date"], "2013-12-20");
}

#[test]
fn search_skips_malformed_line_with_warning() {
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(fixture_corpus())
        .arg("--no-color")
        .arg("search")
        .arg("neural");

    let assert = cmd
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping malformed corpus line"));
    let items = parse_jsonl(&assert.get_output().stdout);
    assert_eq!(titles(&items), vec!["Attention Is All You Need"]);
}

#[test]
fn search_respects_max_results() {
    let temp = tempdir().unwrap();
    let corpus = temp.path().join("many.jsonl");
    let lines: Vec<String> = (0..2000)
        .map(|i| format!(r#"{{"title":"Learning {}","abstract":"learning"}}"#, i))
        .collect();
    write_corpus(&corpus, &lines);

    for n in ["1", "3"] {
        let mut cmd = paperscan();
        cmd.arg("--dataset")
            .arg(&corpus)
            .arg("search")
            .arg("learning")
            .arg("--max-results")
            .arg(n);

        let assert = cmd.assert().success();
        let items = parse_jsonl(&assert.get_output().stdout);
        assert_eq!(items.len().to_string(), n);
    }
}

#[test]
fn search_reads_dataset_from_env() {
    let mut cmd = paperscan();
    cmd.env("PAPERSCAN_DATASET", fixture_corpus())
        .arg("search")
        .arg("ricci")
        .arg("--format")
        .arg("json");

    let assert = cmd.assert().success();
    let parsed: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
}

#[test]
fn search_markdown_format() {
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(fixture_corpus())
        .arg("--format")
        .arg("md")
        .arg("search")
        .arg("diphoton");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("## Papers\n"))
        .stdout(predicate::str::contains("- **DOI**: 10.1103/PhysRevD.76.013009"));
}

#[test]
fn empty_query_is_invalid_before_touching_dataset() {
    let temp = tempdir().unwrap();
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(temp.path().join("missing.jsonl"))
        .arg("search")
        .arg("   ");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("[INVALID_QUERY] invalid query"))
        .stderr(predicate::str::contains("corpus unavailable").not());
}

#[test]
fn missing_dataset_is_reported() {
    let temp = tempdir().unwrap();
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(temp.path().join("missing.jsonl"))
        .arg("digest")
        .arg("graphs");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("[CORPUS_UNAVAILABLE] corpus unavailable"));
}

#[test]
fn digest_matches_expected_layout() {
    let temp = tempdir().unwrap();
    let corpus = temp.path().join("corpus.jsonl");
    write_corpus(
        &corpus,
        &[
            format!(
                r#"{{"title":"Deep Learning Basics","abstract":"{}"}}"#,
                "A".repeat(400)
            ),
            r#"{"title":"Cooking"," abstract":"food"}"#.to_string(),
        ],
    );

    let mut cmd = paperscan();
    cmd.arg("--dataset").arg(&corpus).arg("digest").arg("deep");

    let assert = cmd.assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.starts_with("Paper 1: Deep Learning Basics\n"));
    let expected = format!("Summary: {}...\n", "A".repeat(300));
    assert!(stdout.contains(&expected));
    assert!(!stdout.contains("Paper 2:"));
}

#[test]
fn digest_without_matches_prints_sentinel() {
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(fixture_corpus())
        .arg("-q")
        .arg("digest")
        .arg("no such topic anywhere");

    cmd.assert()
        .success()
        .stdout("No relevant papers found.\n");
}

#[test]
fn digest_prompt_and_stats() {
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(fixture_corpus())
        .arg("-q")
        .arg("digest")
        .arg("attention")
        .arg("--prompt")
        .arg("--stats")
        .arg("--token-model")
        .arg("heuristic");

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Context:\nPaper 1: Attention Is All You Need\n",
        ))
        .stdout(predicate::str::contains("\n\nQuestion: attention"))
        .stderr(predicate::str::contains("Tokens:"))
        .stderr(predicate::str::contains("(model: heuristic)"));
}

#[test]
fn unknown_format_is_rejected() {
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(fixture_corpus())
        .arg("--format")
        .arg("xml")
        .arg("search")
        .arg("deep");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format: xml"));
}

#[test]
fn doctor_reports_dataset_status() {
    let mut cmd = paperscan();
    cmd.arg("--dataset").arg(fixture_corpus()).arg("doctor");

    let assert = cmd.assert().success();
    let items = parse_jsonl(&assert.get_output().stdout);
    let dataset = items
        .iter()
        .find(|v| v["name"] == "dataset")
        .expect("dataset check present");
    assert_eq!(dataset["ok"], true);
}

#[test]
fn doctor_flags_missing_dataset() {
    let temp = tempdir().unwrap();
    let mut cmd = paperscan();
    cmd.arg("--dataset")
        .arg(temp.path().join("missing.jsonl"))
        .arg("--format")
        .arg("md")
        .arg("doctor");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("✗ dataset (required)"))
        .stderr(predicate::str::contains("dataset is not usable"));
}
