//! Doctor - Environment checking

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::backends::corpus::open_corpus;
use crate::core::render::{MarkdownItem, RenderConfig, Renderer};
use crate::core::tokenizer::{check_encoding, TokenModel};

/// Outcome of one environment check
#[derive(Debug, Clone, Serialize)]
pub struct CheckStatus {
    pub name: String,
    pub ok: bool,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MarkdownItem for CheckStatus {
    fn write_markdown(&self, _index: usize, out: &mut String) {
        let status = if self.ok { "✓" } else { "✗" };
        let required = if self.required { "required" } else { "optional" };
        out.push_str(&format!("- {} {} ({})", status, self.name, required));
        if let Some(detail) = &self.detail {
            out.push_str(&format!(" - {}", detail));
        }
        out.push('\n');
    }
}

/// Check that the dataset opens the way a search would open it.
///
/// The first non-blank line is sampled for the detail. A malformed sample is
/// reported but does not fail the check, since the scan skips such lines.
pub fn check_dataset(path: &Path) -> CheckStatus {
    let (ok, detail) = match open_corpus(path) {
        Err(e) => (false, e.to_string()),
        Ok(file) => match first_record(BufReader::new(file)) {
            Err(e) => (false, format!("{}: {}", path.display(), e)),
            Ok(None) => (true, format!("{} (no records)", path.display())),
            Ok(Some((_, Ok(())))) => (true, path.display().to_string()),
            Ok(Some((line, Err(e)))) => (
                true,
                format!(
                    "{}: line {} is not a JSON object and will be skipped ({})",
                    path.display(),
                    line,
                    e
                ),
            ),
        },
    };

    CheckStatus {
        name: "dataset".to_string(),
        ok,
        required: true,
        detail: Some(detail),
    }
}

/// Locate the first non-blank line and try to decode it as a record
fn first_record<R: BufRead>(
    mut reader: R,
) -> io::Result<Option<(u64, Result<(), serde_json::Error>)>> {
    let mut line_no = 0u64;
    let mut bytes = Vec::new();
    loop {
        bytes.clear();
        if reader.read_until(b'\n', &mut bytes)? == 0 {
            return Ok(None);
        }
        line_no += 1;
        let trimmed = bytes.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }
        let decoded = serde_json::from_slice::<Map<String, Value>>(trimmed).map(|_| ());
        return Ok(Some((line_no, decoded)));
    }
}

fn check_tokenizer(model: TokenModel) -> CheckStatus {
    let result = check_encoding(model);
    CheckStatus {
        name: format!("tokenizer:{}", model),
        ok: result.is_ok(),
        required: false,
        detail: result.err(),
    }
}

/// Run every check
pub fn run_checks(dataset: &Path) -> Vec<CheckStatus> {
    vec![
        check_dataset(dataset),
        check_tokenizer(TokenModel::Cl100k),
        check_tokenizer(TokenModel::O200k),
    ]
}

/// Run the doctor command
pub fn run_doctor(dataset: &Path, config: RenderConfig) -> Result<()> {
    let checks = run_checks(dataset);

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render("Checks", &checks));

    if checks.iter().any(|c| c.required && !c.ok) {
        eprintln!("\n⚠️  The dataset is not usable; searches will fail.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_dataset_missing() {
        let dir = TempDir::new().unwrap();
        let status = check_dataset(&dir.path().join("missing.jsonl"));
        assert!(!status.ok);
        assert!(status.required);
    }

    #[test]
    fn test_check_dataset_valid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(&path, "{\"title\": \"A\"}\n{\"title\": \"B\"}\n").unwrap();
        assert!(check_dataset(&path).ok);
    }

    #[test]
    fn test_check_dataset_leading_blank_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(&path, "\n{\"title\":\"Deep A\"}\n").unwrap();
        let status = check_dataset(&path);
        assert!(status.ok);
        assert!(!status.detail.unwrap().contains("skipped"));
        assert_eq!(crate::search("deep", &path, 5).unwrap().len(), 1);
    }

    #[test]
    fn test_check_dataset_leading_malformed_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(&path, "{\"title\": \"Broken\n{\"title\":\"Deep A\"}\n").unwrap();
        let status = check_dataset(&path);
        assert!(status.ok);
        assert!(status.detail.unwrap().contains("line 1 is not a JSON object"));
    }

    #[test]
    fn test_check_dataset_directory() {
        let dir = TempDir::new().unwrap();
        let status = check_dataset(dir.path());
        assert!(!status.ok);
        assert!(status.detail.unwrap().contains("corpus unavailable"));
    }

    #[test]
    fn test_check_dataset_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.jsonl");
        fs::write(&path, "\n\n").unwrap();
        let status = check_dataset(&path);
        assert!(status.ok);
        assert!(status.detail.unwrap().ends_with("(no records)"));
    }

    #[test]
    fn test_run_checks_names() {
        let dir = TempDir::new().unwrap();
        let checks = run_checks(&dir.path().join("x.jsonl"));
        let names: Vec<_> = checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["dataset", "tokenizer:cl100k", "tokenizer:o200k"]);
    }

    #[test]
    fn test_markdown_line() {
        let status = CheckStatus {
            name: "dataset".to_string(),
            ok: false,
            required: true,
            detail: Some("gone".to_string()),
        };
        let mut out = String::new();
        status.write_markdown(1, &mut out);
        assert_eq!(out, "- ✗ dataset (required) - gone\n");
    }
}
