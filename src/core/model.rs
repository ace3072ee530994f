//! Record model
//!
//! A corpus line is projected down to a [`Paper`] before it leaves the scan;
//! every command renders from [`MatchSet`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::core::error::SearchError;

/// Authors as they appear in the source: usually a flat string, sometimes a
/// structured list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Authors {
    Text(String),
    Structured(Value),
}

impl Default for Authors {
    fn default() -> Self {
        Authors::Text(String::new())
    }
}

impl<'de> Deserialize<'de> for Authors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Authors::default(),
            Value::String(s) => Authors::Text(s),
            other => Authors::Structured(other),
        })
    }
}

impl Authors {
    /// Flatten to a single display line
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            Authors::Text(s) => Cow::Borrowed(s.as_str()),
            Authors::Structured(Value::Array(items)) => Cow::Owned(
                items
                    .iter()
                    .map(author_name)
                    .filter(|name| !name.is_empty())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Authors::Structured(other) => Cow::Owned(other.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Authors::Text(s) => s.trim().is_empty(),
            Authors::Structured(Value::Array(items)) => items.is_empty(),
            Authors::Structured(_) => false,
        }
    }
}

// arXiv-style parsed names are ["Last", "First", "Suffix"]
fn author_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => {
            let parts: Vec<&str> = parts
                .iter()
                .filter_map(Value::as_str)
                .filter(|p| !p.is_empty())
                .collect();
            match parts.as_slice() {
                [last, first, rest @ ..] => {
                    let mut name = format!("{} {}", first, last);
                    for suffix in rest {
                        name.push(' ');
                        name.push_str(suffix);
                    }
                    name
                }
                [only] => only.to_string(),
                [] => String::new(),
            }
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A matched corpus record, projected to the six retained fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,

    #[serde(rename = "abstract", default, deserialize_with = "lenient_string")]
    pub abstract_text: String,

    #[serde(default)]
    pub authors: Authors,

    #[serde(default, deserialize_with = "lenient_string")]
    pub categories: String,

    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub doi: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub update_date: String,
}

impl Paper {
    /// Create a paper with only a title and abstract
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            abstract_text: abstract_text.into(),
            ..Default::default()
        }
    }

    /// Project a parsed corpus object; unknown fields are dropped
    pub fn from_record(record: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record))
    }
}

/// Read a text field from a raw record without allocating for plain strings
pub(crate) fn text_field<'a>(record: &'a Map<String, Value>, key: &str) -> Cow<'a, str> {
    match record.get(key) {
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

/// A validated, case-folded search term.
///
/// Construction is the only validation point: a `Query` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(String);

impl Query {
    /// Trim and case-fold `raw`, rejecting empty input
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(SearchError::invalid_query("query cannot be empty"));
        }
        Ok(Query(normalized))
    }

    /// Case-insensitive substring test
    pub fn matches(&self, text: &str) -> bool {
        !text.is_empty() && text.to_lowercase().contains(&self.0)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Papers in discovery order.
///
/// Under a multi-worker scan, discovery order is a race among workers and
/// need not equal file order. Callers must not depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchSet {
    papers: Vec<Paper>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self { papers: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Paper> {
        self.papers.iter()
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }
}

impl From<Vec<Paper>> for MatchSet {
    fn from(papers: Vec<Paper>) -> Self {
        Self { papers }
    }
}

impl IntoIterator for MatchSet {
    type Item = Paper;
    type IntoIter = std::vec::IntoIter<Paper>;

    fn into_iter(self) -> Self::IntoIter {
        self.papers.into_iter()
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Paper;
    type IntoIter = std::slice::Iter<'a, Paper>;

    fn into_iter(self) -> Self::IntoIter {
        self.papers.iter()
    }
}
