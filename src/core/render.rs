//! Renderer module
//!
//! Renders match sets (and doctor reports) as jsonl, json or md

use serde::Serialize;

use crate::core::model::Paper;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Items that know how to print themselves as a Markdown section entry
pub trait MarkdownItem {
    fn write_markdown(&self, index: usize, out: &mut String);
}

impl MarkdownItem for Paper {
    fn write_markdown(&self, index: usize, out: &mut String) {
        let title = one_line(&self.title);
        let title = if title.is_empty() { "Untitled" } else { title.as_str() };
        out.push_str(&format!("### {}. {}\n\n", index, title));

        if !self.authors.is_empty() {
            out.push_str(&format!("- **Authors**: {}\n", one_line(&self.authors.display())));
        }
        if !self.categories.is_empty() {
            out.push_str(&format!("- **Categories**: `{}`\n", self.categories));
        }
        if let Some(doi) = self.doi.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("- **DOI**: {}\n", doi));
        }
        if !self.update_date.is_empty() {
            out.push_str(&format!("- **Updated**: {}\n", self.update_date));
        }

        let abstract_text = one_line(&self.abstract_text);
        if !abstract_text.is_empty() {
            out.push_str(&format!("\n> {}\n", abstract_text));
        }
        out.push('\n');
    }
}

/// Collapse the hard-wrapped whitespace common in corpus text
fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render `items` under a Markdown `heading` (ignored for json formats)
    pub fn render<T: Serialize + MarkdownItem>(&self, heading: &str, items: &[T]) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(items),
            OutputFormat::Json => self.render_json(items),
            OutputFormat::Markdown => render_markdown(heading, items),
        }
    }

    /// One JSON object per line
    fn render_jsonl<T: Serialize>(&self, items: &[T]) -> String {
        items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    fn render_json<T: Serialize>(&self, items: &[T]) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

fn render_markdown<T: MarkdownItem>(heading: &str, items: &[T]) -> String {
    let mut output = format!("## {}\n\n", heading);
    if items.is_empty() {
        output.push_str("_None._\n");
        return output;
    }
    for (i, item) in items.iter().enumerate() {
        item.write_markdown(i + 1, &mut output);
    }
    output
}
