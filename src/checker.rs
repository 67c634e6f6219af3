//! Checks a German text and renders the grammar pointers.
//!
//! The pipeline is: validate input → cap length → ask the model → parse rows →
//! group by sentence → render underlines.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::{Config, Credential};
use crate::error::CheckError;
use crate::grouper::{group, AnnotationGroups, AnnotationRow};
use crate::llm::{build_prompt, parse_annotations, CompletionModel};
use crate::renderer::{escape_html, SpanRenderer};

/// Result of one check
#[derive(Debug, Clone)]
pub struct Report {
    /// Records as the model returned them
    pub rows: Vec<AnnotationRow>,
    pub groups: AnnotationGroups,
    /// The checked text with underlines
    pub document: String,
    pub legend: String,
    /// Whether the input was cut to the character limit
    pub truncated: bool,
    pub max_characters: usize,
}

impl Report {
    /// HTML fragment with heading, legend, the underlined text and the
    /// table of records to review
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        if self.truncated {
            html.push_str(&format!(
                "<p><em>Nur die ersten {} Zeichen werden geprüft.</em></p>\n",
                self.max_characters
            ));
        }
        html.push_str("<h3>Geprüfter Text mit Anstreichungen!</h3>\n");
        html.push_str(&format!("<p>{}</p>\n", self.legend));
        html.push_str(&format!("<p>{}</p>\n", self.document));
        html.push_str("<h3>Bitte die Ergebnisse auswerten!</h3>\n");
        html.push_str(&results_table(&self.rows));
        html
    }
}

/// Numbered table with one line per record, same columns as the CSV export
fn results_table(rows: &[AnnotationRow]) -> String {
    let mut html = String::from(
        "<table>\n<tr><th></th><th>Satz</th><th>Satzteil</th><th>Fehler</th></tr>\n",
    );

    for (i, row) in rows.iter().enumerate() {
        let category = row.category.as_ref().map(|c| c.label()).unwrap_or("");
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            i + 1,
            escape_html(&row.sentence),
            escape_html(&row.substring),
            escape_html(category),
        ));
    }

    html.push_str("</table>\n");
    html
}

/// Grammar checker driving a completion model
pub struct GrammarChecker<M> {
    model: M,
    prompt: String,
    max_characters: usize,
    renderer: SpanRenderer,
}

impl<M: CompletionModel> GrammarChecker<M> {
    pub fn new(model: M, config: &Config) -> Self {
        Self {
            model,
            prompt: config.llm.prompt.clone(),
            max_characters: config.checker.max_characters,
            renderer: config.render.renderer(),
        }
    }

    /// Check `text` with the given credential
    pub async fn check(&self, text: &str, credential: &Credential) -> Result<Report, CheckError> {
        if text.trim().is_empty() {
            return Err(CheckError::EmptyInput);
        }

        let (text, truncated) = truncate_graphemes(text, self.max_characters);
        if truncated {
            tracing::warn!(
                "Input exceeds {} characters, only the beginning is checked",
                self.max_characters
            );
        }

        let prompt = build_prompt(&self.prompt, text);
        let response = self.model.complete(&prompt, credential).await?;

        let rows = parse_annotations(&response).inspect_err(|e| {
            tracing::warn!("Could not parse model response: {}", e);
        })?;
        tracing::info!("Model returned {} records", rows.len());

        let groups = group(&rows);
        let document = self.renderer.render_document(&groups);

        Ok(Report {
            rows,
            groups,
            document,
            legend: self.renderer.legend_html(),
            truncated,
            max_characters: self.max_characters,
        })
    }
}

/// Cut `text` to at most `max` user-perceived characters
fn truncate_graphemes(text: &str, max: usize) -> (&str, bool) {
    match text.grapheme_indices(true).nth(max) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}
