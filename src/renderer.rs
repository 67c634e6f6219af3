//! Renders annotated sentences as HTML with stacked, color-coded underlines.
//!
//! Two overlap strategies are available:
//!
//! * [`OverlapStrategy::Sequential`] wraps substrings longest first by literal
//!   replacement over the sentence text (never over generated markup). A
//!   shorter substring contained in an already wrapped longer one gets wrapped
//!   again inside it, so the result is order-dependent. This is the historical
//!   output format.
//! * [`OverlapStrategy::LongestSpan`] collects every match position first,
//!   keeps the longest of any overlapping matches and renders in one pass, so
//!   spans never nest.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::grouper::{AnnotationGroups, SubstringAnnotation};
use crate::style::{Color, SpanStyle, StyleTable, UnderlineStyle, DEFAULT_BASE_OFFSET_PX};

/// How annotations whose matches overlap are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapStrategy {
    #[default]
    Sequential,
    LongestSpan,
}

/// Renders sentences and documents from grouped annotations
#[derive(Debug, Clone, Default)]
pub struct SpanRenderer {
    table: StyleTable,
    overlap: OverlapStrategy,
}

impl SpanRenderer {
    pub fn new(table: StyleTable, overlap: OverlapStrategy) -> Self {
        Self { table, overlap }
    }

    /// Render one sentence with its annotations
    pub fn render(&self, sentence: &str, annotations: &[SubstringAnnotation]) -> String {
        let ordered = longest_first(annotations);

        match self.overlap {
            OverlapStrategy::Sequential => self.render_sequential(sentence, &ordered),
            OverlapStrategy::LongestSpan => self.render_longest_span(sentence, &ordered),
        }
    }

    /// Render every sentence in first-seen order, joined by a space
    pub fn render_document(&self, groups: &AnnotationGroups) -> String {
        groups
            .iter()
            .map(|s| self.render(&s.sentence, &s.annotations))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn render_sequential(&self, sentence: &str, ordered: &[&SubstringAnnotation]) -> String {
        let mut segments = vec![Segment::Text(sentence.to_string())];

        for annotation in ordered {
            let style = self.table.span_style(&annotation.categories);
            if style.is_empty() {
                continue;
            }

            let open = open_tag(&style);
            let mut found = 0;
            segments = segments
                .into_iter()
                .flat_map(|segment| match segment {
                    Segment::Text(text) => {
                        let (pieces, count) = wrap_matches(&text, &annotation.substring, &open);
                        found += count;
                        pieces
                    }
                    markup => vec![markup],
                })
                .collect();

            if found == 0 {
                tracing::debug!("Substring {:?} not found in sentence", annotation.substring);
            }
        }

        segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => escape_html(text),
                Segment::Markup(markup) => markup.clone(),
            })
            .collect()
    }

    fn render_longest_span(&self, sentence: &str, ordered: &[&SubstringAnnotation]) -> String {
        // (start, end, rank) in byte offsets; rank follows the longest-first order
        let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
        for (rank, annotation) in ordered.iter().enumerate() {
            if annotation.categories.is_empty() {
                continue;
            }
            candidates.extend(
                sentence
                    .match_indices(annotation.substring.as_str())
                    .map(|(start, matched)| (start, start + matched.len(), rank)),
            );
        }

        candidates.sort_by_key(|&(start, end, rank)| {
            (Reverse(sentence[start..end].chars().count()), start, rank)
        });

        let mut kept: Vec<(usize, usize, usize)> = Vec::new();
        for (start, end, rank) in candidates {
            if kept.iter().any(|&(s, e, _)| start < e && s < end) {
                tracing::debug!(
                    "Dropping overlapping match {:?} at byte {}",
                    ordered[rank].substring,
                    start
                );
                continue;
            }
            kept.push((start, end, rank));
        }

        kept.sort_by_key(|&(start, _, _)| start);

        let mut out = String::with_capacity(sentence.len() * 2);
        let mut cursor = 0;
        for (start, end, rank) in kept {
            out.push_str(&escape_html(&sentence[cursor..start]));
            let style = self.table.span_style(&ordered[rank].categories);
            out.push_str(&wrap(&escape_html(&sentence[start..end]), &style));
            cursor = end;
        }
        out.push_str(&escape_html(&sentence[cursor..]));

        out
    }

    /// Legend explaining the underline colors
    pub fn legend_html(&self) -> String {
        let entries = [
            ("Grammatik", Color::Blue),
            ("Rechtschreibung", Color::Green),
            ("Wortwahl und Wortstellung", Color::Orange),
            ("Zeichensetzung", Color::Yellow),
        ];

        entries
            .iter()
            .map(|&(label, color)| {
                let style = SpanStyle {
                    underlines: vec![UnderlineStyle {
                        color,
                        offset_px: DEFAULT_BASE_OFFSET_PX,
                    }],
                };
                wrap(label, &style)
            })
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

/// Piece of a sentence while substrings are wrapped one after another
enum Segment {
    /// Raw sentence text, escaped on output
    Text(String),
    /// Generated tag, emitted as is
    Markup(String),
}

/// Split `text` around every literal occurrence of `needle`, wrapping each one.
/// The wrapped text stays a `Text` segment so shorter substrings can still
/// match inside it.
fn wrap_matches(text: &str, needle: &str, open: &str) -> (Vec<Segment>, usize) {
    let mut pieces = Vec::new();
    let mut cursor = 0;
    let mut count = 0;

    for (start, matched) in text.match_indices(needle) {
        if start > cursor {
            pieces.push(Segment::Text(text[cursor..start].to_string()));
        }
        pieces.push(Segment::Markup(open.to_string()));
        pieces.push(Segment::Text(matched.to_string()));
        pieces.push(Segment::Markup(CLOSE_TAG.to_string()));
        cursor = start + matched.len();
        count += 1;
    }

    if cursor < text.len() {
        pieces.push(Segment::Text(text[cursor..].to_string()));
    }

    (pieces, count)
}

/// Non-empty annotations sorted by substring length, longest first.
/// Equal lengths keep their first-seen order.
fn longest_first(annotations: &[SubstringAnnotation]) -> Vec<&SubstringAnnotation> {
    let mut ordered: Vec<&SubstringAnnotation> = annotations
        .iter()
        .filter(|a| !a.substring.is_empty())
        .collect();
    ordered.sort_by_key(|a| Reverse(a.substring.chars().count()));
    ordered
}

const CLOSE_TAG: &str = "</span>";

fn open_tag(style: &SpanStyle) -> String {
    format!("<span style=\"{}\">", style.to_css())
}

fn wrap(escaped: &str, style: &SpanStyle) -> String {
    format!("{}{}{}", open_tag(style), escaped, CLOSE_TAG)
}

/// Escape text for embedding in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::grouper::{group, AnnotationRow};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    const ORANGE: &str =
        "text-decoration: underline; text-decoration-color: orange; text-underline-offset: 6px;";
    const GREEN: &str =
        "text-decoration: underline; text-decoration-color: green; text-underline-offset: 6px;";
    const YELLOW: &str =
        "text-decoration: underline; text-decoration-color: yellow; text-underline-offset: 6px;";

    fn annotation(substring: &str, categories: &[Category]) -> SubstringAnnotation {
        SubstringAnnotation {
            substring: substring.to_string(),
            categories: categories.iter().cloned().collect(),
        }
    }

    fn longest_span() -> SpanRenderer {
        SpanRenderer::new(StyleTable::default(), OverlapStrategy::LongestSpan)
    }

    #[test]
    fn test_end_to_end_single_annotation() {
        let rows = vec![AnnotationRow::new("Das ist gut.", "gut", "Wortwahl")];
        let groups = group(&rows);
        let rendered = SpanRenderer::default().render_document(&groups);

        assert_eq!(
            rendered,
            format!("Das ist <span style=\"{ORANGE}\">gut</span>.")
        );
    }

    #[test]
    fn test_every_occurrence_is_wrapped() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "gut und gut",
            &[annotation("gut", &[Category::Spelling])],
        );

        assert_eq!(rendered.matches("<span").count(), 2);
    }

    #[test]
    fn test_pattern_characters_match_literally() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "Der Preis (hoch) ist zu viel.",
            &[annotation("Preis (hoch)", &[Category::Punctuation])],
        );

        assert_eq!(rendered.matches("<span").count(), 1);
        assert!(rendered.contains(">Preis (hoch)</span>"));
    }

    #[test]
    fn test_regex_like_substring_does_not_match_pattern() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render("Das kostet 5 Euro.", &[annotation(".*", &[Category::Spelling])]);

        assert_eq!(rendered, "Das kostet 5 Euro.");
    }

    #[test]
    fn test_empty_substring_is_skipped() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render("Hallo Welt.", &[annotation("", &[Category::Spelling])]);

        assert_eq!(rendered, "Hallo Welt.");
    }

    #[test]
    fn test_missing_substring_leaves_sentence_unchanged() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render("Hallo Welt.", &[annotation("Mond", &[Category::Spelling])]);

        assert_eq!(rendered, "Hallo Welt.");
    }

    #[test]
    fn test_unknown_category_uses_blue() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "Er gehen nach Hause.",
            &[annotation("gehen", &[Category::Other("Grammatik".to_string())])],
        );

        assert!(rendered.contains("text-decoration-color: blue;"));
    }

    #[test]
    fn test_padded_label_uses_blue() {
        let rows = vec![AnnotationRow::new("Das ist gut.", "gut", " Wortwahl")];
        let rendered = SpanRenderer::default().render_document(&group(&rows));

        assert!(rendered.contains("text-decoration-color: blue;"));
    }

    #[test]
    fn test_spelling_uses_green() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render("Ich libe dich.", &[annotation("libe", &[Category::Spelling])]);

        assert!(rendered.contains("text-decoration-color: green;"));
    }

    #[test]
    fn test_multiple_categories_stack() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "Das ist gelest.",
            &[annotation("gelest", &[Category::Spelling, Category::WordChoice])],
        );

        assert_eq!(rendered.matches("<span").count(), 1);
        assert!(rendered.contains("text-decoration-color: green; text-underline-offset: 6px;"));
        assert!(rendered.contains("text-decoration-color: orange; text-underline-offset: 9px;"));
    }

    #[test]
    fn test_longest_substring_wrapped_first() {
        // Sequential replacement wraps "das Haus" first, then wraps "Haus"
        // again inside it. The nested span is the known limitation of this
        // strategy.
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "Ich sehe das Haus.",
            &[
                annotation("Haus", &[Category::Spelling]),
                annotation("das Haus", &[Category::WordChoice]),
            ],
        );

        assert_eq!(
            rendered,
            format!(
                "Ich sehe <span style=\"{ORANGE}\">das <span style=\"{GREEN}\">Haus</span></span>."
            )
        );
    }

    #[test]
    fn test_sequential_never_matches_inside_markup() {
        // ":" also occurs in the generated style attribute
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "Er sagte: Hallo Welt",
            &[
                annotation("Hallo Welt", &[Category::WordChoice]),
                annotation(":", &[Category::Punctuation]),
            ],
        );

        assert_eq!(
            rendered,
            format!(
                "Er sagte<span style=\"{YELLOW}\">:</span> <span style=\"{ORANGE}\">Hallo Welt</span>"
            )
        );
    }

    #[test]
    fn test_sequential_never_matches_inside_entities() {
        // "39" is also part of the escaped apostrophe
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "Ich hab's bei 39 Grad gemacht.",
            &[annotation("39", &[Category::Spelling])],
        );

        assert_eq!(
            rendered,
            format!("Ich hab&#39;s bei <span style=\"{GREEN}\">39</span> Grad gemacht.")
        );
    }

    #[test]
    fn test_sequential_matches_raw_text_with_special_characters() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "Tom & Jerry",
            &[annotation("Tom & Jerry", &[Category::Spelling]), annotation("&", &[Category::Punctuation])],
        );

        assert_eq!(
            rendered,
            format!(
                "<span style=\"{GREEN}\">Tom <span style=\"{YELLOW}\">&amp;</span> Jerry</span>"
            )
        );
    }

    #[test]
    fn test_longest_first_order() {
        let annotations = vec![
            annotation("Haus", &[Category::Spelling]),
            annotation("das Haus", &[Category::WordChoice]),
            annotation("Bau", &[Category::Spelling]),
        ];
        let ordered: Vec<&str> = longest_first(&annotations)
            .iter()
            .map(|a| a.substring.as_str())
            .collect();

        assert_eq!(ordered, vec!["das Haus", "Haus", "Bau"]);
    }

    #[test]
    fn test_longest_span_drops_contained_match() {
        let rendered = longest_span().render(
            "Ich sehe das Haus.",
            &[
                annotation("Haus", &[Category::Spelling]),
                annotation("das Haus", &[Category::WordChoice]),
            ],
        );

        assert_eq!(
            rendered,
            format!("Ich sehe <span style=\"{ORANGE}\">das Haus</span>.")
        );
    }

    #[test]
    fn test_longest_span_prefers_leftmost_among_equal_lengths() {
        // "bc" is seen first but "ab" starts earlier
        let rendered = longest_span().render(
            "abc",
            &[
                annotation("bc", &[Category::Spelling]),
                annotation("ab", &[Category::WordChoice]),
            ],
        );

        assert_eq!(rendered, format!("<span style=\"{ORANGE}\">ab</span>c"));
    }

    #[test]
    fn test_longest_span_keeps_separate_occurrence() {
        let rendered = longest_span().render(
            "Das Haus ist ein Haus.",
            &[
                annotation("Haus", &[Category::Spelling]),
                annotation("Das Haus", &[Category::WordChoice]),
            ],
        );

        assert_eq!(
            rendered,
            format!(
                "<span style=\"{ORANGE}\">Das Haus</span> ist ein <span style=\"{GREEN}\">Haus</span>."
            )
        );
    }

    #[test]
    fn test_longest_span_partial_overlap() {
        let rendered = longest_span().render(
            "ein großes Haus",
            &[
                annotation("großes Haus", &[Category::WordChoice]),
                annotation("ein groß", &[Category::Spelling]),
            ],
        );

        assert_eq!(
            rendered,
            format!("ein <span style=\"{ORANGE}\">großes Haus</span>")
        );
    }

    #[test]
    fn test_markup_in_substring_is_escaped() {
        let renderer = SpanRenderer::default();
        let rendered = renderer.render(
            "Hallo <script>alert(1)</script> Welt",
            &[annotation("<script>", &[Category::Spelling])],
        );

        assert!(!rendered.contains("<script>"));
        assert!(rendered.contains(">&lt;script&gt;</span>"));
        assert!(rendered.contains("&lt;/script&gt;"));
    }

    #[test]
    fn test_quotes_are_escaped_in_both_strategies() {
        let annotations = [annotation("\"so\"", &[Category::Punctuation])];
        for renderer in [SpanRenderer::default(), longest_span()] {
            let rendered = renderer.render("Er sagte \"so\".", &annotations);
            assert!(rendered.contains(">&quot;so&quot;</span>"), "{rendered}");
        }
    }

    #[test]
    fn test_document_keeps_sentence_without_errors() {
        let rows = vec![
            AnnotationRow::new("Alles gut.", "", ""),
            AnnotationRow::new("Das ist gut.", "gut", "Wortwahl"),
        ];
        let rendered = SpanRenderer::default().render_document(&group(&rows));

        assert!(rendered.starts_with("Alles gut. Das ist "));
    }

    #[test]
    fn test_empty_categories_render_nothing() {
        let empty = SubstringAnnotation {
            substring: "gut".to_string(),
            categories: BTreeSet::new(),
        };
        for renderer in [SpanRenderer::default(), longest_span()] {
            assert_eq!(renderer.render("Das ist gut.", &[empty.clone()]), "Das ist gut.");
        }
    }

    #[test]
    fn test_legend() {
        let legend = SpanRenderer::default().legend_html();

        assert_eq!(legend.matches("<span").count(), 4);
        assert!(legend.contains("text-decoration-color: blue; text-underline-offset: 6px;\">Grammatik</span>"));
        assert!(legend.contains(">Wortwahl und Wortstellung</span>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b < c > d \"e\" 'f'"), "a &amp; b &lt; c &gt; d &quot;e&quot; &#39;f&#39;");
        assert_eq!(escape_html("Übergrößen"), "Übergrößen");
    }
}
