//! Error categories reported by the model.
//!
//! The model labels every flagged substring with a German category name.
//! Four of them are known; everything else is kept verbatim as `Other`.

use std::fmt;

/// Error category attached to a flagged substring
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Rechtschreibung
    Spelling,
    /// Zeichensetzung
    Punctuation,
    /// Wortwahl
    WordChoice,
    /// Wortstellung
    WordOrder,
    /// Any other label, e.g. "Grammatik"
    Other(String),
}

impl Category {
    /// Parse a model label. An empty label means "no category"; any other
    /// label is taken as written, whitespace included.
    pub fn parse(label: &str) -> Option<Self> {
        if label.is_empty() {
            return None;
        }

        Some(match label {
            "Rechtschreibung" => Category::Spelling,
            "Zeichensetzung" => Category::Punctuation,
            "Wortwahl" => Category::WordChoice,
            "Wortstellung" => Category::WordOrder,
            other => Category::Other(other.to_string()),
        })
    }

    /// The German label as the model writes it
    pub fn label(&self) -> &str {
        match self {
            Category::Spelling => "Rechtschreibung",
            Category::Punctuation => "Zeichensetzung",
            Category::WordChoice => "Wortwahl",
            Category::WordOrder => "Wortstellung",
            Category::Other(label) => label,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
