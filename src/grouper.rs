//! Groups flat annotation rows by sentence and substring.

use std::collections::{BTreeSet, HashMap};

use crate::category::Category;

/// One record of model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRow {
    /// Sentence the error was found in (Satz)
    pub sentence: String,
    /// Flagged part of the sentence (Satzteil)
    pub substring: String,
    /// Error category (Fehler), `None` when the model left it empty
    pub category: Option<Category>,
}

impl AnnotationRow {
    pub fn new(sentence: impl Into<String>, substring: impl Into<String>, category: &str) -> Self {
        Self {
            sentence: sentence.into(),
            substring: substring.into(),
            category: Category::parse(category),
        }
    }
}

/// A flagged substring with all categories reported for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringAnnotation {
    pub substring: String,
    pub categories: BTreeSet<Category>,
}

/// A sentence and its substring annotations in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceAnnotations {
    pub sentence: String,
    pub annotations: Vec<SubstringAnnotation>,
}

impl SentenceAnnotations {
    fn new(sentence: String) -> Self {
        Self {
            sentence,
            annotations: Vec::new(),
        }
    }

    fn add(&mut self, substring: &str, category: Category) {
        match self.annotations.iter_mut().find(|a| a.substring == substring) {
            Some(existing) => {
                existing.categories.insert(category);
            }
            None => self.annotations.push(SubstringAnnotation {
                substring: substring.to_string(),
                categories: BTreeSet::from([category]),
            }),
        }
    }

    /// Categories recorded for a substring, if any
    pub fn categories(&self, substring: &str) -> Option<&BTreeSet<Category>> {
        self.annotations
            .iter()
            .find(|a| a.substring == substring)
            .map(|a| &a.categories)
    }
}

/// Sentences in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationGroups {
    sentences: Vec<SentenceAnnotations>,
}

impl AnnotationGroups {
    pub fn iter(&self) -> impl Iterator<Item = &SentenceAnnotations> {
        self.sentences.iter()
    }

    pub fn get(&self, sentence: &str) -> Option<&SentenceAnnotations> {
        self.sentences.iter().find(|s| s.sentence == sentence)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

/// Group rows by sentence, then by substring.
///
/// Rows without a sentence are dropped. Rows without a substring or category
/// still register their sentence so it shows up in the rendered document.
pub fn group<'a, I>(rows: I) -> AnnotationGroups
where
    I: IntoIterator<Item = &'a AnnotationRow>,
{
    let mut sentences: Vec<SentenceAnnotations> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for row in rows {
        if row.sentence.is_empty() {
            continue;
        }

        let slot = *index.entry(row.sentence.as_str()).or_insert_with(|| {
            sentences.push(SentenceAnnotations::new(row.sentence.clone()));
            sentences.len() - 1
        });

        match &row.category {
            Some(category) if !row.substring.is_empty() => {
                sentences[slot].add(&row.substring, category.clone());
            }
            _ => {}
        }
    }

    tracing::debug!("Grouped annotations into {} sentences", sentences.len());

    AnnotationGroups { sentences }
}
