//! Underline styles keyed by error category.

use std::collections::BTreeSet;
use std::fmt;

use crate::category::Category;

/// Named CSS colors used for underlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Green,
    Yellow,
    Orange,
    Blue,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Orange => "orange",
            Color::Blue => "blue",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single underline: its color and distance from the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnderlineStyle {
    pub color: Color,
    pub offset_px: u32,
}

impl UnderlineStyle {
    pub fn to_css(&self) -> String {
        format!(
            "text-decoration: underline; text-decoration-color: {}; text-underline-offset: {}px;",
            self.color, self.offset_px
        )
    }
}

/// Stacked underlines for one span, innermost first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpanStyle {
    pub underlines: Vec<UnderlineStyle>,
}

impl SpanStyle {
    /// Serialize to the value of an inline `style` attribute
    pub fn to_css(&self) -> String {
        self.underlines
            .iter()
            .map(UnderlineStyle::to_css)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.underlines.is_empty()
    }
}

/// Category → color lookup plus underline spacing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTable {
    base_offset_px: u32,
    offset_step_px: u32,
}

pub const DEFAULT_BASE_OFFSET_PX: u32 = 6;
pub const DEFAULT_OFFSET_STEP_PX: u32 = 3;

/// Color for anything outside the known vocabulary (the "Grammatik" bucket)
pub const FALLBACK_COLOR: Color = Color::Blue;

impl Default for StyleTable {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_OFFSET_PX, DEFAULT_OFFSET_STEP_PX)
    }
}

impl StyleTable {
    pub fn new(base_offset_px: u32, offset_step_px: u32) -> Self {
        Self {
            base_offset_px,
            offset_step_px,
        }
    }

    pub fn color_for(&self, category: &Category) -> Color {
        match category {
            Category::Spelling => Color::Green,
            Category::Punctuation => Color::Yellow,
            Category::WordChoice | Category::WordOrder => Color::Orange,
            Category::Other(_) => FALLBACK_COLOR,
        }
    }

    /// One underline per category, each pushed further below the text
    pub fn span_style(&self, categories: &BTreeSet<Category>) -> SpanStyle {
        let underlines = categories
            .iter()
            .enumerate()
            .map(|(i, category)| UnderlineStyle {
                color: self.color_for(category),
                offset_px: self.base_offset_px + i as u32 * self.offset_step_px,
            })
            .collect();

        SpanStyle { underlines }
    }
}
