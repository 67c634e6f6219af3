//! Grammar Pointer - German grammar pointers from an LLM
//!
//! Groups the model's flagged substrings by sentence and renders them as
//! color-coded underlines in HTML.

pub mod category;
pub mod checker;
pub mod config;
pub mod error;
pub mod export;
pub mod grouper;
pub mod llm;
pub mod renderer;
pub mod style;
