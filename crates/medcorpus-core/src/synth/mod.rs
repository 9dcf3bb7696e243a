//! Text cleaning and template expansion of path records into sentences.

pub mod clean;
pub mod templates;

pub use clean::{clean, MIN_CLEANED_CHARS};
pub use templates::{expand, max_sentences_per_record};
