//! Text-to-tool matching: tokenization, the TF-IDF semantic matcher,
//! parameter extraction, and the combining tool selector.

pub mod params;
pub mod selector;
pub mod semantic;
pub mod tokenize;

pub use params::extract_parameters;
pub use selector::{ToolMatch, ToolSelector};
pub use semantic::{MatchRecord, SemanticMatch, SemanticMatcher};
pub use tokenize::{content_keywords, expand_synonyms, tokenize};
