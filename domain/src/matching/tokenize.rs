//! Tokenization, stopwords, and the synonym table shared by the semantic
//! matcher and the tool selector.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("word regex is valid"));

/// Words carrying no matching signal, stripped before capability queries.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "to", "in", "on", "at", "for", "with", "by", "from",
    "is", "are", "was", "be", "been", "it", "its", "this", "that", "then", "than", "can",
    "could", "would", "should", "please", "me", "my", "you", "your", "i", "we",
];

/// Interchangeable word groups for CAD instructions. Expansion is
/// bidirectional: any member of a group pulls in all the others.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["create", "make", "build", "add", "new", "generate"],
    &["box", "cube", "block", "rectangular"],
    &["cylinder", "tube", "pipe", "rod"],
    &["sphere", "ball", "orb", "globe"],
    &["cone", "conical", "taper"],
    &["move", "translate", "shift", "reposition"],
    &["rotate", "turn", "spin", "revolve"],
    &["union", "fuse", "join", "combine", "merge"],
    &["cut", "subtract", "difference"],
    &["intersect", "intersection", "common", "overlap"],
    &["delete", "remove", "erase", "destroy"],
    &["export", "save", "write", "output"],
    &["import", "load", "open", "read"],
    &["measure", "measurement", "dimension", "size"],
    &["distance", "length", "gap"],
    &["volume", "capacity"],
];

/// Lowercase word tokens of length > 1.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|token| token.len() > 1)
        .collect()
}

/// Tokens plus every synonym-group member of each token.
///
/// Originals come first, in order; expansions are appended once each.
pub fn expand_synonyms(tokens: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = tokens.to_vec();
    let mut seen: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();

    for token in tokens {
        for group in SYNONYM_GROUPS {
            if group.contains(&token.as_str()) {
                for synonym in *group {
                    if seen.insert(synonym) {
                        expanded.push(synonym.to_string());
                    }
                }
            }
        }
    }
    expanded
}

/// Naive content keywords: stopwords stripped, length > 2.
pub fn content_keywords(text: &str) -> HashSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| token.len() > 2 && !STOPWORDS.contains(&token.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_filters_short() {
        let tokens = tokenize("Create a Box 50mm long!");
        assert_eq!(tokens, vec!["create", "box", "50mm", "long"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("? !").is_empty());
    }

    #[test]
    fn test_expand_synonyms() {
        let tokens = vec!["make".to_string(), "cube".to_string()];
        let expanded = expand_synonyms(&tokens);

        // Originals preserved in order
        assert_eq!(&expanded[..2], &["make".to_string(), "cube".to_string()]);
        // Group members pulled in
        assert!(expanded.iter().any(|t| t == "create"));
        assert!(expanded.iter().any(|t| t == "box"));
        // No duplicates
        let unique: HashSet<&String> = expanded.iter().collect();
        assert_eq!(unique.len(), expanded.len());
    }

    #[test]
    fn test_content_keywords_strips_stopwords() {
        let keywords = content_keywords("create a box with the dimensions");
        assert!(keywords.contains("create"));
        assert!(keywords.contains("box"));
        assert!(keywords.contains("dimensions"));
        assert!(!keywords.contains("the"));
        assert!(!keywords.contains("a"));
    }
}
