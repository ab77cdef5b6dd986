//! Semantic matcher
//!
//! Scores free-text queries against the capability catalog with a
//! bag-of-words TF-IDF model plus the synonym table. Four similarity
//! measures are combined per tool:
//!
//! - keyword Jaccard, weighted by learned per-word importance (0.35)
//! - description token overlap (0.25)
//! - example token overlap (0.15)
//! - cosine similarity over the TF-IDF embedding (0.25)
//!
//! A learned adjustment from recorded match outcomes scales the combined
//! score (success rate > 0.8 -> x1.1, < 0.3 -> x0.9).
//!
//! # Finalization
//!
//! [`SemanticMatcher::finalize_embeddings`] must be called once after all
//! [`add_tool_embedding`](SemanticMatcher::add_tool_embedding) calls.
//! Matching before finalization degrades to pure term-frequency scoring;
//! valid, just less discriminating.
//!
//! Matching itself never mutates state, so results are deterministic for a
//! fixed catalog; only [`record_match_result`](SemanticMatcher::record_match_result)
//! learns.

use super::tokenize::{expand_synonyms, tokenize};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Fixed combination weights
const KEYWORD_WEIGHT: f64 = 0.35;
const DESCRIPTION_WEIGHT: f64 = 0.25;
const EXAMPLE_WEIGHT: f64 = 0.15;
const EMBEDDING_WEIGHT: f64 = 0.25;

/// Learned-adjustment thresholds and factors
const BOOST_SUCCESS_RATE: f64 = 0.8;
const BOOST_FACTOR: f64 = 1.1;
const PENALTY_SUCCESS_RATE: f64 = 0.3;
const PENALTY_FACTOR: f64 = 0.9;

/// Word-weight learning: +5% per successful overlap, capped so repeated
/// successes cannot dominate the Jaccard term forever.
const WORD_WEIGHT_STEP: f64 = 1.05;
const WORD_WEIGHT_CAP: f64 = 2.0;

/// History bounds: trim to the most recent `HISTORY_KEEP` once the log
/// exceeds `HISTORY_LIMIT`.
const HISTORY_LIMIT: usize = 1000;
const HISTORY_KEEP: usize = 500;

/// Per-tool text profile built from description + keywords + examples.
#[derive(Debug, Clone)]
struct ToolEmbedding {
    /// Raw token list of the concatenated text
    tokens: Vec<String>,
    /// Term frequency (raw counts)
    term_freq: HashMap<String, f64>,
    /// TF-IDF weighted terms, populated by finalization
    weighted: HashMap<String, f64>,
    /// Declared keywords
    keywords: HashSet<String>,
    /// Description tokens
    description_tokens: HashSet<String>,
    /// Example tokens
    example_tokens: HashSet<String>,
}

/// Recorded outcome of acting on a match, used for learning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub query: String,
    pub tool_id: String,
    pub successful: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// One scored match from the semantic matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch {
    pub tool_id: String,
    /// Combined score in 0..=1
    pub score: f64,
    pub keyword_score: f64,
    pub description_score: f64,
    pub example_score: f64,
    pub embedding_score: f64,
}

/// TF-IDF matcher over the capability catalog.
#[derive(Debug, Clone, Default)]
pub struct SemanticMatcher {
    embeddings: HashMap<String, ToolEmbedding>,
    /// Registration order, for stable tiebreaks
    order: Vec<String>,
    /// Inverse document frequency per term (after finalization)
    idf: HashMap<String, f64>,
    finalized: bool,
    /// Learned per-word importance for the keyword Jaccard
    word_weights: HashMap<String, f64>,
    history: VecDeque<MatchRecord>,
}

impl SemanticMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the text profile of one tool.
    ///
    /// Must be called for every capability before matching is usable.
    /// Re-adding a tool replaces its profile and invalidates finalization.
    pub fn add_tool_embedding(
        &mut self,
        tool_id: impl Into<String>,
        description: &str,
        keywords: &[String],
        examples: &[String],
    ) {
        let tool_id = tool_id.into();

        let description_tokens: HashSet<String> = tokenize(description).into_iter().collect();
        let keyword_tokens: HashSet<String> = keywords
            .iter()
            .flat_map(|keyword| tokenize(keyword))
            .collect();
        let example_tokens: HashSet<String> = examples
            .iter()
            .flat_map(|example| tokenize(example))
            .collect();

        let combined = format!("{} {} {}", description, keywords.join(" "), examples.join(" "));
        let tokens = tokenize(&combined);

        let mut term_freq: HashMap<String, f64> = HashMap::new();
        for token in &tokens {
            *term_freq.entry(token.clone()).or_insert(0.0) += 1.0;
        }

        if !self.embeddings.contains_key(&tool_id) {
            self.order.push(tool_id.clone());
        }
        self.embeddings.insert(
            tool_id,
            ToolEmbedding {
                tokens,
                term_freq,
                weighted: HashMap::new(),
                keywords: keyword_tokens,
                description_tokens,
                example_tokens,
            },
        );
        self.finalized = false;
    }

    /// Compute IDF over the whole corpus and weight every stored term
    /// frequency by it. Call once, after all embeddings are added.
    pub fn finalize_embeddings(&mut self) {
        let num_tools = self.embeddings.len() as f64;
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for embedding in self.embeddings.values() {
            for term in embedding.term_freq.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }

        self.idf = doc_freq
            .into_iter()
            .map(|(term, freq)| (term, (num_tools / (1.0 + freq as f64)).ln()))
            .collect();

        for embedding in self.embeddings.values_mut() {
            embedding.weighted = embedding
                .term_freq
                .iter()
                .map(|(term, tf)| {
                    let idf = self.idf.get(term).copied().unwrap_or(0.0);
                    (term.clone(), tf * idf)
                })
                .collect();
        }
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn tool_count(&self) -> usize {
        self.embeddings.len()
    }

    pub fn knows_tool(&self, tool_id: &str) -> bool {
        self.embeddings.contains_key(tool_id)
    }

    /// Score the query against every tool and return the top matches.
    ///
    /// Empty queries yield an empty result, not an error. Ties keep
    /// registration order (stable sort).
    pub fn match_query(&self, query: &str, top_k: usize, min_score: f64) -> Vec<SemanticMatch> {
        let raw_tokens = tokenize(query);
        if raw_tokens.is_empty() {
            return Vec::new();
        }
        let expanded = expand_synonyms(&raw_tokens);
        let query_set: HashSet<&str> = expanded.iter().map(|t| t.as_str()).collect();

        let mut query_freq: HashMap<&str, f64> = HashMap::new();
        for token in &expanded {
            *query_freq.entry(token.as_str()).or_insert(0.0) += 1.0;
        }

        let mut matches: Vec<SemanticMatch> = self
            .order
            .iter()
            .filter_map(|tool_id| {
                let embedding = self.embeddings.get(tool_id)?;

                let keyword_score = self.weighted_jaccard(&query_set, &embedding.keywords);
                let description_score =
                    overlap_score(&query_set, &embedding.description_tokens, raw_tokens.len());
                let example_score =
                    overlap_score(&query_set, &embedding.example_tokens, raw_tokens.len());
                let embedding_score = self.cosine_similarity(&query_freq, embedding);

                let combined = KEYWORD_WEIGHT * keyword_score
                    + DESCRIPTION_WEIGHT * description_score
                    + EXAMPLE_WEIGHT * example_score
                    + EMBEDDING_WEIGHT * embedding_score;
                let adjusted = (combined * self.learned_adjustment(tool_id)).min(1.0);

                (adjusted >= min_score).then(|| SemanticMatch {
                    tool_id: tool_id.clone(),
                    score: adjusted,
                    keyword_score,
                    description_score,
                    example_score,
                    embedding_score,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        matches
    }

    /// Record the outcome of acting on a match.
    ///
    /// On success, the weights of query words overlapping the tool's token
    /// profile are nudged upward (bounded by [`WORD_WEIGHT_CAP`]). Fails
    /// with [`DomainError::UnknownTool`] for tools never embedded.
    pub fn record_match_result(
        &mut self,
        query: &str,
        tool_id: &str,
        successful: bool,
        feedback: Option<&str>,
    ) -> Result<(), DomainError> {
        if !self.embeddings.contains_key(tool_id) {
            return Err(DomainError::UnknownTool(tool_id.to_string()));
        }

        self.history.push_back(MatchRecord {
            query: query.to_string(),
            tool_id: tool_id.to_string(),
            successful,
            feedback: feedback.map(str::to_string),
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_KEEP;
            self.history.drain(..excess);
        }

        if successful {
            let embedding = &self.embeddings[tool_id];
            let tool_tokens: HashSet<&str> =
                embedding.tokens.iter().map(|t| t.as_str()).collect();
            for token in tokenize(query) {
                if tool_tokens.contains(token.as_str()) {
                    let weight = self.word_weights.entry(token).or_insert(1.0);
                    *weight = (*weight * WORD_WEIGHT_STEP).min(WORD_WEIGHT_CAP);
                }
            }
        }
        Ok(())
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Success rate for a tool over the recorded history; `None` when no
    /// record mentions it.
    pub fn success_rate(&self, tool_id: &str) -> Option<f64> {
        let records: Vec<&MatchRecord> = self
            .history
            .iter()
            .filter(|record| record.tool_id == tool_id)
            .collect();
        if records.is_empty() {
            return None;
        }
        let successes = records.iter().filter(|record| record.successful).count();
        Some(successes as f64 / records.len() as f64)
    }

    fn learned_adjustment(&self, tool_id: &str) -> f64 {
        match self.success_rate(tool_id) {
            Some(rate) if rate > BOOST_SUCCESS_RATE => BOOST_FACTOR,
            Some(rate) if rate < PENALTY_SUCCESS_RATE => PENALTY_FACTOR,
            _ => 1.0,
        }
    }

    /// Jaccard over keyword sets, with each word scaled by its learned
    /// importance (default 1.0).
    fn weighted_jaccard(&self, query: &HashSet<&str>, keywords: &HashSet<String>) -> f64 {
        if keywords.is_empty() {
            return 0.0;
        }
        let weight = |word: &str| self.word_weights.get(word).copied().unwrap_or(1.0);

        let intersection: f64 = keywords
            .iter()
            .filter(|keyword| query.contains(keyword.as_str()))
            .map(|keyword| weight(keyword))
            .sum();
        let union: f64 = keywords.iter().map(|keyword| weight(keyword)).sum::<f64>()
            + query
                .iter()
                .filter(|token| !keywords.contains(**token))
                .map(|token| weight(token))
                .sum::<f64>();

        if union == 0.0 { 0.0 } else { intersection / union }
    }

    /// Cosine similarity between the query bag and the tool embedding.
    /// Uses TF-IDF weights when finalized, raw term frequency otherwise.
    fn cosine_similarity(&self, query_freq: &HashMap<&str, f64>, embedding: &ToolEmbedding) -> f64 {
        let tool_vector: &HashMap<String, f64> = if self.finalized {
            &embedding.weighted
        } else {
            &embedding.term_freq
        };

        let mut dot = 0.0;
        let mut query_norm = 0.0;
        for (term, query_value) in query_freq {
            let query_value = if self.finalized {
                query_value * self.idf.get(*term).copied().unwrap_or(0.0)
            } else {
                *query_value
            };
            query_norm += query_value * query_value;
            if let Some(tool_value) = tool_vector.get(*term) {
                dot += query_value * tool_value;
            }
        }
        let tool_norm: f64 = tool_vector.values().map(|value| value * value).sum();

        let denominator = query_norm.sqrt() * tool_norm.sqrt();
        if denominator == 0.0 { 0.0 } else { (dot / denominator).clamp(0.0, 1.0) }
    }
}

/// Fraction of query tokens found in the target set, measured against the
/// unexpanded query length so synonym expansion cannot dilute the score.
fn overlap_score(query: &HashSet<&str>, target: &HashSet<String>, raw_len: usize) -> f64 {
    if raw_len == 0 || target.is_empty() {
        return 0.0;
    }
    let hits = target
        .iter()
        .filter(|token| query.contains(token.as_str()))
        .count();
    (hits as f64 / raw_len as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn catalog_matcher() -> SemanticMatcher {
        let mut matcher = SemanticMatcher::new();
        matcher.add_tool_embedding(
            "primitives.create_box",
            "Create a rectangular box with length, width and height",
            &keywords(&["box", "cube", "create", "rectangular"]),
            &keywords(&["create a box 50mm long", "make a cube"]),
        );
        matcher.add_tool_embedding(
            "primitives.create_sphere",
            "Create a sphere with a given radius",
            &keywords(&["sphere", "ball", "create", "radius"]),
            &keywords(&["create a sphere with 25mm radius"]),
        );
        matcher.add_tool_embedding(
            "export.stl",
            "Export the model to an STL mesh file",
            &keywords(&["export", "stl", "mesh", "file"]),
            &keywords(&["export to stl"]),
        );
        matcher.finalize_embeddings();
        matcher
    }

    #[test]
    fn test_match_ranks_relevant_tool_first() {
        let matcher = catalog_matcher();
        let matches = matcher.match_query("create a box", 5, 0.0);

        assert!(!matches.is_empty());
        assert_eq!(matches[0].tool_id, "primitives.create_box");
        assert!(matches[0].score > 0.0);
    }

    #[test]
    fn test_synonyms_reach_canonical_keywords() {
        let matcher = catalog_matcher();
        let matches = matcher.match_query("make a cube", 5, 0.0);
        assert_eq!(matches[0].tool_id, "primitives.create_box");
    }

    #[test]
    fn test_empty_query_returns_no_matches() {
        let matcher = catalog_matcher();
        assert!(matcher.match_query("", 5, 0.0).is_empty());
        assert!(matcher.match_query("?!", 5, 0.0).is_empty());
    }

    #[test]
    fn test_min_score_filters() {
        let matcher = catalog_matcher();
        let matches = matcher.match_query("create a box", 5, 0.99);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_match_is_deterministic_and_pure() {
        let matcher = catalog_matcher();
        let first = matcher.match_query("create a sphere with 25mm radius", 3, 0.1);
        let second = matcher.match_query("create a sphere with 25mm radius", 3, 0.1);
        assert_eq!(first, second);
        assert_eq!(first[0].tool_id, "primitives.create_sphere");
    }

    #[test]
    fn test_unfinalized_matching_degrades_to_tf() {
        let mut matcher = SemanticMatcher::new();
        matcher.add_tool_embedding(
            "export.stl",
            "Export the model to an STL mesh file",
            &keywords(&["export", "stl"]),
            &[],
        );
        assert!(!matcher.is_finalized());

        let matches = matcher.match_query("export stl", 5, 0.0);
        assert_eq!(matches[0].tool_id, "export.stl");
    }

    #[test]
    fn test_record_match_result_unknown_tool() {
        let mut matcher = catalog_matcher();
        let error = matcher
            .record_match_result("anything", "missing.tool", true, None)
            .unwrap_err();
        assert!(matches!(error, DomainError::UnknownTool(_)));
    }

    #[test]
    fn test_learned_boost_and_penalty() {
        let mut matcher = catalog_matcher();
        let baseline = matcher.match_query("create a box", 5, 0.0)[0].score;

        for _ in 0..5 {
            matcher
                .record_match_result("create a box", "primitives.create_box", true, None)
                .unwrap();
        }
        assert_eq!(matcher.success_rate("primitives.create_box"), Some(1.0));
        let boosted = matcher.match_query("create a box", 5, 0.0)[0].score;
        assert!(boosted >= baseline);

        for _ in 0..5 {
            matcher
                .record_match_result("export", "export.stl", false, Some("wrong tool"))
                .unwrap();
        }
        let rate = matcher.success_rate("export.stl").unwrap();
        assert!(rate < PENALTY_SUCCESS_RATE);
    }

    #[test]
    fn test_word_weight_cap() {
        let mut matcher = catalog_matcher();
        for _ in 0..100 {
            matcher
                .record_match_result("create box", "primitives.create_box", true, None)
                .unwrap();
        }
        let weight = matcher.word_weights.get("box").copied().unwrap_or(1.0);
        assert!(weight <= WORD_WEIGHT_CAP);
        assert!(weight > 1.0);
    }

    #[test]
    fn test_history_trimmed() {
        let mut matcher = catalog_matcher();
        for index in 0..(HISTORY_LIMIT + 1) {
            matcher
                .record_match_result(
                    &format!("query {}", index),
                    "primitives.create_box",
                    index % 2 == 0,
                    None,
                )
                .unwrap();
        }
        assert_eq!(matcher.history_len(), HISTORY_KEEP);
    }
}
