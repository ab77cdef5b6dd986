//! Tool selector
//!
//! Produces a ranked [`ToolMatch`] list for a free-text instruction by
//! combining three independent matchers:
//!
//! 1. pattern rules (compiled regex alternatives per tool)
//! 2. the semantic matcher
//! 3. capability keyword queries against the catalog
//!
//! Results merge by tool id (max confidence wins, reasons concatenate,
//! semantic scores average), then parameters are extracted and context
//! adjustments applied. An empty result list means "unable to determine a
//! tool" and is a valid outcome, not an error.

use super::params::extract_parameters;
use super::semantic::SemanticMatcher;
use super::tokenize::content_keywords;
use crate::capability::handler::ToolParams;
use crate::capability::registry::CapabilityRegistry;
use crate::context::entities::WorkspaceContext;
use crate::core::error::DomainError;
use regex::Regex;
use std::collections::HashMap;

/// Base confidence for a pattern hit
const PATTERN_CONFIDENCE: f64 = 0.8;
/// Confidence when a literal alias is also present in the text
const ALIAS_CONFIDENCE: f64 = 0.9;
/// Semantic matches are taken at 90% of their similarity score
const SEMANTIC_FACTOR: f64 = 0.9;
/// Semantic matcher query settings
const SEMANTIC_TOP_K: usize = 5;
const SEMANTIC_MIN_SCORE: f64 = 0.3;
/// Capability-match confidence with prerequisites satisfied / unsatisfied
const CAPABILITY_READY_CONFIDENCE: f64 = 0.7;
const CAPABILITY_BLOCKED_CONFIDENCE: f64 = 0.4;
/// Context adjustments
const SELECTION_BOOST: f64 = 1.1;
const WORKBENCH_BOOST: f64 = 1.15;

/// A scored candidate binding of user text to a tool.
#[derive(Debug, Clone)]
pub struct ToolMatch {
    pub tool_id: String,
    /// Combined confidence in 0..=1
    pub confidence: f64,
    /// Parameters extracted from the text
    pub parameters: ToolParams,
    /// Human-readable trace of which matchers fired
    pub reason: String,
    /// Similarity score when the semantic matcher contributed
    pub semantic_score: Option<f64>,
}

/// A fixed regex rule binding phrases to one tool.
struct PatternRule {
    tool_id: String,
    patterns: Vec<Regex>,
    aliases: Vec<String>,
}

/// Combines pattern, semantic, and capability matching into ranked
/// [`ToolMatch`] results.
pub struct ToolSelector {
    rules: Vec<PatternRule>,
    matcher: SemanticMatcher,
}

impl ToolSelector {
    pub fn new(matcher: SemanticMatcher) -> Self {
        Self {
            rules: Vec::new(),
            matcher,
        }
    }

    /// Add a pattern rule. Invalid patterns are rejected at build time.
    pub fn add_rule(
        &mut self,
        tool_id: impl Into<String>,
        patterns: &[&str],
        aliases: &[&str],
    ) -> Result<(), DomainError> {
        let compiled: Result<Vec<Regex>, _> = patterns.iter().map(|p| Regex::new(p)).collect();
        let compiled = compiled
            .map_err(|e| DomainError::InvalidCapability(format!("bad pattern: {}", e)))?;
        self.rules.push(PatternRule {
            tool_id: tool_id.into(),
            patterns: compiled,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
        Ok(())
    }

    pub fn matcher(&self) -> &SemanticMatcher {
        &self.matcher
    }

    pub fn matcher_mut(&mut self) -> &mut SemanticMatcher {
        &mut self.matcher
    }

    /// Rank candidate tools for a free-text instruction.
    ///
    /// The full list is returned sorted by descending confidence; the
    /// caller decides its own threshold.
    pub fn select_tool(
        &self,
        text: &str,
        registry: &CapabilityRegistry,
        context: &WorkspaceContext,
    ) -> Vec<ToolMatch> {
        let lowered = text.to_lowercase();
        let mut merged: HashMap<String, ToolMatch> = HashMap::new();

        // 1. Pattern matching
        for rule in &self.rules {
            if rule.patterns.iter().any(|pattern| pattern.is_match(&lowered)) {
                let alias_hit = rule.aliases.iter().any(|alias| lowered.contains(alias));
                let confidence = if alias_hit { ALIAS_CONFIDENCE } else { PATTERN_CONFIDENCE };
                merge(
                    &mut merged,
                    ToolMatch {
                        tool_id: rule.tool_id.clone(),
                        confidence,
                        parameters: ToolParams::new(),
                        reason: "pattern match".to_string(),
                        semantic_score: None,
                    },
                );
            }
        }

        // 2. Semantic matching
        for semantic in self
            .matcher
            .match_query(&lowered, SEMANTIC_TOP_K, SEMANTIC_MIN_SCORE)
        {
            merge(
                &mut merged,
                ToolMatch {
                    tool_id: semantic.tool_id.clone(),
                    confidence: semantic.score * SEMANTIC_FACTOR,
                    parameters: ToolParams::new(),
                    reason: format!("semantic match (score {:.2})", semantic.score),
                    semantic_score: Some(semantic.score),
                },
            );
        }

        // 3. Capability matching
        let keywords = content_keywords(&lowered);
        if !keywords.is_empty() {
            for capability in registry.query(&keywords) {
                let ready = registry
                    .check_requirements(&capability.tool_id, context)
                    .map(|(passed, _)| passed)
                    .unwrap_or(false);
                let confidence = if ready {
                    CAPABILITY_READY_CONFIDENCE
                } else {
                    CAPABILITY_BLOCKED_CONFIDENCE
                };
                merge(
                    &mut merged,
                    ToolMatch {
                        tool_id: capability.tool_id.clone(),
                        confidence,
                        parameters: ToolParams::new(),
                        reason: "capability keyword match".to_string(),
                        semantic_score: None,
                    },
                );
            }
        }

        // 4-6. Parameter extraction and context adjustment
        let mut matches: Vec<ToolMatch> = merged
            .into_values()
            .map(|mut candidate| {
                candidate.parameters = extract_parameters(text, &candidate.tool_id);
                candidate.confidence =
                    (candidate.confidence * self.context_factor(&candidate.tool_id, registry, context))
                        .min(1.0);
                candidate
            })
            .collect();

        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.tool_id.cmp(&b.tool_id))
        });
        matches
    }

    /// Forward an execution outcome to the semantic matcher's history.
    pub fn learn_from_execution(
        &mut self,
        text: &str,
        tool_id: &str,
        success: bool,
        feedback: Option<&str>,
    ) -> Result<(), DomainError> {
        self.matcher
            .record_match_result(text, tool_id, success, feedback)
    }

    fn context_factor(
        &self,
        tool_id: &str,
        registry: &CapabilityRegistry,
        context: &WorkspaceContext,
    ) -> f64 {
        let mut factor = 1.0;

        if let Some(capability) = registry.get(tool_id) {
            if capability.category == crate::capability::entities::ToolCategory::Modification
                && context.has_selection()
            {
                factor *= SELECTION_BOOST;
            }
            if let Some(workbench) = &context.view.workbench {
                let workbench = workbench.to_lowercase();
                if tool_id.to_lowercase().contains(&workbench)
                    || capability.category.as_str().contains(&workbench)
                {
                    factor *= WORKBENCH_BOOST;
                }
            }
        }
        factor
    }
}

/// Merge a candidate into the accumulator: max confidence wins, reasons
/// concatenate, semantic scores average when both sides carry one.
fn merge(accumulator: &mut HashMap<String, ToolMatch>, candidate: ToolMatch) {
    match accumulator.get_mut(&candidate.tool_id) {
        Some(existing) => {
            existing.confidence = existing.confidence.max(candidate.confidence);
            existing.reason.push_str("; ");
            existing.reason.push_str(&candidate.reason);
            existing.semantic_score = match (existing.semantic_score, candidate.semantic_score) {
                (Some(a), Some(b)) => Some((a + b) / 2.0),
                (a, b) => a.or(b),
            };
        }
        None => {
            accumulator.insert(candidate.tool_id.clone(), candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::entities::{Requirement, ToolCapability, ToolCategory};
    use crate::context::entities::{DocumentInfo, ObjectRef};

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn test_registry() -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                ToolCapability::new(
                    "primitives.create_box",
                    ToolCategory::Creation,
                    "Create a rectangular box",
                )
                .with_keywords(["box", "cube", "create", "rectangular"]),
            )
            .unwrap();
        registry
            .register(
                ToolCapability::new(
                    "operations.move_object",
                    ToolCategory::Modification,
                    "Move an object by an offset",
                )
                .with_keywords(["move", "translate", "object"])
                .with_requirement(Requirement::selection()),
            )
            .unwrap();
        registry
    }

    fn test_selector() -> ToolSelector {
        let mut matcher = SemanticMatcher::new();
        matcher.add_tool_embedding(
            "primitives.create_box",
            "Create a rectangular box with length, width and height",
            &keywords(&["box", "cube", "create"]),
            &keywords(&["create a box 50mm long"]),
        );
        matcher.add_tool_embedding(
            "operations.move_object",
            "Move an object by an offset along an axis",
            &keywords(&["move", "translate", "object"]),
            &keywords(&["move box001 5mm along x"]),
        );
        matcher.finalize_embeddings();

        let mut selector = ToolSelector::new(matcher);
        selector
            .add_rule(
                "primitives.create_box",
                &[r"(?:create|make|build|add).*(?:box|cube|block)"],
                &["box", "cube"],
            )
            .unwrap();
        selector
            .add_rule(
                "operations.move_object",
                &[r"(?:move|translate|shift)\s"],
                &["move"],
            )
            .unwrap();
        selector
    }

    #[test]
    fn test_box_instruction_extracts_dimensions() {
        let selector = test_selector();
        let matches = selector.select_tool(
            "create a box 50mm long, 30mm wide, and 20mm high",
            &test_registry(),
            &WorkspaceContext::default(),
        );

        assert_eq!(matches[0].tool_id, "primitives.create_box");
        let params = &matches[0].parameters;
        assert!((params["length"].as_f64().unwrap() - 50.0).abs() < 1e-9);
        assert!((params["width"].as_f64().unwrap() - 30.0).abs() < 1e-9);
        assert!((params["height"].as_f64().unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_alias_boosts_pattern_confidence() {
        let selector = test_selector();
        let matches = selector.select_tool(
            "create a box",
            &test_registry(),
            &WorkspaceContext::default(),
        );
        // Alias "box" appears literally, so the pattern leg alone is 0.9
        assert!(matches[0].confidence >= ALIAS_CONFIDENCE);
    }

    #[test]
    fn test_unmatched_text_returns_empty() {
        let selector = test_selector();
        let matches = selector.select_tool(
            "zzz qqq xyzzy",
            &test_registry(),
            &WorkspaceContext::default(),
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_selection_boosts_modification_tools() {
        let selector = test_selector();
        let registry = test_registry();

        let without = selector.select_tool("move box001 5mm along x", &registry, &WorkspaceContext::default());

        let mut context = WorkspaceContext::default();
        context.document.info = Some(DocumentInfo::new("Doc", 1, false));
        context.selection.objects.push(ObjectRef::new("box001", "Part::Box"));
        let with = selector.select_tool("move box001 5mm along x", &registry, &context);

        let conf = |matches: &[ToolMatch]| {
            matches
                .iter()
                .find(|m| m.tool_id == "operations.move_object")
                .map(|m| m.confidence)
                .unwrap()
        };
        assert!(conf(&with) >= conf(&without));
        assert!(conf(&with) <= 1.0);
    }

    #[test]
    fn test_merged_reason_traces_all_sources() {
        let selector = test_selector();
        let matches = selector.select_tool(
            "create a box 50mm long",
            &test_registry(),
            &WorkspaceContext::default(),
        );
        let top = &matches[0];
        assert!(top.reason.contains("pattern match"));
        assert!(top.reason.contains("semantic") || top.reason.contains("capability"));
    }

    #[test]
    fn test_learn_from_execution_forwards() {
        let mut selector = test_selector();
        selector
            .learn_from_execution("create a box", "primitives.create_box", true, None)
            .unwrap();
        assert_eq!(selector.matcher().history_len(), 1);

        let error = selector
            .learn_from_execution("x", "missing.tool", true, None)
            .unwrap_err();
        assert!(matches!(error, DomainError::UnknownTool(_)));
    }
}
