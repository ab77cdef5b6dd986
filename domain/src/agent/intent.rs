//! Intent analysis
//!
//! Coarse keyword classification of user text into an operation category
//! with a confidence score. Deliberately independent of any AI provider:
//! the agent can plan without a live model.

use serde::{Deserialize, Serialize};

/// Coarse classification of what the user wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Creation,
    Modification,
    Analysis,
    Boolean,
    Export,
    Unknown,
}

impl IntentKind {
    pub fn as_str(&self) -> &str {
        match self {
            IntentKind::Creation => "creation",
            IntentKind::Modification => "modification",
            IntentKind::Analysis => "analysis",
            IntentKind::Boolean => "boolean",
            IntentKind::Export => "export",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of intent analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// Heuristic confidence in 0..=1
    pub confidence: f64,
    /// Keywords that drove the classification
    pub matched_keywords: Vec<String>,
}

impl Intent {
    pub fn unknown() -> Self {
        Self {
            kind: IntentKind::Unknown,
            confidence: 0.0,
            matched_keywords: Vec::new(),
        }
    }
}

const INTENT_KEYWORDS: &[(IntentKind, &[&str])] = &[
    (
        IntentKind::Creation,
        &[
            "create", "make", "build", "add", "new", "generate", "box", "cube", "cylinder",
            "sphere", "cone", "primitive",
        ],
    ),
    (
        IntentKind::Modification,
        &[
            "move", "translate", "shift", "rotate", "turn", "spin", "scale", "resize", "change",
            "modify", "edit", "position",
        ],
    ),
    (
        IntentKind::Analysis,
        &[
            "measure", "distance", "volume", "area", "weight", "mass", "analyze", "check",
            "inspect", "dimension", "bounding",
        ],
    ),
    (
        IntentKind::Boolean,
        &[
            "union", "fuse", "join", "combine", "merge", "cut", "subtract", "difference",
            "intersect", "intersection", "common",
        ],
    ),
    (
        IntentKind::Export,
        &["export", "save", "stl", "step", "iges", "obj", "mesh", "file"],
    ),
];

/// Base confidence for a single keyword hit; each further hit adds a step.
const BASE_CONFIDENCE: f64 = 0.5;
const CONFIDENCE_STEP: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

/// Classify user text into an [`Intent`].
pub fn analyze_intent(text: &str) -> Intent {
    let tokens = crate::matching::tokenize::tokenize(text);
    if tokens.is_empty() {
        return Intent::unknown();
    }

    let mut best: Option<(IntentKind, Vec<String>)> = None;
    for (kind, keywords) in INTENT_KEYWORDS {
        let hits: Vec<String> = tokens
            .iter()
            .filter(|token| keywords.contains(&token.as_str()))
            .cloned()
            .collect();
        let better = match &best {
            Some((_, best_hits)) => hits.len() > best_hits.len(),
            None => !hits.is_empty(),
        };
        if better {
            best = Some((*kind, hits));
        }
    }

    match best {
        Some((kind, hits)) => {
            let confidence = (BASE_CONFIDENCE + CONFIDENCE_STEP * (hits.len() - 1) as f64)
                .min(MAX_CONFIDENCE);
            Intent {
                kind,
                confidence,
                matched_keywords: hits,
            }
        }
        None => Intent::unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_intent() {
        let intent = analyze_intent("create a sphere with 25mm radius");
        assert_eq!(intent.kind, IntentKind::Creation);
        assert!(intent.confidence >= BASE_CONFIDENCE);
        assert!(intent.matched_keywords.contains(&"create".to_string()));
    }

    #[test]
    fn test_modification_intent() {
        let intent = analyze_intent("move box001 5mm along x");
        assert_eq!(intent.kind, IntentKind::Modification);
    }

    #[test]
    fn test_boolean_intent() {
        let intent = analyze_intent("fuse the two parts together");
        assert_eq!(intent.kind, IntentKind::Boolean);
    }

    #[test]
    fn test_unknown_intent() {
        let intent = analyze_intent("hello there");
        assert_eq!(intent.kind, IntentKind::Unknown);
        assert_eq!(intent.confidence, 0.0);
    }

    #[test]
    fn test_more_hits_raise_confidence() {
        let single = analyze_intent("create something");
        let double = analyze_intent("create a new box");
        assert!(double.confidence > single.confidence);
        assert!(double.confidence <= MAX_CONFIDENCE);
    }
}
