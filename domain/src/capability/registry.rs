//! Capability Registry
//!
//! Append-only catalog of [`ToolCapability`] descriptors, built once at
//! startup. `register` refuses duplicates; `upsert` is the only explicit
//! overwrite path. Queries rank by keyword-intersection size with
//! registration order as the tiebreak, so results are deterministic.

use super::entities::{RequirementKind, ToolCapability};
use crate::context::entities::WorkspaceContext;
use crate::core::error::DomainError;
use std::collections::{HashMap, HashSet};

/// Static catalog of tool capabilities
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    /// Capabilities in registration order
    entries: Vec<ToolCapability>,
    /// tool_id -> index into `entries`
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new capability.
    ///
    /// Fails with [`DomainError::DuplicateCapability`] if the id is taken;
    /// the original entry is left untouched.
    pub fn register(&mut self, capability: ToolCapability) -> Result<(), DomainError> {
        if capability.tool_id.trim().is_empty() {
            return Err(DomainError::InvalidCapability(
                "tool_id must not be empty".to_string(),
            ));
        }
        if self.index.contains_key(&capability.tool_id) {
            return Err(DomainError::DuplicateCapability(capability.tool_id));
        }
        self.index
            .insert(capability.tool_id.clone(), self.entries.len());
        self.entries.push(capability);
        Ok(())
    }

    /// Replace an existing capability or register a new one.
    ///
    /// Replacement keeps the original registration order.
    pub fn upsert(&mut self, capability: ToolCapability) {
        match self.index.get(&capability.tool_id) {
            Some(&position) => self.entries[position] = capability,
            None => {
                self.index
                    .insert(capability.tool_id.clone(), self.entries.len());
                self.entries.push(capability);
            }
        }
    }

    pub fn get(&self, tool_id: &str) -> Option<&ToolCapability> {
        self.index.get(tool_id).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, tool_id: &str) -> bool {
        self.index.contains_key(tool_id)
    }

    /// Capabilities in registration order
    pub fn all(&self) -> impl Iterator<Item = &ToolCapability> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|c| c.tool_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find capabilities whose keywords intersect the query keywords.
    ///
    /// Ranked by intersection size descending; ties keep registration order.
    pub fn query(&self, keywords: &HashSet<String>) -> Vec<&ToolCapability> {
        let mut scored: Vec<(usize, &ToolCapability)> = self
            .entries
            .iter()
            .filter_map(|capability| {
                let overlap = capability
                    .keywords
                    .iter()
                    .filter(|keyword| keywords.contains(keyword.as_str()))
                    .count();
                (overlap > 0).then_some((overlap, capability))
            })
            .collect();

        // Stable sort preserves registration order for equal overlap
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, capability)| capability).collect()
    }

    /// Evaluate every requirement of a tool against the workspace context.
    ///
    /// Returns overall pass/fail plus one human-readable reason per unmet
    /// requirement.
    pub fn check_requirements(
        &self,
        tool_id: &str,
        context: &WorkspaceContext,
    ) -> Result<(bool, Vec<String>), DomainError> {
        let capability = self
            .get(tool_id)
            .ok_or_else(|| DomainError::UnknownTool(tool_id.to_string()))?;

        let mut unmet = Vec::new();
        for requirement in &capability.requirements {
            let satisfied = match &requirement.kind {
                RequirementKind::ActiveDocument => context.has_document(),
                RequirementKind::Selection => context.has_selection(),
                RequirementKind::ObjectExists(name) => match name {
                    Some(name) => context.object_names().any(|candidate| candidate == name),
                    None => context.object_names().next().is_some(),
                },
                RequirementKind::MinimumObjects(count) => {
                    context.object_names().count() >= *count
                }
            };
            if !satisfied {
                unmet.push(requirement.description.clone());
            }
        }

        Ok((unmet.is_empty(), unmet))
    }
}
