//! Pattern definitions: validated, immutable behavior graphs
//!
//! A definition is loaded once, validated, and shared behind an `Arc` by
//! every agent that runs it.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::error::{PatternError, PatternResult};
use crate::pattern::node::PatternNode;

fn default_engage_distance() -> f32 {
    8.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDefinition {
    pub name: String,
    pub starting_node: String,
    /// Agents engage inside this radius
    #[serde(default = "default_engage_distance")]
    pub engage_distance: f32,
    #[serde(default)]
    pub nodes: Vec<PatternNode>,
}

impl PatternDefinition {
    pub fn new(name: &str, starting_node: &str, nodes: Vec<PatternNode>) -> Self {
        Self {
            name: name.to_string(),
            starting_node: starting_node.to_string(),
            engage_distance: default_engage_distance(),
            nodes,
        }
    }

    pub fn node(&self, name: &str) -> Option<&PatternNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Index of the starting node, or of the first node if the start is missing
    pub fn start_index(&self) -> Option<usize> {
        if let Some(index) = self.node_index(&self.starting_node) {
            return Some(index);
        }
        if self.nodes.is_empty() {
            return None;
        }
        tracing::warn!(
            pattern = %self.name,
            start = %self.starting_node,
            "starting node missing, using first node"
        );
        Some(0)
    }

    /// Check reference integrity and that every node is reachable from the start
    pub fn validate(&self) -> PatternResult<()> {
        if self.nodes.is_empty() {
            return Err(PatternError::NoNodes);
        }

        let mut index: AHashMap<&str, usize> = AHashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if node.name.trim().is_empty() {
                return Err(PatternError::EmptyNodeName { index: i });
            }
            if index.insert(node.name.as_str(), i).is_some() {
                return Err(PatternError::DuplicateNodeName(node.name.clone()));
            }
        }

        let Some(&start) = index.get(self.starting_node.as_str()) else {
            return Err(PatternError::MissingStartingNode(self.starting_node.clone()));
        };

        for node in &self.nodes {
            for transition in &node.transitions {
                if !index.contains_key(transition.target.as_str()) {
                    return Err(PatternError::DanglingTransition {
                        from: node.name.clone(),
                        to: transition.target.clone(),
                    });
                }
            }
            if let Some(fallback) = &node.fallback {
                if !index.contains_key(fallback.as_str()) {
                    return Err(PatternError::DanglingFallback {
                        from: node.name.clone(),
                        to: fallback.clone(),
                    });
                }
            }
        }

        // Breadth-first over transition and fallback edges
        let mut visited: AHashSet<usize> = AHashSet::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(current) = queue.pop_front() {
            let node = &self.nodes[current];
            let targets = node
                .transitions
                .iter()
                .map(|t| t.target.as_str())
                .chain(node.fallback.as_deref());
            for target in targets {
                if let Some(&next) = index.get(target) {
                    if visited.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        if let Some(unreachable) = (0..self.nodes.len()).find(|i| !visited.contains(i)) {
            return Err(PatternError::UnreachableNode(self.nodes[unreachable].name.clone()));
        }
        Ok(())
    }

    /// Validate and freeze for sharing
    pub fn into_shared(self) -> PatternResult<Arc<PatternDefinition>> {
        self.validate()?;
        Ok(Arc::new(self))
    }

    pub fn from_toml_str(contents: &str) -> PatternResult<Arc<PatternDefinition>> {
        let definition: PatternDefinition = toml::from_str(contents)?;
        definition.into_shared()
    }

    pub fn load(path: &Path) -> PatternResult<Arc<PatternDefinition>> {
        let contents = fs::read_to_string(path)?;
        let definition = Self::from_toml_str(&contents)?;
        tracing::info!(pattern = %definition.name, nodes = definition.nodes.len(), "loaded pattern");
        Ok(definition)
    }
}

/// Loaded patterns by name
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: AHashMap<String, Arc<PatternDefinition>>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pattern: Arc<PatternDefinition>) {
        self.patterns.insert(pattern.name.clone(), pattern);
    }

    pub fn get(&self, name: &str) -> Option<Arc<PatternDefinition>> {
        self.patterns.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Load every `*.toml` file in `dir`; the first invalid file aborts the load
    pub fn load_dir(dir: &Path) -> PatternResult<Self> {
        let mut library = Self::new();
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();
        for path in paths {
            library.insert(PatternDefinition::load(&path)?);
        }
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::node::PatternTransition;

    fn chain() -> PatternDefinition {
        PatternDefinition::new(
            "chain",
            "A",
            vec![
                PatternNode::new("A").with_transition(PatternTransition::new("B", 0)),
                PatternNode::new("B"),
            ],
        )
    }

    #[test]
    fn test_terminal_node_is_valid() {
        assert!(chain().validate().is_ok());
    }

    #[test]
    fn test_isolated_node_rejected() {
        let mut def = chain();
        def.nodes.push(PatternNode::new("C"));
        let err = def.validate().unwrap_err();
        assert_eq!(err.to_string(), "node C unreachable");
    }

    #[test]
    fn test_fallback_edges_count_for_reachability() {
        let mut def = chain();
        def.nodes[1] = PatternNode::new("B").with_fallback("C", 2.0);
        def.nodes.push(PatternNode::new("C"));
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_reference_errors() {
        assert!(matches!(
            PatternDefinition::new("empty", "A", vec![]).validate(),
            Err(PatternError::NoNodes)
        ));

        let mut dup = chain();
        dup.nodes.push(PatternNode::new("A"));
        assert!(matches!(dup.validate(), Err(PatternError::DuplicateNodeName(n)) if n == "A"));

        let mut unnamed = chain();
        unnamed.nodes.push(PatternNode::new("  "));
        assert!(matches!(unnamed.validate(), Err(PatternError::EmptyNodeName { index: 2 })));

        let mut start = chain();
        start.starting_node = "Z".into();
        assert!(matches!(start.validate(), Err(PatternError::MissingStartingNode(_))));

        let mut dangling = chain();
        dangling.nodes[1] = PatternNode::new("B").with_transition(PatternTransition::new("Q", 0));
        assert!(matches!(dangling.validate(), Err(PatternError::DanglingTransition { .. })));
    }

    #[test]
    fn test_start_index_falls_back_to_first() {
        let mut def = chain();
        def.starting_node = "missing".into();
        assert_eq!(def.start_index(), Some(0));
        assert_eq!(PatternDefinition::new("e", "A", vec![]).start_index(), None);
    }

    #[test]
    fn test_from_toml() {
        let pattern = PatternDefinition::from_toml_str(
            r#"
name = "guard"
starting_node = "watch"
engage_distance = 6.0

[[nodes]]
name = "watch"
movement = { type = "hold_position" }

[[nodes.transitions]]
target = "block"
priority = 5
conditions = [{ kind = "player_charging" }]

[[nodes]]
name = "block"
skill = "Defense"
start_charging = true
execute_charged_skill = true
fallback = "watch"
fallback_timeout = 3.0
"#,
        )
        .unwrap();
        assert_eq!(pattern.nodes.len(), 2);
        assert_eq!(pattern.engage_distance, 6.0);
        assert_eq!(pattern.node("watch").unwrap().transitions[0].priority, 5);
        assert!(pattern.node("block").unwrap().cancel_skill_on_exit);
    }

    #[test]
    fn test_invalid_toml_never_partially_loads() {
        let result = PatternDefinition::from_toml_str(
            r#"
name = "broken"
starting_node = "A"

[[nodes]]
name = "A"

[[nodes]]
name = "B"
"#,
        );
        assert!(matches!(result, Err(PatternError::UnreachableNode(n)) if n == "B"));
    }
}
