//! Model unit document.
//!
//! # Responsibility
//! - Define the in-memory tree persisted as one model unit.
//! - Derive the interface projection used for cross-unit references.
//!
//! # Invariants
//! - The projection keeps the unit root and, recursively, only public nodes.
//! - Private nodes never leak into the projection, nor do their properties.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One named node inside a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitNode {
    pub name: String,
    /// Language concept this node instantiates.
    pub concept: String,
    /// Public nodes are part of the unit interface.
    #[serde(default)]
    pub public: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UnitNode>,
}

impl UnitNode {
    /// Creates a node that is exported through the unit interface.
    pub fn public(name: impl Into<String>, concept: impl Into<String>) -> Self {
        Self::new(name, concept, true)
    }

    /// Creates a node visible only in the full unit.
    pub fn private(name: impl Into<String>, concept: impl Into<String>) -> Self {
        Self::new(name, concept, false)
    }

    fn new(name: impl Into<String>, concept: impl Into<String>, public: bool) -> Self {
        Self {
            name: name.into(),
            concept: concept.into(),
            public,
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: UnitNode) -> Self {
        self.children.push(child);
        self
    }

    fn public_projection(&self) -> Option<UnitNode> {
        if !self.public {
            return None;
        }
        Some(UnitNode {
            name: self.name.clone(),
            concept: self.concept.clone(),
            public: true,
            properties: self.properties.clone(),
            children: project_children(&self.children),
        })
    }
}

/// Root document of one model unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelUnit {
    /// Unit name; used as `unit_name` when the unit is saved.
    pub name: String,
    pub concept: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<UnitNode>,
}

impl ModelUnit {
    pub fn new(name: impl Into<String>, concept: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concept: concept.into(),
            properties: BTreeMap::new(),
            nodes: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_node(mut self, node: UnitNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Returns the interface projection of this unit.
    ///
    /// Root properties belong to the unit body and are dropped; public
    /// nodes keep their properties and public descendants.
    pub fn interface(&self) -> ModelUnit {
        ModelUnit {
            name: self.name.clone(),
            concept: self.concept.clone(),
            properties: BTreeMap::new(),
            nodes: project_children(&self.nodes),
        }
    }

    /// Counts all nodes below the root.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[UnitNode]) -> usize {
            nodes.iter().map(|node| 1 + count(&node.children)).sum()
        }
        count(&self.nodes)
    }
}

fn project_children(children: &[UnitNode]) -> Vec<UnitNode> {
    children
        .iter()
        .filter_map(UnitNode::public_projection)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ModelUnit, UnitNode};

    fn sample() -> ModelUnit {
        ModelUnit::new("Orders", "EntityUnit")
            .with_property("version", 3)
            .with_node(
                UnitNode::public("Order", "Entity")
                    .with_property("table", "orders")
                    .with_child(UnitNode::public("id", "Attribute"))
                    .with_child(UnitNode::private("cache", "Attribute")),
            )
            .with_node(UnitNode::private("Helper", "Entity").with_child(UnitNode::public(
                "leak",
                "Attribute",
            )))
    }

    #[test]
    fn interface_keeps_only_public_nodes() {
        let interface = sample().interface();
        assert_eq!(interface.nodes.len(), 1);
        let order = &interface.nodes[0];
        assert_eq!(order.name, "Order");
        assert_eq!(order.children.len(), 1);
        assert_eq!(order.children[0].name, "id");
    }

    #[test]
    fn interface_drops_public_nodes_under_private_parents() {
        let interface = sample().interface();
        assert!(interface.nodes.iter().all(|node| node.name != "leak"));
        assert_eq!(interface.node_count(), 2);
    }

    #[test]
    fn interface_drops_root_properties() {
        let unit = sample();
        assert!(!unit.properties.is_empty());
        assert!(unit.interface().properties.is_empty());
        assert_eq!(unit.node_count(), 5);
    }
}
