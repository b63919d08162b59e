//! Templates (prefabs)
//!
//! A template is a tree of named nodes with authored local transforms. It
//! is pure data: instantiating it into a scene is the scene's job.

use crate::math::Transform;
use serde::{Deserialize, Serialize};

/// One node of a template tree. The root node is the template itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    /// Whether the instantiated node carries an interaction component
    /// (can be grabbed).
    #[serde(default)]
    pub interactive: bool,
    #[serde(default)]
    pub children: Vec<Template>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            interactive: false,
            children: Vec::new(),
        }
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: Template) -> Self {
        self.children.push(child);
        self
    }

    /// Total number of nodes instantiating this template creates.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Template::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_json() {
        let t: Template = serde_json::from_str(
            r#"{"name":"Gear","interactive":true,"children":[{"name":"Mesh"}]}"#,
        )
        .unwrap();
        assert_eq!(t.name, "Gear");
        assert!(t.interactive);
        assert_eq!(t.transform, Transform::IDENTITY);
        assert_eq!(t.node_count(), 2);
    }
}
