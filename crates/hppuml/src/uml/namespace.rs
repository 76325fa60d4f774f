//! Namespace tree used to lay out rendered entities
//!
//! The tree is rebuilt from the entity list on every render and only
//! borrows the entities it groups.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use crate::core::{wrap_namespace, Render};

use super::entity::Entity;

/// A top-level or namespace-contained diagram item
#[derive(Debug)]
pub enum NamespaceItem<'a> {
    Entity(&'a Entity),
    Namespace(NamespaceNode<'a>),
}

impl Render for NamespaceItem<'_> {
    fn render(&self) -> String {
        match self {
            NamespaceItem::Entity(entity) => entity.render(),
            NamespaceItem::Namespace(node) => node.render(),
        }
    }
}

/// A namespace block: entities first, then nested namespaces
#[derive(Debug)]
pub struct NamespaceNode<'a> {
    /// Full `::`-joined namespace path
    pub path: String,
    pub items: Vec<NamespaceItem<'a>>,
}

impl<'a> NamespaceNode<'a> {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            items: Vec::new(),
        }
    }

    /// Last path segment, used as the block label
    pub fn name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }
}

impl Render for NamespaceNode<'_> {
    fn render(&self) -> String {
        let children: Vec<String> = self.items.iter().map(Render::render).collect();
        wrap_namespace(&children.join("\n"), self.name())
    }
}

/// Every namespace used by `entities` plus all of its ancestors, ordered
/// deepest first (ties by name, descending)
fn namespace_paths(entities: &[Entity]) -> Vec<String> {
    let mut paths = BTreeSet::new();
    for namespace in entities.iter().map(Entity::namespace).filter(|ns| !ns.is_empty()) {
        let segments: Vec<&str> = namespace.split("::").collect();
        for depth in 1..=segments.len() {
            paths.insert(segments[..depth].join("::"));
        }
    }

    let mut ordered: Vec<String> = paths.into_iter().collect();
    ordered.sort_by(|a, b| {
        let key_a = (a.split("::").count(), a.as_str());
        let key_b = (b.split("::").count(), b.as_str());
        key_b.cmp(&key_a)
    });
    ordered
}

/// Group entities into nested namespace blocks
///
/// Returns the top-level items: entities in the global namespace, in
/// entity order, followed by the outermost namespace nodes.
pub fn build_tree(entities: &[Entity]) -> Vec<NamespaceItem<'_>> {
    let paths = namespace_paths(entities);
    let mut nodes: HashMap<&str, NamespaceNode<'_>> = paths
        .iter()
        .map(|path| (path.as_str(), NamespaceNode::new(path)))
        .collect();

    let mut top_level = Vec::new();
    for entity in entities {
        match nodes.get_mut(entity.namespace()) {
            Some(node) => node.items.push(NamespaceItem::Entity(entity)),
            None => top_level.push(NamespaceItem::Entity(entity)),
        }
    }

    // Deepest first, so every node is complete before it moves into its parent
    for path in &paths {
        let Some(node) = nodes.remove(path.as_str()) else {
            continue;
        };
        match path.rsplit_once("::") {
            Some((parent, _)) => match nodes.get_mut(parent) {
                Some(parent_node) => parent_node.items.push(NamespaceItem::Namespace(node)),
                None => top_level.push(NamespaceItem::Namespace(node)),
            },
            None => top_level.push(NamespaceItem::Namespace(node)),
        }
    }

    trace!(
        namespaces = paths.len(),
        top_level = top_level.len(),
        "Built namespace tree"
    );
    top_level
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ContainerKind;
    use crate::header::ClassDecl;
    use crate::uml::entity::ClassEntity;

    fn entity(name: &str, namespace: &str) -> Entity {
        let mut decl = ClassDecl::new(name, ContainerKind::Class);
        decl.namespace = namespace.to_string();
        Entity::Class(ClassEntity::from_decl(&decl))
    }

    #[test]
    fn test_global_entities_stay_top_level() {
        let entities = vec![entity("A", ""), entity("B", "")];
        let tree = build_tree(&entities);
        assert_eq!(tree.len(), 2);
        assert!(matches!(tree[0], NamespaceItem::Entity(e) if e.name() == "A"));
    }

    #[test]
    fn test_ancestor_namespaces_are_synthesized() {
        let entities = vec![entity("A", "first_ns::second_ns")];
        let tree = build_tree(&entities);
        assert_eq!(tree.len(), 1);
        let NamespaceItem::Namespace(outer) = &tree[0] else {
            panic!("Expected a namespace node");
        };
        assert_eq!(outer.path, "first_ns");
        assert_eq!(outer.items.len(), 1);
        let NamespaceItem::Namespace(inner) = &outer.items[0] else {
            panic!("Expected a nested namespace node");
        };
        assert_eq!(inner.name(), "second_ns");
    }

    #[test]
    fn test_render_nested_namespaces() {
        let entities = vec![entity("A", "first_ns::second_ns")];
        let rendered: String = build_tree(&entities).iter().map(Render::render).collect();
        assert_eq!(
            rendered,
            "namespace first_ns {\n\tnamespace second_ns {\n\t\tclass A {\n\t\t}\n\t}\n}\n"
        );
    }

    #[test]
    fn test_entities_before_child_namespaces() {
        let entities = vec![
            entity("Inner", "Interface::NestedNamespace"),
            entity("Class04", "Interface"),
        ];
        let tree = build_tree(&entities);
        let NamespaceItem::Namespace(node) = &tree[0] else {
            panic!("Expected a namespace node");
        };
        assert!(matches!(node.items[0], NamespaceItem::Entity(e) if e.name() == "Class04"));
        assert!(matches!(node.items[1], NamespaceItem::Namespace(_)));
    }

    #[test]
    fn test_namespace_order_is_deepest_first_then_name_descending() {
        let entities = vec![entity("X", "b"), entity("Y", "a::c"), entity("Z", "a")];
        assert_eq!(namespace_paths(&entities), vec!["a::c", "b", "a"]);

        let tree = build_tree(&entities);
        let labels: Vec<_> = tree
            .iter()
            .map(|item| match item {
                NamespaceItem::Namespace(node) => node.path.clone(),
                NamespaceItem::Entity(e) => e.name().to_string(),
            })
            .collect();
        assert_eq!(labels, vec!["b", "a"]);
    }
}
