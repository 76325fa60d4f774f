//! Relationships inferred between diagram entities

use std::fmt;

use crate::core::{namespace_link_name, Render};

use super::entity::Entity;

/// Kind of relationship, with its PlantUML arrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationshipKind {
    Inheritance, // <|--
    Aggregation, // o--
    Composition, // *--
    Dependency,  // <..
    Nesting,     // +--
}

impl RelationshipKind {
    /// Name used as the last component of the ordering key
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::Inheritance => "inherit",
            RelationshipKind::Aggregation => "aggregation",
            RelationshipKind::Composition => "composition",
            RelationshipKind::Dependency => "dependency",
            RelationshipKind::Nesting => "nesting",
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            RelationshipKind::Inheritance => "<|--",
            RelationshipKind::Aggregation => "o--",
            RelationshipKind::Composition => "*--",
            RelationshipKind::Dependency => "<..",
            RelationshipKind::Nesting => "+--",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end of a relationship, captured when the relationship is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub namespace: String,
}

impl Endpoint {
    pub fn of(entity: &Entity) -> Self {
        Self {
            name: entity.name().to_string(),
            namespace: entity.namespace().to_string(),
        }
    }

    /// Name as written in a link: `ns.inner.Name` for namespaced entities
    pub fn link_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", namespace_link_name(&self.namespace), self.name)
        }
    }
}

/// An edge between two entities
///
/// The parent endpoint is drawn on the left of the arrow: the base class,
/// the owning class, the used type or the enclosing type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub parent: Endpoint,
    pub child: Endpoint,
    /// Number of members behind an aggregation or composition; 1 otherwise
    pub count: usize,
}

impl Relationship {
    fn new(kind: RelationshipKind, parent: &Entity, child: &Entity) -> Self {
        Self {
            kind,
            parent: Endpoint::of(parent),
            child: Endpoint::of(child),
            count: 1,
        }
    }

    pub fn inheritance(base: &Entity, derived: &Entity) -> Self {
        Self::new(RelationshipKind::Inheritance, base, derived)
    }

    /// `kind` must be [`RelationshipKind::Aggregation`] or [`RelationshipKind::Composition`]
    pub fn aggregation(owner: &Entity, owned: &Entity, kind: RelationshipKind, count: usize) -> Self {
        debug_assert!(matches!(
            kind,
            RelationshipKind::Aggregation | RelationshipKind::Composition
        ));
        Self {
            count,
            ..Self::new(kind, owner, owned)
        }
    }

    pub fn dependency(used: &Entity, user: &Entity) -> Self {
        Self::new(RelationshipKind::Dependency, used, user)
    }

    pub fn nesting(outer: &Entity, inner: &Entity) -> Self {
        Self::new(RelationshipKind::Nesting, outer, inner)
    }

    /// Ordering key: parent name, child name, kind name, then the
    /// namespaces of both ends to separate same-named entities
    pub fn sort_key(&self) -> (&str, &str, &'static str, &str, &str) {
        (
            &self.parent.name,
            &self.child.name,
            self.kind.as_str(),
            &self.parent.namespace,
            &self.child.namespace,
        )
    }

    fn link(&self) -> String {
        let is_owning = matches!(
            self.kind,
            RelationshipKind::Aggregation | RelationshipKind::Composition
        );
        if is_owning && self.count != 1 {
            format!("\"{}\" {}", self.count, self.kind.arrow())
        } else {
            self.kind.arrow().to_string()
        }
    }
}

impl Render for Relationship {
    fn render(&self) -> String {
        format!(
            "{} {} {}\n",
            self.parent.link_name(),
            self.link(),
            self.child.link_name()
        )
    }
}
