//! Class diagram model and rendering
//!
//! Entities and members, the relationships inferred between them, the
//! namespace tree used for layout, and the [`Diagram`] engine tying them
//! to the template renderer.

mod diagram;
mod entity;
mod member;
mod namespace;
mod relationship;
mod template;

pub use diagram::{Diagram, DiagramConfig};
pub use entity::{ClassEntity, EnumEntity, Entity};
pub use member::{EnumValue, Member, Method, Parameter, Variable};
pub use namespace::{build_tree, NamespaceItem, NamespaceNode};
pub use relationship::{Endpoint, Relationship, RelationshipKind};
pub use template::{RenderContext, TemplateRenderer, DEFAULT_TEMPLATE_NAME};
