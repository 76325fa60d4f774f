//! Diagram entities: classes (including structs and unions) and enums

use crate::core::{
    entity_name, normalize_namespace, single_line, strip_template_args, ContainerKind, Render,
};
use crate::header::{ClassDecl, EnumDecl, ParentRef};

use super::member::{EnumValue, Member, Method, Variable};

/// Name given to enums declared without one
const ANONYMOUS_ENUM_NAME: &str = "empty";

/// Resolve the diagram namespace and enclosing type of a declaration
///
/// A declaration with a parent is nested inside a type: its namespace is
/// taken from the outermost enclosing type and its raw scope is ignored.
fn resolve_scope(name: &str, raw_namespace: &str, parent: Option<&ParentRef>) -> (String, Option<String>) {
    if raw_namespace.is_empty() {
        return (String::new(), None);
    }
    match parent {
        None => (normalize_namespace(raw_namespace), None),
        Some(parent) => {
            let parent_name = name.rsplit_once("::").map(|(outer, _)| outer.to_string());
            let namespace = normalize_namespace(&parent.outermost().namespace);
            (namespace, parent_name)
        }
    }
}

/// A class, struct or union
#[derive(Debug, Clone, PartialEq)]
pub struct ClassEntity {
    pub kind: ContainerKind,
    pub name: String,
    pub namespace: String,
    /// Enclosing type for nested classes
    pub parent_name: Option<String>,
    pub members: Vec<Member>,
    pub is_abstract: bool,
    /// Template prefix folded onto one line
    pub template: Option<String>,
    /// Direct bases, template arguments stripped
    pub base_class_names: Vec<String>,
}

impl ClassEntity {
    pub fn from_decl(decl: &ClassDecl) -> Self {
        let name = entity_name(&decl.name);
        let (namespace, parent_name) = resolve_scope(&name, &decl.namespace, decl.parent.as_deref());

        let mut members: Vec<Member> = decl
            .properties
            .iter()
            .map(|(scope, v)| Member::Variable(Variable::from_decl(v, scope)))
            .collect();
        members.extend(
            decl.methods
                .iter()
                .filter(|(_, m)| !m.is_deleted)
                .map(|(scope, m)| Member::Method(Method::from_decl(m, scope))),
        );

        Self {
            kind: decl.kind,
            name,
            namespace,
            parent_name,
            members,
            is_abstract: decl.is_abstract,
            template: decl.template.as_deref().map(single_line),
            base_class_names: decl
                .inherits
                .iter()
                .map(|base| strip_template_args(&base.class))
                .collect(),
        }
    }

    /// Types of all member variables, in member order
    pub fn variable_types(&self) -> impl Iterator<Item = &str> {
        self.members.iter().filter_map(|m| match m {
            Member::Variable(v) => Some(v.type_name.as_str()),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    fn header_line(&self) -> String {
        let mut line = format!("{} {}", self.kind.diagram_keyword(), self.name);
        if self.is_abstract {
            line.insert_str(0, "abstract ");
        }
        if let Some(template) = &self.template {
            line.push_str(&format!(" <{}>", template));
        }
        line
    }
}

/// An enum
#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntity {
    pub name: String,
    pub namespace: String,
    pub parent_name: Option<String>,
    pub members: Vec<Member>,
}

impl EnumEntity {
    pub fn from_decl(decl: &EnumDecl) -> Self {
        let name = entity_name(decl.name.as_deref().unwrap_or(ANONYMOUS_ENUM_NAME));
        let (namespace, parent_name) = resolve_scope(&name, &decl.namespace, decl.parent.as_deref());
        Self {
            name,
            namespace,
            parent_name,
            members: decl
                .values
                .iter()
                .map(|v| Member::EnumValue(EnumValue::from_decl(v)))
                .collect(),
        }
    }

    /// Build an enum declared inside `outer`, named `Outer::Enum`
    pub fn nested_in(decl: &EnumDecl, outer: &ClassEntity) -> Self {
        let mut entity = Self::from_decl(decl);
        entity.name = format!("{}::{}", outer.name, entity.name);
        entity.namespace = outer.namespace.clone();
        entity.parent_name = Some(outer.name.clone());
        entity
    }
}

/// A diagram entity
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Class(ClassEntity),
    Enum(EnumEntity),
}

impl Entity {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Entity::Class(c) => c.kind,
            Entity::Enum(_) => ContainerKind::Enum,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Class(c) => &c.name,
            Entity::Enum(e) => &e.name,
        }
    }

    /// Namespace, `::`-joined; empty for the global namespace
    pub fn namespace(&self) -> &str {
        match self {
            Entity::Class(c) => &c.namespace,
            Entity::Enum(e) => &e.namespace,
        }
    }

    pub fn parent_name(&self) -> Option<&str> {
        match self {
            Entity::Class(c) => c.parent_name.as_deref(),
            Entity::Enum(e) => e.parent_name.as_deref(),
        }
    }

    pub fn members(&self) -> &[Member] {
        match self {
            Entity::Class(c) => &c.members,
            Entity::Enum(e) => &e.members,
        }
    }

    pub fn as_class(&self) -> Option<&ClassEntity> {
        match self {
            Entity::Class(c) => Some(c),
            Entity::Enum(_) => None,
        }
    }

    /// Name prefixed by the namespace, when there is one
    pub fn qualified_name(&self) -> String {
        if self.namespace().is_empty() {
            self.name().to_string()
        } else {
            format!("{}::{}", self.namespace(), self.name())
        }
    }

    /// Ordering key: declaration keyword, name, then namespace
    pub fn sort_key(&self) -> (&'static str, &str, &str) {
        (self.kind().as_str(), self.name(), self.namespace())
    }

    /// Stable sort of the member list by [`Member::sort_key`]
    pub fn sort_members(&mut self) {
        let members = match self {
            Entity::Class(c) => &mut c.members,
            Entity::Enum(e) => &mut e.members,
        };
        members.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }

    fn header_line(&self) -> String {
        match self {
            Entity::Class(c) => c.header_line(),
            Entity::Enum(e) => format!("enum {}", e.name),
        }
    }
}

impl Render for Entity {
    fn render(&self) -> String {
        let mut out = self.header_line();
        out.push_str(" {\n");
        for member in self.members() {
            out.push('\t');
            out.push_str(&member.render());
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Scope;
    use crate::header::{EnumValueDecl, InheritDecl, MethodDecl, VariableDecl};

    fn class_decl(name: &str, kind: ContainerKind) -> ClassDecl {
        ClassDecl::new(name, kind)
    }

    #[test]
    fn test_render_empty_class() {
        let entity = Entity::Class(ClassEntity::from_decl(&class_decl("A", ContainerKind::Class)));
        assert_eq!(entity.render(), "class A {\n}\n");
    }

    #[test]
    fn test_struct_and_union_render_as_class() {
        let s = Entity::Class(ClassEntity::from_decl(&class_decl("S", ContainerKind::Struct)));
        let u = Entity::Class(ClassEntity::from_decl(&class_decl("U", ContainerKind::Union)));
        assert_eq!(s.render(), "class S {\n}\n");
        assert_eq!(u.render(), "class U {\n}\n");
        assert_eq!(s.sort_key(), ("struct", "S", ""));
    }

    #[test]
    fn test_abstract_template_header() {
        let mut decl = class_decl("Test", ContainerKind::Class);
        decl.is_abstract = true;
        decl.template = Some("template <typename T,\n          typename U>".to_string());
        let entity = Entity::Class(ClassEntity::from_decl(&decl));
        assert_eq!(
            entity.render(),
            "abstract class Test <template <typename T, typename U>> {\n}\n"
        );
    }

    #[test]
    fn test_members_skip_deleted_and_follow_scope_order() {
        let mut decl = class_decl("C", ContainerKind::Class);
        decl.properties.push(
            Scope::Protected,
            VariableDecl {
                name: "p".to_string(),
                type_name: "int".to_string(),
                is_static: false,
                is_array: false,
            },
        );
        decl.methods.push(
            Scope::Public,
            MethodDecl {
                name: "operator=".to_string(),
                returns: "C".to_string(),
                returns_reference: true,
                is_deleted: true,
                ..MethodDecl::default()
            },
        );
        decl.methods.push(
            Scope::Public,
            MethodDecl {
                name: "run".to_string(),
                returns: "void".to_string(),
                ..MethodDecl::default()
            },
        );
        let entity = ClassEntity::from_decl(&decl);
        let names: Vec<_> = entity.members.iter().map(Member::name).collect();
        assert_eq!(names, vec!["p", "run"]);
    }

    #[test]
    fn test_base_names_drop_template_arguments() {
        let mut decl = class_decl("D", ContainerKind::Class);
        decl.inherits.push(InheritDecl {
            class: "Base<T, std::vector<T>>".to_string(),
            access: Scope::Public,
            is_virtual: false,
        });
        let entity = ClassEntity::from_decl(&decl);
        assert_eq!(entity.base_class_names, vec!["Base"]);
    }

    #[test]
    fn test_namespace_resolution() {
        let mut decl = class_decl("Class04", ContainerKind::Class);
        decl.namespace = "Interface".to_string();
        let entity = ClassEntity::from_decl(&decl);
        assert_eq!(entity.namespace, "Interface");
        assert_eq!(entity.parent_name, None);

        let mut nested = class_decl("Outer::Inner", ContainerKind::Struct);
        nested.namespace = "ns::Outer".to_string();
        nested.parent = Some(Box::new(ParentRef {
            name: "Outer".to_string(),
            namespace: "ns".to_string(),
            parent: None,
        }));
        let entity = ClassEntity::from_decl(&nested);
        assert_eq!(entity.namespace, "ns");
        assert_eq!(entity.parent_name.as_deref(), Some("Outer"));
    }

    #[test]
    fn test_nested_namespace_matches_enclosing_entity() {
        let mut outer = class_decl("Outer", ContainerKind::Class);
        outer.namespace = "ns::".to_string();
        let mut nested = class_decl("Outer::Inner", ContainerKind::Struct);
        nested.namespace = "ns::Outer::".to_string();
        nested.parent = Some(Box::new(outer.as_parent()));

        let outer = ClassEntity::from_decl(&outer);
        let inner = ClassEntity::from_decl(&nested);
        assert_eq!(inner.namespace, "ns");
        assert_eq!(inner.namespace, outer.namespace);
    }

    #[test]
    fn test_anonymous_names_are_normalized() {
        let mut decl = class_decl("<anon-union-1>::<anon-struct-2>", ContainerKind::Struct);
        decl.namespace = "<anon-union-1>".to_string();
        decl.parent = Some(Box::new(ParentRef {
            name: "<anon-union-1>".to_string(),
            namespace: String::new(),
            parent: None,
        }));
        let entity = ClassEntity::from_decl(&decl);
        assert_eq!(entity.name, "anon_union_1::anon_struct_2");
        assert_eq!(entity.parent_name.as_deref(), Some("anon_union_1"));
        assert_eq!(entity.namespace, "");
    }

    #[test]
    fn test_enum_keeps_declaration_order() {
        let decl = EnumDecl {
            name: Some("Test".to_string()),
            namespace: String::new(),
            parent: None,
            is_scoped: false,
            values: ["A", "B", "CD"]
                .iter()
                .enumerate()
                .map(|(i, v)| EnumValueDecl {
                    name: v.to_string(),
                    value: Some((12 - i).to_string()),
                })
                .collect(),
        };
        let entity = Entity::Enum(EnumEntity::from_decl(&decl));
        assert_eq!(entity.render(), "enum Test {\n\tA\n\tB\n\tCD\n}\n");
    }

    #[test]
    fn test_nested_enum_naming() {
        let mut outer_decl = class_decl("Outer", ContainerKind::Class);
        outer_decl.namespace = "lib".to_string();
        let outer = ClassEntity::from_decl(&outer_decl);

        let decl = EnumDecl {
            name: None,
            namespace: "lib::Outer".to_string(),
            parent: Some(Box::new(outer_decl.as_parent())),
            is_scoped: false,
            values: Vec::new(),
        };
        let nested = EnumEntity::nested_in(&decl, &outer);
        assert_eq!(nested.name, "Outer::empty");
        assert_eq!(nested.namespace, "lib");
        assert_eq!(nested.parent_name.as_deref(), Some("Outer"));
    }

    #[test]
    fn test_qualified_name() {
        let mut decl = class_decl("A", ContainerKind::Class);
        let global = Entity::Class(ClassEntity::from_decl(&decl));
        assert_eq!(global.qualified_name(), "A");

        decl.namespace = "first_ns::second_ns".to_string();
        let scoped = Entity::Class(ClassEntity::from_decl(&decl));
        assert_eq!(scoped.qualified_name(), "first_ns::second_ns::A");
    }
}
