//! Declaration tree produced by the header parser
//!
//! These types mirror what a C++ header declares, not how it is drawn:
//! type strings are kept as written (modulo whitespace) and members stay
//! partitioned by access level.

use crate::core::{ContainerKind, Scope};

/// Items partitioned by access level, each list in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedLists<T> {
    pub public: Vec<T>,
    pub private: Vec<T>,
    pub protected: Vec<T>,
}

impl<T> ScopedLists<T> {
    pub fn new() -> Self {
        Self {
            public: Vec::new(),
            private: Vec::new(),
            protected: Vec::new(),
        }
    }

    pub fn get(&self, scope: Scope) -> &[T] {
        match scope {
            Scope::Public => &self.public,
            Scope::Private => &self.private,
            Scope::Protected => &self.protected,
        }
    }

    pub fn push(&mut self, scope: Scope, item: T) {
        match scope {
            Scope::Public => self.public.push(item),
            Scope::Private => self.private.push(item),
            Scope::Protected => self.protected.push(item),
        }
    }

    /// Iterate over all items with their scope, in [`Scope::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (Scope, &T)> {
        Scope::ALL
            .into_iter()
            .flat_map(move |scope| self.get(scope).iter().map(move |item| (scope, item)))
    }

    pub fn len(&self) -> usize {
        self.public.len() + self.private.len() + self.protected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ScopedLists<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Link from a nested declaration to the type that encloses it
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRef {
    /// Name of the enclosing type (itself `Outer::Inner` when nested)
    pub name: String,
    /// Raw lexical scope of the enclosing type
    pub namespace: String,
    pub parent: Option<Box<ParentRef>>,
}

impl ParentRef {
    /// Follow the chain up to the type with no enclosing type
    pub fn outermost(&self) -> &ParentRef {
        let mut current = self;
        while let Some(next) = current.parent.as_deref() {
            current = next;
        }
        current
    }
}

/// A base class in an inheritance list
#[derive(Debug, Clone, PartialEq)]
pub struct InheritDecl {
    /// Base class as written, template arguments included
    pub class: String,
    pub access: Scope,
    pub is_virtual: bool,
}

/// A data member
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub type_name: String,
    pub is_static: bool,
    pub is_array: bool,
}

/// A method parameter; `name` is empty for unnamed parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub type_name: String,
    pub name: String,
}

/// A member function
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodDecl {
    /// Function name; destructors are stored without the `~`
    pub name: String,
    /// Return type without a trailing `*` or `&`; empty for constructors
    pub returns: String,
    pub returns_pointer: bool,
    pub returns_reference: bool,
    pub parameters: Vec<ParamDecl>,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_const: bool,
    pub is_destructor: bool,
    pub is_deleted: bool,
    pub template: Option<String>,
}

/// One enumerator
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDecl {
    pub name: String,
    /// Initializer text, when one is written
    pub value: Option<String>,
}

/// An enum definition
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    /// `None` for anonymous enums
    pub name: Option<String>,
    pub namespace: String,
    pub parent: Option<Box<ParentRef>>,
    pub is_scoped: bool,
    pub values: Vec<EnumValueDecl>,
}

/// A class, struct or union definition
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// Name as declared; nested types are named `Outer::Inner`
    pub name: String,
    pub kind: ContainerKind,
    /// Raw lexical scope: namespaces, then enclosing types for nested ones
    pub namespace: String,
    pub parent: Option<Box<ParentRef>>,
    pub is_abstract: bool,
    /// `template <...>` prefix as written
    pub template: Option<String>,
    pub inherits: Vec<InheritDecl>,
    pub properties: ScopedLists<VariableDecl>,
    pub methods: ScopedLists<MethodDecl>,
    pub enums: ScopedLists<EnumDecl>,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            namespace: String::new(),
            parent: None,
            is_abstract: false,
            template: None,
            inherits: Vec::new(),
            properties: ScopedLists::new(),
            methods: ScopedLists::new(),
            enums: ScopedLists::new(),
        }
    }

    /// Reference used as the `parent` of declarations nested in this one
    pub fn as_parent(&self) -> ParentRef {
        ParentRef {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            parent: self.parent.clone(),
        }
    }
}

/// Everything declared in one source unit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedHeader {
    /// Classes, structs and unions, nested ones included
    pub classes: Vec<ClassDecl>,
    /// Enums declared at namespace scope; class-nested enums live in
    /// [`ClassDecl::enums`]
    pub enums: Vec<EnumDecl>,
}

impl ParsedHeader {
    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| c.name == name)
    }
}
