//! Entity members: variables, methods and enum values

use crate::core::{normalize_type, Render, Scope};
use crate::header::{EnumValueDecl, MethodDecl, VariableDecl};

/// A data member
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Normalized type; array members carry a trailing `[]`
    pub type_name: String,
    pub scope: Scope,
    pub is_static: bool,
}

impl Variable {
    pub fn from_decl(decl: &VariableDecl, scope: Scope) -> Self {
        let mut type_name = normalize_type(&decl.type_name);
        if decl.is_array {
            type_name.push_str("[]");
        }
        Self {
            name: decl.name.clone(),
            type_name,
            scope,
            is_static: decl.is_static,
        }
    }
}

/// A method parameter as drawn in a signature
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub type_name: String,
    pub name: String,
}

impl Parameter {
    fn signature(&self) -> String {
        format!("{} {}", self.type_name, self.name).trim().to_string()
    }
}

/// A member function
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Method name; destructors carry their `~`
    pub name: String,
    /// Return type with `*`/`&` appended; empty for constructors and destructors
    pub return_type: String,
    pub parameters: Vec<Parameter>,
    pub scope: Scope,
    pub is_static: bool,
    pub is_abstract: bool,
    pub is_const: bool,
    pub is_destructor: bool,
}

impl Method {
    pub fn from_decl(decl: &MethodDecl, scope: Scope) -> Self {
        let mut return_type = normalize_type(&decl.returns);
        if decl.returns_pointer {
            return_type.push('*');
        } else if decl.returns_reference {
            return_type.push('&');
        }

        let name = if decl.is_destructor {
            format!("~{}", decl.name)
        } else {
            decl.name.clone()
        };

        Self {
            name,
            return_type,
            parameters: decl
                .parameters
                .iter()
                .map(|p| Parameter {
                    type_name: normalize_type(&p.type_name),
                    name: p.name.clone(),
                })
                .collect(),
            scope,
            // A static member function can never be pure virtual
            is_static: decl.is_static && !decl.is_pure_virtual,
            is_abstract: decl.is_pure_virtual,
            is_const: decl.is_const,
            is_destructor: decl.is_destructor,
        }
    }

    fn signature(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(Parameter::signature).collect();
        format!(
            "{}{}({})",
            if self.is_abstract { "{abstract} " } else { "" },
            self.name,
            params.join(", ")
        )
    }
}

/// One enumerator
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
}

impl EnumValue {
    pub fn from_decl(decl: &EnumValueDecl) -> Self {
        Self {
            name: decl.name.clone(),
        }
    }
}

/// A member of a diagram entity
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Variable(Variable),
    Method(Method),
    EnumValue(EnumValue),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Variable(v) => &v.name,
            Member::Method(m) => &m.name,
            Member::EnumValue(e) => &e.name,
        }
    }

    /// Variable type or method return type; enum values have none
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Member::Variable(v) => Some(&v.type_name),
            Member::Method(m) => Some(&m.return_type),
            Member::EnumValue(_) => None,
        }
    }

    pub fn scope(&self) -> Option<Scope> {
        match self {
            Member::Variable(v) => Some(v.scope),
            Member::Method(m) => Some(m.scope),
            Member::EnumValue(_) => None,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Member::Variable(v) => v.is_static,
            Member::Method(m) => m.is_static,
            Member::EnumValue(_) => false,
        }
    }

    /// Ordering key: `(type, name)`, or just the name for enum values
    pub fn sort_key(&self) -> (Option<&str>, &str) {
        (self.type_name(), self.name())
    }
}

impl Render for Member {
    fn render(&self) -> String {
        let (scope, name_part, type_name, is_const) = match self {
            Member::EnumValue(e) => return e.name.clone(),
            Member::Variable(v) => (v.scope, v.name.clone(), v.type_name.as_str(), false),
            Member::Method(m) => (m.scope, m.signature(), m.return_type.as_str(), m.is_const),
        };

        let mut out = String::new();
        out.push(scope.to_char());
        if self.is_static() {
            out.push_str("{static} ");
        }
        out.push_str(&name_part);
        if !type_name.is_empty() {
            out.push_str(" : ");
            out.push_str(type_name);
        }
        if is_const {
            out.push_str(" {query}");
        }
        out
    }
}
