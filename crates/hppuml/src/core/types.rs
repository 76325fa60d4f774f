//! Core types shared by the header parser and the diagram model

use std::fmt;
use std::str::FromStr;

/// Member access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Public,    // +
    Private,   // -
    Protected, // #
}

impl Scope {
    /// Iteration order used when collecting members
    pub const ALL: [Scope; 3] = [Scope::Public, Scope::Private, Scope::Protected];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Public => "public",
            Scope::Private => "private",
            Scope::Protected => "protected",
        }
    }

    /// PlantUML visibility marker
    pub fn to_char(self) -> char {
        match self {
            Scope::Public => '+',
            Scope::Private => '-',
            Scope::Protected => '#',
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "public" => Some(Scope::Public),
            "private" => Some(Scope::Private),
            "protected" => Some(Scope::Protected),
            _ => None,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Private
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration kind of a diagram entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerKind {
    Class,
    Struct,
    Union,
    Enum,
}

impl ContainerKind {
    /// Keyword as written in C++ source
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerKind::Class => "class",
            ContainerKind::Struct => "struct",
            ContainerKind::Union => "union",
            ContainerKind::Enum => "enum",
        }
    }

    /// Keyword used in the diagram header line
    ///
    /// PlantUML has no struct or union, both are drawn as classes.
    pub fn diagram_keyword(self) -> &'static str {
        match self {
            ContainerKind::Class | ContainerKind::Struct | ContainerKind::Union => "class",
            ContainerKind::Enum => "enum",
        }
    }

    /// Access level members get before any access specifier
    pub fn default_scope(self) -> Scope {
        match self {
            ContainerKind::Class => Scope::Private,
            ContainerKind::Struct | ContainerKind::Union | ContainerKind::Enum => Scope::Public,
        }
    }
}

impl FromStr for ContainerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "class" => Ok(ContainerKind::Class),
            "struct" => Ok(ContainerKind::Struct),
            "union" => Ok(ContainerKind::Union),
            "enum" => Ok(ContainerKind::Enum),
            _ => Err(format!("Unknown container kind: {}", s)),
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
