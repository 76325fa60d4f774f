//! hppuml - Convert C++ header files to PlantUML class diagrams
//!
//! A library for parsing C++ class, struct, union and enum declarations and
//! rendering them, with the relationships between them, as PlantUML.
//!
//! # Quick Start
//!
//! ```rust
//! use hppuml::render;
//!
//! let uml = render("class A {}; class B : public A {};").unwrap();
//! assert!(uml.contains("A <|-- B"));
//! ```
//!
//! # Advanced Usage
//!
//! For more control, drive a [`Diagram`](uml::Diagram) directly:
//!
//! ```rust
//! use hppuml::prelude::*;
//!
//! let mut diagram = Diagram::with_config(DiagramConfig::default().with_dependency(true));
//! diagram.add_from_string("class Engine {};").unwrap();
//! diagram.add_from_string("class Car { Engine* engine; void swap(Engine e); };").unwrap();
//!
//! // Sources added one at a time need an explicit rebuild
//! diagram.build_relationship_lists();
//! diagram.sort();
//!
//! assert_eq!(diagram.aggregation_list().len(), 1);
//! assert_eq!(diagram.dependency_list().len(), 1);
//! let uml = diagram.render().unwrap();
//! assert!(uml.starts_with("@startuml"));
//! ```

pub mod core;
pub mod header;
pub mod uml;

pub use core::*;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, span, warn, Level};

use crate::uml::{Diagram, DiagramConfig};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{ContainerKind, DiagramError, Render, Scope};
    pub use crate::header::{HeaderParser, ParsedHeader, SourceKind};
    pub use crate::uml::{
        Diagram, DiagramConfig, Entity, Member, Relationship, RelationshipKind,
        TemplateRenderer,
    };
}

/// Render C++ header source text as a PlantUML diagram
///
/// Uses the built-in template with dependency links disabled.
///
/// # Example
/// ```rust
/// use hppuml::render;
///
/// let uml = render("enum Color { RED, GREEN };").unwrap();
/// assert!(uml.contains("enum Color {\n\tRED\n\tGREEN\n}\n"));
/// ```
pub fn render(source: &str) -> Result<String> {
    let mut diagram = Diagram::new();
    diagram.create_from_string(source)?;
    diagram.render()
}

/// Expand glob patterns into the list of matching files
///
/// Patterns that match nothing contribute nothing. Paths are returned
/// sorted with duplicates removed.
pub fn expand_file_list<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = glob::glob(pattern)
            .map_err(|err| DiagramError::pattern_error(pattern, err.msg.to_string()))?;
        for entry in paths {
            files.push(entry.map_err(io::Error::from)?);
        }
    }
    files.sort();
    files.dedup();
    debug!(patterns = patterns.len(), files = files.len(), "Expanded input patterns");
    Ok(files)
}

/// Build a diagram from every file matching `patterns` and render it
pub fn render_files<S: AsRef<str>>(patterns: &[S], config: DiagramConfig) -> Result<String> {
    let files = expand_file_list(patterns)?;
    if files.is_empty() {
        warn!("No input file matched the given patterns");
    }
    let mut diagram = Diagram::with_config(config);
    diagram.create_from_file_list(&files)?;
    diagram.render()
}

/// Render the files matching `patterns` to `output`, or to stdout
pub fn create_plantuml_file<S: AsRef<str>>(
    patterns: &[S],
    output: Option<&Path>,
    config: DiagramConfig,
) -> Result<()> {
    let create_span = span!(Level::INFO, "create_plantuml_file", patterns = patterns.len());
    let _enter = create_span.enter();

    let uml = render_files(patterns, config)?;
    match output {
        Some(path) => {
            fs::write(path, &uml)?;
            info!(path = %path.display(), bytes = uml.len(), "Wrote diagram");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(uml.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
