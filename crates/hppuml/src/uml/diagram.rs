//! Diagram engine: ingestion, relationship inference, ordering and output
//!
//! The engine follows a batch pipeline:
//!
//! 1. Parse header sources into declarations ([`HeaderParser`])
//! 2. Turn declarations into [`Entity`] values
//! 3. Infer the four relationship lists from the entity set
//! 4. Sort everything into a deterministic order
//! 5. Hand the namespace tree and relationships to the template renderer
//!
//! `create_from_*` runs steps 1-4 from a clean state. `add_from_*` only
//! runs steps 1-2, so callers batching several sources must finish with
//! [`Diagram::build_relationship_lists`] and [`Diagram::sort`].

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, span, trace, warn, Level};

use crate::core::Result;
use crate::header::{HeaderParser, ParsedHeader};

use super::entity::{ClassEntity, EnumEntity, Entity};
use super::namespace::build_tree;
use super::relationship::{Relationship, RelationshipKind};
use super::template::{RenderContext, TemplateRenderer};

/// Options controlling relationship inference and output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagramConfig {
    /// Infer dependency links from method parameter types
    pub enable_dependency: bool,
    /// Template used instead of the built-in one
    pub template_file: Option<PathBuf>,
}

impl DiagramConfig {
    pub fn with_dependency(mut self, enable: bool) -> Self {
        self.enable_dependency = enable;
        self
    }

    pub fn with_template_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_file = Some(path.into());
        self
    }
}

/// A class diagram built from one or more header sources
#[derive(Debug, Default)]
pub struct Diagram {
    config: DiagramConfig,
    parser: HeaderParser,
    entities: Vec<Entity>,
    inheritance_list: Vec<Relationship>,
    aggregation_list: Vec<Relationship>,
    dependency_list: Vec<Relationship>,
    nesting_list: Vec<Relationship>,
}

impl Diagram {
    /// Empty diagram with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiagramConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DiagramConfig {
        &self.config
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn inheritance_list(&self) -> &[Relationship] {
        &self.inheritance_list
    }

    pub fn aggregation_list(&self) -> &[Relationship] {
        &self.aggregation_list
    }

    pub fn dependency_list(&self) -> &[Relationship] {
        &self.dependency_list
    }

    pub fn nesting_list(&self) -> &[Relationship] {
        &self.nesting_list
    }

    /// Drop all entities and relationships, keeping the configuration
    pub fn clear(&mut self) {
        self.entities.clear();
        self.inheritance_list.clear();
        self.aggregation_list.clear();
        self.dependency_list.clear();
        self.nesting_list.clear();
    }

    /// Build the diagram from a single header file
    pub fn create_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.clear();
        self.add_from_file(path)?;
        self.finish();
        Ok(())
    }

    /// Build the diagram from several header files
    pub fn create_from_file_list<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        self.clear();
        self.add_from_file_list(paths)?;
        self.finish();
        Ok(())
    }

    /// Build the diagram from header source text
    pub fn create_from_string(&mut self, source: &str) -> Result<()> {
        self.clear();
        self.add_from_string(source)?;
        self.finish();
        Ok(())
    }

    /// Build the diagram from several header sources
    pub fn create_from_string_list<S: AsRef<str>>(&mut self, sources: &[S]) -> Result<()> {
        self.clear();
        self.add_from_string_list(sources)?;
        self.finish();
        Ok(())
    }

    /// Add the entities of a header file without rebuilding relationships
    pub fn add_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let ingest_span = span!(Level::INFO, "add_from_file", path = %path.display());
        let _enter = ingest_span.enter();

        let header = self.parser.parse_file(path)?;
        self.ingest(header);
        Ok(())
    }

    pub fn add_from_file_list<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<()> {
        for path in paths {
            self.add_from_file(path)?;
        }
        Ok(())
    }

    /// Add the entities of header source text without rebuilding relationships
    pub fn add_from_string(&mut self, source: &str) -> Result<()> {
        let ingest_span = span!(Level::INFO, "add_from_string", input_len = source.len());
        let _enter = ingest_span.enter();

        let header = self.parser.parse_str(source)?;
        self.ingest(header);
        Ok(())
    }

    pub fn add_from_string_list<S: AsRef<str>>(&mut self, sources: &[S]) -> Result<()> {
        for source in sources {
            self.add_from_string(source.as_ref())?;
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.build_relationship_lists();
        self.sort();
    }

    /// Append entities for every declaration: each class is directly
    /// followed by the enums nested in it, namespace-level enums come last
    fn ingest(&mut self, header: ParsedHeader) {
        let before = self.entities.len();
        for class in &header.classes {
            let entity = ClassEntity::from_decl(class);
            let nested: Vec<Entity> = class
                .enums
                .iter()
                .map(|(_, decl)| Entity::Enum(EnumEntity::nested_in(decl, &entity)))
                .collect();
            self.entities.push(Entity::Class(entity));
            self.entities.extend(nested);
        }
        self.entities.extend(
            header
                .enums
                .iter()
                .map(|decl| Entity::Enum(EnumEntity::from_decl(decl))),
        );
        debug!(
            added = self.entities.len() - before,
            total = self.entities.len(),
            "Ingested entities"
        );
    }

    /// Rebuild the inheritance, aggregation, dependency and nesting lists
    ///
    /// Relationships to types outside the diagram are skipped.
    pub fn build_relationship_lists(&mut self) {
        let build_span = span!(Level::DEBUG, "build_relationship_lists", entities = self.entities.len());
        let _enter = build_span.enter();

        self.inheritance_list = self.build_inheritance_list();
        self.aggregation_list = self.build_aggregation_list();
        self.nesting_list = self.build_nesting_list();
        self.dependency_list = if self.config.enable_dependency {
            self.build_dependency_list()
        } else {
            Vec::new()
        };

        debug!(
            inheritance = self.inheritance_list.len(),
            aggregation = self.aggregation_list.len(),
            dependency = self.dependency_list.len(),
            nesting = self.nesting_list.len(),
            "Built relationship lists"
        );
    }

    /// Resolve a type name referenced from inside the namespace `scope`
    ///
    /// Plain entity names are tried first, then qualified names. When
    /// several entities share the name, the one declared in the closest
    /// enclosing namespace wins, then the lowest namespace and kind.
    fn resolve(&self, name: &str, scope: &str) -> Option<usize> {
        self.closest(scope, |e| e.name() == name).or_else(|| {
            self.closest(scope, |e| !e.namespace().is_empty() && e.qualified_name() == name)
        })
    }

    fn closest(&self, scope: &str, matches: impl Fn(&Entity) -> bool) -> Option<usize> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(_, e)| matches(e))
            .min_by(|(_, a), (_, b)| lookup_key(a, scope).cmp(&lookup_key(b, scope)))
            .map(|(index, _)| index)
    }

    fn build_inheritance_list(&self) -> Vec<Relationship> {
        let mut list = Vec::new();
        for derived in &self.entities {
            let Some(class) = derived.as_class() else {
                continue;
            };
            for base_name in &class.base_class_names {
                match self.resolve(base_name, derived.namespace()) {
                    Some(base) => list.push(Relationship::inheritance(&self.entities[base], derived)),
                    None => trace!(base = %base_name, derived = derived.name(), "Skipping unknown base class"),
                }
            }
        }
        list
    }

    /// Whole-word patterns for every plain and qualified entity name
    fn aggregation_candidates(&self) -> Vec<Candidate> {
        let mut names = BTreeSet::new();
        for entity in &self.entities {
            names.insert(entity.name().to_string());
            if !entity.namespace().is_empty() {
                names.insert(entity.qualified_name());
            }
        }

        names
            .into_iter()
            .filter_map(|name| match Regex::new(&format!(r"\b{}\b", regex::escape(&name))) {
                Ok(pattern) => Some(Candidate {
                    pointer: format!("{}*", name),
                    name,
                    pattern,
                }),
                Err(err) => {
                    warn!(name = %name, error = %err, "Skipping type name with no usable pattern");
                    None
                }
            })
            .collect()
    }

    fn build_aggregation_list(&self) -> Vec<Relationship> {
        let candidates = self.aggregation_candidates();
        let mut counts: BTreeMap<(usize, usize, RelationshipKind), usize> = BTreeMap::new();

        for (owner, entity) in self.entities.iter().enumerate() {
            let Some(class) = entity.as_class() else {
                continue;
            };
            for type_name in class.variable_types() {
                // A variable counts once per owned entity and kind, however
                // many of its names match
                let mut seen = BTreeSet::new();
                for candidate in &candidates {
                    if !candidate.pattern.is_match(type_name) {
                        continue;
                    }
                    let Some(owned) = self.resolve(&candidate.name, entity.namespace()) else {
                        continue;
                    };
                    let kind = if type_name.contains(&candidate.pointer) {
                        RelationshipKind::Aggregation
                    } else {
                        RelationshipKind::Composition
                    };
                    if seen.insert((owned, kind)) {
                        trace!(owner = entity.name(), owned = %candidate.name, %kind, "Matched member type");
                        *counts.entry((owner, owned, kind)).or_insert(0) += 1;
                    }
                }
            }
        }

        counts
            .into_iter()
            .map(|((owner, owned, kind), count)| {
                Relationship::aggregation(&self.entities[owner], &self.entities[owned], kind, count)
            })
            .collect()
    }

    /// One link per method parameter whose type mentions another entity
    ///
    /// Candidates are taken in `(kind, name)` order. Same-named entities
    /// prefer one whose qualified name is spelled out in the parameter,
    /// then the closest enclosing namespace of the using class.
    fn build_dependency_list(&self) -> Vec<Relationship> {
        let mut list = Vec::new();
        for user in &self.entities {
            let Some(class) = user.as_class() else {
                continue;
            };
            for parameter in class.methods().flat_map(|m| m.parameters.iter()) {
                let type_name = parameter.type_name.as_str();
                let used = self
                    .entities
                    .iter()
                    .filter(|candidate| !std::ptr::eq(*candidate, user))
                    .filter(|candidate| type_name.contains(candidate.name()))
                    .min_by(|a, b| {
                        dependency_key(a, type_name, user.namespace())
                            .cmp(&dependency_key(b, type_name, user.namespace()))
                    });
                match used {
                    Some(used) => list.push(Relationship::dependency(used, user)),
                    None => trace!(
                        user = user.name(),
                        parameter = %parameter.type_name,
                        "No entity matches parameter type"
                    ),
                }
            }
        }
        list
    }

    fn build_nesting_list(&self) -> Vec<Relationship> {
        let mut list = Vec::new();
        for inner in &self.entities {
            let Some(parent_name) = inner.parent_name() else {
                continue;
            };
            match self.resolve(parent_name, inner.namespace()) {
                Some(outer) => list.push(Relationship::nesting(&self.entities[outer], inner)),
                None => trace!(parent = parent_name, inner = inner.name(), "Skipping unknown enclosing type"),
            }
        }
        list
    }

    /// Put entities, members and relationships in their canonical order
    pub fn sort(&mut self) {
        self.entities.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        for entity in &mut self.entities {
            entity.sort_members();
        }
        for list in [
            &mut self.inheritance_list,
            &mut self.aggregation_list,
            &mut self.dependency_list,
            &mut self.nesting_list,
        ] {
            list.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        }
    }

    /// Render the diagram through the configured template
    pub fn render(&self) -> Result<String> {
        let render_span = span!(Level::INFO, "render_diagram", entities = self.entities.len());
        let _enter = render_span.enter();

        let renderer = match &self.config.template_file {
            Some(path) => TemplateRenderer::with_template_file(path)?,
            None => TemplateRenderer::new(),
        };

        let objects = build_tree(&self.entities);
        let output = renderer.render(&RenderContext {
            objects: &objects,
            inheritance_list: &self.inheritance_list,
            aggregation_list: &self.aggregation_list,
            dependency_list: &self.dependency_list,
            nesting_list: &self.nesting_list,
            flag_dep: self.config.enable_dependency,
        })?;

        info!(
            template = renderer.template_name(),
            output_len = output.len(),
            "Rendered diagram"
        );
        Ok(output)
    }
}

/// A type name searched for in member variable types
#[derive(Debug)]
struct Candidate {
    name: String,
    pointer: String,
    pattern: Regex,
}

/// Namespaces separating `scope` from an enclosing `namespace`, or
/// `usize::MAX` when `namespace` does not enclose `scope`
fn scope_distance(namespace: &str, scope: &str) -> usize {
    let depth = |ns: &str| if ns.is_empty() { 0 } else { ns.split("::").count() };
    let encloses = namespace.is_empty()
        || namespace == scope
        || scope
            .strip_prefix(namespace)
            .is_some_and(|rest| rest.starts_with("::"));
    if encloses {
        depth(scope) - depth(namespace)
    } else {
        usize::MAX
    }
}

fn lookup_key<'a>(entity: &'a Entity, scope: &str) -> (usize, &'a str, &'static str) {
    (
        scope_distance(entity.namespace(), scope),
        entity.namespace(),
        entity.kind().as_str(),
    )
}

fn dependency_key<'a>(
    entity: &'a Entity,
    type_name: &str,
    scope: &str,
) -> (&'static str, &'a str, bool, usize, &'a str) {
    let spelled_out =
        !entity.namespace().is_empty() && type_name.contains(&entity.qualified_name());
    (
        entity.kind().as_str(),
        entity.name(),
        !spelled_out,
        scope_distance(entity.namespace(), scope),
        entity.namespace(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Render;

    fn diagram(source: &str) -> Diagram {
        let mut diagram = Diagram::new();
        diagram.create_from_string(source).unwrap();
        diagram
    }

    fn rendered(list: &[Relationship]) -> Vec<String> {
        list.iter().map(Render::render).collect()
    }

    #[test]
    fn test_inheritance() {
        let d = diagram("class A{}; class B : A{};");
        assert_eq!(rendered(d.inheritance_list()), vec!["A <|-- B\n"]);
    }

    #[test]
    fn test_unknown_base_is_skipped() {
        let d = diagram("class B : public External {};");
        assert!(d.inheritance_list().is_empty());
        assert_eq!(d.entities().len(), 1);
    }

    #[test]
    fn test_qualified_base_resolves() {
        let d = diagram(
            "namespace ns { class Base {}; }\nclass Derived : public ns::Base {};",
        );
        assert_eq!(rendered(d.inheritance_list()), vec!["ns.Base <|-- Derived\n"]);
    }

    #[test]
    fn test_composition_owner_on_the_left() {
        let d = diagram("class B{}; class A{B obj;};");
        assert_eq!(rendered(d.aggregation_list()), vec!["A *-- B\n"]);
    }

    #[test]
    fn test_aggregation_counts_per_variable() {
        let d = diagram("class T {};\nclass Owner {\n  T* a;\n  T* b;\n  T c;\n};");
        assert_eq!(
            rendered(d.aggregation_list()),
            vec!["Owner \"2\" o-- T\n", "Owner *-- T\n"]
        );
    }

    #[test]
    fn test_whole_word_type_match() {
        let d = diagram("class Foo {};\nclass Bar { FooBar x; Foo* y; };");
        assert_eq!(rendered(d.aggregation_list()), vec!["Bar o-- Foo\n"]);
    }

    #[test]
    fn test_dependency_is_off_by_default() {
        let d = diagram("class A {};\nclass B { public: void use(A a); };");
        assert!(d.dependency_list().is_empty());
    }

    #[test]
    fn test_dependency_when_enabled() {
        let mut d = Diagram::with_config(DiagramConfig::default().with_dependency(true));
        d.create_from_string("class A {};\nclass B { public: void use(const A& a); void self(B* b); };")
            .unwrap();
        assert_eq!(rendered(d.dependency_list()), vec!["A <.. B\n"]);
    }

    #[test]
    fn test_nesting() {
        let d = diagram("class Outer {\npublic:\n  struct Inner { int x; };\n  enum Mode { ON, OFF };\n};");
        assert_eq!(
            rendered(d.nesting_list()),
            vec!["Outer +-- Outer::Inner\n", "Outer +-- Outer::Mode\n"]
        );
    }

    #[test]
    fn test_nested_enum_follows_its_class() {
        let mut d = Diagram::new();
        d.add_from_string("class Outer { enum Mode { ON }; };\nenum Top { X };").unwrap();
        let names: Vec<_> = d.entities().iter().map(Entity::name).collect();
        assert_eq!(names, vec!["Outer", "Outer::Mode", "Top"]);
    }

    #[test]
    fn test_add_does_not_build_relationships() {
        let mut d = Diagram::new();
        d.add_from_string("class A{}; class B : A{};").unwrap();
        assert!(d.inheritance_list().is_empty());
        d.build_relationship_lists();
        assert_eq!(d.inheritance_list().len(), 1);
    }

    #[test]
    fn test_create_clears_previous_content() {
        let mut d = diagram("class A {};");
        d.create_from_string("class B {};").unwrap();
        let names: Vec<_> = d.entities().iter().map(Entity::name).collect();
        assert_eq!(names, vec!["B"]);
    }

    #[test]
    fn test_sort_orders_by_kind_then_name() {
        let d = diagram("struct S {};\nenum E { V };\nclass B {};\nclass A {};");
        let names: Vec<_> = d.entities().iter().map(Entity::name).collect();
        assert_eq!(names, vec!["A", "B", "E", "S"]);
    }

    #[test]
    fn test_same_name_prefers_enclosing_namespace() {
        let d = diagram("class T {};\nnamespace a {\nclass T {};\nclass D : public T { T value; };\n}");
        assert_eq!(rendered(d.inheritance_list()), vec!["a.T <|-- a.D\n"]);
        assert_eq!(rendered(d.aggregation_list()), vec!["a.D *-- a.T\n"]);
    }

    #[test]
    fn test_same_name_resolution_ignores_ingestion_order() {
        let first = "namespace a { class T {}; }";
        let second = "namespace b { class T {}; }";
        let user = "class U { a::T x; };\nclass D : public T {};";

        let mut forward = Diagram::new();
        forward.create_from_string_list(&[first, second, user]).unwrap();
        let mut backward = Diagram::new();
        backward.create_from_string_list(&[second, first, user]).unwrap();

        for d in [&forward, &backward] {
            assert_eq!(rendered(d.inheritance_list()), vec!["a.T <|-- D\n"]);
            assert_eq!(rendered(d.aggregation_list()), vec!["U *-- a.T\n"]);
        }
        assert_eq!(forward.render().unwrap(), backward.render().unwrap());
    }

    #[test]
    fn test_dependency_prefers_spelled_out_namespace() {
        let mut d = Diagram::with_config(DiagramConfig::default().with_dependency(true));
        d.create_from_string(
            "class Key {};\nnamespace db { class Key {}; }\nclass Store { public: void Put(db::Key k); void Get(Key k); };",
        )
        .unwrap();
        assert_eq!(
            rendered(d.dependency_list()),
            vec!["Key <.. Store\n", "db.Key <.. Store\n"]
        );
    }

    #[test]
    fn test_scope_distance() {
        assert_eq!(scope_distance("", ""), 0);
        assert_eq!(scope_distance("a", "a"), 0);
        assert_eq!(scope_distance("a", "a::b"), 1);
        assert_eq!(scope_distance("", "a::b"), 2);
        assert_eq!(scope_distance("a", "ab::c"), usize::MAX);
        assert_eq!(scope_distance("b", "a"), usize::MAX);
    }

    #[test]
    fn test_clear() {
        let mut d = diagram("class A{}; class B : A{};");
        d.clear();
        assert!(d.entities().is_empty());
        assert!(d.inheritance_list().is_empty());
    }

    #[test]
    fn test_render_is_repeatable() {
        let d = diagram("namespace ns { class A { int x; }; }\nclass B : public ns::A {};");
        let first = d.render().unwrap();
        assert_eq!(first, d.render().unwrap());
        assert!(first.contains("namespace ns {\n\tclass A {\n\t\t-x : int\n\t}\n}\n"));
    }

    #[test]
    fn test_parse_error_propagates() {
        let mut d = Diagram::new();
        let result = d.create_from_string("class A {");
        assert!(matches!(result, Err(crate::core::DiagramError::ParseError { .. })));
    }
}
