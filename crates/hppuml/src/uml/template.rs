//! Template-driven diagram output using minijinja
//!
//! The renderer hands the namespace tree and the relationship lists to a
//! Jinja template. Every value in those lists is an object with a
//! `render()` method and a few read-only attributes.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::value::{Object, Value};
use minijinja::{context, Environment, Error, ErrorKind, State};
use tracing::{debug, trace};

use crate::core::{DiagramError, Render, Result};

use super::entity::Entity;
use super::namespace::{NamespaceItem, NamespaceNode};
use super::relationship::Relationship;

/// Name of the built-in template
pub const DEFAULT_TEMPLATE_NAME: &str = "default.puml";

const DEFAULT_TEMPLATE: &str = include_str!("../../templates/default.puml");

/// Everything a template receives
#[derive(Debug)]
pub struct RenderContext<'a> {
    pub objects: &'a [NamespaceItem<'a>],
    pub inheritance_list: &'a [Relationship],
    pub aggregation_list: &'a [Relationship],
    pub dependency_list: &'a [Relationship],
    pub nesting_list: &'a [Relationship],
    pub flag_dep: bool,
}

/// Template environment with an optional override directory
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
    template_name: String,
}

impl TemplateRenderer {
    /// Renderer for the built-in template
    pub fn new() -> Self {
        Self::build(None, DEFAULT_TEMPLATE_NAME.to_string())
    }

    /// Renderer for a template file
    ///
    /// The file's directory is searched before the built-in templates, so
    /// the file may `{% extends "default.puml" %}` and override its blocks.
    pub fn with_template_file(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DiagramError::template_not_found(path.display().to_string()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(Self::build(Some(dir), name.to_string()))
    }

    fn build(override_dir: Option<PathBuf>, template_name: String) -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_loader(move |name| load_template(override_dir.as_deref(), name));
        Self { env, template_name }
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Render the diagram text
    pub fn render(&self, input: &RenderContext<'_>) -> Result<String> {
        let template = self.env.get_template(&self.template_name).map_err(|err| {
            if err.kind() == ErrorKind::TemplateNotFound {
                DiagramError::template_not_found(self.template_name.as_str())
            } else {
                DiagramError::from(err)
            }
        })?;
        debug!(template = %self.template_name, "Loaded template");

        let ctx = context! {
            objects => input.objects.iter().map(item_value).collect::<Vec<_>>(),
            inheritance_list => relationship_values(input.inheritance_list),
            aggregation_list => relationship_values(input.aggregation_list),
            dependency_list => relationship_values(input.dependency_list),
            nesting_list => relationship_values(input.nesting_list),
            flag_dep => input.flag_dep,
        };
        Ok(template.render(ctx)?)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Search the override directory, then the built-in templates
fn load_template(override_dir: Option<&Path>, name: &str) -> std::result::Result<Option<String>, Error> {
    if let Some(dir) = override_dir {
        let candidate = dir.join(name);
        if candidate.is_file() {
            trace!(path = %candidate.display(), "Loading template from override directory");
            return fs::read_to_string(&candidate).map(Some).map_err(|err| {
                Error::new(
                    ErrorKind::InvalidOperation,
                    format!("could not read template {}", candidate.display()),
                )
                .with_source(err)
            });
        }
    }
    Ok((name == DEFAULT_TEMPLATE_NAME).then(|| DEFAULT_TEMPLATE.to_string()))
}

/// A rendered diagram element as seen from a template
#[derive(Debug)]
struct TemplateObject {
    rendered: String,
    attributes: BTreeMap<&'static str, Value>,
}

impl Object for TemplateObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.attributes.get(key.as_str()?).cloned()
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> std::result::Result<Value, Error> {
        match method {
            "render" if args.is_empty() => Ok(Value::from(self.rendered.clone())),
            "render" => Err(Error::new(
                ErrorKind::TooManyArguments,
                "render() takes no arguments",
            )),
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("diagram object has no method named {}", method),
            )),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

fn object_value(rendered: String, attributes: BTreeMap<&'static str, Value>) -> Value {
    Value::from_object(TemplateObject {
        rendered,
        attributes,
    })
}

fn optional(value: Option<&str>) -> Value {
    value.map_or(Value::from(()), Value::from)
}

fn entity_value(entity: &Entity) -> Value {
    let mut attributes = BTreeMap::new();
    attributes.insert("name", Value::from(entity.name()));
    attributes.insert("kind", Value::from(entity.kind().as_str()));
    attributes.insert("namespace", Value::from(entity.namespace()));
    attributes.insert("parent", optional(entity.parent_name()));
    if let Some(class) = entity.as_class() {
        attributes.insert("abstract", Value::from(class.is_abstract));
        attributes.insert("template", optional(class.template.as_deref()));
    }
    let members: Vec<Value> = entity
        .members()
        .iter()
        .map(|m| Value::from(m.render()))
        .collect();
    attributes.insert("members", Value::from(members));
    object_value(entity.render(), attributes)
}

fn namespace_value(node: &NamespaceNode<'_>) -> Value {
    let mut attributes = BTreeMap::new();
    attributes.insert("name", Value::from(node.name()));
    attributes.insert("kind", Value::from("namespace"));
    attributes.insert("namespace", Value::from(node.path.as_str()));
    let items: Vec<Value> = node.items.iter().map(item_value).collect();
    attributes.insert("items", Value::from(items));
    object_value(node.render(), attributes)
}

fn item_value(item: &NamespaceItem<'_>) -> Value {
    match item {
        NamespaceItem::Entity(entity) => entity_value(entity),
        NamespaceItem::Namespace(node) => namespace_value(node),
    }
}

fn relationship_values(list: &[Relationship]) -> Vec<Value> {
    list.iter()
        .map(|rel| {
            let mut attributes = BTreeMap::new();
            attributes.insert("kind", Value::from(rel.kind.as_str()));
            attributes.insert("parent", Value::from(rel.parent.name.as_str()));
            attributes.insert("child", Value::from(rel.child.name.as_str()));
            attributes.insert("parent_namespace", Value::from(rel.parent.namespace.as_str()));
            attributes.insert("child_namespace", Value::from(rel.child.namespace.as_str()));
            attributes.insert("count", Value::from(rel.count));
            object_value(rel.render(), attributes)
        })
        .collect()
}
