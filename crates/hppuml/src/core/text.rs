//! Shared text utilities for C++ type strings and diagram output
//!
//! The normalizers are pure string rewrites; they never inspect the
//! meaning of a type, only its spelling.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\s)+").unwrap());
static SPACE_BEFORE_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ ]+([*&])").unwrap());
static SPACE_AROUND_ANGLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([<>])\s*").unwrap());
static TRAILING_TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.+)<[^>]+>").unwrap());
static TEMPLATE_BRACKETS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([^>]+)>").unwrap());
static TRAILING_COLONS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":+$").unwrap());
static LINE_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\r)?\n").unwrap());
static ANY_WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TEMPLATE_ARGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*>").unwrap());

/// Normalize the spelling of a C++ type
///
/// Whitespace runs collapse to their last character, spaces before `*`
/// and `&` are removed, and whitespace around `<` and `>` is removed.
///
/// # Example
/// ```
/// use hppuml::core::normalize_type;
///
/// assert_eq!(normalize_type("const  std::vector < int > &"), "const std::vector<int>&");
/// ```
pub fn normalize_type(type_str: &str) -> String {
    let collapsed = WHITESPACE_RUN_RE.replace_all(type_str, "$1");
    let attached = SPACE_BEFORE_REF_RE.replace_all(&collapsed, "$1");
    SPACE_AROUND_ANGLE_RE.replace_all(&attached, "$1").into_owned()
}

/// Normalize a namespace path
///
/// Drops the last template argument block, unwraps any remaining angle
/// brackets, then strips trailing colons.
///
/// # Example
/// ```
/// use hppuml::core::normalize_namespace;
///
/// assert_eq!(normalize_namespace("Interface::"), "Interface");
/// assert_eq!(normalize_namespace("Outer<T>::"), "Outer");
/// ```
pub fn normalize_namespace(ns_str: &str) -> String {
    let without_args = TRAILING_TEMPLATE_RE.replace_all(ns_str, "$1");
    let unwrapped = TEMPLATE_BRACKETS_RE.replace_all(&without_args, "$1");
    TRAILING_COLONS_RE.replace_all(&unwrapped, "").into_owned()
}

/// Fold multi-line text onto one line with single spaces
pub fn single_line(input: &str) -> String {
    let joined = LINE_BREAK_RE.replace_all(input, " ");
    ANY_WHITESPACE_RE.replace_all(&joined, " ").into_owned()
}

/// Wrap rendered text in a `namespace <name> { ... }` block
///
/// Every non-empty line is indented by one tab.
pub fn wrap_namespace(input: &str, namespace: &str) -> String {
    let body = input
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("\t{}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("namespace {} {{\n{}\n}}\n", namespace, body)
}

/// Convert a `::`-separated namespace into the dotted form used in links
///
/// # Example
/// ```
/// use hppuml::core::namespace_link_name;
///
/// assert_eq!(namespace_link_name("first_ns::second_ns"), "first_ns.second_ns");
/// ```
pub fn namespace_link_name(namespace: &str) -> String {
    namespace.split("::").collect::<Vec<_>>().join(".")
}

/// Remove template arguments from a type name: `Base<T, U>` becomes `Base`
pub fn strip_template_args(name: &str) -> String {
    TEMPLATE_ARGS_RE.replace_all(name, "").into_owned()
}

/// Turn a declared name into a diagram identifier
///
/// `-` becomes `_` and angle brackets are dropped, so anonymous names like
/// `<anon-struct-1>` render as `anon_struct_1`.
pub fn entity_name(name: &str) -> String {
    name.replace('-', "_").replace(['<', '>'], "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_pointer_and_reference() {
        assert_eq!(normalize_type("int *"), "int*");
        assert_eq!(normalize_type("int   &"), "int&");
        assert_eq!(normalize_type("const Class01 &"), "const Class01&");
    }

    #[test]
    fn test_normalize_template_arguments() {
        assert_eq!(normalize_type("list < Class02 >"), "list<Class02>");
        assert_eq!(normalize_type("map<int, vector<T> >"), "map<int, vector<T>>");
    }

    #[test]
    fn test_normalize_keeps_last_whitespace_character() {
        assert_eq!(normalize_type("unsigned\n\tint"), "unsigned\tint");
    }

    #[test]
    fn test_normalize_namespace() {
        assert_eq!(normalize_namespace(""), "");
        assert_eq!(normalize_namespace("Interface"), "Interface");
        assert_eq!(normalize_namespace("a::b::"), "a::b");
        assert_eq!(normalize_namespace("Outer<int>"), "Outer");
        assert_eq!(normalize_namespace("<anon>::"), "anon");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(
            single_line("template <typename T,\r\n          typename U>"),
            "template <typename T, typename U>"
        );
    }

    #[test]
    fn test_wrap_namespace() {
        let wrapped = wrap_namespace("class A {\n}\n\nclass B {\n}\n", "ns");
        assert_eq!(
            wrapped,
            "namespace ns {\n\tclass A {\n\t}\n\n\tclass B {\n\t}\n}\n"
        );
    }

    #[test]
    fn test_namespace_link_name() {
        assert_eq!(namespace_link_name("Interface"), "Interface");
        assert_eq!(namespace_link_name("a::b::c"), "a.b.c");
    }

    proptest! {
        #[test]
        fn normalize_type_is_idempotent(input in "[ \t\na-zA-Z0-9_:<>*&,]{0,40}") {
            let once = normalize_type(&input);
            prop_assert_eq!(normalize_type(&once), once);
        }

        #[test]
        fn single_line_has_no_line_breaks(input in "[ \r\na-z<>]{0,40}") {
            let folded = single_line(&input);
            prop_assert!(!folded.contains('\n'));
            prop_assert!(!folded.contains("  "));
        }
    }

    #[test]
    fn test_strip_template_args() {
        assert_eq!(strip_template_args("Base<T>"), "Base");
        assert_eq!(strip_template_args("ns::Base<map<K, V>>"), "ns::Base");
        assert_eq!(strip_template_args("Plain"), "Plain");
    }

    #[test]
    fn test_entity_name() {
        assert_eq!(entity_name("<anon-struct-1>"), "anon_struct_1");
        assert_eq!(entity_name("Outer::<anon-union-2>"), "Outer::anon_union_2");
        assert_eq!(entity_name("Vec<int>"), "Vecint");
    }
}
