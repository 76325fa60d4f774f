//! Every ingestion path over the same headers renders the same diagram

use std::fs;
use std::path::PathBuf;

use hppuml::uml::{Diagram, DiagramConfig};
use proptest::prelude::*;

const FIXTURES: &[&str] = &["vehicles.hpp", "garage.hpp"];

fn fixture_paths() -> Vec<PathBuf> {
    FIXTURES
        .iter()
        .map(|name| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("tests/fixtures")
                .join(name)
        })
        .collect()
}

fn config() -> DiagramConfig {
    DiagramConfig::default().with_dependency(true)
}

fn render_file_list() -> String {
    let mut diagram = Diagram::with_config(config());
    diagram.create_from_file_list(&fixture_paths()).unwrap();
    diagram.render().unwrap()
}

#[test]
fn test_add_from_file_matches_create() {
    let mut diagram = Diagram::with_config(config());
    for path in fixture_paths() {
        diagram.add_from_file(&path).unwrap();
    }
    diagram.build_relationship_lists();
    diagram.sort();
    assert_eq!(diagram.render().unwrap(), render_file_list());
}

#[test]
fn test_string_list_matches_file_list() {
    let sources: Vec<String> = fixture_paths()
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    let mut diagram = Diagram::with_config(config());
    diagram.create_from_string_list(&sources).unwrap();
    assert_eq!(diagram.render().unwrap(), render_file_list());
}

#[test]
fn test_add_from_string_list_matches_create() {
    let sources: Vec<String> = fixture_paths()
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    let mut diagram = Diagram::with_config(config());
    diagram.add_from_string_list(&sources).unwrap();
    diagram.build_relationship_lists();
    diagram.sort();
    assert_eq!(diagram.render().unwrap(), render_file_list());
}

#[test]
fn test_single_file_matches_single_string() {
    let path = &fixture_paths()[0];
    let mut from_file = Diagram::new();
    from_file.create_from_file(path).unwrap();
    let mut from_string = Diagram::new();
    from_string
        .create_from_string(&fs::read_to_string(path).unwrap())
        .unwrap();
    assert_eq!(from_file.render().unwrap(), from_string.render().unwrap());
}

const SNIPPETS: &[&str] = &[
    "class Node { Node* next; Payload value; };",
    "struct Payload { int size; };",
    "enum Color { RED, GREEN };",
    "namespace io { class Reader { public: void Read(Payload& p); }; }",
    "class Tree : public Node { Node* root; Color tint; };",
    "namespace io { class BufferedReader : public io::Reader { char buf[64]; }; }",
    "namespace io { struct Payload { int id; }; }",
    "namespace net { class Reader : public Node { Payload* last; }; }",
];

proptest! {
    #[test]
    fn prop_ingestion_order_does_not_change_output(
        order in Just((0..SNIPPETS.len()).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let shuffled: Vec<&str> = order.iter().map(|&i| SNIPPETS[i]).collect();

        let mut expected = Diagram::with_config(config());
        expected.create_from_string_list(SNIPPETS).unwrap();

        let mut actual = Diagram::with_config(config());
        actual.create_from_string_list(&shuffled).unwrap();

        prop_assert_eq!(actual.render().unwrap(), expected.render().unwrap());
    }
}
