//! Public API scenarios for the diagram engine

use hppuml::prelude::*;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn links(list: &[Relationship]) -> Vec<String> {
    list.iter().map(Render::render).collect()
}

fn from_source(source: &str) -> Diagram {
    let mut diagram = Diagram::new();
    diagram.create_from_string(source).unwrap();
    diagram
}

#[test]
fn test_single_inheritance() {
    let diagram = from_source("class A{}; class B : A{};");
    assert_eq!(links(diagram.inheritance_list()), vec!["A <|-- B\n"]);
    assert_eq!(
        diagram.render().unwrap(),
        "@startuml\n\nclass A {\n}\n\nclass B {\n}\n\nA <|-- B\n\n@enduml\n"
    );
}

#[test]
fn test_member_of_another_class_is_composition() {
    let diagram = from_source("class B{}; class A{B obj;};");
    assert_eq!(links(diagram.aggregation_list()), vec!["A *-- B\n"]);
}

#[test]
fn test_enum_body() {
    let uml = hppuml::render("enum Test { A = 2, B = 1, CD = 0 };").unwrap();
    assert!(uml.contains("enum Test {\n\tA\n\tB\n\tCD\n}\n"));
}

#[test]
fn test_pointer_and_value_members_count_separately() {
    let diagram = from_source("class T {};\nclass Owner {\n  T* first;\n  T* second;\n  T third;\n};");
    assert_eq!(
        links(diagram.aggregation_list()),
        vec!["Owner \"2\" o-- T\n", "Owner *-- T\n"]
    );
}

#[test]
fn test_three_pointer_members_share_one_edge() {
    let diagram = from_source("class T {};\nclass Owner { T* a; T* b; const T* c; };");
    assert_eq!(diagram.aggregation_list().len(), 1);
    let link = &diagram.aggregation_list()[0];
    assert_eq!(link.kind, RelationshipKind::Aggregation);
    assert_eq!(link.count, 3);
    assert_eq!(link.render(), "Owner \"3\" o-- T\n");
}

#[test]
fn test_unknown_types_produce_no_edges() {
    let diagram = from_source(
        "class Widget : public QObject {\n  QString _title;\n  Layout* _layout;\n};",
    );
    assert!(diagram.inheritance_list().is_empty());
    assert!(diagram.aggregation_list().is_empty());
}

#[test]
fn test_full_render_with_namespace_and_nested_enum() {
    let source = r#"
namespace app {
class Engine {
public:
  void Start();
private:
  int _rpm;
};
}
class Car {
public:
  enum Gear { PARK, DRIVE };
  Car();
private:
  app::Engine* _engine;
};
"#;
    let uml = from_source(source).render().unwrap();
    assert_eq!(
        uml,
        concat!(
            "@startuml\n\n",
            "class Car {\n\t+Car()\n\t-_engine : app::Engine*\n}\n\n",
            "enum Car::Gear {\n\tDRIVE\n\tPARK\n}\n\n",
            "namespace app {\n\tclass Engine {\n\t\t-_rpm : int\n\t\t+Start() : void\n\t}\n}\n\n",
            "Car o-- app.Engine\n\n",
            "Car +-- Car::Gear\n\n",
            "@enduml\n",
        )
    );
}

#[test]
fn test_abstract_template_class_header() {
    let uml = hppuml::render(
        "template <typename T>\nclass Repository {\npublic:\n  virtual T* Find(int id) = 0;\n};",
    )
    .unwrap();
    assert!(uml.contains(
        "abstract class Repository <template <typename T>> {\n\t+{abstract} Find(int id) : T*\n}\n"
    ));
}

#[test]
fn test_fixture_relationships() {
    let mut diagram = Diagram::with_config(DiagramConfig::default().with_dependency(true));
    diagram
        .create_from_file_list(&[fixture("vehicles.hpp"), fixture("garage.hpp")])
        .unwrap();

    assert_eq!(
        links(diagram.inheritance_list()),
        vec![
            "garage.Bay <|-- garage.Workshop\n",
            "Vehicle <|-- Car\n",
            "Vehicle <|-- Truck\n",
        ]
    );
    assert_eq!(
        links(diagram.aggregation_list()),
        vec![
            "garage.Bay o-- Vehicle\n",
            "garage.staff.Mechanic o-- garage.Bay\n",
            "Truck \"2\" o-- Car\n",
            "Vehicle *-- Fuel\n",
            "garage.Workshop *-- garage.Bay\n",
            "garage.Workshop *-- garage.staff.Mechanic\n",
        ]
    );
    assert_eq!(
        links(diagram.dependency_list()),
        vec![
            "Car <.. garage.Workshop\n",
            "Fuel <.. Car\n",
            "Truck <.. garage.Workshop\n",
        ]
    );
    assert_eq!(links(diagram.nesting_list()), vec!["Car +-- Car::Seat\n"]);
}

#[test]
fn test_duplicate_class_names_resolve_the_same_in_any_file_order() {
    let files = [fixture("simple_classes_1_2.hpp"), fixture("simple_classes_3.hpp")];
    let config = DiagramConfig::default().with_dependency(true);

    let mut forward = Diagram::with_config(config.clone());
    forward.create_from_file_list(&files).unwrap();
    let mut backward = Diagram::with_config(config);
    backward
        .create_from_file_list(&[files[1].clone(), files[0].clone()])
        .unwrap();

    let inheritance = links(forward.inheritance_list());
    assert!(inheritance.contains(&"Interface.Class04 <|-- Interface.Class04_derived\n".to_string()));
    assert!(inheritance.contains(
        &"Interface.Class04_derived <|-- Interface.NestedNamespace.Class04_ns\n".to_string()
    ));
    assert_eq!(inheritance, links(backward.inheritance_list()));
    assert_eq!(links(forward.aggregation_list()), links(backward.aggregation_list()));
    assert_eq!(links(forward.dependency_list()), links(backward.dependency_list()));
    assert_eq!(forward.render().unwrap(), backward.render().unwrap());
}

#[test]
fn test_fixture_entity_order() {
    let mut diagram = Diagram::new();
    diagram
        .create_from_file_list(&[fixture("garage.hpp"), fixture("vehicles.hpp")])
        .unwrap();

    let keys: Vec<_> = diagram
        .entities()
        .iter()
        .map(|e| format!("{} {}", e.kind(), e.name()))
        .collect();
    assert_eq!(
        keys,
        vec![
            "class Bay",
            "class Car",
            "class Truck",
            "class Vehicle",
            "class Workshop",
            "enum Fuel",
            "enum Shift",
            "struct Car::Seat",
            "struct Mechanic",
            "union Reading",
        ]
    );
}

#[test]
fn test_dependency_flag_controls_template_output() {
    let source = "class Log {};\nclass Job { public: void Run(Log& log); };";

    let plain = from_source(source).render().unwrap();
    assert!(!plain.contains("<.."));

    let mut with_deps = Diagram::with_config(DiagramConfig::default().with_dependency(true));
    with_deps.create_from_string(source).unwrap();
    assert!(with_deps.render().unwrap().contains("Log <.. Job\n"));
}

#[test]
fn test_render_is_idempotent_after_sort() {
    let mut diagram = Diagram::new();
    diagram
        .create_from_file_list(&[fixture("vehicles.hpp"), fixture("garage.hpp")])
        .unwrap();
    let first = diagram.render().unwrap();
    diagram.sort();
    assert_eq!(first, diagram.render().unwrap());
}

#[test]
fn test_anonymous_union_members() {
    let diagram = from_source(
        "union {\n  struct { float x; float y; };\n  struct { float rho; float phi; };\n  float vec[3];\n};",
    );
    let names: Vec<_> = diagram.entities().iter().map(Entity::name).collect();
    assert_eq!(
        names,
        vec![
            "anon_union_1::anon_struct_2",
            "anon_union_1::anon_struct_3",
            "anon_union_1",
        ]
    );
    let uml = diagram.render().unwrap();
    assert!(uml.contains("class anon_union_1 {\n\t+vec : float[]\n}\n"));
    assert_eq!(diagram.nesting_list().len(), 2);
}
