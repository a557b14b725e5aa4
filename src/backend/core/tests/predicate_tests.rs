//! Predicate compilation against the schema registry.
//!
//! Tests cover:
//! - Match-all and search-only predicates
//! - Adjacency-based OR/AND grouping
//! - Terminal errors for unknown properties, operators and values
//! - Determinism and SQL rendering of the same tree

use tessera_core::filter::{FilterCriterion, FilterError, FilterQuery, Predicate, PredicateCompiler, SqlRenderer};
use tessera_core::schema::{Entity, FieldDescriptor, FieldType, FieldValue, SchemaRegistry};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Person {
    id: Uuid,
    name: String,
    nickname: Option<String>,
    age: i64,
}

impl Person {
    fn new(name: &str, age: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            nickname: None,
            age,
        }
    }
}

impl Entity for Person {
    const NAME: &'static str = "People";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![
            FieldDescriptor::new("Id", FieldType::Uuid, |p: &Person| p.id.into()),
            FieldDescriptor::text("Name", |p: &Person| p.name.as_str().into()),
            FieldDescriptor::text("Nickname", |p: &Person| p.nickname.clone().into()),
            FieldDescriptor::new("Age", FieldType::Integer, |p: &Person| p.age.into()),
        ]
    }

    fn key(&self) -> Uuid {
        self.id
    }
}

/// An entity with no text fields.
struct Reading {
    value: f64,
}

impl Entity for Reading {
    const NAME: &'static str = "Readings";

    fn fields() -> Vec<FieldDescriptor<Self>> {
        vec![FieldDescriptor::new("Value", FieldType::Float, |r: &Reading| r.value.into())]
    }

    fn key(&self) -> Uuid {
        Uuid::nil()
    }
}

fn criterion(property: &str, operator: &str, value: &str) -> FilterCriterion {
    FilterCriterion::new(property, operator, value)
}

fn people() -> Vec<Person> {
    vec![
        Person::new("A", 20),
        Person::new("A", 10),
        Person::new("B", 30),
        Person::new("C", 40),
    ]
}

// ============================================================================
// Match-all and Search
// ============================================================================

#[test]
fn test_empty_input_matches_all() {
    let registry = SchemaRegistry::new();
    let compiled = PredicateCompiler::new(&registry).compile::<Person>(&[], "").unwrap();

    assert!(compiled.predicate().is_match_all());
    assert_eq!(compiled.filter(&people()).count(), 4);
}

#[test]
fn test_empty_search_adds_no_clause() {
    let registry = SchemaRegistry::new();
    let compiler = PredicateCompiler::new(&registry);
    let compiled = compiler
        .compile::<Person>(&[criterion("Age", ">", "18")], "")
        .unwrap();

    assert_eq!(compiled.to_string(), "Age > 18");
}

#[test]
fn test_search_ors_every_text_field() {
    let registry = SchemaRegistry::new();
    let compiled = PredicateCompiler::new(&registry).compile::<Person>(&[], "ab").unwrap();

    assert_eq!(
        compiled.to_string(),
        "(Name CONTAINS 'ab' OR Nickname CONTAINS 'ab')"
    );

    let mut abby = Person::new("x", 1);
    abby.nickname = Some("abby".into());
    assert!(compiled.matches(&abby));
    assert!(compiled.matches(&Person::new("Gabby", 1)));
    assert!(!compiled.matches(&Person::new("Bob", 1)));
}

#[test]
fn test_search_without_text_fields_is_unconstrained() {
    let registry = SchemaRegistry::new();
    let compiled = PredicateCompiler::new(&registry).compile::<Reading>(&[], "ab").unwrap();

    assert!(compiled.predicate().is_match_all());
    assert!(compiled.matches(&Reading { value: 1.5 }));
}

#[test]
fn test_search_and_criteria_combine_with_and() {
    let registry = SchemaRegistry::new();
    let compiled = PredicateCompiler::new(&registry)
        .compile::<Person>(&[criterion("Age", ">=", "20")], "A")
        .unwrap();

    assert_eq!(
        compiled.to_string(),
        "((Name CONTAINS 'A' OR Nickname CONTAINS 'A') AND Age >= 20)"
    );
    assert_eq!(compiled.filter(&people()).count(), 1);
}

// ============================================================================
// Adjacency Grouping
// ============================================================================

#[test]
fn test_adjacent_same_field_criteria_or_combine() {
    let registry = SchemaRegistry::new();
    let criteria = [
        criterion("Name", "equals", "A"),
        criterion("Name", "equals", "B"),
        criterion("Age", "greaterThan", "18"),
    ];
    let compiled = PredicateCompiler::new(&registry).compile::<Person>(&criteria, "").unwrap();

    assert_eq!(
        compiled.to_string(),
        "((Name = 'A' OR Name = 'B') AND Age > 18)"
    );

    let ages: Vec<_> = compiled.filter(&people()).map(|p| p.age).collect();
    assert_eq!(ages, vec![20, 30]);
}

#[test]
fn test_non_adjacent_same_field_criteria_and_combine() {
    let registry = SchemaRegistry::new();
    let criteria = [
        criterion("Name", "equals", "A"),
        criterion("Age", "greaterThan", "18"),
        criterion("Name", "equals", "B"),
    ];
    let compiled = PredicateCompiler::new(&registry).compile::<Person>(&criteria, "").unwrap();

    assert_eq!(
        compiled.to_string(),
        "((Name = 'A' AND Age > 18) AND Name = 'B')"
    );
    assert_eq!(compiled.filter(&people()).count(), 0);
}

#[test]
fn test_adjacency_compares_supplied_names() {
    let registry = SchemaRegistry::new();
    let criteria = [criterion("Name", "=", "A"), criterion("name", "=", "B")];
    let compiled = PredicateCompiler::new(&registry).compile::<Person>(&criteria, "").unwrap();

    // Both resolve to Name, but the raw names differ.
    assert_eq!(compiled.to_string(), "(Name = 'A' AND Name = 'B')");
}

// ============================================================================
// Terminal Errors
// ============================================================================

#[test]
fn test_unknown_property_is_terminal() {
    let registry = SchemaRegistry::new();
    let criteria = [criterion("Age", ">", "1"), criterion("Height", ">", "1")];
    let err = PredicateCompiler::new(&registry)
        .compile::<Person>(&criteria, "")
        .unwrap_err();

    assert_eq!(
        err,
        FilterError::UnknownProperty {
            entity: "People".into(),
            property: "Height".into(),
        }
    );
}

#[test]
fn test_unknown_operator_is_terminal() {
    let registry = SchemaRegistry::new();
    let err = PredicateCompiler::new(&registry)
        .compile::<Person>(&[criterion("Age", "like", "1")], "")
        .unwrap_err();

    assert!(matches!(err, FilterError::UnsupportedOperator(op) if op == "like"));
}

#[test]
fn test_unconvertible_value_is_terminal() {
    let registry = SchemaRegistry::new();
    let err = PredicateCompiler::new(&registry)
        .compile::<Person>(&[criterion("Age", ">", "old")], "")
        .unwrap_err();

    assert!(matches!(
        err,
        FilterError::TypeConversion { expected: FieldType::Integer, .. }
    ));
}

// ============================================================================
// Determinism and Rendering
// ============================================================================

#[test]
fn test_compiling_twice_is_deterministic() {
    let registry = SchemaRegistry::new();
    let compiler = PredicateCompiler::new(&registry);
    let query = FilterQuery::new(vec![
        criterion("Name", "!=", "C"),
        criterion("Age", "<=", "30"),
    ])
    .with_search("A");

    let first = compiler.compile_query::<Person>(&query).unwrap();
    let second = compiler.compile_query::<Person>(&query).unwrap();

    assert_eq!(first.predicate(), second.predicate());
    for person in people() {
        assert_eq!(first.matches(&person), second.matches(&person));
    }
}

#[test]
fn test_sql_rendering_follows_tree() {
    let registry = SchemaRegistry::new();
    let criteria = [
        criterion("Name", "equals", "A"),
        criterion("Name", "equals", "B"),
        criterion("Age", "greaterThan", "18"),
    ];
    let compiled = PredicateCompiler::new(&registry).compile::<Person>(&criteria, "").unwrap();
    let clause = SqlRenderer::render(compiled.predicate());

    assert_eq!(
        clause.sql,
        r#"(("Name" = $1 OR "Name" = $2) AND "Age" > $3)"#
    );
    assert_eq!(
        clause.params,
        vec![
            FieldValue::Text("A".into()),
            FieldValue::Text("B".into()),
            FieldValue::Integer(18),
        ]
    );
}

#[test]
fn test_predicate_json_shape() {
    let predicate = Predicate::compare("Age", "greaterThan".parse().unwrap(), 18);
    let json = serde_json::to_value(&predicate).unwrap();

    assert_eq!(json["kind"], "compare");
    assert_eq!(json["field"], "Age");
}
