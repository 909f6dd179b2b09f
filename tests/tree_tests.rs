use sidediff::{Node, Shape, TypedValue};
use std::collections::BTreeMap;

#[test]
fn test_type_name() {
    assert_eq!(Node::Null.type_name(), "null");
    assert_eq!(Node::Bool(true).type_name(), "boolean");
    assert_eq!(Node::Number(42.0).type_name(), "number");
    assert_eq!(Node::String("test".to_string()).type_name(), "string");
    assert_eq!(Node::Object(BTreeMap::new()).type_name(), "object");
    assert_eq!(Node::Array(vec![]).type_name(), "array");

    let typed = Node::Typed(TypedValue::new("timestamp", Node::String("x".to_string())));
    assert_eq!(typed.type_name(), "timestamp");
}

#[test]
fn test_shape() {
    assert_eq!(Node::Object(BTreeMap::new()).shape(), Shape::Mapping);
    assert_eq!(Node::Array(vec![]).shape(), Shape::Sequence);
    assert_eq!(Node::Null.shape(), Shape::Leaf);
    assert_eq!(Node::String(String::new()).shape(), Shape::Leaf);

    let typed = Node::Typed(TypedValue::new("point", Node::Array(vec![Node::Number(1.0)])));
    assert_eq!(typed.shape(), Shape::Leaf);
}

#[test]
fn test_get_and_at() {
    let mut map = BTreeMap::new();
    map.insert("items".to_string(), Node::Array(vec![Node::Bool(true)]));
    let node = Node::Object(map);

    assert_eq!(
        node.get("items").and_then(|items| items.at(0)),
        Some(&Node::Bool(true))
    );
    assert!(node.get("missing").is_none());
    assert!(node.at(0).is_none());
    assert!(Node::Null.get("items").is_none());
}

#[test]
fn test_mapping_keys_are_sorted() {
    let mut map = BTreeMap::new();
    map.insert("zeta".to_string(), Node::Null);
    map.insert("alpha".to_string(), Node::Null);
    map.insert("mid".to_string(), Node::Null);

    match Node::Object(map) {
        Node::Object(map) => {
            let keys: Vec<_> = map.keys().cloned().collect();
            assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
        }
        _ => panic!("Expected object"),
    }
}

#[test]
fn test_preview_primitives() {
    assert_eq!(Node::Null.preview(100), "null");
    assert_eq!(Node::Bool(true).preview(100), "true");
    assert_eq!(Node::Bool(false).preview(100), "false");
    assert_eq!(Node::Number(42.0).preview(100), "42");
    assert_eq!(Node::Number(42.5).preview(100), "42.5");
    assert_eq!(Node::String("hello".to_string()).preview(100), "\"hello\"");
}

#[test]
fn test_preview_containers() {
    assert_eq!(Node::Object(BTreeMap::new()).preview(100), "{}");
    assert_eq!(Node::Array(vec![]).preview(100), "[]");

    let mut obj = BTreeMap::new();
    obj.insert("key".to_string(), Node::Number(1.0));
    assert_eq!(Node::Object(obj).preview(100), "{ 1 key }");

    let arr = vec![Node::Number(1.0), Node::Number(2.0), Node::Number(3.0)];
    assert_eq!(Node::Array(arr).preview(100), "[ 3 items ]");
}

#[test]
fn test_preview_typed() {
    let typed = Node::Typed(TypedValue::new("timestamp", Node::String("2024-01-01".to_string())));
    assert_eq!(typed.preview(100), "!timestamp 2024-01-01");

    let mut repr = BTreeMap::new();
    repr.insert("x".to_string(), Node::Number(1.0));
    let point = Node::Typed(TypedValue::new("point", Node::Object(repr)));
    assert_eq!(point.preview(100), "!point { 1 key }");
}

#[test]
fn test_preview_truncation() {
    let node = Node::String("a".repeat(100));
    let preview = node.preview(20);

    assert_eq!(preview.chars().count(), 20);
    assert!(preview.ends_with("..."));
}

#[test]
fn test_number_preview_formatting() {
    assert_eq!(Node::Number(0.0).preview(100), "0");
    assert_eq!(Node::Number(-10.0).preview(100), "-10");
    assert_eq!(Node::Number(3.25).preview(100), "3.25");
}

#[test]
fn test_canonical_text() {
    let text = |repr: Node| TypedValue::new("t", repr).canonical_text();

    assert_eq!(text(Node::String("abc".to_string())), Some("abc".to_string()));
    assert_eq!(text(Node::Number(7.0)), Some("7".to_string()));
    assert_eq!(text(Node::Bool(false)), Some("false".to_string()));
    assert_eq!(text(Node::Null), None);
    assert_eq!(text(Node::Array(vec![])), None);
    assert_eq!(
        text(Node::Typed(TypedValue::new("inner", Node::String("deep".to_string())))),
        Some("deep".to_string())
    );
}
