//! Parse/emit integration tests: end-to-end scenarios, boundary behaviors,
//! and round-trip properties.

use yamlet::{
    emit, emit_writer, marshal, parse, parse_reader, unmarshal, Node, NodeBody, ScalarStyle, Value,
};

/// Parses, emits, re-parses, and checks the two trees decode to the same
/// plain value.
fn assert_reparse_equal(input: &str) {
    let first = parse(input).unwrap();
    let emitted = emit(&first).unwrap();
    let second = parse(&emitted).unwrap();
    assert_eq!(
        Value::from_node(&first),
        Value::from_node(&second),
        "round trip changed the value; emitted:\n{}",
        emitted
    );
}

/// Emitting and re-emitting must be a fixed point.
fn assert_emit_stable(input: &str) {
    let emitted = emit(&parse(input).unwrap()).unwrap();
    let again = emit(&parse(&emitted).unwrap()).unwrap();
    assert_eq!(emitted, again, "second emit differed from first");
}

fn entries(node: &Node) -> &[yamlet::Entry] {
    match &node.body {
        NodeBody::Mapping { entries, .. } => entries,
        other => panic!("expected mapping, got {:?}", other),
    }
}

fn root(input: &str) -> Node {
    let doc = parse(input).unwrap();
    let NodeBody::Document { mut content } = doc.body else {
        panic!("expected document");
    };
    assert!(!content.is_empty(), "empty document");
    content.remove(0)
}

#[test]
fn scenario_simple_mapping() {
    let node = root("key: value");
    let entries = entries(&node);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key.scalar_value(), Some("key"));
    assert_eq!(entries[0].value.scalar_value(), Some("value"));
    assert_eq!(entries[0].value.tag, "!!str");
}

#[test]
fn scenario_flow_sequence_of_ints() {
    let node = root("[1, 2, 3]");
    let NodeBody::Sequence { items, style } = &node.body else {
        panic!("expected sequence");
    };
    assert_eq!(*style, yamlet::CollectionStyle::Flow);
    let values: Vec<_> = items.iter().map(|n| n.scalar_value().unwrap()).collect();
    assert_eq!(values, ["1", "2", "3"]);
    assert!(items.iter().all(|n| n.tag == "!!int"));
}

#[test]
fn scenario_anchor_alias_is_independent_clone() {
    let node = root("default: &d 30\nvalue: *d");
    let entries = entries(&node);
    assert_eq!(entries[1].value.scalar_value(), Some("30"));

    // Mutating the anchored node must not affect the alias site; the trees
    // are separate allocations, so this is structural independence.
    let mut anchored = entries[0].value.clone();
    if let NodeBody::Scalar { value, .. } = &mut anchored.body {
        *value = "99".to_string();
    }
    assert_eq!(entries[1].value.scalar_value(), Some("30"));
}

#[test]
fn scenario_comments() {
    let node = root("# head\nname: MyApp # inline");
    let entries = entries(&node);
    assert_eq!(entries[0].key.comment.head, "head");
    assert_eq!(entries[0].value.comment.line, "inline");
}

#[test]
fn scenario_literal_emission() {
    let node = Node::styled_scalar("line1\nline2", ScalarStyle::Literal);
    assert_eq!(emit(&node).unwrap(), "|-\n  line1\n  line2\n");
}

#[test]
fn empty_input_parses_to_empty_document() {
    let doc = parse("").unwrap();
    let NodeBody::Document { content } = &doc.body else {
        panic!("expected document");
    };
    assert!(content.is_empty());
    assert_eq!(emit(&doc).unwrap(), "");
}

#[test]
fn emitted_yes_string_stays_a_string() {
    let yaml = marshal(&Value::String("yes".into())).unwrap();
    assert_eq!(yaml, "\"yes\"");
    let back: Value = unmarshal(&yaml).unwrap();
    assert_eq!(back, Value::String("yes".into()));
}

#[test]
fn plain_yes_is_a_boolean() {
    let value: Value = unmarshal("yes").unwrap();
    assert_eq!(value, Value::Bool(true));
}

#[test]
fn literal_chomping_round_trips() {
    let strip = root("text: |-\n  no newline\n");
    assert_eq!(entries(&strip)[0].value.scalar_value(), Some("no newline"));
    assert_emit_stable("text: |-\n  no newline\n");

    let keep = root("text: |+\n  kept\n\n");
    assert_eq!(entries(&keep)[0].value.scalar_value(), Some("kept\n\n"));
    assert_emit_stable("text: |+\n  kept\n\n");
}

#[test]
fn style_round_trip_is_stable() {
    let cases = [
        "key: value\n",
        "nums: [1, 2, 3]\n",
        "map: {a: 1, b: two}\n",
        "s: 'single'\n",
        "d: \"double\"\n",
        "b: yes\n",
        "n: ~\n",
        "text: |\n  line1\n  line2\n",
        "- a\n- b\n",
        "# head\nname: MyApp # inline\n",
        "parent:\n  child: 1\nnext: 2\n",
        "empty: {}\nnone: []\n",
    ];
    for case in cases {
        assert_reparse_equal(case);
        assert_emit_stable(case);
    }
}

#[test]
fn exact_emission_for_simple_documents() {
    for case in [
        "key: value\n",
        "nums: [1, 2, 3]\n",
        "s: 'single'\n",
        "text: |\n  line1\n  line2\n",
        "parent:\n  child: 1\n",
    ] {
        assert_eq!(emit(&parse(case).unwrap()).unwrap(), case);
    }
}

#[test]
fn comment_round_trip() {
    let input = "# head\nname: MyApp # inline\n";
    assert_eq!(emit(&parse(input).unwrap()).unwrap(), input);
}

#[test]
fn comment_between_entries_round_trips() {
    let input = "a: 1\n# about b\nb: 2\n";
    assert_eq!(emit(&parse(input).unwrap()).unwrap(), input);
}

#[test]
fn multi_document_round_trip() {
    let input = "a: 1\n\n---\nb: 2\n";
    let doc = parse(input).unwrap();
    let NodeBody::Document { content } = &doc.body else {
        panic!("expected document");
    };
    assert_eq!(content.len(), 2);
    assert_eq!(emit(&doc).unwrap(), input);
}

#[test]
fn data_round_trip_for_plain_values() {
    let mut map = std::collections::HashMap::new();
    map.insert("name".to_string(), Value::String("app".into()));
    map.insert("count".to_string(), Value::Integer(3.into()));
    map.insert("ratio".to_string(), Value::Float(0.5));
    map.insert("enabled".to_string(), Value::Bool(true));
    map.insert("empty".to_string(), Value::Null);
    map.insert(
        "items".to_string(),
        Value::Sequence(vec![Value::Integer(1.into()), Value::String("two".into())]),
    );
    let original = Value::Mapping(map);

    let yaml = marshal(&original).unwrap();
    let back: Value = unmarshal(&yaml).unwrap();
    assert_eq!(back, original, "yaml was:\n{}", yaml);
}

#[test]
fn nested_structures_round_trip() {
    let input = "\
services:
- name: web
  port: 8080
  flags: [a, b]
- name: db
  port: 5432
config:
  retries: 3
  timeout: 2.5
";
    assert_reparse_equal(input);
    assert_emit_stable(input);
}

#[test]
fn anchored_mapping_round_trips_by_value() {
    let input = "defaults: &d\n  timeout: 30\nservice: *d\n";
    assert_reparse_equal(input);
}

#[test]
fn reader_and_writer_adapters() {
    let node = parse_reader(std::io::Cursor::new(b"key: value".to_vec())).unwrap();
    let mut out = Vec::new();
    emit_writer(&mut out, &node).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "key: value\n");
}

#[test]
fn unmarshal_into_host_types() {
    let numbers: Vec<i64> = unmarshal("- 1\n- 2\n- 3").unwrap();
    assert_eq!(numbers, [1, 2, 3]);

    let table: std::collections::HashMap<String, i64> = unmarshal("a: 1\nb: 2").unwrap();
    assert_eq!(table["a"], 1);
    assert_eq!(table["b"], 2);

    let missing: Option<i64> = unmarshal("null").unwrap();
    assert_eq!(missing, None);
}

#[test]
fn unmarshal_wrong_shape_errors() {
    let result: yamlet::Result<Vec<i64>> = unmarshal("key: value");
    assert!(result.is_err());
}

#[test]
fn parse_errors_carry_positions() {
    let err = parse("key: 'unterminated").unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains("line 1"),
        "expected position in {:?}",
        message
    );
}

#[test]
fn tagged_scalars_survive() {
    let node = root("!custom 42");
    assert_eq!(node.tag, "!custom");
    assert_eq!(node.scalar_value(), Some("42"));
}

#[test]
fn folded_block_round_trips_by_value() {
    let input = "summary: >\n  This is\n  a folded\n  scalar.\n";
    let node = root(input);
    assert_eq!(
        entries(&node)[0].value.scalar_value(),
        Some("This is a folded scalar.\n")
    );
    assert_reparse_equal(input);
}
