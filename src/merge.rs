//! Structural merge of two node trees.
//!
//! `merge_nodes` combines two trees into a third according to a
//! [`MergeOptions`] record, recursing with a path string (`parent.key`,
//! `parent[i]`) that only appears in error messages. Inputs are never
//! mutated; every piece of the output is deep-cloned from one side or built
//! fresh.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::encode::Encoder;
use crate::error::{Error, Result};
use crate::node::{Comment, Entry, Node, NodeBody, NodeKind};
use crate::value::Value;

/// Governs scalar and missing-key precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// B wins scalars; A-only keys are dropped.
    Override,
    /// A wins scalars; B-only keys are dropped.
    Preserve,
    /// Recurse structurally; B wins scalars; keys from both sides are kept.
    #[default]
    Deep,
    /// Alias for `Deep`; kept for configuration compatibility.
    Append,
}

/// Governs how two sequences combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayMergeStrategy {
    /// The merged sequence is a clone of B.
    #[default]
    Replace,
    /// A's items followed by B's items.
    Append,
    /// Merge pairwise by position; the longer side's tail is cloned.
    ByIndex,
    /// Mapping items match on the scalar value of their `name` entry and
    /// merge recursively; unmatched A items stay, unmatched B items append.
    ByKey,
    /// A's items, then B's items not already present. Equality compares the
    /// emitted bytes of each item.
    Union,
}

/// Hook consulted first at every recursive step. Returning `Some` replaces
/// that subtree with the re-encoded value.
pub type CustomMergeFn = dyn Fn(&str, &Value, &Value) -> Option<Value>;

pub struct MergeOptions<'a> {
    pub mode: MergeMode,
    pub array_strategy: ArrayMergeStrategy,
    /// Merge comment slots (B wins per non-empty slot); otherwise drop the
    /// slots at each merge point.
    pub preserve_comments: bool,
    /// Interleave B's new keys at their position relative to A's keys
    /// instead of appending them.
    pub preserve_order: bool,
    /// Permit merging nodes of different kinds instead of failing.
    pub allow_type_mismatch: bool,
    pub custom: Option<&'a CustomMergeFn>,
}

impl Default for MergeOptions<'_> {
    fn default() -> Self {
        Self {
            mode: MergeMode::Deep,
            array_strategy: ArrayMergeStrategy::Replace,
            preserve_comments: true,
            preserve_order: false,
            allow_type_mismatch: false,
            custom: None,
        }
    }
}

/// Merges two YAML texts and emits the result.
pub fn merge(a: &str, b: &str, options: &MergeOptions) -> Result<String> {
    let node_a = crate::parse(a)?;
    let node_b = crate::parse(b)?;
    let merged = merge_nodes(&node_a, &node_b, options)?;
    crate::emit(&merged)
}

/// Merges two trees into a new, fully independent tree.
pub fn merge_nodes(a: &Node, b: &Node, options: &MergeOptions) -> Result<Node> {
    merge_rec(Some(a), Some(b), options, "")
}

/// Applies patches to a base document left to right, each in
/// `Override` / `Replace` mode.
pub fn patch(base: &str, patches: &[&str]) -> Result<String> {
    let options = MergeOptions {
        mode: MergeMode::Override,
        array_strategy: ArrayMergeStrategy::Replace,
        preserve_comments: true,
        ..MergeOptions::default()
    };

    let mut result = base.to_string();
    for patch in patches {
        result = merge(&result, patch, &options)?;
    }
    Ok(result)
}

fn merge_rec(a: Option<&Node>, b: Option<&Node>, opts: &MergeOptions, path: &str) -> Result<Node> {
    if let Some(custom) = opts.custom {
        let av = a.map(Value::from_node).unwrap_or(Value::Null);
        let bv = b.map(Value::from_node).unwrap_or(Value::Null);
        if let Some(result) = custom(path, &av, &bv) {
            return Ok(result.to_node());
        }
    }

    // A null side yields the other side.
    let (a, b) = match (a, b) {
        (None, None) => return Ok(Node::null()),
        (None, Some(b)) => return Ok(b.clone()),
        (Some(a), None) => return Ok(a.clone()),
        (Some(a), Some(b)) => (a, b),
    };
    if is_null_node(a) {
        return Ok(b.clone());
    }
    if is_null_node(b) {
        return Ok(a.clone());
    }

    if a.kind() != b.kind() {
        if !opts.allow_type_mismatch {
            return Err(Error::TypeMismatch {
                path: path.to_string(),
                left: a.kind(),
                right: b.kind(),
            });
        }
        return Ok(match opts.mode {
            MergeMode::Override => b.clone(),
            _ => a.clone(),
        });
    }

    trace!("merge at {:?}: {}", path, a.kind());

    match a.kind() {
        NodeKind::Document => merge_documents(a, b, opts, path),
        NodeKind::Mapping => merge_mappings(a, b, opts, path),
        NodeKind::Sequence => merge_sequences(a, b, opts, path),
        NodeKind::Scalar => Ok(merge_scalars(a, b, opts)),
        NodeKind::Alias => Ok(match opts.mode {
            MergeMode::Override => b.clone(),
            _ => a.clone(),
        }),
    }
}

fn is_null_node(node: &Node) -> bool {
    node.tag == "!!null"
}

fn merge_documents(a: &Node, b: &Node, opts: &MergeOptions, path: &str) -> Result<Node> {
    let (a_content, b_content) = match (&a.body, &b.body) {
        (NodeBody::Document { content: ac }, NodeBody::Document { content: bc }) => (ac, bc),
        _ => unreachable!("kind checked by caller"),
    };

    let mut merged = Node::document();
    if opts.preserve_comments {
        merged.comment = merge_comments(&a.comment, &b.comment);
    }

    let mut content = Vec::new();
    if a_content.is_empty() {
        content = b_content.clone();
    } else if b_content.is_empty() {
        content = a_content.clone();
    } else {
        // A single-document pair keeps the bare path so merge errors read
        // "a.b" rather than "[0].a.b".
        let single = a_content.len() == 1 && b_content.len() == 1;
        for i in 0..a_content.len().min(b_content.len()) {
            let child_path = if single {
                path.to_string()
            } else {
                format!("{}[{}]", path, i)
            };
            content.push(merge_rec(
                Some(&a_content[i]),
                Some(&b_content[i]),
                opts,
                &child_path,
            )?);
        }
        if b_content.len() > a_content.len() {
            content.extend(b_content[a_content.len()..].iter().cloned());
        } else if opts.mode == MergeMode::Preserve && a_content.len() > b_content.len() {
            content.extend(a_content[b_content.len()..].iter().cloned());
        }
    }

    if let NodeBody::Document { content: slot } = &mut merged.body {
        *slot = content;
    }
    Ok(merged)
}

fn merge_mappings(a: &Node, b: &Node, opts: &MergeOptions, path: &str) -> Result<Node> {
    let (a_entries, a_style) = match &a.body {
        NodeBody::Mapping { entries, style } => (entries, *style),
        _ => unreachable!("kind checked by caller"),
    };
    let b_entries = match &b.body {
        NodeBody::Mapping { entries, .. } => entries,
        _ => unreachable!("kind checked by caller"),
    };

    let mut merged = Node::mapping();
    merged.tag = a.tag.clone();
    if let NodeBody::Mapping { style, .. } = &mut merged.body {
        *style = a_style;
    }
    if opts.preserve_comments {
        merged.comment = merge_comments(&a.comment, &b.comment);
    }

    let mut a_index = HashMap::new();
    let mut a_keys = Vec::new();
    for (i, entry) in a_entries.iter().enumerate() {
        let key = entry.key.key_string();
        if a_index.insert(key.clone(), i).is_none() {
            a_keys.push(key);
        }
    }
    let mut b_index = HashMap::new();
    let mut b_keys = Vec::new();
    for (i, entry) in b_entries.iter().enumerate() {
        let key = entry.key.key_string();
        if b_index.insert(key.clone(), i).is_none() {
            b_keys.push(key);
        }
    }

    let keys = if opts.preserve_order {
        interleave_key_order(&a_keys, &b_keys)
    } else {
        let mut keys = a_keys.clone();
        keys.extend(
            b_keys
                .iter()
                .filter(|k| !a_index.contains_key(*k))
                .cloned(),
        );
        keys
    };

    let mut processed = HashSet::new();
    let mut entries = Vec::new();
    for key in keys {
        if !processed.insert(key.clone()) {
            continue;
        }
        let a_entry = a_index.get(&key).map(|&i| &a_entries[i]);
        let b_entry = b_index.get(&key).map(|&i| &b_entries[i]);

        match (a_entry, b_entry) {
            (Some(ae), Some(be)) => {
                let value = merge_rec(
                    Some(&ae.value),
                    Some(&be.value),
                    opts,
                    &join_path(path, &key),
                )?;
                let mut entry = Entry::new(ae.key.clone(), value);
                if opts.preserve_comments {
                    entry.comment = merge_comments(&ae.comment, &be.comment);
                    entry.key.comment = merge_comments(&ae.key.comment, &be.key.comment);
                } else {
                    entry.key.comment = Comment::default();
                }
                entries.push(entry);
            }
            (Some(ae), None) => {
                if opts.mode != MergeMode::Override {
                    entries.push(clone_entry(ae, opts));
                }
            }
            (None, Some(be)) => {
                if opts.mode != MergeMode::Preserve {
                    entries.push(clone_entry(be, opts));
                }
            }
            (None, None) => {}
        }
    }

    if let NodeBody::Mapping { entries: slot, .. } = &mut merged.body {
        *slot = entries;
    }
    Ok(merged)
}

fn merge_sequences(a: &Node, b: &Node, opts: &MergeOptions, path: &str) -> Result<Node> {
    let (a_items, a_style) = match &a.body {
        NodeBody::Sequence { items, style } => (items, *style),
        _ => unreachable!("kind checked by caller"),
    };
    let b_items = match &b.body {
        NodeBody::Sequence { items, .. } => items,
        _ => unreachable!("kind checked by caller"),
    };

    let mut merged = Node::sequence();
    merged.tag = a.tag.clone();
    if let NodeBody::Sequence { style, .. } = &mut merged.body {
        *style = a_style;
    }
    if opts.preserve_comments {
        merged.comment = merge_comments(&a.comment, &b.comment);
    }

    let items = match opts.array_strategy {
        ArrayMergeStrategy::Replace => b_items.clone(),

        ArrayMergeStrategy::Append => {
            let mut items = a_items.clone();
            items.extend(b_items.iter().cloned());
            items
        }

        ArrayMergeStrategy::ByIndex => {
            let mut items = Vec::new();
            let longest = a_items.len().max(b_items.len());
            for i in 0..longest {
                let item = match (a_items.get(i), b_items.get(i)) {
                    (Some(ai), Some(bi)) => {
                        merge_rec(Some(ai), Some(bi), opts, &format!("{}[{}]", path, i))?
                    }
                    (Some(ai), None) => ai.clone(),
                    (None, Some(bi)) => bi.clone(),
                    (None, None) => unreachable!(),
                };
                items.push(item);
            }
            items
        }

        ArrayMergeStrategy::Union => {
            let encoder = Encoder::new();
            let mut seen = HashSet::new();
            let mut items = Vec::new();
            for item in a_items.iter().chain(b_items.iter()) {
                let key = encoder.encode(item)?;
                if seen.insert(key) {
                    items.push(item.clone());
                }
            }
            items
        }

        ArrayMergeStrategy::ByKey => merge_items_by_key(a_items, b_items, opts, path)?,
    };

    if let NodeBody::Sequence { items: slot, .. } = &mut merged.body {
        *slot = items;
    }
    Ok(merged)
}

/// `ByKey` semantics: items that are mappings match on the scalar value of
/// their `name` entry. Matched pairs merge recursively; A items stay in
/// order; B items without a match are appended.
fn merge_items_by_key(
    a_items: &[Node],
    b_items: &[Node],
    opts: &MergeOptions,
    path: &str,
) -> Result<Vec<Node>> {
    let b_keys: Vec<Option<String>> = b_items.iter().map(item_merge_key).collect();
    let mut used = vec![false; b_items.len()];
    let mut items = Vec::new();

    for (i, item) in a_items.iter().enumerate() {
        // Match the first unused B item carrying the same key.
        let matched = match item_merge_key(item) {
            Some(key) => {
                (0..b_items.len()).find(|&j| !used[j] && b_keys[j].as_deref() == Some(key.as_str()))
            }
            None => None,
        };
        let merged_item = match matched {
            Some(j) => {
                used[j] = true;
                merge_rec(
                    Some(item),
                    Some(&b_items[j]),
                    opts,
                    &format!("{}[{}]", path, i),
                )?
            }
            None => item.clone(),
        };
        items.push(merged_item);
    }

    for (j, item) in b_items.iter().enumerate() {
        if !used[j] {
            items.push(item.clone());
        }
    }
    Ok(items)
}

fn item_merge_key(node: &Node) -> Option<String> {
    let NodeBody::Mapping { entries, .. } = &node.body else {
        return None;
    };
    entries
        .iter()
        .find(|e| e.key.key_string() == "name")
        .map(|e| e.value.key_string())
}

fn merge_scalars(a: &Node, b: &Node, opts: &MergeOptions) -> Node {
    let mut merged = match opts.mode {
        MergeMode::Preserve => a.clone(),
        _ => b.clone(),
    };
    merged.comment = if opts.preserve_comments {
        merge_comments(&a.comment, &b.comment)
    } else {
        Comment::default()
    };
    merged
}

/// Per-slot comment merge: B wins where non-empty, else A.
fn merge_comments(a: &Comment, b: &Comment) -> Comment {
    let pick = |b_slot: &str, a_slot: &str| -> String {
        if !b_slot.is_empty() {
            b_slot.to_string()
        } else {
            a_slot.to_string()
        }
    };
    Comment {
        head: pick(&b.head, &a.head),
        line: pick(&b.line, &a.line),
        foot: pick(&b.foot, &a.foot),
        key: pick(&b.key, &a.key),
        value: pick(&b.value, &a.value),
    }
}

/// Interleaves B's new keys at their position relative to A's keys:
/// a new key lands right after the nearest preceding key it shares with A.
fn interleave_key_order(a_keys: &[String], b_keys: &[String]) -> Vec<String> {
    let mut result: Vec<String> = a_keys.to_vec();
    let mut last_anchor: Option<usize> = None;

    for key in b_keys {
        if let Some(pos) = result.iter().position(|k| k == key) {
            last_anchor = Some(pos);
            continue;
        }
        let insert_at = last_anchor.map(|p| p + 1).unwrap_or(0);
        result.insert(insert_at, key.clone());
        last_anchor = Some(insert_at);
    }
    result
}

fn clone_entry(entry: &Entry, opts: &MergeOptions) -> Entry {
    Entry {
        key: entry.key.clone(),
        value: entry.value.clone(),
        comment: if opts.preserve_comments {
            entry.comment.clone()
        } else {
            Comment::default()
        },
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn merge_values(a: &str, b: &str, opts: &MergeOptions) -> Value {
        let merged = merge_nodes(&parse(a).unwrap(), &parse(b).unwrap(), opts).unwrap();
        Value::from_node(&merged)
    }

    fn get<'v>(value: &'v Value, key: &str) -> &'v Value {
        value.as_mapping().unwrap().get(key).unwrap()
    }

    #[test]
    fn test_deep_merge_combines_keys() {
        let merged = merge_values(
            "a: 1\nb:\n  x: 1\n  y: 2",
            "b:\n  y: 20\n  z: 3\nc: 4",
            &MergeOptions::default(),
        );
        assert_eq!(get(&merged, "a"), &Value::Integer(1.into()));
        let b = get(&merged, "b");
        assert_eq!(get(b, "x"), &Value::Integer(1.into()));
        assert_eq!(get(b, "y"), &Value::Integer(20.into()));
        assert_eq!(get(b, "z"), &Value::Integer(3.into()));
        assert_eq!(get(&merged, "c"), &Value::Integer(4.into()));
    }

    #[test]
    fn test_merge_identity() {
        let a = "name: app\nitems:\n- 1\n- 2\nconfig:\n  depth: 3";
        let merged = merge_values(a, a, &MergeOptions::default());
        assert_eq!(merged, Value::from_node(&parse(a).unwrap()));
    }

    #[test]
    fn test_disjoint_keys_union() {
        let merged = merge_values("a: 1", "b: 2", &MergeOptions::default());
        let map = merged.as_mapping().unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_preserve_mode_keeps_a_scalars() {
        let opts = MergeOptions {
            mode: MergeMode::Preserve,
            ..MergeOptions::default()
        };
        let merged = merge_values("v: old", "v: new\nextra: 1", &opts);
        assert_eq!(get(&merged, "v"), &Value::String("old".into()));
        assert!(merged.as_mapping().unwrap().get("extra").is_none());
    }

    #[test]
    fn test_override_mode_drops_a_only_keys() {
        let opts = MergeOptions {
            mode: MergeMode::Override,
            ..MergeOptions::default()
        };
        let merged = merge_values("keep: 1\nv: old", "v: new", &opts);
        assert!(merged.as_mapping().unwrap().get("keep").is_none());
        assert_eq!(get(&merged, "v"), &Value::String("new".into()));
    }

    #[test]
    fn test_type_mismatch_errors_with_path() {
        let err = merge_nodes(
            &parse("a:\n  b: 1").unwrap(),
            &parse("a:\n  b:\n    c: 2").unwrap(),
            &MergeOptions::default(),
        )
        .unwrap_err();
        match err {
            Error::TypeMismatch { path, .. } => assert_eq!(path, "a.b"),
            other => panic!("expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_type_mismatch_allowed() {
        let opts = MergeOptions {
            allow_type_mismatch: true,
            mode: MergeMode::Override,
            ..MergeOptions::default()
        };
        let merged = merge_values("a: 1", "a:\n  b: 2", &opts);
        assert!(get(&merged, "a").as_mapping().is_some());
    }

    #[test]
    fn test_null_side_yields_other() {
        let merged = merge_values("a: null", "a:\n  b: 2", &MergeOptions::default());
        assert!(get(&merged, "a").as_mapping().is_some());
    }

    #[test]
    fn test_array_replace() {
        let merged = merge_values("l:\n- 1\n- 2", "l:\n- 9", &MergeOptions::default());
        assert_eq!(get(&merged, "l").as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn test_array_append() {
        let opts = MergeOptions {
            array_strategy: ArrayMergeStrategy::Append,
            ..MergeOptions::default()
        };
        let merged = merge_values("l:\n- 1", "l:\n- 2\n- 3", &opts);
        assert_eq!(get(&merged, "l").as_sequence().unwrap().len(), 3);
    }

    #[test]
    fn test_array_by_index() {
        let opts = MergeOptions {
            array_strategy: ArrayMergeStrategy::ByIndex,
            ..MergeOptions::default()
        };
        let merged = merge_values("l:\n- a: 1\n- b: 2", "l:\n- a: 10", &opts);
        let items = get(&merged, "l").as_sequence().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(get(&items[0], "a"), &Value::Integer(10.into()));
        assert_eq!(get(&items[1], "b"), &Value::Integer(2.into()));
    }

    #[test]
    fn test_array_union_deduplicates() {
        let opts = MergeOptions {
            array_strategy: ArrayMergeStrategy::Union,
            ..MergeOptions::default()
        };
        let merged = merge_values("l:\n- 1\n- 2", "l:\n- 2\n- 3", &opts);
        let items = get(&merged, "l").as_sequence().unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_array_by_key_matches_names() {
        let opts = MergeOptions {
            array_strategy: ArrayMergeStrategy::ByKey,
            ..MergeOptions::default()
        };
        let merged = merge_values(
            "l:\n- name: a\n  port: 1\n- name: b\n  port: 2",
            "l:\n- name: b\n  port: 20\n- name: c\n  port: 3",
            &opts,
        );
        let items = get(&merged, "l").as_sequence().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(get(&items[0], "port"), &Value::Integer(1.into()));
        assert_eq!(get(&items[1], "port"), &Value::Integer(20.into()));
        assert_eq!(get(&items[2], "name"), &Value::String("c".into()));
    }

    #[test]
    fn test_preserve_order_interleaves_new_keys() {
        let opts = MergeOptions {
            preserve_order: true,
            ..MergeOptions::default()
        };
        let merged = merge_nodes(
            &parse("a: 1\nc: 3").unwrap(),
            &parse("b: 2\na: 1\nd: 4\nc: 3").unwrap(),
            &opts,
        )
        .unwrap();
        let NodeBody::Document { content } = &merged.body else {
            panic!("expected document");
        };
        let NodeBody::Mapping { entries, .. } = &content[0].body else {
            panic!("expected mapping");
        };
        let keys: Vec<_> = entries.iter().map(|e| e.key.key_string()).collect();
        assert_eq!(keys, ["b", "a", "d", "c"]);
    }

    #[test]
    fn test_comment_slots_merge_b_wins() {
        let a = parse("# from a\nkey: 1").unwrap();
        let b = parse("# from b\nkey: 2").unwrap();
        let merged = merge_nodes(&a, &b, &MergeOptions::default()).unwrap();
        let NodeBody::Document { content } = &merged.body else {
            panic!("expected document");
        };
        let NodeBody::Mapping { entries, .. } = &content[0].body else {
            panic!("expected mapping");
        };
        assert_eq!(entries[0].key.comment.head, "from b");
    }

    #[test]
    fn test_comments_dropped_when_disabled() {
        let opts = MergeOptions {
            preserve_comments: false,
            ..MergeOptions::default()
        };
        let a = parse("key: 1 # old").unwrap();
        let b = parse("key: 2").unwrap();
        let merged = merge_nodes(&a, &b, &opts).unwrap();
        let NodeBody::Document { content } = &merged.body else {
            panic!("expected document");
        };
        let NodeBody::Mapping { entries, .. } = &content[0].body else {
            panic!("expected mapping");
        };
        assert!(entries[0].value.comment.is_empty());
    }

    #[test]
    fn test_custom_merge_hook() {
        let custom = |path: &str, _a: &Value, _b: &Value| -> Option<Value> {
            if path == "special" {
                Some(Value::String("hooked".into()))
            } else {
                None
            }
        };
        let opts = MergeOptions {
            custom: Some(&custom),
            ..MergeOptions::default()
        };
        let merged = merge_values("special: 1\nplain: 1", "special: 2\nplain: 2", &opts);
        assert_eq!(get(&merged, "special"), &Value::String("hooked".into()));
        assert_eq!(get(&merged, "plain"), &Value::Integer(2.into()));
    }

    #[test]
    fn test_merge_does_not_mutate_inputs() {
        let a = parse("a: 1").unwrap();
        let b = parse("a: 2").unwrap();
        let before = Value::from_node(&a);
        let _ = merge_nodes(&a, &b, &MergeOptions::default()).unwrap();
        assert_eq!(Value::from_node(&a), before);
    }

    #[test]
    fn test_patch_applies_in_order() {
        let result = patch("v: 1", &["v: 2", "v: 3\nextra: x"]).unwrap();
        let value: Value = Value::from_node(&parse(&result).unwrap());
        assert_eq!(get(&value, "v"), &Value::Integer(3.into()));
        assert_eq!(get(&value, "extra"), &Value::String("x".into()));
    }
}
