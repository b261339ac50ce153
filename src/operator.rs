//! Metadata operator
//!
//! The [`MetadataOperator`] applies an ordered list of [`Operation`]s to a
//! [`MetadataStore`]. It works on a copy of the source store; operation
//! `i + 1` observes the store as left behind by operations `1..=i`.
//!
//! Every applied operation produces one [`ChangeLogEntry`] and one
//! informational log entry describing whether the target field changed.
//! Any field an operation writes to ends up holding a sequence; fields no
//! operation touches keep their original representation.
//!
//! ## Matching rules
//!
//! - `findAndReplace` patterns must match a whole value, not a substring.
//!   The first item whose pattern matches wins, per value.
//! - `findAndReplaceLiteral` compares literal and value after trimming
//!   surrounding whitespace on both sides. The replacement is trimmed too.
//!   Values without a match are kept as they were, untrimmed.

use log::debug;
use regex::Regex;

use crate::operations::{FindAndReplaceItem, FindAndReplaceLiteralItem, Operation, OperationKind};
use crate::report::{origin, Log};
use crate::store::{FieldValue, MetadataStore};

/// Record of one applied operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogEntry {
    pub kind: OperationKind,
    pub target_field: String,
    /// Value before the operation; `None` if the field was absent.
    pub pre: Option<FieldValue>,
    /// Value after the operation; `None` if the field is absent.
    pub post: Option<FieldValue>,
    pub changed: bool,
}

impl ChangeLogEntry {
    /// Human-readable description used in the job log.
    pub fn message(&self) -> String {
        if self.changed {
            format!(
                "Mapping-operation '{}' on '{}' changed the value from '{}' to '{}'.",
                self.kind,
                self.target_field,
                render(self.pre.as_ref()),
                render(self.post.as_ref())
            )
        } else {
            format!(
                "Mapping-operation '{}' on '{}' did not change the value of '{}'.",
                self.kind,
                self.target_field,
                render(self.pre.as_ref())
            )
        }
    }
}

fn render(value: Option<&FieldValue>) -> String {
    value.map_or_else(|| "<absent>".to_string(), FieldValue::to_string)
}

/// Output of [`MetadataOperator::process`]
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Store after all operations were applied
    pub metadata: MetadataStore,
    /// One entry per operation, in application order
    pub changes: Vec<ChangeLogEntry>,
    /// Log entries produced while processing
    pub log: Log,
}

/// Applies operations to metadata stores
#[derive(Debug, Clone)]
pub struct MetadataOperator {
    origin: String,
}

impl Default for MetadataOperator {
    fn default() -> Self {
        Self::with_origin(origin::METADATA_OPERATOR)
    }
}

impl MetadataOperator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator whose log entries carry `origin`.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    /// Apply `operations` to a copy of `source`.
    ///
    /// An empty operation list yields an identical copy of `source` and an
    /// empty log.
    pub fn process(&self, source: &MetadataStore, operations: &[Operation]) -> ProcessResult {
        let mut result = ProcessResult {
            metadata: source.clone(),
            changes: Vec::with_capacity(operations.len()),
            log: Log::new(),
        };

        for operation in operations {
            let target_field = operation.target_field();
            let pre = result.metadata.get(target_field).cloned();

            let outcome = match operation {
                Operation::Set { value, .. } => {
                    set(&mut result.metadata, target_field, value);
                    Ok(())
                }
                Operation::Complement { value, .. } => {
                    complement(&mut result.metadata, target_field, value);
                    Ok(())
                }
                Operation::OverwriteExisting { value, .. } => {
                    overwrite_existing(&mut result.metadata, target_field, value);
                    Ok(())
                }
                Operation::FindAndReplace { items, .. } => {
                    find_and_replace(&mut result.metadata, target_field, items)
                }
                Operation::FindAndReplaceLiteral { items, .. } => {
                    find_and_replace_literal(&mut result.metadata, target_field, items);
                    Ok(())
                }
            };

            if let Err(e) = outcome {
                result.log.error(
                    &self.origin,
                    format!(
                        "Mapping-operation '{}' on '{}' has an invalid pattern: {}",
                        operation.kind(),
                        target_field,
                        e
                    ),
                );
            }

            let post = result.metadata.get(target_field).cloned();
            let entry = ChangeLogEntry {
                kind: operation.kind(),
                target_field: target_field.to_string(),
                changed: pre != post,
                pre,
                post,
            };
            debug!("{}", entry.message());
            result.log.info(&self.origin, entry.message());
            result.changes.push(entry);
        }

        result
    }
}

fn set(store: &mut MetadataStore, field: &str, value: &str) {
    store.insert(field, FieldValue::list_of(value));
}

fn complement(store: &mut MetadataStore, field: &str, value: &str) {
    if !store.contains(field) {
        store.insert(field, FieldValue::list_of(value));
    }
}

fn overwrite_existing(store: &mut MetadataStore, field: &str, value: &str) {
    if store.contains(field) {
        store.insert(field, FieldValue::list_of(value));
    }
}

/// Wrap `pattern` so that it only matches a complete value.
pub fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{})\z", pattern))
}

fn find_and_replace(
    store: &mut MetadataStore,
    field: &str,
    items: &[FindAndReplaceItem],
) -> Result<(), regex::Error> {
    let Some(current) = store.get(field).cloned() else {
        return Ok(());
    };

    let patterns = items
        .iter()
        .map(|item| Ok((anchored(&item.regex)?, item.value.as_str())))
        .collect::<Result<Vec<_>, regex::Error>>()?;

    let values = current
        .into_list()
        .into_iter()
        .map(|value| {
            patterns
                .iter()
                .find(|(regex, _)| regex.is_match(&value))
                .map_or(value, |(_, replacement)| replacement.to_string())
        })
        .collect::<Vec<_>>();

    store.insert(field, FieldValue::List(values));
    Ok(())
}

fn find_and_replace_literal(store: &mut MetadataStore, field: &str, items: &[FindAndReplaceLiteralItem]) {
    let Some(current) = store.get(field).cloned() else {
        return;
    };

    let values = current
        .into_list()
        .into_iter()
        .map(|value| {
            items
                .iter()
                .find(|item| item.literal.trim() == value.trim())
                .map_or(value, |item| item.value.trim().to_string())
        })
        .collect::<Vec<_>>();

    store.insert(field, FieldValue::List(values));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store<const N: usize>(fields: [(&str, FieldValue); N]) -> MetadataStore {
        fields.into_iter().collect()
    }

    fn list(values: &[&str]) -> FieldValue {
        FieldValue::from(values.to_vec())
    }

    fn run(source: MetadataStore, operations: Vec<Operation>) -> MetadataStore {
        MetadataOperator::new().process(&source, &operations).metadata
    }

    #[test]
    fn test_empty_operations_return_copy_and_empty_log() {
        let source = store([("y", "old".into()), ("x", list(&["a", "b"]))]);
        let result = MetadataOperator::new().process(&source, &[]);
        assert_eq!(result.metadata, source);
        assert!(result.log.is_empty());
        assert!(result.changes.is_empty());
    }

    #[test]
    fn test_set_on_absent_field() {
        let result = run(store([("y", "old".into())]), vec![Operation::set("x", "new")]);
        assert_eq!(result, store([("y", "old".into()), ("x", list(&["new"]))]));
    }

    #[test]
    fn test_set_on_scalar_field() {
        let result = run(
            store([("y", "old".into()), ("x", "old".into())]),
            vec![Operation::set("x", "new")],
        );
        assert_eq!(result, store([("y", "old".into()), ("x", list(&["new"]))]));
    }

    #[test]
    fn test_set_collapses_sequence() {
        let result = run(
            store([("y", "old".into()), ("x", list(&["old-0", "old-1"]))]),
            vec![Operation::set("x", "new")],
        );
        assert_eq!(result, store([("y", "old".into()), ("x", list(&["new"]))]));
    }

    #[test]
    fn test_complement_on_absent_field() {
        let result = run(store([("y", "old".into())]), vec![Operation::complement("x", "new")]);
        assert_eq!(result, store([("y", "old".into()), ("x", list(&["new"]))]));
    }

    #[test]
    fn test_complement_keeps_present_field_representation() {
        for existing in [
            FieldValue::from("old"),
            list(&["old-0", "old-1"]),
            FieldValue::from(""),
            FieldValue::List(vec![]),
        ] {
            let source = store([("y", "old".into()), ("x", existing)]);
            let result = run(source.clone(), vec![Operation::complement("x", "new")]);
            assert_eq!(result, source);
        }
    }

    #[test]
    fn test_overwrite_existing_on_absent_field() {
        let source = store([("y", "old".into())]);
        let result = run(source.clone(), vec![Operation::overwrite_existing("x", "new")]);
        assert_eq!(result, source);
    }

    #[test]
    fn test_overwrite_existing_on_present_field() {
        for existing in [FieldValue::from("old"), list(&["old-0", "old-1"]), FieldValue::from("")] {
            let result = run(
                store([("y", "old".into()), ("x", existing)]),
                vec![Operation::overwrite_existing("x", "new")],
            );
            assert_eq!(result, store([("y", "old".into()), ("x", list(&["new"]))]));
        }
    }

    #[test]
    fn test_find_and_replace_on_absent_field() {
        let source = store([("y", "old".into())]);
        let result = run(source.clone(), vec![Operation::find_and_replace("x", [("", "new")])]);
        assert_eq!(result, source);
    }

    #[test]
    fn test_find_and_replace_empty_pattern_matches_only_empty_values() {
        let result = run(
            store([("x", list(&["", "a"]))]),
            vec![Operation::find_and_replace("x", [("", "new")])],
        );
        assert_eq!(result, store([("x", list(&["new", "a"]))]));
    }

    #[test]
    fn test_find_and_replace_scalar_becomes_sequence() {
        let result = run(
            store([("y", "old".into()), ("x", "old".into())]),
            vec![Operation::find_and_replace("x", [("[a-z]*", "new")])],
        );
        assert_eq!(result, store([("y", "old".into()), ("x", list(&["new"]))]));
    }

    #[test]
    fn test_find_and_replace_requires_full_match() {
        let result = run(
            store([("y", "old".into()), ("x", list(&["old", "123", "old-123"]))]),
            vec![Operation::find_and_replace("x", [("[a-z]*", "new")])],
        );
        assert_eq!(
            result,
            store([("y", "old".into()), ("x", list(&["new", "123", "old-123"]))])
        );
    }

    #[test]
    fn test_find_and_replace_evaluates_each_value_against_all_items() {
        let result = run(
            store([("y", "old".into()), ("x", list(&["old", "123", "old-123"]))]),
            vec![Operation::find_and_replace(
                "x",
                [("[a-z]*", "new-0"), ("[0-9]*", "new-1")],
            )],
        );
        assert_eq!(
            result,
            store([("y", "old".into()), ("x", list(&["new-0", "new-1", "old-123"]))])
        );
    }

    #[test]
    fn test_find_and_replace_first_matching_item_wins() {
        let result = run(
            store([("x", "abc".into())]),
            vec![Operation::find_and_replace("x", [("a.*", "first"), ("abc", "second")])],
        );
        assert_eq!(result, store([("x", list(&["first"]))]));
    }

    #[test]
    fn test_find_and_replace_alternation_is_anchored_as_a_whole() {
        let result = run(
            store([("x", list(&["ab", "xb"]))]),
            vec![Operation::find_and_replace("x", [("a|ab", "hit")])],
        );
        assert_eq!(result, store([("x", list(&["hit", "xb"]))]));
    }

    #[test]
    fn test_find_and_replace_invalid_pattern_logs_error() {
        let source = store([("x", "old".into())]);
        let result = MetadataOperator::new().process(
            &source,
            &[Operation::find_and_replace("x", [("(unclosed", "new")])],
        );
        assert_eq!(result.metadata, source);
        assert!(result.log.contains(crate::report::Severity::Error));
        assert!(!result.changes[0].changed);
    }

    #[test]
    fn test_sequence_of_operations() {
        let result = run(
            MetadataStore::new(),
            vec![
                Operation::set("y", "old"),
                Operation::complement("x", "new"),
                Operation::overwrite_existing("x", "new-overwritten"),
                Operation::find_and_replace("x", [("new-[a-z]*", "new-replaced")]),
            ],
        );
        assert_eq!(
            result,
            store([("y", list(&["old"])), ("x", list(&["new-replaced"]))])
        );
    }

    #[test]
    fn test_sequence_order_matters() {
        let result = run(
            MetadataStore::new(),
            vec![
                Operation::set("y", "old"),
                Operation::overwrite_existing("x", "new-overwritten"),
                Operation::complement("x", "new"),
                Operation::find_and_replace("x", [("new-[a-z]*", "new-replaced")]),
            ],
        );
        assert_eq!(result, store([("y", list(&["old"])), ("x", list(&["new"]))]));
    }

    #[test]
    fn test_literal_on_absent_field() {
        let source = store([("y", "old".into())]);
        let result = run(source.clone(), vec![Operation::find_and_replace_literal("x", [("", "new")])]);
        assert_eq!(result, source);
    }

    #[test]
    fn test_literal_does_not_touch_other_fields() {
        let source = store([("y", "old ".into())]);
        let result = run(
            source.clone(),
            vec![Operation::find_and_replace_literal("x", [("old", "new")])],
        );
        assert_eq!(result, source);
    }

    #[test]
    fn test_literal_exact_match() {
        let result = run(
            store([("y", "old".into())]),
            vec![Operation::find_and_replace_literal("y", [("old", "new")])],
        );
        assert_eq!(result, store([("y", list(&["new"]))]));
    }

    #[test]
    fn test_literal_trims_both_sides() {
        let result = run(
            store([("y", "\nold\t".into())]),
            vec![Operation::find_and_replace_literal("y", [(" old ", "new")])],
        );
        assert_eq!(result, store([("y", list(&["new"]))]));
    }

    #[test]
    fn test_literal_trims_replacement() {
        let result = run(
            store([("y", "old".into())]),
            vec![Operation::find_and_replace_literal("y", [(" old ", "new ")])],
        );
        assert_eq!(result, store([("y", list(&["new"]))]));
    }

    #[test]
    fn test_literal_keeps_internal_whitespace() {
        let result = run(
            store([("y", "not\nold\t".into())]),
            vec![Operation::find_and_replace_literal("y", [("not old", "new")])],
        );
        assert_eq!(result, store([("y", list(&["not\nold\t"]))]));
    }

    #[test]
    fn test_literal_maps_each_value() {
        let result = run(
            store([("x", "old".into()), ("y", list(&["a", "b"]))]),
            vec![Operation::find_and_replace_literal("y", [("a", "c")])],
        );
        assert_eq!(result, store([("x", "old".into()), ("y", list(&["c", "b"]))]));
    }

    #[test]
    fn test_change_log_entries() {
        let source = store([("x", "old".into())]);
        let result = MetadataOperator::new().process(
            &source,
            &[
                Operation::complement("x", "new"),
                Operation::set("x", "new"),
            ],
        );

        assert_eq!(result.changes.len(), 2);
        assert!(!result.changes[0].changed);
        assert_eq!(result.changes[0].pre, Some(FieldValue::from("old")));
        assert!(result.changes[1].changed);
        assert_eq!(result.changes[1].post, Some(list(&["new"])));

        let bodies: Vec<_> = result.log.entries().iter().map(|e| e.body.clone()).collect();
        assert_eq!(
            bodies,
            vec![
                "Mapping-operation 'complement' on 'x' did not change the value of 'old'.".to_string(),
                "Mapping-operation 'set' on 'x' changed the value from 'old' to '[\"new\"]'.".to_string(),
            ]
        );
        assert!(result
            .log
            .entries()
            .iter()
            .all(|e| e.origin == "Metadata Operator"));
    }

    #[test]
    fn test_change_log_absent_field() {
        let result = MetadataOperator::with_origin("test").process(
            &MetadataStore::new(),
            &[Operation::overwrite_existing("x", "new")],
        );
        assert_eq!(result.changes[0].pre, None);
        assert_eq!(result.changes[0].post, None);
        assert_eq!(
            result.log.entries()[0].body,
            "Mapping-operation 'overwriteExisting' on 'x' did not change the value of '<absent>'."
        );
        assert_eq!(result.log.entries()[0].origin, "test");
    }

    #[test]
    fn test_untouched_fields_keep_representation() {
        let result = run(
            store([("a", "scalar".into()), ("b", list(&["x"]))]),
            vec![Operation::set("c", "new")],
        );
        assert_eq!(result.get("a"), Some(&FieldValue::from("scalar")));
        assert_eq!(result.get("b"), Some(&list(&["x"])));
    }
}
