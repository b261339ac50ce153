//! Property-based tests for the metadata operator.
//!
//! These tests use proptest to generate random stores and operation
//! parameters and verify that the operator's invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::operations::Operation;
    use crate::operator::MetadataOperator;
    use crate::store::{FieldValue, MetadataStore};
    use proptest::prelude::*;

    fn field_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            ".{0,8}".prop_map(FieldValue::Single),
            prop::collection::vec(".{0,8}", 0..4).prop_map(FieldValue::List),
        ]
    }

    fn metadata_store() -> impl Strategy<Value = MetadataStore> {
        prop::collection::vec(("[a-z]{1,3}", field_value()), 0..6)
            .prop_map(|fields| fields.into_iter().collect())
    }

    proptest! {
        /// Property: no operations means an identical store and an empty log
        #[test]
        fn empty_operations_are_identity(store in metadata_store()) {
            let result = MetadataOperator::new().process(&store, &[]);
            prop_assert_eq!(result.metadata, store);
            prop_assert!(result.log.is_empty());
        }

        /// Property: complement never changes a present field
        #[test]
        fn complement_is_noop_when_present(
            store in metadata_store(),
            value in field_value(),
            new in ".{0,8}",
        ) {
            let mut store = store;
            store.insert("target", value);
            let result = MetadataOperator::new()
                .process(&store, &[Operation::complement("target", new)]);
            prop_assert_eq!(&result.metadata, &store);
            prop_assert!(!result.changes[0].changed);
        }

        /// Property: overwriteExisting is a no-op on absent fields
        #[test]
        fn overwrite_existing_is_noop_when_absent(store in metadata_store(), new in ".{0,8}") {
            let mut store = store;
            store.remove("target");
            let result = MetadataOperator::new()
                .process(&store, &[Operation::overwrite_existing("target", new)]);
            prop_assert_eq!(result.metadata, store);
        }

        /// Property: overwriteExisting collapses present values to `[value]`
        /// and applying it twice equals applying it once
        #[test]
        fn overwrite_existing_is_idempotent(
            store in metadata_store(),
            value in field_value(),
            new in ".{0,8}",
        ) {
            let mut store = store;
            store.insert("target", value);
            let operator = MetadataOperator::new();
            let op = Operation::overwrite_existing("target", new.clone());

            let once = operator.process(&store, std::slice::from_ref(&op)).metadata;
            let twice = operator.process(&store, &[op.clone(), op]).metadata;
            prop_assert_eq!(once.get("target"), Some(&FieldValue::list_of(new)));
            prop_assert_eq!(once, twice);
        }

        /// Property: touched fields always hold a sequence afterwards
        #[test]
        fn touched_fields_hold_sequences(
            store in metadata_store(),
            value in field_value(),
            pattern in "[a-z.*]{0,4}",
            literal in ".{0,4}",
        ) {
            let mut store = store;
            store.insert("target", value);
            let operations = [
                Operation::find_and_replace("target", [(pattern, "r".to_string())]),
                Operation::find_and_replace_literal("target", [(literal, " l ".to_string())]),
            ];
            let result = MetadataOperator::new().process(&store, &operations);
            prop_assert!(result.metadata.get("target").is_some_and(FieldValue::is_list));
        }

        /// Property: the literal match ignores surrounding whitespace on both sides
        #[test]
        fn literal_match_ignores_surrounding_whitespace(
            word in "[a-z]{1,6}",
            left in "[ \t\n]{0,3}",
            right in "[ \t\n]{0,3}",
        ) {
            let store: MetadataStore =
                [("target", format!("{}{}{}", left, word, right))].into_iter().collect();
            let result = MetadataOperator::new().process(
                &store,
                &[Operation::find_and_replace_literal("target", [(format!(" {} ", word), "hit")])],
            );
            prop_assert_eq!(result.metadata.get("target"), Some(&FieldValue::list_of("hit")));
        }
    }
}
