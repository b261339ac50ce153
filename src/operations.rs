//! Operation model
//!
//! An [`Operation`] is one edit instruction for a metadata store: the field it
//! targets plus the parameters of its kind. Operations are plain data; the
//! behavior of each kind lives in [`crate::operator`], which dispatches on the
//! variant.
//!
//! The serde representation is the wire shape of a job request:
//!
//! ```json
//! { "type": "findAndReplace", "targetField": "Source-Organization",
//!   "items": [ { "regex": "ACME.*", "value": "ACME Corp." } ] }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Discriminant of an [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Set,
    Complement,
    OverwriteExisting,
    FindAndReplace,
    FindAndReplaceLiteral,
}

impl OperationKind {
    /// All kinds, in the order they are documented.
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Set,
        OperationKind::Complement,
        OperationKind::OverwriteExisting,
        OperationKind::FindAndReplace,
        OperationKind::FindAndReplaceLiteral,
    ];

    /// Wire name of the kind (`"overwriteExisting"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Set => "set",
            OperationKind::Complement => "complement",
            OperationKind::OverwriteExisting => "overwriteExisting",
            OperationKind::FindAndReplace => "findAndReplace",
            OperationKind::FindAndReplaceLiteral => "findAndReplaceLiteral",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown operation type '{}'", s))
    }
}

/// One pattern/replacement pair of a `findAndReplace` operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindAndReplaceItem {
    /// Regular expression that has to match a whole field value.
    pub regex: String,
    /// Replacement for a matching value.
    pub value: String,
}

/// One literal/replacement pair of a `findAndReplaceLiteral` operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindAndReplaceLiteralItem {
    /// Literal compared against a field value, both sides trimmed.
    pub literal: String,
    /// Replacement for a matching value (trimmed when applied).
    pub value: String,
}

/// A single edit instruction for a metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    /// Replace the field with `[value]`.
    Set {
        #[serde(rename = "targetField")]
        target_field: String,
        value: String,
    },
    /// Set the field to `[value]` if it is absent.
    Complement {
        #[serde(rename = "targetField")]
        target_field: String,
        value: String,
    },
    /// Set the field to `[value]` if it is present.
    OverwriteExisting {
        #[serde(rename = "targetField")]
        target_field: String,
        value: String,
    },
    /// Replace values fully matched by one of the regular expressions.
    FindAndReplace {
        #[serde(rename = "targetField")]
        target_field: String,
        items: Vec<FindAndReplaceItem>,
    },
    /// Replace values equal to one of the literals after trimming.
    FindAndReplaceLiteral {
        #[serde(rename = "targetField")]
        target_field: String,
        items: Vec<FindAndReplaceLiteralItem>,
    },
}

impl Operation {
    pub fn set(target_field: impl Into<String>, value: impl Into<String>) -> Self {
        Operation::Set {
            target_field: target_field.into(),
            value: value.into(),
        }
    }

    pub fn complement(target_field: impl Into<String>, value: impl Into<String>) -> Self {
        Operation::Complement {
            target_field: target_field.into(),
            value: value.into(),
        }
    }

    pub fn overwrite_existing(target_field: impl Into<String>, value: impl Into<String>) -> Self {
        Operation::OverwriteExisting {
            target_field: target_field.into(),
            value: value.into(),
        }
    }

    /// `findAndReplace` from `(regex, value)` pairs
    pub fn find_and_replace<R, V>(target_field: impl Into<String>, items: impl IntoIterator<Item = (R, V)>) -> Self
    where
        R: Into<String>,
        V: Into<String>,
    {
        Operation::FindAndReplace {
            target_field: target_field.into(),
            items: items
                .into_iter()
                .map(|(regex, value)| FindAndReplaceItem {
                    regex: regex.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    /// `findAndReplaceLiteral` from `(literal, value)` pairs
    pub fn find_and_replace_literal<L, V>(
        target_field: impl Into<String>,
        items: impl IntoIterator<Item = (L, V)>,
    ) -> Self
    where
        L: Into<String>,
        V: Into<String>,
    {
        Operation::FindAndReplaceLiteral {
            target_field: target_field.into(),
            items: items
                .into_iter()
                .map(|(literal, value)| FindAndReplaceLiteralItem {
                    literal: literal.into(),
                    value: value.into(),
                })
                .collect(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Set { .. } => OperationKind::Set,
            Operation::Complement { .. } => OperationKind::Complement,
            Operation::OverwriteExisting { .. } => OperationKind::OverwriteExisting,
            Operation::FindAndReplace { .. } => OperationKind::FindAndReplace,
            Operation::FindAndReplaceLiteral { .. } => OperationKind::FindAndReplaceLiteral,
        }
    }

    pub fn target_field(&self) -> &str {
        match self {
            Operation::Set { target_field, .. }
            | Operation::Complement { target_field, .. }
            | Operation::OverwriteExisting { target_field, .. }
            | Operation::FindAndReplace { target_field, .. }
            | Operation::FindAndReplaceLiteral { target_field, .. } => target_field,
        }
    }
}
