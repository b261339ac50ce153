//! # Job Submission
//!
//! Parsing and validation of preparation requests.
//!
//! A request is a JSON object:
//!
//! ```json
//! {
//!   "preparation": {
//!     "target": {"path": "ip/abcde"},
//!     "bagInfoOperations": [
//!       {"type": "complement", "targetField": "Source-Organization", "value": "ACME"}
//!     ],
//!     "sigPropOperations": [
//!       {"type": "set", "targetField": "content", "value": "text"}
//!     ]
//!   },
//!   "token": "optional job token",
//!   "callbackUrl": "https://example.org/done"
//! }
//! ```
//!
//! The request is walked value by value instead of being deserialized in one
//! go so that every rejection names the exact location of the problem. All
//! rejections use [`Error::InvalidRequest`].

use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::operations::{FindAndReplaceItem, FindAndReplaceLiteralItem, Operation, OperationKind};
use crate::operator::anchored;

/// A validated preparation job
#[derive(Debug, Clone, PartialEq)]
pub struct PreparationJob {
    /// Job token, taken from the request or freshly generated.
    pub token: String,
    /// Source package directory, resolved against the working directory.
    pub target: PathBuf,
    /// Operations for the bag-info stage.
    pub bag_info_operations: Vec<Operation>,
    /// Operations for the significant-properties stage.
    pub sig_prop_operations: Vec<Operation>,
    /// Endpoint notified once the job reached a terminal state.
    pub callback_url: Option<Url>,
    /// The request as submitted.
    pub args: Value,
}

impl PreparationJob {
    /// Parse and validate a JSON request.
    pub fn from_json(text: &str, work_dir: &Path) -> Result<Self> {
        let args: Value =
            serde_json::from_str(text).map_err(|e| Error::invalid("$", format!("malformed JSON: {}", e)))?;
        Self::from_value(args, work_dir)
    }

    /// Validate an already decoded request.
    pub fn from_value(args: Value, work_dir: &Path) -> Result<Self> {
        let root = object(&args, "$")?;
        reject_unknown(root, &["preparation", "token", "callbackUrl"], "$")?;

        let preparation = object(required(root, "preparation", "$")?, "preparation")?;
        reject_unknown(
            preparation,
            &["target", "bagInfoOperations", "sigPropOperations"],
            "preparation",
        )?;

        let target = object(required(preparation, "target", "preparation")?, "preparation.target")?;
        reject_unknown(target, &["path"], "preparation.target")?;
        let target = resolve_target(required_str(target, "path", "preparation.target")?, work_dir)?;

        let bag_info_operations = operations(preparation, "bagInfoOperations")?;
        let sig_prop_operations = operations(preparation, "sigPropOperations")?;

        let token = match root.get("token") {
            None | Some(Value::Null) => Uuid::new_v4().to_string(),
            Some(Value::String(token)) if !token.is_empty() => token.clone(),
            Some(_) => return Err(Error::invalid("token", "expected a non-empty string")),
        };

        let callback_url = match root.get("callbackUrl") {
            None | Some(Value::Null) => None,
            Some(Value::String(url)) => Some(callback(url)?),
            Some(_) => return Err(Error::invalid("callbackUrl", "expected a string")),
        };

        debug!(
            "Accepted job {} for {} ({} bag-info, {} significant-properties operations)",
            token,
            target.display(),
            bag_info_operations.len(),
            sig_prop_operations.len()
        );

        Ok(Self {
            token,
            target,
            bag_info_operations,
            sig_prop_operations,
            callback_url,
            args,
        })
    }
}

fn object<'a>(value: &'a Value, location: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::invalid(location, format!("expected an object, found {}", type_name(value))))
}

fn required<'a>(map: &'a Map<String, Value>, key: &str, location: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| Error::invalid(location, format!("missing required key '{}'", key)))
}

fn required_str<'a>(map: &'a Map<String, Value>, key: &str, location: &str) -> Result<&'a str> {
    let value = required(map, key, location)?;
    value.as_str().ok_or_else(|| {
        Error::invalid(
            join(location, key),
            format!("expected a string, found {}", type_name(value)),
        )
    })
}

fn reject_unknown(map: &Map<String, Value>, allowed: &[&str], location: &str) -> Result<()> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(Error::invalid(
            location,
            format!("unknown key '{}' (allowed: {})", key, allowed.join(", ")),
        )),
        None => Ok(()),
    }
}

fn join(location: &str, key: &str) -> String {
    if location == "$" {
        key.to_string()
    } else {
        format!("{}.{}", location, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn resolve_target(path: &str, work_dir: &Path) -> Result<PathBuf> {
    if path.is_empty() {
        return Err(Error::invalid("preparation.target.path", "path must not be empty"));
    }
    let resolved = work_dir.join(path);
    if !resolved.is_dir() {
        return Err(Error::invalid(
            "preparation.target.path",
            format!("'{}' is not an existing directory", path),
        ));
    }
    Ok(resolved)
}

fn callback(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::invalid("callbackUrl", format!("'{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::invalid(
            "callbackUrl",
            format!("unsupported scheme '{}', expected http or https", scheme),
        )),
    }
}

fn operations(preparation: &Map<String, Value>, key: &str) -> Result<Vec<Operation>> {
    let location = format!("preparation.{}", key);
    let items = match preparation.get(key) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(Error::invalid(
                location,
                format!("expected an array, found {}", type_name(other)),
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_operation(item, &format!("{}[{}]", location, i)))
        .collect()
}

/// Validate a single operation object.
pub fn parse_operation(value: &Value, location: &str) -> Result<Operation> {
    let map = object(value, location)?;
    let kind: OperationKind = required_str(map, "type", location)?
        .parse()
        .map_err(|message: String| Error::invalid(join(location, "type"), message))?;
    let target_field = required_str(map, "targetField", location)?.to_string();

    let operation = match kind {
        OperationKind::Set | OperationKind::Complement | OperationKind::OverwriteExisting => {
            reject_unknown(map, &["type", "targetField", "value"], location)?;
            let value = required_str(map, "value", location)?.to_string();
            match kind {
                OperationKind::Set => Operation::Set { target_field, value },
                OperationKind::Complement => Operation::Complement { target_field, value },
                _ => Operation::OverwriteExisting { target_field, value },
            }
        }
        OperationKind::FindAndReplace => {
            reject_unknown(map, &["type", "targetField", "items"], location)?;
            let items = pairs(map, location, "regex")?
                .into_iter()
                .map(|(regex, value, item_location)| -> Result<FindAndReplaceItem> {
                    anchored(&regex).map_err(|e| {
                        Error::invalid(join(&item_location, "regex"), format!("invalid pattern: {}", e))
                    })?;
                    Ok(FindAndReplaceItem { regex, value })
                })
                .collect::<Result<_>>()?;
            Operation::FindAndReplace { target_field, items }
        }
        OperationKind::FindAndReplaceLiteral => {
            reject_unknown(map, &["type", "targetField", "items"], location)?;
            let items = pairs(map, location, "literal")?
                .into_iter()
                .map(|(literal, value, _)| FindAndReplaceLiteralItem { literal, value })
                .collect();
            Operation::FindAndReplaceLiteral { target_field, items }
        }
    };
    Ok(operation)
}

/// Collect `{<match_key>: str, "value": str}` items with their locations.
fn pairs(map: &Map<String, Value>, location: &str, match_key: &str) -> Result<Vec<(String, String, String)>> {
    let items_location = join(location, "items");
    let items = required(map, "items", location)?.as_array().ok_or_else(|| {
        Error::invalid(&items_location, "expected an array")
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let item_location = format!("{}[{}]", items_location, i);
            let item = object(item, &item_location)?;
            reject_unknown(item, &[match_key, "value"], &item_location)?;
            let matcher = required_str(item, match_key, &item_location)?.to_string();
            let value = required_str(item, "value", &item_location)?.to_string();
            Ok((matcher, value, item_location))
        })
        .collect()
}
