//! JSON Patch (RFC 6902) documents applied to serializable DTOs.
//!
//! A patch is applied to the JSON form of the target and the result is
//! deserialized back, so the patched value always has the target's shape.
//! Members the target type does not know are rejected rather than dropped.
//! Operations run in order and the first failure aborts the whole patch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("invalid JSON pointer '{0}'")]
    InvalidPointer(String),
    #[error("path '{0}' does not exist")]
    PathNotFound(String),
    #[error("cannot move '{from}' into its own child '{path}'")]
    MoveIntoChild { from: String, path: String },
    #[error("test failed at '{0}'")]
    TestFailed(String),
    #[error("patched document is invalid: {0}")]
    InvalidDocument(String),
    #[error("'{0}' is not a member of the target")]
    UnknownMember(String),
}

/// A single RFC 6902 operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

/// An ordered list of patch operations, as sent in a PATCH request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonPatch(pub Vec<PatchOperation>);

impl JsonPatch {
    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    /// Apply every operation to `doc` in place. `doc` is left untouched on
    /// failure.
    pub fn apply_to(&self, doc: &mut Value) -> Result<(), PatchError> {
        let mut working = doc.clone();
        for op in &self.0 {
            apply_operation(&mut working, op)?;
        }
        *doc = working;
        Ok(())
    }
}

/// Apply `patch` to a copy of `target` and return the patched copy.
pub fn apply_patch<T>(target: &T, patch: &JsonPatch) -> Result<T, PatchError>
where
    T: Serialize + DeserializeOwned,
{
    let mut doc =
        serde_json::to_value(target).map_err(|e| PatchError::InvalidDocument(e.to_string()))?;
    patch.apply_to(&mut doc)?;
    let patched: T = serde_json::from_value(doc.clone())
        .map_err(|e| PatchError::InvalidDocument(e.to_string()))?;
    let reread =
        serde_json::to_value(&patched).map_err(|e| PatchError::InvalidDocument(e.to_string()))?;
    match unknown_member(&doc, &reread, "") {
        Some(path) => Err(PatchError::UnknownMember(path)),
        None => Ok(patched),
    }
}

/// First pointer in `patched` whose object member did not survive the trip
/// through the target type.
fn unknown_member(patched: &Value, reread: &Value, prefix: &str) -> Option<String> {
    match (patched, reread) {
        (Value::Object(patched), Value::Object(reread)) => {
            patched.iter().find_map(|(key, value)| {
                let path = format!("{}/{}", prefix, key.replace('~', "~0").replace('/', "~1"));
                match reread.get(key) {
                    Some(known) => unknown_member(value, known, &path),
                    None => Some(path),
                }
            })
        }
        (Value::Array(patched), Value::Array(reread)) => patched
            .iter()
            .zip(reread)
            .enumerate()
            .find_map(|(i, (value, known))| {
                unknown_member(value, known, &format!("{}/{}", prefix, i))
            }),
        _ => None,
    }
}

fn apply_operation(doc: &mut Value, op: &PatchOperation) -> Result<(), PatchError> {
    match op {
        PatchOperation::Add { path, value } => add(doc, path, value.clone()),
        PatchOperation::Remove { path } => remove(doc, path).map(|_| ()),
        PatchOperation::Replace { path, value } => {
            let tokens = parse_pointer(path)?;
            let slot = resolve_mut(doc, &tokens).ok_or_else(|| not_found(path))?;
            *slot = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            if from == path {
                return Ok(());
            }
            if path.starts_with(&format!("{}/", from)) {
                return Err(PatchError::MoveIntoChild {
                    from: from.clone(),
                    path: path.clone(),
                });
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        PatchOperation::Copy { from, path } => {
            let tokens = parse_pointer(from)?;
            let value = resolve(doc, &tokens)
                .cloned()
                .ok_or_else(|| not_found(from))?;
            add(doc, path, value)
        }
        PatchOperation::Test { path, value } => {
            let tokens = parse_pointer(path)?;
            match resolve(doc, &tokens) {
                Some(actual) if actual == value => Ok(()),
                _ => Err(PatchError::TestFailed(path.clone())),
            }
        }
    }
}

fn not_found(path: &str) -> PatchError {
    PatchError::PathNotFound(path.to_string())
}

/// Split an RFC 6901 pointer into unescaped reference tokens.
fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| PatchError::InvalidPointer(pointer.to_string()))?;
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn array_index(token: &str, len: usize, allow_end: bool) -> Option<usize> {
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    let index: usize = token.parse().ok()?;
    if index < len || (allow_end && index == len) {
        Some(index)
    } else {
        None
    }
}

fn resolve<'a>(doc: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    tokens.iter().try_fold(doc, |current, token| match current {
        Value::Object(map) => map.get(token),
        Value::Array(items) => items.get(array_index(token, items.len(), false)?),
        _ => None,
    })
}

fn resolve_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Option<&'a mut Value> {
    tokens.iter().try_fold(doc, |current, token| match current {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => {
            let index = array_index(token, items.len(), false)?;
            items.get_mut(index)
        }
        _ => None,
    })
}

fn add(doc: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let tokens = parse_pointer(path)?;
    let Some((last, parent_tokens)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };
    match resolve_mut(doc, parent_tokens) {
        Some(Value::Object(map)) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Some(Value::Array(items)) => {
            if last == "-" {
                items.push(value);
                return Ok(());
            }
            let index = array_index(last, items.len(), true).ok_or_else(|| not_found(path))?;
            items.insert(index, value);
            Ok(())
        }
        _ => Err(not_found(path)),
    }
}

fn remove(doc: &mut Value, path: &str) -> Result<Value, PatchError> {
    let tokens = parse_pointer(path)?;
    let (last, parent_tokens) = tokens
        .split_last()
        .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))?;
    match resolve_mut(doc, parent_tokens) {
        Some(Value::Object(map)) => map.remove(last).ok_or_else(|| not_found(path)),
        Some(Value::Array(items)) => {
            let index = array_index(last, items.len(), false).ok_or_else(|| not_found(path))?;
            Ok(items.remove(index))
        }
        _ => Err(not_found(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(ops: Value) -> JsonPatch {
        serde_json::from_value(ops).unwrap()
    }

    #[test]
    fn deserializes_operation_tags() {
        let p = patch(json!([
            {"op": "replace", "path": "/name", "value": "x"},
            {"op": "move", "from": "/a", "path": "/b"}
        ]));
        assert_eq!(
            p.operations()[1],
            PatchOperation::Move {
                from: "/a".to_string(),
                path: "/b".to_string()
            }
        );
    }

    #[test]
    fn replace_and_add_members() {
        let mut doc = json!({"name": "Run", "target": {"value": 1}});
        patch(json!([
            {"op": "replace", "path": "/name", "value": "Walk"},
            {"op": "add", "path": "/target/unit", "value": "km"}
        ]))
        .apply_to(&mut doc)
        .unwrap();
        assert_eq!(doc, json!({"name": "Walk", "target": {"value": 1, "unit": "km"}}));
    }

    #[test]
    fn replace_missing_path_fails() {
        let mut doc = json!({"name": "Run"});
        let err = patch(json!([{"op": "replace", "path": "/nope", "value": 1}]))
            .apply_to(&mut doc)
            .unwrap_err();
        assert_eq!(err, PatchError::PathNotFound("/nope".to_string()));
    }

    #[test]
    fn array_append_insert_remove() {
        let mut doc = json!({"tags": ["a", "c"]});
        patch(json!([
            {"op": "add", "path": "/tags/1", "value": "b"},
            {"op": "add", "path": "/tags/-", "value": "d"},
            {"op": "remove", "path": "/tags/0"}
        ]))
        .apply_to(&mut doc)
        .unwrap();
        assert_eq!(doc, json!({"tags": ["b", "c", "d"]}));
    }

    #[test]
    fn escaped_pointer_tokens() {
        let mut doc = json!({"a/b": 1, "m~n": 2});
        patch(json!([
            {"op": "test", "path": "/a~1b", "value": 1},
            {"op": "remove", "path": "/m~0n"}
        ]))
        .apply_to(&mut doc)
        .unwrap();
        assert_eq!(doc, json!({"a/b": 1}));
    }

    #[test]
    fn move_and_copy() {
        let mut doc = json!({"a": {"x": 1}, "b": {}});
        patch(json!([
            {"op": "copy", "from": "/a/x", "path": "/b/y"},
            {"op": "move", "from": "/a", "path": "/c"}
        ]))
        .apply_to(&mut doc)
        .unwrap();
        assert_eq!(doc, json!({"b": {"y": 1}, "c": {"x": 1}}));
    }

    #[test]
    fn move_into_own_child_rejected() {
        let mut doc = json!({"a": {"b": {}}});
        let err = patch(json!([{"op": "move", "from": "/a", "path": "/a/b/c"}]))
            .apply_to(&mut doc)
            .unwrap_err();
        assert!(matches!(err, PatchError::MoveIntoChild { .. }));
    }

    #[test]
    fn failed_test_leaves_document_unchanged() {
        let mut doc = json!({"name": "Run"});
        let err = patch(json!([
            {"op": "replace", "path": "/name", "value": "Walk"},
            {"op": "test", "path": "/name", "value": "Run"}
        ]))
        .apply_to(&mut doc)
        .unwrap_err();
        assert_eq!(err, PatchError::TestFailed("/name".to_string()));
        assert_eq!(doc, json!({"name": "Run"}));
    }

    #[test]
    fn pointer_without_leading_slash_rejected() {
        let mut doc = json!({});
        assert!(matches!(
            patch(json!([{"op": "add", "path": "name", "value": 1}])).apply_to(&mut doc),
            Err(PatchError::InvalidPointer(_))
        ));
    }

    #[test]
    fn typed_patch_rejects_shape_changes() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Item {
            name: String,
            count: i64,
        }
        let item = Item {
            name: "x".to_string(),
            count: 1,
        };
        let ok = apply_patch(
            &item,
            &patch(json!([{"op": "replace", "path": "/count", "value": 2}])),
        )
        .unwrap();
        assert_eq!(ok.count, 2);

        let err = apply_patch(
            &item,
            &patch(json!([{"op": "replace", "path": "/count", "value": "two"}])),
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::InvalidDocument(_)));
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Entry {
        name: String,
        note: Option<String>,
        target: Goal,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Goal {
        value: i64,
    }

    fn entry() -> Entry {
        Entry {
            name: "Read".to_string(),
            note: None,
            target: Goal { value: 1 },
        }
    }

    #[test]
    fn typed_patch_rejects_unknown_members() {
        let err = apply_patch(
            &entry(),
            &patch(json!([{"op": "add", "path": "/Name", "value": "Renamed"}])),
        )
        .unwrap_err();
        assert_eq!(err, PatchError::UnknownMember("/Name".to_string()));

        let err = apply_patch(
            &entry(),
            &patch(json!([{"op": "add", "path": "/bogus", "value": 1}])),
        )
        .unwrap_err();
        assert_eq!(err, PatchError::UnknownMember("/bogus".to_string()));

        let err = apply_patch(
            &entry(),
            &patch(json!([{"op": "add", "path": "/target/units", "value": "km"}])),
        )
        .unwrap_err();
        assert_eq!(err, PatchError::UnknownMember("/target/units".to_string()));
    }

    #[test]
    fn typed_patch_accepts_known_null_members() {
        let patched = apply_patch(
            &entry(),
            &patch(json!([{"op": "add", "path": "/note", "value": "daily"}])),
        )
        .unwrap();
        assert_eq!(patched.note.as_deref(), Some("daily"));
    }
}
