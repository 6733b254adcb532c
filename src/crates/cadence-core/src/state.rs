//! Workflow state schema and reducers
//!
//! Workflow state is a JSON object whose merge behavior is declared up front
//! by a [`StateSchema`]: every field is bound to a [`Reducer`] that decides
//! how a step's partial update combines with the current value. This is what
//! makes merging non-destructive where it needs to be: a step that returns
//! only new messages *appends* to the message history, while a step that
//! returns a scalar field overwrites it.
//!
//! The schema is fixed per workflow definition; steps cannot change merge
//! semantics at run time.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while merging or validating state
#[derive(Debug, Error)]
pub enum StateError {
    /// State or update was not the JSON shape the schema expects
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A reducer was handed incompatible value types
    #[error("Reducer error on field '{field}': {message}")]
    ReducerError { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, StateError>;

/// How updates to a single state field combine with the current value
pub trait Reducer: Send + Sync {
    /// Merge `update` into `current`; `current` is `Null` for unset fields
    fn reduce(&self, current: &Value, update: &Value) -> std::result::Result<Value, String>;

    /// Human-readable name for diagnostics
    fn name(&self) -> &str;
}

/// Last write wins
///
/// Default behavior for scalar fields such as a category tag or an answer.
#[derive(Debug, Clone)]
pub struct OverwriteReducer;

impl Reducer for OverwriteReducer {
    fn reduce(&self, _current: &Value, update: &Value) -> std::result::Result<Value, String> {
        Ok(update.clone())
    }

    fn name(&self) -> &str {
        "overwrite"
    }
}

/// Append to an array, never replacing existing elements
///
/// Used for message history and other append-only sequences. An array update
/// is concatenated; a scalar update is pushed as a single element; an unset
/// field is initialized from the update.
#[derive(Debug, Clone)]
pub struct AppendReducer;

impl Reducer for AppendReducer {
    fn reduce(&self, current: &Value, update: &Value) -> std::result::Result<Value, String> {
        match (current, update) {
            (Value::Array(curr), Value::Array(upd)) => {
                let mut merged = curr.clone();
                merged.extend_from_slice(upd);
                Ok(Value::Array(merged))
            }
            (Value::Null, Value::Array(upd)) => Ok(Value::Array(upd.clone())),
            (Value::Array(curr), single) => {
                let mut merged = curr.clone();
                merged.push(single.clone());
                Ok(Value::Array(merged))
            }
            (Value::Null, single) => Ok(Value::Array(vec![single.clone()])),
            _ => Err("append requires the current value to be an array".to_string()),
        }
    }

    fn name(&self) -> &str {
        "append"
    }
}

/// Shallow object merge; update keys win on conflict
#[derive(Debug, Clone)]
pub struct MergeReducer;

impl Reducer for MergeReducer {
    fn reduce(&self, current: &Value, update: &Value) -> std::result::Result<Value, String> {
        match (current, update) {
            (Value::Object(curr), Value::Object(upd)) => {
                let mut merged = curr.clone();
                for (key, value) in upd {
                    merged.insert(key.clone(), value.clone());
                }
                Ok(Value::Object(merged))
            }
            (Value::Null, Value::Object(upd)) => Ok(Value::Object(upd.clone())),
            _ => Err("merge requires object values".to_string()),
        }
    }

    fn name(&self) -> &str {
        "merge"
    }
}

/// Per-workflow state schema: field name to reducer
///
/// Fields without an explicit binding use the default reducer (overwrite).
pub struct StateSchema {
    fields: std::collections::HashMap<String, Box<dyn Reducer>>,
    default: Box<dyn Reducer>,
}

impl StateSchema {
    pub fn new() -> Self {
        Self {
            fields: std::collections::HashMap::new(),
            default: Box::new(OverwriteReducer),
        }
    }

    /// Bind a field to a reducer
    pub fn add_field(&mut self, field: impl Into<String>, reducer: Box<dyn Reducer>) {
        self.fields.insert(field.into(), reducer);
    }

    /// Builder-style variant of [`add_field`](Self::add_field)
    pub fn with_field(mut self, field: impl Into<String>, reducer: Box<dyn Reducer>) -> Self {
        self.add_field(field, reducer);
        self
    }

    /// Replace the default reducer used for undeclared fields
    pub fn with_default_reducer(mut self, reducer: Box<dyn Reducer>) -> Self {
        self.default = reducer;
        self
    }

    /// Merge a step's partial update into `state`
    ///
    /// `state` must be a JSON object (it is initialized to `{}` at run
    /// start). A `Null` update is a no-op, so steps may return an empty
    /// update without special-casing.
    pub fn apply(&self, state: &mut Value, update: &Value) -> Result<()> {
        if update.is_null() {
            return Ok(());
        }

        let update_map = update.as_object().ok_or_else(|| {
            StateError::InvalidState(format!("state update must be an object, got {update}"))
        })?;
        let state_map = state.as_object_mut().ok_or_else(|| {
            StateError::InvalidState("state must be an object".to_string())
        })?;

        for (field, incoming) in update_map {
            let reducer = self.fields.get(field).unwrap_or(&self.default);
            let current = state_map.get(field).cloned().unwrap_or(Value::Null);
            let merged = reducer.reduce(&current, incoming).map_err(|message| {
                StateError::ReducerError {
                    field: field.clone(),
                    message,
                }
            })?;
            state_map.insert(field.clone(), merged);
        }

        Ok(())
    }
}

impl Default for StateSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// First field in `required` that is absent (or null) in `state`, if any
pub fn missing_required<'a>(state: &Value, required: &'a [String]) -> Option<&'a str> {
    required
        .iter()
        .find(|field| state.get(field.as_str()).map_or(true, Value::is_null))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn support_schema() -> StateSchema {
        StateSchema::new().with_field("messages", Box::new(AppendReducer))
    }

    #[test]
    fn test_append_preserves_existing_messages() {
        let schema = support_schema();
        let mut state = json!({"messages": [{"role": "user", "content": "hi"}]});

        schema
            .apply(&mut state, &json!({"messages": [{"role": "assistant", "content": "hello"}]}))
            .unwrap();

        assert_eq!(state["messages"].as_array().unwrap().len(), 2);
        assert_eq!(state["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_scalar_field_overwrites() {
        let schema = support_schema();
        let mut state = json!({"category": "tech"});

        schema.apply(&mut state, &json!({"category": "general"})).unwrap();
        assert_eq!(state["category"], "general");
    }

    #[test]
    fn test_apply_initializes_unset_append_field() {
        let schema = support_schema();
        let mut state = json!({});

        schema
            .apply(&mut state, &json!({"messages": [{"role": "user", "content": "hi"}]}))
            .unwrap();
        assert_eq!(state["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_null_update_is_noop() {
        let schema = support_schema();
        let mut state = json!({"messages": [1]});
        schema.apply(&mut state, &Value::Null).unwrap();
        assert_eq!(state, json!({"messages": [1]}));
    }

    #[test]
    fn test_non_object_update_rejected() {
        let schema = support_schema();
        let mut state = json!({});
        let err = schema.apply(&mut state, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, StateError::InvalidState(_)));
    }

    #[test]
    fn test_append_type_mismatch_reports_field() {
        let schema = support_schema();
        let mut state = json!({"messages": "not-an-array"});

        let err = schema
            .apply(&mut state, &json!({"messages": ["x"]}))
            .unwrap_err();
        match err {
            StateError::ReducerError { field, .. } => assert_eq!(field, "messages"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_reducer_shallow() {
        let reducer = MergeReducer;
        let merged = reducer
            .reduce(&json!({"a": 1, "b": 2}), &json!({"b": 3, "c": 4}))
            .unwrap();
        assert_eq!(merged, json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_missing_required() {
        let state = json!({"question": "why", "category": null});
        let required = vec!["question".to_string(), "category".to_string()];
        assert_eq!(missing_required(&state, &required), Some("category"));

        let required = vec!["question".to_string()];
        assert_eq!(missing_required(&state, &required), None);
    }
}
