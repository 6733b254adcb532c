//! Tool-call boundary
//!
//! Assistant messages may request tool execution through structured
//! [`ToolCall`] records (a name plus JSON arguments). The step layer parses
//! those records and dispatches them through a [`ToolRegistry`], which is an
//! explicit allow-list: only registered tools run, and tools that produce
//! filesystem artifacts must land them under the registry's configured
//! artifact roots. Both checks happen before the tool executes and before
//! anything is persisted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

use crate::step::BoxError;

/// A structured tool invocation parsed from an assistant message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Tool name; must match a registered tool exactly
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Errors raised by the tool layer
#[derive(Debug, Error)]
pub enum ToolError {
    /// The call named a tool that is not registered
    #[error("tool '{0}' is not on the allow-list")]
    NotAllowed(String),

    /// A tool tried to place an artifact outside the permitted roots
    #[error("artifact path '{0}' is outside the allowed roots")]
    PathOutsideRoots(String),

    /// The tool itself failed
    #[error("tool '{name}' failed: {source}")]
    Execution {
        name: String,
        #[source]
        source: BoxError,
    },
}

impl ToolError {
    /// True for validation failures that must reject the call before it
    /// executes, as opposed to a failure of an allowed tool
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotAllowed(_) | Self::PathOutsideRoots(_))
    }
}

/// Async tool implementation
pub type ToolHandler =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = std::result::Result<Value, BoxError>> + Send>> + Send + Sync>;

/// Allow-list of executable tools
///
/// Registration is the allow-list; there is no separate enable flag. A
/// registry with no artifact roots configured rejects every artifact path.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolHandler>,
    artifact_roots: Vec<PathBuf>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its dispatch name
    pub fn register(&mut self, name: impl Into<String>, handler: ToolHandler) -> &mut Self {
        self.tools.insert(name.into(), handler);
        self
    }

    /// Permit artifacts under this directory
    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_roots.push(root.into());
        self
    }

    /// Whether a tool name is on the allow-list
    pub fn is_allowed(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, for diagnostics
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Check an artifact path against the configured roots
    ///
    /// The check is lexical: paths containing parent-directory components
    /// are rejected outright, and the remainder must sit under one of the
    /// roots. Tools that write files call this before touching the
    /// filesystem.
    pub fn validate_artifact_path(&self, path: &Path) -> std::result::Result<(), ToolError> {
        let rejected = || ToolError::PathOutsideRoots(path.display().to_string());

        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(rejected());
        }
        if self.artifact_roots.iter().any(|root| path.starts_with(root)) {
            Ok(())
        } else {
            Err(rejected())
        }
    }

    /// Execute a call through the allow-list
    ///
    /// Unregistered names are rejected without executing anything.
    pub async fn dispatch(&self, call: &ToolCall) -> std::result::Result<Value, ToolError> {
        let handler = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotAllowed(call.name.clone()))?;

        handler(call.arguments.clone())
            .await
            .map_err(|source| ToolError::Execution {
                name: call.name.clone(),
                source,
            })
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("artifact_roots", &self.artifact_roots)
            .finish()
    }
}
