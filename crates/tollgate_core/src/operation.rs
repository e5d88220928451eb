//! Operations handed to a transport.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Whether an operation only reads remote state or changes it.
///
/// Write operations are never cached: memoizing a side-effecting call would
/// silently swallow repeat submissions.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    /// Side-effect free lookup
    #[default]
    #[display("read")]
    Read,
    /// Call with side effects (filing, submitting, mutating)
    #[display("write")]
    Write,
}

/// A single call against the remote API.
///
/// The pipeline never inspects verbs or wire formats. It only needs a stable
/// name for logging and error context, the parameters for cache-key
/// derivation, and the read/write distinction.
///
/// # Examples
///
/// ```
/// use tollgate_core::{Operation, OperationKind};
/// use serde_json::json;
///
/// let op = Operation::read("company.lookup").with_param("number", json!("01234567"));
///
/// assert_eq!(op.name(), "company.lookup");
/// assert_eq!(*op.kind(), OperationKind::Read);
/// assert_eq!(op.params()["number"], json!("01234567"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Operation {
    /// Endpoint identity (e.g. "company.lookup")
    name: String,
    /// Read or write
    #[serde(default)]
    kind: OperationKind,
    /// Request parameters
    #[serde(default)]
    params: HashMap<String, JsonValue>,
}

impl Operation {
    /// Create an operation of the given kind with no parameters.
    pub fn new(name: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            params: HashMap::new(),
        }
    }

    /// Create a side-effect free operation.
    pub fn read(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Read)
    }

    /// Create a side-effecting operation.
    pub fn write(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Write)
    }

    /// Add or replace a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Replace all parameters.
    pub fn with_params(mut self, params: HashMap<String, JsonValue>) -> Self {
        self.params = params;
        self
    }

    /// True if this operation has side effects.
    pub fn is_write(&self) -> bool {
        self.kind == OperationKind::Write
    }
}
