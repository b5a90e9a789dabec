//! Tag transform rules applied after master tags are merged.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::Tags;

type ComputeFnInner = dyn Fn(&Tags) -> Option<String> + Send + Sync;

/// A named, pure function deriving a tag value from the current tag set.
///
/// Returning `None` leaves the tag set unchanged.
#[derive(Clone)]
pub struct ComputeFn {
    name: String,
    func: Arc<ComputeFnInner>,
}

impl ComputeFn {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Tags) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, tags: &Tags) -> Option<String> {
        (self.func)(tags)
    }
}

impl fmt::Debug for ComputeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComputeFn").field(&self.name).finish()
    }
}

/// What to do with the tag named by a [`TransformEntry`].
#[derive(Debug, Clone)]
pub enum TransformRule {
    /// Move the value to another key, removing the old key.
    Rename(String),
    /// Delete the key.
    Remove,
    /// Replace the value with a static string.
    Set(String),
    /// Derive the value from the current tags.
    Compute(ComputeFn),
}

impl TransformRule {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rename(_) => "rename",
            Self::Remove => "remove",
            Self::Set(_) => "set",
            Self::Compute(_) => "compute",
        }
    }
}

/// One transform step. Entries are applied in profile order.
#[derive(Debug, Clone)]
pub struct TransformEntry {
    pub key: String,
    pub rule: TransformRule,
}

impl TransformEntry {
    pub fn new(key: impl Into<String>, rule: TransformRule) -> Self {
        Self {
            key: key.into(),
            rule,
        }
    }
}

/// Compute functions available to profiles by name.
#[derive(Debug, Clone, Default)]
pub struct ComputeRegistry {
    functions: BTreeMap<String, ComputeFn>,
}

impl ComputeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function, replacing any previous one with the same name.
    pub fn register(&mut self, function: ComputeFn) {
        self.functions.insert(function.name().to_string(), function);
    }

    #[must_use]
    pub fn with(mut self, function: ComputeFn) -> Self {
        self.register(function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ComputeFn> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}
