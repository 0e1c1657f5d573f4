use serde_json::{Map, Value};

/// Named options handed to a template for one render call
///
/// Keys are kept sorted so that two contexts built from the same options
/// always render identically, whatever order they were inserted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    values: Map<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a JSON object of options
    pub fn from_options(options: &Map<String, Value>) -> Self {
        Self {
            values: options.clone(),
        }
    }

    /// Insert a value, replacing any previous value under `key`
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}
