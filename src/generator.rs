//! SQL generators for `.gen` migrations
//!
//! A generated migration is a `.gen` file in the migrations directory paired
//! with a callback registered here under the same file name. The callback is
//! a pure function of no arguments; the loader requires it to produce a JSON
//! string and rejects any other value. The registry is threaded explicitly
//! through the loader rather than held in process-wide state.

use crate::error::MigrateError;
use serde_json::Value;
use std::collections::HashMap;

type Generator = Box<dyn Fn() -> Value + Send + Sync>;

/// Registry of SQL generator callbacks, keyed by migration file name.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Generator>,
}

impl GeneratorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator for a `.gen` file name, e.g. `"3_seed_roles.gen"`.
    ///
    /// Registering the same file name twice replaces the earlier generator.
    pub fn register<F>(&mut self, file_name: impl Into<String>, generator: F) -> &mut Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.generators.insert(file_name.into(), Box::new(generator));
        self
    }

    /// Number of registered generators.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Whether the registry has no generators.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Invoke the generator registered for `file_name` and validate its result.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::Script` if no generator is registered for the
    /// file, or if the generator returns anything other than a string.
    pub fn generate(&self, file_name: &str) -> Result<String, MigrateError> {
        let generator = self
            .generators
            .get(file_name)
            .ok_or_else(|| MigrateError::Script {
                file_name: file_name.to_string(),
                detail: "no SQL generator registered for this file; \
                         register one with GeneratorRegistry::register"
                    .to_string(),
            })?;

        match generator() {
            Value::String(sql) => Ok(sql),
            other => Err(MigrateError::Script {
                file_name: file_name.to_string(),
                detail: format!(
                    "generator must return a string, got {}",
                    json_type_name(&other)
                ),
            }),
        }
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
