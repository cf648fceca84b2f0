//! Environment variable resolution.
//!
//! The environment is read once into an [`EnvSnapshot`]. Each registered
//! field is then resolved against it by trying the field's candidate names in
//! order:
//!
//! - an absent name is skipped;
//! - the first present name is authoritative. Its value is converted and
//!   stored, or the conversion failure is recorded on the field. Later
//!   candidates are never consulted, even after a failure;
//! - with no present name the field keeps its default.
//!
//! A failing field never stops resolution of the others.

use std::string::String;
use std::vec::Vec;

use indexmap::IndexMap;

use crate::field::FieldId;
use crate::registry::FieldRegistry;

// ============================================================================
// EnvSource trait
// ============================================================================

/// Trait for abstracting over environment variable sources.
///
/// This allows testing without modifying the actual environment.
pub trait EnvSource {
    /// Get the value of an environment variable by name.
    fn get(&self, name: &str) -> Option<String>;

    /// Iterate over all environment variables.
    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_>;
}

/// Environment source that reads from the actual process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvSource for StdEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    /// Variables whose name or value is not valid UTF-8 are skipped.
    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_> {
        Box::new(std::env::vars_os().filter_map(|(k, v)| {
            match (k.into_string(), v.into_string()) {
                (Ok(k), Ok(v)) => Some((k, v)),
                (k, _) => {
                    tracing::trace!(var = ?k, "env: skipping non-UTF-8 variable");
                    None
                }
            }
        }))
    }
}

/// Environment source backed by a map (for testing).
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: IndexMap<String, String>,
}

impl MockEnv {
    /// Create a new empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock environment from an iterator of key-value pairs.
    pub fn from_pairs<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set an environment variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl EnvSource for MockEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_> {
        Box::new(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

// ============================================================================
// EnvConfig
// ============================================================================

/// Configuration for the environment layer.
#[derive(Default)]
pub struct EnvConfig {
    /// Custom environment source. If None, uses [`StdEnv`].
    pub source: Option<Box<dyn EnvSource>>,

    /// Extra prefixes whose variables are echoed in debug mode, besides the
    /// registry prefix (e.g. `DRONE_`).
    pub watch_prefixes: Vec<String>,
}

impl EnvConfig {
    /// Get the env source, or StdEnv if none set.
    pub fn source(&self) -> &dyn EnvSource {
        self.source.as_ref().map(|s| s.as_ref()).unwrap_or(&StdEnv)
    }
}

/// Builder for environment configuration.
#[derive(Default)]
pub struct EnvConfigBuilder {
    config: EnvConfig,
}

impl EnvConfigBuilder {
    /// Create a new env config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom environment source.
    pub fn source(mut self, source: impl EnvSource + 'static) -> Self {
        self.config.source = Some(Box::new(source));
        self
    }

    /// Echo variables starting with `prefix` in debug mode.
    pub fn watch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.watch_prefixes.push(prefix.into());
        self
    }

    /// Build the env configuration.
    pub fn build(self) -> EnvConfig {
        self.config
    }
}

// ============================================================================
// EnvSnapshot
// ============================================================================

/// The environment as seen by one run: a name-to-value map, read once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: IndexMap<String, String>,
}

impl EnvSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every variable out of `source`.
    pub fn from_source(source: &dyn EnvSource) -> Self {
        Self {
            vars: source.vars().collect(),
        }
    }

    /// Build a snapshot from key-value pairs.
    pub fn from_pairs<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Whether `name` is present (possibly with an empty value).
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Insert `name` only if it is not already present. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        match self.vars.entry(name.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
        }
    }

    /// Iterate variables in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvSource for EnvSnapshot {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_> {
        Box::new(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// What the environment layer did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvOutput {
    /// Fields set from the environment.
    pub set: Vec<FieldId>,
    /// Fields whose matched variable failed to convert.
    pub failed: Vec<FieldId>,
}

/// Resolve every field in `registry` against `snapshot`, in registration order.
pub fn resolve_env(registry: &mut FieldRegistry, snapshot: &EnvSnapshot) -> EnvOutput {
    let mut output = EnvOutput::default();

    for field in registry.iter_mut() {
        let Some((var, raw)) = field
            .env_names
            .iter()
            .find_map(|name| snapshot.get(name).map(|raw| (name.clone(), raw)))
        else {
            tracing::trace!(field = %field.name, "env: no candidate present");
            continue;
        };

        match field.set_from_env(&var, raw) {
            Ok(()) => {
                tracing::debug!(field = %field.name, var = %var, "env: set");
                output.set.push(field.id);
            }
            Err(e) => {
                tracing::debug!(field = %field.name, var = %var, error = %e, "env: parse failed");
                output.failed.push(field.id);
            }
        }
    }

    output
}
