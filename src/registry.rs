//! The per-run field registry.
//!
//! Fields are registered once, during setup, and kept in registration order.
//! Every later phase (env resolution, flag parsing, reporting) walks them in
//! that order so output is reproducible.

use std::collections::HashSet;
use std::string::String;
use std::sync::atomic::{AtomicU64, Ordering};
use std::vec::Vec;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::field::{Field, FieldHandle, FieldId};
use crate::layers::file::ENV_FILE_FLAG;
use crate::value::{
    Adapter, BoolValue, IntValue, StringListValue, StringMapValue, StringValue, TimestampValue,
};

/// Prefix used for derived environment variable names unless another is given.
pub const DEFAULT_PREFIX: &str = "PLUGIN_";

static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(1);

/// Derive the default environment variable name for a flag.
///
/// Lower-cases the flag name, replaces `.` and `-` with `_`, upper-cases the
/// result and puts `prefix` in front.
///
/// ```rust
/// use plugin_env::derive_env_name;
///
/// assert_eq!(derive_env_name("PLUGIN_", "repo.owner"), "PLUGIN_REPO_OWNER");
/// assert_eq!(derive_env_name("PLUGIN_", "another-option"), "PLUGIN_ANOTHER_OPTION");
/// ```
pub fn derive_env_name(prefix: &str, flag_name: &str) -> String {
    let lowered = flag_name.to_lowercase().replace(['.', '-'], "_");
    format!("{}{}", prefix, lowered.to_uppercase())
}

/// Registered fields, in registration order.
#[derive(Debug)]
pub struct FieldRegistry {
    id: u64,
    prefix: String,
    fields: Vec<Field>,
    by_name: IndexMap<String, usize>,
    env_files: Option<EnvFiles>,
}

#[derive(Debug)]
struct EnvFiles {
    handle: FieldHandle<StringListValue>,
    defaults: Vec<String>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRegistry {
    /// Create a registry using [`DEFAULT_PREFIX`].
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Create a registry whose derived env names start with `prefix`.
    ///
    /// The prefix is upper-cased, so `"plugin_"` and `"PLUGIN_"` are equivalent.
    pub fn with_prefix(prefix: impl AsRef<str>) -> Self {
        Self {
            id: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            prefix: prefix.as_ref().to_uppercase(),
            fields: Vec::new(),
            by_name: IndexMap::new(),
            env_files: None,
        }
    }

    /// The upper-cased prefix for derived names.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a field backed by `adapter`, whose current value is the default.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or already registered. Both are programming
    /// errors in the caller's setup code.
    pub fn register<A: Adapter>(
        &mut self,
        name: impl Into<String>,
        adapter: A,
        usage: impl Into<String>,
    ) -> FieldHandle<A> {
        let name = name.into();
        if name.is_empty() {
            panic!("programming error: field registered with an empty name");
        }
        if self.by_name.contains_key(&name) {
            panic!("programming error: field '{name}' registered twice");
        }
        let id = FieldId {
            registry: self.id,
            index: self.fields.len(),
        };
        let default_env_name = derive_env_name(&self.prefix, &name);
        tracing::trace!(field = %name, env = %default_env_name, "registry: register");
        self.by_name.insert(name.clone(), id.index);
        self.fields.push(Field::new(
            id,
            name,
            Box::new(adapter),
            usage.into(),
            default_env_name,
        ));
        FieldHandle::new(id)
    }

    /// Register a string field.
    pub fn string(
        &mut self,
        name: impl Into<String>,
        default: impl Into<String>,
        usage: impl Into<String>,
    ) -> FieldHandle<StringValue> {
        self.register(name, StringValue::new(default), usage)
    }

    /// Register a boolean field.
    pub fn bool(
        &mut self,
        name: impl Into<String>,
        default: bool,
        usage: impl Into<String>,
    ) -> FieldHandle<BoolValue> {
        self.register(name, BoolValue::new(default), usage)
    }

    /// Register a 64-bit integer field.
    pub fn int(
        &mut self,
        name: impl Into<String>,
        default: i64,
        usage: impl Into<String>,
    ) -> FieldHandle<IntValue> {
        self.register(name, IntValue::new(default), usage)
    }

    /// Register a timestamp field.
    pub fn timestamp(
        &mut self,
        name: impl Into<String>,
        default: Option<DateTime<Utc>>,
        usage: impl Into<String>,
    ) -> FieldHandle<TimestampValue> {
        self.register(name, TimestampValue::new(default), usage)
    }

    /// Register a comma separated string list field.
    pub fn string_list<I, S>(
        &mut self,
        name: impl Into<String>,
        default: I,
        usage: impl Into<String>,
    ) -> FieldHandle<StringListValue>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(name, StringListValue::new(default), usage)
    }

    /// Register a JSON string map field.
    pub fn string_map<I, K, V>(
        &mut self,
        name: impl Into<String>,
        default: I,
        usage: impl Into<String>,
    ) -> FieldHandle<StringMapValue>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.register(name, StringMapValue::new(default), usage)
    }

    /// Replace the candidate environment variable names of a field.
    ///
    /// Names are checked in the given order. They are upper-cased but not
    /// prefixed. An empty string stands for the derived default name, so
    /// `["", "DOWNSTREAM_SERVER"]` keeps the default and adds an alias. An
    /// empty list restores the default name alone.
    pub fn env<I, S>(&mut self, field: impl Into<FieldId>, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let field = self.field_mut(field.into());
        let mut resolved: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref();
            let name = if name.is_empty() {
                field.default_env_name.clone()
            } else {
                name.to_uppercase()
            };
            if !resolved.contains(&name) {
                resolved.push(name);
            }
        }
        if resolved.is_empty() {
            resolved.push(field.default_env_name.clone());
        }
        tracing::trace!(field = %field.name, names = ?resolved, "registry: candidate names");
        field.env_names = resolved;
    }

    /// Hide the field's value in reports.
    pub fn sensitive(&mut self, field: impl Into<FieldId>) {
        self.field_mut(field.into()).sensitive = true;
    }

    /// Enable override files, loaded before environment resolution.
    ///
    /// Registers an `env_file` list field (settable by `PREFIX_ENV_FILE` or
    /// `-env_file`) if not already present. Non-empty `defaults` replace the
    /// paths used when neither is given.
    pub fn env_files<I, S>(&mut self, defaults: I) -> FieldHandle<StringListValue>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let defaults: Vec<String> = defaults.into_iter().map(Into::into).collect();
        match &mut self.env_files {
            Some(files) => {
                if !defaults.is_empty() {
                    files.defaults = defaults;
                }
                files.handle
            }
            None => {
                let handle = self.string_list(ENV_FILE_FLAG, defaults.clone(), "source env file");
                self.env_files = Some(EnvFiles { handle, defaults });
                handle
            }
        }
    }

    /// Default override file paths, if override files are enabled.
    pub fn env_file_defaults(&self) -> Option<&[String]> {
        self.env_files.as_ref().map(|f| f.defaults.as_slice())
    }

    /// Read the current value of a field.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by a different registry.
    pub fn get<A: Adapter>(&self, handle: FieldHandle<A>) -> &A::Value {
        let field = self.field(handle.id());
        match field.value.as_any().downcast_ref::<A>() {
            Some(adapter) => adapter.value(),
            None => panic!(
                "programming error: field '{}' is a {}, not the requested type",
                field.name,
                field.value.type_name()
            ),
        }
    }

    /// Look up a field by handle or id in constant time.
    ///
    /// # Panics
    ///
    /// Panics if the id was issued by a different registry.
    pub fn field(&self, id: impl Into<FieldId>) -> &Field {
        let id = id.into();
        match self.try_field(id) {
            Some(field) => field,
            None => panic!("programming error: {id:?} does not belong to this registry"),
        }
    }

    /// Look up a field by id, returning `None` for foreign ids.
    pub fn try_field(&self, id: FieldId) -> Option<&Field> {
        if id.registry != self.id {
            return None;
        }
        self.fields.get(id.index)
    }

    pub(crate) fn field_mut(&mut self, id: FieldId) -> &mut Field {
        if id.registry != self.id || id.index >= self.fields.len() {
            panic!("programming error: {id:?} does not belong to this registry");
        }
        &mut self.fields[id.index]
    }

    /// Look up a field by flag name.
    pub fn by_name(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    pub(crate) fn by_name_mut(&mut self, name: &str) -> Option<&mut Field> {
        let index = *self.by_name.get(name)?;
        self.fields.get_mut(index)
    }

    /// Whether a flag name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Call `f` for every field in registration order.
    pub fn visit_all(&self, mut f: impl FnMut(&Field)) {
        for field in &self.fields {
            f(field);
        }
    }

    /// Iterate fields in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    /// Candidate env names of every sensitive field.
    pub(crate) fn sensitive_env_names(&self) -> HashSet<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_sensitive())
            .flat_map(|f| f.env_names().iter().map(String::as_str))
            .collect()
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flag names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}
