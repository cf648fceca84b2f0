//! Fields and the handles that identify them.

use std::marker::PhantomData;
use std::string::String;
use std::vec::Vec;

use crate::error::ParseError;
use crate::provenance::Provenance;
use crate::value::FlagValue;

/// Stands in for the value of a sensitive field.
pub(crate) const REDACTED: &str = "[REDACTED]";

/// Identity of a field: the registry it belongs to and its registration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub(crate) registry: u64,
    pub(crate) index: usize,
}

impl FieldId {
    /// Position of the field in registration order.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Typed, copyable handle returned when a field is registered.
///
/// Used to read the resolved value and to attach usage errors to the field.
pub struct FieldHandle<A> {
    id: FieldId,
    _marker: PhantomData<fn() -> A>,
}

impl<A> FieldHandle<A> {
    pub(crate) fn new(id: FieldId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The untyped identity of this field.
    pub fn id(&self) -> FieldId {
        self.id
    }
}

impl<A> Clone for FieldHandle<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for FieldHandle<A> {}

impl<A> core::fmt::Debug for FieldHandle<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("FieldHandle").field(&self.id).finish()
    }
}

impl<A> PartialEq for FieldHandle<A> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<A> Eq for FieldHandle<A> {}

impl<A> From<FieldHandle<A>> for FieldId {
    fn from(handle: FieldHandle<A>) -> Self {
        handle.id
    }
}

impl<A> From<&FieldHandle<A>> for FieldId {
    fn from(handle: &FieldHandle<A>) -> Self {
        handle.id
    }
}

/// The environment variable that determined (or tried to determine) a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvMatch {
    /// Candidate name that was found in the snapshot.
    pub var: String,
    /// Raw value found under that name.
    pub raw: String,
}

/// One configuration item and its resolution state.
#[derive(Debug)]
pub struct Field {
    pub(crate) id: FieldId,
    pub(crate) name: String,
    pub(crate) usage: String,
    pub(crate) env_names: Vec<String>,
    pub(crate) default_env_name: String,
    pub(crate) value: Box<dyn FlagValue>,
    pub(crate) default_rendered: String,
    pub(crate) provenance: Provenance,
    pub(crate) env_match: Option<EnvMatch>,
    pub(crate) flag_present: bool,
    pub(crate) parse_error: Option<ParseError>,
    pub(crate) sensitive: bool,
}

impl Field {
    pub(crate) fn new(
        id: FieldId,
        name: String,
        value: Box<dyn FlagValue>,
        usage: String,
        default_env_name: String,
    ) -> Self {
        let default_rendered = value.render();
        Self {
            id,
            provenance: Provenance::initial(&default_rendered),
            env_names: vec![default_env_name.clone()],
            name,
            usage,
            default_env_name,
            value,
            default_rendered,
            env_match: None,
            flag_present: false,
            parse_error: None,
            sensitive: false,
        }
    }

    /// Identity of this field.
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// The flag name, e.g. `repo.owner`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text given at registration.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Candidate environment variable names, in precedence order. Never empty.
    pub fn env_names(&self) -> &[String] {
        &self.env_names
    }

    /// The name derived from the flag name and the registry prefix.
    pub fn default_env_name(&self) -> &str {
        &self.default_env_name
    }

    /// The adapter holding the current value.
    pub fn value(&self) -> &dyn FlagValue {
        self.value.as_ref()
    }

    /// The current value, rendered.
    pub fn rendered(&self) -> String {
        self.value.render()
    }

    /// The default value, rendered at registration time.
    pub fn default_rendered(&self) -> &str {
        &self.default_rendered
    }

    /// Whether the default renders as non-empty.
    pub fn has_default(&self) -> bool {
        !self.default_rendered.is_empty()
    }

    /// The source that last set the value.
    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// The environment variable that matched during resolution, if any.
    pub fn env_match(&self) -> Option<&EnvMatch> {
        self.env_match.as_ref()
    }

    /// Whether the flag was given on the command line.
    pub fn flag_present(&self) -> bool {
        self.flag_present
    }

    /// Conversion failure recorded on this field, if any.
    pub fn parse_error(&self) -> Option<&ParseError> {
        self.parse_error.as_ref()
    }

    /// Whether the value is hidden in reports.
    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    fn redact(&self, e: ParseError) -> ParseError {
        if self.sensitive {
            ParseError {
                value: REDACTED.to_string(),
                ..e
            }
        } else {
            e
        }
    }

    pub(crate) fn set_from_env(&mut self, var: &str, raw: &str) -> Result<(), ParseError> {
        self.env_match = Some(EnvMatch {
            var: var.to_string(),
            raw: raw.to_string(),
        });
        match self.value.set(raw) {
            Ok(()) => {
                self.provenance = Provenance::env(var);
                Ok(())
            }
            Err(e) => {
                let e = self.redact(e);
                self.parse_error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub(crate) fn set_from_flag(&mut self, raw: &str) -> Result<(), ParseError> {
        self.flag_present = true;
        match self.value.set(raw) {
            Ok(()) => {
                self.provenance = Provenance::flag(self.name.clone());
                Ok(())
            }
            Err(e) => {
                let e = self.redact(e);
                self.parse_error = Some(e.clone());
                Err(e)
            }
        }
    }
}
