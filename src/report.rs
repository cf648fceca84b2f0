//! The end-of-run report: every field, partitioned by resolution state.

use std::string::String;
use std::vec::Vec;

use crate::dump::{self, RenderOptions};
use crate::error::{ArgError, ConfigError, ExecError};
use crate::field::{Field, FieldHandle, FieldId};
use crate::layers::file::FileResolution;
use crate::registry::FieldRegistry;
use crate::usage::UsageErrors;
use crate::value::Adapter;

/// Resolution state of a field, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Not set by any source and no default.
    Unset,
    /// Not set by any source, non-empty default.
    Default,
    /// Set from the environment or a flag.
    Set,
    /// Has a parse error or at least one usage message.
    Error,
}

impl Bucket {
    /// All buckets, in render order.
    pub const ALL: [Bucket; 4] = [Bucket::Unset, Bucket::Default, Bucket::Set, Bucket::Error];

    /// Header used in the full report.
    pub fn header(self) -> &'static str {
        match self {
            Bucket::Unset => "UNSET",
            Bucket::Default => "DEFAULT",
            Bucket::Set => "SET",
            Bucket::Error => "ERRORS",
        }
    }

    fn slot(self) -> usize {
        match self {
            Bucket::Unset => 0,
            Bucket::Default => 1,
            Bucket::Set => 2,
            Bucket::Error => 3,
        }
    }

    /// Classify one field.
    ///
    /// Errors win over everything else; otherwise a field that no source set
    /// is unset or default depending on whether its default renders empty.
    pub fn classify(field: &Field, usage: &UsageErrors) -> Bucket {
        if field.parse_error().is_some() || usage.contains(field.id()) {
            Bucket::Error
        } else if field.provenance().is_set() {
            Bucket::Set
        } else if field.has_default() {
            Bucket::Default
        } else {
            Bucket::Unset
        }
    }
}

/// Everything a run resolved, for rendering and for the caller to inspect.
#[derive(Debug)]
pub struct Report {
    registry: FieldRegistry,
    usage: UsageErrors,
    buckets: [Vec<FieldId>; 4],
    arg_errors: Vec<ArgError>,
    files: Option<FileResolution>,
    positionals: Vec<String>,
}

impl Report {
    /// Partition the fields of `registry`.
    pub fn new(registry: FieldRegistry, usage: UsageErrors) -> Self {
        let mut buckets: [Vec<FieldId>; 4] = Default::default();
        for field in registry.iter() {
            buckets[Bucket::classify(field, &usage).slot()].push(field.id());
        }
        Self {
            registry,
            usage,
            buckets,
            arg_errors: Vec::new(),
            files: None,
            positionals: Vec::new(),
        }
    }

    pub(crate) fn with_arg_errors(mut self, errors: Vec<ArgError>) -> Self {
        self.arg_errors = errors;
        self
    }

    pub(crate) fn with_files(mut self, files: Option<FileResolution>) -> Self {
        self.files = files;
        self
    }

    pub(crate) fn with_positionals(mut self, positionals: Vec<String>) -> Self {
        self.positionals = positionals;
        self
    }

    /// The registry the report was built from.
    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    /// Read a resolved value.
    pub fn get<A: Adapter>(&self, handle: FieldHandle<A>) -> &A::Value {
        self.registry.get(handle)
    }

    /// Look up a field.
    pub fn field(&self, id: impl Into<FieldId>) -> &Field {
        self.registry.field(id)
    }

    /// Field ids in `bucket`, in registration order.
    pub fn bucket(&self, bucket: Bucket) -> &[FieldId] {
        &self.buckets[bucket.slot()]
    }

    /// Fields in `bucket`, in registration order.
    pub fn fields_in(&self, bucket: Bucket) -> impl Iterator<Item = &Field> {
        self.bucket(bucket).iter().map(|id| self.registry.field(*id))
    }

    /// Which bucket a field landed in.
    pub fn bucket_of(&self, id: impl Into<FieldId>) -> Bucket {
        let id = id.into();
        Bucket::ALL
            .into_iter()
            .find(|b| self.bucket(*b).contains(&id))
            .unwrap_or_else(|| panic!("programming error: {id:?} does not belong to this report"))
    }

    /// Usage messages attached to a field.
    pub fn usage_errors(&self, id: impl Into<FieldId>) -> &[String] {
        self.usage.get(id)
    }

    /// The full usage error log.
    pub fn usage(&self) -> &UsageErrors {
        &self.usage
    }

    /// Command-line errors not tied to a field.
    pub fn arg_errors(&self) -> &[ArgError] {
        &self.arg_errors
    }

    /// Override files that were considered, if override files are enabled.
    pub fn files(&self) -> Option<&FileResolution> {
        self.files.as_ref()
    }

    /// Arguments left over after flag parsing.
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// Whether any field is in the error bucket or any argument was rejected.
    pub fn has_errors(&self) -> bool {
        !self.bucket(Bucket::Error).is_empty() || !self.arg_errors.is_empty()
    }

    /// Compute the verdict: `None` on success, the aggregate error otherwise.
    ///
    /// The run fails if any field has a parse error or usage message, any
    /// argument was rejected, or the callback returned an error.
    pub fn verdict(&self, exec: Option<ExecError>) -> Option<ConfigError> {
        let mut error = ConfigError {
            exec,
            arg_errors: self.arg_errors.clone(),
            ..ConfigError::default()
        };
        for field in self.fields_in(Bucket::Error) {
            if let Some(e) = field.parse_error() {
                error.parse_errors.insert(field.name().to_string(), e.clone());
            }
            let messages = self.usage.get(field.id());
            if !messages.is_empty() {
                error
                    .usage_errors
                    .insert(field.name().to_string(), messages.to_vec());
            }
        }
        if error.is_empty() { None } else { Some(error) }
    }

    /// Render the full bucketed table.
    pub fn render(&self, opts: &RenderOptions) -> String {
        dump::render_full(self, opts)
    }

    /// Render one line per field.
    pub fn render_compact(&self, opts: &RenderOptions) -> String {
        dump::render_compact(self, opts)
    }
}
