//! Error types for field resolution, override files, argument parsing and the
//! aggregate run failure.
//!
//! Field-scoped errors ([`ParseError`], usage messages) are recorded on the
//! registry and never abort a run. Only [`ConfigError`] is handed back to the
//! caller, once every phase has completed.

use std::string::String;
use std::vec::Vec;

use camino::Utf8PathBuf;
use indexmap::IndexMap;

/// A raw value was found for a field but could not be converted to its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The raw input that failed to convert.
    pub value: String,
    /// Name of the target type, e.g. `"int"` or `"string map"`.
    pub type_name: &'static str,
    /// Why the conversion failed.
    pub message: String,
}

impl ParseError {
    /// Create a parse error for `value` of type `type_name`.
    pub fn new(value: impl Into<String>, type_name: &'static str, message: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            type_name,
            message: message.into(),
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "invalid {} value {:?}: {}",
            self.type_name, self.value, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// An override file could not be used. Logged and skipped, never fatal.
#[derive(Debug)]
pub enum FileLoadError {
    /// The file could not be opened or read.
    Read {
        /// Path of the file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file was readable but a line was malformed.
    Parse {
        /// Path of the file.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },
}

impl FileLoadError {
    pub(crate) fn from_dotenv(path: Utf8PathBuf, error: dotenvy::Error) -> Self {
        match error {
            dotenvy::Error::Io(source) => FileLoadError::Read { path, source },
            other => FileLoadError::Parse {
                path,
                message: other.to_string(),
            },
        }
    }

    /// Path of the file that failed to load.
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            FileLoadError::Read { path, .. } | FileLoadError::Parse { path, .. } => path,
        }
    }
}

impl core::fmt::Display for FileLoadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FileLoadError::Read { path, source } => write!(f, "error reading {path}: {source}"),
            FileLoadError::Parse { path, message } => write!(f, "error parsing {path}: {message}"),
        }
    }
}

impl std::error::Error for FileLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileLoadError::Read { source, .. } => Some(source),
            FileLoadError::Parse { .. } => None,
        }
    }
}

/// A command-line problem that cannot be attributed to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    /// A flag was given that no field is registered for.
    UnknownFlag {
        /// The flag as written, e.g. `-colour`.
        arg: String,
    },
    /// A non-boolean flag was the last argument and had no value.
    MissingValue {
        /// The flag as written.
        arg: String,
    },
    /// A flag was written with a malformed name, e.g. `---x` or `-=x`.
    BadSyntax {
        /// The argument as written.
        arg: String,
    },
}

impl core::fmt::Display for ArgError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ArgError::UnknownFlag { arg } => write!(f, "flag provided but not defined: {arg}"),
            ArgError::MissingValue { arg } => write!(f, "flag needs an argument: {arg}"),
            ArgError::BadSyntax { arg } => write!(f, "bad flag syntax: {arg}"),
        }
    }
}

impl std::error::Error for ArgError {}

/// What the domain callback returns when it does not succeed.
#[derive(Debug)]
pub enum ExecError {
    /// The callback found invalid options and attached usage messages to fields.
    Usage,
    /// Any other failure.
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl ExecError {
    /// Wrap an arbitrary error (or message) as a callback failure.
    pub fn failed(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ExecError::Failed(error.into())
    }

    /// Whether this is the distinguished usage failure.
    pub fn is_usage(&self) -> bool {
        matches!(self, ExecError::Usage)
    }
}

impl core::fmt::Display for ExecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ExecError::Usage => f.write_str("usage error"),
            ExecError::Failed(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::Usage => None,
            ExecError::Failed(e) => Some(e.as_ref()),
        }
    }
}

/// The aggregate failure of a run.
///
/// Carries the callback's error (if any) together with every field-scoped
/// problem, keyed by flag name in registration order.
#[derive(Debug, Default)]
pub struct ConfigError {
    /// Error returned by the domain callback.
    pub exec: Option<ExecError>,
    /// Conversion failures, one per field at most.
    pub parse_errors: IndexMap<String, ParseError>,
    /// Usage messages attached by the callback.
    pub usage_errors: IndexMap<String, Vec<String>>,
    /// Command-line errors not tied to a field.
    pub arg_errors: Vec<ArgError>,
}

impl ConfigError {
    /// Whether nothing at all went wrong.
    pub fn is_empty(&self) -> bool {
        self.exec.is_none()
            && self.parse_errors.is_empty()
            && self.usage_errors.is_empty()
            && self.arg_errors.is_empty()
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Whether `flag_name` has any parse error or usage message.
    pub fn has_field(&self, flag_name: &str) -> bool {
        self.parse_errors.contains_key(flag_name) || self.usage_errors.contains_key(flag_name)
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if !self.usage_errors.is_empty() {
            parts.push(format!("{} usage errors", self.usage_errors.len()));
        }
        if !self.parse_errors.is_empty() {
            parts.push(format!("{} parse errors", self.parse_errors.len()));
        }
        for arg in &self.arg_errors {
            parts.push(arg.to_string());
        }
        match &self.exec {
            Some(ExecError::Usage) if !self.usage_errors.is_empty() => {}
            Some(e) => parts.push(e.to_string()),
            None => {}
        }
        if parts.is_empty() {
            return f.write_str("no errors");
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.exec.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}
