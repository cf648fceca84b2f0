//! Provenance tracking for resolved fields.
//!
//! A field's provenance names the source that last successfully set its value.
//! A conversion failure never changes it.
//!
//! # Example
//!
//! ```rust
//! use plugin_env::Provenance;
//!
//! let env = Provenance::env("PLUGIN_SERVER");
//! assert!(env.is_env());
//! assert_eq!(env.source_description(), "set by env `PLUGIN_SERVER`");
//!
//! let flag = Provenance::flag("server");
//! assert!(flag.priority() > env.priority());
//! ```

use std::string::String;

/// The origin of a field's current value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Provenance {
    /// Never set, and the default renders as empty.
    #[default]
    Unset,

    /// Never set, holding a non-empty default.
    Default,

    /// Set from an environment variable.
    Env {
        /// The candidate name that matched, e.g. `PLUGIN_SERVER`.
        var: String,
    },

    /// Set by a command-line argument.
    Flag {
        /// The flag name, without dashes.
        name: String,
    },
}

impl Provenance {
    /// Create an environment variable provenance.
    pub fn env(var: impl Into<String>) -> Self {
        Self::Env { var: var.into() }
    }

    /// Create a command-line flag provenance.
    pub fn flag(name: impl Into<String>) -> Self {
        Self::Flag { name: name.into() }
    }

    /// Initial provenance for a freshly registered field.
    pub(crate) fn initial(rendered_default: &str) -> Self {
        if rendered_default.is_empty() {
            Self::Unset
        } else {
            Self::Default
        }
    }

    /// Check if this provenance is from the environment.
    pub fn is_env(&self) -> bool {
        matches!(self, Self::Env { .. })
    }

    /// Check if this provenance is from the command line.
    pub fn is_flag(&self) -> bool {
        matches!(self, Self::Flag { .. })
    }

    /// Whether any source set the value.
    pub fn is_set(&self) -> bool {
        self.is_env() || self.is_flag()
    }

    /// Get the priority of this provenance source.
    ///
    /// Higher numbers mean higher priority:
    /// - Flag: 3 (highest)
    /// - Env: 2
    /// - Default: 1
    /// - Unset: 0 (lowest)
    pub fn priority(&self) -> u8 {
        match self {
            Self::Flag { .. } => 3,
            Self::Env { .. } => 2,
            Self::Default => 1,
            Self::Unset => 0,
        }
    }

    /// Get a human-readable description of the source, as shown in reports.
    pub fn source_description(&self) -> String {
        match self {
            Self::Flag { name } => format!("set by flag `{name}`"),
            Self::Env { var } => format!("set by env `{var}`"),
            Self::Default => "default".into(),
            Self::Unset => "unset".into(),
        }
    }
}

impl core::fmt::Display for Provenance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Flag { name } => write!(f, "from command-line flag -{name}"),
            Self::Env { var } => write!(f, "from environment variable {var}"),
            Self::Default => write!(f, "from default"),
            Self::Unset => write!(f, "unset"),
        }
    }
}
