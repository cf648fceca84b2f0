//! Command-line flag overlay.
//!
//! Runs after environment resolution against the same fields. A flag that is
//! actually present on the command line overwrites the value and marks the
//! field as set by flag, whatever the environment did. Presence is recorded
//! when the flag is seen; values are never compared against defaults.
//!
//! Accepted forms: `-name value`, `--name value`, `-name=value`,
//! `--name=value`, and for booleans `-name` alone. `--` ends flag parsing, as
//! does the first argument that is not a flag; everything after is returned
//! as positionals.

use std::string::{String, ToString};
use std::vec::Vec;

use crate::error::{ArgError, ParseError};
use crate::field::FieldId;
use crate::registry::FieldRegistry;

// ============================================================================
// CliConfig
// ============================================================================

/// Configuration for command-line parsing.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Raw arguments, without the program name.
    args: Vec<String>,
}

impl CliConfig {
    /// Get the arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Builder for CLI configuration.
#[derive(Debug, Default)]
pub struct CliConfigBuilder {
    config: CliConfig,
}

impl CliConfigBuilder {
    /// Create a new CLI config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the arguments to parse (without the program name).
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.args = args.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Set arguments from an OsString iterator that starts with the program
    /// name (e.g. `std::env::args_os()`). Non UTF-8 arguments are dropped.
    pub fn args_os<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.config.args = args
            .into_iter()
            .skip(1)
            .filter_map(|s| s.as_ref().to_str().map(|s| s.to_string()))
            .collect();
        self
    }

    /// Build the CLI configuration.
    pub fn build(self) -> CliConfig {
        self.config
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Result of the flag overlay.
#[derive(Debug, Default)]
pub struct CliOutput {
    /// Fields set by a flag, in the order the flags appeared.
    pub set: Vec<FieldId>,
    /// Fields whose flag value failed to convert.
    pub failed: Vec<(FieldId, ParseError)>,
    /// Problems not tied to a field.
    pub errors: Vec<ArgError>,
    /// Arguments left after flag parsing stopped.
    pub positionals: Vec<String>,
}

/// Apply command-line flags to `registry`.
pub fn parse_cli(registry: &mut FieldRegistry, cli_config: &CliConfig) -> CliOutput {
    let mut ctx = ParseContext::new(cli_config.args(), registry);
    ctx.parse();
    ctx.output
}

/// Parser state for one pass over the arguments.
struct ParseContext<'a> {
    args: &'a [String],
    index: usize,
    registry: &'a mut FieldRegistry,
    output: CliOutput,
}

impl<'a> ParseContext<'a> {
    fn new(args: &'a [String], registry: &'a mut FieldRegistry) -> Self {
        Self {
            args,
            index: 0,
            registry,
            output: CliOutput::default(),
        }
    }

    fn parse(&mut self) {
        let args = self.args;
        while self.index < args.len() {
            let arg = args[self.index].as_str();
            if arg == "--" {
                self.index += 1;
                break;
            }
            if arg == "-" || !arg.starts_with('-') {
                break;
            }
            self.index += 1;
            self.parse_flag(arg);
        }
        self.output.positionals = args[self.index..].to_vec();
    }

    fn parse_flag(&mut self, arg: &str) {
        let body = arg
            .strip_prefix("--")
            .or_else(|| arg.strip_prefix('-'))
            .unwrap_or(arg);
        if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
            self.output.errors.push(ArgError::BadSyntax {
                arg: arg.to_string(),
            });
            return;
        }

        let (name, inline_value) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };

        let Some(field) = self.registry.by_name(name) else {
            tracing::debug!(arg, "cli: unknown flag");
            self.output.errors.push(ArgError::UnknownFlag {
                arg: arg.to_string(),
            });
            return;
        };
        let is_bool = field.value().is_bool_flag();

        let value = match inline_value {
            Some(value) => value.to_string(),
            None if is_bool => "true".to_string(),
            None => match self.args.get(self.index).cloned() {
                Some(next) => {
                    self.index += 1;
                    next
                }
                None => {
                    self.output.errors.push(ArgError::MissingValue {
                        arg: arg.to_string(),
                    });
                    return;
                }
            },
        };

        self.apply(name, &value);
    }

    fn apply(&mut self, name: &str, value: &str) {
        let Some(field) = self.registry.by_name_mut(name) else {
            return;
        };
        let id = field.id;
        match field.set_from_flag(value) {
            Ok(()) => {
                tracing::debug!(flag = name, "cli: set");
                self.output.set.push(id);
            }
            Err(e) => {
                tracing::debug!(flag = name, error = %e, "cli: parse failed");
                self.output.failed.push((id, e));
            }
        }
    }
}
