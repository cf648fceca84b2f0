//! Driver API for running a plugin against its configuration.
//!
//! One run is strictly ordered: override files, environment, flags, the
//! domain callback, then the report and the verdict. Nothing that goes wrong
//! in one field stops the pipeline; the verdict is computed only after the
//! callback has run, so the report is always complete.

use std::string::String;
use std::vec::Vec;

use supports_color::Stream;

use crate::builder::Config;
use crate::color::should_use_color;
use crate::dump::{DEFAULT_MAX_VALUE_LEN, RenderOptions};
use crate::error::{ConfigError, ExecError};
use crate::field::{Field, FieldHandle, FieldId, REDACTED};
use crate::layers::cli::{CliConfigBuilder, parse_cli};
use crate::layers::env::{EnvConfig, EnvSnapshot, resolve_env};
use crate::layers::file::load_override_files;
use crate::log::Logger;
use crate::registry::FieldRegistry;
use crate::report::Report;
use crate::usage::UsageErrors;
use crate::value::Adapter;

/// Name, after the registry prefix, of the variable that turns on debug mode.
pub const DEBUG_VAR: &str = "PLUGIN_DEBUG";

/// Runs the resolution pipeline and the domain callback.
pub struct Driver {
    config: Config,
}

impl Driver {
    /// Create a driver from a built configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Resolve `registry`, call `exec`, and report.
    ///
    /// `exec` always runs, even when fields failed to resolve, so that it can
    /// add its own usage errors to the same report.
    pub fn run<F>(self, mut registry: FieldRegistry, exec: F) -> DriverOutcome
    where
        F: FnOnce(&mut ExecContext<'_>) -> Result<(), ExecError>,
    {
        let Config {
            cli_config,
            env_config,
            log_config,
            output_config,
        } = self.config;

        let env_config = env_config.unwrap_or_default();
        let mut snapshot = EnvSnapshot::from_source(env_config.source());
        let cli_config = cli_config
            .unwrap_or_else(|| CliConfigBuilder::new().args_os(std::env::args_os()).build());
        let custom_log = log_config.as_ref().is_some_and(|l| l.is_custom());
        let mut log = log_config.map(|l| l.into_logger()).unwrap_or_default();

        let debug_var = format!("{}{}", registry.prefix(), DEBUG_VAR);
        let debug_mode = output_config
            .debug
            .unwrap_or_else(|| snapshot.get(&debug_var).is_some_and(|v| !v.is_empty()));
        log.set_debug(debug_mode);
        tracing::debug!(debug_mode, fields = registry.len(), "driver: start");

        if debug_mode {
            log.debug("plugin debug mode is active!");
            log_environment(&mut log, &registry, &snapshot, &env_config);
            registry.visit_all(|field| {
                log.debug(format_args!(
                    "[assign] flag '{}' for env vars: {}",
                    field.name(),
                    field.env_names().join(", ")
                ));
            });
        }

        // Phase 1: override files
        let files = load_override_files(&registry, &mut snapshot, cli_config.args(), &mut log);

        // Phase 2: environment
        let env_out = resolve_env(&mut registry, &snapshot);
        tracing::debug!(set = env_out.set.len(), failed = env_out.failed.len(), "driver: env resolved");

        // Phase 3: flags
        let cli_out = parse_cli(&mut registry, &cli_config);
        tracing::debug!(
            set = cli_out.set.len(),
            failed = cli_out.failed.len(),
            errors = cli_out.errors.len(),
            "driver: flags parsed"
        );

        if debug_mode {
            for id in &cli_out.set {
                let field = registry.field(*id);
                log.debug(format_args!("[flag] '{}' set: {}", field.name(), shown(field)));
            }
            for field in registry.iter().filter(|f| f.provenance().is_env()) {
                if let Some(m) = field.env_match() {
                    log.debug(format_args!(
                        "[envflag] '{}' set by env var '{}': {}",
                        field.name(),
                        m.var,
                        shown(field)
                    ));
                }
            }
        }

        // Phase 4: domain callback
        let mut usage = UsageErrors::new();
        log.debug("------ executing plugin func -----");
        let result = {
            let mut ctx = ExecContext {
                registry: &registry,
                usage: &mut usage,
                log: &mut log,
                positionals: &cli_out.positionals,
                debug: debug_mode,
            };
            exec(&mut ctx)
        };
        log.debug("------ plugin func done -----");
        if let Err(e) = &result {
            tracing::debug!(error = %e, "driver: callback failed");
            log.debug(format_args!("plugin runner error: {e}"));
            if let ExecError::Failed(inner) = e {
                log.println(format_args!("plugin error: {inner}"));
            }
        }

        // Phase 5: report and verdict
        let report = Report::new(registry, usage)
            .with_arg_errors(cli_out.errors)
            .with_files(files)
            .with_positionals(cli_out.positionals);
        let error = report.verdict(result.err());

        let opts = RenderOptions {
            color: output_config
                .color
                .unwrap_or_else(|| !custom_log && should_use_color(Stream::Stderr)),
            debug: debug_mode,
            max_value_len: output_config.max_value_len.unwrap_or(DEFAULT_MAX_VALUE_LEN),
        };
        if error.is_some() || debug_mode {
            log.write_block(&report.render(&opts));
        } else if output_config.compact_on_success && !report.registry().is_empty() {
            log.write_block(&report.render_compact(&opts));
        }

        tracing::debug!(success = error.is_none(), "driver: done");
        DriverOutcome { report, error }
    }
}

fn shown(field: &Field) -> String {
    if field.is_sensitive() {
        REDACTED.to_string()
    } else {
        field.rendered()
    }
}

/// Echo the variables this plugin cares about: those with the registry
/// prefix, plus any watched prefix.
fn log_environment(log: &mut Logger, registry: &FieldRegistry, snapshot: &EnvSnapshot, env: &EnvConfig) {
    let hidden = registry.sensitive_env_names();
    let prefixes: Vec<&str> = std::iter::once(registry.prefix())
        .chain(env.watch_prefixes.iter().map(String::as_str))
        .collect();

    for (key, value) in snapshot.iter() {
        if !prefixes.iter().any(|p| key.starts_with(p)) {
            continue;
        }
        if hidden.contains(key) {
            log.debug(format_args!("[env] {key}={REDACTED}"));
        } else {
            log.debug(format_args!("[env] {key}={value}"));
        }
    }
}

// ============================================================================
// ExecContext
// ============================================================================

/// What the domain callback gets to work with.
///
/// Values are read-only by now; the only mutation left is attaching usage
/// errors to fields.
pub struct ExecContext<'a> {
    registry: &'a FieldRegistry,
    usage: &'a mut UsageErrors,
    log: &'a mut Logger,
    positionals: &'a [String],
    debug: bool,
}

impl<'a> ExecContext<'a> {
    /// Read a resolved value.
    pub fn get<A: Adapter>(&self, handle: FieldHandle<A>) -> &A::Value {
        self.registry.get(handle)
    }

    /// Look up a field.
    pub fn field(&self, id: impl Into<FieldId>) -> &Field {
        self.registry.field(id)
    }

    /// The registry being run.
    pub fn registry(&self) -> &FieldRegistry {
        self.registry
    }

    /// Attach a usage error to a field. The run will fail.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by a different registry.
    pub fn usage(&mut self, field: impl Into<FieldId>, message: impl Into<String>) {
        let id = field.into();
        let message = message.into();
        let name = self.registry.field(id).name();
        self.log
            .debug(format_args!("plugin option '{name}' error: {message}"));
        self.usage.append(id, message);
    }

    /// Usage errors attached so far.
    pub fn usage_errors(&self) -> &UsageErrors {
        &*self.usage
    }

    /// The output sink.
    pub fn log(&mut self) -> &mut Logger {
        &mut *self.log
    }

    /// Arguments left over after flag parsing.
    pub fn args(&self) -> &[String] {
        self.positionals
    }

    /// Whether debug mode is on.
    pub fn is_debug(&self) -> bool {
        self.debug
    }
}

// ============================================================================
// DriverOutcome
// ============================================================================

/// Result of a run: the report, and the aggregate error if the run failed.
///
/// By the time this is returned the report has already been written to the
/// log sink as configured.
#[must_use = "this `DriverOutcome` may hold a failed verdict that should be handled"]
#[derive(Debug)]
pub struct DriverOutcome {
    report: Report,
    error: Option<ConfigError>,
}

impl DriverOutcome {
    /// Whether the run succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the run failed.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// The full report.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// The aggregate error, if the run failed.
    pub fn error(&self) -> Option<&ConfigError> {
        self.error.as_ref()
    }

    /// Read a resolved value.
    pub fn get<A: Adapter>(&self, handle: FieldHandle<A>) -> &A::Value {
        self.report.get(handle)
    }

    /// Process exit code: 0 on success, the error's code otherwise.
    pub fn exit_code(&self) -> i32 {
        self.error.as_ref().map_or(0, ConfigError::exit_code)
    }

    /// Get the report and the error separately.
    pub fn into_parts(self) -> (Report, Option<ConfigError>) {
        (self.report, self.error)
    }

    /// Convert to a standard `Result`.
    pub fn into_result(self) -> Result<Report, ConfigError> {
        match self.error {
            None => Ok(self.report),
            Some(e) => Err(e),
        }
    }

    /// Get the report, or exit the process with the failure code.
    pub fn unwrap(self) -> Report {
        match self.error {
            None => self.report,
            Some(e) => std::process::exit(e.exit_code()),
        }
    }
}
