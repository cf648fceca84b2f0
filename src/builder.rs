//! Builder API for a plugin run.
//!
//! ```rust
//! use plugin_env::{MockEnv, builder};
//!
//! let config = builder()
//!     .cli(|cli| cli.args(["-fork"]))
//!     .env(|env| env.source(MockEnv::from_pairs([("PLUGIN_SERVER", "https://ci")])))
//!     .log(|log| log.writer(std::io::sink()))
//!     .build();
//! # let _ = config;
//! ```

use std::io::Write;

use crate::layers::{
    cli::{CliConfig, CliConfigBuilder},
    env::{EnvConfig, EnvConfigBuilder},
};
use crate::log::Logger;

/// Start configuring a run.
pub fn builder() -> ConfigBuilder {
    ConfigBuilder::default()
}

/// Builder for a run configuration.
#[derive(Default)]
pub struct ConfigBuilder {
    cli_config: Option<CliConfig>,
    env_config: Option<EnvConfig>,
    log_config: Option<LogConfig>,
    output_config: OutputConfig,
}

/// Fully built configuration for the [`Driver`](crate::Driver).
#[derive(Default)]
pub struct Config {
    /// Argument source. If None, the process arguments are used.
    pub cli_config: Option<CliConfig>,
    /// Environment source. If None, the process environment is used.
    pub env_config: Option<EnvConfig>,
    /// Output sink. If None, standard error is used.
    pub log_config: Option<LogConfig>,
    /// Rendering switches.
    pub output_config: OutputConfig,
}

impl ConfigBuilder {
    /// Configure command-line arguments.
    pub fn cli<F>(mut self, f: F) -> Self
    where
        F: FnOnce(CliConfigBuilder) -> CliConfigBuilder,
    {
        self.cli_config = Some(f(CliConfigBuilder::new()).build());
        self
    }

    /// Configure the environment source.
    pub fn env<F>(mut self, f: F) -> Self
    where
        F: FnOnce(EnvConfigBuilder) -> EnvConfigBuilder,
    {
        self.env_config = Some(f(EnvConfigBuilder::new()).build());
        self
    }

    /// Configure where messages and reports are written.
    pub fn log<F>(mut self, f: F) -> Self
    where
        F: FnOnce(LogConfigBuilder) -> LogConfigBuilder,
    {
        self.log_config = Some(f(LogConfigBuilder::new()).build());
        self
    }

    /// Force debug mode on or off instead of detecting it from the environment.
    pub fn debug(mut self, debug: bool) -> Self {
        self.output_config.debug = Some(debug);
        self
    }

    /// Force colored output on or off.
    pub fn color(mut self, color: bool) -> Self {
        self.output_config.color = Some(color);
        self
    }

    /// Print the compact listing after a successful run.
    pub fn compact_on_success(mut self) -> Self {
        self.output_config.compact_on_success = true;
        self
    }

    /// Shorten report values longer than `len` characters.
    pub fn max_value_len(mut self, len: usize) -> Self {
        self.output_config.max_value_len = Some(len);
        self
    }

    /// Finalize the builder and return a Config for use with the Driver.
    ///
    /// ```ignore
    /// let config = builder().cli(...).env(...).build();
    /// let outcome = Driver::new(config).run(registry, |ctx| Ok(()));
    /// ```
    pub fn build(self) -> Config {
        Config {
            cli_config: self.cli_config,
            env_config: self.env_config,
            log_config: self.log_config,
            output_config: self.output_config,
        }
    }
}

// ============================================================================
// Output Configuration
// ============================================================================

/// Rendering switches for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Forced debug mode. None means detect from the environment.
    pub debug: Option<bool>,
    /// Forced color. None means color only on a terminal stderr.
    pub color: Option<bool>,
    /// Print the compact listing on success.
    pub compact_on_success: bool,
    /// Value length limit in reports. None means the default.
    pub max_value_len: Option<usize>,
}

// ============================================================================
// Log Configuration
// ============================================================================

/// Where the run writes its output.
#[derive(Default)]
pub struct LogConfig {
    writer: Option<Box<dyn Write>>,
}

impl LogConfig {
    /// Whether a custom writer was set.
    pub fn is_custom(&self) -> bool {
        self.writer.is_some()
    }

    pub(crate) fn into_logger(self) -> Logger {
        match self.writer {
            Some(writer) => Logger::new(writer),
            None => Logger::stderr(),
        }
    }
}

/// Builder for log configuration.
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    /// Create a new log config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write to `writer` instead of standard error.
    pub fn writer(mut self, writer: impl Write + 'static) -> Self {
        self.config.writer = Some(Box::new(writer));
        self
    }

    /// Build the log configuration.
    pub fn build(self) -> LogConfig {
        self.config
    }
}
