//! A harness for testing plugins without touching the process environment.
//!
//! ```rust
//! use plugin_env::{ExecError, FieldRegistry, testing::TestRun};
//!
//! let mut registry = FieldRegistry::new();
//! let token = registry.string("token", "", "API token");
//!
//! let out = TestRun::new().run(registry, |ctx| {
//!     if ctx.get(token).is_empty() {
//!         ctx.usage(token, "token required");
//!         return Err(ExecError::Usage);
//!     }
//!     Ok(())
//! });
//! out.assert_failure();
//! assert!(out.output().contains("**USAGE ERROR**: token required"));
//! ```

use std::string::String;
use std::vec::Vec;

use indexmap::IndexMap;

use crate::builder::builder;
use crate::driver::{DEBUG_VAR, Driver, DriverOutcome, ExecContext};
use crate::error::{ConfigError, ExecError};
use crate::layers::env::MockEnv;
use crate::log::LogBuffer;
use crate::registry::FieldRegistry;
use crate::report::Report;

/// One scripted run: an in-memory environment, arguments, and switches.
#[derive(Debug, Clone, Default)]
pub struct TestRun {
    vars: IndexMap<String, String>,
    plugin_vars: Vec<(String, String)>,
    args: Vec<String>,
    debug: bool,
    compact_on_success: bool,
}

impl TestRun {
    /// Start with an empty environment and no arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn on debug mode through the environment, as a CI system would.
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// Set variables under the registry prefix: `("server", ..)` becomes
    /// `PLUGIN_SERVER` for the default prefix.
    pub fn plugin_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.plugin_vars.extend(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_uppercase(), v.into())),
        );
        self
    }

    /// Set variables by name. Names are upper-cased.
    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.vars.insert(k.as_ref().to_uppercase(), v.into());
        }
        self
    }

    /// Command-line arguments, without the program name.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Print the compact listing on success.
    pub fn compact_on_success(mut self) -> Self {
        self.compact_on_success = true;
        self
    }

    /// Run `exec` against `registry` and capture everything it printed.
    pub fn run<F>(self, registry: FieldRegistry, exec: F) -> TestOutput
    where
        F: FnOnce(&mut ExecContext<'_>) -> Result<(), ExecError>,
    {
        let mut env = MockEnv::new();
        for (k, v) in self.vars {
            env.set(k, v);
        }
        for (k, v) in self.plugin_vars {
            env.set(format!("{}{k}", registry.prefix()), v);
        }
        if self.debug {
            env.set(format!("{}{DEBUG_VAR}", registry.prefix()), "true");
        }

        let buf = LogBuffer::new();
        let mut config = builder()
            .cli(|c| c.args(self.args))
            .env(|e| e.source(env))
            .log(|l| l.writer(buf.clone()))
            .color(false);
        if self.compact_on_success {
            config = config.compact_on_success();
        }

        let outcome = Driver::new(config.build()).run(registry, exec);
        TestOutput {
            outcome,
            output: buf.contents(),
        }
    }
}

/// What a [`TestRun`] produced.
#[derive(Debug)]
pub struct TestOutput {
    outcome: DriverOutcome,
    output: String,
}

impl TestOutput {
    /// Everything written to the log sink.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The run's outcome.
    pub fn outcome(&self) -> &DriverOutcome {
        &self.outcome
    }

    /// The run's report.
    pub fn report(&self) -> &Report {
        self.outcome.report()
    }

    /// The aggregate error, if the run failed.
    pub fn error(&self) -> Option<&ConfigError> {
        self.outcome.error()
    }

    /// Panic, showing the output, unless the run succeeded.
    #[track_caller]
    pub fn assert_success(&self) -> &Self {
        if let Some(e) = self.outcome.error() {
            panic!("should have succeeded, got: {e}\n{}", self.output);
        }
        self
    }

    /// Panic, showing the output, unless the run failed.
    #[track_caller]
    pub fn assert_failure(&self) -> &Self {
        if self.outcome.is_success() {
            panic!("should have failed\n{}", self.output);
        }
        self
    }

    /// Panic unless the output is exactly `expected`.
    #[track_caller]
    pub fn assert_output(&self, expected: &str) -> &Self {
        if self.output != expected {
            panic!(
                "output not as expected!\n got:\n{}\n expected:\n{expected}",
                self.output
            );
        }
        self
    }
}
