#![warn(missing_docs)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

pub(crate) mod builder;
pub mod color;
pub(crate) mod driver;
pub(crate) mod dump;
pub(crate) mod error;
pub(crate) mod field;
pub mod layers;
pub mod log;
pub(crate) mod provenance;
pub(crate) mod registry;
pub(crate) mod report;
pub mod testing;
pub(crate) mod usage;
pub mod value;

// ==========================================
// PUBLIC INTERFACE
// ==========================================

pub use builder::{Config, ConfigBuilder, LogConfig, LogConfigBuilder, OutputConfig, builder};
pub use color::should_use_color;
pub use driver::{DEBUG_VAR, Driver, DriverOutcome, ExecContext};
pub use dump::{DEFAULT_MAX_VALUE_LEN, RenderOptions};
pub use error::{ArgError, ConfigError, ExecError, FileLoadError, ParseError};
pub use field::{EnvMatch, Field, FieldHandle, FieldId};
pub use layers::env::{EnvSnapshot, EnvSource, MockEnv, StdEnv};
pub use layers::file::{FilePathResolution, FileResolution, FileStatus};
pub use provenance::Provenance;
pub use registry::{DEFAULT_PREFIX, FieldRegistry, derive_env_name};
pub use report::{Bucket, Report};
pub use usage::UsageErrors;
pub use value::{
    Adapter, BoolValue, FlagValue, IntValue, LIST_DELIMITER, StringListValue, StringMapValue,
    StringValue, TimestampValue,
};

/// Run a plugin against the process arguments and environment.
///
/// Prints the report to standard error as needed and exits with status 1 if
/// the run fails.
pub fn run<F>(registry: FieldRegistry, exec: F) -> Report
where
    F: FnOnce(&mut ExecContext<'_>) -> Result<(), ExecError>,
{
    Driver::new(builder().build()).run(registry, exec).unwrap()
}
