//! Override files: `KEY=VALUE` files merged into the environment snapshot
//! before resolution.
//!
//! The list of files is itself configuration. It is resolved with the same
//! field machinery, in a throwaway registry holding only the `env_file`
//! field, so the main registry is not touched before its own env pass.
//!
//! Merging never overwrites: a key already in the snapshot (from the real
//! environment or an earlier file) keeps its value. A file that cannot be
//! read or parsed is logged and skipped.
//!
//! `${VAR}` references inside a file are expanded by `dotenvy` while parsing:
//! against the process environment first, then earlier keys of the same file.
//! They never see the run's snapshot, so a [`MockEnv`](crate::MockEnv) entry
//! does not take part in expansion.

use std::collections::HashSet;
use std::string::String;
use std::vec::Vec;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

use crate::error::FileLoadError;
use crate::field::REDACTED;
use crate::layers::cli::{CliConfigBuilder, parse_cli};
use crate::layers::env::{EnvSnapshot, resolve_env};
use crate::log::Logger;
use crate::registry::FieldRegistry;

/// Flag name of the override file list.
pub const ENV_FILE_FLAG: &str = "env_file";

// ============================================================================
// Resolution record
// ============================================================================

/// What happened to one override file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Parsed and merged.
    Loaded {
        /// Keys added to the snapshot.
        merged: usize,
        /// Keys ignored because they were already present.
        skipped: usize,
    },
    /// Could not be read or parsed; nothing merged.
    Failed {
        /// Why.
        reason: String,
    },
}

/// One override file and its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePathResolution {
    /// The path that was tried.
    pub path: Utf8PathBuf,
    /// The outcome.
    pub status: FileStatus,
}

/// Every override file that was considered, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileResolution {
    /// Per-file outcomes.
    pub paths: Vec<FilePathResolution>,
}

impl FileResolution {
    /// Create an empty resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files that loaded.
    pub fn loaded(&self) -> usize {
        self.paths
            .iter()
            .filter(|p| matches!(p.status, FileStatus::Loaded { .. }))
            .count()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Run the override pass if `registry` enabled it.
///
/// Returns `None` when override files are not enabled.
pub fn load_override_files(
    registry: &FieldRegistry,
    snapshot: &mut EnvSnapshot,
    args: &[String],
    log: &mut Logger,
) -> Option<FileResolution> {
    registry.env_file_defaults()?;
    log.debug("[envfile] read env files");
    let paths = resolve_env_file_paths(registry, snapshot, args);
    let hidden = registry.sensitive_env_names();
    Some(merge_env_files(&paths, snapshot, &hidden, log))
}

/// Work out which override files to load.
///
/// Uses an isolated registry holding only the `env_file` field, with the same
/// candidate names and defaults as in `registry`, resolved from `snapshot`
/// and from any `-env_file` argument.
pub fn resolve_env_file_paths(
    registry: &FieldRegistry,
    snapshot: &EnvSnapshot,
    args: &[String],
) -> Vec<Utf8PathBuf> {
    let defaults = registry.env_file_defaults().unwrap_or_default();
    let mut sub = FieldRegistry::with_prefix(registry.prefix());
    let handle = sub.string_list(ENV_FILE_FLAG, defaults.iter().cloned(), "source env file");
    if let Some(field) = registry.by_name(ENV_FILE_FLAG) {
        sub.env(handle, field.env_names());
    }

    resolve_env(&mut sub, snapshot);
    let cli = CliConfigBuilder::new().args(env_file_args(registry, args)).build();
    parse_cli(&mut sub, &cli);

    sub.get(handle)
        .iter()
        .filter(|p| !p.is_empty())
        .map(Utf8PathBuf::from)
        .collect()
}

/// Pick out the `env_file` flag (and its value) from a full argument list.
///
/// Walks the flags the way the main parse does, using `registry` to know
/// which flags take a separate value, and stops where flag parsing stops.
fn env_file_args(registry: &FieldRegistry, args: &[String]) -> Vec<String> {
    let mut picked = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" || arg == "-" || !arg.starts_with('-') {
            break;
        }
        let body = arg.strip_prefix("--").unwrap_or(&arg[1..]);
        let (name, inline) = match body.split_once('=') {
            Some((name, _)) => (name, true),
            None => (body, false),
        };
        let Some(field) = registry.by_name(name) else {
            continue;
        };
        let takes_next = !inline && !field.value().is_bool_flag();

        if name == ENV_FILE_FLAG {
            picked.push(arg.clone());
            if takes_next && let Some(value) = iter.next() {
                picked.push(value.clone());
            }
        } else if takes_next {
            iter.next();
        }
    }
    picked
}

/// Read one `KEY=VALUE` file. A later line for the same key wins within the file.
pub fn load_env_file(path: &Utf8Path) -> Result<IndexMap<String, String>, FileLoadError> {
    let iter = dotenvy::from_path_iter(path.as_std_path())
        .map_err(|e| FileLoadError::from_dotenv(path.to_path_buf(), e))?;
    let mut vars = IndexMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| FileLoadError::from_dotenv(path.to_path_buf(), e))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Merge `paths`, in order, into `snapshot` without overwriting.
///
/// Values of keys in `hidden` are redacted in debug output.
pub fn merge_env_files(
    paths: &[Utf8PathBuf],
    snapshot: &mut EnvSnapshot,
    hidden: &HashSet<&str>,
    log: &mut Logger,
) -> FileResolution {
    let mut resolution = FileResolution::new();

    for path in paths {
        log.debug(format_args!("[envfile] loading env file: {path}"));
        let vars = match load_env_file(path) {
            Ok(vars) => vars,
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "file: skipped");
                log.debug(format_args!("[envfile] error loading env file: {e}"));
                resolution.paths.push(FilePathResolution {
                    path: path.clone(),
                    status: FileStatus::Failed {
                        reason: e.to_string(),
                    },
                });
                continue;
            }
        };

        let (mut merged, mut skipped) = (0, 0);
        for (key, value) in vars {
            if snapshot.contains(&key) {
                log.debug(format_args!("[envfile] skipping already defined var: {key}"));
                skipped += 1;
            } else {
                if hidden.contains(key.as_str()) {
                    log.debug(format_args!("[envfile] setting {key}={REDACTED}"));
                } else {
                    log.debug(format_args!("[envfile] setting {key}={value}"));
                }
                snapshot.insert_if_absent(key, value);
                merged += 1;
            }
        }
        tracing::debug!(path = %path, merged, skipped, "file: loaded");
        resolution.paths.push(FilePathResolution {
            path: path.clone(),
            status: FileStatus::Loaded { merged, skipped },
        });
    }

    resolution
}
