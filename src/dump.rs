//! Rendering of the end-of-run report.
//!
//! Two layouts: the full table, grouped by bucket, used on failure and in
//! debug mode; and a compact one-line-per-field listing.

use std::string::{String, ToString};
use std::vec::Vec;

use heck::ToSnakeCase;
use unicode_width::UnicodeWidthStr;

use crate::color::Painter;
use crate::field::Field;
use crate::layers::file::{FileResolution, FileStatus};
use crate::report::{Bucket, Report};

/// Longest value shown before it is shortened in the middle.
pub const DEFAULT_MAX_VALUE_LEN: usize = 120;

/// Formatting options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit ANSI colors.
    pub color: bool,
    /// Include raw environment values.
    pub debug: bool,
    /// Values longer than this many characters are shortened.
    pub max_value_len: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: false,
            debug: false,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Plain,
    Env,
    Flag,
    Value,
    Error,
}

struct Row {
    label: &'static str,
    text: String,
    kind: RowKind,
}

/// One field, laid out but not yet padded or colored.
struct Entry {
    title: String,
    usage: String,
    rows: Vec<Row>,
}

/// Split candidate names into option names (registry prefix stripped,
/// snake_case) and raw aliases.
fn name_groups(field: &Field, prefix: &str) -> (Vec<String>, Vec<String>) {
    let mut options = Vec::new();
    let mut aliases = Vec::new();
    for name in field.env_names() {
        match name.strip_prefix(prefix) {
            Some(rest) if !rest.is_empty() => options.push(rest.to_snake_case()),
            _ => aliases.push(name.clone()),
        }
    }
    (options, aliases)
}

fn title(field: &Field, prefix: &str) -> String {
    let (options, _) = name_groups(field, prefix);
    if options.is_empty() {
        field.name().to_string()
    } else {
        options.join(", ")
    }
}

fn display_value(field: &Field, raw: &str, opts: &RenderOptions) -> String {
    if field.is_sensitive() {
        return format!("[REDACTED ({} bytes)]", raw.len());
    }
    let escaped = raw.replace('\n', "\\n");
    truncate_middle(&escaped, opts.max_value_len).0
}

fn build_entry(field: &Field, report: &Report, opts: &RenderOptions) -> Entry {
    let prefix = report.registry().prefix();
    let (_, aliases) = name_groups(field, prefix);
    let mut rows = Vec::new();

    if !aliases.is_empty() {
        rows.push(Row {
            label: "envvar name",
            text: aliases.join(", "),
            kind: RowKind::Plain,
        });
    }

    let provenance = field.provenance();
    if provenance.is_set() {
        rows.push(Row {
            label: "source",
            text: provenance.source_description(),
            kind: if provenance.is_flag() {
                RowKind::Flag
            } else {
                RowKind::Env
            },
        });
    }

    if opts.debug
        && let Some(m) = field.env_match()
        && !m.raw.is_empty()
    {
        rows.push(Row {
            label: "env value",
            text: display_value(field, &m.raw, opts),
            kind: RowKind::Env,
        });
    }

    let rendered = field.rendered();
    if !rendered.is_empty() {
        rows.push(Row {
            label: "value",
            text: display_value(field, &rendered, opts),
            kind: RowKind::Value,
        });
    }

    if let Some(e) = field.parse_error() {
        let text = if field.is_sensitive() {
            format!("invalid {} value", e.type_name)
        } else {
            e.to_string()
        };
        rows.push(Row {
            label: "**ERROR**",
            text,
            kind: RowKind::Error,
        });
    }

    for message in report.usage_errors(field.id()) {
        rows.push(Row {
            label: "**USAGE ERROR**",
            text: message.trim_end().to_string(),
            kind: RowKind::Error,
        });
    }

    Entry {
        title: title(field, prefix),
        usage: field.usage().to_string(),
        rows,
    }
}

// ============================================================================
// Full table
// ============================================================================

pub(crate) fn render_full(report: &Report, opts: &RenderOptions) -> String {
    let paint = Painter::new(opts.color);
    let mut out = String::new();

    out.push_str("plugin usage:\n");

    if let Some(files) = report.files()
        && !files.paths.is_empty()
    {
        write_sources_header(&mut out, files, &paint);
    }

    let sections: Vec<(Bucket, Vec<Entry>)> = Bucket::ALL
        .into_iter()
        .map(|bucket| {
            let entries: Vec<Entry> = report
                .fields_in(bucket)
                .map(|field| build_entry(field, report, opts))
                .collect();
            (bucket, entries)
        })
        .filter(|(_, entries)| !entries.is_empty())
        .collect();

    let all = sections.iter().flat_map(|(_, entries)| entries.iter());
    let title_width = all
        .clone()
        .map(|e| visual_width(&e.title))
        .max()
        .unwrap_or(0)
        + 2;
    let label_width = all
        .flat_map(|e| e.rows.iter())
        .map(|r| visual_width(r.label))
        .max()
        .unwrap_or(0);

    for (bucket, entries) in &sections {
        out.push('\n');
        let header = bucket.header();
        if *bucket == Bucket::Error {
            out.push_str(&paint.error(header));
        } else {
            out.push_str(&paint.header(header));
        }
        out.push('\n');

        for entry in entries {
            write_entry(&mut out, entry, title_width, label_width, &paint);
        }
    }

    if !report.arg_errors().is_empty() {
        out.push('\n');
        out.push_str(&paint.error("ARGUMENTS"));
        out.push('\n');
        for error in report.arg_errors() {
            out.push_str("  ");
            out.push_str(&paint.error(&error.to_string()));
            out.push('\n');
        }
    }

    out
}

fn write_entry(out: &mut String, entry: &Entry, title_width: usize, label_width: usize, paint: &Painter) {
    out.push_str("  ");
    out.push_str(&entry.title);
    if !entry.usage.is_empty() {
        let dots = ".".repeat(title_width.saturating_sub(visual_width(&entry.title)));
        out.push(' ');
        out.push_str(&paint.dim(&dots));
        out.push(' ');
        out.push_str(&entry.usage);
    }
    out.push('\n');

    for row in &entry.rows {
        let pad = " ".repeat(label_width.saturating_sub(visual_width(row.label)));
        let label = if row.kind == RowKind::Error {
            paint.error(row.label)
        } else {
            row.label.to_string()
        };
        let text = match row.kind {
            RowKind::Plain => row.text.clone(),
            RowKind::Env => paint.env(&row.text),
            RowKind::Flag => paint.flag(&row.text),
            RowKind::Value => paint.value(&row.text),
            RowKind::Error => paint.error(&row.text),
        };
        out.push_str(&format!("    {pad}{label}: {text}\n"));
    }
}

fn write_sources_header(out: &mut String, files: &FileResolution, paint: &Painter) {
    out.push_str("env files:\n");

    let max_path_len = files
        .paths
        .iter()
        .map(|p| visual_width(p.path.as_str()))
        .max()
        .unwrap_or(0);

    for path_info in &files.paths {
        let path_str = path_info.path.as_str();
        let dots = ".".repeat(max_path_len.saturating_sub(visual_width(path_str)) + 2);
        let (colored_path, status) = match &path_info.status {
            FileStatus::Loaded { merged, skipped } => (
                paint.path(path_str),
                format!("loaded ({merged} set, {skipped} skipped)"),
            ),
            FileStatus::Failed { reason } => (paint.dim(path_str), paint.dim(&format!("skipped: {reason}"))),
        };
        out.push_str(&format!("  {colored_path} {} {status}\n", paint.dim(&dots)));
    }
}

// ============================================================================
// Compact listing
// ============================================================================

pub(crate) fn render_compact(report: &Report, opts: &RenderOptions) -> String {
    let paint = Painter::new(opts.color);
    let prefix = report.registry().prefix();
    let mut out = String::new();

    for field in report.registry().iter() {
        let title = title(field, prefix);
        let source = paint.dim(&format!("({})", field.provenance().source_description()));
        let rendered = field.rendered();
        if rendered.is_empty() {
            out.push_str(&format!("{title} {source}\n"));
        } else {
            let value = paint.value(&display_value(field, &rendered, opts));
            out.push_str(&format!("{title} = {value} {source}\n"));
        }
    }

    out
}

// ============================================================================
// Formatting Utilities
// ============================================================================

fn visual_width(s: &str) -> usize {
    s.width()
}

fn truncate_middle(s: &str, max_length: usize) -> (String, bool) {
    let len = s.chars().count();
    if len <= max_length {
        return (s.to_string(), false);
    }
    if max_length < 3 {
        return ("...".to_string(), true);
    }

    let available = max_length - 3;
    let start_len = available.div_ceil(2);
    let end_len = available / 2;

    let start: String = s.chars().take(start_len).collect();
    let end: String = s.chars().skip(len - end_len).collect();

    (format!("{start}...{end}"), true)
}
