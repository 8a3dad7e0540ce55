//! Output file naming.
//!
//! Converted files are named from a pattern with four variables:
//!
//! | Variable | Expands to |
//! |---|---|
//! | `{filename}` | input file stem (`photo.jpg` → `photo`) |
//! | `{date}` | `YYYYMMDD` of the run |
//! | `{time}` | `HHMMSS` of the run |
//! | `{counter}` | collision counter, `1` on the first attempt |
//!
//! Files land in the configured output directory, or in a `converted/`
//! directory next to the input. A taken name is retried with increasing
//! counters; the caller decides what counts as taken. Patterns without `{counter}` get a `_N`
//! suffix instead, so every pattern can always find a free name.
//!
//! The run timestamp is passed in, which keeps expansion pure.

use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

pub const DEFAULT_PATTERN: &str = "{filename}_converted";

/// Directory used when no output directory is configured.
pub const DEFAULT_SUBDIR: &str = "converted";

/// How output paths are derived from input paths.
#[derive(Debug, Clone, PartialEq)]
pub struct NamingRule {
    pub pattern: String,
    /// `None` → `<input dir>/converted`.
    pub directory: Option<PathBuf>,
    /// Extension without the dot.
    pub extension: String,
    /// Existing files may be replaced. Names claimed within one run still
    /// never repeat.
    pub overwrite: bool,
}

/// Substitute pattern variables. An empty pattern means [`DEFAULT_PATTERN`].
pub fn expand_pattern(
    pattern: &str,
    stem: &str,
    timestamp: NaiveDateTime,
    counter: u32,
) -> String {
    let pattern = if pattern.is_empty() {
        DEFAULT_PATTERN
    } else {
        pattern
    };
    let date = timestamp.format("%Y%m%d").to_string();
    let time = timestamp.format("%H%M%S").to_string();
    let counter = counter.to_string();

    // One pass: substituted text is never scanned again.
    let mut out = String::with_capacity(pattern.len() + stem.len());
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let (value, len) = [
            ("{filename}", stem),
            ("{date}", date.as_str()),
            ("{time}", time.as_str()),
            ("{counter}", counter.as_str()),
        ]
        .into_iter()
        .find(|(var, _)| tail.starts_with(*var))
        .map_or(("{", 1), |(var, value)| (value, var.len()));
        out.push_str(value);
        rest = &tail[len..];
    }
    out.push_str(rest);
    out
}

/// Directory that outputs for `input` are written to.
pub fn output_dir_for(input: &Path, configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .unwrap_or(Path::new(""))
            .join(DEFAULT_SUBDIR),
    }
}

/// Pick the output path for `input`.
///
/// `is_taken` decides whether a candidate collides. It is consulted even when
/// `rule.overwrite` is set; batch planning then ignores the disk but still
/// rejects paths claimed by earlier jobs.
pub fn output_path(
    input: &Path,
    rule: &NamingRule,
    timestamp: NaiveDateTime,
    is_taken: impl Fn(&Path) -> bool,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = output_dir_for(input, rule.directory.as_deref());
    let candidate = |name: String| dir.join(format!("{}.{}", name, rule.extension));

    let first = candidate(expand_pattern(&rule.pattern, &stem, timestamp, 1));
    if !is_taken(&first) {
        return first;
    }

    // The first attempt already used counter 1.
    let suffixed = !rule.pattern.contains("{counter}");
    let mut counter = if suffixed { 1 } else { 2 };
    loop {
        let expanded = expand_pattern(&rule.pattern, &stem, timestamp, counter);
        let name = if suffixed {
            format!("{expanded}_{counter}")
        } else {
            expanded
        };
        let path = candidate(name);
        if !is_taken(&path) {
            return path;
        }
        counter += 1;
    }
}
