//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every converted image is shown by its position in the batch and its name,
//! with filesystem paths as indented context lines. The same two-level shape
//! is used for single conversions, batch progress, presets and recent files.
//!
//! Every `format_*` function is pure and returns lines; the matching
//! `print_*` wrapper writes them to stdout. Tests only touch the former.
//!
//! # Output Format
//!
//! ## Batch
//!
//! ```text
//! Converting 3 images
//! 001 logo
//!     Source: photos/logo.png
//!     Output: photos/converted/logo_converted.png
//! 002 banner
//!     Source: photos/banner.jpg
//!     Error: failed to decode photos/banner.jpg: ...
//! Converted 2, failed 1
//! ```
//!
//! ## Presets
//!
//! ```text
//! logo_black (built-in)
//!     black, tolerance 15, invert → PNG q95
//! shop (user)
//!     custom #00FF00, tolerance 30, backdrop #FFFFFF → WEBP q80
//! ```

use crate::batch::{BatchEvent, BatchReport};
use crate::imaging::{BackgroundMode, OutputFormat};
use crate::presets::{self, Preset};
use crate::settings::Settings;
use std::path::Path;

// ============================================================================
// Shared formatting helpers
// ============================================================================

/// Format a 1-based position as a zero-padded 3-digit string.
fn format_index(pos: usize) -> String {
    format!("{:03}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Display name of an image: its file stem, or the whole path when it has none.
fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

// ============================================================================
// Conversion output
// ============================================================================

/// Format the result of converting a single file.
///
/// ```text
/// logo
///     Source: logo.png
///     Output: converted/logo_converted.png
/// ```
pub fn format_convert_result(source: &Path, written: &Path) -> Vec<String> {
    vec![
        display_name(source),
        format!("{}Source: {}", indent(1), source.display()),
        format!("{}Output: {}", indent(1), written.display()),
    ]
}

pub fn print_convert_result(source: &Path, written: &Path) {
    for line in format_convert_result(source, written) {
        println!("{}", line);
    }
}

/// Format a single batch progress event as display lines.
///
/// Batch indices are 0-based internally and shown 1-based.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            vec![format!("Converting {}", plural(*total, "image", "images"))]
        }
        BatchEvent::Completed {
            index,
            source,
            destination,
        } => vec![
            format!("{} {}", format_index(index + 1), display_name(source)),
            format!("{}Source: {}", indent(1), source.display()),
            format!("{}Output: {}", indent(1), destination.display()),
        ],
        BatchEvent::Failed {
            index,
            source,
            error,
        } => vec![
            format!("{} {}", format_index(index + 1), display_name(source)),
            format!("{}Source: {}", indent(1), source.display()),
            format!("{}Error: {}", indent(1), error),
        ],
        BatchEvent::Finished { processed, failed } => {
            vec![format!("Converted {}, failed {}", processed, failed)]
        }
    }
}

/// Format the closing summary of a batch, listing failures again so they
/// are not lost in a long progress log.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.failed > 0 {
        lines.push("Failed".to_string());
        for outcome in &report.outcomes {
            if let Err(e) = &outcome.result {
                lines.push(format!(
                    "{} {}",
                    format_index(outcome.index + 1),
                    display_name(&outcome.source)
                ));
                lines.push(format!("{}Error: {}", indent(1), e));
            }
        }
    }
    lines.push(format!(
        "{} converted, {} failed",
        plural(report.processed, "image", "images"),
        report.failed
    ));
    lines
}

pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Presets
// ============================================================================

/// One-line description of what a preset does.
fn preset_summary(preset: &Preset) -> String {
    let p = &preset.processing;
    let mut parts = Vec::new();
    parts.push(match p.background_mode {
        BackgroundMode::Custom => format!("custom {}", p.custom_color),
        mode => mode.to_string(),
    });
    parts.push(format!("tolerance {}", p.tolerance));
    if p.invert_colors {
        parts.push("invert".to_string());
    }
    if let Some((w, h)) = p.resize_target() {
        parts.push(format!("resize {}x{}", w, h));
    }
    if p.crop {
        parts.push(format!(
            "crop {},{} to {},{}",
            p.crop_left, p.crop_top, p.crop_right, p.crop_bottom
        ));
    }
    if let Some(alpha) = p.alpha_ceiling() {
        parts.push(format!("alpha {}", alpha));
    }
    if p.replace_background {
        parts.push(format!("backdrop {}", p.replacement_color));
    }
    format!(
        "{} \u{2192} {} q{}",
        parts.join(", "),
        OutputFormat::from_name(&preset.format),
        preset.quality
    )
}

/// Format every available preset, built-ins first.
pub fn format_presets(settings: &Settings) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, user) in presets::list(settings) {
        let Ok(preset) = presets::resolve(&name, settings) else {
            continue;
        };
        let origin = if user { "user" } else { "built-in" };
        lines.push(format!("{} ({})", name, origin));
        lines.push(format!("{}{}", indent(1), preset_summary(&preset)));
    }
    lines
}

pub fn print_presets(settings: &Settings) {
    for line in format_presets(settings) {
        println!("{}", line);
    }
}

// ============================================================================
// Recent files
// ============================================================================

/// Format the recent files and folders lists, most recent first.
pub fn format_recent(settings: &Settings) -> Vec<String> {
    let mut lines = Vec::new();
    for (title, entries) in [
        ("Recent files", &settings.recent_files),
        ("Recent folders", &settings.recent_folders),
    ] {
        if entries.is_empty() {
            continue;
        }
        lines.push(title.to_string());
        for (i, path) in entries.iter().enumerate() {
            lines.push(format!(
                "{}{} {}",
                indent(1),
                format_index(i + 1),
                path.display()
            ));
        }
    }
    if lines.is_empty() {
        lines.push("No recent files".to_string());
    }
    lines
}

pub fn print_recent(settings: &Settings) {
    for line in format_recent(settings) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{ConvertError, JobOutcome};
    use crate::imaging::{PipelineError, Rgb};
    use std::path::PathBuf;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn convert_result_lines() {
        let lines = format_convert_result(
            Path::new("in/logo.png"),
            Path::new("in/converted/logo_converted.webp"),
        );
        assert_eq!(
            lines,
            vec![
                "logo",
                "    Source: in/logo.png",
                "    Output: in/converted/logo_converted.webp",
            ]
        );
    }

    #[test]
    fn batch_started_pluralizes() {
        assert_eq!(
            format_batch_event(&BatchEvent::Started { total: 1 }),
            vec!["Converting 1 image"]
        );
        assert_eq!(
            format_batch_event(&BatchEvent::Started { total: 4 }),
            vec!["Converting 4 images"]
        );
    }

    #[test]
    fn batch_completed_is_one_based() {
        let lines = format_batch_event(&BatchEvent::Completed {
            index: 0,
            source: PathBuf::from("a/cat.jpg"),
            destination: PathBuf::from("a/converted/cat_converted.png"),
        });
        assert_eq!(lines[0], "001 cat");
        assert_eq!(lines[2], "    Output: a/converted/cat_converted.png");
    }

    #[test]
    fn batch_failed_shows_error() {
        let lines = format_batch_event(&BatchEvent::Failed {
            index: 9,
            source: PathBuf::from("dog.bmp"),
            error: "boom".to_string(),
        });
        assert_eq!(lines, vec!["010 dog", "    Source: dog.bmp", "    Error: boom"]);
    }

    #[test]
    fn batch_finished_counts() {
        assert_eq!(
            format_batch_event(&BatchEvent::Finished {
                processed: 2,
                failed: 1
            }),
            vec!["Converted 2, failed 1"]
        );
    }

    #[test]
    fn summary_lists_failures() {
        let report = BatchReport {
            outcomes: vec![
                JobOutcome {
                    index: 0,
                    source: PathBuf::from("ok.png"),
                    result: Ok(PathBuf::from("converted/ok_converted.png")),
                },
                JobOutcome {
                    index: 1,
                    source: PathBuf::from("bad.png"),
                    result: Err(ConvertError::Pipeline(PipelineError::InvalidRegion {
                        left: 5,
                        top: 0,
                        right: 5,
                        bottom: 5,
                        width: 10,
                        height: 10,
                    })),
                },
            ],
            processed: 1,
            failed: 1,
        };
        let lines = format_batch_summary(&report);
        assert_eq!(lines[0], "Failed");
        assert_eq!(lines[1], "002 bad");
        assert!(lines[2].starts_with("    Error: "));
        assert_eq!(lines.last().unwrap(), "1 image converted, 1 failed");
    }

    #[test]
    fn summary_without_failures_is_one_line() {
        let report = BatchReport {
            outcomes: Vec::new(),
            processed: 0,
            failed: 0,
        };
        assert_eq!(format_batch_summary(&report), vec!["0 images converted, 0 failed"]);
    }

    #[test]
    fn presets_listing() {
        let mut settings = Settings::default();
        let mut shop = Preset::default();
        shop.processing.background_mode = BackgroundMode::Custom;
        shop.processing.custom_color = Rgb([0, 255, 0]);
        shop.processing.tolerance = 30;
        shop.processing.invert_colors = false;
        shop.processing.replace_background = true;
        shop.format = "webp".into();
        shop.quality = 80;
        settings.presets.insert("shop".into(), shop);

        let lines = format_presets(&settings);
        assert_eq!(lines[0], "logo_black (built-in)");
        assert_eq!(lines[1], "    black, tolerance 15, invert \u{2192} PNG q95");
        assert_eq!(lines[4], "product (built-in)");
        assert_eq!(
            lines[5],
            "    white, tolerance 25, resize 800x800, backdrop #FFFFFF \u{2192} PNG q90"
        );
        assert_eq!(lines[6], "shop (user)");
        assert_eq!(
            lines[7],
            "    custom #00FF00, tolerance 30, backdrop #FFFFFF \u{2192} WEBP q80"
        );
    }

    #[test]
    fn recent_listing() {
        let mut settings = Settings::default();
        assert_eq!(format_recent(&settings), vec!["No recent files"]);

        settings.add_recent_file(Path::new("/a.png"));
        settings.add_recent_file(Path::new("/b.png"));
        settings.add_recent_folder(Path::new("/photos"));
        assert_eq!(
            format_recent(&settings),
            vec![
                "Recent files",
                "    001 /b.png",
                "    002 /a.png",
                "Recent folders",
                "    001 /photos",
            ]
        );
    }
}
