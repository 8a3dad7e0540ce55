//! Batch conversion.
//!
//! Turns a list of files and folders into converted images in three steps:
//!
//! 1. **Collect**: expand folders into the image files they contain
//!    ([`collect_inputs`]). Folders only contribute files with a supported
//!    extension; explicitly named files are always kept.
//! 2. **Plan**: give every input a unique destination ([`plan`]). Planning is
//!    sequential so two inputs never claim the same output name.
//! 3. **Run**: load → [`process`] → save every job in parallel on the rayon
//!    pool ([`run`]). A failing image is recorded and the batch carries on.
//!
//! Progress is reported through an optional [`Sender<BatchEvent>`]; the CLI
//! prints events from a separate thread while workers keep going.
//!
//! ```text
//! photos/            →   photos/converted/
//! ├── logo.png            ├── logo_converted.png
//! ├── banner.jpg          └── banner_converted.png
//! └── notes.txt
//! ```

use crate::config::JobConfig;
use crate::imaging::buffer::is_supported_input;
use crate::imaging::{
    DecodeError, EncodeError, ImageBackend, PipelineError, ProcessingOptions, SaveParameters,
    process,
};
use crate::naming::{self, NamingRule};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read folder: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Failure converting a single image.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("Cannot create output directory: {0}")]
    Io(#[from] std::io::Error),
}

/// One planned conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Position in the batch, 0-based.
    pub index: usize,
    pub source: PathBuf,
    /// Planned output path; the extension follows the output format.
    pub destination: PathBuf,
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Completed {
        index: usize,
        source: PathBuf,
        destination: PathBuf,
    },
    Failed {
        index: usize,
        source: PathBuf,
        error: String,
    },
    Finished {
        processed: usize,
        failed: usize,
    },
}

#[derive(Debug)]
pub struct JobOutcome {
    pub index: usize,
    pub source: PathBuf,
    /// The written path, or why the image failed.
    pub result: Result<PathBuf, ConvertError>,
}

/// Result of a batch run, outcomes in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
    pub processed: usize,
    pub failed: usize,
}

/// Expand `paths` into the list of images to convert.
///
/// Folders contribute files with a supported extension (case-insensitive),
/// sorted by name, descending into subfolders only when `recursive` is set.
/// Everything else is kept as given, so a missing file surfaces as a failed
/// job instead of disappearing. Duplicates are dropped, first one wins.
pub fn collect_inputs(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, BatchError> {
    let mut seen = HashSet::new();
    let mut inputs = Vec::new();

    for path in paths {
        if !path.is_dir() {
            if seen.insert(path.clone()) {
                inputs.push(path.clone());
            }
            continue;
        }

        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && is_supported_input(entry.path()) {
                let file = entry.into_path();
                if seen.insert(file.clone()) {
                    inputs.push(file);
                }
            }
        }
    }

    debug!(count = inputs.len(), "collected batch inputs");
    Ok(inputs)
}

/// Assign every input a destination path.
///
/// A destination is taken if an earlier job already claimed it, or, unless
/// `rule.overwrite` is set, if it exists on disk. Jobs therefore never share a
/// destination and can be written in parallel.
pub fn plan(inputs: &[PathBuf], rule: &NamingRule, timestamp: NaiveDateTime) -> Vec<Job> {
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    inputs
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let destination = naming::output_path(source, rule, timestamp, |p| {
                claimed.contains(p) || (!rule.overwrite && p.exists())
            });
            claimed.insert(destination.clone());
            Job {
                index,
                source: source.clone(),
                destination,
            }
        })
        .collect()
}

/// Convert one file: load, transform, create the destination folder, save.
///
/// Returns the path actually written.
pub fn convert_file(
    backend: &impl ImageBackend,
    source: &Path,
    destination: &Path,
    options: &ProcessingOptions,
    format: &str,
    params: &SaveParameters,
) -> Result<PathBuf, ConvertError> {
    let image = backend.load(source)?;
    let transformed = process(&image, options)?;
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(backend.save(&transformed, destination, format, params)?)
}

/// Run planned jobs in parallel on the current rayon pool.
pub fn run(
    backend: &impl ImageBackend,
    jobs: &[Job],
    config: &JobConfig,
    events: Option<Sender<BatchEvent>>,
) -> BatchReport {
    let emit = |event: BatchEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };
    emit(BatchEvent::Started { total: jobs.len() });

    let params = config.output.save_parameters();
    let outcomes: Vec<JobOutcome> = jobs
        .par_iter()
        .map(|job| {
            let result = convert_file(
                backend,
                &job.source,
                &job.destination,
                &config.processing,
                &config.output.format,
                &params,
            );
            match &result {
                Ok(written) => emit(BatchEvent::Completed {
                    index: job.index,
                    source: job.source.clone(),
                    destination: written.clone(),
                }),
                Err(e) => emit(BatchEvent::Failed {
                    index: job.index,
                    source: job.source.clone(),
                    error: e.to_string(),
                }),
            }
            JobOutcome {
                index: job.index,
                source: job.source.clone(),
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    let processed = outcomes.len() - failed;
    emit(BatchEvent::Finished { processed, failed });

    BatchReport {
        outcomes,
        processed,
        failed,
    }
}

/// Collect, plan and run in one go.
pub fn convert_paths(
    backend: &impl ImageBackend,
    paths: &[PathBuf],
    config: &JobConfig,
    timestamp: NaiveDateTime,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    let inputs = collect_inputs(paths, config.batch.recursive)?;
    let jobs = plan(&inputs, &config.output.naming_rule(), timestamp);
    Ok(run(backend, &jobs, config, events))
}
