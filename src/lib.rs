use std::path::PathBuf;

use indicatif::ProgressBar;

pub mod aggregate;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod histogram;
pub mod labels;
pub mod measurement;
pub mod metadata;
pub mod render;
pub mod report;
pub mod source;

pub mod workspace;

use aggregate::Batch;
use config::{InsufficientPolicy, PipelineParams};
use error::{AnalysisError, Result};
use measurement::Measurement;

/// Files matching `pattern`, minus any whose path contains one of `exclude`,
/// in natural order (`p2` before `p10`).
pub fn get_files_by_pattern(pattern: &str, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = vec![];

    for entry in glob::glob(pattern)? {
        match entry {
            Ok(filepath) => {
                let path_str = filepath.to_string_lossy();
                if exclude.iter().any(|ex| path_str.contains(ex.as_str())) {
                    log::debug!("excluded {filepath:?}");
                    continue;
                }
                if filepath.is_file() {
                    files.push(filepath);
                }
            }
            Err(err) => log::warn!("skipping unreadable path: {err}"),
        }
    }

    files.sort_by(|a, b| natord::compare(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(files)
}

/// Read every file, derive metadata and endpoints, and assemble the batch.
///
/// Any naming or date error aborts the whole batch. Spectra without a usable
/// tail abort it too unless `params.on_insufficient` says to skip them.
pub fn load_batch(files: &[PathBuf], params: &PipelineParams, pb: &ProgressBar) -> Result<Batch> {
    let mut measurements = Vec::with_capacity(files.len());

    for filepath in files {
        let named = source::source_for_path(filepath)?.read(filepath)?;
        match Measurement::new(named, params.convention, &params.estimator) {
            Ok(measurement) => {
                log::debug!(
                    "{}: {} median {:.1} mean {:.1}",
                    measurement.name,
                    measurement.meta.identifier,
                    measurement.endpoint.median,
                    measurement.endpoint.mean
                );
                measurements.push(measurement);
            }
            Err(err @ AnalysisError::InsufficientData { .. })
                if params.on_insufficient == InsufficientPolicy::Skip =>
            {
                log::warn!("skipping {filepath:?}: {err}");
            }
            Err(err) => return Err(err),
        }
        pb.inc(1);
    }
    pb.finish();

    log::info!("loaded {} of {} spectra", measurements.len(), files.len());
    Batch::new(measurements)
}
