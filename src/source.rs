//! Readers for the spectrum files fed into the analysis.
//!
//! Every supported format implements [`SpectrumSource`]; [`source_for_path`]
//! picks one by file extension.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;

use crate::{
    error::{AnalysisError, Result},
    histogram::AmpHistogram,
};

pub const SPE_DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Histogram together with the name it was stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedHistogram {
    pub name: String,
    pub histogram: AmpHistogram,
}

pub trait SpectrumSource {
    fn read(&self, path: &Path) -> Result<NamedHistogram>;
}

/// File name without directory and extension.
pub fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn source_for_path(path: &Path) -> Result<Box<dyn SpectrumSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "spe" => Ok(Box::new(SpeSource)),
        "tsv" | "hist" => Ok(Box::new(TsvSource)),
        _ => Err(AnalysisError::UnsupportedSource(path.to_owned())),
    }
}

// === .spe ===

/// Parsed `.spe` record as written by the Boxerino acquisition software.
#[derive(Debug, Clone)]
pub struct SpeFile {
    path: PathBuf,
    raw_fields: BTreeMap<String, Vec<String>>,
    timestamp: NaiveDateTime,
    run_time: u64,
    counts: Vec<u64>,
}

impl SpeFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| AnalysisError::io(path, err))?;
        let mut lines = vec![];
        for line in BufReader::new(file).lines() {
            lines.push(line.map_err(|err| AnalysisError::io(path, err))?);
        }
        Self::parse(path, &lines)
    }

    pub fn parse(path: &Path, lines: &[String]) -> Result<Self> {
        let mut raw_fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (idx, line) in lines.iter().enumerate() {
            let first = line.split('\t').next().unwrap_or("");
            if let Some(header) = first.strip_prefix('$') {
                let key = header.strip_suffix(':').unwrap_or(header).to_owned();
                raw_fields.entry(key.clone()).or_default();
                current = Some(key);
            } else if let Some(key) = &current {
                let entry = raw_fields.entry(key.clone()).or_default();
                entry.extend(line.split('\t').map(str::to_owned));
            } else if !line.trim().is_empty() {
                return Err(AnalysisError::format(path, idx + 1, "data before the first header"));
            }
        }

        let run_time = {
            let field = first_value(path, &raw_fields, "MEAS_TIM")?;
            let token = field.split_whitespace().next().unwrap_or("");
            token.parse::<u64>().map_err(|_| {
                AnalysisError::format(path, 0, format!("bad MEAS_TIM value '{field}'"))
            })?
        };

        let timestamp = {
            let field = first_value(path, &raw_fields, "DATE_MEA")?;
            NaiveDateTime::parse_from_str(field.trim(), SPE_DATE_FORMAT).map_err(|_| {
                AnalysisError::format(path, 0, format!("bad DATE_MEA value '{field}'"))
            })?
        };

        // first two numbers are the channel range, not counts
        let counts = raw_parameter(path, &raw_fields, "DATA")?
            .iter()
            .flat_map(|row| row.split_whitespace())
            .filter_map(|token| token.parse::<u64>().ok())
            .skip(2)
            .collect();

        Ok(SpeFile {
            path: path.to_owned(),
            raw_fields,
            timestamp,
            run_time,
            counts,
        })
    }

    /// Lines stored under a `$KEY:` header.
    pub fn raw_parameter(&self, key: &str) -> Result<&[String]> {
        raw_parameter(&self.path, &self.raw_fields, key)
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Acquisition time in seconds.
    pub fn run_time(&self) -> u64 {
        self.run_time
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn title(&self) -> String {
        file_title(&self.path)
    }

    pub fn to_histogram(&self) -> AmpHistogram {
        AmpHistogram::from_channels(self.counts.clone())
    }
}

fn raw_parameter<'a>(
    path: &Path,
    raw_fields: &'a BTreeMap<String, Vec<String>>,
    key: &str,
) -> Result<&'a [String]> {
    raw_fields
        .get(key)
        .map(Vec::as_slice)
        .ok_or_else(|| AnalysisError::MissingField {
            key: key.to_owned(),
            path: path.to_owned(),
            available: raw_fields.keys().cloned().collect(),
        })
}

fn first_value<'a>(
    path: &Path,
    raw_fields: &'a BTreeMap<String, Vec<String>>,
    key: &str,
) -> Result<&'a str> {
    raw_parameter(path, raw_fields, key)?
        .first()
        .map(String::as_str)
        .ok_or_else(|| AnalysisError::format(path, 0, format!("header '{key}' has no value")))
}

pub struct SpeSource;

impl SpectrumSource for SpeSource {
    fn read(&self, path: &Path) -> Result<NamedHistogram> {
        let spe = SpeFile::open(path)?;
        Ok(NamedHistogram {
            name: spe.title(),
            histogram: spe.to_histogram(),
        })
    }
}

// === tsv ===

/// `low_edge<TAB>count` per line, histogram named after the file stem.
pub struct TsvSource;

impl TsvSource {
    pub fn parse(path: &Path, content: impl BufRead) -> Result<AmpHistogram> {
        let mut bins = vec![];
        for (idx, line) in content.lines().enumerate() {
            let line = line.map_err(|err| AnalysisError::io(path, err))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(edge), Some(count)) = (fields.next(), fields.next()) else {
                return Err(AnalysisError::format(path, idx + 1, "expected two tab separated columns"));
            };
            let edge = edge
                .trim()
                .parse::<f64>()
                .map_err(|_| AnalysisError::format(path, idx + 1, format!("bad bin edge '{edge}'")))?;
            let count = count
                .trim()
                .parse::<u64>()
                .map_err(|_| AnalysisError::format(path, idx + 1, format!("bad count '{count}'")))?;
            bins.push((edge, count));
        }

        AmpHistogram::from_bins(bins)
            .ok_or_else(|| AnalysisError::format(path, 0, "bins must be non-empty, ascending and uniform"))
    }
}

impl SpectrumSource for TsvSource {
    fn read(&self, path: &Path) -> Result<NamedHistogram> {
        let file = File::open(path).map_err(|err| AnalysisError::io(path, err))?;
        let histogram = Self::parse(path, BufReader::new(file))?;
        Ok(NamedHistogram {
            name: file_title(path),
            histogram,
        })
    }
}
