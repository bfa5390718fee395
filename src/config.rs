//! Run configuration, read from yaml and completed from the command line.
//!
//! ```yaml
//! input: "/data/stabiliser/hists/*.tsv"
//! exclude: ["_bad_"]
//! out_dir: results
//! stabiliser: DDA
//! te: 0.5
//! ppo: 2
//! convention: token-count   # or suffix
//! tail_budget: 75
//! on_insufficient: abort    # or skip
//! time_unit: days           # or hours
//! ```

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::TimeUnit,
    endpoint::{EndpointEstimator, DEFAULT_TAIL_BUDGET},
    error::{AnalysisError, Result},
    labels::DisplayParams,
    metadata::NamingConvention,
    workspace::get_workspace,
};

/// What to do with a spectrum whose endpoint can't be estimated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InsufficientPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opts {
    /// Glob pattern of spectrum files.
    pub input: String,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "get_workspace")]
    pub out_dir: PathBuf,
    #[serde(flatten)]
    pub display: DisplayParams,
    #[serde(default)]
    pub convention: NamingConvention,
    #[serde(default = "default_tail_budget")]
    pub tail_budget: u64,
    #[serde(default)]
    pub on_insufficient: InsufficientPolicy,
    #[serde(default)]
    pub time_unit: TimeUnit,
}

fn default_tail_budget() -> u64 {
    DEFAULT_TAIL_BUDGET
}

impl Opts {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|err| AnalysisError::io(path, err))?;
        serde_yaml::from_reader(file).map_err(|source| AnalysisError::Config {
            path: path.to_owned(),
            source,
        })
    }

    pub fn parse_yaml(path: &Path, yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|source| AnalysisError::Config {
            path: path.to_owned(),
            source,
        })
    }

    pub fn pipeline(&self) -> PipelineParams {
        PipelineParams {
            convention: self.convention,
            estimator: EndpointEstimator::new(self.tail_budget),
            on_insufficient: self.on_insufficient,
        }
    }
}

/// Settings that affect how measurements are built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineParams {
    pub convention: NamingConvention,
    pub estimator: EndpointEstimator,
    pub on_insufficient: InsufficientPolicy,
}
