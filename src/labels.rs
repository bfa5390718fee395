//! Text shown in plot titles and legends.
//!
//! Templates:
//! * spectrum legend: `"{concentration} {stabiliser}:Te"`, pure samples `"LAB {ppo}g/l PPO"`
//! * series legend: `"{concentration} molar ratio {sample_label}"`, pure samples `"Pure LAB-PPO"`
//! * stack title: `"{te}% Te, {ppo}g/l PPO, {stabiliser}, {dd/mm/YYYY}, {sample_label}"`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metadata::SampleMeta;

pub const DEFAULT_PPO: f64 = 2.0;

/// Pass-through values that only end up in titles and legends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayParams {
    pub stabiliser: String,
    /// Te loading in percent.
    pub te: f64,
    /// PPO concentration in g/l.
    #[serde(default = "default_ppo")]
    pub ppo: f64,
}

fn default_ppo() -> f64 {
    DEFAULT_PPO
}

impl DisplayParams {
    pub fn spectrum_legend(&self, meta: &SampleMeta) -> String {
        if meta.is_pure() {
            format!("LAB {}g/l PPO", self.ppo)
        } else {
            format!("{} {}:Te", meta.concentration, self.stabiliser)
        }
    }

    pub fn series_legend(&self, meta: &SampleMeta) -> String {
        if meta.is_pure() {
            "Pure LAB-PPO".to_owned()
        } else {
            format!("{} molar ratio {}", meta.concentration, meta.sample_label)
        }
    }

    pub fn stack_title(&self, date: NaiveDate, sample_label: &str) -> String {
        format!(
            "{}% Te, {}g/l PPO, {}, {}, {sample_label}",
            self.te,
            self.ppo,
            self.stabiliser,
            date.format("%d/%m/%Y")
        )
    }
}
