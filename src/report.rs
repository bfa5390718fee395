use std::{collections::BTreeMap, path::Path};

use serde::Serialize;

use crate::{
    aggregate::{Batch, Drift, SeriesPoint, TimeUnit},
    error::{AnalysisError, Result},
};

pub const TABLE_FILE_NAME: &str = "endpoints.tsv";
pub const SUMMARY_FILE_NAME: &str = "summary.json";

/// Tab separated line per measurement, in date order.
pub fn endpoint_table(batch: &Batch, unit: TimeUnit) -> String {
    let mut table = "name\tdate\tidentifier\trelative_time\tmedian\tmean\n".to_string();
    for idx in batch.date_order() {
        let measurement = batch.get(idx);
        table.push_str(&format!(
            "{name}\t{date}\t{identifier}\t{time}\t{median}\t{mean}\n",
            name = measurement.name,
            date = measurement.meta.date,
            identifier = measurement.meta.identifier,
            time = unit.count(batch.relative_time(idx)),
            median = measurement.endpoint.median,
            mean = measurement.endpoint.mean,
        ));
    }
    table
}

#[derive(Debug, Serialize)]
pub struct IdentifierSummary {
    pub concentration: String,
    pub sample_label: String,
    pub points: Vec<SeriesPoint>,
    pub drift: Option<Drift>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub min_date: chrono::NaiveDate,
    pub unit: TimeUnit,
    pub identifiers: BTreeMap<String, IdentifierSummary>,
}

impl Summary {
    pub fn new(batch: &Batch, unit: TimeUnit) -> Self {
        let groups = batch.groups();
        let identifiers = batch
            .time_series(unit)
            .into_iter()
            .map(|(identifier, points)| {
                let meta = &batch.get(groups.by_identifier[&identifier][0]).meta;
                let summary = IdentifierSummary {
                    concentration: meta.concentration.clone(),
                    sample_label: meta.sample_label.clone(),
                    drift: Drift::fit(&points),
                    points,
                };
                (identifier, summary)
            })
            .collect();

        Summary {
            min_date: batch.min_date(),
            unit,
            identifiers,
        }
    }
}

pub fn write_reports(batch: &Batch, unit: TimeUnit, out_dir: &Path) -> Result<Summary> {
    let table_path = out_dir.join(TABLE_FILE_NAME);
    std::fs::write(&table_path, endpoint_table(batch, unit))
        .map_err(|err| AnalysisError::io(&table_path, err))?;

    let summary = Summary::new(batch, unit);
    let summary_path = out_dir.join(SUMMARY_FILE_NAME);
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|err| AnalysisError::io(&summary_path, err.into()))?;
    std::fs::write(&summary_path, json).map_err(|err| AnalysisError::io(&summary_path, err))?;

    Ok(summary)
}
