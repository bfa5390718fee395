//! Plotly output: stacked spectra per date and sample, endpoint drift per identifier.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plotly::{
    common::{Line, LineShape, Marker, MarkerSymbol, Mode, Title},
    layout::{Axis, AxisType},
    Layout, Plot, Scatter,
};

use crate::{
    aggregate::{Batch, TimeUnit},
    error::{AnalysisError, Result},
    histogram::AmpHistogram,
    labels::DisplayParams,
};

const COLORS: [&str; 8] = [
    "#000000", "#ff3333", "#ff6600", "#009900", "#009999", "#0000ff", "#cc00cc", "#999999",
];

const MARKERS: [MarkerSymbol; 4] = [
    MarkerSymbol::CircleOpen,
    MarkerSymbol::X,
    MarkerSymbol::Cross,
    MarkerSymbol::Circle,
];

pub fn spectra_file_name(sample_label: &str, date: NaiveDate) -> String {
    format!("Spectra_{sample_label}_{}.html", date.format("%d%m%y"))
}

pub const ENDPOINTS_FILE_NAME: &str = "Endpoints.html";

/// Upper end of the x axis: last bin of the summed spectrum above one count, rounded to tens.
pub fn stack_x_max(sum: &AmpHistogram) -> Option<f64> {
    let last = sum.last_bin_above(1)?;
    let edge = sum.low_edge(last);
    let rounded = (edge / 10.0).round() * 10.0;
    Some(if rounded > 0.0 { rounded } else { edge + sum.step })
}

fn write_plot(plot: &Plot, path: &Path) -> Result<()> {
    std::fs::write(path, plot.to_html()).map_err(|err| AnalysisError::io(path, err))
}

/// One plot per `(date, sample_label)` pair that has measurements.
pub fn render_spectra(batch: &Batch, params: &DisplayParams, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = vec![];

    for ((date, sample_label), members) in batch.stacks() {
        let mut plot = Plot::new();

        for (counter, idx) in members.iter().enumerate() {
            let measurement = batch.get(*idx);
            let trace = Scatter::new(measurement.histogram.x.clone(), measurement.histogram.y.clone())
                .mode(Mode::Lines)
                .line(
                    Line::new()
                        .shape(LineShape::Hv)
                        .color(COLORS[(counter + 1) % COLORS.len()]),
                )
                .name(params.spectrum_legend(&measurement.meta));
            plot.add_trace(trace);
        }

        let sum = {
            let first = &batch.get(members[0]).histogram;
            first.merged(members[1..].iter().map(|idx| &batch.get(*idx).histogram))
        };
        let mut x_axis = Axis::new().title(Title::new("ADC"));
        if let Some(x_max) = stack_x_max(&sum) {
            x_axis = x_axis.range(vec![0.0, x_max]);
        }

        let layout = Layout::new()
            .title(Title::new(params.stack_title(date, &sample_label).as_str()))
            .x_axis(x_axis)
            .y_axis(
                Axis::new()
                    .title(Title::new("Counts / ADC bin"))
                    .type_(AxisType::Log),
            )
            .height(800);
        plot.set_layout(layout);

        let path = out_dir.join(spectra_file_name(&sample_label, date));
        write_plot(&plot, &path)?;
        log::debug!("wrote {path:?}");
        written.push(path);
    }

    Ok(written)
}

/// Median endpoint against time, one series per identifier.
///
/// Marker symbol follows the sample label, colour the concentration.
pub fn render_endpoints(
    batch: &Batch,
    params: &DisplayParams,
    unit: TimeUnit,
    out_dir: &Path,
) -> Result<PathBuf> {
    let groups = batch.groups();
    let samples = groups.by_sample.keys().collect::<Vec<_>>();
    let concentrations = groups.by_concentration.keys().collect::<Vec<_>>();

    let mut plot = Plot::new();

    for (identifier, points) in batch.time_series(unit) {
        let meta = &batch.get(groups.by_identifier[&identifier][0]).meta;

        let marker = samples
            .iter()
            .position(|sample| **sample == meta.sample_label)
            .unwrap_or(0);
        let color = concentrations
            .iter()
            .position(|concentration| **concentration == meta.concentration)
            .unwrap_or(0);

        let (x, y): (Vec<_>, Vec<_>) = points
            .iter()
            .map(|point| (point.relative_time, point.median))
            .unzip();

        let trace = Scatter::new(x, y)
            .mode(Mode::LinesMarkers)
            .marker(
                Marker::new()
                    .symbol(MARKERS[marker % MARKERS.len()].clone())
                    .color(COLORS[color % COLORS.len()]),
            )
            .line(Line::new().color(COLORS[color % COLORS.len()]))
            .name(params.series_legend(meta));
        plot.add_trace(trace);
    }

    let layout = Layout::new()
        .title(Title::new(
            format!("{}% Te, {}g/l PPO, {}", params.te, params.ppo, params.stabiliser).as_str(),
        ))
        .x_axis(Axis::new().title(Title::new(unit.axis_title())))
        .y_axis(Axis::new().title(Title::new("Estimated Endpoint [ADC units]")))
        .height(800);
    plot.set_layout(layout);

    let path = out_dir.join(ENDPOINTS_FILE_NAME);
    write_plot(&plot, &path)?;
    log::debug!("wrote {path:?}");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_max_rounds_to_tens() {
        let mut counts = vec![5; 47];
        counts.extend([1, 0, 1]);
        let sum = AmpHistogram::from_channels(counts);
        assert_eq!(stack_x_max(&sum), Some(50.0));

        let sum = AmpHistogram::from_channels(vec![9, 9, 0]);
        assert_eq!(stack_x_max(&sum), Some(2.0));

        assert_eq!(stack_x_max(&AmpHistogram::from_channels(vec![1, 1])), None);
    }

    #[test]
    fn spectra_names() {
        let date = NaiveDate::from_ymd_opt(2017, 1, 26).unwrap();
        assert_eq!(spectra_file_name("B", date), "Spectra_B_260117.html");
    }
}
