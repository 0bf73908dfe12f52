use std::path::Path;

use plotters::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::models::Regression;

pub const SCATTER_FILENAME: &str = "scatter_plot.svg";
pub const HISTOGRAM_FILENAME: &str = "final_mark_histogram.svg";
const HISTOGRAM_BINS: usize = 10;

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn plot_error(path: &Path, err: Box<dyn std::error::Error>) -> AnalysisError {
    AnalysisError::Plot {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Range covering `values` with a little headroom; never empty.
fn padded_range(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let low = values.clone().fold(f64::INFINITY, f64::min);
    let high = values.fold(f64::NEG_INFINITY, f64::max);
    if !low.is_finite() || !high.is_finite() {
        return (0.0, 1.0);
    }
    if low == high {
        return (low - 1.0, high + 1.0);
    }
    let pad = (high - low) * 0.05;
    (low - pad, high + pad)
}

/// Attendance (x) against final mark (y), with the fitted line when available.
///
/// Returns `false` without touching the filesystem when there is nothing to plot.
pub fn scatter_plot(
    path: &Path,
    points: &[(f64, f64)],
    regression: Option<&Regression>,
) -> Result<bool> {
    if points.is_empty() {
        return Ok(false);
    }
    draw_scatter(path, points, regression).map_err(|err| plot_error(path, err))?;
    Ok(true)
}

fn draw_scatter(path: &Path, points: &[(f64, f64)], regression: Option<&Regression>) -> DrawResult {
    let (x_min, x_max) = padded_range(points.iter().map(|point| point.0));
    let (y_min, y_max) = padded_range(points.iter().map(|point| point.1));

    let root = SVGBackend::new(path, (900, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Correlation between Student Attendance and Final Marks",
            ("sans-serif", 24),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Attendance Percentage")
        .y_desc("Final Mark")
        .draw()?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.5).filled())),
        )?
        .label("Student Data")
        .legend(|(x, y)| Circle::new((x, y), 3, BLUE.filled()));

    if let Some(fit) = regression {
        chart
            .draw_series(LineSeries::new(
                vec![(x_min, fit.predict(x_min)), (x_max, fit.predict(x_max))],
                &RED,
            ))?
            .label(format!("Line of Best Fit (R²={:.2})", fit.r_value.powi(2)))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Bucket counts for `values` over `bins` equal-width bins.
pub fn histogram_counts(values: &[f64], bins: usize) -> (f64, f64, Vec<u32>) {
    let low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let bins = bins.max(1);
    let width = if high > low { (high - low) / bins as f64 } else { 1.0 };

    let mut counts = vec![0u32; bins];
    for value in values {
        let bucket = (((value - low) / width) as usize).min(bins - 1);
        counts[bucket] += 1;
    }
    (low, width, counts)
}

/// Distribution of final marks. Returns `false` when there are no marks.
pub fn final_mark_histogram(path: &Path, marks: &[f64]) -> Result<bool> {
    if marks.is_empty() {
        return Ok(false);
    }
    draw_histogram(path, marks).map_err(|err| plot_error(path, err))?;
    Ok(true)
}

fn draw_histogram(path: &Path, marks: &[f64]) -> DrawResult {
    let (low, width, counts) = histogram_counts(marks, HISTOGRAM_BINS);
    let high = low + width * counts.len() as f64;
    let tallest = counts.iter().copied().max().unwrap_or(0);

    let root = SVGBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Final Marks", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(low..high, 0u32..tallest + 1)?;
    chart
        .configure_mesh()
        .x_desc("Final Mark")
        .y_desc("Students")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(bucket, &count)| {
        let start = low + bucket as f64 * width;
        Rectangle::new([(start, 0), (start + width, count)], BLUE.mix(0.6).filled())
    }))?;
    root.present()?;
    Ok(())
}
