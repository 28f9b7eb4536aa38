//! Horizontal bar chart of pathway frequencies.

use crate::error::{MetaboError, Result};
use crate::pathway::PathwayReport;
use plotters::prelude::*;
use std::path::Path;

const BAR_COLOR: RGBColor = RGBColor(224, 33, 138);

/// Render the pathway frequency table as a horizontal bar chart PNG.
///
/// Bars are ordered by frequency with the most frequent pathway at the top.
/// An empty frequency table is an error; rendering failures map to the
/// `Plot` error variant.
pub fn plot_pathway_frequencies<P: AsRef<Path>>(report: &PathwayReport, path: P) -> Result<()> {
    if report.frequencies.is_empty() {
        return Err(MetaboError::EmptyData(
            "no pathway frequencies to plot".to_string(),
        ));
    }

    // frequencies arrive sorted descending; the y axis grows upward, so
    // reverse to put the most frequent pathway at the top
    let rows: Vec<(String, usize)> = report
        .frequencies
        .iter()
        .rev()
        .map(|f| (f.name.clone(), f.count))
        .collect();
    let n = rows.len();
    let max_count = rows.iter().map(|(_, c)| *c).max().unwrap_or(1);

    let height = 160 + 28 * n as u32;
    let path = path.as_ref();
    let root = BitMapBackend::new(path, (1000, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| MetaboError::Plot(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Metabolic pathway frequency", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(280)
        .build_cartesian_2d(0..max_count + 1, (0..n).into_segmented())
        .map_err(|e| MetaboError::Plot(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Frequency")
        .y_desc("Metabolic pathway")
        .y_labels(n)
        .y_label_formatter(&|value: &SegmentValue<usize>| match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) if *i < n => rows[*i].0.clone(),
            _ => String::new(),
        })
        .draw()
        .map_err(|e| MetaboError::Plot(e.to_string()))?;

    chart
        .draw_series(rows.iter().enumerate().map(|(i, (_, count))| {
            Rectangle::new(
                [
                    (0, SegmentValue::Exact(i)),
                    (*count, SegmentValue::Exact(i + 1)),
                ],
                BAR_COLOR.mix(0.85).filled(),
            )
        }))
        .map_err(|e| MetaboError::Plot(e.to_string()))?;

    root.present()
        .map_err(|e| MetaboError::Plot(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_rejected() {
        let report = PathwayReport {
            compounds: vec![],
            failures: vec![],
            frequencies: vec![],
        };
        let err = plot_pathway_frequencies(&report, "/tmp/unused.png").unwrap_err();
        assert!(matches!(err, MetaboError::EmptyData(_)));
    }
}
