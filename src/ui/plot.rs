use eframe::egui::{Align2, RichText, Stroke, Ui};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};

use crate::color::SeriesStyle;
use crate::data::series::TrendPoint;

// ---------------------------------------------------------------------------
// Trend chart
// ---------------------------------------------------------------------------

/// How point values are printed above the markers.
#[derive(Debug, Clone, Copy)]
pub enum ValueFormat {
    Percent,
    Plain,
}

impl ValueFormat {
    fn format(self, v: f64) -> String {
        match self {
            ValueFormat::Percent => format!("{v:.2}%"),
            ValueFormat::Plain => format!("{v:.2}"),
        }
    }
}

/// Contiguous runs of points that have a value. A point without a value
/// breaks the line but keeps its x position.
fn segments(points: &[TrendPoint]) -> Vec<Vec<[f64; 2]>> {
    let mut runs: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut current = Vec::new();
    for (i, p) in points.iter().enumerate() {
        match p.value {
            Some(v) => current.push([i as f64, v]),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Render one trend series as a category-axis line chart.
pub fn trend_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    y_label: &str,
    points: &[TrendPoint],
    style: SeriesStyle,
    format: ValueFormat,
) {
    ui.heading(title);

    let values: Vec<f64> = points.iter().filter_map(|p| p.value).collect();
    if values.is_empty() {
        ui.label(RichText::new("No data for the current selection.").weak());
        return;
    }
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.25).max(hi.abs() * 0.02).max(0.5);
    let floor = lo - pad / 2.0;

    let labels: Vec<String> = points.iter().map(|p| p.label.clone()).collect();
    let n = points.len() as f64;

    Plot::new(id)
        .height(300.0)
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .include_x(-0.5)
        .include_x(n - 0.5)
        .include_y(floor)
        .include_y(hi + pad)
        .allow_scroll(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            for run in segments(points) {
                // Area under the line as trapezoids; polygons must be convex.
                for pair in run.windows(2) {
                    let [x0, y0] = pair[0];
                    let [x1, y1] = pair[1];
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(vec![
                            [x0, floor],
                            [x0, y0],
                            [x1, y1],
                            [x1, floor],
                        ]))
                        .fill_color(style.fill)
                        .stroke(Stroke::NONE),
                    );
                }
                plot_ui.line(
                    Line::new(PlotPoints::from(run))
                        .name(title)
                        .color(style.line)
                        .width(3.0),
                );
            }

            let markers: Vec<[f64; 2]> = points
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.value.map(|v| [i as f64, v]))
                .collect();
            plot_ui.points(
                Points::new(markers)
                    .radius(5.0)
                    .color(style.line)
                    .filled(true),
            );

            for (i, p) in points.iter().enumerate() {
                let Some(v) = p.value else { continue };
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(i as f64, v + pad * 0.15),
                        RichText::new(format.format(v)).strong(),
                    )
                    .anchor(Align2::CENTER_BOTTOM),
                );
            }
        });
}
