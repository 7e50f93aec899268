use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints};

// ---------------------------------------------------------------------------
// Shared chart helpers (egui_plot)
// ---------------------------------------------------------------------------

const CHART_HEIGHT: f32 = 220.0;

/// Line chart over (x, y) points. X ticks render as whole numbers, which
/// keeps year axes free of fractional labels.
pub fn line_chart(ui: &mut Ui, id: &str, title: &str, points: &[(f64, f64)], color: Color32) {
    ui.strong(title);
    let plot_points: PlotPoints = points.iter().map(|&(x, y)| [x, y]).collect();
    Plot::new(id.to_owned())
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_formatter(|mark, _range| integral_label(mark.value))
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(plot_points).color(color).width(2.0));
        });
}

/// Vertical bar chart with one bar per category. Categories map to the
/// 0..n positions on the x axis; the tick formatter swaps the position
/// back for the label.
pub fn category_bars<F>(ui: &mut Ui, id: &str, title: &str, entries: &[(String, f64)], color_of: F)
where
    F: Fn(usize, &str) -> Color32,
{
    ui.strong(title);
    if entries.is_empty() {
        ui.weak("Tidak ada data.");
        return;
    }
    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            Bar::new(i as f64, *value)
                .name(label)
                .fill(color_of(i, label))
                .width(0.6)
        })
        .collect();
    let tick_labels: Vec<String> = entries.iter().map(|(label, _)| label.clone()).collect();

    Plot::new(id.to_owned())
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| {
            let rounded = mark.value.round();
            if (mark.value - rounded).abs() < 1e-6 && rounded >= 0.0 {
                tick_labels
                    .get(rounded as usize)
                    .cloned()
                    .unwrap_or_default()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn integral_label(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-6 {
        format!("{rounded:.0}")
    } else {
        String::new()
    }
}
