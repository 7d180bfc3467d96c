//! Plot surface
//!
//! Shows placeholder series until telemetry streaming is wired in.

use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};

const DEMO_X: [f64; 10] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
const DEMO_A: [f64; 10] = [30.0, 32.0, 34.0, 32.0, 33.0, 31.0, 29.0, 32.0, 35.0, 45.0];
const DEMO_B: [f64; 10] = [16.0, 20.0, 17.0, 23.0, 30.0, 25.0, 28.0, 26.0, 22.0, 32.0];

struct Series {
    name: &'static str,
    color: Color32,
    points: Vec<[f64; 2]>,
}

/// Drawn curves and the plot widget that shows them
#[derive(Default)]
pub struct PlotSurface {
    series: Vec<Series>,
}

impl PlotSurface {
    /// Add the sample curves
    pub fn draw(&mut self) {
        self.series.push(Series {
            name: "Temp 1",
            color: Color32::RED,
            points: zip(&DEMO_X, &DEMO_A),
        });
        self.series.push(Series {
            name: "Temp 2",
            color: Color32::BLUE,
            points: zip(&DEMO_X, &DEMO_B),
        });
    }

    /// Remove every curve
    pub fn clear(&mut self) {
        self.series.clear();
    }

    /// Render into `ui`
    pub fn show(&self, ui: &mut Ui) {
        Plot::new("telemetry")
            .legend(Legend::default())
            .show_grid(true)
            .x_axis_label("Time [h]")
            .y_axis_label("Temperature [°C]")
            .show(ui, |plot_ui| {
                for series in &self.series {
                    let points: PlotPoints = series.points.iter().copied().collect();
                    plot_ui.line(Line::new(points).color(series.color).name(series.name));
                }
            });
    }
}

fn zip(xs: &[f64], ys: &[f64]) -> Vec<[f64; 2]> {
    xs.iter().zip(ys).map(|(&x, &y)| [x, y]).collect()
}
