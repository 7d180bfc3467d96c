//! Main window: connect toggle, telemetry mode selector and plot

use super::plot::PlotSurface;
use eframe::egui;
use sensorlink_core::{Controller, LinkEvent, TelemetryMode, UiAction};
use std::time::Duration;
use tracing::warn;

/// How often the window polls the controller while idle
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sensorlink main window
pub struct SensorApp {
    controller: Controller,
    plot: PlotSurface,
    status_message: String,
}

impl SensorApp {
    /// Wrap a controller in a window
    pub fn new(controller: Controller) -> Self {
        let mut plot = PlotSurface::default();
        plot.draw();
        Self {
            controller,
            plot,
            status_message: String::new(),
        }
    }

    fn dispatch(&mut self, action: UiAction) {
        if let Err(e) = self.controller.dispatch(action) {
            warn!(error = %e, ?action, "action failed");
            self.status_message = e.to_string();
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut checked = self.controller.is_checked();
            if ui
                .toggle_value(&mut checked, self.controller.label())
                .changed()
            {
                self.status_message.clear();
                self.dispatch(UiAction::Toggled(checked));
            }

            ui.separator();

            let mut mode = self.controller.telemetry_mode();
            egui::ComboBox::from_id_salt("telemetry_mode")
                .selected_text(mode.label())
                .show_ui(ui, |ui| {
                    for option in TelemetryMode::ALL {
                        ui.selectable_value(&mut mode, option, option.label());
                    }
                });
            if mode != self.controller.telemetry_mode() {
                self.dispatch(UiAction::ModeSelected(mode));
            }

            ui.separator();

            if ui.button("Draw").clicked() {
                self.plot.draw();
            }
            if ui.button("Clear").clicked() {
                self.plot.clear();
            }

            if !self.status_message.is_empty() {
                ui.separator();
                ui.label(&self.status_message);
            }
        });
    }
}

impl eframe::App for SensorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.controller.pump();
        for event in self.controller.drain_notices() {
            if let LinkEvent::Status(status) = event {
                if !status.is_success() {
                    self.status_message = format!("Could not connect to {}", status.port);
                }
            }
        }

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.add_space(4.0);
            self.show_controls(ui);
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.plot.show(ui);
        });

        ctx.request_repaint_after(POLL_INTERVAL);
    }
}

impl Drop for SensorApp {
    fn drop(&mut self) {
        self.dispatch(UiAction::Exit);
    }
}
