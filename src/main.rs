//! Sensorlink - HR/RR sensor monitor
//!
//! Desktop window with the connect toggle, telemetry mode selector and plot.

use clap::Parser;
use eframe::egui;
use sensorlink_core::{logging, ConfigArgs, Controller, NativeOpener};
use std::sync::Arc;

mod gui;

/// Sensorlink desktop application
#[derive(Parser, Debug)]
#[command(name = "sensorlink", version, about = "HR/RR sensor monitor")]
struct Args {
    #[command(flatten)]
    config: ConfigArgs,
}

fn main() -> anyhow::Result<()> {
    let config = Args::parse().config.into_config()?;
    logging::init(&config.logging);

    tracing::info!("Starting Sensorlink v{}", env!("CARGO_PKG_VERSION"));

    let controller = Controller::from_config(&config, Arc::new(NativeOpener))?;

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 720.0])
        .with_min_inner_size([1280.0, 720.0])
        .with_title("Sensorlink");

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Sensorlink",
        native_options,
        Box::new(move |_cc| Ok(Box::new(gui::SensorApp::new(controller)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}
