//! GUI module for the graphical user interface

mod app;
mod plot;

pub use app::SensorApp;
