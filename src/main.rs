mod canvas;
mod gui;
mod inference;
mod logging;
mod settings;

use crate::gui::DigitPadApp;
use crate::inference::client::PredictClient;
use crate::settings::Settings;

use eframe::egui;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load("settings.json")?;
    logging::init(settings.debug_logging);

    let client = Arc::new(PredictClient::new(&settings.api_base_url)?);
    let app = DigitPadApp::new(settings, client);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1080.0, 680.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DigitPad",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("failed to start UI: {e}"))
}
