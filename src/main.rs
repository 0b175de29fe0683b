#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod tray;

use log::info;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
    info!("pinyin-helper {} starting", pinyin_helper::update::CURRENT_VERSION);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Pinyin Helper")
            .with_inner_size([1000.0, 800.0])
            .with_min_inner_size([700.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Pinyin Helper",
        options,
        Box::new(|cc| Ok(Box::new(app::PinyinApp::new(cc)))),
    )
}
