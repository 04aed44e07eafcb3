#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod error;
mod pipeline;
mod types;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use crossbeam_channel::bounded;
use gpui::Application;
use gpui_component;

fn main() -> Result<()> {
    env_logger::init();

    let background = Arc::new(pipeline::load_background(pipeline::DEPTH_RESOLUTION)?);
    log::info!(
        "background loaded: {}x{}",
        background.width,
        background.height
    );

    let (frame_tx, frame_rx) = bounded(1);

    Application::new()
        .with_assets(gpui_component_assets::Assets)
        .run(move |app| {
            gpui_component::init(app);

            if let Err(err) = ui::launch_ui(app, frame_rx, frame_tx, background.clone()) {
                log::error!("failed to launch ui: {err:?}");
            }
        });

    Ok(())
}
