mod animations;
mod app;
mod camera;
mod camera_screen;
mod classifier;
mod curtain;
mod decision;
mod error;
mod model_download;
mod session;
mod settings;
mod types;
mod wizard;

use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();

    let app = app::App::new()?;
    app.run()
}
