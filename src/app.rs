use std::io::{self, Write};

use anyhow::Result;

use crate::animations::AnimationLibrary;
use crate::camera_screen::{CameraScreen, ScreenExit};
use crate::curtain::CurtainScreen;
use crate::model_download::{default_animations_dir, default_settings_path};
use crate::settings::SettingsStore;
use crate::wizard::WizardScreen;

/// Orchestrates the screen flow: curtain → wizard → camera, looping back to
/// the curtain whenever the visitor goes home.
pub struct App {
    settings: SettingsStore,
    animations: AnimationLibrary,
}

impl App {
    pub fn new() -> Result<Self> {
        Ok(Self {
            settings: SettingsStore::new(default_settings_path())?,
            animations: AnimationLibrary::new(default_animations_dir()),
        })
    }

    pub fn run(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let stdout = io::stdout();
        let mut output = stdout.lock();

        loop {
            CurtainScreen::run(&mut input, &mut output)?;

            let answers = WizardScreen::run(&mut input, &mut output)?;
            log::info!("wizard completed with {} answers", answers.len());
            for (id, answer) in &answers {
                log::debug!("answer {id}: {answer:?}");
            }

            let screen = CameraScreen::new(&self.settings, &self.animations);
            match screen.run(&mut input, &mut output) {
                Ok(ScreenExit::Home) => continue,
                Ok(ScreenExit::Quit) => return Ok(()),
                Err(err) => {
                    writeln!(
                        output,
                        "No pude cargar modelo/labels o abrir la cámara. Revisa rutas y permisos."
                    )?;
                    return Err(err);
                }
            }
        }
    }
}
