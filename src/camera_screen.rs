use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, bounded};

use crate::animations::AnimationLibrary;
use crate::camera::{
    CameraDevice, CameraStream, available_cameras, resolve_device, start_camera_stream,
};
use crate::classifier::{OrtEngine, load_label_map};
use crate::error::CaptureError;
use crate::model_download::{default_labels_path, default_model_path, ensure_model_available};
use crate::session::{
    CAPTURE_SECS, COUNTDOWN_SECS, CapturePhase, CaptureSession, run_capture_window,
};
use crate::settings::SettingsStore;
use crate::types::Frame;

pub enum ScreenExit {
    Home,
    Quit,
}

/// The camera screen: activation loads the classifier and opens the camera
/// (all-or-nothing), then a command loop drives the capture state machine.
pub struct CameraScreen<'a> {
    settings: &'a SettingsStore,
    animations: &'a AnimationLibrary,
}

impl<'a> CameraScreen<'a> {
    pub fn new(settings: &'a SettingsStore, animations: &'a AnimationLibrary) -> Self {
        Self {
            settings,
            animations,
        }
    }

    pub fn run(
        &self,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<ScreenExit> {
        let model_path = default_model_path();
        let labels = load_label_map(&default_labels_path())
            .map_err(|err| CaptureError::resource("label map", err))?;
        ensure_model_available(&model_path)
            .map_err(|err| CaptureError::resource("emotion model", err))?;
        let mut engine = OrtEngine::new(&model_path, labels)
            .map_err(|err| CaptureError::resource("emotion model", err))?;

        let devices =
            available_cameras().map_err(|err| CaptureError::resource("camera list", err))?;
        let mut device = resolve_device(&devices, None, self.settings)?;
        self.settings.set_camera_id(&device.id());

        let (frame_tx, frame_rx): (Sender<Frame>, Receiver<Frame>) = bounded(1);
        let mut stream = Some(
            start_camera_stream(&device, frame_tx.clone())
                .map_err(|err| CaptureError::resource("camera stream", err))?,
        );

        let mut session = CaptureSession::new();
        writeln!(output)?;
        writeln!(output, "— Pantalla de cámara — usando {}", device.label)?;

        loop {
            match session.phase() {
                CapturePhase::Idle => writeln!(
                    output,
                    "Listo. Comandos: start | cameras | camera <n> | home | quit"
                )?,
                CapturePhase::Showing => {
                    writeln!(output, "Comandos: retry | home | quit")?
                }
                _ => {}
            }
            write!(output, "> ")?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                stop_stream(&mut stream);
                return Ok(ScreenExit::Quit);
            }
            let command = line.trim();

            match command {
                "start" => {
                    if !session.start() {
                        writeln!(output, "Solo puedes comenzar desde la pantalla inicial.")?;
                        continue;
                    }

                    for i in (1..=COUNTDOWN_SECS).rev() {
                        writeln!(output, "Comenzamos en {i}…")?;
                        output.flush()?;
                        thread::sleep(Duration::from_secs(1));
                    }

                    session.begin_capture();
                    writeln!(output, "Capturando…")?;
                    output.flush()?;

                    // History belongs to this attempt only; drop anything
                    // buffered before the window opens.
                    while frame_rx.try_recv().is_ok() {}

                    let cancel = session.cancel_token();
                    let window = run_capture_window(
                        &mut engine,
                        &frame_rx,
                        &cancel,
                        Duration::from_secs_f64(CAPTURE_SECS),
                    );

                    match window {
                        Ok(outcome) => {
                            session.show_result();
                            stop_stream(&mut stream);
                            if outcome.locked {
                                log::info!("early lock on {}", outcome.result.label);
                            }
                            writeln!(output, "Emoción: {}", outcome.result.display_text())?;
                            match self.animations.resolve(&outcome.result.label) {
                                Ok(path) => {
                                    writeln!(
                                        output,
                                        "Reproduciendo animación: {}",
                                        path.display()
                                    )?;
                                }
                                Err(CaptureError::UnmappedLabel(label)) => {
                                    writeln!(output, "No hay animación para: {label}")?;
                                }
                                Err(err) => return Err(err.into()),
                            }
                        }
                        Err(CaptureError::NoFramesCaptured) => {
                            session.abort_to_idle();
                            writeln!(
                                output,
                                "No se capturaron fotogramas. Intenta de nuevo."
                            )?;
                        }
                        Err(CaptureError::Cancelled) => {
                            session.abort_to_idle();
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                "retry" => {
                    if !session.retry() {
                        writeln!(output, "No hay nada que reintentar.")?;
                        continue;
                    }
                    // One active stream at a time: stop before reopening.
                    stop_stream(&mut stream);
                    match self.restart_stream(&mut device, &frame_tx) {
                        Ok(new_stream) => {
                            stream = Some(new_stream);
                            writeln!(output, "Cámara lista: {}", device.label)?;
                        }
                        Err(err) => {
                            writeln!(output, "Error al reabrir la cámara: {err}")?;
                        }
                    }
                }
                "cameras" => {
                    let devices = available_cameras().unwrap_or_default();
                    if devices.is_empty() {
                        writeln!(output, "No hay cámaras disponibles.")?;
                    }
                    for (i, item) in devices.iter().enumerate() {
                        let marker = if item.id() == device.id() { "*" } else { " " };
                        writeln!(output, " {marker} {}) {}", i + 1, item.label)?;
                    }
                }
                _ if command.starts_with("camera ") => {
                    if session.phase() != CapturePhase::Idle {
                        writeln!(output, "Cambia de cámara desde la pantalla inicial.")?;
                        continue;
                    }
                    stop_stream(&mut stream);
                    match self.switch_device(command, &mut device, &frame_tx) {
                        Ok(new_stream) => {
                            stream = Some(new_stream);
                            writeln!(output, "Cámara cambiada: {}", device.label)?;
                        }
                        Err(err) => {
                            writeln!(output, "Error al cambiar de cámara: {err}")?;
                        }
                    }
                }
                "home" => {
                    writeln!(
                        output,
                        "¿Quieres reiniciar la experiencia desde el inicio? (s/n)"
                    )?;
                    output.flush()?;
                    let mut confirm = String::new();
                    input.read_line(&mut confirm)?;
                    if confirm.trim().eq_ignore_ascii_case("s") {
                        stop_stream(&mut stream);
                        session.reset();
                        return Ok(ScreenExit::Home);
                    }
                }
                "quit" => {
                    stop_stream(&mut stream);
                    session.reset();
                    return Ok(ScreenExit::Quit);
                }
                "" => {}
                _ => writeln!(output, "Comando no reconocido: {command}")?,
            }
        }
    }

    /// Reopens the camera feed after a result screen, honoring the
    /// persisted selection and falling back when the device vanished.
    fn restart_stream(
        &self,
        device: &mut CameraDevice,
        frame_tx: &Sender<Frame>,
    ) -> Result<CameraStream> {
        let devices = available_cameras()?;
        let current = device.id();
        *device = resolve_device(&devices, Some(&current), self.settings)?;
        if device.id() != current {
            self.settings.set_camera_id(&device.id());
        }
        Ok(start_camera_stream(device, frame_tx.clone())?)
    }

    fn switch_device(
        &self,
        command: &str,
        device: &mut CameraDevice,
        frame_tx: &Sender<Frame>,
    ) -> Result<CameraStream> {
        let devices = available_cameras()?;
        let choice: usize = command
            .trim_start_matches("camera ")
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("usa: camera <número>"))?;
        let selected = choice
            .checked_sub(1)
            .and_then(|i| devices.get(i))
            .ok_or_else(|| anyhow::anyhow!("no existe la cámara {choice}"))?
            .clone();

        let stream = start_camera_stream(&selected, frame_tx.clone())?;
        self.settings.set_camera_id(&selected.id());
        *device = selected;
        Ok(stream)
    }
}

fn stop_stream(stream: &mut Option<CameraStream>) {
    if let Some(active) = stream.take() {
        active.stop();
    }
}
