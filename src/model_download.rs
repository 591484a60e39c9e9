use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};

/// Environment override for fetching a missing model artifact.
const MODEL_URL_ENV: &str = "EMOTION_MODEL_URL";

pub fn default_model_path() -> PathBuf {
    PathBuf::from("models/fer2013_mb2.onnx")
}

pub fn default_labels_path() -> PathBuf {
    PathBuf::from("models/fer2013_labels.json")
}

pub fn default_animations_dir() -> PathBuf {
    PathBuf::from("animations")
}

pub fn default_settings_path() -> PathBuf {
    PathBuf::from("emotion-curtain.settings.json")
}

/// Ensures the classifier artifact exists locally, downloading it when a
/// source URL is configured. The kiosk normally ships with the model on
/// disk; the download path exists for fresh installs.
pub fn ensure_model_available(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    let url = std::env::var(MODEL_URL_ENV).map_err(|_| {
        anyhow!(
            "model file {} not found and {MODEL_URL_ENV} is not set",
            path.display()
        )
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create model directory {}", parent.display()))?;
    }

    download_with_progress(&url, path)
}

fn download_with_progress(url: &str, dest: &Path) -> Result<()> {
    log::info!("downloading model from {url} to {}", dest.display());

    let response = reqwest::blocking::get(url)
        .with_context(|| format!("failed to request {url}"))?
        .error_for_status()
        .with_context(|| format!("server rejected the model download from {url}"))?;

    let bar = match response.content_length() {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
                )?
                .progress_chars("=> "),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    };
    bar.set_message("modelo");

    // Write to a sibling temp file first so a torn download never leaves a
    // half-written artifact at the real path.
    let tmp = dest.with_extension("part");
    let mut file = fs::File::create(&tmp)
        .with_context(|| format!("failed to create {}", tmp.display()))?;
    io::copy(&mut bar.wrap_read(response), &mut file)
        .with_context(|| format!("failed while downloading {url}"))?;
    drop(file);
    fs::rename(&tmp, dest)
        .with_context(|| format!("failed to move the model into {}", dest.display()))?;

    bar.finish_and_clear();
    log::info!("model stored at {}", dest.display());
    Ok(())
}
