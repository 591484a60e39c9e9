#[allow(dead_code)]
#[path = "../src/classifier/mod.rs"]
mod classifier;
#[allow(dead_code)]
#[path = "../src/decision.rs"]
mod decision;
#[allow(dead_code)]
#[path = "../src/error.rs"]
mod error;
#[allow(dead_code)]
#[path = "../src/model_download.rs"]
mod model_download;
#[allow(dead_code)]
#[path = "../src/types.rs"]
mod types;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use classifier::{EmotionEngine, OrtEngine, load_label_map, preprocess_frame};
use decision::decide;
use model_download::{default_labels_path, default_model_path, ensure_model_available};
use types::{Frame, FrameSample};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let mut image_paths: Vec<PathBuf> = args.by_ref().map(PathBuf::from).collect();
    if image_paths.is_empty() {
        image_paths = demo_images()?;
    }

    if image_paths.is_empty() {
        anyhow::bail!("no hay imágenes de prueba; pasa rutas o llena el directorio demo/");
    }

    let model_path = default_model_path();
    ensure_model_available(&model_path)?;
    let labels = load_label_map(&default_labels_path())?;
    let mut engine = OrtEngine::new(&model_path, labels)?;

    println!(
        "clasificando {} imágenes con {}",
        image_paths.len(),
        model_path.display()
    );

    let mut samples = Vec::new();
    for path in image_paths {
        let frame = load_frame(&path)?;
        let input = preprocess_frame(&frame)?;
        let prediction = engine
            .classify(input)
            .with_context(|| format!("no pude clasificar {}", path.display()))?;

        println!(
            "{} -> {} ({:.0}%)",
            path.display(),
            prediction.label,
            prediction.confidence * 100.0
        );

        samples.push(FrameSample {
            timestamp: Instant::now(),
            label: prediction.label,
            confidence: prediction.confidence,
        });
    }

    if samples.len() > 1 {
        if let Some(result) = decide(&samples) {
            println!("voto agregado sobre el conjunto: {}", result.display_text());
        }
    }

    Ok(())
}

fn load_frame(path: &PathBuf) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("no pude abrir la imagen {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    let rgba = image.into_raw();

    Ok(Frame {
        rgba,
        width,
        height,
        timestamp: Instant::now(),
    })
}

fn demo_images() -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir("demo").context("no pude leer el directorio demo")? {
        let entry = entry?;
        let path = entry.path();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if ["png", "jpg", "jpeg"]
                .iter()
                .any(|v| ext.eq_ignore_ascii_case(v))
            {
                images.push(path);
            }
        }
    }
    images.sort();
    Ok(images)
}
