use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{EmotionEngine, Prediction, softmax};

/// ONNX Runtime implementation of the emotion classifier. The session is
/// built once per camera-screen activation and reused for every tick.
pub struct OrtEngine {
    session: Session,
    labels: Vec<String>,
}

impl OrtEngine {
    pub fn new(model_path: &Path, labels: Vec<String>) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("failed to load ORT session from {}", model_path.display())
            })?;

        log::info!(
            "emotion ORT backend ready using {} ({} labels)",
            model_path.display(),
            labels.len()
        );

        Ok(Self { session, labels })
    }
}

impl EmotionEngine for OrtEngine {
    fn classify(&mut self, input: Array4<f32>) -> Result<Prediction> {
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run ORT session")?;

        if outputs.len() < 1 {
            return Err(anyhow!("model returned no outputs"));
        }

        let logits = outputs[0].try_extract_array::<f32>()?;
        let logits: Vec<f32> = logits.iter().copied().collect();
        if logits.is_empty() {
            return Err(anyhow!("model returned an empty logit vector"));
        }

        let probs = softmax(&logits);
        let (best, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, p)| {
                if p > acc.1 { (i, p) } else { acc }
            });

        let label = self
            .labels
            .get(best)
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| best.to_string());

        Ok(Prediction { label, confidence })
    }
}
