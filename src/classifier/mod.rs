mod ort;
mod preprocess;

pub use self::ort::OrtEngine;
pub use self::preprocess::{IMG_SIZE, preprocess_frame};

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ndarray::Array4;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Seam between the capture loop and the model runtime. The loop only ever
/// sees `classify`; tests substitute a scripted engine.
pub trait EmotionEngine: Send + 'static {
    fn classify(&mut self, input: Array4<f32>) -> Result<Prediction>;
}

/// Loads the label vocabulary. The resource is either an ordered JSON array
/// or a sparse index→name object; holes in a sparse map become empty
/// strings so indices keep lining up with the model outputs.
pub fn load_label_map(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read label map {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("label map {} is not valid JSON", path.display()))?;
    parse_label_map(&value)
}

fn parse_label_map(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("label map array contains a non-string entry"))
            })
            .collect(),
        Value::Object(map) => {
            let mut indexed = Vec::with_capacity(map.len());
            for (key, name) in map {
                let index: usize = key
                    .parse()
                    .with_context(|| format!("label map key {key:?} is not an index"))?;
                let name = name
                    .as_str()
                    .ok_or_else(|| anyhow!("label map entry {key:?} is not a string"))?;
                indexed.push((index, name.to_string()));
            }
            let max = indexed
                .iter()
                .map(|(index, _)| *index)
                .max()
                .ok_or_else(|| anyhow!("label map is empty"))?;
            let mut labels = vec![String::new(); max + 1];
            for (index, name) in indexed {
                labels[index] = name;
            }
            Ok(labels)
        }
        _ => Err(anyhow!("label map must be an array or an index→name object")),
    }
}

/// Numerically stable softmax: subtract the max logit before exponentiating.
pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&v| v / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn softmax_sums_to_one_and_survives_large_logits() {
        let probs = softmax(&[1000.0, 1001.0, 999.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[1] > probs[0] && probs[0] > probs[2]);
    }

    #[test]
    fn label_map_accepts_ordered_array() {
        let labels = parse_label_map(&json!(["angry", "fear", "happy"])).unwrap();
        assert_eq!(labels, vec!["angry", "fear", "happy"]);
    }

    #[test]
    fn label_map_accepts_sparse_object() {
        let labels = parse_label_map(&json!({"0": "angry", "2": "happy", "4": "sad"})).unwrap();
        assert_eq!(labels, vec!["angry", "", "happy", "", "sad"]);
    }

    #[test]
    fn label_map_rejects_other_shapes() {
        assert!(parse_label_map(&json!("angry")).is_err());
        assert!(parse_label_map(&json!({"zero": "angry"})).is_err());
    }
}
