use std::path::PathBuf;

use crate::error::CaptureError;

/// Closed label→file mapping. Anything outside this table is an unmapped
/// label: the screen shows a message and re-enables retry instead of
/// crashing.
const EMOTION_TO_ANIM: [(&str, &str); 6] = [
    ("happy", "happy.mp4"),
    ("sad", "sad.mp4"),
    ("angry", "angry.mp4"),
    ("fear", "fear.mp4"),
    ("surprise", "surprise.mp4"),
    ("neutral", "neutral.mp4"),
];

pub struct AnimationLibrary {
    dir: PathBuf,
}

impl AnimationLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn resolve(&self, label: &str) -> Result<PathBuf, CaptureError> {
        let file = EMOTION_TO_ANIM
            .iter()
            .find(|(emotion, _)| *emotion == label)
            .map(|(_, file)| *file)
            .ok_or_else(|| CaptureError::UnmappedLabel(label.to_string()))?;
        Ok(self.dir.join(file))
    }
}
