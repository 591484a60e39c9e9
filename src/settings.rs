use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct KioskSettings {
    /// Persisted capture-device key (`emotion_cam_id` in the original).
    emotion_cam_id: Option<String>,
}

/// JSON-backed settings store. Reads once at startup; every update is
/// written through so the selection survives a power cycle of the kiosk.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<KioskSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            KioskSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn camera_id(&self) -> Option<String> {
        self.data.read().unwrap().emotion_cam_id.clone()
    }

    pub fn set_camera_id(&self, id: &str) {
        let mut guard = self.data.write().unwrap();
        guard.emotion_cam_id = Some(id.to_string());
        if let Err(err) = self.persist(&guard) {
            log::warn!("failed to persist camera selection: {err:?}");
        }
    }

    fn persist(&self, data: &KioskSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write settings to {}", self.path.display()))
    }
}
