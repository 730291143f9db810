//! Service context that selects the image generator implementation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::adapters::live::imagen::ImagenGenerator;
use crate::adapters::recording::image_generator::RecordingImageGenerator;
use crate::adapters::replaying::image_generator::ReplayingImageGenerator;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::{Config, API_KEY_ENV_VARS};
use crate::error::ImageError;
use crate::ports::ImageGenerator;

/// Directory recording sessions write into.
const CASSETTE_ROOT: &str = ".imagen-studio/cassettes";

/// Bundles the port trait objects the controller needs.
pub struct ServiceContext {
    /// Image generator port.
    pub generator: Box<dyn ImageGenerator>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Write the recorded cassette to disk.
    ///
    /// Call this after the controller (and with it the recording adapter)
    /// has been dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter is still alive or the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        if recorder.is_empty() {
            warn!("No interactions recorded; writing an empty cassette");
        } else {
            info!("Writing {} recorded interaction(s)", recorder.len());
        }
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Create a live context calling the Imagen API.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::MissingApiKey`] if no API key is configured.
    pub fn live(config: &Config) -> Result<Self, ImageError> {
        let key = config
            .api_key()
            .ok_or_else(|| ImageError::MissingApiKey { env_var: API_KEY_ENV_VARS[0].into() })?;
        Ok(Self { generator: Box::new(ImagenGenerator::new(key)) })
    }

    /// Create a recording context that wraps the live adapter with a recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if the live context cannot be created.
    pub fn recording(config: &Config) -> Result<(Self, RecordingSession), ImageError> {
        let live = Self::live(config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = PathBuf::from(CASSETTE_ROOT).join(&timestamp).join("image_generator.cassette.yaml");
        info!("Recording to {}", path.display());

        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-image_generator"),
            commit_hash(),
        )));
        let generator = RecordingImageGenerator::new(live.generator, Arc::clone(&recorder));

        Ok((Self { generator: Box::new(generator) }, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file. No API key is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path) -> Result<Self, ImageError> {
        let replayer = load_cassette(path)
            .map_err(|e| ImageError::Config(format!("Failed to load cassette: {e}")))?;
        let generator = ReplayingImageGenerator::new(Arc::new(Mutex::new(replayer)));
        Ok(Self { generator: Box::new(generator) })
    }
}

/// Current git commit hash, or "unknown" outside a repository.
fn commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaying_missing_cassette_is_config_error() {
        let result = ServiceContext::replaying(Path::new("/nonexistent/cassette.yaml"));
        assert!(matches!(result, Err(ImageError::Config(msg)) if msg.contains("Failed to load cassette")));
    }
}
