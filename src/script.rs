// SPDX-License-Identifier: MIT

//! Scripted walks
//!
//! A script is a YAML list of steps replayed against a session:
//!
//! ```yaml
//! - answer: { selectedOption: 0 }
//! - back
//! - answer: { selectedOption: 1 }
//! - answer: { imageFiles: ["front.jpg"] }
//! - restart
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::flow::{CapturedImage, RawAnswer};
use crate::session::{SessionError, WorkflowSession};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Step {index} failed: {source}")]
    Step {
        index: usize,
        source: SessionError,
    },
}

/// Answer step; `imageFiles` are read relative to the script
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptAnswer {
    #[serde(flatten)]
    pub raw: RawAnswer,
    #[serde(default)]
    pub image_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Answer(ScriptAnswer),
    Back,
    Restart,
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
    base_dir: PathBuf,
}

impl Script {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut script = Self::parse_yaml(&content)?;
        script.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(script)
    }

    pub fn parse_yaml(content: &str) -> Result<Self, ScriptError> {
        // Steps are written as `- back` or `- answer: {..}`, not YAML tags
        let steps: Vec<ScriptStep> = serde_yaml::with::singleton_map_recursive::deserialize(
            serde_yaml::Deserializer::from_str(content),
        )?;
        Ok(Self {
            steps,
            base_dir: PathBuf::new(),
        })
    }

    /// Replay every step, stopping at the first rejected one
    pub async fn run(&self, session: &mut WorkflowSession) -> Result<(), ScriptError> {
        for (index, step) in self.steps.iter().enumerate() {
            log::debug!("Script step {}: {:?}", index, step);
            let result = match step {
                ScriptStep::Answer(answer) => {
                    let raw = self.resolve_answer(answer)?;
                    session.advance(raw).map(|_| ())
                }
                ScriptStep::Back => session.retreat().map(|_| ()),
                ScriptStep::Restart => session.restart().await,
            };
            result.map_err(|source| ScriptError::Step { index, source })?;
        }
        Ok(())
    }

    fn resolve_answer(&self, answer: &ScriptAnswer) -> Result<RawAnswer, ScriptError> {
        let mut raw = answer.raw.clone();
        for file in &answer.image_files {
            let path = self.base_dir.join(file);
            let data = fs::read(&path).map_err(|source| ScriptError::Image {
                path: path.clone(),
                source,
            })?;
            let handle = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            raw.images
                .push(CapturedImage::new(handle, content_type_for(&path), data));
        }
        Ok(raw)
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
