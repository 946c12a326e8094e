//! The story manifest: one YAML document describing a whole experience.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stillframe_sequencer::application::triggers::{TriggerBoard, TriggerDefinition};
use stillframe_sequencer::domain::config::StageConfig;
use stillframe_sequencer::domain::definition::StoryDefinition;
use stillframe_sequencer::domain::graph::StoryGraph;

use super::audio::{AudioCatalog, ClipDefinition};
use super::error::ContentError;

/// The authored form of a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoryManifest {
    /// Timing and effect parameters.
    #[serde(default)]
    pub stage: StageConfig,
    /// Scenes and frames.
    pub story: StoryDefinition,
    /// Interaction triggers by name.
    #[serde(default)]
    pub triggers: BTreeMap<String, TriggerDefinition>,
    /// Audio clips.
    #[serde(default)]
    pub audio: Vec<ClipDefinition>,
}

impl StoryManifest {
    /// Parses a manifest from YAML.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Parse` if the YAML is malformed or does not
    /// match the manifest shape.
    pub fn parse(source: &str) -> Result<Self, ContentError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Validates the manifest and resolves it into its runtime form.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Invalid` naming the first problem found.
    pub fn compile(&self) -> Result<CompiledStory, ContentError> {
        self.stage.validate()?;
        let graph = StoryGraph::build(&self.story)?;
        let triggers = TriggerBoard::build(&self.triggers, &graph)?;
        let audio = AudioCatalog::build(&self.audio)?;
        Ok(CompiledStory {
            stage: self.stage.clone(),
            graph,
            triggers,
            audio,
        })
    }
}

/// A validated story, ready to be staged.
#[derive(Debug)]
pub struct CompiledStory {
    /// Timing and effect parameters.
    pub stage: StageConfig,
    /// Scenes and frames.
    pub graph: StoryGraph,
    /// Interaction triggers.
    pub triggers: TriggerBoard,
    /// Audio clips.
    pub audio: AudioCatalog,
}

/// Hex SHA-256 of the manifest source.
#[must_use]
pub fn fingerprint(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    format!("{digest:x}")
}
