//! The resolved story: every scene and frame, linked by index.

use std::collections::HashMap;

use stillframe_core::effects::NodePath;
use stillframe_core::error::StageError;

use super::behavior::build_behavior;
use super::definition::{FrameDefinition, SceneDefinition, StoryDefinition};
use super::freeze_frame::{FrameLayers, FrameSettings, FreezeFrame};
use super::ids::{FrameId, SceneId};
use super::scene::{Scene, SceneSettings};

/// Every scene and frame of a story, validated and linked.
#[derive(Debug)]
pub struct StoryGraph {
    frames: Vec<FreezeFrame>,
    scenes: Vec<Scene>,
    frame_index: HashMap<String, FrameId>,
    scene_index: HashMap<String, SceneId>,
    initial_scene: SceneId,
}

impl StoryGraph {
    /// Resolves and validates a story definition.
    ///
    /// # Errors
    ///
    /// Returns `StageError::Validation` naming the first problem found: no
    /// scenes, an empty scene, a duplicate or malformed name, a start frame
    /// or auto-progress target outside its scene, an auto-progress cycle
    /// that never waits, or an unknown initial or successor scene.
    pub fn build(definition: &StoryDefinition) -> Result<Self, StageError> {
        if definition.scenes.is_empty() {
            return Err(invalid("story has no scenes"));
        }

        let mut scene_index = HashMap::new();
        let mut frame_index = HashMap::new();
        let mut next_frame = 0;
        for (position, scene) in definition.scenes.iter().enumerate() {
            check_name("scene", &scene.name)?;
            if scene_index
                .insert(scene.name.clone(), SceneId(position))
                .is_some()
            {
                return Err(invalid(format!("duplicate scene name {}", scene.name)));
            }
            if scene.frames.is_empty() {
                return Err(invalid(format!("scene {} has no frames", scene.name)));
            }
            for frame in &scene.frames {
                check_name("frame", &frame.name)?;
                if frame_index
                    .insert(frame.name.clone(), FrameId(next_frame))
                    .is_some()
                {
                    return Err(invalid(format!("duplicate frame name {}", frame.name)));
                }
                next_frame += 1;
            }
        }

        let initial_scene = *scene_index.get(&definition.initial_scene).ok_or_else(|| {
            invalid(format!(
                "initial scene {} does not exist",
                definition.initial_scene
            ))
        })?;

        let mut frames = Vec::with_capacity(next_frame);
        let mut scenes = Vec::with_capacity(definition.scenes.len());
        for (position, scene) in definition.scenes.iter().enumerate() {
            let scene_id = SceneId(position);
            let members: Vec<FrameId> = scene
                .frames
                .iter()
                .map(|frame| frame_index[&frame.name])
                .collect();
            let start_frame = resolve_start_frame(scene, &frame_index, &members)?;

            for frame in &scene.frames {
                let settings = resolve_frame(
                    frame,
                    scene,
                    scene_id,
                    start_frame,
                    &frame_index,
                    &members,
                )?;
                frames.push(FreezeFrame::new(frame_index[&frame.name], settings));
            }

            let next_scene = scene
                .next_scene
                .as_ref()
                .map(|next| {
                    scene_index.get(next).copied().ok_or_else(|| {
                        invalid(format!(
                            "scene {} continues to unknown scene {next}",
                            scene.name
                        ))
                    })
                })
                .transpose()?;

            scenes.push(Scene::new(
                scene_id,
                SceneSettings {
                    name: scene.name.clone(),
                    start_frame,
                    frames: members,
                    next_scene,
                    music: scene.music.clone(),
                },
            ));
        }

        check_auto_progress_cycles(&frames)?;

        Ok(Self {
            frames,
            scenes,
            frame_index,
            scene_index,
            initial_scene,
        })
    }

    /// Looks a frame up by name.
    #[must_use]
    pub fn frame_id(&self, name: &str) -> Option<FrameId> {
        self.frame_index.get(name).copied()
    }

    /// Looks a scene up by name.
    #[must_use]
    pub fn scene_id(&self, name: &str) -> Option<SceneId> {
        self.scene_index.get(name).copied()
    }

    /// The frame at `id`.
    #[must_use]
    pub fn frame(&self, id: FrameId) -> &FreezeFrame {
        &self.frames[id.0]
    }

    /// The scene at `id`.
    #[must_use]
    pub fn scene(&self, id: SceneId) -> &Scene {
        &self.scenes[id.0]
    }

    /// Every frame, in definition order.
    #[must_use]
    pub fn frames(&self) -> &[FreezeFrame] {
        &self.frames
    }

    /// Every scene, in definition order.
    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Scene enabled at startup.
    #[must_use]
    pub fn initial_scene(&self) -> SceneId {
        self.initial_scene
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> &mut FreezeFrame {
        &mut self.frames[id.0]
    }

    pub(crate) fn frames_mut(&mut self) -> &mut [FreezeFrame] {
        &mut self.frames
    }

    /// A scene together with its start frame, borrowed at once.
    pub(crate) fn scene_and_start_frame(
        &mut self,
        id: SceneId,
    ) -> (&mut Scene, &mut FreezeFrame) {
        let scene = &mut self.scenes[id.0];
        let start = scene.start_frame();
        (scene, &mut self.frames[start.0])
    }

    pub(crate) fn scene_mut(&mut self, id: SceneId) -> &mut Scene {
        &mut self.scenes[id.0]
    }

    pub(crate) fn scenes_mut(&mut self) -> &mut [Scene] {
        &mut self.scenes
    }
}

fn invalid(message: impl Into<String>) -> StageError {
    StageError::Validation(message.into())
}

fn check_name(kind: &str, name: &str) -> Result<(), StageError> {
    if name.is_empty() || name.contains('/') {
        return Err(invalid(format!(
            "{kind} name {name:?} must be non-empty and contain no '/'"
        )));
    }
    Ok(())
}

/// Rejects auto-progress chains that loop back on themselves with no delay
/// anywhere along the loop; those would keep switching frames at one instant.
fn check_auto_progress_cycles(frames: &[FreezeFrame]) -> Result<(), StageError> {
    let next = |frame: &FreezeFrame| {
        frame
            .auto_progress_target()
            .filter(|_| !frame.is_end_frame() && frame.auto_progress_delay().is_zero())
    };
    for origin in frames {
        let mut visited = vec![origin.id()];
        let mut current = origin;
        while let Some(target) = next(current) {
            if target == origin.id() {
                let names: Vec<&str> = visited.iter().map(|id| frames[id.0].name()).collect();
                return Err(invalid(format!(
                    "auto-progress cycle {} -> {} never waits",
                    names.join(" -> "),
                    origin.name()
                )));
            }
            if visited.contains(&target) {
                break;
            }
            visited.push(target);
            current = &frames[target.0];
        }
    }
    Ok(())
}

fn resolve_start_frame(
    scene: &SceneDefinition,
    frame_index: &HashMap<String, FrameId>,
    members: &[FrameId],
) -> Result<FrameId, StageError> {
    frame_index
        .get(&scene.start_frame)
        .copied()
        .filter(|id| members.contains(id))
        .ok_or_else(|| {
            invalid(format!(
                "start frame {} is not a frame of scene {}",
                scene.start_frame, scene.name
            ))
        })
}

fn resolve_frame(
    frame: &FrameDefinition,
    scene: &SceneDefinition,
    scene_id: SceneId,
    start_frame: FrameId,
    frame_index: &HashMap<String, FrameId>,
    members: &[FrameId],
) -> Result<FrameSettings, StageError> {
    let id = frame_index[&frame.name];
    let auto_progress_target = match &frame.auto_progress_to {
        None => None,
        Some(target) => {
            let target_id = frame_index
                .get(target)
                .copied()
                .filter(|target_id| members.contains(target_id))
                .ok_or_else(|| {
                    invalid(format!(
                        "frame {} auto-progresses to {target}, which is not in scene {}",
                        frame.name, scene.name
                    ))
                })?;
            if target_id == id {
                return Err(invalid(format!(
                    "frame {} auto-progresses to itself",
                    frame.name
                )));
            }
            Some(target_id)
        }
    };

    let root = NodePath::new(scene.name.clone()).child(&frame.name);
    Ok(FrameSettings {
        name: frame.name.clone(),
        scene: scene_id,
        layers: FrameLayers::under(root),
        is_start_frame: id == start_frame,
        is_end_frame: frame.end_frame,
        auto_progress_target,
        auto_progress_delay: frame.auto_progress_delay,
        own_fade_duration: frame.own_fade,
        point_of_interest: frame.point_of_interest.clone(),
        cue_delay: frame.cue_delay,
        behaviors: frame.behaviors.iter().map(build_behavior).collect(),
    })
}
