//! A scene: a container of freeze frames that is enabled as a whole.

use stillframe_core::effects::NodePath;
use tracing::info;

use super::context::StageContext;
use super::events::StageEventKind;
use super::freeze_frame::FreezeFrame;
use super::ids::{FrameId, SceneId};

/// Everything the graph builder resolves for a scene.
#[derive(Debug)]
pub(crate) struct SceneSettings {
    pub(crate) name: String,
    pub(crate) start_frame: FrameId,
    pub(crate) frames: Vec<FrameId>,
    pub(crate) next_scene: Option<SceneId>,
    pub(crate) music: Option<String>,
}

/// A scene.
///
/// Scenes only toggle themselves; keeping exactly one of them enabled is
/// the orchestrator's job.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    settings: SceneSettings,
    root: NodePath,
    container: NodePath,
    enabled: bool,
}

impl Scene {
    pub(crate) fn new(id: SceneId, settings: SceneSettings) -> Self {
        let root = NodePath::new(settings.name.clone());
        Self {
            id,
            container: root.child("container"),
            root,
            settings,
            enabled: false,
        }
    }

    /// Index of the scene.
    #[must_use]
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Unique scene name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Frame shown on entry.
    #[must_use]
    pub fn start_frame(&self) -> FrameId {
        self.settings.start_frame
    }

    /// Successor scene.
    #[must_use]
    pub fn next_scene(&self) -> Option<SceneId> {
        self.settings.next_scene
    }

    /// Music track of the scene.
    #[must_use]
    pub fn music(&self) -> Option<&str> {
        self.settings.music.as_deref()
    }

    /// Whether `frame` belongs to this scene.
    #[must_use]
    pub fn contains(&self, frame: FrameId) -> bool {
        self.settings.frames.contains(&frame)
    }

    /// Frames of the scene.
    #[must_use]
    pub fn frames(&self) -> &[FrameId] {
        &self.settings.frames
    }

    /// Root render node.
    #[must_use]
    pub fn root(&self) -> &NodePath {
        &self.root
    }

    /// Whether the scene is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Activates the scene and starts its start frame's progression.
    ///
    /// `start_frame` must be the frame returned by [`Scene::start_frame`].
    pub(crate) fn enable(&mut self, start_frame: &mut FreezeFrame, ctx: &mut StageContext) {
        debug_assert_eq!(start_frame.id(), self.settings.start_frame);
        let render = &ctx.effects().render;
        render.set_active(&self.root, true);
        render.set_active(&self.container, true);
        self.enabled = true;
        info!(scene = %self.settings.name, frame = start_frame.name(), "scene enabled");
        ctx.emit(StageEventKind::SceneEntered {
            scene: self.settings.name.clone(),
            frame: start_frame.name().to_owned(),
        });
        start_frame.begin_progression(ctx);
    }

    /// Deactivates the scene.
    pub(crate) fn disable(&mut self, ctx: &StageContext) {
        ctx.effects().render.set_active(&self.root, false);
        self.enabled = false;
    }

    /// A switch away from (or into) this scene began.
    pub(crate) fn on_switch_triggered(&self, ctx: &mut StageContext) {
        ctx.emit(StageEventKind::SceneSwitchTriggered {
            scene: self.settings.name.clone(),
        });
    }

    /// A switch into this scene finished.
    pub(crate) fn on_switch_finished(&self, ctx: &mut StageContext) {
        ctx.emit(StageEventKind::SceneSwitchFinished {
            scene: self.settings.name.clone(),
        });
    }
}
