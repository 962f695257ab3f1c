//! Query interfaces extraction rules call into.
//!
//! The engine does not parse meshes or animation curves itself. It asks:
//!
//! - [`SkinBones`]: which placement nodes a skinned surface binds to.
//! - [`ClipSignals`]: whether a clip animates a property with a value that
//!   changes over time.
//!
//! Both must be side-effect free. Snapshot-backed defaults ([`SceneSkins`],
//! [`SceneClips`]) read the same information out of a [`Scene`]. Hosts with
//! richer subsystems implement the traits themselves.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::ExtractError;
use crate::model::{ClipId, ComponentInstance, FieldAccess, NodeId, Scene};

/// Skin → bone enumeration, owned by the mesh subsystem.
pub trait SkinBones {
    /// Bones the skin's mesh is bound to. Order is irrelevant.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractError`] if the skin's data cannot be read.
    fn bones(&self, skin: &ComponentInstance) -> Result<Vec<NodeId>, ExtractError>;

    /// The skin's root bone, if it has one.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractError`] if the skin's data cannot be read.
    fn root_bone(&self, skin: &ComponentInstance) -> Result<Option<NodeId>, ExtractError>;
}

/// Clip time-dependence, owned by the animation-curve subsystem.
pub trait ClipSignals {
    fn is_time_varying(&self, clip: &ClipId, property: &str) -> bool;
}

/// Reads bones from the skin's own `bones` and `root_bone` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneSkins;

impl SkinBones for SceneSkins {
    fn bones(&self, skin: &ComponentInstance) -> Result<Vec<NodeId>, ExtractError> {
        Ok(skin.node_list("bones")?)
    }

    fn root_bone(&self, skin: &ComponentInstance) -> Result<Option<NodeId>, ExtractError> {
        Ok(skin.node_ref("root_bone")?)
    }
}

/// Reads clip summaries recorded in the scene snapshot.
///
/// A clip without a summary is treated as time-varying for every property,
/// which only ever keeps more components alive.
#[derive(Debug, Clone, Copy)]
pub struct SceneClips<'a> {
    scene: &'a Scene,
}

impl<'a> SceneClips<'a> {
    #[must_use]
    pub const fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }
}

impl ClipSignals for SceneClips<'_> {
    fn is_time_varying(&self, clip: &ClipId, property: &str) -> bool {
        self.scene
            .clip_summary(clip)
            .is_none_or(|props| props.contains(property))
    }
}

/// Memoizes [`ClipSignals`] answers for the duration of one analysis run.
///
/// Constructed fresh per run and dropped with it; never shared between runs.
pub struct ClipCache<'a> {
    inner: &'a dyn ClipSignals,
    answers: RefCell<HashMap<(ClipId, String), bool>>,
}

impl<'a> ClipCache<'a> {
    #[must_use]
    pub fn new(inner: &'a dyn ClipSignals) -> Self {
        Self {
            inner,
            answers: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct `(clip, property)` pairs answered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClipSignals for ClipCache<'_> {
    fn is_time_varying(&self, clip: &ClipId, property: &str) -> bool {
        let key = (clip.clone(), property.to_string());
        if let Some(answer) = self.answers.borrow().get(&key) {
            return *answer;
        }
        let answer = self.inner.is_time_varying(clip, property);
        self.answers.borrow_mut().insert(key, answer);
        answer
    }
}
