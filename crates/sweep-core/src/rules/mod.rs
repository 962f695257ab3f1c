//! Per-kind extraction rules.
//!
//! # Overview
//!
//! A rule is a plain function from `(context, instance, sink)` to nothing:
//! it reads the instance (and, through [`RuleContext`], the frozen scene and
//! the external adapters) and declares edges and markings on the
//! [`EdgeSink`]. Rules never see the graph they are building.
//!
//! ```text
//! RegistryBuilder ── rule/extends/inherits/plugin ──► RuleRegistry (immutable)
//!                                                        │ lookup(kind)
//! GraphBuilder ── per instance ──► rule(cx, instance, sink) ──► EdgeSet
//! ```
//!
//! Rules for a specialized kind run after the rule of the kind they extend
//! (see [`registry`]). Kinds without any rule go through [`fallback`].

pub mod builtin;
pub mod fallback;
pub mod kinds;
pub mod plugin;
pub mod registry;

use crate::adapters::{ClipCache, ClipSignals, SkinBones};
use crate::config::AnalysisConfig;
use crate::edge::{Dependency, EdgeSet};
use crate::error::ExtractError;
use crate::model::{ClipId, ComponentId, ComponentInstance, NodeId, Scene};

pub use plugin::{RulePlugin, SpringBonePlugin};
pub use registry::{RegistryBuilder, RuleRegistry};

/// Signature every extraction rule has.
pub type RuleFn = dyn Fn(&RuleContext<'_>, &ComponentInstance, &mut EdgeSink<'_>) -> Result<(), ExtractError>
    + Send
    + Sync;

/// A reference found in a component's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Reference {
    Component(ComponentId),
    Node(NodeId),
}

/// "Describe my reference fields" capability for kinds that have no rule.
///
/// When a describer is registered for a kind, the fallback rule uses it
/// instead of walking the instance's field tree.
pub trait DescribeReferences: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`ExtractError`] if the instance's fields are malformed.
    fn references(&self, instance: &ComponentInstance) -> Result<Vec<Reference>, ExtractError>;
}

// ---------------------------------------------------------------------------
// RuleContext
// ---------------------------------------------------------------------------

/// Read-only inputs available to a rule during one analysis run.
pub struct RuleContext<'a> {
    scene: &'a Scene,
    config: &'a AnalysisConfig,
    skins: &'a dyn SkinBones,
    clips: &'a ClipCache<'a>,
}

impl<'a> RuleContext<'a> {
    #[must_use]
    pub const fn new(
        scene: &'a Scene,
        config: &'a AnalysisConfig,
        skins: &'a dyn SkinBones,
        clips: &'a ClipCache<'a>,
    ) -> Self {
        Self {
            scene,
            config,
            skins,
            clips,
        }
    }

    #[must_use]
    pub const fn scene(&self) -> &'a Scene {
        self.scene
    }

    #[must_use]
    pub const fn config(&self) -> &'a AnalysisConfig {
        self.config
    }

    #[must_use]
    pub const fn skins(&self) -> &'a dyn SkinBones {
        self.skins
    }

    #[must_use]
    pub fn is_time_varying(&self, clip: &ClipId, property: &str) -> bool {
        self.clips.is_time_varying(clip, property)
    }

    /// Transform component of `node`, or `None` for unknown nodes.
    #[must_use]
    pub fn transform_of(&self, node: NodeId) -> Option<ComponentId> {
        self.scene.transform_of(node)
    }
}

// ---------------------------------------------------------------------------
// EdgeSink
// ---------------------------------------------------------------------------

/// Where a rule declares edges and markings.
///
/// Edges may originate at the instance being processed
/// ([`depend_on`](Self::depend_on)) or at any other instance
/// ([`add_edge`](Self::add_edge)), which lets a rule inject a dependency into
/// another component's record. Null targets are ignored; edges naming
/// components outside the scene are dropped by the [`EdgeSet`].
pub struct EdgeSink<'a> {
    current: ComponentId,
    edges: &'a mut EdgeSet,
}

impl<'a> EdgeSink<'a> {
    pub fn new(current: ComponentId, edges: &'a mut EdgeSet) -> Self {
        Self { current, edges }
    }

    /// The instance this sink is recording for.
    #[must_use]
    pub const fn current(&self) -> ComponentId {
        self.current
    }

    /// Declare `current → target`.
    pub fn depend_on(&mut self, target: impl Into<Option<ComponentId>>, dependency: Dependency) {
        let current = self.current;
        self.add_edge(current, target, dependency);
    }

    /// Declare `dependent → target` on behalf of another instance.
    pub fn add_edge(
        &mut self,
        dependent: impl Into<Option<ComponentId>>,
        target: impl Into<Option<ComponentId>>,
        dependency: Dependency,
    ) {
        let (Some(dependent), Some(target)) = (dependent.into(), target.into()) else {
            return;
        };
        if !self.edges.add_edge(dependent, target, dependency) {
            tracing::trace!(%dependent, %target, "dropped edge to component outside the scene");
        }
    }

    pub fn mark_entry_point(&mut self) {
        self.edges.mark_entry_point(self.current);
    }

    /// Mark `target` as possibly enabled at runtime regardless of its static
    /// enabled flag.
    pub fn mark_activatable(&mut self, target: ComponentId) {
        self.edges.mark_activatable(target);
    }
}
