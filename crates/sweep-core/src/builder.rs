//! Graph builder: one pass over every component instance.
//!
//! # Overview
//!
//! 1. Every instance gets an empty [`DependencyRecord`](crate::edge::DependencyRecord)
//!    before any rule runs, so rules may add edges into records of instances
//!    they have not been visited yet.
//! 2. For each instance (ascending id), the implicit owns-transform edge is
//!    added, then the instance's rule (or the fallback) runs.
//! 3. A rule error is caught and recorded; edges emitted before it stay.
//!
//! The result is the complete [`EdgeSet`] plus a [`BuildReport`].

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::instrument;

use crate::adapters::{ClipCache, ClipSignals, SceneClips, SceneSkins, SkinBones};
use crate::config::AnalysisConfig;
use crate::edge::{Dependency, EdgeSet, EdgeTags};
use crate::model::{ComponentId, Kind, Scene};
use crate::rules::fallback::fallback_rule;
use crate::rules::kinds;
use crate::rules::registry::Lookup;
use crate::rules::{EdgeSink, RuleContext, RuleRegistry};

/// An extraction rule that failed for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFault {
    pub component: ComponentId,
    pub kind: Kind,
    pub message: String,
}

/// What happened during one build, besides the edges themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub faults: Vec<ExtractionFault>,
    /// Kinds that had no rule in their lineage and went through the fallback.
    pub unknown_kinds: BTreeSet<Kind>,
    /// Edges dropped because an endpoint was outside the scene.
    pub dropped_edges: usize,
}

/// Output of [`GraphBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuiltEdges {
    pub edges: EdgeSet,
    pub report: BuildReport,
}

/// Runs the registry's rules over a scene.
///
/// Skin and clip queries default to the snapshot-backed adapters; hosts
/// with their own mesh or animation subsystems plug them in with
/// [`with_skins`](Self::with_skins) and [`with_clips`](Self::with_clips).
pub struct GraphBuilder<'a> {
    registry: &'a RuleRegistry,
    config: &'a AnalysisConfig,
    skins: &'a dyn SkinBones,
    clips: Option<&'a dyn ClipSignals>,
}

impl<'a> GraphBuilder<'a> {
    #[must_use]
    pub const fn new(registry: &'a RuleRegistry, config: &'a AnalysisConfig) -> Self {
        Self {
            registry,
            config,
            skins: &SceneSkins,
            clips: None,
        }
    }

    #[must_use]
    pub const fn with_skins(mut self, skins: &'a dyn SkinBones) -> Self {
        self.skins = skins;
        self
    }

    #[must_use]
    pub const fn with_clips(mut self, clips: &'a dyn ClipSignals) -> Self {
        self.clips = Some(clips);
        self
    }

    /// Extract every edge of `scene`.
    ///
    /// Never fails: unknown kinds fall back, rule errors are recorded in the
    /// report, dangling references are dropped.
    #[instrument(skip_all, fields(components = scene.component_count()))]
    pub fn build(&self, scene: &Scene) -> BuiltEdges {
        let scene_clips = SceneClips::new(scene);
        let clips: &dyn ClipSignals = match self.clips {
            Some(clips) => clips,
            None => &scene_clips,
        };
        let cache = ClipCache::new(clips);
        let cx = RuleContext::new(scene, self.config, self.skins, &cache);

        let mut edges = EdgeSet::new();
        for instance in scene.components() {
            edges.insert_component(instance.id, instance.kind.clone(), instance.enabled);
        }

        let mut report = BuildReport::default();
        for instance in scene.components() {
            let mut sink = EdgeSink::new(instance.id, &mut edges);

            if instance.kind != kinds::TRANSFORM {
                sink.depend_on(
                    scene.transform_of(instance.node),
                    Dependency::always().tagged(EdgeTags::OWNS_TRANSFORM),
                );
            }

            let result = match self.registry.lookup(&instance.kind, scene) {
                Lookup::Rule { rule, via } => {
                    if via != &instance.kind {
                        tracing::trace!(kind = %instance.kind, %via, "using inherited rule");
                    }
                    rule(&cx, instance, &mut sink)
                }
                Lookup::Unknown { describer } => {
                    let first_seen = report.unknown_kinds.insert(instance.kind.clone());
                    if first_seen && self.config.warn_unknown_kinds {
                        tracing::warn!(
                            kind = %instance.kind,
                            "no rule for component kind; keeping it and everything it references"
                        );
                    }
                    fallback_rule(&cx, instance, &mut sink, describer)
                }
            };

            if let Err(error) = result {
                tracing::warn!(
                    component = %instance.id,
                    kind = %instance.kind,
                    error = %error,
                    "edge extraction failed; keeping edges emitted so far"
                );
                report.faults.push(ExtractionFault {
                    component: instance.id,
                    kind: instance.kind.clone(),
                    message: error.to_string(),
                });
            }
        }

        report.dropped_edges = edges.dropped_edges();
        tracing::debug!(
            edges = edges.edge_count(),
            entry_points = edges.entry_points().count(),
            faults = report.faults.len(),
            unknown_kinds = report.unknown_kinds.len(),
            dropped = report.dropped_edges,
            clip_queries = cache.len(),
            "built dependency edges"
        );

        BuiltEdges { edges, report }
    }
}
