//! Registration interface for kinds the built-in catalog does not cover.

use std::collections::BTreeSet;

use crate::edge::Dependency;
use crate::error::{ExtractError, RegistryError};
use crate::model::{ComponentInstance, FieldAccess, Kind, Scene};
use crate::rules::{EdgeSink, RegistryBuilder, RuleContext};

/// A bundle of rules for third-party kinds.
pub trait RulePlugin {
    fn name(&self) -> &'static str;

    /// Kinds that must exist in the host for this plugin to apply.
    fn required_kinds(&self) -> Vec<Kind>;

    /// Add this plugin's rules to `builder`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if one of the plugin's kinds is already
    /// registered.
    fn register(&self, builder: &mut RegistryBuilder) -> Result<(), RegistryError>;
}

/// Every kind a scene's host knows about: kinds of attached components plus
/// every kind named in the snapshot's kind table.
#[must_use]
pub fn host_kinds(scene: &Scene) -> BTreeSet<Kind> {
    let mut kinds: BTreeSet<Kind> = scene.components().map(|c| c.kind.clone()).collect();
    for kind in scene.declared_kinds() {
        kinds.insert(kind.clone());
    }
    kinds
}

// ---------------------------------------------------------------------------
// SpringBonePlugin
// ---------------------------------------------------------------------------

/// Secondary-motion bone chains.
///
/// A spring bone reads `root` (node), `exclusions` (node list) and
/// `colliders` (component list). The affected transforms are the subtree
/// under `root` minus every excluded subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpringBonePlugin {
    pub kind: Kind,
    pub collider_kind: Kind,
}

impl Default for SpringBonePlugin {
    fn default() -> Self {
        Self {
            kind: Kind::from_static("SpringBone"),
            collider_kind: Kind::from_static("SpringBoneCollider"),
        }
    }
}

impl RulePlugin for SpringBonePlugin {
    fn name(&self) -> &'static str {
        "spring-bone"
    }

    fn required_kinds(&self) -> Vec<Kind> {
        vec![self.kind.clone()]
    }

    fn register(&self, builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
        builder.rule(self.kind.clone(), spring_bone_rule)?;
        builder.no_edges(self.collider_kind.clone())?;
        Ok(())
    }
}

fn spring_bone_rule(
    cx: &RuleContext<'_>,
    instance: &ComponentInstance,
    sink: &mut EdgeSink<'_>,
) -> Result<(), ExtractError> {
    let scene = cx.scene();

    if let Some(root) = instance.node_ref("root")? {
        let excluded: BTreeSet<_> = instance
            .node_list("exclusions")?
            .into_iter()
            .flat_map(|node| scene.subtree(node))
            .collect();

        for node in scene.subtree(root) {
            if excluded.contains(&node) {
                continue;
            }
            let transform = cx.transform_of(node);
            sink.add_edge(transform, instance.id, Dependency::always().if_target_enabled());
            sink.depend_on(transform, Dependency::active());
        }
    }

    for collider in instance.component_list("colliders")? {
        sink.depend_on(collider, Dependency::active());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::config::AnalysisConfig;
    use crate::model::Value;

    #[test]
    fn spring_bone_skips_excluded_subtrees() {
        let plugin = SpringBonePlugin::default();
        let mut b = Scene::builder();
        let root = b.add_node("root", None);
        let hair = b.add_node("hair", Some(root));
        let strand = b.add_node("strand", Some(hair));
        let ribbon = b.add_node("ribbon", Some(hair));
        let bow = b.add_node("bow", Some(ribbon));
        let bone = b.add_component(root, plugin.kind.clone());
        let collider = b.add_component(root, plugin.collider_kind.clone());
        b.set_field(bone, "root", Value::node(hair));
        b.set_field(bone, "exclusions", Value::nodes([ribbon]));
        b.set_field(bone, "colliders", Value::components([collider]));
        let (ht, st, rt, bt) = (
            b.transform(hair),
            b.transform(strand),
            b.transform(ribbon),
            b.transform(bow),
        );
        let scene = b.build().expect("valid scene");

        let mut rb = RegistryBuilder::with_builtin().expect("builtin");
        rb.plugin(&plugin).expect("plugin registers");
        let registry = rb.build().expect("registry");
        let built = GraphBuilder::new(&registry, &AnalysisConfig::default()).build(&scene);
        let edges = built.edges;

        for t in [ht, st] {
            assert_eq!(
                edges.dependency(t, bone),
                Some(Dependency::always().if_target_enabled())
            );
            assert_eq!(edges.dependency(bone, t), Some(Dependency::active()));
        }
        for t in [rt, bt] {
            assert_eq!(edges.dependency(t, bone), None);
            assert_eq!(edges.dependency(bone, t), None);
        }
        assert_eq!(edges.dependency(bone, collider), Some(Dependency::active()));
        assert!(built.report.unknown_kinds.is_empty());
    }

    #[test]
    fn plugin_only_applies_when_host_has_its_kind() {
        let plugin = SpringBonePlugin::default();

        let mut b = Scene::builder();
        b.add_node("root", None);
        let bare = b.build().expect("valid scene");
        let mut rb = RegistryBuilder::with_builtin().expect("builtin");
        assert!(!rb.plugin_for_host(&plugin, &host_kinds(&bare)).expect("no error"));
        assert!(!rb.build().expect("registry").contains(&plugin.kind));

        let mut b = Scene::builder();
        b.add_node("root", None);
        b.declare_kind(plugin.kind.clone(), "MonoBehaviour");
        let declared = b.build().expect("valid scene");
        let mut rb = RegistryBuilder::with_builtin().expect("builtin");
        assert!(rb.plugin_for_host(&plugin, &host_kinds(&declared)).expect("no error"));
        assert!(rb.build().expect("registry").contains(&plugin.kind));
    }

    #[test]
    fn registering_twice_is_rejected() {
        let plugin = SpringBonePlugin::default();
        let mut rb = RegistryBuilder::new();
        rb.plugin(&plugin).expect("first registration");
        assert!(matches!(
            rb.plugin(&plugin),
            Err(RegistryError::DuplicateKind(kind)) if kind == plugin.kind
        ));
    }
}
