//! Frozen scene snapshot: placement nodes, component instances, the host's
//! kind lineage table and animation clip summaries.
//!
//! A [`Scene`] is read-only for the duration of an analysis run. It is built
//! either programmatically through [`SceneBuilder`] or from a serialized
//! [`SceneSnapshot`]; both paths go through the same validation.
//!
//! Every placement node owns exactly one implicit transform component (kind
//! [`kinds::TRANSFORM`]); a node reference inside a field resolves to it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::model::{ClipId, ComponentId, FieldAccess, Fields, Kind, NodeId, Value};
use crate::rules::kinds;

/// One capability attached to one placement node.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInstance {
    pub id: ComponentId,
    pub kind: Kind,
    pub enabled: bool,
    /// Owning node. A relation only: the scene owns both.
    pub node: NodeId,
    pub fields: Fields,
}

impl FieldAccess for ComponentInstance {
    fn fields(&self) -> &Fields {
        &self.fields
    }
}

/// A node in the scene hierarchy carrying placement data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementNode {
    pub id: NodeId,
    pub name: String,
    pub parent: Option<NodeId>,
    /// The node's own transform component.
    pub transform: ComponentId,
    /// Non-transform components attached to this node, in id order.
    pub components: Vec<ComponentId>,
    pub children: Vec<NodeId>,
}

/// An immutable, validated scene.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: BTreeMap<NodeId, PlacementNode>,
    components: BTreeMap<ComponentId, ComponentInstance>,
    kind_bases: BTreeMap<Kind, Kind>,
    clips: BTreeMap<ClipId, BTreeSet<String>>,
}

impl Scene {
    #[must_use]
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    /// Validate and index a deserialized snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`SceneError`] for duplicate ids, unknown parents, parent
    /// cycles, or components that declare the implicit transform kind.
    pub fn from_snapshot(snapshot: SceneSnapshot) -> Result<Self, SceneError> {
        let mut nodes = BTreeMap::new();
        let mut components = BTreeMap::new();

        for node in snapshot.nodes {
            if nodes.contains_key(&node.id) {
                return Err(SceneError::DuplicateNode(node.id));
            }
            insert_component(
                &mut components,
                ComponentInstance {
                    id: node.transform,
                    kind: kinds::TRANSFORM,
                    enabled: true,
                    node: node.id,
                    fields: Fields::new(),
                },
            )?;

            let mut attached = Vec::with_capacity(node.components.len());
            for component in node.components {
                if component.kind == kinds::TRANSFORM {
                    return Err(SceneError::ExplicitTransform(component.id));
                }
                attached.push(component.id);
                insert_component(
                    &mut components,
                    ComponentInstance {
                        id: component.id,
                        kind: component.kind,
                        enabled: component.enabled,
                        node: node.id,
                        fields: component.fields,
                    },
                )?;
            }
            attached.sort_unstable();

            nodes.insert(
                node.id,
                PlacementNode {
                    id: node.id,
                    name: node.name,
                    parent: node.parent,
                    transform: node.transform,
                    components: attached,
                    children: Vec::new(),
                },
            );
        }

        link_children(&mut nodes)?;

        let clips = snapshot
            .clips
            .into_iter()
            .map(|(clip, props)| (clip, props.into_iter().collect()))
            .collect();

        Ok(Self {
            nodes,
            components,
            kind_bases: snapshot.kinds,
            clips,
        })
    }

    /// Every component instance, transforms included, in ascending id order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentInstance> {
        self.components.values()
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&ComponentInstance> {
        self.components.get(&id)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&PlacementNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PlacementNode> {
        self.nodes.values()
    }

    /// The transform component of `node`.
    #[must_use]
    pub fn transform_of(&self, node: NodeId) -> Option<ComponentId> {
        self.nodes.get(&node).map(|n| n.transform)
    }

    /// The node a transform component belongs to, or `None` if `id` is not
    /// a transform.
    #[must_use]
    pub fn node_of_transform(&self, id: ComponentId) -> Option<&PlacementNode> {
        let component = self.components.get(&id)?;
        self.nodes
            .get(&component.node)
            .filter(|node| node.transform == id)
    }

    /// Walk from `node` up to the root, starting with `node` itself.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = &PlacementNode> {
        std::iter::successors(self.nodes.get(&node), |current| {
            current.parent.and_then(|parent| self.nodes.get(&parent))
        })
    }

    /// `node` and every node below it, depth-first, children in id order.
    #[must_use]
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(entry) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(entry.children.iter().rev().copied());
        }
        out
    }

    /// First component of exactly `kind` on `node`.
    #[must_use]
    pub fn find_on_node(&self, node: NodeId, kind: &Kind) -> Option<&ComponentInstance> {
        self.nodes
            .get(&node)?
            .components
            .iter()
            .filter_map(|id| self.components.get(id))
            .find(|c| &c.kind == kind)
    }

    /// First component of exactly `kind` on `node` or its nearest ancestor
    /// that has one.
    #[must_use]
    pub fn find_in_ancestors(&self, node: NodeId, kind: &Kind) -> Option<&ComponentInstance> {
        self.ancestors(node)
            .find_map(|ancestor| self.find_on_node(ancestor.id, kind))
    }

    /// The base kind the host's type system declares for `kind`, if any.
    #[must_use]
    pub fn kind_base(&self, kind: &Kind) -> Option<&Kind> {
        self.kind_bases.get(kind)
    }

    /// Every kind named in the host's kind table, as a kind or as a base.
    pub fn declared_kinds(&self) -> impl Iterator<Item = &Kind> {
        self.kind_bases
            .iter()
            .flat_map(|(kind, base)| [kind, base])
    }

    /// Properties the animation subsystem reported as time-varying for
    /// `clip`, or `None` if the snapshot has no summary for the clip.
    #[must_use]
    pub fn clip_summary(&self, clip: &ClipId) -> Option<&BTreeSet<String>> {
        self.clips.get(clip)
    }
}

fn insert_component(
    components: &mut BTreeMap<ComponentId, ComponentInstance>,
    component: ComponentInstance,
) -> Result<(), SceneError> {
    if components.contains_key(&component.id) {
        return Err(SceneError::DuplicateComponent(component.id));
    }
    components.insert(component.id, component);
    Ok(())
}

/// Fill `children` and reject unknown parents and parent cycles.
fn link_children(nodes: &mut BTreeMap<NodeId, PlacementNode>) -> Result<(), SceneError> {
    let links: Vec<(NodeId, NodeId)> = nodes
        .values()
        .filter_map(|node| node.parent.map(|parent| (node.id, parent)))
        .collect();

    for &(child, parent) in &links {
        let Some(parent_node) = nodes.get_mut(&parent) else {
            return Err(SceneError::UnknownParent {
                node: child,
                parent,
            });
        };
        parent_node.children.push(child);
    }

    for node in nodes.values() {
        let mut seen = BTreeSet::from([node.id]);
        let mut cursor = node.parent;
        while let Some(current) = cursor {
            if !seen.insert(current) {
                return Err(SceneError::ParentCycle(node.id));
            }
            cursor = nodes.get(&current).and_then(|n| n.parent);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Serialized snapshot
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// Serialized form of a scene, as produced by the asset layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    /// Host kind lineage: kind → base kind.
    #[serde(default)]
    pub kinds: BTreeMap<Kind, Kind>,
    /// Clip summaries: clip → properties whose animated value changes over
    /// time.
    #[serde(default)]
    pub clips: BTreeMap<ClipId, Vec<String>>,
}

impl SceneSnapshot {
    /// Parse a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub parent: Option<NodeId>,
    pub transform: ComponentId,
    #[serde(default)]
    pub components: Vec<ComponentSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub id: ComponentId,
    pub kind: Kind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub fields: Fields,
}

// ---------------------------------------------------------------------------
// Programmatic builder
// ---------------------------------------------------------------------------

/// Builds a [`Scene`] with sequentially assigned ids.
///
/// ```rust,ignore
/// let mut b = Scene::builder();
/// let root = b.add_node("Armature", None);
/// let light = b.add_component(root, kinds::LIGHT);
/// let scene = b.build()?;
/// ```
#[derive(Debug, Default)]
pub struct SceneBuilder {
    snapshot: SceneSnapshot,
    next_component: u32,
}

impl SceneBuilder {
    fn next_component_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next_component);
        self.next_component += 1;
        id
    }

    /// Add a placement node and its implicit transform.
    pub fn add_node(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.snapshot.nodes.len()).unwrap_or(u32::MAX));
        let transform = self.next_component_id();
        self.snapshot.nodes.push(NodeSnapshot {
            id,
            name: name.to_string(),
            parent,
            transform,
            components: Vec::new(),
        });
        id
    }

    /// Transform id of a node added through this builder.
    #[must_use]
    pub fn transform(&self, node: NodeId) -> ComponentId {
        self.node_entry(node).map_or(ComponentId(u32::MAX), |n| n.transform)
    }

    /// Attach an enabled component without fields.
    pub fn add_component(&mut self, node: NodeId, kind: impl Into<Kind>) -> ComponentId {
        let id = self.next_component_id();
        if let Some(entry) = self.node_entry_mut(node) {
            entry.components.push(ComponentSnapshot {
                id,
                kind: kind.into(),
                enabled: true,
                fields: Fields::new(),
            });
        }
        id
    }

    pub fn set_enabled(&mut self, id: ComponentId, enabled: bool) -> &mut Self {
        if let Some(component) = self.component_entry_mut(id) {
            component.enabled = enabled;
        }
        self
    }

    pub fn set_field(&mut self, id: ComponentId, name: &str, value: Value) -> &mut Self {
        if let Some(component) = self.component_entry_mut(id) {
            component.fields.insert(name.to_string(), value);
        }
        self
    }

    /// Declare a host kind lineage entry (`kind` is a specialization of `base`).
    pub fn declare_kind(&mut self, kind: impl Into<Kind>, base: impl Into<Kind>) -> &mut Self {
        self.snapshot.kinds.insert(kind.into(), base.into());
        self
    }

    /// Record which properties of `clip` are animated with time-varying values.
    pub fn add_clip(&mut self, clip: &str, time_varying: &[&str]) -> &mut Self {
        self.snapshot.clips.insert(
            ClipId::new(clip),
            time_varying.iter().map(|p| (*p).to_string()).collect(),
        );
        self
    }

    /// Validate and freeze the scene.
    ///
    /// # Errors
    ///
    /// See [`Scene::from_snapshot`].
    pub fn build(self) -> Result<Scene, SceneError> {
        Scene::from_snapshot(self.snapshot)
    }

    fn node_entry(&self, node: NodeId) -> Option<&NodeSnapshot> {
        self.snapshot.nodes.iter().find(|n| n.id == node)
    }

    fn node_entry_mut(&mut self, node: NodeId) -> Option<&mut NodeSnapshot> {
        self.snapshot.nodes.iter_mut().find(|n| n.id == node)
    }

    fn component_entry_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSnapshot> {
        self.snapshot
            .nodes
            .iter_mut()
            .flat_map(|n| n.components.iter_mut())
            .find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_scene() -> (Scene, NodeId, NodeId, NodeId) {
        let mut b = Scene::builder();
        let root = b.add_node("Root", None);
        let hips = b.add_node("Hips", Some(root));
        let spine = b.add_node("Spine", Some(hips));
        b.add_component(root, kinds::RIGIDBODY);
        b.add_component(spine, kinds::BOX_COLLIDER);
        (b.build().expect("valid scene"), root, hips, spine)
    }

    #[test]
    fn builder_creates_transform_per_node() {
        let (scene, root, hips, _) = small_scene();
        let t_root = scene.transform_of(root).unwrap();
        let t_hips = scene.transform_of(hips).unwrap();
        assert_ne!(t_root, t_hips);
        assert_eq!(scene.component(t_root).unwrap().kind, kinds::TRANSFORM);
        assert_eq!(scene.node_of_transform(t_hips).unwrap().id, hips);
        assert_eq!(scene.component_count(), 5);
    }

    #[test]
    fn ancestors_start_at_self() {
        let (scene, root, hips, spine) = small_scene();
        let chain: Vec<NodeId> = scene.ancestors(spine).map(|n| n.id).collect();
        assert_eq!(chain, vec![spine, hips, root]);
        assert_eq!(scene.subtree(hips), vec![hips, spine]);
    }

    #[test]
    fn find_in_ancestors_reaches_up() {
        let (scene, root, _, spine) = small_scene();
        let body = scene.find_in_ancestors(spine, &kinds::RIGIDBODY).unwrap();
        assert_eq!(body.node, root);
        assert!(scene.find_on_node(spine, &kinds::RIGIDBODY).is_none());
    }

    #[test]
    fn duplicate_component_ids_are_rejected() {
        let snapshot: SceneSnapshot = serde_json::from_str(
            r#"{"nodes":[
                {"id":0,"name":"a","transform":1},
                {"id":1,"name":"b","transform":1}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            Scene::from_snapshot(snapshot).unwrap_err(),
            SceneError::DuplicateComponent(ComponentId(1))
        );
    }

    #[test]
    fn unknown_parent_and_cycles_are_rejected() {
        let unknown: SceneSnapshot = serde_json::from_str(
            r#"{"nodes":[{"id":0,"name":"a","parent":9,"transform":1}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Scene::from_snapshot(unknown),
            Err(SceneError::UnknownParent { .. })
        ));

        let cyclic: SceneSnapshot = serde_json::from_str(
            r#"{"nodes":[
                {"id":0,"name":"a","parent":1,"transform":10},
                {"id":1,"name":"b","parent":0,"transform":11}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            Scene::from_snapshot(cyclic),
            Err(SceneError::ParentCycle(_))
        ));
    }

    #[test]
    fn explicit_transform_components_are_rejected() {
        let snapshot: SceneSnapshot = serde_json::from_str(
            r#"{"nodes":[{"id":0,"name":"a","transform":1,
                "components":[{"id":2,"kind":"Transform"}]}]}"#,
        )
        .unwrap();
        assert_eq!(
            Scene::from_snapshot(snapshot).unwrap_err(),
            SceneError::ExplicitTransform(ComponentId(2))
        );
    }

    #[test]
    fn snapshot_defaults_enabled_and_fields() {
        let snapshot = SceneSnapshot::from_json(
            r#"{"nodes":[{"id":0,"name":"a","transform":1,
                "components":[{"id":2,"kind":"Light"}]}],
               "clips":{"walk":["position.x"]}}"#,
        )
        .unwrap();
        let scene = Scene::from_snapshot(snapshot).unwrap();
        let light = scene.component(ComponentId(2)).unwrap();
        assert!(light.enabled);
        assert!(light.fields.is_empty());
        assert!(scene
            .clip_summary(&ClipId::new("walk"))
            .unwrap()
            .contains("position.x"));
    }
}
