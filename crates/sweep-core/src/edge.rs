//! Dependency edge model and the append-only edge set.
//!
//! An edge `A → B` means "A depends on B". Two independent flags control
//! when the edge is asserted:
//!
//! | flag | meaning when set |
//! |---|---|
//! | [`DependencyFlags::EVEN_IF_TARGET_DISABLED`] | the dependency is needed even while it is disabled (it must merely exist) |
//! | [`DependencyFlags::EVEN_IF_DEPENDENT_DISABLED`] | the edge holds even while the dependent is disabled |
//!
//! Edges between the same ordered pair merge by OR-ing flags and tags, so
//! insertion order never affects the final set. Nothing is ever removed.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::model::{ComponentId, Kind};

// ---------------------------------------------------------------------------
// Flags and tags
// ---------------------------------------------------------------------------

/// Conditional-activation flags of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyFlags(u8);

impl DependencyFlags {
    pub const NONE: Self = Self(0);
    /// `requires-dependency-even-if-disabled`.
    pub const EVEN_IF_TARGET_DISABLED: Self = Self(1 << 0);
    /// `holds-even-if-dependent-disabled`.
    pub const EVEN_IF_DEPENDENT_DISABLED: Self = Self(1 << 1);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for DependencyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for DependencyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Semantic role of an edge, for downstream consumers. Has no effect on
/// propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeTags(u8);

impl EdgeTags {
    pub const NONE: Self = Self(0);
    pub const NORMAL: Self = Self(1 << 0);
    pub const PARENT: Self = Self(1 << 1);
    pub const OWNS_TRANSFORM: Self = Self(1 << 2);
    pub const BONE: Self = Self(1 << 3);

    const NAMES: [(Self, &'static str); 4] = [
        (Self::NORMAL, "normal"),
        (Self::PARENT, "parent"),
        (Self::OWNS_TRANSFORM, "owns-transform"),
        (Self::BONE, "bone"),
    ];

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Names of the set tags, in bit order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMES
            .into_iter()
            .filter(move |(tag, _)| self.contains(*tag))
            .map(|(_, name)| name)
    }
}

impl BitOr for EdgeTags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for EdgeTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        f.write_str(&names.join("|"))
    }
}

// ---------------------------------------------------------------------------
// Dependency
// ---------------------------------------------------------------------------

/// Flags and tags carried by one edge.
///
/// The constructors follow how rules phrase dependencies:
///
/// - [`Dependency::active`]: needed while the dependent is enabled.
/// - [`Dependency::always`]: needed whenever the dependent exists.
/// - [`Dependency::if_target_enabled`]: the dependency only counts while it
///   can itself be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dependency {
    pub flags: DependencyFlags,
    pub tags: EdgeTags,
}

impl Dependency {
    #[must_use]
    pub const fn new(flags: DependencyFlags, tags: EdgeTags) -> Self {
        Self { flags, tags }
    }

    #[must_use]
    pub const fn active() -> Self {
        Self::new(DependencyFlags::EVEN_IF_TARGET_DISABLED, EdgeTags::NORMAL)
    }

    #[must_use]
    pub const fn always() -> Self {
        Self::new(
            DependencyFlags::EVEN_IF_TARGET_DISABLED.union(DependencyFlags::EVEN_IF_DEPENDENT_DISABLED),
            EdgeTags::NORMAL,
        )
    }

    #[must_use]
    pub const fn if_target_enabled(self) -> Self {
        Self::new(
            self.flags.without(DependencyFlags::EVEN_IF_TARGET_DISABLED),
            self.tags,
        )
    }

    #[must_use]
    pub const fn tagged(self, tags: EdgeTags) -> Self {
        Self::new(self.flags, tags)
    }

    /// Combine two declarations for the same ordered pair.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self::new(self.flags.union(other.flags), self.tags.union(other.tags))
    }

    #[must_use]
    pub const fn requires_target_even_if_disabled(self) -> bool {
        self.flags.contains(DependencyFlags::EVEN_IF_TARGET_DISABLED)
    }

    #[must_use]
    pub const fn holds_even_if_dependent_disabled(self) -> bool {
        self.flags.contains(DependencyFlags::EVEN_IF_DEPENDENT_DISABLED)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = if self.holds_even_if_dependent_disabled() {
            "always"
        } else {
            "active"
        };
        let target = if self.requires_target_even_if_disabled() {
            ""
        } else {
            ", if target enabled"
        };
        write!(f, "{when}{target} [{}]", self.tags)
    }
}

/// One directed edge, `dependent → dependency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub dependent: ComponentId,
    pub dependency: ComponentId,
    pub kind: Dependency,
}

// ---------------------------------------------------------------------------
// EdgeSet
// ---------------------------------------------------------------------------

/// Per-component record: static state plus outgoing dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    pub kind: Kind,
    pub enabled: bool,
    /// Set when an animation drives this component's enabled toggle.
    pub activatable: bool,
    pub entry_point: bool,
    pub dependencies: BTreeMap<ComponentId, Dependency>,
}

impl DependencyRecord {
    /// Whether this component is, or may at runtime become, enabled.
    #[must_use]
    pub const fn can_be_enabled(&self) -> bool {
        self.enabled || self.activatable
    }
}

/// The full set of components and edges produced by one build.
///
/// Append-only: components are registered first, then edges and markings
/// are added. Edges naming an unregistered component are dropped and
/// counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeSet {
    records: BTreeMap<ComponentId, DependencyRecord>,
    dropped: usize,
}

impl EdgeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component with an empty record. Registering an id twice
    /// keeps the first record.
    pub fn insert_component(&mut self, id: ComponentId, kind: Kind, enabled: bool) {
        self.records.entry(id).or_insert_with(|| DependencyRecord {
            kind,
            enabled,
            activatable: false,
            entry_point: false,
            dependencies: BTreeMap::new(),
        });
    }

    /// Add or merge the edge `dependent → dependency`.
    ///
    /// Returns `false` (and drops the edge) if either endpoint is unknown.
    pub fn add_edge(
        &mut self,
        dependent: ComponentId,
        dependency: ComponentId,
        kind: Dependency,
    ) -> bool {
        if !self.records.contains_key(&dependency) {
            self.dropped += 1;
            return false;
        }
        let Some(record) = self.records.get_mut(&dependent) else {
            self.dropped += 1;
            return false;
        };
        record
            .dependencies
            .entry(dependency)
            .and_modify(|existing| *existing = existing.merge(kind))
            .or_insert(kind);
        true
    }

    /// Returns `false` if `id` is unknown.
    pub fn mark_entry_point(&mut self, id: ComponentId) -> bool {
        self.records
            .get_mut(&id)
            .map(|record| record.entry_point = true)
            .is_some()
    }

    /// Returns `false` if `id` is unknown.
    pub fn mark_activatable(&mut self, id: ComponentId) -> bool {
        self.records
            .get_mut(&id)
            .map(|record| record.activatable = true)
            .is_some()
    }

    #[must_use]
    pub fn record(&self, id: ComponentId) -> Option<&DependencyRecord> {
        self.records.get(&id)
    }

    /// All records in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = (ComponentId, &DependencyRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    #[must_use]
    pub fn dependency(&self, dependent: ComponentId, dependency: ComponentId) -> Option<Dependency> {
        self.records
            .get(&dependent)?
            .dependencies
            .get(&dependency)
            .copied()
    }

    /// Every edge, ordered by `(dependent, dependency)`.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.records.iter().flat_map(|(dependent, record)| {
            record.dependencies.iter().map(|(dependency, kind)| Edge {
                dependent: *dependent,
                dependency: *dependency,
                kind: *kind,
            })
        })
    }

    pub fn entry_points(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.records
            .iter()
            .filter(|(_, record)| record.entry_point)
            .map(|(id, _)| *id)
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.records.values().map(|r| r.dependencies.len()).sum()
    }

    /// Number of edges dropped because an endpoint was unknown.
    #[must_use]
    pub const fn dropped_edges(&self) -> usize {
        self.dropped
    }
}
