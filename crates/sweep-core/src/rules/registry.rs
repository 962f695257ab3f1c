//! Kind-indexed rule registry.
//!
//! # Composition
//!
//! Each registered kind carries an optional base kind and an optional rule of
//! its own. At [`RegistryBuilder::build`] every kind is resolved into one
//! composed rule by explicit chaining:
//!
//! ```text
//! composed(kind) = composed(base) ; own(kind)
//! ```
//!
//! so a base kind's behavior is always a strict prefix of its
//! specializations' behavior.
//!
//! # Lookup
//!
//! [`RuleRegistry::lookup`] tries the instance's kind, then walks the host's
//! kind lineage (from the scene snapshot) until it reaches a registered kind.
//! Kinds that never reach one are unknown and get the fallback rule.
//!
//! The built registry is immutable, `Send + Sync`, and may be shared across
//! concurrent analyses.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{ExtractError, RegistryError};
use crate::model::{ComponentInstance, Kind, Scene};
use crate::rules::{DescribeReferences, EdgeSink, RuleContext, RuleFn, RulePlugin};

type SharedRule = Arc<RuleFn>;

struct KindEntry {
    base: Option<Kind>,
    own: Option<SharedRule>,
}

/// Mutable registration phase of a [`RuleRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<Kind, KindEntry>,
    describers: BTreeMap<Kind, Arc<dyn DescribeReferences>>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-populated with the built-in catalog.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in catalog itself is inconsistent.
    pub fn with_builtin() -> Result<Self, RegistryError> {
        let mut builder = Self::new();
        crate::rules::builtin::register(&mut builder)?;
        Ok(builder)
    }

    fn insert(&mut self, kind: Kind, entry: KindEntry) -> Result<&mut Self, RegistryError> {
        if self.entries.contains_key(&kind) {
            return Err(RegistryError::DuplicateKind(kind));
        }
        self.entries.insert(kind, entry);
        Ok(self)
    }

    /// Register a rule for a kind with no base.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKind`] if `kind` already has an entry.
    pub fn rule<F>(&mut self, kind: Kind, rule: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&RuleContext<'_>, &ComponentInstance, &mut EdgeSink<'_>) -> Result<(), ExtractError>
            + Send
            + Sync
            + 'static,
    {
        let own: SharedRule = Arc::new(rule);
        self.insert(
            kind,
            KindEntry {
                base: None,
                own: Some(own),
            },
        )
    }

    /// Register `kind` as a specialization of `base` whose rule runs after
    /// the base's rule.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKind`] if `kind` already has an entry.
    /// An unknown `base` is reported by [`build`](Self::build).
    pub fn extends<F>(&mut self, base: Kind, kind: Kind, rule: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&RuleContext<'_>, &ComponentInstance, &mut EdgeSink<'_>) -> Result<(), ExtractError>
            + Send
            + Sync
            + 'static,
    {
        let own: SharedRule = Arc::new(rule);
        self.insert(
            kind,
            KindEntry {
                base: Some(base),
                own: Some(own),
            },
        )
    }

    /// Register `kind` as a specialization of `base` that adds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKind`] if `kind` already has an entry.
    pub fn inherits(&mut self, base: Kind, kind: Kind) -> Result<&mut Self, RegistryError> {
        self.insert(
            kind,
            KindEntry {
                base: Some(base),
                own: None,
            },
        )
    }

    /// Register a kind whose instances are entry points and declare nothing
    /// else.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKind`] if `kind` already has an entry.
    pub fn entry_point(&mut self, kind: Kind) -> Result<&mut Self, RegistryError> {
        self.rule(kind, |_, _, sink| {
            sink.mark_entry_point();
            Ok(())
        })
    }

    /// Register a kind that declares no edges of its own.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKind`] if `kind` already has an entry.
    pub fn no_edges(&mut self, kind: Kind) -> Result<&mut Self, RegistryError> {
        self.rule(kind, |_, _, _| Ok(()))
    }

    /// Attach a reference describer used by the fallback rule for `kind`.
    pub fn describer(&mut self, kind: Kind, describer: impl DescribeReferences + 'static) -> &mut Self {
        self.describers.insert(kind, Arc::new(describer));
        self
    }

    /// Let an external plugin register its kinds.
    ///
    /// # Errors
    ///
    /// Propagates any registration error raised by the plugin.
    pub fn plugin(&mut self, plugin: &dyn RulePlugin) -> Result<&mut Self, RegistryError> {
        tracing::debug!(plugin = plugin.name(), "registering rule plugin");
        plugin.register(self)?;
        Ok(self)
    }

    /// Register `plugin` only if every kind it requires is among
    /// `host_kinds`. Returns whether it was registered.
    ///
    /// # Errors
    ///
    /// Propagates any registration error raised by the plugin.
    pub fn plugin_for_host(
        &mut self,
        plugin: &dyn RulePlugin,
        host_kinds: &BTreeSet<Kind>,
    ) -> Result<bool, RegistryError> {
        let missing: Vec<Kind> = plugin
            .required_kinds()
            .into_iter()
            .filter(|kind| !host_kinds.contains(kind))
            .collect();
        if !missing.is_empty() {
            tracing::debug!(plugin = plugin.name(), ?missing, "host lacks plugin kinds, skipping");
            return Ok(false);
        }
        self.plugin(plugin)?;
        Ok(true)
    }

    /// Resolve every kind into its composed rule and freeze the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownBase`] if a kind extends a kind with no
    /// entry, or [`RegistryError::LineageCycle`] if a lineage loops.
    pub fn build(self) -> Result<RuleRegistry, RegistryError> {
        let mut resolved: BTreeMap<Kind, SharedRule> = BTreeMap::new();
        for kind in self.entries.keys() {
            let mut visiting = BTreeSet::new();
            resolve(kind, &self.entries, &mut resolved, &mut visiting)?;
        }

        let lineage = self
            .entries
            .iter()
            .filter_map(|(kind, entry)| entry.base.clone().map(|base| (kind.clone(), base)))
            .collect();

        Ok(RuleRegistry {
            rules: resolved,
            lineage,
            describers: self.describers,
        })
    }
}

fn resolve(
    kind: &Kind,
    entries: &BTreeMap<Kind, KindEntry>,
    resolved: &mut BTreeMap<Kind, SharedRule>,
    visiting: &mut BTreeSet<Kind>,
) -> Result<SharedRule, RegistryError> {
    if let Some(rule) = resolved.get(kind) {
        return Ok(Arc::clone(rule));
    }
    if !visiting.insert(kind.clone()) {
        return Err(RegistryError::LineageCycle(kind.clone()));
    }
    let entry = &entries[kind];

    let base_rule = match &entry.base {
        None => None,
        Some(base) if !entries.contains_key(base) => {
            return Err(RegistryError::UnknownBase {
                kind: kind.clone(),
                base: base.clone(),
            });
        }
        Some(base) => Some(resolve(base, entries, resolved, visiting)?),
    };

    let composed: SharedRule = match (base_rule, entry.own.clone()) {
        (Some(base), Some(own)) => {
            let chained: SharedRule = Arc::new(
                move |cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>| {
                    base(cx, instance, sink)?;
                    own(cx, instance, sink)
                },
            );
            chained
        }
        (Some(base), None) => base,
        (None, Some(own)) => own,
        (None, None) => {
            let nothing: SharedRule = Arc::new(
                |_: &RuleContext<'_>, _: &ComponentInstance, _: &mut EdgeSink<'_>| Ok(()),
            );
            nothing
        }
    };

    resolved.insert(kind.clone(), Arc::clone(&composed));
    Ok(composed)
}

/// Outcome of [`RuleRegistry::lookup`].
pub enum Lookup<'r> {
    /// A rule was found, registered under `via` (the instance's own kind or
    /// one of its host-declared ancestors).
    Rule { rule: &'r RuleFn, via: &'r Kind },
    /// No rule anywhere in the lineage; run the fallback, using the describer
    /// if one is registered.
    Unknown {
        describer: Option<&'r dyn DescribeReferences>,
    },
}

/// Immutable kind → rule table.
pub struct RuleRegistry {
    rules: BTreeMap<Kind, SharedRule>,
    lineage: BTreeMap<Kind, Kind>,
    describers: BTreeMap<Kind, Arc<dyn DescribeReferences>>,
}

impl RuleRegistry {
    /// The registry containing just the built-in catalog.
    ///
    /// # Errors
    ///
    /// Only fails if the built-in catalog itself is inconsistent.
    pub fn builtin() -> Result<Self, RegistryError> {
        RegistryBuilder::with_builtin()?.build()
    }

    #[must_use]
    pub fn contains(&self, kind: &Kind) -> bool {
        self.rules.contains_key(kind)
    }

    /// Registered base of `kind`, if it was declared with one.
    #[must_use]
    pub fn base_of(&self, kind: &Kind) -> Option<&Kind> {
        self.lineage.get(kind)
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<&Kind> {
        self.rules.keys().collect()
    }

    /// Find the rule for `kind`, following the scene's kind lineage for kinds
    /// the registry does not know directly.
    #[must_use]
    pub fn lookup<'r>(&'r self, kind: &Kind, scene: &Scene) -> Lookup<'r> {
        let mut seen = BTreeSet::new();
        let mut current = kind;
        loop {
            if let Some((via, rule)) = self.rules.get_key_value(current) {
                return Lookup::Rule {
                    rule: rule.as_ref(),
                    via,
                };
            }
            if !seen.insert(current.clone()) {
                break;
            }
            match scene.kind_base(current) {
                Some(base) => current = base,
                None => break,
            }
        }
        Lookup::Unknown {
            describer: self.describers.get(kind).map(Arc::as_ref),
        }
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("kinds", &self.rules.keys().collect::<Vec<_>>())
            .field("lineage", &self.lineage)
            .field("describers", &self.describers.keys().collect::<Vec<_>>())
            .finish()
    }
}
