//! Identifier newtypes shared by the scene model and the dependency graph.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity of one component instance, stable for the lifetime of a scene
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u32);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for ComponentId {
    type Err = std::num::ParseIntError;

    /// Accepts both `12` and the display form `#12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}

/// Identity of one placement node in the scene hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// A component kind tag such as `"Transform"` or `"SkinnedMeshRenderer"`.
///
/// The set of kinds is open: hosts may hand the engine kinds it has never
/// heard of, which then go through the conservative fallback rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(Cow<'static, str>);

impl Kind {
    /// Build a kind from a string literal; usable in `const` items.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Kind {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

/// Identity of an animation clip, as handed out by the animation subsystem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_id_parses_with_and_without_hash() {
        assert_eq!("12".parse::<ComponentId>().unwrap(), ComponentId(12));
        assert_eq!("#7".parse::<ComponentId>().unwrap(), ComponentId(7));
        assert!("abc".parse::<ComponentId>().is_err());
    }

    #[test]
    fn static_and_owned_kinds_compare_equal() {
        const RENDERER: Kind = Kind::from_static("Renderer");
        assert_eq!(RENDERER, Kind::new("Renderer"));
        assert_eq!(RENDERER.to_string(), "Renderer");
    }

    #[test]
    fn kind_serializes_as_plain_string() {
        let json = serde_json::to_string(&Kind::from_static("Light")).unwrap();
        assert_eq!(json, "\"Light\"");
        let back: Kind = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "Light");
    }
}
