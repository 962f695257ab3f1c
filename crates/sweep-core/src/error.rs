//! Error types for scene validation, rule registration and edge extraction.
//!
//! None of these are fatal to an analysis run: extraction errors are caught
//! per component by the graph builder, and scene/registry errors surface
//! before any analysis starts.

use crate::model::{ComponentId, Kind, NodeId};

/// A component field did not have the shape a rule expected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("field `{field}` expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("required field `{0}` is missing")]
    Missing(String),
}

/// Failure while extracting the edges of one component instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Structural problems in a scene snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),
    #[error("duplicate component id {0}")]
    DuplicateComponent(ComponentId),
    #[error("node {node} names unknown parent {parent}")]
    UnknownParent { node: NodeId, parent: NodeId },
    #[error("node {0} is its own ancestor")]
    ParentCycle(NodeId),
    #[error("component {0} declares kind Transform; transforms are implied by their node")]
    ExplicitTransform(ComponentId),
}

/// Problems assembling a rule registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("a rule for kind `{0}` is already registered")]
    DuplicateKind(Kind),
    #[error("kind `{kind}` extends `{base}`, which has no rule")]
    UnknownBase { kind: Kind, base: Kind },
    #[error("kind lineage of `{0}` loops back on itself")]
    LineageCycle(Kind),
}
