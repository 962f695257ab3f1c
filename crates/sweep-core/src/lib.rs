#![forbid(unsafe_code)]
//! sweep-core library.
//!
//! Scene snapshot model, dependency edge model, per-kind extraction rules
//! and the graph builder that turns a scene into an [`EdgeSet`].
//!
//! ```text
//! SceneSnapshot ──► Scene ──► GraphBuilder(RuleRegistry, AnalysisConfig) ──► EdgeSet + BuildReport
//! ```
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums in [`error`]; `anyhow::Result` only at
//!   the config-file boundary.
//! - **Logging**: Use `tracing` macros (`warn!`, `debug!`, `trace!`).

pub mod adapters;
pub mod builder;
pub mod config;
pub mod edge;
pub mod error;
pub mod model;
pub mod rules;

pub use adapters::{ClipCache, ClipSignals, SceneClips, SceneSkins, SkinBones};
pub use builder::{BuildReport, BuiltEdges, ExtractionFault, GraphBuilder};
pub use config::{AnalysisConfig, load_config};
pub use edge::{Dependency, DependencyFlags, DependencyRecord, Edge, EdgeSet, EdgeTags};
pub use error::{ExtractError, FieldError, RegistryError, SceneError};
pub use model::{ClipId, ComponentId, ComponentInstance, Kind, NodeId, Scene, SceneSnapshot};
pub use rules::{RegistryBuilder, RuleContext, RulePlugin, RuleRegistry, SpringBonePlugin};
