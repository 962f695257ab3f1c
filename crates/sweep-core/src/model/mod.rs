//! Scene model: identifiers, schema-typed field values and the frozen scene
//! snapshot the graph builder reads from.

pub mod ids;
pub mod scene;
pub mod value;

pub use ids::{ClipId, ComponentId, Kind, NodeId};
pub use scene::{
    ComponentInstance, ComponentSnapshot, NodeSnapshot, PlacementNode, Scene, SceneBuilder,
    SceneSnapshot,
};
pub use value::{FieldAccess, Fields, Value};
