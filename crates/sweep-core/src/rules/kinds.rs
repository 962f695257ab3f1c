//! Kind names understood by the built-in rule catalog.

use crate::model::Kind;

pub const TRANSFORM: Kind = Kind::from_static("Transform");

pub const ANIMATOR: Kind = Kind::from_static("Animator");
pub const ANIMATION: Kind = Kind::from_static("Animation");

pub const RENDERER: Kind = Kind::from_static("Renderer");
pub const SKINNED_MESH_RENDERER: Kind = Kind::from_static("SkinnedMeshRenderer");
pub const MESH_RENDERER: Kind = Kind::from_static("MeshRenderer");
pub const MESH_FILTER: Kind = Kind::from_static("MeshFilter");
pub const TRAIL_RENDERER: Kind = Kind::from_static("TrailRenderer");
pub const LINE_RENDERER: Kind = Kind::from_static("LineRenderer");
pub const PARTICLE_SYSTEM: Kind = Kind::from_static("ParticleSystem");
pub const PARTICLE_SYSTEM_RENDERER: Kind = Kind::from_static("ParticleSystemRenderer");
pub const CLOTH: Kind = Kind::from_static("Cloth");

pub const LIGHT: Kind = Kind::from_static("Light");
pub const CAMERA: Kind = Kind::from_static("Camera");
pub const FLARE_LAYER: Kind = Kind::from_static("FlareLayer");
pub const AUDIO_SOURCE: Kind = Kind::from_static("AudioSource");

pub const COLLIDER: Kind = Kind::from_static("Collider");
pub const BOX_COLLIDER: Kind = Kind::from_static("BoxCollider");
pub const SPHERE_COLLIDER: Kind = Kind::from_static("SphereCollider");
pub const CAPSULE_COLLIDER: Kind = Kind::from_static("CapsuleCollider");
pub const MESH_COLLIDER: Kind = Kind::from_static("MeshCollider");
pub const WHEEL_COLLIDER: Kind = Kind::from_static("WheelCollider");
pub const TERRAIN_COLLIDER: Kind = Kind::from_static("TerrainCollider");

pub const RIGIDBODY: Kind = Kind::from_static("Rigidbody");
pub const JOINT: Kind = Kind::from_static("Joint");
pub const CHARACTER_JOINT: Kind = Kind::from_static("CharacterJoint");
pub const CONFIGURABLE_JOINT: Kind = Kind::from_static("ConfigurableJoint");
pub const FIXED_JOINT: Kind = Kind::from_static("FixedJoint");
pub const HINGE_JOINT: Kind = Kind::from_static("HingeJoint");
pub const SPRING_JOINT: Kind = Kind::from_static("SpringJoint");

pub const AIM_CONSTRAINT: Kind = Kind::from_static("AimConstraint");
pub const LOOK_AT_CONSTRAINT: Kind = Kind::from_static("LookAtConstraint");
pub const PARENT_CONSTRAINT: Kind = Kind::from_static("ParentConstraint");
pub const POSITION_CONSTRAINT: Kind = Kind::from_static("PositionConstraint");
pub const ROTATION_CONSTRAINT: Kind = Kind::from_static("RotationConstraint");
pub const SCALE_CONSTRAINT: Kind = Kind::from_static("ScaleConstraint");
