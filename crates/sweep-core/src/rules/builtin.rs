//! Built-in rule catalog.
//!
//! Naming: in every edge below the first component depends on the second.
//! "active" edges hold only while the dependent is enabled; "always" edges
//! hold whenever the dependent exists.

use crate::edge::{Dependency, EdgeTags};
use crate::error::{ExtractError, FieldError, RegistryError};
use crate::model::{ClipId, ComponentId, ComponentInstance, FieldAccess, Fields, Kind, NodeId};
use crate::rules::kinds;
use crate::rules::{EdgeSink, RegistryBuilder, RuleContext};

type RuleResult = Result<(), ExtractError>;

/// Register every built-in kind.
///
/// # Errors
///
/// Fails only if one of these kinds is already registered in `builder`.
pub fn register(builder: &mut RegistryBuilder) -> Result<(), RegistryError> {
    builder.rule(kinds::TRANSFORM, transform_rule)?;

    builder.rule(kinds::ANIMATOR, animator_rule)?;
    builder.entry_point(kinds::ANIMATION)?;
    builder.entry_point(kinds::LIGHT)?;
    builder.entry_point(kinds::CAMERA)?;
    builder.entry_point(kinds::AUDIO_SOURCE)?;
    builder.rule(kinds::FLARE_LAYER, flare_layer_rule)?;

    builder.rule(kinds::RENDERER, renderer_rule)?;
    builder.extends(kinds::RENDERER, kinds::SKINNED_MESH_RENDERER, skinned_mesh_rule)?;
    builder.extends(kinds::RENDERER, kinds::MESH_RENDERER, mesh_renderer_rule)?;
    builder.inherits(kinds::RENDERER, kinds::TRAIL_RENDERER)?;
    builder.inherits(kinds::RENDERER, kinds::LINE_RENDERER)?;
    builder.extends(
        kinds::RENDERER,
        kinds::PARTICLE_SYSTEM_RENDERER,
        particle_renderer_rule,
    )?;
    builder.no_edges(kinds::MESH_FILTER)?;
    builder.rule(kinds::PARTICLE_SYSTEM, particle_system_rule)?;
    builder.rule(kinds::CLOTH, cloth_rule)?;

    builder.rule(kinds::COLLIDER, collider_rule)?;
    for kind in [
        kinds::BOX_COLLIDER,
        kinds::SPHERE_COLLIDER,
        kinds::CAPSULE_COLLIDER,
        kinds::MESH_COLLIDER,
        kinds::WHEEL_COLLIDER,
        kinds::TERRAIN_COLLIDER,
    ] {
        builder.inherits(kinds::COLLIDER, kind)?;
    }

    builder.rule(kinds::RIGIDBODY, rigidbody_rule)?;
    builder.rule(kinds::JOINT, joint_rule)?;
    for kind in [
        kinds::CHARACTER_JOINT,
        kinds::CONFIGURABLE_JOINT,
        kinds::FIXED_JOINT,
        kinds::HINGE_JOINT,
        kinds::SPRING_JOINT,
    ] {
        builder.inherits(kinds::JOINT, kind)?;
    }

    builder.rule(kinds::AIM_CONSTRAINT, aim_constraint_rule)?;
    builder.rule(kinds::LOOK_AT_CONSTRAINT, aim_constraint_rule)?;
    for kind in [
        kinds::PARENT_CONSTRAINT,
        kinds::POSITION_CONSTRAINT,
        kinds::ROTATION_CONSTRAINT,
        kinds::SCALE_CONSTRAINT,
    ] {
        builder.rule(kind, constraint_rule)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn node_transform(cx: &RuleContext<'_>, node: Option<NodeId>) -> Option<ComponentId> {
    node.and_then(|node| cx.transform_of(node))
}

fn sibling(cx: &RuleContext<'_>, instance: &ComponentInstance, kind: &Kind) -> Option<ComponentId> {
    cx.scene().find_on_node(instance.node, kind).map(|c| c.id)
}

/// A nested module struct, returned only when its `enabled` flag is set.
fn enabled_module<'f>(
    fields: &'f impl FieldAccess,
    name: &str,
) -> Result<Option<&'f Fields>, FieldError> {
    let Some(module) = fields.struct_field(name)? else {
        return Ok(None);
    };
    Ok(module.bool_field("enabled")?.unwrap_or(false).then_some(module))
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

fn transform_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    let Some(node) = cx.scene().node(instance.node) else {
        return Ok(());
    };
    let Some(parent) = node_transform(cx, node.parent) else {
        return Ok(());
    };

    sink.depend_on(parent, Dependency::always().tagged(EdgeTags::PARENT));
    if cx.config().is_end_bone(&node.name) {
        sink.add_edge(parent, instance.id, Dependency::always());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

fn animator_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.mark_entry_point();

    let scene = cx.scene();
    for bone in instance.node_list("bones")? {
        for node in scene
            .ancestors(bone)
            .take_while(|node| node.id != instance.node)
        {
            sink.depend_on(node.transform, Dependency::active());
        }
    }

    for binding in instance.struct_list("bindings")? {
        let Some(target) = binding.component_ref("target")? else {
            continue;
        };
        let property = binding
            .str_field("property")?
            .ok_or_else(|| FieldError::Missing("bindings.property".into()))?;
        if property == "enabled" {
            sink.mark_activatable(target);
            continue;
        }
        let clip = binding
            .str_field("clip")?
            .ok_or_else(|| FieldError::Missing("bindings.clip".into()))?;
        if cx.is_time_varying(&ClipId::new(clip), property) {
            sink.depend_on(target, Dependency::active());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn renderer_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.mark_entry_point();

    let reflection = instance.str_field("reflection_probe_usage")?;
    let light = instance.str_field("light_probe_usage")?;
    // An unset usage means the default, which samples probes.
    let uses_probes =
        reflection.is_none_or(|usage| usage != "off") || light.is_none_or(|usage| usage != "off");

    if uses_probes {
        let anchor = node_transform(cx, instance.node_ref("probe_anchor")?);
        sink.depend_on(anchor, Dependency::active());
    }
    if light == Some("use_proxy_volume") {
        sink.depend_on(
            instance.component_ref("light_probe_proxy_volume")?,
            Dependency::active(),
        );
    }
    Ok(())
}

fn skinned_mesh_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    let skin_edge = Dependency::active()
        .if_target_enabled()
        .tagged(EdgeTags::BONE);

    for bone in cx.skins().bones(instance)? {
        let transform = cx.transform_of(bone);
        sink.depend_on(transform, skin_edge);
        sink.add_edge(transform, instance.id, Dependency::always());
    }
    if let Some(root) = cx.skins().root_bone(instance)? {
        let transform = cx.transform_of(root);
        sink.depend_on(transform, skin_edge);
        sink.add_edge(transform, instance.id, Dependency::always());
    }
    Ok(())
}

fn mesh_renderer_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.depend_on(sibling(cx, instance, &kinds::MESH_FILTER), Dependency::active());
    Ok(())
}

fn particle_system_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.mark_entry_point();

    if instance.str_field("simulation_space")? == Some("custom") {
        let space = node_transform(cx, instance.node_ref("custom_simulation_space")?);
        sink.depend_on(space, Dependency::active());
    }

    if let Some(shape) = enabled_module(instance, "shape")? {
        let source = match shape.str_field("shape_type")? {
            Some("mesh_renderer") => shape.component_ref("mesh_renderer")?,
            Some("skinned_mesh_renderer") => shape.component_ref("skinned_mesh_renderer")?,
            Some("sprite_renderer") => shape.component_ref("sprite_renderer")?,
            _ => None,
        };
        sink.depend_on(source, Dependency::active());
    }

    if let Some(collision) = enabled_module(instance, "collision")? {
        if collision.str_field("type")? == Some("planes") {
            for plane in collision.node_list("planes")? {
                sink.depend_on(cx.transform_of(plane), Dependency::active());
            }
        }
    }

    if let Some(trigger) = enabled_module(instance, "trigger")? {
        for collider in trigger.component_list("colliders")? {
            sink.depend_on(collider, Dependency::active());
        }
    }

    if let Some(sub_emitters) = enabled_module(instance, "sub_emitters")? {
        for system in sub_emitters.component_list("systems")? {
            sink.depend_on(system, Dependency::active());
        }
    }

    if let Some(lights) = enabled_module(instance, "lights")? {
        sink.depend_on(lights.component_ref("light")?, Dependency::active());
    }

    sink.depend_on(
        sibling(cx, instance, &kinds::PARTICLE_SYSTEM_RENDERER),
        Dependency::always(),
    );
    Ok(())
}

fn particle_renderer_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.depend_on(
        sibling(cx, instance, &kinds::PARTICLE_SYSTEM),
        Dependency::always(),
    );
    Ok(())
}

fn cloth_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.add_edge(
        sibling(cx, instance, &kinds::SKINNED_MESH_RENDERER),
        instance.id,
        Dependency::active().if_target_enabled(),
    );
    for collider in instance.component_list("capsule_colliders")? {
        sink.depend_on(collider, Dependency::active());
    }
    for pair in instance.struct_list("sphere_colliders")? {
        sink.depend_on(pair.component_ref("first")?, Dependency::active());
        sink.depend_on(pair.component_ref("second")?, Dependency::active());
    }
    Ok(())
}

fn flare_layer_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.add_edge(
        sibling(cx, instance, &kinds::CAMERA),
        instance.id,
        Dependency::active(),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Physics
// ---------------------------------------------------------------------------

fn collider_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.mark_entry_point();
    let body = cx
        .scene()
        .find_in_ancestors(instance.node, &kinds::RIGIDBODY)
        .map(|c| c.id);
    sink.add_edge(body, instance.id, Dependency::active().if_target_enabled());
    Ok(())
}

fn rigidbody_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.add_edge(
        cx.transform_of(instance.node),
        instance.id,
        Dependency::always().if_target_enabled(),
    );
    Ok(())
}

fn joint_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    let body = sibling(cx, instance, &kinds::RIGIDBODY);
    sink.depend_on(body, Dependency::always());
    sink.add_edge(body, instance.id, Dependency::active());
    sink.depend_on(instance.component_ref("connected_body")?, Dependency::active());
    Ok(())
}

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

fn constraint_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    sink.add_edge(
        cx.transform_of(instance.node),
        instance.id,
        Dependency::always().if_target_enabled(),
    );
    for source in instance.node_list("sources")? {
        sink.depend_on(cx.transform_of(source), Dependency::active());
    }
    Ok(())
}

fn aim_constraint_rule(cx: &RuleContext<'_>, instance: &ComponentInstance, sink: &mut EdgeSink<'_>) -> RuleResult {
    constraint_rule(cx, instance, sink)?;
    let world_up = node_transform(cx, instance.node_ref("world_up_object")?);
    sink.depend_on(world_up, Dependency::active());
    Ok(())
}
