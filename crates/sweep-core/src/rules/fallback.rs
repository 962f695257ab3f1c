//! Conservative handling for kinds with no rule.
//!
//! An unknown instance is assumed to have an observable effect, so it is an
//! entry point, and everything it references is kept alive regardless of
//! either side's enabled state.

use crate::edge::Dependency;
use crate::error::ExtractError;
use crate::model::{ComponentInstance, Fields, Value};
use crate::rules::{DescribeReferences, EdgeSink, Reference, RuleContext};

/// Run the fallback for `instance`.
///
/// References come from `describer` when one is registered for the kind,
/// otherwise from a walk over the instance's field tree.
///
/// # Errors
///
/// Propagates errors raised by the describer.
pub fn fallback_rule(
    cx: &RuleContext<'_>,
    instance: &ComponentInstance,
    sink: &mut EdgeSink<'_>,
    describer: Option<&dyn DescribeReferences>,
) -> Result<(), ExtractError> {
    sink.mark_entry_point();

    let references = match describer {
        Some(describer) => describer.references(instance)?,
        None => collect_references(&instance.fields),
    };

    for reference in references {
        let target = match reference {
            Reference::Component(id) => Some(id),
            Reference::Node(node) => cx.transform_of(node),
        };
        if target == Some(instance.id) {
            continue;
        }
        sink.depend_on(target, Dependency::always());
    }
    Ok(())
}

/// Every non-null reference in `fields`, in field-name order.
#[must_use]
pub fn collect_references(fields: &Fields) -> Vec<Reference> {
    let mut out = Vec::new();
    for value in fields.values() {
        walk(value, &mut out);
    }
    out
}

fn walk(value: &Value, out: &mut Vec<Reference>) {
    match value {
        Value::Component(Some(id)) => out.push(Reference::Component(*id)),
        Value::Node(Some(node)) => out.push(Reference::Node(*node)),
        Value::List(items) => items.iter().for_each(|item| walk(item, out)),
        Value::Struct(fields) => fields.values().for_each(|item| walk(item, out)),
        _ => {}
    }
}
