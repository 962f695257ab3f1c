//! `sweep explain`: why a component is kept.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use sweep_core::{ComponentId, Dependency, Kind, Scene};
use sweep_liveness::{Explanation, Liveness};

use crate::cmd::load::{LoadOptions, load};
use crate::output::{ErrorReport, OutputMode, emit, field, section};

/// Arguments for `sweep explain`.
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Scene snapshot (JSON).
    pub snapshot: PathBuf,

    /// Component to explain (`12` or `#12`).
    pub component: ComponentId,
}

#[derive(Debug, Serialize)]
struct StepRow {
    id: ComponentId,
    kind: Kind,
    liveness: Liveness,
    /// Edge from the previous step, in words.
    #[serde(skip_serializing_if = "Option::is_none")]
    via: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependency: Option<Dependency>,
}

#[derive(Debug, Serialize)]
struct ExplainOutput {
    id: ComponentId,
    kind: Kind,
    liveness: Liveness,
    entry_point: bool,
    chain: Vec<StepRow>,
}

/// Execute `sweep explain`.
pub fn run_explain(
    args: &ExplainArgs,
    options: &LoadOptions,
    output: OutputMode,
    cwd: &Path,
) -> anyhow::Result<()> {
    let loaded = load(&args.snapshot, options, cwd)?;
    let analysis = loaded.analyze();

    let Some(explanation) = analysis.explain(args.component) else {
        ErrorReport::new(
            "unknown_component",
            format!("component {} is not in the scene", args.component),
        )
        .hint("run `sweep classify` to list component ids")
        .report(output)?;
        anyhow::bail!("unknown component {}", args.component);
    };

    let entry_point = analysis
        .edges
        .record(args.component)
        .is_some_and(|r| r.entry_point);
    let payload = to_output(&loaded.scene, &explanation, entry_point);
    emit(output, &payload, &render_text, &render_pretty)
}

fn kind_of(scene: &Scene, id: ComponentId) -> Kind {
    scene
        .component(id)
        .map_or_else(|| Kind::new("?"), |c| c.kind.clone())
}

fn to_output(scene: &Scene, explanation: &Explanation, entry_point: bool) -> ExplainOutput {
    ExplainOutput {
        id: explanation.component,
        kind: kind_of(scene, explanation.component),
        liveness: explanation.liveness,
        entry_point,
        chain: explanation
            .chain
            .iter()
            .map(|step| StepRow {
                id: step.component,
                kind: kind_of(scene, step.component),
                liveness: step.liveness,
                via: step.via.map(|d| d.to_string()),
                dependency: step.via,
            })
            .collect(),
    }
}

fn render_text(payload: &ExplainOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for step in &payload.chain {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            step.id.0,
            step.liveness,
            step.kind,
            step.via.as_deref().unwrap_or("entry point")
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &ExplainOutput, w: &mut dyn Write) -> std::io::Result<()> {
    section(w, &format!("{} {}", payload.id, payload.kind))?;
    field(w, "liveness", payload.liveness.as_str())?;
    field(w, "entry point", if payload.entry_point { "yes" } else { "no" })?;
    writeln!(w)?;

    if payload.chain.is_empty() {
        writeln!(w, "Nothing live depends on this component.")?;
        return Ok(());
    }
    section(w, "Kept by")?;
    for (depth, step) in payload.chain.iter().enumerate() {
        let indent = "  ".repeat(depth);
        match &step.via {
            None => writeln!(w, "{indent}{} {} [{}]", step.id, step.kind, step.liveness)?,
            Some(via) => writeln!(
                w,
                "{indent}└─ {via} → {} {} [{}]",
                step.id, step.kind, step.liveness
            )?,
        }
    }
    Ok(())
}
