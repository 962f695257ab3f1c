//! `sweep classify`: liveness of every component in a snapshot.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde::Serialize;
use sweep_core::{ComponentId, ExtractionFault, Kind};
use sweep_liveness::{Liveness, Summary};

use crate::cmd::load::{LoadOptions, load};
use crate::output::{OutputMode, emit, field, section};

/// Arguments for `sweep classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Scene snapshot (JSON).
    pub snapshot: PathBuf,

    /// Only list components at this level.
    #[arg(long, value_enum)]
    pub only: Option<LevelArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Required,
    RequiredWhileActive,
    Removable,
}

impl From<LevelArg> for Liveness {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Required => Self::Required,
            LevelArg::RequiredWhileActive => Self::RequiredWhileActive,
            LevelArg::Removable => Self::Removable,
        }
    }
}

#[derive(Debug, Serialize)]
struct ComponentRow {
    id: ComponentId,
    kind: Kind,
    node: String,
    enabled: bool,
    liveness: Liveness,
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    content_hash: String,
    summary: Summary,
    components: Vec<ComponentRow>,
    unknown_kinds: Vec<Kind>,
    faults: Vec<ExtractionFault>,
}

/// Execute `sweep classify`.
pub fn run_classify(
    args: &ClassifyArgs,
    options: &LoadOptions,
    output: OutputMode,
    cwd: &Path,
) -> anyhow::Result<()> {
    let loaded = load(&args.snapshot, options, cwd)?;
    let analysis = loaded.analyze();
    let only = args.only.map(Liveness::from);

    let components = analysis
        .classification
        .iter()
        .filter(|(_, level)| only.is_none_or(|l| l == *level))
        .filter_map(|(id, liveness)| {
            let instance = loaded.scene.component(id)?;
            let node = loaded
                .scene
                .node(instance.node)
                .map_or_else(String::new, |n| n.name.clone());
            Some(ComponentRow {
                id,
                kind: instance.kind.clone(),
                node,
                enabled: instance.enabled,
                liveness,
            })
        })
        .collect();

    let payload = ClassifyOutput {
        content_hash: analysis.graph.content_hash.clone(),
        summary: analysis.classification.summary(),
        components,
        unknown_kinds: analysis.report.unknown_kinds.iter().cloned().collect(),
        faults: analysis.report.faults.clone(),
    };

    emit(output, &payload, &render_text, &render_pretty)
}

fn render_text(payload: &ClassifyOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for row in &payload.components {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            row.id.0, row.liveness, row.kind, row.node
        )?;
    }
    Ok(())
}

fn render_pretty(payload: &ClassifyOutput, w: &mut dyn Write) -> std::io::Result<()> {
    section(w, "Summary")?;
    field(w, "required", payload.summary.required.to_string())?;
    field(
        w,
        "required while active",
        payload.summary.required_while_active.to_string(),
    )?;
    field(w, "removable", payload.summary.removable.to_string())?;
    field(w, "graph hash", &payload.content_hash)?;
    writeln!(w)?;

    section(w, "Components")?;
    for row in &payload.components {
        let state = if row.enabled { "" } else { " (disabled)" };
        writeln!(
            w,
            "{:>6}  {:<22} {:<28} {}{state}",
            row.id.to_string(),
            row.liveness.as_str(),
            row.kind.as_str(),
            row.node
        )?;
    }

    if !payload.unknown_kinds.is_empty() {
        writeln!(w)?;
        section(w, "Unknown kinds (kept conservatively)")?;
        for kind in &payload.unknown_kinds {
            writeln!(w, "  {kind}")?;
        }
    }
    if !payload.faults.is_empty() {
        writeln!(w)?;
        section(w, "Extraction faults")?;
        for fault in &payload.faults {
            writeln!(w, "  {} {}: {}", fault.component, fault.kind, fault.message)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ClassifyOutput {
        ClassifyOutput {
            content_hash: "blake3:00".into(),
            summary: Summary {
                required: 1,
                required_while_active: 0,
                removable: 1,
            },
            components: vec![
                ComponentRow {
                    id: ComponentId(1),
                    kind: Kind::new("Camera"),
                    node: "Main".into(),
                    enabled: true,
                    liveness: Liveness::Required,
                },
                ComponentRow {
                    id: ComponentId(2),
                    kind: Kind::new("Light"),
                    node: "Lamp".into(),
                    enabled: false,
                    liveness: Liveness::Removable,
                },
            ],
            unknown_kinds: vec![Kind::new("Mystery")],
            faults: Vec::new(),
        }
    }

    #[test]
    fn text_rows_are_tab_separated() {
        let mut buf = Vec::new();
        render_text(&payload(), &mut buf).expect("render");
        let text = String::from_utf8_lossy(&buf);
        assert_eq!(text.lines().next(), Some("1\trequired\tCamera\tMain"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn pretty_marks_disabled_and_unknown() {
        let mut buf = Vec::new();
        render_pretty(&payload(), &mut buf).expect("render");
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("(disabled)"));
        assert!(text.contains("Mystery"));
        assert!(!text.contains("Extraction faults"));
    }

    #[test]
    fn level_arg_maps_to_liveness() {
        assert_eq!(
            Liveness::from(LevelArg::RequiredWhileActive),
            Liveness::RequiredWhileActive
        );
    }
}
