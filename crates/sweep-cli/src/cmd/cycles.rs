//! `sweep cycles`: list dependency cycles (strongly connected components).

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use sweep_core::{ComponentId, Scene};
use sweep_liveness::CycleReport;

use crate::cmd::load::{LoadOptions, load};
use crate::output::{OutputMode, emit, section};

/// Arguments for `sweep cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    /// Scene snapshot (JSON).
    pub snapshot: PathBuf,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<CycleReport>,
    #[serde(skip)]
    labels: Vec<Vec<String>>,
}

/// Execute `sweep cycles`.
pub fn run_cycles(
    args: &CyclesArgs,
    options: &LoadOptions,
    output: OutputMode,
    cwd: &Path,
) -> anyhow::Result<()> {
    let loaded = load(&args.snapshot, options, cwd)?;
    let cycles = loaded.analyze().cycles();
    let labels = cycles
        .iter()
        .map(|cycle| {
            cycle
                .members
                .iter()
                .map(|&id| label(&loaded.scene, id))
                .collect()
        })
        .collect();

    emit(
        output,
        &CyclesOutput { cycles, labels },
        &render_text,
        &render_pretty,
    )
}

fn label(scene: &Scene, id: ComponentId) -> String {
    scene.component(id).map_or_else(
        || id.to_string(),
        |c| {
            let node = scene.node(c.node).map_or("", |n| n.name.as_str());
            format!("{id} {} ({node})", c.kind)
        },
    )
}

fn render_text(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for cycle in &payload.cycles {
        let ids: Vec<String> = cycle.members.iter().map(|id| id.0.to_string()).collect();
        writeln!(w, "{}", ids.join(" "))?;
    }
    Ok(())
}

fn render_pretty(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No dependency cycles.")?;
        return Ok(());
    }
    section(w, &format!("{} dependency cycle(s)", payload.cycles.len()))?;
    for (n, (cycle, labels)) in payload.cycles.iter().zip(&payload.labels).enumerate() {
        writeln!(w, "cycle {}:", n + 1)?;
        for label in labels {
            writeln!(w, "  {label}")?;
        }
        for (from, to) in &cycle.back_edges {
            writeln!(w, "  back edge: {from} → {to}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cycles_render_a_notice() {
        let payload = CyclesOutput {
            cycles: Vec::new(),
            labels: Vec::new(),
        };
        let mut buf = Vec::new();
        render_pretty(&payload, &mut buf).expect("render");
        assert_eq!(String::from_utf8_lossy(&buf), "No dependency cycles.\n");

        let mut text = Vec::new();
        render_text(&payload, &mut text).expect("render");
        assert!(text.is_empty());
    }

    #[test]
    fn text_lists_members_per_line() {
        let payload = CyclesOutput {
            cycles: vec![CycleReport {
                members: vec![ComponentId(1), ComponentId(4)],
                back_edges: vec![(ComponentId(4), ComponentId(1))],
            }],
            labels: vec![vec!["#1".into(), "#4".into()]],
        };
        let mut buf = Vec::new();
        render_text(&payload, &mut buf).expect("render");
        assert_eq!(String::from_utf8_lossy(&buf), "1 4\n");

        let mut pretty = Vec::new();
        render_pretty(&payload, &mut pretty).expect("render");
        assert!(String::from_utf8_lossy(&pretty).contains("back edge: #4 → #1"));
    }
}
