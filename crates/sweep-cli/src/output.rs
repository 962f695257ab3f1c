//! Output formatting shared by every command.
//!
//! Each command builds one serializable payload and hands it to [`emit`]
//! together with a plain-text and a pretty renderer, so JSON, text and
//! pretty output always describe the same data.
//!
//! The mode is picked by `--format`, then `--json`, then `SWEEP_FORMAT`,
//! and finally by whether stdout is a terminal (pretty) or a pipe (text).

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const SECTION_WIDTH: usize = 72;

/// Heading line plus a dashed underline.
pub fn section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}\n{}", "-".repeat(SECTION_WIDTH))
}

/// `label:` padded to a fixed column, then the value.
pub fn field(w: &mut dyn Write, label: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{label}:");
    writeln!(w, "{label:<24} {}", value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and aligned columns for a terminal.
    Pretty,
    /// One tab-separated row per item, for pipes and scripts.
    Text,
    /// A single pretty-printed JSON document.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Pick the mode from flags, `SWEEP_FORMAT` and the terminal state.
    pub fn detect(format: Option<Self>, json: bool) -> Self {
        let env = std::env::var("SWEEP_FORMAT").ok();
        Self::choose(format, json, env.as_deref(), io::stdout().is_terminal())
    }

    fn choose(format: Option<Self>, json: bool, env: Option<&str>, tty: bool) -> Self {
        if let Some(mode) = format {
            return mode;
        }
        if json {
            return Self::Json;
        }
        if let Some(mode) = env.and_then(|v| Self::from_str(v, true).ok()) {
            return mode;
        }
        if tty { Self::Pretty } else { Self::Text }
    }
}

/// Error shape written to stderr before a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub message: String,
    /// Stable identifier for scripts, e.g. `unknown_component`.
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorReport {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            hint: None,
        }
    }

    #[must_use]
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Write to stderr in `mode`.
    pub fn report(&self, mode: OutputMode) -> anyhow::Result<()> {
        self.write_to(mode, &mut io::stderr().lock())
    }

    fn write_to(&self, mode: OutputMode, out: &mut dyn Write) -> anyhow::Result<()> {
        if mode.is_json() {
            serde_json::to_writer_pretty(&mut *out, &serde_json::json!({ "error": self }))?;
            writeln!(out)?;
            return Ok(());
        }
        writeln!(out, "error: {}", self.message)?;
        if let Some(hint) = &self.hint {
            writeln!(out, "  hint: {hint}")?;
        }
        Ok(())
    }
}

type Renderer<'f, T> = &'f dyn Fn(&T, &mut dyn Write) -> io::Result<()>;

/// Write `payload` to stdout in `mode`.
pub fn emit<T: Serialize>(
    mode: OutputMode,
    payload: &T,
    text: Renderer<'_, T>,
    pretty: Renderer<'_, T>,
) -> anyhow::Result<()> {
    emit_to(mode, payload, text, pretty, &mut io::stdout().lock())
}

fn emit_to<T: Serialize>(
    mode: OutputMode,
    payload: &T,
    text: Renderer<'_, T>,
    pretty: Renderer<'_, T>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, payload)?;
            writeln!(out)?;
        }
        OutputMode::Text => text(payload, out)?,
        OutputMode::Pretty => pretty(payload, out)?,
    }
    Ok(())
}
