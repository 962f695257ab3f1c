#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::load::LoadOptions;
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "sweep: find scene components that can be removed without changing behavior",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (ignored when `SWEEP_LOG` is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Analysis config file (default: ./sweep.toml if present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keep `*_end` leaf bones even when nothing references them.
    #[arg(long, global = true)]
    preserve_end_bones: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        OutputMode::detect(self.format, self.json)
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config: self.config.clone(),
            preserve_end_bones: self.preserve_end_bones,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Classify every component as required, required while active, or removable",
        after_help = "EXAMPLES:\n    # Classify a snapshot\n    sweep classify scene.json\n\n    # Only list removable components, as JSON\n    sweep classify scene.json --only removable --json"
    )]
    Classify(cmd::classify::ClassifyArgs),

    #[command(
        about = "Show the dependency chain that keeps a component alive",
        after_help = "EXAMPLES:\n    # Why is component 42 kept?\n    sweep explain scene.json 42"
    )]
    Explain(cmd::explain::ExplainArgs),

    #[command(
        about = "List dependency cycles in the component graph",
        after_help = "EXAMPLES:\n    sweep cycles scene.json --json"
    )]
    Cycles(cmd::cycles::CyclesArgs),
}

/// Filter used when `SWEEP_LOG` is unset.
const fn default_filter(verbose: bool, debug_env: bool) -> &'static str {
    if verbose || debug_env {
        "sweep=debug,info"
    } else {
        "sweep=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SWEEP_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_filter(verbose, env::var("DEBUG").is_ok()))
    });

    let format = env::var("SWEEP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    // Logs go to stderr so stdout stays parseable.
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = env::current_dir()?;
    let output = cli.output_mode();
    let options = cli.load_options();

    match cli.command {
        Commands::Classify(ref args) => cmd::classify::run_classify(args, &options, output, &cwd),
        Commands::Explain(ref args) => cmd::explain::run_explain(args, &options, output, &cwd),
        Commands::Cycles(ref args) => cmd::cycles::run_cycles(args, &options, output, &cwd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::ComponentId;

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["sweep", "--json", "classify", "scene.json"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["sweep", "cycles", "scene.json", "--json"]);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::parse_from(["sweep", "classify", "scene.json", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn config_and_end_bones_flow_into_load_options() {
        let cli = Cli::parse_from([
            "sweep",
            "--config",
            "custom.toml",
            "classify",
            "scene.json",
            "--preserve-end-bones",
        ]);
        let options = cli.load_options();
        assert_eq!(options.config, Some(PathBuf::from("custom.toml")));
        assert!(options.preserve_end_bones);
    }

    #[test]
    fn classify_only_filter_parses() {
        let cli = Cli::parse_from([
            "sweep",
            "classify",
            "scene.json",
            "--only",
            "required-while-active",
        ]);
        let Commands::Classify(args) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(
            args.only,
            Some(cmd::classify::LevelArg::RequiredWhileActive)
        );
    }

    #[test]
    fn explain_accepts_hash_prefixed_ids() {
        let cli = Cli::parse_from(["sweep", "explain", "scene.json", "#12"]);
        let Commands::Explain(args) = cli.command else {
            panic!("expected explain");
        };
        assert_eq!(args.component, ComponentId(12));
        assert_eq!(args.snapshot, PathBuf::from("scene.json"));
    }

    #[test]
    fn verbose_raises_the_default_filter() {
        assert_eq!(default_filter(false, false), "sweep=info,warn");
        assert_eq!(default_filter(true, false), "sweep=debug,info");
        assert_eq!(default_filter(false, true), "sweep=debug,info");

        let cli = Cli::parse_from(["sweep", "classify", "scene.json", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["sweep"]).is_err());
    }
}
