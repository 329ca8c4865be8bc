use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use committer_changelog::MessageOverride;
use committer_core::{CommitterConfig, CommitterError, OutputFormat};
use committer_git::GitCli;
use committer_pipeline::{Committer, RunReport};

const DEFAULT_CONFIG: &str = ".committer.toml";

#[derive(Parser)]
#[command(
    name = "committer",
    version,
    about = "Commit channel changes one definition at a time",
    long_about = "Split the unstaged changes of a package channel into one commit per\n\
                   top-level definition, each with a ChangeLog-style message.\n\n\
                   New definitions are committed first, then every remaining change.\n\
                   Added copyright lines are folded into the previous commit.\n\n\
                   Examples:\n  \
                     committer                                   Derive every message\n  \
                     committer 'Fix build'                       Same message for every commit\n  \
                     committer 'Fix build' '[arguments]: Fix build.'  Separate ChangeLog text\n  \
                     committer --dry-run --format json           Show the plan as JSON"
)]
struct Cli {
    /// Commit summary to use instead of a derived one
    message: Option<String>,

    /// ChangeLog text for the body (default: MESSAGE)
    changelog: Option<String>,

    /// Path to configuration file (default: .committer.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the planned commits without staging or committing
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(
        long,
        default_value = "text",
        long_help = "Output format for the commits made or planned.\n\n\
                       Formats:\n  \
                         text  Commit messages as written to git (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,

    /// When to use colors
    #[arg(long, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

fn load_config(path: Option<&Path>) -> Result<CommitterConfig> {
    let config = match path {
        Some(path) => CommitterConfig::from_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG);
            if default_path.exists() {
                CommitterConfig::from_file(default_path)?
            } else {
                CommitterConfig::default()
            }
        }
    };
    Ok(config)
}

fn init_tracing(verbose: bool, use_color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(use_color)
        .with_target(false)
        .init();
}

fn print_report(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(CommitterError::from)?;
            println!("{json}");
        }
        OutputFormat::Text => {
            if let Some(amendment) = &report.amendment {
                for holder in &amendment.holders {
                    println!("Amended previous commit: copyright for {holder}");
                }
                if !report.commits.is_empty() {
                    println!();
                }
            }
            for (i, commit) in report.commits.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", commit.message);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .color(use_color)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();
    init_tracing(cli.verbose, use_color);

    let config = load_config(cli.config.as_deref())?;
    let cwd = std::env::current_dir().into_diagnostic()?;
    let git = GitCli::discover(&cwd, &config.git.program)?;
    tracing::debug!(root = %git.root().display(), subtree = %config.channel.subtree, "starting");

    let message_override = MessageOverride::from_args(cli.message.as_deref(), cli.changelog.as_deref());
    let committer = Committer::new(&git, &config, message_override)?;

    let report = if cli.dry_run {
        committer.plan()?
    } else {
        committer.run()?
    };

    if report.is_empty() {
        eprintln!("Nothing to be done.");
    }
    print_report(&report, cli.format)
}
