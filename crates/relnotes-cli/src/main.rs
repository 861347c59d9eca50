mod cmd;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use relnotes_core::config::{ConfigLayer, RepoList};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "relnotes",
    about = "Fetch GitHub release notes into a markdown archive, one file per release",
    version,
    propagate_version = true
)]
struct Cli {
    /// Comma-separated repositories (owner/name,owner/name)
    #[arg(long, global = true)]
    repos: Option<String>,

    /// GitHub API token (GITHUB_TOKEN takes precedence)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Root directory for release note files [default: artifacts]
    #[arg(long, global = true)]
    artifacts_path: Option<PathBuf>,

    /// Fetch every historical release instead of only the latest
    #[arg(long, global = true)]
    history: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// GitHub API base URL [default: https://api.github.com]
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file (default: relnotes.yaml or relnotes.yml in the working directory)
    #[arg(long, global = true, env = "RELNOTES_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Fetch releases and write missing notes (default)
    Sync,

    /// Show the resolved configuration
    Config,

    /// Show the remaining GitHub API quota
    RateLimit,
}

impl Cli {
    /// Flags that were not given stay unset so lower layers can fill them.
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            repos: self.repos.clone().map(RepoList::Csv),
            token: self.token.clone(),
            artifacts_path: self.artifacts_path.clone(),
            debug: self.debug.then_some(true),
            history: self.history.then_some(true),
            api_url: self.api_url.clone(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let sources = match settings::collect(cli.layer(), cli.config.as_deref()) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    let debug = sources.merged().debug.unwrap_or(false);
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if debug {
        for directive in ["relnotes_core=debug", "relnotes=debug"] {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => cmd::sync::run(&sources, cli.json),
        Commands::Config => cmd::config::run(&sources, cli.json),
        Commands::RateLimit => cmd::rate_limit::run(&sources, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
